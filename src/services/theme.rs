//! Site theme service: defaults, validation, merge, and resolution.
//!
//! DESIGN
//! ======
//! Themes are stored as free-form JSON on `faq_sites.theme`. Known keys are
//! validated on write so rendered CSS only ever sees hex colors, plain CSS
//! lengths and simple font names. Unknown keys are kept verbatim and never
//! rendered. Reading always goes through [`SiteTheme::resolve`], which
//! overlays valid stored values onto the defaults.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("hex color pattern")
});
static CSS_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0|\d{1,4}(?:\.\d{1,3})?(?:px|rem|em|%|vw|ch))$").expect("css length pattern"));
static FONT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{0,63}$").expect("font name pattern"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThemeError {
    #[error("theme must be a JSON object")]
    NotAnObject,
    #[error("invalid value for theme key {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Modern,
    Classic,
    Compact,
    Cards,
}

impl Layout {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Classic => "classic",
            Self::Compact => "compact",
            Self::Cards => "cards",
        }
    }

    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "modern" => Some(Self::Modern),
            "classic" => Some(Self::Classic),
            "compact" => Some(Self::Compact),
            "cards" => Some(Self::Cards),
            _ => None,
        }
    }
}

/// Fully-resolved style attributes for rendering a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub question_color: String,
    pub answer_color: String,
    pub border_radius: String,
    pub max_width: String,
    pub font_family: String,
    pub layout: Layout,
}

impl Default for SiteTheme {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".into(),
            secondary_color: "#64748b".into(),
            background_color: "#ffffff".into(),
            text_color: "#1f2937".into(),
            question_color: "#111827".into(),
            answer_color: "#4b5563".into(),
            border_radius: "0.5rem".into(),
            max_width: "48rem".into(),
            font_family: "Inter".into(),
            layout: Layout::Modern,
        }
    }
}

#[derive(Clone, Copy)]
enum KeyKind {
    Color,
    Length,
    Font,
    Layout,
}

fn key_kind(key: &str) -> Option<KeyKind> {
    match key {
        "primaryColor" | "secondaryColor" | "backgroundColor" | "textColor" | "questionColor" | "answerColor" => {
            Some(KeyKind::Color)
        }
        "borderRadius" | "maxWidth" => Some(KeyKind::Length),
        "fontFamily" => Some(KeyKind::Font),
        "layout" => Some(KeyKind::Layout),
        _ => None,
    }
}

fn is_valid(kind: KeyKind, value: &str) -> bool {
    match kind {
        KeyKind::Color => HEX_COLOR.is_match(value),
        KeyKind::Length => CSS_LENGTH.is_match(value),
        KeyKind::Font => FONT_NAME.is_match(value),
        KeyKind::Layout => Layout::from_str(value).is_some(),
    }
}

/// Validate one theme entry. Unknown keys accept any value.
///
/// # Errors
///
/// Returns [`ThemeError::InvalidValue`] for a known key with a bad value.
pub fn validate_entry(key: &str, value: &Value) -> Result<(), ThemeError> {
    let Some(kind) = key_kind(key) else {
        return Ok(());
    };
    match value.as_str() {
        Some(s) if is_valid(kind, s) => Ok(()),
        _ => Err(ThemeError::InvalidValue { key: key.to_owned(), value: value.to_string() }),
    }
}

impl SiteTheme {
    /// Overlay the valid known keys of a stored theme onto the defaults.
    #[must_use]
    pub fn resolve(stored: &Value) -> Self {
        let mut theme = Self::default();
        let Some(map) = stored.as_object() else {
            return theme;
        };
        for (key, value) in map {
            if validate_entry(key, value).is_err() {
                continue;
            }
            let Some(s) = value.as_str() else {
                continue;
            };
            theme.set(key, s);
        }
        theme
    }

    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            "primaryColor" => &mut self.primary_color,
            "secondaryColor" => &mut self.secondary_color,
            "backgroundColor" => &mut self.background_color,
            "textColor" => &mut self.text_color,
            "questionColor" => &mut self.question_color,
            "answerColor" => &mut self.answer_color,
            "borderRadius" => &mut self.border_radius,
            "maxWidth" => &mut self.max_width,
            "fontFamily" => &mut self.font_family,
            "layout" => {
                if let Some(layout) = Layout::from_str(value) {
                    self.layout = layout;
                }
                return;
            }
            _ => return,
        };
        value.clone_into(slot);
    }

    /// The default theme as stored JSON.
    #[must_use]
    pub fn default_value() -> Value {
        serde_json::to_value(Self::default()).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

/// Merge a partial theme into the stored one. `null` removes a key so it
/// falls back to its default.
///
/// # Errors
///
/// Returns an error if `patch` is not an object or carries an invalid known value.
pub fn merge_theme(current: &Value, patch: &Value) -> Result<Value, ThemeError> {
    let patch = patch.as_object().ok_or(ThemeError::NotAnObject)?;
    for (key, value) in patch {
        if !value.is_null() {
            validate_entry(key, value)?;
        }
    }

    let mut merged = current.as_object().cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

// =============================================================================
// PRESETS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ColorPreset {
    pub name: &'static str,
    pub primary: &'static str,
    pub secondary: &'static str,
}

const fn preset(name: &'static str, primary: &'static str, secondary: &'static str) -> ColorPreset {
    ColorPreset { name, primary, secondary }
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutOption {
    pub value: Layout,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemePresets {
    pub colors: Vec<ColorPreset>,
    pub fonts: Vec<&'static str>,
    pub layouts: Vec<LayoutOption>,
    pub border_radii: Vec<&'static str>,
    pub default_theme: SiteTheme,
}

/// Options offered by the theme editor.
#[must_use]
pub fn presets() -> ThemePresets {
    ThemePresets {
        colors: vec![
            preset("Ocean Blue", "#3b82f6", "#64748b"),
            preset("Forest Green", "#059669", "#6b7280"),
            preset("Sunset Orange", "#ea580c", "#6b7280"),
            preset("Royal Purple", "#7c3aed", "#6b7280"),
            preset("Rose Pink", "#e11d48", "#6b7280"),
            preset("Midnight Dark", "#1f2937", "#4b5563"),
        ],
        fonts: vec!["Inter", "Roboto", "Open Sans", "Lato", "Poppins", "Montserrat"],
        layouts: vec![
            LayoutOption { value: Layout::Modern, name: "Modern", description: "Clean and minimal design" },
            LayoutOption { value: Layout::Classic, name: "Classic", description: "Traditional layout" },
            LayoutOption { value: Layout::Compact, name: "Compact", description: "Space-efficient design" },
            LayoutOption { value: Layout::Cards, name: "Card-based", description: "Card-style FAQ items" },
        ],
        border_radii: vec!["0px", "4px", "8px", "12px", "16px"],
        default_theme: SiteTheme::default(),
    }
}

#[cfg(test)]
#[path = "theme_test.rs"]
mod tests;
