//! Public FAQ page: lookup by domain and HTML rendering.
//!
//! Only published items are ever loaded here. Rendering fills the
//! `templates/*.html` files with escaped user content and the resolved theme.

use std::fmt::Write;

use serde::Serialize;
use sqlx::{PgPool, Row};

use crate::services::faq::{self, FaqItem};
use crate::services::theme::SiteTheme;

const SITE_TEMPLATE: &str = include_str!("../../templates/site.html");
const NOT_FOUND_TEMPLATE: &str = include_str!("../../templates/not_found.html");
const EMPTY_MESSAGE: &str = "No questions have been published yet.";

/// Published view of a site.
#[derive(Debug, Clone, Serialize)]
pub struct PublicSite {
    pub name: String,
    pub description: Option<String>,
    pub domain: String,
    pub theme: SiteTheme,
    pub items: Vec<PublicItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicItem {
    pub question: String,
    pub answer: String,
    pub category: Option<String>,
}

impl From<FaqItem> for PublicItem {
    fn from(item: FaqItem) -> Self {
        Self { question: item.question, answer: item.answer, category: item.category }
    }
}

/// Load a site and its published items by domain.
///
/// # Errors
///
/// Returns a database error if either query fails.
pub async fn load_public_site(pool: &PgPool, domain: &str) -> Result<Option<PublicSite>, sqlx::Error> {
    let Some(row) = sqlx::query("SELECT id, name, description, domain, theme FROM faq_sites WHERE domain = $1")
        .bind(domain)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let items = faq::fetch_items(pool, row.get("id"), true).await?;
    let theme: serde_json::Value = row.get("theme");
    Ok(Some(PublicSite {
        name: row.get("name"),
        description: row.get("description"),
        domain: row.get("domain"),
        theme: SiteTheme::resolve(&theme),
        items: items.into_iter().map(PublicItem::from).collect(),
    }))
}

/// Escape text for HTML bodies and attribute values. Braces are escaped too
/// so user text can never form a template placeholder.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_items(items: &[PublicItem]) -> String {
    if items.is_empty() {
        return format!(r#"<p class="empty">{EMPTY_MESSAGE}</p>"#);
    }
    let mut html = String::from(r#"<div class="faq-list">"#);
    for item in items {
        html.push_str(r#"<article class="faq-item">"#);
        if let Some(category) = &item.category {
            let _ = write!(html, r#"<span class="faq-category">{}</span>"#, escape_html(category));
        }
        let _ = write!(
            html,
            "<h2>{}</h2><p>{}</p></article>",
            escape_html(&item.question),
            escape_html(&item.answer)
        );
    }
    html.push_str("</div>");
    html
}

/// Full HTML page for a site.
#[must_use]
pub fn render_site_html(site: &PublicSite) -> String {
    let theme = &site.theme;
    let name = escape_html(&site.name);
    let description = site.description.as_deref().map(escape_html);
    let header_description = description.as_deref().map(|d| format!("<p>{d}</p>")).unwrap_or_default();

    SITE_TEMPLATE
        .replace("{{TITLE}}", &name)
        .replace("{{META_DESCRIPTION}}", description.as_deref().unwrap_or_default())
        .replace("{{PRIMARY_COLOR}}", &theme.primary_color)
        .replace("{{SECONDARY_COLOR}}", &theme.secondary_color)
        .replace("{{BACKGROUND_COLOR}}", &theme.background_color)
        .replace("{{TEXT_COLOR}}", &theme.text_color)
        .replace("{{QUESTION_COLOR}}", &theme.question_color)
        .replace("{{ANSWER_COLOR}}", &theme.answer_color)
        .replace("{{BORDER_RADIUS}}", &theme.border_radius)
        .replace("{{MAX_WIDTH}}", &theme.max_width)
        .replace("{{FONT_FAMILY}}", &theme.font_family)
        .replace("{{LAYOUT}}", theme.layout.as_str())
        .replace("{{NAME}}", &name)
        .replace("{{DESCRIPTION}}", &header_description)
        .replace("{{CONTENT}}", &render_items(&site.items))
}

/// 404 page for an unknown domain.
#[must_use]
pub fn render_not_found_html(domain: &str, home_url: &str) -> String {
    NOT_FOUND_TEMPLATE
        .replace("{{DOMAIN}}", &escape_html(domain))
        .replace("{{HOME_URL}}", &escape_html(home_url))
}

#[cfg(test)]
#[path = "public_site_test.rs"]
mod tests;
