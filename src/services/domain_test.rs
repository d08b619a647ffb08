use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

/// In-memory probe over a fixed set of taken domains.
struct TakenSet {
    taken: HashSet<String>,
    calls: AtomicUsize,
}

impl TakenSet {
    fn new<I: IntoIterator<Item = String>>(taken: I) -> Self {
        Self { taken: taken.into_iter().collect(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl DomainProbe for TakenSet {
    async fn is_available(&self, domain: &str) -> Result<bool, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(!self.taken.contains(domain))
    }
}

fn is_slug_shaped(slug: &str) -> bool {
    slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
}

// =============================================================================
// generate_domain / normalize_domain
// =============================================================================

#[test]
fn generate_domain_lowercases_and_hyphenates() {
    assert_eq!(generate_domain("My Awesome FAQ"), "my-awesome-faq");
}

#[test]
fn generate_domain_collapses_and_trims_separators() {
    assert_eq!(generate_domain("  --Hello,   World!!--  "), "hello-world");
    assert_eq!(generate_domain("a__b..c"), "a-b-c");
}

#[test]
fn generate_domain_replaces_non_ascii() {
    assert_eq!(generate_domain("Café Menü"), "caf-men");
    assert_eq!(generate_domain("よくある質問"), "");
}

#[test]
fn generate_domain_caps_length_without_trailing_hyphen() {
    let name = format!("{}-tail", "a".repeat(62));
    let slug = generate_domain(&name);
    assert_eq!(slug.len(), 62);
    assert!(!slug.ends_with('-'));
}

#[test]
fn generate_domain_is_idempotent() {
    let repeated = "x-".repeat(40);
    let inputs: [&str; 6] = [
        "My Awesome FAQ",
        "  --weird__input--  ",
        "Ünïcödé Støre 2024",
        "already-a-slug",
        repeated.as_str(),
        "",
    ];
    for input in inputs {
        let once = generate_domain(input);
        assert_eq!(generate_domain(&once), once, "not idempotent for {input:?}");
        assert!(is_slug_shaped(&once), "bad shape {once:?} for {input:?}");
        assert!(once.len() <= MAX_DOMAIN_LEN);
    }
}

#[test]
fn normalize_domain_keeps_long_input_intact() {
    let long = "b".repeat(80);
    assert_eq!(normalize_domain(&long).len(), 80);
}

// =============================================================================
// validate_domain
// =============================================================================

#[test]
fn validate_domain_accepts_normalized_slug() {
    assert_eq!(validate_domain("cool-faq"), Ok(()));
    assert_eq!(validate_domain("abc"), Ok(()));
    assert_eq!(validate_domain(&"a".repeat(63)), Ok(()));
}

#[test]
fn validate_domain_rejects_short_and_long() {
    assert_eq!(validate_domain("ab"), Err(DomainError::TooShort));
    assert_eq!(validate_domain(""), Err(DomainError::TooShort));
    assert_eq!(validate_domain(&"a".repeat(64)), Err(DomainError::TooLong));
}

#[test]
fn validate_domain_rejects_unnormalized_input() {
    assert_eq!(validate_domain("Cool-FAQ"), Err(DomainError::Malformed));
    assert_eq!(validate_domain("-cool"), Err(DomainError::Malformed));
    assert_eq!(validate_domain("cool--faq"), Err(DomainError::Malformed));
    assert_eq!(validate_domain("cool faq"), Err(DomainError::Malformed));
}

// =============================================================================
// random domains
// =============================================================================

#[test]
fn generate_random_domain_has_adjective_noun_number_shape() {
    for _ in 0..50 {
        let domain = generate_random_domain();
        let parts = domain.split('-').collect::<Vec<_>>();
        assert_eq!(parts.len(), 3, "unexpected shape {domain:?}");
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(NOUNS.contains(&parts[1]));
        let n: u32 = parts[2].parse().expect("numeric suffix");
        assert!(n < 1000);
        assert_eq!(validate_domain(&domain), Ok(()));
    }
}

#[test]
fn base_domain_for_falls_back_to_random_for_short_slugs() {
    assert_eq!(base_domain_for("Help Center"), "help-center");
    let fallback = base_domain_for("質問");
    assert_eq!(validate_domain(&fallback), Ok(()));
    assert_eq!(fallback.split('-').count(), 3);
}

#[test]
fn random_suffix_uses_alphabet() {
    let suffix = random_suffix(RANDOM_SUFFIX_LEN);
    assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
    assert!(suffix.bytes().all(|b| RANDOM_SUFFIX_ALPHABET.contains(&b)));
}

// =============================================================================
// unique_domain
// =============================================================================

#[tokio::test]
async fn unique_domain_returns_base_when_free() {
    let probe = TakenSet::new(Vec::new());
    assert_eq!(unique_domain(&probe, "cool-faq").await.unwrap(), "cool-faq");
    assert_eq!(probe.calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn unique_domain_appends_numeric_suffix_when_taken() {
    let probe = TakenSet::new(["cool-faq".to_owned()]);
    let domain = unique_domain(&probe, "cool-faq").await.unwrap();
    assert_ne!(domain, "cool-faq");
    assert_eq!(domain, "cool-faq1");
}

#[tokio::test]
async fn unique_domain_skips_taken_suffixes() {
    let probe = TakenSet::new(["faq".to_owned(), "faq1".to_owned(), "faq2".to_owned()]);
    assert_eq!(unique_domain(&probe, "faq").await.unwrap(), "faq3");
}

#[tokio::test]
async fn unique_domain_falls_back_to_random_token_after_999() {
    let taken = std::iter::once("help".to_owned()).chain((1..=999).map(|n| format!("help{n}")));
    let probe = TakenSet::new(taken);
    let domain = unique_domain(&probe, "help").await.unwrap();
    let token = domain.strip_prefix("help-").expect("random suffix form");
    assert_eq!(token.len(), RANDOM_SUFFIX_LEN);
    assert_eq!(probe.calls.load(Ordering::Relaxed), 1000);
}

#[tokio::test]
async fn unique_domain_candidates_fit_length_limit() {
    let base = "a".repeat(MAX_DOMAIN_LEN);
    let probe = TakenSet::new([base.clone()]);
    let domain = unique_domain(&probe, &base).await.unwrap();
    assert!(domain.len() <= MAX_DOMAIN_LEN);
    assert_eq!(validate_domain(&domain), Ok(()));
    assert!(domain.ends_with('1'));
}

// =============================================================================
// Postgres-backed probe
// =============================================================================

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn generate_unique_domain_differs_for_existing_slug() {
    use crate::services::site::{self, NewSite};
    use crate::state::test_helpers;

    let pool = test_helpers::integration_pool().await;
    let owner = test_helpers::insert_user(&pool).await;
    let name = format!("Cool FAQ {}", Uuid::new_v4().simple());

    let first = site::create_site(&pool, owner, NewSite { name: name.clone(), description: None, domain: None })
        .await
        .expect("first site");
    let second = site::create_site(&pool, owner, NewSite { name, description: None, domain: None })
        .await
        .expect("second site");

    assert_ne!(first.domain, second.domain);
    assert!(second.domain.starts_with(&first.domain));
}
