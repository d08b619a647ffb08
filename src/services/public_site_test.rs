use super::*;
use crate::services::theme::Layout;

fn site(items: Vec<PublicItem>) -> PublicSite {
    PublicSite {
        name: "Help Center".into(),
        description: Some("Answers to common questions".into()),
        domain: "help-center".into(),
        theme: SiteTheme::default(),
        items,
    }
}

fn item(question: &str, answer: &str) -> PublicItem {
    PublicItem { question: question.into(), answer: answer.into(), category: None }
}

// =============================================================================
// escape_html
// =============================================================================

#[test]
fn escape_html_covers_markup_and_braces() {
    assert_eq!(
        escape_html(r#"<a href="x">'&'</a> {{NAME}}"#),
        "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt; &#123;&#123;NAME&#125;&#125;"
    );
    assert_eq!(escape_html("plain"), "plain");
}

// =============================================================================
// render_site_html
// =============================================================================

#[test]
fn renders_title_meta_and_items_in_order() {
    let html = render_site_html(&site(vec![item("First?", "One."), item("Second?", "Two.")]));
    assert!(html.contains("<title>Help Center</title>"));
    assert!(html.contains(r#"<meta name="description" content="Answers to common questions">"#));
    let first = html.find("First?").unwrap();
    let second = html.find("Second?").unwrap();
    assert!(first < second);
    assert!(!html.contains(EMPTY_MESSAGE));
    assert!(!html.contains("{{"));
}

#[test]
fn renders_empty_state_without_items() {
    let html = render_site_html(&site(Vec::new()));
    assert!(html.contains(EMPTY_MESSAGE));
    assert!(!html.contains(r#"<div class="faq-list">"#));
}

#[test]
fn renders_theme_values() {
    let mut s = site(Vec::new());
    s.theme.primary_color = "#e11d48".into();
    s.theme.layout = Layout::Cards;
    s.theme.font_family = "Poppins".into();
    let html = render_site_html(&s);
    assert!(html.contains("--primary: #e11d48;"));
    assert!(html.contains(r#"class="layout-cards""#));
    assert!(html.contains(r#"font-family: "Poppins""#));
}

#[test]
fn user_content_is_escaped() {
    let mut s = site(vec![PublicItem {
        question: "<script>alert(1)</script>".into(),
        answer: "{{CONTENT}}".into(),
        category: Some("<b>".into()),
    }]);
    s.name = "\"Quoted\" & <Co>".into();
    s.description = None;
    let html = render_site_html(&s);
    assert!(!html.contains("<script>alert"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("&#123;&#123;CONTENT&#125;&#125;"));
    assert!(html.contains("&lt;b&gt;"));
    assert!(html.contains("<title>&quot;Quoted&quot; &amp; &lt;Co&gt;</title>"));
    assert!(html.contains(r#"content="""#));
}

#[test]
fn not_found_page_links_home() {
    let html = render_not_found_html("<missing>", "https://faq.example.com/");
    assert!(html.contains("&lt;missing&gt;"));
    assert!(html.contains(r#"href="https://faq.example.com/""#));
}

// =============================================================================
// live database
// =============================================================================

#[cfg(feature = "live-db-tests")]
mod live {
    use super::*;
    use crate::services::faq::{NewFaqItem, create_item, toggle_published};
    use crate::services::site::{NewSite, create_site};
    use crate::state::test_helpers::{insert_user, integration_pool};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL/live Postgres"]
    async fn only_published_items_are_public() {
        let pool = integration_pool().await;
        let owner = insert_user(&pool).await;
        let created = create_site(
            &pool,
            owner,
            NewSite { name: format!("Public {}", Uuid::new_v4().simple()), ..NewSite::default() },
        )
        .await
        .expect("site");

        let shown = NewFaqItem { question: "Shown?".into(), answer: "Yes".into(), ..NewFaqItem::default() };
        let hidden = NewFaqItem { question: "Hidden?".into(), answer: "No".into(), ..NewFaqItem::default() };
        create_item(&pool, owner, created.id, shown).await.expect("shown");
        let hidden = create_item(&pool, owner, created.id, hidden).await.expect("hidden");
        toggle_published(&pool, owner, created.id, hidden.id).await.expect("unpublish");

        let public = load_public_site(&pool, &created.domain).await.expect("load").expect("site");
        let questions = public.items.iter().map(|i| i.question.as_str()).collect::<Vec<_>>();
        assert_eq!(questions, ["Shown?"]);

        assert!(load_public_site(&pool, "no-such-site-here").await.expect("load").is_none());
    }
}
