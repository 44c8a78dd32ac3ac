//! Single-page visit: load, dismiss overlays, extract

use crate::crawler::classifier::relevant_links;
use crate::crawler::extractor::{extract_emails, mailto_address};
use crate::crawler::session::{PageSession, VisitError};
use std::collections::BTreeSet;
use tracing::debug;
use url::Url;

/// What one page yielded
#[derive(Debug, Clone, Default)]
pub struct PageVisit {
    /// Emails found anywhere in the markup
    pub content_emails: BTreeSet<String>,

    /// Emails from `mailto:` anchors, in document order (may repeat)
    pub mailto_emails: Vec<String>,

    /// Contact-like links worth following, empty when not collected
    pub candidate_links: Vec<Url>,
}

/// Visits one URL in an existing session
///
/// # Steps
///
/// 1. Navigate (bounded by the session's navigation timeout)
/// 2. Try to dismiss a consent overlay; the outcome does not matter
/// 3. Capture markup and extract emails
/// 4. Extract `mailto:` addresses
/// 5. Classify links when `collect_links` is set
///
/// # Returns
///
/// * `Ok(PageVisit)` - emails and candidate links
/// * `Err(VisitError)` - the page could not be loaded (or the session died)
pub async fn visit_page<S>(
    session: &mut S,
    url: &Url,
    collect_links: bool,
    keywords: &[String],
) -> Result<PageVisit, VisitError>
where
    S: PageSession + ?Sized,
{
    session.navigate(url).await?;

    let dismissed = session.dismiss_overlay().await;
    if dismissed {
        debug!("Dismissed consent overlay on {}", url);
    }

    let page = session.snapshot().await?;

    let content_emails = extract_emails(&page.markup);

    let mailto_emails: Vec<String> = page
        .anchors
        .iter()
        .filter_map(|anchor| mailto_address(&anchor.href))
        .collect();

    let candidate_links = if collect_links {
        relevant_links(&page.anchors, &page.url, keywords)
    } else {
        Vec::new()
    };

    debug!(
        "Visited {}: {} content emails, {} mailto emails, {} candidate links",
        url,
        content_emails.len(),
        mailto_emails.len(),
        candidate_links.len()
    );

    Ok(PageVisit {
        content_emails,
        mailto_emails,
        candidate_links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_KEYWORDS;
    use crate::crawler::testing::StaticSite;

    fn keywords() -> Vec<String> {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    }

    #[tokio::test]
    async fn test_visit_collects_everything() {
        let site = StaticSite::new().page(
            "https://example.com/",
            r#"<p>sales@example.com</p>
               <a href="mailto:info@foo.com?subject=Hi">Mail</a>
               <a href="/contact">Contact</a>
               <a href="/shop">Shop</a>"#,
        );
        let mut session = site.session();
        let url = Url::parse("https://example.com/").unwrap();

        let visit = visit_page(&mut session, &url, true, &keywords())
            .await
            .unwrap();

        assert!(visit.content_emails.contains("sales@example.com"));
        assert!(visit.content_emails.contains("info@foo.com"));
        assert_eq!(visit.mailto_emails, vec!["info@foo.com"]);
        assert_eq!(visit.candidate_links.len(), 1);
        assert_eq!(
            visit.candidate_links[0].as_str(),
            "https://example.com/contact"
        );
    }

    #[tokio::test]
    async fn test_visit_without_link_collection() {
        let site = StaticSite::new().page("https://example.com/", r#"<a href="/contact">Contact</a>"#);
        let mut session = site.session();
        let url = Url::parse("https://example.com/").unwrap();

        let visit = visit_page(&mut session, &url, false, &keywords())
            .await
            .unwrap();
        assert!(visit.candidate_links.is_empty());
    }

    #[tokio::test]
    async fn test_overlay_failure_does_not_abort() {
        let site = StaticSite::new()
            .page("https://example.com/", "office@example.com")
            .with_overlay();
        let mut session = site.session();
        let url = Url::parse("https://example.com/").unwrap();

        let visit = visit_page(&mut session, &url, true, &keywords())
            .await
            .unwrap();
        assert_eq!(visit.content_emails.len(), 1);
        assert_eq!(site.overlay_attempts(), 1);
    }

    #[tokio::test]
    async fn test_missing_page_is_navigation_error() {
        let site = StaticSite::new();
        let mut session = site.session();
        let url = Url::parse("https://example.com/missing").unwrap();

        let err = visit_page(&mut session, &url, true, &keywords())
            .await
            .unwrap_err();
        assert!(matches!(err, VisitError::Navigation { .. }));
    }
}
