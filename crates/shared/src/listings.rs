use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::dates::parse_date_placed;
use crate::models::JobPosting;

static RESULT_TEXT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.j-search-result__text").expect("valid selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));
static STRONG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("valid selector"));

const DATE_PLACED_LABEL: &str = "Date Placed";

/// Extract postings from a search-results page.
///
/// Entries whose link falls outside `job_prefix` (adverts, navigation) are
/// dropped, as are entries without a readable "Date Placed" value.
pub fn parse_listings(
    html: &str,
    base: &Url,
    job_prefix: &str,
    reference: NaiveDate,
) -> Vec<JobPosting> {
    let document = Html::parse_document(html);
    let mut postings = Vec::new();

    for entry in document.select(&RESULT_TEXT) {
        let Some(anchor) = entry.select(&LINK).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };

        let link = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Skipping unparseable href {:?}: {}", href, e);
                continue;
            }
        };
        if !link.starts_with(job_prefix) {
            debug!("Skipping non-job link {}", link);
            continue;
        }

        let name = collapse_whitespace(&anchor.text().collect::<String>());

        let Some(fragment) = date_placed_fragment(entry) else {
            warn!("No date placed found for {}", link);
            continue;
        };
        let placed_on = match parse_date_placed(&fragment, reference) {
            Ok(date) => date,
            Err(e) => {
                warn!("Skipping {}: {}", link, e);
                continue;
            }
        };

        postings.push(JobPosting::new(name, link, placed_on));
    }

    postings
}

/// The "Date Placed" label sits in a sibling block, so search from the
/// entry's parent and take the text of the label's own container.
fn date_placed_fragment(entry: ElementRef) -> Option<String> {
    let container = entry.parent().and_then(ElementRef::wrap)?;
    let label = container
        .select(&STRONG)
        .find(|strong| strong.text().collect::<String>().contains(DATE_PLACED_LABEL))?;
    let holder = label.parent().and_then(ElementRef::wrap)?;

    let text = holder.text().collect::<String>();
    let value = text.replace(&format!("{}:", DATE_PLACED_LABEL), "");
    Some(value.trim().to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{JOBS_AC_UK_BASE, JOBS_AC_UK_JOB_PREFIX};

    fn result_block(href: &str, title: &str, placed: &str) -> String {
        format!(
            r#"<div class="j-search-result__result">
                 <div class="j-search-result__text">
                   <a href="{href}">
                     {title}
                   </a>
                   <div class="j-search-result__employer">University of Somewhere</div>
                 </div>
                 <div class="j-search-result__info">
                   <div><strong>Date Placed:</strong> {placed}</div>
                 </div>
               </div>"#
        )
    }

    fn page(blocks: &[String]) -> String {
        format!("<html><body>{}</body></html>", blocks.join("\n"))
    }

    fn parse(html: &str) -> Vec<JobPosting> {
        let base = Url::parse(JOBS_AC_UK_BASE).unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        parse_listings(html, &base, JOBS_AC_UK_JOB_PREFIX, reference)
    }

    #[test]
    fn test_parses_name_link_and_date() {
        let html = page(&[result_block("/job/DEA123/research-software-engineer", "Research Software Engineer", "5th Mar")]);
        let postings = parse(&html);

        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].name, "Research Software Engineer");
        assert_eq!(
            postings[0].link,
            "https://www.jobs.ac.uk/job/DEA123/research-software-engineer"
        );
        assert_eq!(postings[0].placed_on, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert!(postings[0].description.is_none());
        assert!(!postings[0].errored);
    }

    #[test]
    fn test_drops_links_outside_job_prefix() {
        let html = page(&[
            result_block("/job/AAA111/data-engineer", "Data Engineer", "4th Mar"),
            result_block("/employer/acme", "Acme Careers", "4th Mar"),
            result_block("https://ads.example.com/job/XYZ", "Sponsored", "4th Mar"),
        ]);
        let postings = parse(&html);

        assert_eq!(postings.len(), 1);
        assert!(postings
            .iter()
            .all(|p| p.link.starts_with(JOBS_AC_UK_JOB_PREFIX)));
    }

    #[test]
    fn test_skips_entry_with_bad_date() {
        let html = page(&[
            result_block("/job/AAA111/data-engineer", "Data Engineer", "sometime"),
            result_block("/job/BBB222/devops-engineer", "DevOps Engineer", "1st Mar"),
        ]);
        let postings = parse(&html);

        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].name, "DevOps Engineer");
        assert_eq!(postings[0].placed_on, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_skips_entry_without_date_label() {
        let html = r#"<html><body>
            <div><div class="j-search-result__text"><a href="/job/CCC333/x">X</a></div></div>
        </body></html>"#;
        assert!(parse(html).is_empty());
    }

    #[test]
    fn test_empty_page() {
        assert!(parse("<html><body><p>No results</p></body></html>").is_empty());
    }
}
