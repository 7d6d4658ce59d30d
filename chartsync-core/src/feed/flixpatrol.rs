//! FlixPatrol chart and detail-page scraping.

use std::fmt;
use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, warn};

use super::{content_hint_from_section, ChartFeed, FeedError, SectionOutcome};
use crate::cache::PageCache;
use crate::retry::TransportRetry;
use crate::types::{DetailSignals, MediaKind, PersonRole, RawListing, ReferencePerson};

pub const FLIXPATROL_BASE: &str = "https://flixpatrol.com";

const SCRAPE_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Ordered fallback chain for extracting a reference person from a detail
/// page: first label present wins. The role records where the name was
/// found, as a hint for later credits matching.
const PERSON_LABELS: [(&str, PersonRole); 3] = [
    ("Starring", PersonRole::Cast),
    ("Directed by", PersonRole::Director),
    ("Produced by", PersonRole::Producer),
];

static HEADING_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3, h4").expect("heading selector should parse"));
static TBODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tbody").expect("tbody selector should parse"));
static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("row selector should parse"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("cell selector should parse"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("link selector should parse"));
static DT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dt").expect("dt selector should parse"));
static PREMIERE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"div[title="Premiere"]"#).expect("premiere selector should parse")
});
static TYPE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[title="Type"]"#).expect("type selector should parse"));

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Second-to-last path segment of a listing href, e.g.
/// `/title/oppenheimer/` -> `oppenheimer`.
fn slug_from_href(href: &str) -> Option<String> {
    let segments: Vec<&str> = href.split('/').collect();
    if segments.len() < 2 {
        return None;
    }
    let slug = segments[segments.len() - 2];
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Extract the ranked rows of one chart section from a page body.
///
/// Missing structure (section heading, card container, table body) yields an
/// empty list; row-level problems skip the row.
fn parse_chart_rows(html: &str, section_title: &str, content_hint: MediaKind) -> Vec<RawListing> {
    let document = Html::parse_document(html);

    // Headings are searched in document order, exact match before
    // case-insensitive.
    let headings: Vec<ElementRef<'_>> = document.select(&HEADING_SELECTOR).collect();
    let header = headings
        .iter()
        .find(|h| element_text(h) == section_title)
        .or_else(|| {
            headings
                .iter()
                .find(|h| element_text(h).eq_ignore_ascii_case(section_title))
        });
    let Some(header) = header else {
        warn!("could not find section header for '{section_title}'");
        return Vec::new();
    };

    let Some(card) = header.ancestors().filter_map(ElementRef::wrap).find(|el| {
        el.value().name() == "div" && el.value().classes().any(|c| c == "card")
    }) else {
        warn!("could not find card container for '{section_title}'");
        return Vec::new();
    };

    let Some(tbody) = card.select(&TBODY_SELECTOR).next() else {
        warn!("could not find table body for '{section_title}'");
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in tbody.select(&ROW_SELECTOR) {
        let Some(rank_cell) = row.select(&CELL_SELECTOR).next() else {
            warn!("row without cells in '{section_title}'");
            continue;
        };
        let rank_text = element_text(&rank_cell);
        let rank_text = rank_text.trim_end_matches('.');
        let Ok(rank) = rank_text.parse::<u32>() else {
            warn!("unparseable rank '{rank_text}' in '{section_title}'");
            continue;
        };

        let Some(link) = row.select(&LINK_SELECTOR).next() else {
            warn!("row without a title link in '{section_title}'");
            continue;
        };
        let title = element_text(&link);
        if title.is_empty() {
            continue;
        }
        let Some(slug) = link.value().attr("href").and_then(slug_from_href) else {
            warn!("could not extract slug for '{title}' in '{section_title}'");
            continue;
        };

        rows.push(RawListing {
            rank,
            title,
            slug,
            content_hint,
        });
    }

    debug!("scraped {} rows from '{section_title}'", rows.len());
    rows
}

/// Document-order scan for the first `dd.grow` after a label's `dt`.
fn following_dd_grow<'a>(document: &'a Html, dt: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut seen = false;
    for node in document.root_element().descendants() {
        if node.id() == dt.id() {
            seen = true;
            continue;
        }
        if !seen {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == "dd" && el.value().classes().any(|c| c == "grow") {
                return Some(el);
            }
        }
    }
    None
}

fn extract_reference_person(document: &Html) -> Option<ReferencePerson> {
    for (label, role) in PERSON_LABELS {
        let Some(dt) = document
            .select(&DT_SELECTOR)
            .find(|dt| element_text(dt).eq_ignore_ascii_case(label))
        else {
            continue;
        };
        let Some(dd) = following_dd_grow(document, dt) else {
            continue;
        };
        let Some(link) = dd.select(&LINK_SELECTOR).next() else {
            continue;
        };
        let name = element_text(&link);
        if !name.is_empty() {
            debug!("reference person: '{name}' (role={role}, label='{label}')");
            return Some(ReferencePerson { name, role });
        }
    }
    None
}

fn parse_detail_signals(html: &str) -> DetailSignals {
    let document = Html::parse_document(html);
    let mut signals = DetailSignals::default();

    // Raw premiere text; validated against the 19xx/20xx pattern at use.
    if let Some(premiere) = document.select(&PREMIERE_SELECTOR).next() {
        let text = element_text(&premiere);
        if !text.is_empty() {
            signals.year = Some(text);
        }
    }

    signals.reference_person = extract_reference_person(&document);

    // Secondary kind signal, consulted only for hint-less mixed sections.
    if let Some(type_div) = document.select(&TYPE_SELECTOR).next() {
        let text = element_text(&type_div).to_lowercase();
        if text.contains("movie") {
            signals.detail_media_kind = Some(MediaKind::Movie);
        } else if text.contains("tv show") || text.contains("series") {
            signals.detail_media_kind = Some(MediaKind::Series);
        }
    }

    signals
}

/// Chart feed backed by flixpatrol.com.
///
/// Chart pages are fetched through the per-run page cache (several sections
/// share one page); detail pages are fetched directly. All fetches get a
/// few quick transport-level retries.
pub struct FlixPatrolFeed {
    client: Client,
    cache: PageCache,
    transport: TransportRetry,
}

impl fmt::Debug for FlixPatrolFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlixPatrolFeed").finish_non_exhaustive()
    }
}

impl FlixPatrolFeed {
    pub fn new(timeout: Duration) -> std::result::Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(COOKIE, HeaderValue::from_static("_nss=1"));
        let client = Client::builder()
            .user_agent(SCRAPE_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            cache: PageCache::new(),
            transport: TransportRetry::default(),
        })
    }

    async fn fetch_page(&mut self, url: &str) -> std::result::Result<&str, FeedError> {
        let client = self.client.clone();
        let transport = self.transport;
        self.cache
            .get_or_fetch(url, || async move {
                let response = transport.send(client.get(url)).await?;
                if response.status() != StatusCode::OK {
                    return Err(FeedError::Status(response.status().as_u16()));
                }
                Ok(response.text().await?)
            })
            .await
    }

    /// Fetch a chart page and report its structure. Debugging aid for when
    /// the upstream HTML changes shape.
    pub async fn diagnose(
        &mut self,
        url: &str,
        section_title: &str,
    ) -> std::result::Result<String, FeedError> {
        let body = self.fetch_page(url).await?;
        Ok(diagnose_page(body, section_title))
    }
}

#[async_trait]
impl ChartFeed for FlixPatrolFeed {
    async fn fetch_section(&mut self, url: &str, section_title: &str) -> SectionOutcome {
        let content_hint = content_hint_from_section(section_title);
        let body = match self.fetch_page(url).await {
            Ok(body) => body,
            Err(err) => {
                error!("failed to retrieve page {url}: {err}");
                return SectionOutcome::Failed(err);
            }
        };
        SectionOutcome::Listings(parse_chart_rows(body, section_title, content_hint))
    }

    async fn detail_signals(&mut self, slug: &str) -> DetailSignals {
        let url = format!("{FLIXPATROL_BASE}/title/{slug}");
        let response = match self.transport.send(self.client.get(&url)).await {
            Ok(response) => response,
            Err(err) => {
                warn!("request failed for detail page {slug}: {err}");
                return DetailSignals::default();
            }
        };
        if response.status() != StatusCode::OK {
            warn!(
                "failed to retrieve detail page {url} (status {})",
                response.status()
            );
            return DetailSignals::default();
        }
        match response.text().await {
            Ok(body) => parse_detail_signals(&body),
            Err(err) => {
                warn!("failed to read detail page {slug}: {err}");
                DetailSignals::default()
            }
        }
    }
}

/// Structural report for one chart page, for debugging upstream HTML
/// changes: which headings exist, whether the expected section was found,
/// and how much of the table structure under it is present.
pub fn diagnose_page(html: &str, section_title: &str) -> String {
    let document = Html::parse_document(html);
    let mut report = String::new();

    for level in 1..=6 {
        let selector =
            Selector::parse(&format!("h{level}")).expect("heading selector should parse");
        let texts: Vec<String> = document
            .select(&selector)
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
            .collect();
        if !texts.is_empty() {
            let _ = writeln!(report, "h{level} tags ({} found):", texts.len());
            for text in texts.iter().take(15) {
                let _ = writeln!(report, "  {text}");
            }
        }
    }

    let headings: Vec<ElementRef<'_>> = document.select(&HEADING_SELECTOR).collect();
    let header = headings
        .iter()
        .find(|h| element_text(h).eq_ignore_ascii_case(section_title));
    match header {
        None => {
            let _ = writeln!(report, "section '{section_title}': NOT FOUND");
        }
        Some(header) => {
            let _ = writeln!(
                report,
                "section '{section_title}': found as <{}>",
                header.value().name()
            );
            let card = header.ancestors().filter_map(ElementRef::wrap).find(|el| {
                el.value().name() == "div" && el.value().classes().any(|c| c == "card")
            });
            match card {
                None => {
                    let _ = writeln!(report, "  card container: NOT FOUND");
                }
                Some(card) => {
                    let rows = card
                        .select(&TBODY_SELECTOR)
                        .next()
                        .map(|tbody| tbody.select(&ROW_SELECTOR).count());
                    match rows {
                        None => {
                            let _ = writeln!(report, "  table body: NOT FOUND");
                        }
                        Some(count) => {
                            let _ = writeln!(report, "  table body: {count} rows");
                        }
                    }
                }
            }
        }
    }

    report
}
