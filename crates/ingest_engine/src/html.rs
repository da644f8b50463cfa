use std::collections::HashSet;
use std::sync::Arc;

use ingest_core::{IdStrategy, Locator, Record, RecordFields};
use ingest_logging::ingest_debug;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::decode::decode_page;
use crate::fetch::Fetcher;
use crate::{Extractor, IngestError, PageContent};

const TITLE_SELECTOR: &str = "h1";
const DATE_SELECTOR: &str = "time[datetime]";
const AUTHOR_SELECTOR: &str = ".author";
const PARAGRAPH_SELECTOR: &str = "article p, .post-content p, .content p";

/// Optional fields and body text pulled from one article page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
    pub content: String,
}

/// Field extraction for article pages. Every field is optional except the
/// body, which is empty when no paragraphs match.
#[derive(Debug)]
pub struct ArticleParser {
    title: Selector,
    date: Selector,
    author: Selector,
    paragraphs: Selector,
}

impl ArticleParser {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            title: parse_selector(TITLE_SELECTOR)?,
            date: parse_selector(DATE_SELECTOR)?,
            author: parse_selector(AUTHOR_SELECTOR)?,
            paragraphs: parse_selector(PARAGRAPH_SELECTOR)?,
        })
    }

    pub fn extract(&self, html: &str) -> ArticleFields {
        let doc = Html::parse_document(html);

        let title = doc.select(&self.title).next().and_then(element_text);
        let date = doc
            .select(&self.date)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let author = doc.select(&self.author).next().and_then(element_text);
        let content = doc
            .select(&self.paragraphs)
            .filter_map(element_text)
            .collect::<Vec<_>>()
            .join("\n\n");

        ArticleFields {
            title,
            author,
            date,
            content,
        }
    }
}

/// Whitespace-collapsed text of an element, `None` when blank.
fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(|chunk| chunk.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

fn parse_selector(raw: &str) -> Result<Selector, IngestError> {
    Selector::parse(raw)
        .map_err(|err| IngestError::Config(format!("invalid css selector {raw:?}: {err}")))
}

/// Resolve an `href` against the page URL. Empty, script and non-http(s)
/// targets are not content items.
fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    let url = base.join(trimmed).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Listing-page crawler: one start page, links found under
/// `list_selector link_selector`, one record per linked article.
pub struct HtmlExtractor {
    name: String,
    source: String,
    start_url: Url,
    list_selector: Selector,
    link_selector: Selector,
    article: ArticleParser,
    fetcher: Arc<dyn Fetcher>,
    ids: IdStrategy,
}

impl HtmlExtractor {
    pub fn new(
        name: impl Into<String>,
        start_url: &str,
        list_selector: &str,
        link_selector: &str,
        fetcher: Arc<dyn Fetcher>,
        ids: IdStrategy,
    ) -> Result<Self, IngestError> {
        let parsed = Url::parse(start_url)
            .map_err(|err| IngestError::Config(format!("invalid start url {start_url:?}: {err}")))?;
        Ok(Self {
            name: name.into(),
            source: start_url.to_string(),
            start_url: parsed,
            list_selector: parse_selector(list_selector)?,
            link_selector: parse_selector(link_selector)?,
            article: ArticleParser::new()?,
            fetcher,
            ids,
        })
    }

    /// Item URLs on a listing page, in document order per container.
    /// Duplicate URLs are kept; an element matched through nested containers
    /// is only visited once.
    pub fn listing_links(&self, html: &str, base: &Url) -> Vec<Url> {
        let doc = Html::parse_document(html);
        let mut visited = HashSet::new();
        let mut links = Vec::new();
        for container in doc.select(&self.list_selector) {
            for anchor in container.select(&self.link_selector) {
                if !visited.insert(anchor.id()) {
                    continue;
                }
                let Some(href) = anchor.value().attr("href") else {
                    continue;
                };
                match resolve_href(href, base) {
                    Some(url) => links.push(url),
                    None => ingest_debug!("{}: skipping href {:?}", self.name, href),
                }
            }
        }
        links
    }
}

#[async_trait::async_trait]
impl Extractor for HtmlExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_pages(&self) -> Vec<Locator> {
        vec![Locator::Url(self.start_url.clone())]
    }

    async fn fetch_page(&self, page: &Locator) -> Result<PageContent, IngestError> {
        Ok(self.fetcher.fetch(page).await?)
    }

    fn parse_items(&self, page: &PageContent) -> Result<Vec<Locator>, IngestError> {
        let locator = &page.metadata.locator;
        // Links resolve against the listed page, not wherever it redirected to.
        let base = locator.as_url().unwrap_or(&self.start_url);
        let html = decode_page(
            &page.bytes,
            page.metadata.content_type.as_deref(),
            page.base_url(),
        )
        .map_err(|err| IngestError::parse(locator, err.to_string()))?;
        let links = self.listing_links(&html, base);
        ingest_debug!("{}: {} item links on {}", self.name, links.len(), locator);
        Ok(links.into_iter().map(Locator::Url).collect())
    }

    async fn extract_content(&self, item: &Locator) -> Result<Record, IngestError> {
        let page = self.fetcher.fetch(item).await?;
        let html = decode_page(
            &page.bytes,
            page.metadata.content_type.as_deref(),
            page.base_url(),
        )
        .map_err(|err| IngestError::extraction(item, err.to_string()))?;
        let article = self.article.extract(&html);

        let fields = RecordFields {
            source: self.source.clone(),
            url: Some(item.to_string()),
            title: article.title,
            author: article.author,
            date: article.date,
            content: article.content,
        };
        Ok(fields.into_record(self.ids))
    }
}
