use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::StreamExt;
use ingest_core::{IdStrategy, Locator, Record, RecordFields};
use ingest_engine::{
    Extractor, FetchMetadata, FetchOutput, IngestError, OutputOrder, PageContent, Pipeline,
    PipelineError, Stage,
};
use pretty_assertions::assert_eq;
use url::Url;

fn loc(path: &str) -> Locator {
    Locator::Url(Url::parse(&format!("https://stub.test/{path}")).unwrap())
}

/// In-memory extractor. Item `x-n` sleeps `60 - 10n` ms so that later items
/// finish first.
#[derive(Default)]
struct StubExtractor {
    pages: Vec<String>,
    items: HashMap<String, Vec<String>>,
    failing_pages: Vec<String>,
    failing_items: Vec<String>,
    fetched_pages: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubExtractor {
    fn with_pages(pages: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            pages: pages.iter().map(|(page, _)| page.to_string()).collect(),
            items: pages
                .iter()
                .map(|(page, items)| {
                    (
                        page.to_string(),
                        items.iter().map(|item| item.to_string()).collect(),
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    fn path_of(locator: &Locator) -> String {
        locator
            .as_url()
            .map(|url| url.path().trim_start_matches('/').to_string())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Extractor for StubExtractor {
    fn name(&self) -> &str {
        "stub"
    }

    fn list_pages(&self) -> Vec<Locator> {
        self.pages.iter().map(|page| loc(page)).collect()
    }

    async fn fetch_page(&self, page: &Locator) -> Result<PageContent, IngestError> {
        let path = Self::path_of(page);
        self.fetched_pages.lock().unwrap().push(path.clone());
        if self.failing_pages.contains(&path) {
            return Err(IngestError::Parse {
                locator: page.to_string(),
                message: "listing unavailable".to_string(),
            });
        }
        Ok(FetchOutput {
            bytes: Vec::new(),
            metadata: FetchMetadata {
                locator: page.clone(),
                final_url: page.as_url().cloned(),
                redirect_count: 0,
                content_type: None,
                byte_len: 0,
            },
        })
    }

    fn parse_items(&self, page: &PageContent) -> Result<Vec<Locator>, IngestError> {
        let path = Self::path_of(&page.metadata.locator);
        Ok(self
            .items
            .get(&path)
            .map(|items| items.iter().map(|item| loc(item)).collect())
            .unwrap_or_default())
    }

    async fn extract_content(&self, item: &Locator) -> Result<Record, IngestError> {
        let path = Self::path_of(item);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let rank: u64 = path
            .rsplit('-')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(rank * 10))).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_items.contains(&path) {
            return Err(IngestError::Extraction {
                locator: item.to_string(),
                message: "unreadable".to_string(),
            });
        }
        Ok(RecordFields {
            source: "stub".to_string(),
            url: Some(item.to_string()),
            content: path,
            ..RecordFields::default()
        }
        .into_record(IdStrategy::ContentHash))
    }
}

async fn collect(
    pipeline: Pipeline,
    extractor: &StubExtractor,
) -> Vec<Result<String, (Stage, String)>> {
    pipeline
        .run(extractor)
        .map(|result| match result {
            Ok(record) => Ok(record.content),
            Err(PipelineError { stage, locator, .. }) => {
                Err((stage, StubExtractor::path_of(&locator)))
            }
        })
        .collect()
        .await
}

#[tokio::test]
async fn sequential_order_follows_pages_then_items() {
    let extractor = StubExtractor::with_pages(vec![
        ("list-a", vec!["a-0", "a-1", "a-2", "a-3", "a-4"]),
        ("list-b", vec!["b-0", "b-1"]),
    ]);

    let results = collect(Pipeline::new(4, OutputOrder::Sequential), &extractor).await;
    let expected: Vec<Result<String, (Stage, String)>> =
        ["a-0", "a-1", "a-2", "a-3", "a-4", "b-0", "b-1"]
            .iter()
            .map(|s| Ok(s.to_string()))
            .collect();
    assert_eq!(results, expected);
    assert!(extractor.peak_in_flight.load(Ordering::SeqCst) > 1);
    assert!(extractor.peak_in_flight.load(Ordering::SeqCst) <= 4);
}

#[tokio::test]
async fn unordered_output_yields_every_record() {
    let extractor =
        StubExtractor::with_pages(vec![("list-a", vec!["a-0", "a-1", "a-2", "a-3"])]);

    let mut results: Vec<String> = collect(Pipeline::new(4, OutputOrder::Unordered), &extractor)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(results.first().map(String::as_str), Some("a-3"));
    results.sort();
    assert_eq!(results, vec!["a-0", "a-1", "a-2", "a-3"]);
}

#[tokio::test]
async fn concurrency_of_one_extracts_serially() {
    let extractor = StubExtractor::with_pages(vec![("list-a", vec!["a-0", "a-1", "a-2"])]);
    let results = collect(Pipeline::new(0, OutputOrder::Unordered), &extractor).await;
    assert_eq!(results.len(), 3);
    assert_eq!(extractor.peak_in_flight.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failing_item_does_not_stop_the_run() {
    let mut extractor = StubExtractor::with_pages(vec![
        ("list-a", vec!["a-0", "a-1", "a-2"]),
        ("list-b", vec!["b-0"]),
    ]);
    extractor.failing_items = vec!["a-1".to_string()];

    let results = collect(Pipeline::default(), &extractor).await;
    assert_eq!(
        results,
        vec![
            Ok("a-0".to_string()),
            Err((Stage::Item, "a-1".to_string())),
            Ok("a-2".to_string()),
            Ok("b-0".to_string()),
        ]
    );
}

#[tokio::test]
async fn listing_failure_ends_the_source() {
    let mut extractor = StubExtractor::with_pages(vec![
        ("list-a", vec!["a-0"]),
        ("list-b", vec!["b-0"]),
        ("list-c", vec!["c-0"]),
    ]);
    extractor.failing_pages = vec!["list-b".to_string()];

    let results = collect(Pipeline::default(), &extractor).await;
    assert_eq!(
        results,
        vec![
            Ok("a-0".to_string()),
            Err((Stage::Listing, "list-b".to_string())),
        ]
    );
    assert_eq!(
        *extractor.fetched_pages.lock().unwrap(),
        vec!["list-a".to_string(), "list-b".to_string()]
    );
}

#[tokio::test]
async fn page_without_items_yields_nothing() {
    let extractor = StubExtractor::with_pages(vec![("list-a", vec![])]);
    let results = collect(Pipeline::default(), &extractor).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn run_restarts_from_scratch() {
    let extractor = StubExtractor::with_pages(vec![("list-a", vec!["a-0", "a-1"])]);
    let pipeline = Pipeline::default();

    let first = collect(pipeline, &extractor).await;
    let second = collect(pipeline, &extractor).await;
    assert_eq!(first, second);
    assert_eq!(extractor.fetched_pages.lock().unwrap().len(), 2);
}

#[test]
fn pipeline_clamps_concurrency() {
    let pipeline = Pipeline::new(0, OutputOrder::Sequential);
    assert_eq!(pipeline.concurrency(), 1);
    assert_eq!(Pipeline::default().order(), OutputOrder::Sequential);
}
