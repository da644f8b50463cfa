use futures_util::stream::{self, BoxStream, StreamExt};
use ingest_core::{Locator, Record};

use crate::{Extractor, PipelineError, Stage};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// Order in which extracted records leave the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputOrder {
    /// Page order, then item order within a page, regardless of which
    /// extraction finishes first.
    #[default]
    Sequential,
    /// Completion order. Only for consumers that do not care about ordering.
    Unordered,
}

/// Drives one extractor through list → fetch → parse → extract.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    concurrency: usize,
    order: OutputOrder,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, OutputOrder::Sequential)
    }
}

impl Pipeline {
    /// `concurrency` bounds simultaneous item extractions per source; zero is
    /// treated as one.
    pub fn new(concurrency: usize, order: OutputOrder) -> Self {
        Self {
            concurrency: concurrency.max(1),
            order,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn order(&self) -> OutputOrder {
        self.order
    }

    /// Lazy record stream for one extractor. Each call starts from scratch.
    ///
    /// Item failures are yielded and the stream carries on with the next
    /// item. A listing failure is yielded as the last element: nothing after
    /// it is fetched.
    pub fn run<'a>(
        &self,
        extractor: &'a dyn Extractor,
    ) -> BoxStream<'a, Result<Record, PipelineError>> {
        let state = RunState {
            extractor,
            pages: extractor.list_pages().into_iter(),
            items: None,
            halted: false,
        };
        let pipeline = *self;

        stream::unfold(state, move |mut state| async move {
            loop {
                if state.halted {
                    return None;
                }
                if let Some(items) = state.items.as_mut() {
                    if let Some(result) = items.next().await {
                        return Some((result, state));
                    }
                    state.items = None;
                }
                let page = state.pages.next()?;
                match list_items(state.extractor, page).await {
                    Ok(items) => {
                        state.items = Some(pipeline.extract_all(state.extractor, items));
                    }
                    Err(err) => {
                        state.halted = true;
                        return Some((Err(err), state));
                    }
                }
            }
        })
        .boxed()
    }

    fn extract_all<'a>(
        &self,
        extractor: &'a dyn Extractor,
        items: Vec<Locator>,
    ) -> BoxStream<'a, Result<Record, PipelineError>> {
        let extractions = stream::iter(items).map(move |item| extract_item(extractor, item));
        match self.order {
            OutputOrder::Sequential => extractions.buffered(self.concurrency).boxed(),
            OutputOrder::Unordered => extractions.buffer_unordered(self.concurrency).boxed(),
        }
    }
}

struct RunState<'a> {
    extractor: &'a dyn Extractor,
    pages: std::vec::IntoIter<Locator>,
    items: Option<BoxStream<'a, Result<Record, PipelineError>>>,
    halted: bool,
}

async fn list_items(
    extractor: &dyn Extractor,
    page: Locator,
) -> Result<Vec<Locator>, PipelineError> {
    let listing_error = |error| PipelineError {
        stage: Stage::Listing,
        locator: page.clone(),
        error,
    };
    let content = extractor.fetch_page(&page).await.map_err(listing_error)?;
    extractor.parse_items(&content).map_err(listing_error)
}

async fn extract_item(extractor: &dyn Extractor, item: Locator) -> Result<Record, PipelineError> {
    extractor
        .extract_content(&item)
        .await
        .map_err(|error| PipelineError {
            stage: Stage::Item,
            locator: item.clone(),
            error,
        })
}
