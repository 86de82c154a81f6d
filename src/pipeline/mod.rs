pub mod extract;
pub mod merge;
pub mod normalize;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::info;

use crate::db::SkuRow;
use crate::fetch::{FetchError, PageFetcher};
use merge::select_and_merge;
use normalize::{normalize, FieldCoercionError};

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Coerce(#[from] FieldCoercionError),
}

/// Full refresh for one region: fetch the pricing page, pull every table
/// out of it, merge the relevant ones, and normalize into SKU rows.
pub fn run(fetcher: &dyn PageFetcher, region: &str) -> Result<Vec<SkuRow>, PipelineError> {
    info!("Downloading latest pricing data for {}", region);
    let body = fetcher.fetch_page()?;

    let document = Html::parse_document(&body);
    let merged = select_and_merge(document.select(&TABLE_SEL), region);
    let catalog = normalize(&merged)?;

    info!("Normalized {} SKU rows for {}", catalog.len(), region);
    Ok(catalog)
}

// ── Tests ──
