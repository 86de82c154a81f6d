use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use serde_json::Value;
use thiserror::Error;

use crate::table::RecordTable;

static TR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static TH_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());
static TD_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

#[derive(Debug, Error, PartialEq)]
pub enum MalformedTableError {
    #[error("table has no header row")]
    MissingHeader,
    #[error("table has a data row before any header row")]
    DataBeforeHeader,
}

/// True when the table contains at least one header cell anywhere.
pub fn has_header_cells(table: ElementRef) -> bool {
    table.select(&TH_SEL).next().is_some()
}

/// Extract one `<table>` into records keyed by its own header row.
///
/// The header is the first row carrying `<th>` cells; every record is
/// stamped with a leading `Region` column. Data rows are truncated to the
/// header width, and shorter rows are padded with absent cells. A cell
/// carrying a regional price payload yields the payload value for `region`
/// instead of its displayed text.
pub fn extract(table: ElementRef, region: &str) -> Result<RecordTable, MalformedTableError> {
    let mut columns: Option<Vec<String>> = None;
    let mut data: Vec<Vec<Option<String>>> = Vec::new();

    for row in table.select(&TR_SEL) {
        let width = match &columns {
            Some(cols) => cols.len(),
            None => {
                let heads: Vec<String> = row.select(&TH_SEL).map(cell_text).collect();
                if heads.is_empty() {
                    if row.select(&TD_SEL).next().is_some() {
                        return Err(MalformedTableError::DataBeforeHeader);
                    }
                    continue;
                }
                let len = heads.len();
                columns = Some(heads);
                len
            }
        };

        // The header row's own <td> cells, if any, count as data.
        let cells: Vec<Option<String>> = row
            .select(&TD_SEL)
            .take(width)
            .map(|cell| cell_value(cell, region))
            .collect();
        if !cells.is_empty() {
            data.push(cells);
        }
    }

    let Some(cols) = columns else {
        return Err(MalformedTableError::MissingHeader);
    };

    let mut records = RecordTable::new(
        std::iter::once("Region".to_string()).chain(cols).collect(),
    );
    for mut cells in data {
        cells.insert(0, Some(region.to_string()));
        records.push_row(cells);
    }
    Ok(records)
}

/// Rendered text with surrounding whitespace and footnote asterisks removed.
fn cell_text(el: ElementRef) -> String {
    let text: String = el.text().collect();
    text.replace('*', "").trim().to_string()
}

/// A cell's value: the regional payload price when the cell (or its nearest
/// descendant) carries one, its displayed text otherwise. A payload that
/// lacks the region key yields absent, never the displayed text.
fn cell_value(cell: ElementRef, region: &str) -> Option<String> {
    let payload = cell
        .descendants()
        .filter_map(ElementRef::wrap)
        .find_map(|el| el.value().attr("data-amount"));
    match payload {
        Some(raw) => regional_price(raw, region),
        None => Some(cell_text(cell)),
    }
}

fn regional_price(raw: &str, region: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(raw).ok()?;
    match payload.get("regional")?.get(region)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ── Tests ──
