use itertools::Itertools;
use scraper::ElementRef;
use tracing::{debug, warn};

use crate::pipeline::extract;
use crate::table::RecordTable;

/// Compute-indicator column names; a table whose header intersects this set
/// is a pricing table, everything else (legal footnotes, feature matrices)
/// is dropped after extraction.
const RELEVANT_COLUMNS: [&str; 4] = ["vCPU(s)", "GPU", "Core", "RAM"];

/// Extract every pricing-relevant table and merge the survivors into one
/// record set by column-name union.
///
/// Tables with no header cells at all are skipped before extraction;
/// malformed tables are logged and skipped so their siblings still
/// contribute.
pub fn select_and_merge<'a, I>(tables: I, region: &str) -> RecordTable
where
    I: Iterator<Item = ElementRef<'a>>,
{
    let mut extracted = Vec::new();
    for (idx, table) in tables.enumerate() {
        if !extract::has_header_cells(table) {
            debug!("Skipping table #{}: no header cells", idx);
            continue;
        }
        match extract::extract(table, region) {
            Ok(records) => extracted.push(records),
            Err(err) => warn!("Skipping malformed table #{}: {}", idx, err),
        }
    }
    extracted.retain(|t| RELEVANT_COLUMNS.iter().any(|c| t.has_column(c)));
    merge(&extracted)
}

/// Union-merge: the merged column list is every table's columns in first
/// encounter order; a row's cells for columns its own table never had stay
/// absent rather than being coerced into another table's schema.
fn merge(tables: &[RecordTable]) -> RecordTable {
    let columns: Vec<String> = tables
        .iter()
        .flat_map(|t| t.columns())
        .unique()
        .cloned()
        .collect();

    let mut merged = RecordTable::new(columns);
    for table in tables {
        for row in 0..table.len() {
            let cells: Vec<Option<String>> = merged
                .columns()
                .iter()
                .map(|c| table.value(row, c).map(str::to_string))
                .collect();
            merged.push_row(cells);
        }
    }
    merged
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn merge_html(html: &str, region: &str) -> RecordTable {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("table").unwrap();
        select_and_merge(doc.select(&sel), region)
    }

    #[test]
    fn union_columns_in_first_encounter_order() {
        let html = r#"
            <table>
                <tr><th>Instance</th><th>vCPU(s)</th><th>RAM</th></tr>
                <tr><td>D2s v3</td><td>2</td><td>8 GiB</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>Core</th><th>RAM</th></tr>
                <tr><td>A0</td><td>1</td><td>0.75 GiB</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        assert_eq!(
            merged.columns(),
            &["Region", "Instance", "vCPU(s)", "RAM", "Core"]
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn absent_marker_for_columns_missing_in_source() {
        let html = r#"
            <table>
                <tr><th>Instance</th><th>vCPU(s)</th></tr>
                <tr><td>D2s v3</td><td>2</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>Core</th></tr>
                <tr><td>A0</td><td>1</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        // Never zero or empty string: a column the source table lacked is absent.
        assert_eq!(merged.value(0, "Core"), None);
        assert_eq!(merged.value(0, "vCPU(s)"), Some("2"));
        assert_eq!(merged.value(1, "vCPU(s)"), None);
        assert_eq!(merged.value(1, "Core"), Some("1"));
    }

    #[test]
    fn irrelevant_tables_dropped() {
        let html = r#"
            <table>
                <tr><th>Term</th><th>Description</th></tr>
                <tr><td>Spot</td><td>Unused capacity at a discount</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>RAM</th></tr>
                <tr><td>D2s v3</td><td>8 GiB</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        assert_eq!(merged.len(), 1);
        assert!(!merged.has_column("Term"));
        assert_eq!(merged.value(0, "Instance"), Some("D2s v3"));
    }

    #[test]
    fn headerless_tables_skipped_before_extraction() {
        let html = r#"
            <table>
                <tr><td>Try Azure free</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>RAM</th></tr>
                <tr><td>D2s v3</td><td>8 GiB</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn malformed_table_skipped_but_siblings_survive() {
        let html = r#"
            <table>
                <tr><td>promo row</td><td>ahead of headers</td></tr>
                <tr><th>Instance</th><th>RAM</th></tr>
                <tr><td>broken</td><td>1 GiB</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>RAM</th></tr>
                <tr><td>D2s v3</td><td>8 GiB</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.value(0, "Instance"), Some("D2s v3"));
    }

    #[test]
    fn rows_keep_table_then_row_order() {
        let html = r#"
            <table>
                <tr><th>Instance</th><th>RAM</th></tr>
                <tr><td>D2s v3</td><td>8 GiB</td></tr>
                <tr><td>D4s v3</td><td>16 GiB</td></tr>
            </table>
            <table>
                <tr><th>Instance</th><th>Core</th></tr>
                <tr><td>A0</td><td>1</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        let names: Vec<_> = (0..merged.len())
            .map(|i| merged.value(i, "Instance").unwrap().to_string())
            .collect();
        assert_eq!(names, ["D2s v3", "D4s v3", "A0"]);
    }

    #[test]
    fn no_relevant_tables_yields_empty_merge() {
        let html = r#"
            <table>
                <tr><th>Term</th><th>Description</th></tr>
                <tr><td>Spot</td><td>copy</td></tr>
            </table>
        "#;
        let merged = merge_html(html, "us-east");
        assert!(merged.is_empty());
    }
}
