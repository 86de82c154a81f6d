/// Column-labelled rows extracted from one source table, or the union of
/// several. A cell is `None` wherever the source carried no value for that
/// column — absence is explicit, never a sentinel string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>) -> Self {
        RecordTable {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding with absent cells or truncating so every row
    /// stays exactly as wide as the column list.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at (row, column). `None` both when the column is unknown and
    /// when the cell is absent.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn short_row_padded_with_absent() {
        let mut t = RecordTable::new(columns(&["A", "B", "C"]));
        t.push_row(vec![Some("1".into())]);
        assert_eq!(t.rows()[0], vec![Some("1".into()), None, None]);
    }

    #[test]
    fn long_row_truncated() {
        let mut t = RecordTable::new(columns(&["A"]));
        t.push_row(vec![Some("1".into()), Some("2".into())]);
        assert_eq!(t.rows()[0], vec![Some("1".into())]);
    }

    #[test]
    fn value_lookup() {
        let mut t = RecordTable::new(columns(&["A", "B"]));
        t.push_row(vec![Some("1".into()), None]);
        assert_eq!(t.value(0, "A"), Some("1"));
        assert_eq!(t.value(0, "B"), None);
        assert_eq!(t.value(0, "Missing"), None);
        assert_eq!(t.value(7, "A"), None);
    }

    #[test]
    fn column_membership() {
        let t = RecordTable::new(columns(&["Region", "Instance"]));
        assert!(t.has_column("Instance"));
        assert!(!t.has_column("GPU"));
        assert_eq!(t.column_index("Instance"), Some(1));
    }

    #[test]
    fn empty_table() {
        let t = RecordTable::new(Vec::new());
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
    }
}
