//! Table projection and the sorted, paginated view over a result.

use std::cmp::Ordering;

use serde::Serialize;

use crate::db::{QueryResult, Row, Value};

/// Rows per page when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A result's columns and rows, unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableProjection {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl TableProjection {
    pub fn from_result(result: &QueryResult) -> Self {
        Self {
            columns: result.columns.clone(),
            rows: result.rows.clone(),
        }
    }

    /// The first `n` rows, for compact display. The projection itself keeps
    /// every row.
    pub fn preview_rows(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Asc),
            "desc" | "descending" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// Column to sort by, and which way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
}

/// View state of a data grid: an optional sort followed by pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    sort: Option<SortKey>,
    page_index: usize,
    page_size: usize,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TableView {
    /// Unsorted view on the first page.
    pub fn new(page_size: usize) -> Self {
        Self {
            sort: None,
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    /// Sorts by `column`. Any sort change goes back to the first page.
    pub fn sort_by(&mut self, column: impl Into<String>, direction: SortDirection) {
        self.sort = Some(SortKey {
            column: column.into(),
            direction,
        });
        self.page_index = 0;
    }

    /// Restores result order and goes back to the first page.
    pub fn clear_sort(&mut self) {
        self.sort = None;
        self.page_index = 0;
    }

    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
    }

    pub fn sort(&self) -> Option<&SortKey> {
        self.sort.as_ref()
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages needed for `total_rows` (at least one).
    pub fn page_count(&self, total_rows: usize) -> usize {
        total_rows.div_ceil(self.page_size).max(1)
    }

    /// Rows of the current page, after sorting.
    ///
    /// A sort on a column the result does not have leaves result order. A
    /// page past the end is empty.
    pub fn apply<'a>(&self, result: &'a QueryResult) -> Vec<&'a Row> {
        let mut rows: Vec<&Row> = result.rows.iter().collect();

        if let Some(key) = &self.sort {
            if let Some(index) = result.column_index(&key.column) {
                // sort_by is stable, so equal cells keep result order.
                rows.sort_by(|a, b| compare_cells(cell(a, index), cell(b, index), key.direction));
            }
        }

        rows.into_iter()
            .skip(self.page_index.saturating_mul(self.page_size))
            .take(self.page_size)
            .collect()
    }
}

fn cell(row: &Row, index: usize) -> &Value {
    static NULL: Value = Value::Null;
    row.get(index).unwrap_or(&NULL)
}

/// Orders two cells for a grid sort.
///
/// NULLs sort after everything when ascending and before everything when
/// descending. Two numbers compare numerically, anything else compares by
/// display text.
pub fn compare_cells(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
    let ascending = direction == SortDirection::Asc;
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, true) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, false) => {
            let ord = if a.is_number() && b.is_number() {
                a.to_number()
                    .partial_cmp(&b.to_number())
                    .unwrap_or(Ordering::Equal)
            } else {
                a.to_display_string().cmp(&b.to_display_string())
            };
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
    }
}
