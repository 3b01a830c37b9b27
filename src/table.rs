//! Data table model: column definitions and pagination arithmetic
//!
//! Kept free of widgets so the cell and pager logic can be tested; the
//! `ui::table` module turns it into iced elements.

use serde::Serialize;
use serde_json::Value;

/// What a cell shows
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Text(String),
    /// Placeholder text rendered dimmed
    Muted(String),
    /// Thumbnail; `None` renders a "No Image" box
    Image(Option<String>),
    /// Row actions (details, edit, delete)
    Actions,
}

/// How a column produces its cell
pub enum Cell<T> {
    /// Whole-row renderer
    Render(fn(&T) -> CellContent),
    /// Field lookup by key, optionally formatted
    Value {
        key: &'static str,
        format: Option<fn(&Value, &T) -> CellContent>,
    },
}

pub struct Column<T> {
    pub header: &'static str,
    pub cell: Cell<T>,
}

impl<T> Column<T> {
    pub fn render(header: &'static str, f: fn(&T) -> CellContent) -> Self {
        Self { header, cell: Cell::Render(f) }
    }

    pub fn value(header: &'static str, key: &'static str) -> Self {
        Self { header, cell: Cell::Value { key, format: None } }
    }

    pub fn formatted(header: &'static str, key: &'static str, format: fn(&Value, &T) -> CellContent) -> Self {
        Self {
            header,
            cell: Cell::Value { key, format: Some(format) },
        }
    }
}

impl<T: Serialize> Column<T> {
    /// Cell for one row; `row` is the item serialized once per row
    pub fn content(&self, item: &T, row: &Value) -> CellContent {
        match &self.cell {
            Cell::Render(f) => f(item),
            Cell::Value { key, format } => {
                let value = row.get(*key).unwrap_or(&Value::Null);
                match format {
                    Some(format) => format(value, item),
                    None => CellContent::Text(plain(value)),
                }
            }
        }
    }
}

/// Cells of every row, row-major
pub fn rows<T: Serialize>(columns: &[Column<T>], items: &[T]) -> Vec<Vec<CellContent>> {
    items
        .iter()
        .map(|item| {
            let row = serde_json::to_value(item).unwrap_or(Value::Null);
            columns.iter().map(|c| c.content(item, &row)).collect()
        })
        .collect()
}

/// Display text of a JSON value
pub fn plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Total number of results behind a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Total {
    Exact(u64),
    /// The backend did not say, and the page was full, so there may be more
    AtLeast(u64),
}

impl Total {
    pub fn count(self) -> u64 {
        match self {
            Total::Exact(n) | Total::AtLeast(n) => n,
        }
    }
}

/// Pager state of a list view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
    pub total: Total,
}

impl Pagination {
    /// Pager for a page of `page_len` items fetched at `offset`/`limit`.
    ///
    /// Uses the backend total when reported. Otherwise a short page fixes
    /// the total at `offset + page_len`; a full page only says "at least".
    pub fn for_page(offset: u32, limit: u32, page_len: usize, reported: Option<u64>) -> Self {
        let limit = limit.max(1);
        let seen = offset as u64 + page_len as u64;
        let total = match reported {
            Some(total) => Total::Exact(total),
            None if page_len as u64 >= limit as u64 => Total::AtLeast(seen),
            None => Total::Exact(seen),
        };
        Self { offset, limit, total }
    }

    pub fn current_page(&self) -> u64 {
        self.offset as u64 / self.limit as u64 + 1
    }

    /// Never less than one
    pub fn total_pages(&self) -> u64 {
        let pages = self.total.count().div_ceil(self.limit as u64).max(1);
        match self.total {
            Total::Exact(_) => pages,
            Total::AtLeast(_) => pages.max(self.current_page() + 1),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.total_pages()
    }

    pub fn previous_offset(&self) -> Option<u32> {
        self.has_previous()
            .then(|| ((self.current_page() - 2) * self.limit as u64).min(u32::MAX as u64) as u32)
    }

    pub fn next_offset(&self) -> Option<u32> {
        self.has_next()
            .then(|| u32::try_from(self.current_page() * self.limit as u64).ok())
            .flatten()
    }

    /// "Showing 1 to 3 of 3 results"
    pub fn summary(&self) -> String {
        let total = self.total.count();
        let from = (self.offset as u64 + 1).min(total);
        let to = (self.offset as u64 + self.limit as u64).min(total);
        match self.total {
            Total::Exact(_) => format!("Showing {} to {} of {} results", from, to, total),
            Total::AtLeast(_) => format!("Showing {} to {} of {}+ results", from, to, total),
        }
    }

    /// "Page 1 of 1"
    pub fn page_label(&self) -> String {
        match self.total {
            Total::Exact(_) => format!("Page {} of {}", self.current_page(), self.total_pages()),
            Total::AtLeast(_) => format!("Page {}", self.current_page()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{Category, Product};
    use serde_json::json;

    fn product(name: &str, category: Option<&str>) -> Product {
        Product {
            id: format!("id-{}", name),
            name: name.into(),
            description: "desc".into(),
            price: 12.5,
            slug: name.to_lowercase(),
            images: vec![],
            category: category.map(|c| Category {
                id: "c1".into(),
                name: c.into(),
                description: None,
                image: None,
            }),
        }
    }

    #[test]
    fn test_short_first_page() {
        let p = Pagination::for_page(0, 10, 3, None);
        assert_eq!(p.summary(), "Showing 1 to 3 of 3 results");
        assert_eq!(p.page_label(), "Page 1 of 1");
        assert!(!p.has_next());
        assert!(!p.has_previous());
    }

    #[test]
    fn test_full_page_allows_next() {
        let p = Pagination::for_page(10, 10, 10, None);
        assert_eq!(p.current_page(), 2);
        assert!(p.has_next());
        assert_eq!(p.next_offset(), Some(20));
        assert_eq!(p.previous_offset(), Some(0));
        assert_eq!(p.summary(), "Showing 11 to 20 of 20+ results");
        assert_eq!(p.page_label(), "Page 2");
    }

    #[test]
    fn test_reported_total() {
        let p = Pagination::for_page(20, 10, 10, Some(45));
        assert_eq!(p.page_label(), "Page 3 of 5");
        assert_eq!(p.next_offset(), Some(30));
    }

    #[test]
    fn test_empty_list() {
        let p = Pagination::for_page(0, 10, 0, None);
        assert_eq!(p.summary(), "Showing 0 to 0 of 0 results");
        assert_eq!(p.page_label(), "Page 1 of 1");
        assert!(!p.has_next());
    }

    #[test]
    fn test_cells() {
        let columns = vec![
            Column::render("Category", |p: &Product| CellContent::Text(p.category_name().to_string())),
            Column::value("Name", "name"),
            Column::formatted("Price", "price", |v, _| {
                CellContent::Text(format!("${:.2}", v.as_f64().unwrap_or_default()))
            }),
            Column::value("Missing", "nope"),
        ];
        let rows = rows(&columns, &[product("Runner", None), product("Boot", Some("Shoes"))]);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                CellContent::Text("N/A".into()),
                CellContent::Text("Runner".into()),
                CellContent::Text("$12.50".into()),
                CellContent::Text(String::new()),
            ]
        );
        assert_eq!(rows[1][0], CellContent::Text("Shoes".into()));
    }

    #[test]
    fn test_plain() {
        assert_eq!(plain(&json!(3)), "3");
        assert_eq!(plain(&json!("x")), "x");
        assert_eq!(plain(&Value::Null), "");
    }
}
