//! State shared by the products and categories lists

use std::fmt;
use std::time::Duration;

use crate::backend::types::{Category, ListPage};
use crate::debounce::Debounce;
use crate::query::{QueryKey, QueryState};
use crate::routes::ListQuery;
use crate::table::Pagination;

/// A list page: the route's list state, the search box, and the fetched page
pub struct ListView<T> {
    pub query: ListQuery,
    pub search: Debounce,
    pub state: QueryState<ListPage<T>>,
}

impl<T> ListView<T> {
    pub fn new(query: ListQuery, delay: Duration) -> Self {
        let search = Debounce::new(query.search.clone().unwrap_or_default(), delay);
        Self {
            query,
            search,
            state: QueryState::loading(),
        }
    }

    /// Keep what is typed in the search box when the new route carries the
    /// same search (paging, filtering, or the search itself settling)
    pub fn carry_search(&mut self, previous: Debounce) {
        if previous.keyword() == self.query.search {
            self.search = previous;
        }
    }

    pub fn key(&self, path: &str) -> QueryKey {
        QueryKey::new(path, self.query.api_params())
    }

    pub fn items(&self) -> &[T] {
        self.state
            .data
            .as_ref()
            .map(|page| page.items.as_slice())
            .unwrap_or_default()
    }

    pub fn pagination(&self) -> Pagination {
        let total = self.state.data.as_ref().and_then(|page| page.total);
        Pagination::for_page(self.query.offset, self.query.limit, self.items().len(), total)
    }
}

/// Entry of the category filter; `id: None` is "All Categories"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChoice {
    pub id: Option<String>,
    pub name: String,
}

impl CategoryChoice {
    pub fn all() -> Self {
        Self {
            id: None,
            name: "All Categories".to_string(),
        }
    }

    /// "All Categories" followed by every category
    pub fn options(categories: &[Category]) -> Vec<Self> {
        std::iter::once(Self::all())
            .chain(categories.iter().map(|c| Self {
                id: Some(c.id.clone()),
                name: c.name.clone(),
            }))
            .collect()
    }

    /// Entry matching `id`, falling back to "All Categories"
    pub fn selected(options: &[Self], id: Option<&str>) -> Self {
        options
            .iter()
            .find(|c| c.id.as_deref() == id)
            .cloned()
            .unwrap_or_else(Self::all)
    }
}

impl fmt::Display for CategoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::paths;

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.into(),
            name: name.into(),
            description: None,
            image: None,
        }
    }

    #[test]
    fn test_list_key_follows_route() {
        let view: ListView<Category> =
            ListView::new(ListQuery::from_query("search=mug&offset=10&limit=5"), Duration::ZERO);
        assert_eq!(view.search.value(), "mug");
        assert_eq!(
            view.key(paths::CATEGORIES).to_string(),
            "categories?limit=5&offset=10&searchedText=mug"
        );
    }

    #[test]
    fn test_pagination_from_page() {
        let mut view: ListView<Category> = ListView::new(ListQuery::default(), Duration::ZERO);
        assert!(view.state.is_loading);
        view.state = QueryState {
            data: Some(ListPage {
                items: vec![category("c1", "Shoes"), category("c2", "Hats"), category("c3", "Bags")],
                total: None,
            }),
            is_success: true,
            ..QueryState::default()
        };
        let pagination = view.pagination();
        assert_eq!(pagination.summary(), "Showing 1 to 3 of 3 results");
        assert!(!pagination.has_next());
    }

    #[test]
    fn test_carry_search() {
        let query = ListQuery::from_query("search=red+");
        let mut typed = Debounce::new("", Duration::ZERO);
        typed.set("red ");

        let mut view: ListView<Category> = ListView::new(query.clone(), Duration::ZERO);
        view.carry_search(typed);
        assert_eq!(view.search.value(), "red ");

        let mut stale = Debounce::new("", Duration::ZERO);
        stale.set("blue");
        let mut view: ListView<Category> = ListView::new(query, Duration::ZERO);
        view.carry_search(stale);
        assert_eq!(view.search.value(), "red ");
    }

    #[test]
    fn test_category_choices() {
        let options = CategoryChoice::options(&[category("c1", "Shoes")]);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].to_string(), "All Categories");
        assert_eq!(CategoryChoice::selected(&options, Some("c1")).name, "Shoes");
        assert_eq!(CategoryChoice::selected(&options, Some("gone")), CategoryChoice::all());
    }
}
