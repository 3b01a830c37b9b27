//! Client routes and the list state they carry
//!
//! Every list view is a function of its route URL: `offset`, `limit`,
//! `search` and, for products, `categoryId`. Interactions build a new
//! [`Route`] and navigate to it, so the history stack and shared links
//! reproduce the same view.

use std::fmt;

use url::form_urlencoded;

use crate::backend::QueryParams;

pub const DEFAULT_LIMIT: u32 = 10;

/// Pagination, search, and filter state of a list view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub offset: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub category_id: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            search: None,
            category_id: None,
        }
    }
}

impl ListQuery {
    /// Parse a query string (with or without the leading `?`).
    ///
    /// Missing or malformed `offset`/`limit` fall back to `0`/`10`; a zero
    /// limit counts as malformed. Blank `search`/`categoryId` are dropped.
    pub fn from_query(query: &str) -> Self {
        let mut list = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "offset" => list.offset = value.trim().parse().unwrap_or(0),
                "limit" => {
                    list.limit = value
                        .trim()
                        .parse()
                        .ok()
                        .filter(|l| *l > 0)
                        .unwrap_or(DEFAULT_LIMIT)
                }
                "search" => list.search = search_text(&value),
                "categoryId" => list.category_id = non_blank(&value),
                _ => {}
            }
        }
        list
    }

    /// Query string in the canonical order `search`, `categoryId`,
    /// `offset`, `limit`
    pub fn to_query(&self) -> String {
        let mut out = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            out.append_pair("search", search);
        }
        if let Some(category_id) = &self.category_id {
            out.append_pair("categoryId", category_id);
        }
        out.append_pair("offset", &self.offset.to_string());
        out.append_pair("limit", &self.limit.to_string());
        out.finish()
    }

    /// Parameters for the backend list endpoint
    pub fn api_params(&self) -> QueryParams {
        let mut params = QueryParams::new()
            .with("offset", self.offset)
            .with("limit", self.limit);
        if let Some(search) = &self.search {
            params.set("searchedText", search);
        }
        if let Some(category_id) = &self.category_id {
            params.set("categoryId", category_id);
        }
        params
    }

    /// New search text; `offset` is kept unless `reset_offset` is set
    pub fn with_search(&self, search: Option<String>, reset_offset: bool) -> Self {
        Self {
            search: search.as_deref().and_then(search_text),
            offset: if reset_offset { 0 } else { self.offset },
            ..self.clone()
        }
    }

    /// New category filter; always back to the first page
    pub fn with_category(&self, category_id: Option<String>) -> Self {
        Self {
            category_id: category_id.as_deref().and_then(non_blank),
            offset: 0,
            ..self.clone()
        }
    }

    pub fn with_page(&self, offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
            ..self.clone()
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Search text is sent as typed; only an all-blank value means no filter
fn search_text(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

/// Screens of the application
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    Products(ListQuery),
    NewProduct,
    EditProduct { slug: String },
    Categories(ListQuery),
}

impl Route {
    /// Parse a client URL such as `/products?offset=10&limit=10`.
    ///
    /// Unknown paths land on the dashboard. Category filters are only kept
    /// on the products list.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["products"] => Route::Products(ListQuery::from_query(query)),
            ["products", "new"] => Route::NewProduct,
            ["products", slug] => Route::EditProduct {
                slug: percent_decode(slug),
            },
            ["categories"] => Route::Categories(ListQuery {
                category_id: None,
                ..ListQuery::from_query(query)
            }),
            _ => Route::Dashboard,
        }
    }

    pub fn products() -> Self {
        Route::Products(ListQuery::default())
    }

    pub fn categories() -> Self {
        Route::Categories(ListQuery::default())
    }

    pub fn list_query(&self) -> Option<&ListQuery> {
        match self {
            Route::Products(q) | Route::Categories(q) => Some(q),
            _ => None,
        }
    }

    /// Same screen with different list state; non-list routes are unchanged
    pub fn with_list_query(&self, query: ListQuery) -> Self {
        match self {
            Route::Products(_) => Route::Products(query),
            Route::Categories(_) => Route::Categories(ListQuery {
                category_id: None,
                ..query
            }),
            other => other.clone(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Dashboard => "Dashboard",
            Route::Products(_) => "Products",
            Route::NewProduct => "Add Product",
            Route::EditProduct { .. } => "Edit Product",
            Route::Categories(_) => "Categories",
        }
    }
}

fn percent_decode(segment: &str) -> String {
    form_urlencoded::parse(format!("s={}", segment).as_bytes())
        .next()
        .map(|(_, v)| v.into_owned())
        .unwrap_or_else(|| segment.to_string())
}

fn percent_encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes()).collect()
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str("/login"),
            Route::Dashboard => f.write_str("/"),
            Route::Products(q) => write!(f, "/products?{}", q.to_query()),
            Route::NewProduct => f.write_str("/products/new"),
            Route::EditProduct { slug } => write!(f, "/products/{}", percent_encode(slug)),
            Route::Categories(q) => write!(f, "/categories?{}", q.to_query()),
        }
    }
}

/// Route to actually show given the signed-in state
pub fn guard(route: Route, authenticated: bool) -> Route {
    match (route, authenticated) {
        (Route::Login, true) => Route::Dashboard,
        (Route::Login, false) => Route::Login,
        (_, false) => Route::Login,
        (route, true) => route,
    }
}

/// Back/forward navigation stack
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Route>,
    cursor: usize,
}

impl History {
    pub fn new(start: Route) -> Self {
        Self {
            entries: vec![start],
            cursor: 0,
        }
    }

    pub fn current(&self) -> &Route {
        &self.entries[self.cursor]
    }

    /// Navigate to `route`; forward entries are discarded. Navigating to
    /// the current route is a no-op.
    pub fn push(&mut self, route: Route) {
        if *self.current() == route {
            return;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(route);
        self.cursor = self.entries.len() - 1;
    }

    /// Swap the current entry (redirects)
    pub fn replace(&mut self, route: Route) {
        self.entries[self.cursor] = route;
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> Option<&Route> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&Route> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_limit_round_trip() {
        for (offset, limit) in [(0, 10), (10, 10), (40, 20), (7, 1), (u32::MAX, u32::MAX)] {
            let query = ListQuery::default().with_page(offset, limit);
            let parsed = ListQuery::from_query(&query.to_query());
            assert_eq!((parsed.offset, parsed.limit), (offset, limit));
        }
    }

    #[test]
    fn test_malformed_values_default() {
        for raw in ["", "offset=abc&limit=xyz", "offset=-5&limit=-1", "limit=0", "offset=&limit="] {
            let q = ListQuery::from_query(raw);
            assert_eq!((q.offset, q.limit), (0, 10), "input {:?}", raw);
        }
    }

    #[test]
    fn test_search_keeps_offset() {
        let q = ListQuery::from_query("offset=20&limit=10");
        let searched = q.with_search(Some("shoe".into()), false);
        assert_eq!(searched.offset, 20);
        assert_eq!(searched.search.as_deref(), Some("shoe"));
        assert_eq!(searched.api_params().get("searchedText"), Some("shoe"));
        assert_eq!(searched.api_params().get("offset"), Some("20"));

        assert_eq!(q.with_search(Some("shoe".into()), true).offset, 0);
        assert_eq!(searched.with_search(Some("  ".into()), false).search, None);
    }

    #[test]
    fn test_search_text_is_not_trimmed() {
        let q = ListQuery::default().with_search(Some(" red shoe ".into()), false);
        assert_eq!(q.search.as_deref(), Some(" red shoe "));
        assert_eq!(q.api_params().get("searchedText"), Some(" red shoe "));
        assert_eq!(ListQuery::from_query(&q.to_query()).search.as_deref(), Some(" red shoe "));
        assert_eq!(ListQuery::from_query("categoryId=%20c9%20").category_id.as_deref(), Some("c9"));
    }

    #[test]
    fn test_category_resets_offset() {
        let q = ListQuery::from_query("search=shoe&offset=30&limit=25");
        let filtered = q.with_category(Some("c9".into()));
        assert_eq!(filtered.offset, 0);
        assert_eq!(filtered.limit, 25);
        assert_eq!(filtered.category_id.as_deref(), Some("c9"));
        assert_eq!(filtered.search.as_deref(), Some("shoe"));
        assert_eq!(
            Route::Products(filtered).to_string(),
            "/products?search=shoe&categoryId=c9&offset=0&limit=25"
        );
    }

    #[test]
    fn test_api_params_omit_empty_filters() {
        let params = ListQuery::default().api_params();
        assert_eq!(params.to_string(), "limit=10&offset=0");
    }

    #[test]
    fn test_route_round_trip() {
        let routes = [
            Route::Login,
            Route::Dashboard,
            Route::Products(ListQuery::from_query("search=red shoe&categoryId=c1&offset=10&limit=10")),
            Route::NewProduct,
            Route::EditProduct { slug: "red-runner".into() },
            Route::Categories(ListQuery::from_query("offset=20&limit=5")),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.to_string()), route);
        }
    }

    #[test]
    fn test_parse_unknown_goes_home() {
        assert_eq!(Route::parse("/settings"), Route::Dashboard);
        assert_eq!(Route::parse(""), Route::Dashboard);
        assert_eq!(Route::parse("/products/"), Route::products());
    }

    #[test]
    fn test_categories_ignore_category_filter() {
        let route = Route::parse("/categories?categoryId=c1");
        assert_eq!(route.list_query().unwrap().category_id, None);
    }

    #[test]
    fn test_guard() {
        assert_eq!(guard(Route::products(), false), Route::Login);
        assert_eq!(guard(Route::Login, true), Route::Dashboard);
        assert_eq!(guard(Route::NewProduct, true), Route::NewProduct);
        assert_eq!(guard(Route::Login, false), Route::Login);
    }

    #[test]
    fn test_history() {
        let mut history = History::new(Route::Dashboard);
        history.push(Route::products());
        history.push(Route::products());
        history.push(Route::categories());
        assert_eq!(history.back(), Some(&Route::products()));
        assert_eq!(history.back(), Some(&Route::Dashboard));
        assert_eq!(history.back(), None);

        history.forward();
        history.push(Route::NewProduct);
        assert!(!history.can_go_forward());
        assert_eq!(history.back(), Some(&Route::products()));
    }
}
