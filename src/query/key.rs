//! Cache identity of a read

use std::fmt;

use crate::backend::QueryParams;

/// Resource path plus query parameters.
///
/// Parameters are stored sorted, so key order never produces two identities
/// for the same read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub path: String,
    pub params: QueryParams,
}

impl QueryKey {
    pub fn new(path: impl Into<String>, params: QueryParams) -> Self {
        Self {
            path: normalize(path.into()),
            params,
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self::new(path, QueryParams::new())
    }

    /// True when this key lives under `path` (`products` covers
    /// `products` and `products/runner`)
    pub fn is_under(&self, path: &str) -> bool {
        let path = path.trim_matches('/');
        match self.path.strip_prefix(path) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

fn normalize(path: String) -> String {
    path.trim_matches('/').to_string()
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{}?{}", self.path, self.params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_under() {
        let list = QueryKey::new("products", QueryParams::new().with("offset", 0));
        let detail = QueryKey::path("/products/runner");
        let other = QueryKey::path("products-archive");

        assert!(list.is_under("products"));
        assert!(detail.is_under("products"));
        assert!(!other.is_under("products"));
        assert!(!list.is_under("categories"));
    }

    #[test]
    fn test_display() {
        let key = QueryKey::new("products", QueryParams::new().with("offset", 0).with("limit", 10));
        assert_eq!(key.to_string(), "products?limit=10&offset=0");
    }
}
