//! Shared types for backend communication

use serde::{Deserialize, Serialize};

/// Resource paths on the catalog backend
pub mod paths {
    pub const AUTH: &str = "auth";
    pub const PRODUCTS: &str = "products";
    pub const CATEGORIES: &str = "categories";

    /// `products/{id_or_slug}`
    pub fn product(id_or_slug: &str) -> String {
        format!("{}/{}", PRODUCTS, id_or_slug)
    }
}

/// Product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl Product {
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("N/A")
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Body for create and replace requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// One page of a list endpoint.
///
/// The backend answers with a plain array; an envelope carrying a total
/// count is accepted too so a future backend can report it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub total: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListWire<T> {
    Plain(Vec<T>),
    Envelope {
        #[serde(alias = "items")]
        data: Vec<T>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ListPage<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(match ListWire::deserialize(deserializer)? {
            ListWire::Plain(items) => ListPage { items, total: None },
            ListWire::Envelope { data, total } => ListPage { items: data, total },
        })
    }
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self { items: Vec::new(), total: None }
    }
}
