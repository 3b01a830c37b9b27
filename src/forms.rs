//! Form state and client-side validation
//!
//! Validation failures stay on the client and are shown under each field.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::backend::types::{LoginRequest, Product, ProductPayload};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Email,
    Name,
    Description,
    Price,
    Category,
    Images,
}

/// Messages per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Clear a field's message once it is edited again
    pub fn remove(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FieldErrors> {
        let email = self.email.trim();
        if EMAIL.is_match(email) {
            Ok(LoginRequest { email: email.to_string() })
        } else {
            let mut errors = FieldErrors::default();
            errors.insert(Field::Email, "Please enter a valid email address");
            Err(errors)
        }
    }
}

/// Product editor state; `price` is kept as typed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category_id: String,
    pub images: Vec<String>,
}

impl ProductForm {
    /// Pre-filled from an existing product
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: format_price(product.price),
            category_id: product
                .category
                .as_ref()
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            images: product.images.clone(),
        }
    }

    pub fn add_image(&mut self, url: String) {
        self.images.push(url);
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    pub fn validate(&self) -> Result<ProductPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.insert(Field::Name, "Product name is required");
        }
        let description = self.description.trim();
        if description.is_empty() {
            errors.insert(Field::Description, "Description is required");
        }
        let price = match parse_price(&self.price) {
            Some(price) if price >= 0.0 => price,
            Some(_) => {
                errors.insert(Field::Price, "Price must be greater than or equal to 0");
                0.0
            }
            None => {
                errors.insert(Field::Price, "Price must be a number");
                0.0
            }
        };
        if self.category_id.trim().is_empty() {
            errors.insert(Field::Category, "Category is required");
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProductPayload {
            name: name.to_string(),
            description: description.to_string(),
            price,
            category_id: self.category_id.trim().to_string(),
            images: self.images.clone(),
        })
    }
}

/// Blank input counts as zero
fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_start_matches('$');
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// `12.5` → `12.50`
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}
