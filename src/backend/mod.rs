//! Catalog backend: HTTP client, wire types, and the signed-in session

pub mod api;
pub mod error;
pub mod session;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

pub use api::{ApiClient, QueryParams, WriteMethod};
pub use error::ApiError;
pub use session::Session;

/// Transport used by the query and mutation layers.
///
/// [`ApiClient`] is the real implementation; tests plug in fakes.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value, ApiError>;

    async fn write(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError>;
}
