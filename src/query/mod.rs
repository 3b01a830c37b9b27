//! Data layer between the views and the backend: cached reads and writes

pub mod client;
pub mod key;
pub mod mutation;

pub use client::{QueryClient, QueryOptions, QueryState, DEFAULT_GC_TIME, DEFAULT_STALE_TIME};
pub use key::QueryKey;
pub use mutation::{Callbacks, Mutation, MutationOptions, MutationOutcome, MutationRequest};
