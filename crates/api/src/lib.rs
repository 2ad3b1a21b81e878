//! HTTP JSON API over the transport index.
//!
//! GET-only, unauthenticated, CORS-permissive. Routes map one-to-one onto
//! the resolvers in `ferry_index`; this crate is a thin serialization layer
//! and holds no logic of its own beyond parameter parsing and error
//! rendering.

pub mod error;
pub mod routes;

pub use error::{parse_index, ApiError};
pub use routes::{router, ApiState};
