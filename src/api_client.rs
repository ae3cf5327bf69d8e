//! Access to the REST backend.
//!
//! Components:
//! - `transport`: the object-safe HTTP seam and its reqwest implementation.
//! - `envelope`: the `{code, message, data}` response envelope and its decoder.
//! - `client`: `ApiClient`, which attaches, refreshes and retries bearer tokens.

pub mod client;
pub mod envelope;
pub mod transport;

pub use client::ApiClient;
pub use envelope::{Envelope, PageData};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
