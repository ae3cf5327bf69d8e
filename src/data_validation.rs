//! Defensive normalization of API payloads.
//!
//! Components:
//! - `guards`: pure functions coercing loosely-shaped JSON into safe defaults.
//! - `types`: the `Paged` list envelope and the `validate_object` schema types.

pub mod guards;
pub mod types;

pub use guards::{
    ensure_list, filter_valid_records, parse_paged_envelope, safe_property, validate_object,
};
pub use types::{FieldKind, FieldSpec, Paged};
