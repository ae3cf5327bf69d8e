use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// One page of a larger result set.
///
/// `total >= items.len()` whenever `items` is a page of a larger set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// A first page holding exactly `items`.
    pub fn single(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self::new(items, total, DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }

    pub fn pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size))
    }
}

/// Declared kind of one field in a `validate_object` schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Array,
    String,
    Number,
    Boolean,
    Any,
}

/// Schema entry: the field's kind and the value substituted when the field is
/// absent or of another kind. A `None` default falls back to the kind's zero
/// value (`[]`, `""`, `0`, `false`, `null`).
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
        }
    }

    pub fn with_default(kind: FieldKind, default: Value) -> Self {
        Self {
            kind,
            default: Some(default),
        }
    }
}
