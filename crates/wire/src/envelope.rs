//! Response envelope and paginated collections.
//!
//! Every response body has the shape `{ "success": bool, "data": ..., "message": ... }`.
//! Collections are either paginated (`{ "data": [...], "last_page": n, "total": n }`) or, for
//! some endpoints, a bare array.

use serde::{Deserialize, Serialize};

/// The `{ success, data }` response envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    // Missing keys decode as `None`; `default` here would add a `T: Default` bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Returns the payload when the server flagged success and sent data.
    pub fn into_data(self) -> Option<T> {
        if self.success {
            self.data
        } else {
            None
        }
    }
}

/// One page of a paginated collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub current_page: u32,
    #[serde(default = "first_page")]
    pub last_page: u32,
    #[serde(default)]
    pub total: u64,
}

fn first_page() -> u32 {
    1
}

impl<T> Page<T> {
    /// Slices `items` into the 1-based `page` of `per_page` entries.
    ///
    /// Out-of-range pages yield an empty `data` with the correct `last_page`.
    pub fn slice(items: &[T], page: u32, per_page: u32) -> Self
    where
        T: Clone,
    {
        let per_page = per_page.max(1) as usize;
        let total = items.len();
        let last_page = total.div_ceil(per_page).max(1);
        let page = page.max(1) as usize;
        let start = (page - 1).saturating_mul(per_page);
        let data = items.iter().skip(start).take(per_page).cloned().collect();

        Self {
            data,
            current_page: page as u32,
            last_page: last_page as u32,
            total: total as u64,
        }
    }
}

/// A collection as it may appear in an envelope's `data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Collection<T> {
    Paged(Page<T>),
    Plain(Vec<T>),
}

impl<T> Collection<T> {
    /// Last page number advertised by the server; plain arrays are a single page.
    pub fn last_page(&self) -> u32 {
        match self {
            Collection::Paged(page) => page.last_page,
            Collection::Plain(_) => 1,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Collection::Paged(page) => page.data,
            Collection::Plain(items) => items,
        }
    }
}
