use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One page of a listing plus the metadata the client needs to render a
/// pager. `page` is 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}
