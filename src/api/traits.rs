use anyhow::Result;
use async_trait::async_trait;

use crate::api::types::{PageRequest, PageResult};

/// Common trait for listing providers
/// This keeps the fetch/paginate flow testable without a live backend
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch one page of listings matching the request's criteria
    async fn fetch_page(&self, request: &PageRequest) -> Result<PageResult>;

    /// Fetch the complete vocabulary of known location strings
    async fn locations(&self) -> Result<Vec<String>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
