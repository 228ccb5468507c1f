pub mod client;
pub mod traits;
pub mod types;

pub use client::PropertyApi;
pub use traits::ListingSource;
pub use types::{FilterCriteria, PageRequest, PageResult};
