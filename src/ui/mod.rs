pub mod filters;
pub mod location;
pub mod results;
pub mod select;

pub use filters::FilterPanel;
pub use location::LocationField;
pub use results::{PageAction, ResultsView};
pub use select::{SelectOption, SelectState};
