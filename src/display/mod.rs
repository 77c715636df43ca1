pub mod display_options;
pub mod progress;
pub mod table;

pub use display_options::DisplayOptions;
pub use progress::ProgressSpinner;
pub use table::TableDisplay;
