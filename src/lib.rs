pub mod error;
pub mod executor;
pub mod flux;
pub mod flux_stream_ext;
pub mod outcome;

mod concurrent;

// Re-export all items from the flux module at the crate root
pub use flux::*;
pub use error::{StreamError, StreamResult};
pub use executor::ExecutorHandle;
pub use outcome::{reclassify, Outcome};
