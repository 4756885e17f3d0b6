//! Supporting utilities
//!
//! - [`backoff`] - Delays between retried filesystem operations
//! - [`console`] - Timestamped status lines
//! - [`progress`] - Download progress bars

pub mod backoff;
pub mod console;
pub mod progress;

pub use backoff::exponential_backoff_with_delay;
pub use console::Console;
pub use progress::{ProgressBar, ProgressStyle};
