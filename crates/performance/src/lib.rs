pub mod dates;
pub mod engine;
pub mod error;
pub mod ranking;
pub mod resolver;
pub mod window;

// Re-export the core types to provide a clean public API.
pub use engine::PerformanceEngine;
pub use error::PerformanceError;
pub use resolver::SessionDateResolver;
pub use window::select_start_date;
