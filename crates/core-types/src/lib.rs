pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ExchangeFilter, Floor, InstrumentType, WindowType};
pub use error::CoreError;
pub use structs::{
    IndexChangePoint, IndustryChangePoint, LiquidityPerformanceRow, MetricRow, PerformanceDelta,
    PricePerformanceRow, SessionDateSet,
};
