pub mod connection;
pub mod error;
pub mod repository;

pub use connection::connect_stores;
pub use error::DbError;
pub use repository::{
    AnchorDateRow, MetricColumn, StoreRepository, StoreSet, StoreTarget, TradeTable,
};
