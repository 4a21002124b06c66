use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The exchange segment an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Floor {
    Hose,
    Hnx,
    Upcom,
}

impl Floor {
    /// All floors, in the order the market convention lists them.
    pub const ALL: [Floor; 3] = [Floor::Hose, Floor::Hnx, Floor::Upcom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Floor::Hose => "HOSE",
            Floor::Hnx => "HNX",
            Floor::Upcom => "UPCOM",
        }
    }

    /// Returns the composite index traded on this floor.
    pub fn index_code(&self) -> &'static str {
        match self {
            Floor::Hose => "VNINDEX",
            Floor::Hnx => "HNXINDEX",
            Floor::Upcom => "UPINDEX",
        }
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Floor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HOSE" => Ok(Floor::Hose),
            "HNX" => Ok(Floor::Hnx),
            "UPCOM" => Ok(Floor::Upcom),
            other => Err(CoreError::InvalidInput(
                "floor".to_string(),
                other.to_string(),
            )),
        }
    }
}

/// Exchange selector for the public operations: a single floor or all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeFilter {
    All,
    Single(Floor),
}

impl ExchangeFilter {
    /// Expands the filter into the concrete floor set the queries bind.
    pub fn floors(&self) -> Vec<Floor> {
        match self {
            ExchangeFilter::All => Floor::ALL.to_vec(),
            ExchangeFilter::Single(floor) => vec![*floor],
        }
    }
}

impl FromStr for ExchangeFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ALL") {
            Ok(ExchangeFilter::All)
        } else {
            Ok(ExchangeFilter::Single(s.parse()?))
        }
    }
}

/// Instrument classification used as a query predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Stock,
    Etf,
}

impl InstrumentType {
    /// The instrument types the performance comparisons cover.
    pub const TRADEABLE: [InstrumentType; 2] = [InstrumentType::Stock, InstrumentType::Etf];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Stock => "STOCK",
            InstrumentType::Etf => "ETF",
        }
    }
}

/// An enumerated comparison horizon for the windowed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowType {
    Week,
    Month,
    YearStart,
    Year,
}

impl FromStr for WindowType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(WindowType::Week),
            "month" => Ok(WindowType::Month),
            "year-start" | "year_start" | "ytd" => Ok(WindowType::YearStart),
            "year" => Ok(WindowType::Year),
            other => Err(CoreError::InvalidInput(
                "window".to_string(),
                other.to_string(),
            )),
        }
    }
}
