pub mod calculator;
pub mod cost_model;
pub mod eligibility;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "listing")]
pub mod listing;

#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use calculator::{simulate, InvestmentInputs, SimulationRequest, SimulationResult};
pub use cost_model::CostModel;
pub use error::StrReturnsError;
pub use types::*;

/// Standard result type for all str-returns operations
pub type StrReturnsResult<T> = Result<T, StrReturnsError>;
