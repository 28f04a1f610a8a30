pub mod error;
pub mod monte_carlo;
pub mod time_value;
pub mod types;

pub use error::FundSimError;
pub use types::*;

/// Standard result type for all fundsim operations
pub type FundSimResult<T> = Result<T, FundSimError>;
