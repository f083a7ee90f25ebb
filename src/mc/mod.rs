//! Uniform Monte Carlo baseline driver.
//!
//! Samples depth-bounded random trees and keeps the best; the parallel
//! variant runs independent workers and combines by minimum fitness.

pub mod config;
pub mod search;

pub use config::{McConfig, PmcConfig};
pub use search::{McSearch, ParallelMcSearch};
