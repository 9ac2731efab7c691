//! Shared primitives for the faucet workspace: addresses, hashes, unit
//! conversion, configuration loading and logging setup.

pub mod error;
pub mod types;
pub mod utils;

pub use error::{CommonError, Result};
pub use types::{Address, Hash};
