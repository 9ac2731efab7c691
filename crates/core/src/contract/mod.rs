//! Faucet contract: state, call routing and events.

pub mod dispatcher;
pub mod events;
pub mod faucet;

pub use dispatcher::{dispatch, DispatchOutcome, FaucetCall};
pub use events::FallbackCalled;
pub use faucet::{CallContext, Faucet};
