//! Waves lease canceller library
//!
//! Cancels every active lease of a single account. The pipeline is strictly
//! sequential: probe the node, resolve the network scheme and the account
//! identity, fetch the active leases and the fee, then build, sign and
//! preview or broadcast one cancel transaction per lease.

pub mod account;
pub mod canceller;
pub mod config;
pub mod crypto;
pub mod error;
pub mod fee;
pub mod leasing;
pub mod network;
pub mod rpc;
pub mod transaction;
pub mod utils;

pub use canceller::{CancelReport, Canceller, SubmissionMode};
pub use config::CancellerConfig;
pub use error::{CancellerError, Result};
pub use rpc::{NodeApi, NodeClient, NodeError};
