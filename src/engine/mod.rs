//! Execution engine for itemctl
//!
//! Planning and execution live in the `declarative` crate; this module
//! connects them to the API client and renders their results:
//! 1. Session - Load config and state, connect to the API
//! 2. Diffing - Display plans and execution summaries

pub mod differ;
pub mod session;

pub use session::Session;
