//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger() → every subscribed server drains and exits
//! ```
//!
//! # Design Decisions
//! - In-flight relays finish before the server returns
//! - Embedders and tests stop a server without sending process signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
