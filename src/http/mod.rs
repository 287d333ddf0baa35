//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (decode body, validate into RelayRequest)
//!     → relay pipeline (outbound call, classification)
//!     → response.rs (shape outcome into the outward contract)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::ValidRelay;
pub use response::{ErrorResponse, RelayResponse};
pub use server::{RelayServer, X_REQUEST_ID};
