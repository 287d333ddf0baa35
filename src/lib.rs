//! HTTP forwarding relay.
//!
//! Accepts a JSON description of an HTTP request on `POST /`, performs it
//! against an arbitrary upstream, follows redirects while recording every
//! URL visited, and answers with the parsed JSON body plus that trail, or
//! streams a non-2xx upstream answer back unchanged.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
