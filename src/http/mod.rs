//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, bounded body read, JSON decode)
//!     → handlers.rs (save / health)
//!     → response.rs (status mapping, JSON bodies)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{SaveError, SaveResponse};
pub use server::{AppState, HttpServer};
