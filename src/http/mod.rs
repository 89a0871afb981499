//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (page + form posts, 303 back to the page)
//!     → api.rs (JSON API, health)
//!     → page.rs (HTML rendering)
//! ```

pub mod api;
pub mod handlers;
pub mod page;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
