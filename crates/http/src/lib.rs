//! # Waypoint HTTP
//!
//! The HTTP binding for the waypoint workflow engine. [`HttpTarget`]
//! implements the core [`Target`](waypoint_core::Target) capability: it maps
//! each request type onto the wire through its registered [`HttpStep`]
//! (method, path template, authentication), dispatches with `reqwest`, and
//! translates failures into the core error taxonomy.
//!
//! ## Usage
//!
//! ```ignore
//! use reqwest::Method;
//! use waypoint_http::{AuthStrategy, HttpStep, HttpTarget};
//!
//! let target = HttpTarget::new("http://localhost:8080")
//!     .with_step::<LoginRequest>(HttpStep::new(Method::POST, "/auth/login"))?
//!     .with_step::<GetOrderRequest>(
//!         HttpStep::new(Method::GET, "/orders/{orderId}").with_auth(
//!             AuthStrategy::bearer_from(|ctx| {
//!                 Ok(ctx.capture::<LoginResponse>("login")?.token.clone())
//!             }),
//!         ),
//!     )?;
//! ```
//!
//! Redirects are never followed: a 3xx response fails the step, carrying the
//! `Location` header for diagnosis.

pub mod auth;
mod path;
pub mod step;
pub mod target;

pub use auth::AuthStrategy;
pub use reqwest::Method;
pub use step::{HttpStep, StepRegistry};
pub use target::HttpTarget;
