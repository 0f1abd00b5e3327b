//! # Waypoint Core
//!
//! Waypoint composes multi-step integration tests against remote services as
//! declarative workflows. A workflow is a strictly ordered script of typed
//! requests; each request's fields may be fixed, generated on the fly, or
//! derived from the captured response of an earlier step. This crate is the
//! transport-agnostic core: the deferred-value model, the request/field
//! abstraction, the field resolver, and the mutable per-run
//! [`WorkflowContext`].
//!
//! ## Key pieces
//!
//! - **[`FieldValue`]**: a field resolved at execution time — fixed,
//!   generated per resolve, or derived from captured state.
//! - **[`WorkflowRequest`] / [`Accumulable`]**: immutable records that
//!   enumerate their own fields in declaration order, replacing any need for
//!   runtime introspection.
//! - **[`resolve_fields`]**: evaluates a record's fields into an ordered map
//!   of plain JSON values, all-or-nothing.
//! - **[`WorkflowContext`]**: registered targets, captured responses keyed by
//!   step name, and accumulated (unsent) items keyed by item type.
//! - **[`Target`]**: the dyn-compatible execution capability a transport
//!   crate implements; `waypoint-http` provides the HTTP binding.
//!
//! ## Usage
//!
//! ```ignore
//! let mut context = WorkflowContext::new().with_target("api", http_target);
//! let login = context.execute(&LoginRequest::default()).await?;
//! assert!(context.has_capture("login"));
//! ```
//!
//! A workflow is sequential by contract: `execute` takes `&mut self`, so the
//! borrow checker rules out interleaving two steps of one context. Run
//! independent contexts concurrently instead; they share no state.

pub mod context;
pub mod error;
pub mod field;
pub mod request;
pub mod resolve;
pub mod target;

pub use context::WorkflowContext;
pub use error::WorkflowError;
pub use field::{DeferredField, FieldValue};
pub use request::{Accumulable, FieldEntry, FieldRecord, FieldSet, RequestEnvelope, TypeTag, WorkflowRequest};
pub use resolve::resolve_fields;
pub use target::Target;
