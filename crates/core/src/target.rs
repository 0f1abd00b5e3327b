//! The target capability.
//!
//! A target binds an address to a transport and knows how to execute a
//! request envelope against it. The trait returns the parsed JSON payload;
//! typed deserialization into the request's declared response type happens in
//! [`WorkflowContext::execute`](crate::WorkflowContext::execute), which keeps
//! this trait dyn-compatible and lets one context hold targets of different
//! transports.

use async_trait::async_trait;
use serde_json::Value;

use crate::{context::WorkflowContext, error::WorkflowError, request::RequestEnvelope};

/// An execution target: an endpoint plus the protocol used to reach it.
#[async_trait]
pub trait Target: Send + Sync {
    /// Executes the request against this target and returns the parsed
    /// response payload.
    ///
    /// Implementations resolve the envelope's fields, map the request onto
    /// the wire per its step definition, send it, and translate failures into
    /// the [`WorkflowError`] taxonomy. The context is read-only here; capture
    /// recording is the caller's job.
    async fn execute(
        &self,
        request: &RequestEnvelope<'_>,
        context: &WorkflowContext,
    ) -> Result<Value, WorkflowError>;
}
