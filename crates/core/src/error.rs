//! Error taxonomy for workflow execution.
//!
//! Every failure in this taxonomy is terminal: it aborts the current
//! `execute`/`build` call and the enclosing workflow script. Nothing here is
//! retried internally, and each variant carries enough context (step name,
//! available alternatives) to diagnose a failed run without re-running it
//! with extra instrumentation.

use thiserror::Error;

/// Terminal failure raised by workflow execution.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A request named a target key that was never registered on the context.
    #[error("no target registered for key '{key}'; available targets: [{}]", available.join(", "))]
    UnknownTarget {
        /// Target key the request asked for.
        key: String,
        /// Keys registered on the context at the time of the lookup.
        available: Vec<String>,
    },

    /// A capture lookup referenced a step that has not executed yet.
    #[error(
        "no captured response for step '{step}'; ensure the step has executed \
         before referencing its output; available steps: [{}]",
        available.join(", ")
    )]
    CaptureNotFound {
        /// Step name that was looked up.
        step: String,
        /// Step names with live captures at the time of the lookup.
        available: Vec<String>,
    },

    /// A capture exists but its runtime type does not match the expected type.
    #[error("captured response for step '{step}' is of type '{actual}', not '{expected}'")]
    CaptureTypeMismatch {
        /// Step name that was looked up.
        step: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type recorded when the capture was stored.
        actual: &'static str,
    },

    /// No step definition is registered for a request's concrete type.
    #[error(
        "no step definition registered for request type '{request_type}' \
         (response type '{response_type}'); register one on the target before executing"
    )]
    StepNotFound {
        /// Short name of the request type being dispatched.
        request_type: &'static str,
        /// Short name of its declared response type.
        response_type: &'static str,
    },

    /// A second step definition was registered for the same request type.
    #[error("a step definition is already registered for request type '{request_type}'")]
    DuplicateStep {
        /// Short name of the conflicting request type.
        request_type: &'static str,
    },

    /// The remote call completed with a non-success status.
    #[error(
        "step '{step}' failed with status {status}; URL: {url};{} body: {body}",
        redirect_hint(location)
    )]
    RemoteStepFailed {
        /// Step name of the failing request.
        step: String,
        /// Final URL the request was sent to.
        url: String,
        /// HTTP status code returned by the remote side.
        status: u16,
        /// Response body text, verbatim.
        body: String,
        /// `Location` header value when the response was a redirect.
        location: Option<String>,
    },

    /// The remote call succeeded but its body could not produce a response value.
    #[error("step '{step}' returned an empty or undeserializable response body: {detail}")]
    EmptyResponseBody {
        /// Step name of the failing request.
        step: String,
        /// What went wrong while reading the body.
        detail: String,
    },

    /// A resolved field value could not be serialized to JSON.
    #[error("failed to serialize resolved value for field '{field}': {source}")]
    FieldSerialization {
        /// Name of the field being resolved.
        field: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The request never produced a status: connect failure, timeout, bad URL.
    #[error("transport failure for step '{step}': {source}")]
    Transport {
        /// Step name of the failing request.
        step: String,
        /// Underlying transport error.
        #[source]
        source: anyhow::Error,
    },
}

fn redirect_hint(location: &Option<String>) -> String {
    match location {
        Some(location) => format!(" redirect location: {location};"),
        None => String::new(),
    }
}
