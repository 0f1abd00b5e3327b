//! Workflow context: shared state for one workflow run.
//!
//! The context carries the named targets a workflow executes against, the
//! captured response of every executed step (keyed by step name), and the
//! accumulated items built up without being sent. It is a plain mutable
//! value: one workflow drives one context sequentially, and independent
//! contexts share nothing, so test cases can run in parallel without any
//! cross-workflow locking.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::WorkflowError,
    request::{Accumulable, RequestEnvelope, WorkflowRequest, short_type_name},
    resolve::resolve_fields,
    target::Target,
};

/// A captured step response, type-erased at rest and checked on read.
struct Capture {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Capture {
    fn of<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: short_type_name::<T>(),
            value: Box::new(value),
        }
    }
}

/// Mutable state shared across all steps of one workflow execution.
#[derive(Default)]
pub struct WorkflowContext {
    targets: IndexMap<String, Arc<dyn Target>>,
    captures: IndexMap<String, Capture>,
    accumulated: HashMap<TypeId, Vec<IndexMap<String, Value>>>,
}

impl WorkflowContext {
    /// Creates an empty context with no targets, captures, or accumulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named target, overwriting any prior registration for the
    /// same key. Returns the context for chaining.
    pub fn with_target(mut self, key: impl Into<String>, target: impl Target + 'static) -> Self {
        self.targets.insert(key.into(), Arc::new(target));
        self
    }

    /// Executes a request against its registered target, captures the typed
    /// response under the request's step name, and returns it.
    ///
    /// Fails with [`WorkflowError::UnknownTarget`] when the request's target
    /// key was never registered. Any failure leaves the context exactly as it
    /// was before the call; the capture is recorded only on success.
    pub async fn execute<R: WorkflowRequest>(
        &mut self,
        request: &R,
    ) -> Result<R::Response, WorkflowError> {
        let Some(target) = self.targets.get(request.target_key()).cloned() else {
            return Err(WorkflowError::UnknownTarget {
                key: request.target_key().to_string(),
                available: self.targets.keys().cloned().collect(),
            });
        };

        let envelope = RequestEnvelope::of(request);
        debug!(
            step = envelope.step_name(),
            target = request.target_key(),
            request_type = envelope.type_tag().request_type,
            "executing workflow step"
        );

        let payload = target.execute(&envelope, self).await?;
        let response: R::Response =
            serde_json::from_value(payload).map_err(|error| WorkflowError::EmptyResponseBody {
                step: request.step_name().to_string(),
                detail: error.to_string(),
            })?;

        self.captures
            .insert(request.step_name().to_string(), Capture::of(response.clone()));
        Ok(response)
    }

    /// Resolves an accumulable item's fields and appends the resolved map to
    /// the list kept for the item's type. The list is created on first use.
    pub fn build<B: Accumulable>(&mut self, item: &B) -> Result<(), WorkflowError> {
        let fields = item.fields();
        let resolved = resolve_fields(&fields, self)?;
        debug!(
            item_type = short_type_name::<B>(),
            field_count = resolved.len(),
            "accumulated item"
        );
        self.accumulated
            .entry(TypeId::of::<B>())
            .or_default()
            .push(resolved);
        Ok(())
    }

    /// Returns and removes everything accumulated for the item type.
    ///
    /// Draining is destructive: a second drain with no intervening build
    /// returns an empty list, as does draining a type never built. Never
    /// fails.
    pub fn drain<B: Accumulable>(&mut self) -> Vec<IndexMap<String, Value>> {
        self.accumulated.remove(&TypeId::of::<B>()).unwrap_or_default()
    }

    /// Retrieves the captured response of a previous step by step name.
    ///
    /// Fails with [`WorkflowError::CaptureNotFound`] when the step has not
    /// executed, and [`WorkflowError::CaptureTypeMismatch`] when the capture
    /// exists but holds a different type; it never silently coerces.
    pub fn capture<T: Any>(&self, step_name: &str) -> Result<&T, WorkflowError> {
        let Some(stored) = self.captures.get(step_name) else {
            return Err(WorkflowError::CaptureNotFound {
                step: step_name.to_string(),
                available: self.captures.keys().cloned().collect(),
            });
        };
        stored
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| WorkflowError::CaptureTypeMismatch {
                step: step_name.to_string(),
                expected: short_type_name::<T>(),
                actual: stored.type_name,
            })
    }

    /// True when a response has been captured for the given step name.
    pub fn has_capture(&self, step_name: &str) -> bool {
        self.captures.contains_key(step_name)
    }
}

impl fmt::Debug for WorkflowContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("WorkflowContext")
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .field("captures", &self.captures.keys().collect::<Vec<_>>())
            .field("accumulated_types", &self.accumulated.len())
            .finish()
    }
}
