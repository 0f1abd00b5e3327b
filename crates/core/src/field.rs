//! Deferred field values.
//!
//! A [`FieldValue`] stands in for a request field whose concrete value is not
//! known until the workflow runs. The three variants cover the three ways a
//! test authors a field: a hardcoded value, a fresh value generated on every
//! resolution (random emails, counters), or a value derived from the captured
//! response of an earlier step.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::{context::WorkflowContext, error::WorkflowError};

/// A request field resolved at execution time against the workflow context.
///
/// Construct instances with [`FieldValue::fixed`], [`FieldValue::generated`],
/// or [`FieldValue::from_context`]. Resolution never mutates the context.
pub enum FieldValue<T> {
    /// Always resolves to the value captured at construction.
    Fixed(T),
    /// Invokes the producer fresh on every resolution.
    Generated(Box<dyn Fn() -> T + Send + Sync>),
    /// Derives the value from captured workflow state; fails when the
    /// referenced capture is missing or of the wrong type.
    FromContext(Box<dyn Fn(&WorkflowContext) -> Result<T, WorkflowError> + Send + Sync>),
}

impl<T: Clone> FieldValue<T> {
    /// A field value that always resolves to the given value.
    pub fn fixed(value: T) -> Self {
        Self::Fixed(value)
    }

    /// A field value that invokes the producer each time it is resolved.
    ///
    /// Use this for generated data such as random emails or unique names.
    pub fn generated(producer: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self::Generated(Box::new(producer))
    }

    /// A field value that resolves by looking up captured workflow state.
    ///
    /// Use this to reference the response of a previous step:
    ///
    /// ```ignore
    /// FieldValue::from_context(|ctx| Ok(ctx.capture::<LoginResponse>("login")?.token.clone()))
    /// ```
    pub fn from_context(
        selector: impl Fn(&WorkflowContext) -> Result<T, WorkflowError> + Send + Sync + 'static,
    ) -> Self {
        Self::FromContext(Box::new(selector))
    }

    /// Resolves this field against the current workflow context.
    pub fn resolve(&self, context: &WorkflowContext) -> Result<T, WorkflowError> {
        match self {
            Self::Fixed(value) => Ok(value.clone()),
            Self::Generated(producer) => Ok(producer()),
            Self::FromContext(selector) => selector(context),
        }
    }
}

impl<T> fmt::Debug for FieldValue<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Fixed(_) => "Fixed",
            Self::Generated(_) => "Generated",
            Self::FromContext(_) => "FromContext",
        };
        formatter.debug_tuple(&format!("FieldValue::{variant}")).finish()
    }
}

/// Object-safe view of a deferred field, resolving straight to JSON.
///
/// Request records hold fields of many different `T`s; the field resolver
/// works through this trait so it can treat them uniformly.
pub trait DeferredField: Send + Sync {
    /// Resolves the field named `name` and serializes the result to JSON.
    ///
    /// The name is only used for diagnostics; resolution itself depends
    /// solely on the field and the context.
    fn resolve_json(&self, name: &str, context: &WorkflowContext) -> Result<Value, WorkflowError>;
}

impl<T> DeferredField for FieldValue<T>
where
    T: Serialize + Clone + Send + Sync,
{
    fn resolve_json(&self, name: &str, context: &WorkflowContext) -> Result<Value, WorkflowError> {
        let resolved = self.resolve(context)?;
        serde_json::to_value(resolved).map_err(|source| WorkflowError::FieldSerialization {
            field: name.to_string(),
            source,
        })
    }
}
