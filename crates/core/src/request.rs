//! Request descriptors and field enumeration.
//!
//! A workflow step is described by an immutable record implementing
//! [`WorkflowRequest`]: a step name, a target key, and a set of named fields.
//! Instead of discovering fields through runtime introspection, each record
//! enumerates its own `(name, value)` pairs through [`FieldRecord::fields`],
//! in declaration order. Accumulable items ([`Accumulable`]) carry fields the
//! same way but have no step name or target key; they only contribute
//! resolved data into the context.

use std::any::TypeId;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::field::DeferredField;

/// A record that can enumerate its own named fields in declaration order.
pub trait FieldRecord {
    /// Returns the record's fields, in the order they are declared.
    fn fields(&self) -> FieldSet<'_>;
}

/// An immutable descriptor for one workflow step.
///
/// `Response` is the type produced by executing the request; the engine
/// captures it in the context under [`step_name`](WorkflowRequest::step_name)
/// so later steps can reference it.
pub trait WorkflowRequest: FieldRecord + Send + Sync + 'static {
    /// Typed response produced by this request.
    type Response: DeserializeOwned + Serialize + Clone + Send + Sync + 'static;

    /// Name under which the response is captured. Re-executing a request
    /// with the same step name overwrites the prior capture.
    fn step_name(&self) -> &str;

    /// Key of the registered target this request executes against.
    fn target_key(&self) -> &str;
}

/// A record that accumulates into the context without calling a target.
///
/// Use [`WorkflowContext::build`](crate::WorkflowContext::build) to resolve
/// and store instances, then [`WorkflowContext::drain`](crate::WorkflowContext::drain)
/// to consume everything accumulated for the type in one go.
pub trait Accumulable: FieldRecord + Send + Sync + 'static {}

/// One enumerated field of a record.
pub enum FieldEntry<'rec> {
    /// A deferred value, resolved against the context at execution time.
    Deferred(&'rec dyn DeferredField),
    /// A plain value, passed through unchanged.
    Plain(Value),
    /// An unset field; resolves to `null` without invoking anything.
    Absent,
}

/// Ordered collection of a record's named fields.
///
/// Built in [`FieldRecord::fields`] with the chaining methods below; the
/// insertion order is the declaration order and is preserved all the way to
/// the wire.
#[derive(Default)]
pub struct FieldSet<'rec> {
    entries: Vec<(&'static str, FieldEntry<'rec>)>,
}

impl<'rec> FieldSet<'rec> {
    /// Creates an empty field set.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends a deferred field.
    pub fn deferred(mut self, name: &'static str, value: &'rec dyn DeferredField) -> Self {
        self.entries.push((name, FieldEntry::Deferred(value)));
        self
    }

    /// Appends a deferred field that may be unset.
    pub fn deferred_opt(self, name: &'static str, value: Option<&'rec dyn DeferredField>) -> Self {
        match value {
            Some(value) => self.deferred(name, value),
            None => self.absent(name),
        }
    }

    /// Appends a plain value, passed through without resolution.
    pub fn plain(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.entries.push((name, FieldEntry::Plain(value.into())));
        self
    }

    /// Appends an unset field that resolves to `null`.
    pub fn absent(mut self, name: &'static str) -> Self {
        self.entries.push((name, FieldEntry::Absent));
        self
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set holds no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates the fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldEntry<'rec>)> {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }
}

/// Identity of a concrete request type, carried for dispatch and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    /// Runtime identity used as the step-registry key.
    pub id: TypeId,
    /// Short name of the request type.
    pub request_type: &'static str,
    /// Short name of the declared response type.
    pub response_type: &'static str,
}

impl TypeTag {
    /// Builds the tag for a concrete request type.
    pub fn of<R: WorkflowRequest>() -> Self {
        Self {
            id: TypeId::of::<R>(),
            request_type: short_type_name::<R>(),
            response_type: short_type_name::<R::Response>(),
        }
    }
}

/// Type-erased view of a request, as handed to a target.
///
/// Carries everything a transport needs: the step name for diagnostics, the
/// [`TypeTag`] for step-definition lookup, and the enumerated fields.
pub struct RequestEnvelope<'req> {
    step_name: &'req str,
    type_tag: TypeTag,
    fields: FieldSet<'req>,
}

impl<'req> RequestEnvelope<'req> {
    /// Erases a typed request into an envelope.
    pub fn of<R: WorkflowRequest>(request: &'req R) -> Self {
        Self {
            step_name: request.step_name(),
            type_tag: TypeTag::of::<R>(),
            fields: request.fields(),
        }
    }

    /// Step name of the underlying request.
    pub fn step_name(&self) -> &str {
        self.step_name
    }

    /// Identity of the underlying request type.
    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// Enumerated fields of the underlying request.
    pub fn fields(&self) -> &FieldSet<'req> {
        &self.fields
    }
}

/// Last path segment of a type name, e.g. `LoginRequest` for
/// `sample::requests::LoginRequest`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}
