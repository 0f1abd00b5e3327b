//! HTTP step definitions and the per-target registry.
//!
//! A step definition declares how one request type maps onto the wire:
//! method, path template, and authentication. Definitions are stateless and
//! immutable, so registering them once per target doubles as the cache. The
//! registry is an explicit registration table keyed by the request's type
//! identity; registering two definitions for the same request type is a
//! configuration error and fails fast instead of silently picking one.

use std::{
    any::TypeId,
    collections::{HashMap, hash_map::Entry},
};

use reqwest::Method;
use waypoint_core::{TypeTag, WorkflowError, WorkflowRequest};

use crate::auth::AuthStrategy;

/// Wire-level details for executing one request type over HTTP.
#[derive(Debug)]
pub struct HttpStep {
    method: Method,
    path: String,
    auth: AuthStrategy,
}

impl HttpStep {
    /// A step definition with the given method and path template, without
    /// authentication. Paths may contain `{fieldName}` placeholders.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            auth: AuthStrategy::None,
        }
    }

    /// Attaches an authentication strategy.
    pub fn with_auth(mut self, auth: AuthStrategy) -> Self {
        self.auth = auth;
        self
    }

    /// Wire method of this step.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path template of this step.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Authentication strategy of this step.
    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }
}

/// Registration table mapping request types to their step definitions.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: HashMap<TypeId, HttpStep>,
}

impl StepRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the step definition for a request type.
    ///
    /// Fails with [`WorkflowError::DuplicateStep`] when the type already has
    /// a definition.
    pub fn register<R: WorkflowRequest>(&mut self, step: HttpStep) -> Result<(), WorkflowError> {
        let tag = TypeTag::of::<R>();
        match self.steps.entry(tag.id) {
            Entry::Occupied(_) => Err(WorkflowError::DuplicateStep {
                request_type: tag.request_type,
            }),
            Entry::Vacant(slot) => {
                slot.insert(step);
                Ok(())
            }
        }
    }

    /// Looks up the step definition for the request type identified by `tag`.
    ///
    /// Fails with [`WorkflowError::StepNotFound`] naming the expected
    /// request/response type pair.
    pub fn lookup(&self, tag: TypeTag) -> Result<&HttpStep, WorkflowError> {
        self.steps.get(&tag.id).ok_or(WorkflowError::StepNotFound {
            request_type: tag.request_type,
            response_type: tag.response_type,
        })
    }
}
