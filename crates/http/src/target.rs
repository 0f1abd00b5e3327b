//! The HTTP execution target.
//!
//! Maps a request envelope onto the wire using its registered [`HttpStep`]:
//! resolves fields, substitutes path parameters, shapes the JSON body,
//! applies authentication, sends with redirects disabled, and parses the
//! response. A redirect is a failure here, not something to follow —
//! workflow steps assert exact endpoint behavior.

use std::{collections::HashSet, time::Instant};

use anyhow::anyhow;
use async_trait::async_trait;
use heck::ToLowerCamelCase;
use indexmap::IndexMap;
use reqwest::{Client, Method, header, redirect};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use waypoint_core::{
    RequestEnvelope, Target, WorkflowContext, WorkflowError, WorkflowRequest, resolve_fields,
};

use crate::{
    path::{join_url, substitute_path_params},
    step::{HttpStep, StepRegistry},
};

/// An execution target that sends requests over HTTP.
///
/// Holds a base URL and the step registry for every request type it can
/// dispatch. The connection for each remote call is scoped to that call;
/// nothing is pooled across steps, trading throughput for isolation.
#[derive(Debug)]
pub struct HttpTarget {
    base_url: String,
    registry: StepRegistry,
}

impl HttpTarget {
    /// Creates a target bound to the given base URL (trailing `/` trimmed),
    /// with an empty step registry.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            registry: StepRegistry::new(),
        }
    }

    /// Registers the step definition for a request type, chaining.
    ///
    /// Fails with [`WorkflowError::DuplicateStep`] when the type already has
    /// a definition; an ambiguous mapping is a configuration error, caught
    /// here rather than at dispatch time.
    pub fn with_step<R: WorkflowRequest>(mut self, step: HttpStep) -> Result<Self, WorkflowError> {
        self.registry.register::<R>(step)?;
        Ok(self)
    }

    /// Base URL this target dispatches against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Target for HttpTarget {
    async fn execute(
        &self,
        request: &RequestEnvelope<'_>,
        context: &WorkflowContext,
    ) -> Result<Value, WorkflowError> {
        let step_name = request.step_name();
        let step = self.registry.lookup(request.type_tag())?;
        let resolved = resolve_fields(request.fields(), context)?;

        let (path, consumed) = substitute_path_params(step.path(), &resolved);
        let url = join_url(&self.base_url, &path);
        let body = body_fields(&resolved, &consumed);

        debug!(
            step = step_name,
            method = %step.method(),
            %url,
            body_field_count = body.len(),
            "dispatching http step"
        );

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|error| WorkflowError::Transport {
                step: step_name.to_string(),
                source: anyhow!(error),
            })?;

        let mut builder = client.request(step.method().clone(), &url);
        if carries_body(step.method()) && !body.is_empty() {
            builder = builder.json(&Value::Object(body));
        }
        builder = step.auth().apply(builder, context)?;

        let start = Instant::now();
        let response = builder.send().await.map_err(|error| WorkflowError::Transport {
            step: step_name.to_string(),
            source: anyhow!(error),
        })?;

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response.text().await.map_err(|error| WorkflowError::Transport {
            step: step_name.to_string(),
            source: anyhow!(error),
        })?;

        if !status.is_success() {
            warn!(
                step = step_name,
                %url,
                status = status.as_u16(),
                duration_ms = start.elapsed().as_millis(),
                "http step failed"
            );
            return Err(WorkflowError::RemoteStepFailed {
                step: step_name.to_string(),
                url,
                status: status.as_u16(),
                body: text,
                location,
            });
        }

        if text.trim().is_empty() {
            return Err(WorkflowError::EmptyResponseBody {
                step: step_name.to_string(),
                detail: "response body was empty".to_string(),
            });
        }

        let payload = serde_json::from_str(&text).map_err(|error| WorkflowError::EmptyResponseBody {
            step: step_name.to_string(),
            detail: error.to_string(),
        })?;
        debug!(
            step = step_name,
            %url,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis(),
            "http step completed"
        );
        Ok(payload)
    }
}

/// True for methods that conventionally carry a request body.
fn carries_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::DELETE | Method::HEAD)
}

/// Shapes the request body from the resolved fields: path-consumed fields and
/// `null` values are omitted, keys are lower-camel-cased for the wire.
fn body_fields(resolved: &IndexMap<String, Value>, consumed: &HashSet<String>) -> Map<String, Value> {
    let mut body = Map::new();
    for (name, value) in resolved {
        if consumed.contains(name) || value.is_null() {
            continue;
        }
        body.insert(name.to_lower_camel_case(), value.clone());
    }
    body
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolved(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn body_excludes_path_consumed_and_null_fields() {
        let fields = resolved(&[
            ("orderId", json!("ord-42")),
            ("note", Value::Null),
            ("quantity", json!(2)),
        ]);
        let consumed = HashSet::from(["orderId".to_string()]);

        let body = body_fields(&fields, &consumed);
        assert_eq!(body.len(), 1);
        assert_eq!(body["quantity"], json!(2));
    }

    #[test]
    fn body_keys_are_lower_camel_cased() {
        let fields = resolved(&[("first_name", json!("Test")), ("LastName", json!("User"))]);
        let body = body_fields(&fields, &HashSet::new());
        assert!(body.contains_key("firstName"));
        assert!(body.contains_key("lastName"));
    }

    #[test]
    fn only_mutating_methods_carry_a_body() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PUT));
        assert!(carries_body(&Method::PATCH));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
    }

    #[test]
    fn base_url_is_normalized_at_construction() {
        let target = HttpTarget::new("http://localhost:8080/");
        assert_eq!(target.base_url(), "http://localhost:8080");
    }
}
