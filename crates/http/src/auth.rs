//! Authentication strategies for outgoing HTTP steps.
//!
//! A strategy mutates the outgoing request (headers or query string) just
//! before it is sent. Credential values are [`FieldValue`]s, so a token can
//! be hardcoded or derived from a previous step's captured response; derived
//! lookups surface the same capture errors as any other field resolution.

use reqwest::RequestBuilder;
use waypoint_core::{FieldValue, WorkflowContext, WorkflowError};

/// How an HTTP step authenticates against its endpoint.
#[derive(Debug)]
pub enum AuthStrategy {
    /// No authentication; use for login and public endpoints.
    None,
    /// `Authorization: Bearer <token>`.
    Bearer(FieldValue<String>),
    /// API key sent as a request header.
    ApiKeyHeader {
        /// Header name, e.g. `X-Api-Key`.
        name: String,
        /// Key value, fixed or derived.
        value: FieldValue<String>,
    },
    /// API key appended as a query-string parameter.
    ApiKeyQuery {
        /// Parameter name, e.g. `api_key`.
        name: String,
        /// Key value, fixed or derived.
        value: FieldValue<String>,
    },
}

impl AuthStrategy {
    /// Bearer authentication with a hardcoded token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(FieldValue::fixed(token.into()))
    }

    /// Bearer authentication resolving the token from the workflow context.
    ///
    /// Use this to reference the token captured from a prior login step:
    ///
    /// ```ignore
    /// AuthStrategy::bearer_from(|ctx| Ok(ctx.capture::<LoginResponse>("login")?.token.clone()))
    /// ```
    pub fn bearer_from(
        selector: impl Fn(&WorkflowContext) -> Result<String, WorkflowError> + Send + Sync + 'static,
    ) -> Self {
        Self::Bearer(FieldValue::from_context(selector))
    }

    /// API key sent as a request header.
    pub fn api_key_header(name: impl Into<String>, value: FieldValue<String>) -> Self {
        Self::ApiKeyHeader { name: name.into(), value }
    }

    /// API key sent as a query-string parameter.
    pub fn api_key_query(name: impl Into<String>, value: FieldValue<String>) -> Self {
        Self::ApiKeyQuery { name: name.into(), value }
    }

    /// Applies the strategy to the outgoing request.
    pub(crate) fn apply(
        &self,
        builder: RequestBuilder,
        context: &WorkflowContext,
    ) -> Result<RequestBuilder, WorkflowError> {
        match self {
            Self::None => Ok(builder),
            Self::Bearer(token) => Ok(builder.bearer_auth(token.resolve(context)?)),
            Self::ApiKeyHeader { name, value } => {
                Ok(builder.header(name.as_str(), value.resolve(context)?))
            }
            Self::ApiKeyQuery { name, value } => {
                Ok(builder.query(&[(name.as_str(), value.resolve(context)?)]))
            }
        }
    }
}

impl Default for AuthStrategy {
    fn default() -> Self {
        Self::None
    }
}
