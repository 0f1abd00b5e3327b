//! End-to-end workflow scenarios against a mock HTTP server.
//!
//! These tests drive the full stack: typed requests with deferred fields,
//! step registration, path substitution, auth application, dispatch, and
//! response capture.

use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use waypoint_core::{
    Accumulable, FieldRecord, FieldSet, FieldValue, WorkflowContext, WorkflowError, WorkflowRequest,
};
use waypoint_http::{AuthStrategy, HttpStep, HttpTarget, Method};

// --- Sample-shaped responses ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: String,
    email: String,
    role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderResponse {
    id: String,
    user_id: String,
    product_name: String,
    quantity: u32,
    status: String,
}

// --- Sample-shaped requests ---

struct LoginRequest {
    username: FieldValue<String>,
    password: FieldValue<String>,
}

impl LoginRequest {
    fn alice() -> Self {
        Self {
            username: FieldValue::fixed("alice".to_string()),
            password: FieldValue::fixed("secret".to_string()),
        }
    }
}

impl FieldRecord for LoginRequest {
    fn fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .deferred("username", &self.username)
            .deferred("password", &self.password)
    }
}

impl WorkflowRequest for LoginRequest {
    type Response = LoginResponse;

    fn step_name(&self) -> &str {
        "login"
    }

    fn target_key(&self) -> &str {
        "api"
    }
}

struct CreateOrderRequest {
    user_id: FieldValue<String>,
    product_name: FieldValue<String>,
    quantity: FieldValue<u32>,
}

impl Default for CreateOrderRequest {
    fn default() -> Self {
        Self {
            user_id: FieldValue::from_context(|ctx| {
                Ok(ctx.capture::<UserResponse>("createUser")?.id.clone())
            }),
            product_name: FieldValue::fixed("Widget".to_string()),
            quantity: FieldValue::fixed(1),
        }
    }
}

impl FieldRecord for CreateOrderRequest {
    fn fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .deferred("userId", &self.user_id)
            .deferred("productName", &self.product_name)
            .deferred("quantity", &self.quantity)
    }
}

impl WorkflowRequest for CreateOrderRequest {
    type Response = OrderResponse;

    fn step_name(&self) -> &str {
        "createOrder"
    }

    fn target_key(&self) -> &str {
        "api"
    }
}

struct GetOrderRequest {
    order_id: FieldValue<String>,
}

impl FieldRecord for GetOrderRequest {
    fn fields(&self) -> FieldSet<'_> {
        FieldSet::new().deferred("orderId", &self.order_id)
    }
}

impl WorkflowRequest for GetOrderRequest {
    type Response = OrderResponse;

    fn step_name(&self) -> &str {
        "getOrder"
    }

    fn target_key(&self) -> &str {
        "api"
    }
}

fn order_payload() -> Value {
    json!({
        "id": "ord-1",
        "userId": "u1",
        "productName": "Widget",
        "quantity": 1,
        "status": "pending"
    })
}

#[tokio::test]
async fn login_capture_feeds_derived_fields_and_bearer_auth() {
    let server = MockServer::start_async().await;
    let login_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/auth/login")
                .json_body(json!({"username": "alice", "password": "secret"}));
            then.status(200).json_body(json!({"token": "t1", "userId": "u1"}));
        })
        .await;
    let order_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/orders")
                .header("authorization", "Bearer t1")
                .json_body(json!({"userId": "u1", "productName": "Widget", "quantity": 1}));
            then.status(201).json_body(order_payload());
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<LoginRequest>(HttpStep::new(Method::POST, "/auth/login"))
        .unwrap()
        .with_step::<CreateOrderRequest>(
            HttpStep::new(Method::POST, "/orders").with_auth(AuthStrategy::bearer_from(|ctx| {
                Ok(ctx.capture::<LoginResponse>("login")?.token.clone())
            })),
        )
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let login = context.execute(&LoginRequest::alice()).await.unwrap();
    assert_eq!(login.token, "t1");

    // A derived field referencing the login capture resolves to its token.
    let token_field: FieldValue<String> = FieldValue::from_context(|ctx| {
        Ok(ctx.capture::<LoginResponse>("login")?.token.clone())
    });
    assert_eq!(token_field.resolve(&context).unwrap(), "t1");

    // The create-order step sends the captured user id and the derived
    // bearer token on the wire.
    let order = CreateOrderRequest {
        user_id: FieldValue::from_context(|ctx| {
            Ok(ctx.capture::<LoginResponse>("login")?.user_id.clone())
        }),
        ..CreateOrderRequest::default()
    };
    let created = context.execute(&order).await.unwrap();
    assert_eq!(created.id, "ord-1");

    login_mock.assert_async().await;
    order_mock.assert_async().await;
}

#[tokio::test]
async fn derived_field_fails_when_the_prior_step_never_ran() {
    let server = MockServer::start_async().await;
    let target = HttpTarget::new(server.base_url())
        .with_step::<CreateOrderRequest>(HttpStep::new(Method::POST, "/orders"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    // `createUser` never executed, so the derived `userId` cannot resolve.
    let error = context.execute(&CreateOrderRequest::default()).await.unwrap_err();
    match error {
        WorkflowError::CaptureNotFound { step, .. } => assert_eq!(step, "createUser"),
        other => panic!("expected CaptureNotFound, got {other}"),
    }
    assert!(!context.has_capture("createOrder"), "failed steps record no capture");
}

#[tokio::test]
async fn non_success_status_carries_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/orders/");
            then.status(404).body("{\"error\":\"not found\"}");
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<GetOrderRequest>(HttpStep::new(Method::GET, "/orders/{orderId}"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let request = GetOrderRequest {
        order_id: FieldValue::fixed("ord-404".to_string()),
    };
    let error = context.execute(&request).await.unwrap_err();
    match error {
        WorkflowError::RemoteStepFailed { step, status, body, .. } => {
            assert_eq!(step, "getOrder");
            assert_eq!(status, 404);
            assert_eq!(body, "{\"error\":\"not found\"}");
        }
        other => panic!("expected RemoteStepFailed, got {other}"),
    }
}

#[tokio::test]
async fn path_parameters_are_substituted_and_left_out_of_the_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/orders/ord-1");
            then.status(200).json_body(order_payload());
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<GetOrderRequest>(HttpStep::new(Method::GET, "/orders/{orderId}"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let request = GetOrderRequest {
        order_id: FieldValue::fixed("ord-1".to_string()),
    };
    let order = context.execute(&request).await.unwrap();

    assert_eq!(order.id, "ord-1");
    mock.assert_async().await;
}

#[tokio::test]
async fn api_key_strategies_reach_the_wire() {
    let server = MockServer::start_async().await;
    let header_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login").header("x-api-key", "k1");
            then.status(200).json_body(json!({"token": "t1", "userId": "u1"}));
        })
        .await;
    let query_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/orders/ord-1").query_param("api_key", "k2");
            then.status(200).json_body(order_payload());
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<LoginRequest>(
            HttpStep::new(Method::POST, "/auth/login").with_auth(AuthStrategy::api_key_header(
                "X-Api-Key",
                FieldValue::fixed("k1".to_string()),
            )),
        )
        .unwrap()
        .with_step::<GetOrderRequest>(
            HttpStep::new(Method::GET, "/orders/{orderId}").with_auth(AuthStrategy::api_key_query(
                "api_key",
                FieldValue::fixed("k2".to_string()),
            )),
        )
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    context.execute(&LoginRequest::alice()).await.unwrap();
    context
        .execute(&GetOrderRequest {
            order_id: FieldValue::fixed("ord-1".to_string()),
        })
        .await
        .unwrap();

    header_mock.assert_async().await;
    query_mock.assert_async().await;
}

#[tokio::test]
async fn redirects_fail_the_step_instead_of_being_followed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(302).header("Location", "/elsewhere");
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<LoginRequest>(HttpStep::new(Method::POST, "/auth/login"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let error = context.execute(&LoginRequest::alice()).await.unwrap_err();
    match error {
        WorkflowError::RemoteStepFailed { status, location, .. } => {
            assert_eq!(status, 302);
            assert_eq!(location.as_deref(), Some("/elsewhere"));
        }
        other => panic!("expected RemoteStepFailed, got {other}"),
    }
}

#[tokio::test]
async fn empty_success_body_is_a_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200);
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<LoginRequest>(HttpStep::new(Method::POST, "/auth/login"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let error = context.execute(&LoginRequest::alice()).await.unwrap_err();
    assert!(matches!(error, WorkflowError::EmptyResponseBody { ref step, .. } if step == "login"));
}

#[tokio::test]
async fn unregistered_request_types_fail_with_step_not_found() {
    let server = MockServer::start_async().await;
    let target = HttpTarget::new(server.base_url());
    let mut context = WorkflowContext::new().with_target("api", target);

    let error = context.execute(&LoginRequest::alice()).await.unwrap_err();
    match error {
        WorkflowError::StepNotFound { request_type, response_type } => {
            assert_eq!(request_type, "LoginRequest");
            assert_eq!(response_type, "LoginResponse");
        }
        other => panic!("expected StepNotFound, got {other}"),
    }
}

// --- Accumulation: build line items, then submit them in one step ---

struct LineItem {
    product_name: FieldValue<String>,
    quantity: FieldValue<u32>,
}

impl FieldRecord for LineItem {
    fn fields(&self) -> FieldSet<'_> {
        FieldSet::new()
            .deferred("productName", &self.product_name)
            .deferred("quantity", &self.quantity)
    }
}

impl Accumulable for LineItem {}

struct SubmitOrderRequest {
    items: Value,
}

impl FieldRecord for SubmitOrderRequest {
    fn fields(&self) -> FieldSet<'_> {
        FieldSet::new().plain("items", self.items.clone())
    }
}

impl WorkflowRequest for SubmitOrderRequest {
    type Response = OrderResponse;

    fn step_name(&self) -> &str {
        "submitOrder"
    }

    fn target_key(&self) -> &str {
        "api"
    }
}

#[tokio::test]
async fn accumulated_items_are_drained_into_one_submission() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/orders").json_body(json!({
                "items": [
                    {"productName": "Widget", "quantity": 1},
                    {"productName": "Gadget", "quantity": 3}
                ]
            }));
            then.status(201).json_body(order_payload());
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<SubmitOrderRequest>(HttpStep::new(Method::POST, "/orders"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    context
        .build(&LineItem {
            product_name: FieldValue::fixed("Widget".to_string()),
            quantity: FieldValue::fixed(1),
        })
        .unwrap();
    context
        .build(&LineItem {
            product_name: FieldValue::fixed("Gadget".to_string()),
            quantity: FieldValue::fixed(3),
        })
        .unwrap();

    let items = context.drain::<LineItem>();
    assert_eq!(items.len(), 2);
    let request = SubmitOrderRequest {
        items: serde_json::to_value(items).unwrap(),
    };
    context.execute(&request).await.unwrap();

    assert!(context.drain::<LineItem>().is_empty(), "drain is destructive");
    mock.assert_async().await;
}

#[tokio::test]
async fn generated_fields_produce_fresh_values_per_execution() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200).json_body(json!({"token": "t1", "userId": "u1"}));
        })
        .await;

    let target = HttpTarget::new(server.base_url())
        .with_step::<LoginRequest>(HttpStep::new(Method::POST, "/auth/login"))
        .unwrap();
    let mut context = WorkflowContext::new().with_target("api", target);

    let request = LoginRequest {
        username: FieldValue::generated(|| {
            format!("user-{}@test.com", std::time::SystemTime::UNIX_EPOCH.elapsed().map(|d| d.as_nanos()).unwrap_or_default())
        }),
        password: FieldValue::fixed("secret".to_string()),
    };
    context.execute(&request).await.unwrap();
    context.execute(&request).await.unwrap();

    mock.assert_hits_async(2).await;
}
