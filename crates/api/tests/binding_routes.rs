//! Router-level tests for binding attachment.
//!
//! These drive the real router with `tower::ServiceExt::oneshot` and check:
//! 1. Each failure step maps to its status (400 / 500 / 403) and JSON body
//! 2. Decorated handlers only run after a binding was attached
//! 3. Action requests fall back to the binding named in the action params
//! 4. Ambient layers (request id, Server header, CORS) are applied

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    routing::get,
    Extension, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use bindgate_api::{app::build_app, config::ApiConfig, HasBinding, RequestWithBinding};
use bindgate_auth::{Binding, Mandate, Realm, Role, SignedMandate, UnverifiedMandateDecoder};
use bindgate_core::{BindingId, PublicKey, RealmId};
use bindgate_infra::{BindingStore, InMemoryBindingStore, StoreError};

fn realm_key() -> PublicKey {
    PublicKey::ec("P-256", "realm-x", "realm-y")
}

fn foreign_key() -> PublicKey {
    PublicKey::ec("P-256", "other-x", "other-y")
}

fn store() -> Arc<dyn BindingStore> {
    Arc::new(InMemoryBindingStore::from_bindings([Binding::new(
        BindingId::new("b1").unwrap(),
        Realm::new(RealmId::new("realm.example.com").unwrap(), realm_key()),
        vec![Role::new("admin"), Role::new("owner")],
    )]))
}

struct UnreachableStore;

impl BindingStore for UnreachableStore {
    fn get(&self, _id: &BindingId) -> Result<Arc<Binding>, StoreError> {
        Err(StoreError::backend("connection refused"))
    }
}

fn app_with(store: Arc<dyn BindingStore>) -> Router {
    build_app(&ApiConfig::default(), store, Arc::new(UnverifiedMandateDecoder::new())).unwrap()
}

fn app() -> Router {
    app_with(store())
}

fn token(mandates: &[SignedMandate]) -> String {
    UnverifiedMandateDecoder::encode(mandates).unwrap()
}

fn mandate(signer: PublicKey, role: &'static str) -> SignedMandate {
    SignedMandate::new(signer, Mandate::new(role))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_with_mandates(uri: &str, mandates: &[SignedMandate]) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(mandates)))
        .body(Body::empty())
        .unwrap()
}

fn post_action(uri: &str, mandates: &[SignedMandate], body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(mandates)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_public_and_carries_ambient_headers() {
    let res = app().oneshot(get_req("/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let server = res.headers().get(header::SERVER).unwrap().to_str().unwrap();
    assert!(server.starts_with("bindgate/"));
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn plain_request_without_binding_is_bad_request() {
    let res = app().oneshot(get_req("/binding")).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(res).await,
        json!({"error": "missing_binding", "message": "No binding in request"})
    );
}

#[tokio::test]
async fn unknown_binding_is_internal_error() {
    let res = app().oneshot(get_req("/binding?binding=nope")).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body["error"], "binding_lookup_failed");
    assert_eq!(body["message"], "could not lookup binding: binding 'nope' not found");
}

#[tokio::test]
async fn store_failure_is_internal_error() {
    let res = app_with(Arc::new(UnreachableStore))
        .oneshot(get_req("/binding?binding=b1"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(
        body["message"],
        "could not lookup binding: binding store failure: connection refused"
    );
}

#[tokio::test]
async fn plain_request_exposes_resolved_binding() {
    let res = app().oneshot(get_req("/binding?binding=b1")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["binding"]["binding_id"], "b1");
    assert_eq!(body["binding"]["realm_id"], "realm.example.com");
    assert_eq!(
        body["binding"]["realm_thumbprint"],
        realm_key().thumbprint().unwrap().to_string()
    );
    assert_eq!(body["binding"]["admin_roles"], json!(["admin", "owner"]));
}

#[tokio::test]
async fn authenticated_route_requires_a_token() {
    let res = app().oneshot(get_req("/binding/admin?binding=b1")).await.unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["error"], "unauthorized");
}

#[tokio::test]
async fn mandate_from_foreign_realm_is_forbidden() {
    let res = app()
        .oneshot(get_with_mandates(
            "/binding/admin?binding=b1",
            &[mandate(foreign_key(), "admin")],
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(res).await,
        json!({"error": "mandate_not_authorized", "message": "Mandate not signed by binding realm"})
    );
}

#[tokio::test]
async fn role_match_is_case_sensitive() {
    let res = app()
        .oneshot(get_with_mandates(
            "/binding/admin?binding=b1",
            &[mandate(realm_key(), "Admin")],
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn missing_binding_is_checked_before_mandates() {
    let res = app()
        .oneshot(get_with_mandates("/binding/admin", &[mandate(foreign_key(), "admin")]))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn realm_signed_admin_mandate_is_accepted() {
    let res = app()
        .oneshot(get_with_mandates(
            "/binding/admin?binding=b1",
            &[mandate(foreign_key(), "admin"), mandate(realm_key(), "owner")],
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["binding"]["binding_id"], "b1");
    assert_eq!(body["mandates"].as_array().unwrap().len(), 2);
    assert_eq!(body["mandates"][1]["role"], "owner");
}

#[tokio::test]
async fn action_binding_comes_from_params_when_query_is_absent() {
    let res = app()
        .oneshot(post_action(
            "/binding/actions",
            &[mandate(realm_key(), "admin")],
            json!({"type": "rotate-key", "params": {"binding": "b1"}, "nonce": "n-1"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let body = json_body(res).await;
    assert_eq!(body["binding_id"], "b1");
    assert_eq!(body["action"], "rotate-key");
    assert_eq!(body["nonce"], "n-1");
}

#[tokio::test]
async fn action_query_param_wins_over_params() {
    let res = app()
        .oneshot(post_action(
            "/binding/actions?binding=b1",
            &[mandate(realm_key(), "admin")],
            json!({"type": "rotate-key", "params": {"binding": "does-not-exist"}}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn action_without_binding_is_bad_request() {
    let res = app()
        .oneshot(post_action(
            "/binding/actions",
            &[mandate(realm_key(), "admin")],
            json!({"type": "rotate-key"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "missing_binding");
}

#[tokio::test]
async fn malformed_action_body_is_bad_request() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/binding/actions?binding=b1")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token(&[mandate(realm_key(), "admin")])),
        )
        .body(Body::from("not json"))
        .unwrap();

    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["error"], "invalid_action");
}

#[tokio::test]
async fn decorated_handler_runs_only_after_attachment() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let router = Router::new()
        .route(
            "/count",
            get(move |req: RequestWithBinding| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    req.binding().realm().id.to_string()
                }
            }),
        )
        .layer(Extension(store()));

    let res = router.clone().oneshot(get_req("/count")).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = router.clone().oneshot(get_req("/count?binding=nope")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let res = router.oneshot(get_req("/count?binding=b1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_store_extension_is_internal_error() {
    let router = Router::new().route(
        "/count",
        get(|req: RequestWithBinding| async move { req.binding().realm().id.to_string() }),
    );

    let res = router.oneshot(get_req("/count?binding=b1")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn repeated_requests_are_resolved_independently() {
    let app = app();

    let first = app.clone().oneshot(get_req("/binding?binding=b1")).await.unwrap();
    let second = app.oneshot(get_req("/binding?binding=b1")).await.unwrap();

    let first = json_body(first).await;
    let second = json_body(second).await;
    assert_eq!(first["binding"], second["binding"]);
    assert_ne!(first["request_id"], second["request_id"]);
}

#[tokio::test]
async fn cors_preflight_uses_configured_methods() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/binding")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let methods = res
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
    assert!(methods.contains("DELETE"));
    assert_eq!(
        res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn blank_query_binding_falls_back_to_action_params() {
    let res = app()
        .oneshot(post_action(
            "/binding/actions?binding=%20",
            &[mandate(realm_key(), "admin")],
            json!({"type": "rotate-key", "params": {"binding": "b1"}}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::ACCEPTED);
    assert_eq!(json_body(res).await["binding_id"], "b1");
}

#[tokio::test]
async fn unsupported_method_is_rejected_before_mandates() {
    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/binding/admin?binding=b1")
        .body(Body::empty())
        .unwrap();

    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn oversized_action_body_is_payload_too_large() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/binding/actions?binding=b1")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", token(&[mandate(realm_key(), "admin")])),
        )
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(vec![b' '; 2 * 1024 * 1024]))
        .unwrap();

    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(res).await["error"], "payload_too_large");
}
