mod util;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use signsrv::cert::Certificate;
use signsrv::http::{VALIDATION_ERROR_CODE, create_router};
use signsrv::key::KeyPair;
use tower::ServiceExt;

fn router() -> axum::Router {
    let service = util::signing_service(util::generate_ca_cert(KeyPair::generate_ed25519()), 3);
    create_router(Arc::new(service))
}

async fn send(request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn sign_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri("/cert/sign")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

#[tokio::test]
async fn sign_returns_certificate() {
    let csr = util::csr_pem("user1", &KeyPair::generate_ecdsa_p256());
    let body = json!({ "name": "client-1", "csr": csr, "validity": 30 }).to_string();

    let (status, body) = send(sign_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["Request from"], "client-1");
    assert_eq!(body["node"], "test-node");

    let cert = Certificate::from_pem(body["Result"].as_str().unwrap()).unwrap();
    assert_eq!(cert.subject().to_string(), "CN=user1");
    assert_eq!(cert.validity().unwrap().duration(), time::Duration::days(3));
}

#[tokio::test]
async fn sign_without_validity_uses_ceiling() {
    let csr = util::csr_pem("user1", &KeyPair::generate_ed25519());
    let body = json!({ "name": "client-1", "csr": csr }).to_string();

    let (status, body) = send(sign_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    let cert = Certificate::from_pem(body["Result"].as_str().unwrap()).unwrap();
    assert_eq!(cert.validity().unwrap().duration(), time::Duration::days(3));
}

#[tokio::test]
async fn sign_rejects_invalid_csr() {
    let body = json!({ "name": "client-1", "csr": "not-a-csr" }).to_string();

    let (status, body) = send(sign_request(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(
        body["detail"]
            .as_str()
            .unwrap()
            .contains("Invalid CSR PEM content"),
        "{body}"
    );
}

#[tokio::test]
async fn sign_rejects_non_positive_validity() {
    let csr = util::csr_pem("user1", &KeyPair::generate_ed25519());
    let body = json!({ "name": "client-1", "csr": csr, "validity": 0 }).to_string();

    let (status, body) = send(sign_request(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn sign_rejects_malformed_body() {
    for body in ["{", r#"{"name": "client-1"}"#, r#"{"name": 1, "csr": "x"}"#] {
        let (status, response) = send(sign_request(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

        let response: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(response["status_code"], VALIDATION_ERROR_CODE);
        assert!(response["message"].is_string());
        assert!(response["data"].is_null());
    }
}

#[tokio::test]
async fn health_endpoints() {
    let (status, body) = send(Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "status": "healthy", "node": "test-node" }));

    let (status, body) = send(Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "msg": "Hello World" }));
}
