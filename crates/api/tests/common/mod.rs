#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use campusqa_api::auth::jwt::{Claims, JwtConfig};
use campusqa_api::config::ServerConfig;
use campusqa_api::router::build_app_router;
use campusqa_api::state::AppState;
use campusqa_engine::EngineConfig;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

/// Build a test `ServerConfig` with safe defaults and a patient retry budget.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "campus-api-test-secret".to_string(),
            issuer: Some("campus-sso".to_string()),
            leeway_secs: 60,
        },
        engine: EngineConfig {
            max_attempts: 50,
            retry_backoff: Duration::from_millis(2),
            ..EngineConfig::default()
        },
    }
}

/// Build the full application router with all middleware layers over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(AppState::new(pool, test_config()))
}

/// Claims shaped like the identity service's: a unique `jti` and a role
/// this server ignores ride along with the ones it checks.
#[derive(serde::Serialize)]
struct IssuedClaims {
    #[serde(flatten)]
    checked: Claims,
    iat: i64,
    jti: String,
    role: &'static str,
}

/// Sign a token the way the identity service would, valid for `ttl_secs`
/// (negative for an already expired one).
pub fn issue_token(user_id: i64, ttl_secs: i64, secret: &str) -> String {
    let now = i64::try_from(get_current_timestamp()).unwrap();
    let claims = IssuedClaims {
        checked: Claims {
            sub: user_id,
            exp: now + ttl_secs,
            iss: Some("campus-sso".to_string()),
        },
        iat: now,
        jti: Uuid::new_v4().to_string(),
        role: "student",
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encoding should succeed")
}

/// A valid Bearer token for `user_id`.
pub fn token_for(user_id: i64) -> String {
    issue_token(user_id, 900, &test_config().jwt.secret)
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    user_id: i64,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST with a verbatim `Authorization` header value.
pub async fn post_json_with_authorization(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    authorization: &str,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", authorization)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, user_id: i64) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    user_id: i64,
) -> Response<Body> {
    let request = Request::put(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, user_id: i64) -> Response<Body> {
    let request = Request::delete(uri)
        .header("authorization", format!("Bearer {}", token_for(user_id)))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}
