#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use maize_mill::{
    app,
    app_state::AppState,
    config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig},
    db,
};
use serde_json::Value;
use tower::ServiceExt;

pub fn test_config(url: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseConfig {
            url: url.into(),
            max_connections: 4,
        },
        auth: AuthConfig {
            session_ttl_hours: 1,
        },
    }
}

/// Router over a pool that never connects unless a handler asks for one.
pub fn offline_app() -> Router {
    let url = "postgres://nobody@127.0.0.1:1/none";
    app(AppState::new(db::create_lazy_pool(url), test_config(url)))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
