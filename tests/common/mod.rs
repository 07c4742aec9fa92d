use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use recipe_catalog::{
    app::build_app,
    config::{AppConfig, CookieConfig, JwtConfig, SESSION_COOKIE},
    state::AppState,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-secret";

/// Router over a migrated database from `DATABASE_URL`.
pub async fn test_app() -> Router {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to database");
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("run migrations");

    let config = Arc::new(AppConfig {
        database_url: url,
        database_max_connections: 5,
        jwt: JwtConfig {
            secret: TEST_SECRET.into(),
            ttl_minutes: 60,
        },
        cookie: CookieConfig {
            name: SESSION_COOKIE.into(),
            secure: false,
        },
    });
    build_app(AppState::from_parts(db, config))
}

/// Short random suffix so runs against a shared database do not collide.
pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..12])
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        req = req.header(header::COOKIE, cookie);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub struct Session {
    pub user_id: Uuid,
    pub token: String,
    pub cookie: String,
}

/// Register a fresh account and log it in.
pub async fn register_and_login(app: &Router) -> Session {
    let username = unique("cook");
    let email = format!("{username}@example.com");
    let password = "correct-horse";

    let (status, user) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": username, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register: {user}");
    let user_id: Uuid = user["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login: {body}");
    let token = body["jwt"].as_str().unwrap().to_string();

    Session {
        user_id,
        cookie: format!("{SESSION_COOKIE}={token}"),
        token,
    }
}

pub fn recipe_body(owner: Uuid, title: &str, category: &str, servings: i32) -> Value {
    json!({
        "title": title,
        "description": "A weeknight staple",
        "ingredients": ["flour", "water", "salt"],
        "instructions": "Mix, knead, rest, bake.",
        "category": category,
        "preparation_time": 15,
        "cooking_time": 30,
        "servings": servings,
        "user": owner.to_string(),
    })
}
