//! Requests that are answered before any query reaches Postgres. The state
//! behind the router holds a lazy pool that is never connected.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use recipe_catalog::{
    app::build_app,
    auth::{jwt::JwtKeys, Claims},
    state::AppState,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn app() -> (Router, AppState) {
    let state = AppState::fake();
    (build_app(state.clone()), state)
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let (app, _) = app();
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn own_recipes_require_cookie() {
    let (app, _) = app();
    let resp = app
        .oneshot(Request::builder().uri("/user/recipes").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "unauthorized");
    assert_eq!(json["message"], "Unauthenticated! Please log in.");
}

#[tokio::test]
async fn every_protected_route_rejects_anonymous_callers() {
    let id = Uuid::new_v4();
    let routes = [
        ("GET", "/user".to_string()),
        ("GET", "/user/recipes".to_string()),
        ("POST", "/user/recipes".to_string()),
        ("GET", format!("/user/recipes/{id}")),
        ("PUT", format!("/user/recipes/{id}")),
        ("DELETE", format!("/user/recipes/{id}")),
        ("GET", "/api/users".to_string()),
        ("POST", "/api/users".to_string()),
        ("GET", format!("/api/users/{id}")),
        ("PATCH", format!("/api/users/{id}")),
        ("DELETE", format!("/api/users/{id}")),
    ];

    for (method, uri) in routes {
        let (app, _) = app();
        let req = Request::builder()
            .method(method)
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn tampered_cookie_is_rejected() {
    let (app, state) = app();
    let keys = JwtKeys::new(&state.config.jwt);
    let token = keys.sign(Uuid::new_v4()).unwrap();
    let forged = format!("{}x", token);

    let resp = app
        .oneshot(get_with_cookie("/user/recipes", &format!("jwt={forged}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Invalid token!");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let (app, state) = app();
    let mut cfg = state.config.jwt.clone();
    cfg.secret = "some-other-secret".into();
    let token = JwtKeys::new(&cfg).sign(Uuid::new_v4()).unwrap();

    let resp = app
        .oneshot(get_with_cookie("/user", &format!("jwt={token}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_cookie_is_rejected() {
    let (app, state) = app();
    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        sub: Uuid::new_v4(),
        iat: (now - 2 * 3600) as usize,
        exp: (now - 3600) as usize,
    };
    let token = JwtKeys::new(&state.config.jwt).encode(&claims).unwrap();

    let resp = app
        .oneshot(get_with_cookie("/user/recipes", &format!("jwt={token}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Token expired.");
}

#[tokio::test]
async fn unknown_ordering_field_is_rejected() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes?ordering=bogus_field")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["details"][0]["field"], "ordering");
}

#[tokio::test]
async fn non_numeric_filter_is_rejected() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes?servings=many")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["details"][0]["field"], "servings");
}

#[tokio::test]
async fn malformed_page_number_is_not_found() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes?page=zero")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "Invalid page.");
}

#[tokio::test]
async fn malformed_recipe_id_reads_as_missing() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes/123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["message"], "Recipe not found.");
}

#[tokio::test]
async fn undecodable_query_is_a_json_bad_request() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/recipes?ordering=servings&ordering=bogus")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(body_json(resp).await["error"], "bad_request");
}

#[tokio::test]
async fn register_reports_missing_fields() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email": "not-an-email"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    let fields: Vec<&str> = json["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "email", "password"]);
}

#[tokio::test]
async fn login_with_malformed_body_is_bad_request() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "bad_request");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let (app, _) = app();
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(header::COOKIE, "jwt=whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("jwt="), "{set_cookie}");
    assert!(set_cookie.contains("Max-Age=0"), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"), "{set_cookie}");
    assert!(set_cookie.contains("SameSite=Lax"), "{set_cookie}");

    assert_eq!(body_json(resp).await["message"], "Logout Done");
}
