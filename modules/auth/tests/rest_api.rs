use api_ingress::{ApiIngress, ApiIngressConfig};
use auth::{AuthConfig, AuthModule};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use db::{ConnectOpts, DbHandle, DbModule};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app_with(cfg: AuthConfig) -> (Router, DbHandle) {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .unwrap();
    let module = AuthModule::new(&db, cfg, "test").unwrap();
    module.migrate(&db).await.unwrap();

    let mut ingress_cfg = ApiIngressConfig::default();
    ingress_cfg.rate_limit.enabled = false;
    ingress_cfg.slow_down.enabled = false;
    let ingress = ApiIngress::new(ingress_cfg, &runtime::ServerConfig::default());
    (ingress.build_router(&[&module]).unwrap(), db)
}

fn config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-jwt-secret".into(),
        session_secret: "test-session-secret".into(),
        ..Default::default()
    }
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn me(router: &Router, auth: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::get("/api/auth/me");
    if let Some(value) = auth {
        req = req.header(header::AUTHORIZATION, value);
    }
    send(router, req.body(Body::empty()).unwrap()).await
}

fn ada() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "Ada@Example.com",
        "password": "analytical"
    })
}

#[tokio::test]
async fn signup_then_me() {
    let (router, _db) = app_with(config()).await;

    let (status, body) = post(&router, "/api/auth/signup", ada()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["firstName"], "Ada");
    let token = body["token"].as_str().unwrap().to_string();

    let (status, user) = me(&router, Some(&format!("Bearer {token}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["id"], body["id"]);
    assert_eq!(user["lastName"], "Lovelace");
    assert!(user["createdAt"].is_string());
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_conflicts_case_insensitively() {
    let (router, _db) = app_with(config()).await;
    assert_eq!(post(&router, "/api/auth/signup", ada()).await.0, StatusCode::CREATED);

    let mut again = ada();
    again["email"] = json!("  ADA@example.COM ");
    let (status, body) = post(&router, "/api/auth/signup", again).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "message": "User already exists" }));

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "  ADA@example.COM ", "password": "analytical" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn signup_validation_errors() {
    let (router, _db) = app_with(config()).await;
    let (status, body) = post(
        &router,
        "/api/auth/signup",
        json!({ "firstName": "Ada", "lastName": "", "email": "nope", "password": "12345" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "success": false,
            "errors": [
                { "field": "email", "message": "Please include a valid email" },
                { "field": "lastName", "message": "Last name is required" },
                { "field": "password", "message": "Please enter a password with 6 or more characters" }
            ]
        })
    );
}

#[tokio::test]
async fn login_success_and_failures() {
    let (router, _db) = app_with(config()).await;
    post(&router, "/api/auth/signup", ada()).await;

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "ada@example.com", "password": "analytical" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "ada@example.com", "password": "wrong-one" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = post(
        &router,
        "/api/auth/login",
        json!({ "email": "nobody@example.com", "password": "analytical" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");

    let (status, body) = post(&router, "/api/auth/login", json!({ "email": "ada@example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["message"], "Password is required");
}

#[tokio::test]
async fn me_requires_valid_token() {
    let (router, _db) = app_with(config()).await;

    let (status, body) = me(&router, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, no token");

    let (status, body) = me(&router, Some("Bearer not.a.jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized, token failed");

    // Signed with another secret.
    let (other, _other_db) = app_with(AuthConfig {
        jwt_secret: "another-secret".into(),
        ..config()
    })
    .await;
    let (_, body) = post(&other, "/api/auth/signup", ada()).await;
    let foreign = format!("Bearer {}", body["token"].as_str().unwrap());
    let (status, _) = me(&router, Some(&foreign)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_vanished_user_is_not_found() {
    let (router, _db) = app_with(config()).await;
    // Same secret, different database: the subject does not exist here.
    let (other, _other_db) = app_with(config()).await;
    let (_, body) = post(&other, "/api/auth/signup", ada()).await;

    let (status, body) = me(&router, Some(&format!("Bearer {}", body["token"].as_str().unwrap()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn health_and_debug_endpoints() {
    let (router, _db) = app_with(config()).await;
    let get = |uri: &'static str| Request::get(uri).body(Body::empty()).unwrap();

    let (status, body) = send(&router, get("/api/auth/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let (status, body) = send(&router, get("/api/auth/debug")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found - /api/auth/debug");

    let (router, _db2) = app_with(AuthConfig {
        debug_endpoint: true,
        ..config()
    })
    .await;
    let req = Request::get("/api/auth/debug")
        .header(header::REFERER, "http://localhost:3000/login")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["environment"], "test");
    assert_eq!(body["googleClientId"], "Not Set");
    assert_eq!(
        body["googleCallbackUrl"],
        "http://localhost:5000/api/auth/google/callback"
    );
    assert_eq!(body["referer"], "http://localhost:3000/login");
    assert_eq!(body["origin"], Value::Null);
}

#[tokio::test]
async fn module_refuses_blank_frontend_url() {
    let db = DbHandle::connect("sqlite::memory:", ConnectOpts::default())
        .await
        .unwrap();
    let mut cfg = config();
    cfg.frontend_urls = vec![" ".into()];

    let err = AuthModule::new(&db, cfg, "test").err().unwrap();
    assert!(format!("{err:#}").contains("frontend_urls"), "{err:#}");
}
