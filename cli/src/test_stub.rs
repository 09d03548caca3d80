//! In-process stand-in for the restaurant REST API.

use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

pub const ADMIN_EMAIL: &str = "a@x.com";
pub const ADMIN_PASSWORD: &str = "p1";
pub const ADMIN_TOKEN: &str = "tok-admin";
pub const STAFF_EMAIL: &str = "s@x.com";
pub const STAFF_PASSWORD: &str = "p2";
pub const STAFF_TOKEN: &str = "tok-staff";
pub const INACTIVE_EMAIL: &str = "gone@x.com";

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn caller(headers: &HeaderMap) -> Option<(&'static str, bool)> {
    match headers.get("authorization")?.to_str().ok()? {
        "Bearer tok-admin" => Some((ADMIN_EMAIL, true)),
        "Bearer tok-staff" => Some((STAFF_EMAIL, false)),
        _ => None,
    }
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username == INACTIVE_EMAIL {
        return detail(StatusCode::BAD_REQUEST, "Inactive user");
    }
    let token = match (form.username.as_str(), form.password.as_str()) {
        (ADMIN_EMAIL, ADMIN_PASSWORD) => ADMIN_TOKEN,
        (STAFF_EMAIL, STAFF_PASSWORD) => STAFF_TOKEN,
        _ => return detail(StatusCode::UNAUTHORIZED, "Incorrect email or password"),
    };
    Json(json!({ "access_token": token, "token_type": "bearer" })).into_response()
}

async fn me(headers: HeaderMap) -> Response {
    match caller(&headers) {
        Some((email, is_admin)) => Json(json!({
            "id": 1,
            "email": email,
            "is_admin": is_admin,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00"
        }))
        .into_response(),
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

async fn dashboard(headers: HeaderMap) -> Response {
    match caller(&headers) {
        Some((email, true)) => Json(json!({
            "message": format!("Welcome to admin dashboard, {email}!"),
            "user": { "email": email, "is_admin": true }
        }))
        .into_response(),
        Some((_, false)) => detail(StatusCode::FORBIDDEN, "Admin access required"),
        None => detail(StatusCode::UNAUTHORIZED, "Could not validate credentials"),
    }
}

async fn menu() -> Response {
    Json(json!([{ "id": 1, "name": "Margherita" }])).into_response()
}

/// Serve the stub on an ephemeral port and return its base URL.
pub async fn spawn() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/admin/dashboard", get(dashboard))
        .route("/api/menu", get(menu));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}
