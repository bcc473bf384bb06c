use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use stayhub_api::{app, AppState};
use stayhub_core::upload::{HostedImage, ImageHost, ImageHostError, ImageUpload};
use stayhub_core::{BookingService, ContactIntake, TransitionPolicy, UploadRelay};
use stayhub_domain::{Apartment, Booking, BookingStatus, User};
use stayhub_store::MemoryStore;
use tower::ServiceExt;

const BOUNDARY: &str = "stayhub-test-boundary";

struct StaticHost;

#[async_trait]
impl ImageHost for StaticHost {
    async fn upload_image(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
        Ok(HostedImage {
            url: format!(
                "https://images.test/{}?bytes={}",
                upload.file_name.unwrap_or_default(),
                upload.bytes.len()
            ),
        })
    }
}

struct UnreachableHost;

#[async_trait]
impl ImageHost for UnreachableHost {
    async fn upload_image(&self, _upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
        Err(ImageHostError::Transport("connection refused".to_string()))
    }
}

struct TestApp {
    store: MemoryStore,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        Self::with(TransitionPolicy::Permissive, Arc::new(StaticHost))
    }

    fn with(policy: TransitionPolicy, host: Arc<dyn ImageHost>) -> Self {
        let store = MemoryStore::new();
        let state = AppState::new(
            BookingService::new(Arc::new(store.clone()), policy),
            ContactIntake::new(Arc::new(store.clone())),
            UploadRelay::new(host),
            1024 * 1024,
        );
        Self { store, state }
    }

    fn router(&self) -> Router {
        app(self.state.clone())
    }

    async fn booking(&self, balance: i64, status: BookingStatus) -> (User, Apartment, Booking) {
        let user = self.store.insert_user("mira", balance).await;
        let apartment = self.store.insert_apartment("Canal-side loft", 100).await;
        let booking = self
            .store
            .insert_booking(&user, &apartment, Utc::now(), 3, status)
            .await;
        (user, apartment, booking)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn confirming_with_enough_balance_debits_user() {
    let app = TestApp::new();
    let (user, _, booking) = app.booking(500, BookingStatus::Pending).await;

    let (status, body) = app
        .send(json_request(
            Method::PATCH,
            &format!("/api/bookings/{}", booking.id),
            json!({ "status": "CONFIRMED" }),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Booking status updated");
    assert_eq!(body["data"]["status"], "CONFIRMED");
    assert_eq!(body["data"]["totalPrice"], 300);
    assert_eq!(app.store.user(user.id).await.unwrap().balance, 200);
}

#[tokio::test]
async fn confirming_without_balance_is_rejected() {
    let app = TestApp::new();
    let (user, _, booking) = app.booking(200, BookingStatus::Pending).await;

    let (status, body) = app
        .send(json_request(
            Method::PATCH,
            &format!("/api/bookings/{}", booking.id),
            json!({ "status": "CONFIRMED" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "User has insufficient balance" }));
    assert_eq!(app.store.user(user.id).await.unwrap().balance, 200);
    assert_eq!(
        app.store.booking(booking.id).await.unwrap().status,
        BookingStatus::Pending
    );
}

#[tokio::test]
async fn cancelling_confirmed_booking_credits_once() {
    let app = TestApp::new();
    let (user, _, booking) = app.booking(0, BookingStatus::Confirmed).await;
    let uri = format!("/api/bookings/{}", booking.id);

    for _ in 0..2 {
        let (status, body) = app
            .send(json_request(Method::PATCH, &uri, json!({ "status": "CANCELLED" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "CANCELLED");
    }

    assert_eq!(app.store.user(user.id).await.unwrap().balance, 300);
}

#[tokio::test]
async fn invalid_status_is_rejected() {
    let app = TestApp::new();
    let (_, _, booking) = app.booking(500, BookingStatus::Pending).await;
    let uri = format!("/api/bookings/{}", booking.id);

    for body in [json!({ "status": "FOO" }), json!({ "status": 3 }), json!({})] {
        let (status, response) = app.send(json_request(Method::PATCH, &uri, body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({ "error": "Invalid status" }));
    }

    let not_json = Request::builder()
        .method(Method::PATCH)
        .uri(&uri)
        .body(Body::from("status=CONFIRMED"))
        .unwrap();
    let (status, response) = app.send(not_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid status");

    assert_eq!(
        app.store.booking(booking.id).await.unwrap().status,
        BookingStatus::Pending
    );
}

#[tokio::test]
async fn unknown_booking_is_not_found() {
    let app = TestApp::new();
    let uri = format!("/api/bookings/{}", uuid::Uuid::new_v4());

    let (status, body) = app
        .send(json_request(Method::PATCH, &uri, json!({ "status": "CONFIRMED" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Booking not found" }));

    let (status, body) = app.send(get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Booking not found" }));
}

#[tokio::test]
async fn malformed_booking_id_is_bad_request() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/api/bookings/not-a-uuid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid booking id" }));

    let (status, body) = app
        .send(json_request(
            Method::PATCH,
            "/api/bookings/not-a-uuid",
            json!({ "status": "CONFIRMED" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid booking id" }));
}

#[tokio::test]
async fn strict_policy_refuses_reconfirming_cancelled_booking() {
    let app = TestApp::with(TransitionPolicy::Strict, Arc::new(StaticHost));
    let (user, _, booking) = app.booking(500, BookingStatus::Cancelled).await;

    let (status, body) = app
        .send(json_request(
            Method::PATCH,
            &format!("/api/bookings/{}", booking.id),
            json!({ "status": "CONFIRMED" }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Cannot change booking status from CANCELLED to CONFIRMED"
    );
    assert_eq!(app.store.user(user.id).await.unwrap().balance, 500);
}

#[tokio::test]
async fn booking_details_include_user_and_apartment() {
    let app = TestApp::new();
    let (user, apartment, booking) = app.booking(500, BookingStatus::Pending).await;

    let (status, body) = app
        .send(get(&format!("/api/bookings/{}", booking.id)))
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["id"], booking.id.to_string());
    assert_eq!(data["status"], "PENDING");
    assert_eq!(data["user"]["id"], user.id.to_string());
    assert_eq!(data["user"]["username"], "mira");
    assert_eq!(data["user"]["balance"], 500);
    assert_eq!(data["apartment"]["title"], apartment.title);
    assert_eq!(data["apartment"]["pricePerNight"], 100);
}

#[tokio::test]
async fn bookings_list_filters_by_status_and_search() {
    let app = TestApp::new();
    let (_, _, pending) = app.booking(500, BookingStatus::Pending).await;
    let jonas = app.store.insert_user("jonas", 0).await;
    let cabin = app.store.insert_apartment("Pine cabin", 85).await;
    app.store
        .insert_booking(&jonas, &cabin, Utc::now(), 2, BookingStatus::Confirmed)
        .await;

    let (status, body) = app.send(get("/api/bookings")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Bookings fetched successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.send(get("/api/bookings?status=PENDING")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"], pending.id.to_string());

    let (_, body) = app.send(get("/api/bookings?status=ALL&search=PINE")).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["user"]["username"], "jonas");

    let (status, body) = app.send(get("/api/bookings?status=archived")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid status" }));
}

#[tokio::test]
async fn contact_is_created_unread() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/contacts",
            json!({
                "fullName": "Lena Fischer",
                "email": "lena@example.com",
                "subject": "Late check-in",
                "message": "Can we arrive after 11pm?"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["fullName"], "Lena Fischer");
    assert_eq!(body["isRead"], false);
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn contact_missing_field_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/contacts",
            json!({
                "fullName": "Lena Fischer",
                "email": "lena@example.com",
                "message": "Can we arrive after 11pm?"
            }),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "All fields are required." }));

    let (_, body) = app.send(get("/api/contacts")).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn contacts_list_applies_filters() {
    let app = TestApp::new();
    for email in ["lena@example.com", "omar@example.com"] {
        let (status, _) = app
            .send(json_request(
                Method::POST,
                "/api/contacts",
                json!({
                    "fullName": "Guest",
                    "email": email,
                    "subject": "Parking",
                    "message": "Is there parking nearby?"
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app.send(get("/api/contacts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Contacts fetched successfully");
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app
        .send(get("/api/contacts?email=omar%40example.com"))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.send(get("/api/contacts?isRead=true")).await;
    assert_eq!(body["data"], json!([]));

    // Anything but true/false is ignored.
    let (_, body) = app.send(get("/api/contacts?isRead=maybe")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_returns_hosted_url() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request("file", "cover.png", b"\x89PNG\r\n"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "url": "https://images.test/cover.png?bytes=6" }));
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .send(multipart_request("avatar", "cover.png", b"\x89PNG"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file provided" }));

    let (status, body) = app.send(multipart_request("file", "empty.png", b"")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file provided" }));

    let not_multipart = json_request(Method::POST, "/api/upload", json!({}));
    let (status, body) = app.send(not_multipart).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No file provided" }));
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway() {
    let app = TestApp::with(TransitionPolicy::Permissive, Arc::new(UnreachableHost));

    let (status, body) = app
        .send(multipart_request("file", "cover.png", b"\x89PNG"))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "Upload failed" }));
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/bookings/abc")
        .header(header::ORIGIN, "https://admin.stayhub.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
    let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap();
    assert!(methods.contains("PATCH"));
}
