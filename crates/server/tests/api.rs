// Router tests: requests go through the full middleware stack via `oneshot`.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, Method, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tally_server::{app, AppState};
use tower::ServiceExt;

const CUSTOMERS: &str = "\
customer_id,email,signup_date,segment
1,alice@example.com,01/01/2023,retail
2,bob@example,15/01/2023,retail
3,carol@example.com,not-a-date,wholesale
";

const ORDERS: &str = "\
order_id,customer_id,amount,order_date
o1,1,100.0,02/01/2023
o2,2.0,invalid,03/01/2023
o3,4,200.0,04/01/2023
o4, 3 ,50,05/01/2023
";

const BOUNDARY: &str = "tally-test-boundary";
const LIMIT: usize = 1024 * 1024;

fn router() -> Router {
    app(AppState::default(), LIMIT)
}

fn multipart_body(field: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.csv\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

fn upload_request(uri: &str, field: &str, content: &str) -> Request<Body> {
    let body = multipart_body(field, content);
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(response: Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

async fn new_session(app: &Router) -> String {
    let response = send(
        app,
        Request::builder().method(Method::POST).uri("/sessions").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["session_id"].as_str().unwrap().to_string()
}

/// Session with both datasets uploaded.
async fn loaded_session(app: &Router) -> String {
    let id = new_session(app).await;
    let response = send(app, upload_request(&format!("/sessions/{id}/customers"), "file", CUSTOMERS)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(app, upload_request(&format!("/sessions/{id}/orders"), "file", ORDERS)).await;
    assert_eq!(response.status(), StatusCode::OK);
    id
}

#[tokio::test]
async fn test_health() {
    let app = router();
    let response = send(&app, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "healthy", "sessions": 0}));
}

#[tokio::test]
async fn test_upload_reports_cleaning() {
    let app = router();
    let id = new_session(&app).await;

    let response = send(&app, upload_request(&format!("/sessions/{id}/customers"), "file", CUSTOMERS)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "success");
    assert_eq!(json["rows"], 3);
    assert_eq!(json["report"]["dataset"], "customers");
    assert_eq!(json["report"]["invalid"]["email"], 1);
    assert_eq!(json["report"]["invalid"]["signup_date"], 1);

    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "file", ORDERS)).await;
    let json = body_json(response).await;
    assert_eq!(json["rows"], 4);
    assert_eq!(json["report"]["invalid"]["amount"], 1);
}

#[tokio::test]
async fn test_reconcile_summary() {
    let app = router();
    let id = loaded_session(&app).await;

    let response = send(&app, get(&format!("/sessions/{id}/reconcile"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "total_customers": 3,
            "total_orders": 4,
            "orders_without_customers_count": 1,
            "customers_without_orders_count": 0,
        })
    );
}

#[tokio::test]
async fn test_reconcile_full() {
    let app = router();
    let id = loaded_session(&app).await;

    let response = send(&app, get(&format!("/sessions/{id}/reconcile?full=true"))).await;
    let json = body_json(response).await;
    assert_eq!(json["summary"]["orders_without_customers_count"], 1);
    assert_eq!(
        json["orders_without_customers"],
        json!([{
            "order_id": "o3",
            "customer_id": "4",
            "amount": "200",
            "order_date": "2023-01-04",
            "amount_valid": "true",
            "order_date_valid": "true",
        }])
    );
    assert_eq!(json["customers_without_orders"], json!([]));
}

#[tokio::test]
async fn test_combined_records() {
    let app = router();
    let id = loaded_session(&app).await;

    let response = send(&app, get(&format!("/sessions/{id}/combined"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rows = body_json(response).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);

    assert_eq!(rows[0]["email"], "alice@example.com");
    assert_eq!(rows[0]["customer_exists"], "true");
    assert_eq!(rows[1]["email_valid"], "false");
    assert_eq!(rows[2]["order_id"], "o3");
    assert_eq!(rows[2]["customer_exists"], "false");
    assert_eq!(rows[2]["email"], "");
    assert_eq!(rows[3]["segment"], "wholesale");
}

#[tokio::test]
async fn test_download_orders_is_orders() {
    let app = router();
    let id = loaded_session(&app).await;

    let response = send(&app, get(&format!("/sessions/{id}/download/orders"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"clean_orders.csv\""
    );
    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "order_id,customer_id,amount,order_date,amount_valid,order_date_valid");
    assert_eq!(lines.len(), 5);
}

#[tokio::test]
async fn test_download_customers_and_combined() {
    let app = router();
    let id = loaded_session(&app).await;

    let response = send(&app, get(&format!("/sessions/{id}/download/customers"))).await;
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"clean_customers.csv\""
    );
    assert!(body_text(response)
        .await
        .starts_with("customer_id,email,signup_date,segment,email_valid,signup_date_valid\n"));

    let response = send(&app, get(&format!("/sessions/{id}/download/combined"))).await;
    let csv = body_text(response).await;
    assert!(csv.lines().next().unwrap().ends_with(",customer_exists"));
    assert_eq!(csv.lines().count(), 5);
}

#[tokio::test]
async fn test_month_first_upload() {
    let app = router();
    let id = new_session(&app).await;
    let response = send(
        &app,
        upload_request(&format!("/sessions/{id}/orders?month_first=true"), "file", ORDERS),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let csv = body_text(send(&app, get(&format!("/sessions/{id}/download/orders"))).await).await;
    assert!(csv.lines().nth(1).unwrap().contains("2023-02-01"), "csv: {csv}");
}

#[tokio::test]
async fn test_reupload_replaces_dataset() {
    let app = router();
    let id = loaded_session(&app).await;

    let matched = "order_id,customer_id,amount,order_date\no1,1,1,2023-01-01\no2,2,2,2023-01-01\no3,3,3,2023-01-01\n";
    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "file", matched)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let summary = body_json(send(&app, get(&format!("/sessions/{id}/reconcile"))).await).await;
    assert_eq!(summary["total_orders"], 3);
    assert_eq!(summary["orders_without_customers_count"], 0);
}

#[tokio::test]
async fn test_reconcile_before_upload_conflicts() {
    let app = router();
    let id = new_session(&app).await;
    send(&app, upload_request(&format!("/sessions/{id}/customers"), "file", CUSTOMERS)).await;

    let response = send(&app, get(&format!("/sessions/{id}/reconcile"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "missing_dataset");
    assert_eq!(json["error"]["status"], 409);

    // Single-dataset download only needs that dataset
    let response = send(&app, get(&format!("/sessions/{id}/download/customers"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, get(&format!("/sessions/{id}/download/combined"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = router();
    let id = uuid::Uuid::new_v4();

    let response = send(&app, get(&format!("/sessions/{id}/reconcile"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["kind"], "session_not_found");

    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "file", ORDERS)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_customers_rejected() {
    let app = router();
    let id = new_session(&app).await;
    let dup = "customer_id,email,signup_date\nABC,a@x.com,01/01/2023\nabc,b@x.com,02/01/2023\n";

    let response = send(&app, upload_request(&format!("/sessions/{id}/customers"), "file", dup)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["kind"], "duplicate_key");
    assert!(json["error"]["message"].as_str().unwrap().contains("abc"));

    // The failed upload leaves nothing behind
    let response = send(&app, get(&format!("/sessions/{id}/download/customers"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_missing_columns_rejected() {
    let app = router();
    let id = new_session(&app).await;
    let response = send(
        &app,
        upload_request(&format!("/sessions/{id}/orders"), "file", "order_id,customer_id\no1,1\n"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["kind"], "missing_columns");
}

#[tokio::test]
async fn test_bad_uploads_are_400() {
    let app = router();
    let id = new_session(&app).await;

    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "attachment", ORDERS)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["kind"], "invalid_upload");

    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "file", "")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["kind"], "empty_input");
}

#[tokio::test]
async fn test_upload_limit() {
    let app = app(AppState::default(), 64);
    let id = new_session(&app).await;
    let response = send(&app, upload_request(&format!("/sessions/{id}/orders"), "file", ORDERS)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_delete_session() {
    let app = router();
    let id = loaded_session(&app).await;

    let delete = || {
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/sessions/{id}"))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&app, delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(send(&app, delete()).await.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get(&format!("/sessions/{id}/reconcile"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
