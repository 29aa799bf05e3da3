//! Session, upload, reconcile and download handlers

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tally_io::artifacts;
use tally_recon::{
    build_combined, clean_and_validate_customers_with, clean_and_validate_orders_with, reconcile,
    CleanOptions, CleanReport, DateOrder, ReconSummary, Table,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Read ambiguous dates as month/day/year.
    #[serde(default)]
    pub month_first: bool,
}

impl UploadParams {
    fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            date_order: if self.month_first { DateOrder::MonthFirst } else { DateOrder::DayFirst },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub rows: usize,
    pub report: CleanReport,
}

impl UploadResponse {
    fn new(report: CleanReport) -> Self {
        Self { status: "success", rows: report.output_rows, report }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileParams {
    #[serde(default)]
    pub full: bool,
}

#[derive(Debug, Serialize)]
pub struct FullReconciliation {
    pub summary: ReconSummary,
    pub orders_without_customers: Vec<Map<String, Value>>,
    pub customers_without_orders: Vec<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Download {
    Customers,
    Orders,
    Combined,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "sessions": state.sessions.len().await,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    tracing::info!(%session_id, "session created");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

#[tracing::instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id).await?;
    tracing::info!(session_id = %id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_customers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    state.sessions.get(id).await?;
    let bytes = read_file_field(multipart).await?;
    let options = params.clean_options();

    let cleaned = blocking(move || {
        let table = tally_io::csv::parse_bytes(bytes)?;
        Ok(clean_and_validate_customers_with(&table, &options)?)
    })
    .await?;

    let response = UploadResponse::new(cleaned.report.clone());
    state.sessions.set_customers(id, cleaned).await?;
    Ok(Json(response))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload_orders(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    state.sessions.get(id).await?;
    let bytes = read_file_field(multipart).await?;
    let options = params.clean_options();

    let cleaned = blocking(move || {
        let table = tally_io::csv::parse_bytes(bytes)?;
        Ok(clean_and_validate_orders_with(&table, &options)?)
    })
    .await?;

    let response = UploadResponse::new(cleaned.report.clone());
    state.sessions.set_orders(id, cleaned).await?;
    Ok(Json(response))
}

/// Summary by default; `?full=true` adds both orphan subsets as records.
#[tracing::instrument(skip(state))]
pub async fn reconcile_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ReconcileParams>,
) -> Result<Response, ApiError> {
    let session = state.sessions.get(id).await?;
    let (customers, orders) = (session.customers()?, session.orders()?);
    let report = reconcile(&customers.data, &orders.data);

    if !params.full {
        return Ok(Json(report.summary).into_response());
    }
    Ok(Json(FullReconciliation {
        orders_without_customers: tally_io::json::records(&report.orders_without_customers.to_table()),
        customers_without_orders: tally_io::json::records(&report.customers_without_orders.to_table()),
        summary: report.summary,
    })
    .into_response())
}

#[tracing::instrument(skip(state))]
pub async fn combined(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let session = state.sessions.get(id).await?;
    let (customers, orders) = (session.customers()?, session.orders()?);
    let table = build_combined(&customers.data, &orders.data).to_table();
    Ok(Json(tally_io::json::records(&table)))
}

#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    Path((id, which)): Path<(Uuid, Download)>,
) -> Result<Response, ApiError> {
    let session = state.sessions.get(id).await?;
    let (table, filename) = match which {
        Download::Customers => (session.customers()?.data.to_table(), artifacts::CLEAN_CUSTOMERS),
        Download::Orders => (session.orders()?.data.to_table(), artifacts::CLEAN_ORDERS),
        Download::Combined => {
            let (customers, orders) = (session.customers()?, session.orders()?);
            (build_combined(&customers.data, &orders.data).to_table(), artifacts::COMBINED)
        }
    };
    csv_attachment(&table, filename)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bytes of the multipart field named `file`. Other fields are ignored.
async fn read_file_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Upload(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Upload(format!("Failed to read file data: {}", e)))?;
            tracing::debug!(bytes = data.len(), "received upload");
            return Ok(data.to_vec());
        }
    }
    Err(ApiError::Upload("No file field found in multipart data".to_string()))
}

/// Parsing and cleaning run off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("cleaning task failed: {e}")))?
}

fn csv_attachment(table: &Table, filename: &str) -> Result<Response, ApiError> {
    let body = tally_io::csv::to_csv_string(table).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
        ],
        body,
    )
        .into_response())
}
