use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::export::export_file_name;
use super::filter::FilterCriteria;
use super::service::DashboardService;
use crate::client::RecordSource;
use crate::error::AppError;

/// Query string accepted by the listing and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub min_average: Option<String>,
    #[serde(default)]
    pub max_average: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

impl RecordQuery {
    pub fn criteria(&self) -> Result<FilterCriteria, AppError> {
        Ok(FilterCriteria {
            search: self.q.clone().unwrap_or_default(),
            program: self.program.clone(),
            status: self.status.clone(),
            min_average: parse_bound("min_average", self.min_average.as_deref())?,
            max_average: parse_bound("max_average", self.max_average.as_deref())?,
        })
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<f64>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Some)
        .ok_or_else(|| AppError::InvalidInput(format!("{name} must be a number, got '{raw}'")))
}

/// Router exposing the records dashboard under `/api/v1`.
pub fn dashboard_router<S>(service: Arc<DashboardService<S>>) -> Router
where
    S: RecordSource + 'static,
{
    Router::new()
        .route("/api/v1/records", get(list_handler::<S>))
        .route("/api/v1/records/programs", get(programs_handler::<S>))
        .route("/api/v1/records/export.csv", get(export_handler::<S>))
        .route("/api/v1/records/reload", post(reload_handler::<S>))
        .route(
            "/api/v1/records/:curp/requirements",
            get(requirements_handler::<S>),
        )
        .route(
            "/api/v1/records/:curp/download",
            get(download_handler::<S>),
        )
        .route("/api/v1/catalog", get(catalog_handler::<S>))
        .with_state(service)
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, AppError>
where
    S: RecordSource + 'static,
{
    let criteria = query.criteria()?;
    service.ensure_loaded().await;
    let page = service
        .page(&criteria, query.page.unwrap_or(0), query.page_size)
        .await;
    Ok((StatusCode::OK, Json(page)).into_response())
}

pub(crate) async fn programs_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
) -> Response
where
    S: RecordSource + 'static,
{
    service.ensure_loaded().await;
    let programs = service.programs().await;
    (StatusCode::OK, Json(json!({ "programs": programs }))).into_response()
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, AppError>
where
    S: RecordSource + 'static,
{
    let criteria = query.criteria()?;
    service.ensure_loaded().await;
    let body = service.export(&criteria).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(Local::now().date_naive())
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub(crate) async fn reload_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
) -> Result<Response, AppError>
where
    S: RecordSource + 'static,
{
    let count = service.load().await?;
    Ok((StatusCode::OK, Json(json!({ "loaded": count }))).into_response())
}

pub(crate) async fn requirements_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
    Path(curp): Path<String>,
) -> Result<Response, AppError>
where
    S: RecordSource + 'static,
{
    service.ensure_loaded().await;
    let result = service
        .requirements(&curp)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no record with CURP {curp}")))?;
    Ok((StatusCode::OK, Json(result)).into_response())
}

pub(crate) async fn download_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
    Path(curp): Path<String>,
) -> Result<Response, AppError>
where
    S: RecordSource + 'static,
{
    service.ensure_loaded().await;
    let url = service
        .download_url(&curp)
        .await
        .ok_or_else(|| AppError::NotFound(format!("no attachment for CURP {curp}")))?;
    Ok(Redirect::temporary(&url).into_response())
}

pub(crate) async fn catalog_handler<S>(
    State(service): State<Arc<DashboardService<S>>>,
) -> Response
where
    S: RecordSource + 'static,
{
    (StatusCode::OK, Json(service.catalog().clone())).into_response()
}
