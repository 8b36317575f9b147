use std::collections::HashSet;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use menu_miner_api::export::records_to_csv;
use menu_miner_api::extractors;
use menu_miner_api::fetch::{self, FetchError};
use menu_miner_api::models::{ExtractRequest, ExtractResponse};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let app = Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_endpoint))
        .route("/extract/csv", post(extract_csv_endpoint));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn extract_endpoint(Json(req): Json<ExtractRequest>) -> Response {
    match run_extraction(req).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn extract_csv_endpoint(Json(req): Json<ExtractRequest>) -> Response {
    match run_extraction(req).await {
        Ok(resp) => {
            let csv = records_to_csv(&resp.records);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"menu_data.csv\"",
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn run_extraction(req: ExtractRequest) -> Result<ExtractResponse, FetchError> {
    let page = fetch::fetch(&req.url, &req.fetch).await?;
    let outcome = extractors::run(req.strategy, &page.raw_html, &req.blocks);

    let mut records = outcome.records;
    if req.dedupe_titles {
        let mut titles = HashSet::new();
        records.retain(|r| titles.insert(r.title.clone()));
    }

    tracing::info!(
        url = %req.url,
        strategy = ?outcome.strategy,
        count = records.len(),
        "extraction finished"
    );

    Ok(ExtractResponse {
        source_url: req.url,
        page_title: page.page_title,
        strategy: outcome.strategy,
        count: records.len(),
        note: outcome.note,
        records,
    })
}

fn error_response(e: FetchError) -> Response {
    let (status, detail) = match &e {
        FetchError::InvalidUrl(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        FetchError::NotHtml => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "URL did not return HTML".to_string(),
        ),
        FetchError::Blocked(code) => (
            StatusCode::BAD_GATEWAY,
            format!(
                "Upstream returned HTTP {}; source likely geo-blocked or bot-defended",
                code
            ),
        ),
        FetchError::Request(msg) => (
            StatusCode::BAD_GATEWAY,
            format!("Upstream request failed: {}", msg),
        ),
    };
    (status, Json(json!({"detail": detail}))).into_response()
}
