//! Local server exposing the same append/retrieve operations as the lambdas.

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use dotenvy::dotenv;
use logbook_core::{Error, LogEntry, LogRequest, Store};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let store = Store::from_env().await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let router = Router::new()
        .route("/logs", get(recent_logs).post(save_log))
        .layer(cors)
        .layer(Extension(store));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, router).await.unwrap();
}

async fn save_log(
    Extension(store): Extension<Store>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let entry = LogRequest::from_json(&body).and_then(LogEntry::from_request)?;
    store.save(&entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Log saved successfully" })),
    ))
}

async fn recent_logs(Extension(store): Extension<Store>) -> Result<impl IntoResponse, ApiError> {
    store.recent_logs().await.map(Json).map_err(ApiError)
}

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("->> {}", self.0);

        let status = match self.0 {
            Error::MissingBody | Error::InvalidBody(_) | Error::MissingMessage => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_bad_request() {
        let response = ApiError(Error::MissingBody).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError(Error::MissingMessage).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bad_json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let response = ApiError(Error::InvalidBody(bad_json)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_internal_error() {
        use serde::de::Error as _;

        let err = serde_dynamo::Error::custom("connection refused");
        let response = ApiError(Error::Item(err)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
