use lambda_http::{run, service_fn, tracing};
use lambda_http::{Body, Error, Request, Response};
use logbook_core::Store;
use serde_json::json;

async fn function_handler(store: &Store, _event: Request) -> Result<Response<Body>, Error> {
    let (status, body) = match store.recent_logs().await {
        Ok(logs) => (200, serde_json::to_string(&logs)?),
        Err(err) => {
            tracing::error!("failed to retrieve logs: {err}");
            (500, json!({ "error": err.to_string() }).to_string())
        }
    };

    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(body.into())?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let store = Store::from_env().await;

    run(service_fn(|event| function_handler(&store, event))).await
}
