use lambda_http::{run, service_fn, tracing};
use lambda_http::{Body, Error, Request, Response};
use logbook_core::{LogEntry, LogRequest, Store};
use serde_json::json;

async fn function_handler(store: &Store, event: Request) -> Result<Response<Body>, Error> {
    // reject bad input before generating anything
    let entry = match LogRequest::from_json(event.body()).and_then(LogEntry::from_request) {
        Ok(entry) => entry,
        Err(err) => {
            tracing::error!("rejected append request: {err}");
            return json_response(400, &json!({ "error": err.to_string() }));
        }
    };

    tracing::info!(id = %entry.id, severity = %entry.severity, "saving log entry");

    match store.save(&entry).await {
        Ok(()) => json_response(201, &json!({ "message": "Log saved successfully" })),
        Err(err) => {
            tracing::error!("failed to save log entry: {err}");
            json_response(500, &json!({ "error": err.to_string() }))
        }
    }
}

fn json_response(status: u16, body: &serde_json::Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(serde_json::to_string(body)?.into())?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let store = Store::from_env().await;

    run(service_fn(|event| function_handler(&store, event))).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_responses_carry_content_type() {
        let response = json_response(201, &json!({ "message": "Log saved successfully" })).unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["content-type"], "application/json");
        let body = response.body();
        assert_eq!(&body[..], br#"{"message":"Log saved successfully"}"#);
    }
}
