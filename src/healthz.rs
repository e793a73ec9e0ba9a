use axum::Json;
use serde_json::{json, Value};

pub async fn service_info() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
