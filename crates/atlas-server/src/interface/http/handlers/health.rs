use axum::Json;
use serde_json::{json, Value};

/// 存活探针，无需认证
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "atlas-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
