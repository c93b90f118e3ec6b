//! SmartMark RPC Server: JSON-RPC over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Push:     {"event":"change", "data":{"event_type":"INSERT", ...}}

use std::io::Write;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use smartmark::app::App;
use smartmark::rpc_handler::{handle_method, EventSink};
use smartmark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

fn emit(value: &Value) {
    let mut out = std::io::stdout().lock();
    // A closed stdout means the client is gone; the read loop ends on EOF.
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings_engine = SettingsEngine::new(std::env::var("SMARTMARK_CONFIG").ok());
    let settings = settings_engine.load()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(settings.logging.level.as_str()))
        .init();

    let app = Mutex::new(App::from_settings(settings_engine)?);
    let events: EventSink = Arc::new(|value: Value| emit(&value));

    emit(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        log::debug!("rpc {} ({})", method, id);
        let response = match handle_method(&app, method, &params, &events).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&response);
    }

    app.lock().await.end_session();
    Ok(())
}
