//! RPC method handler for the SmartMark JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested. `handle_method`
//! dispatches one call against the `App`; push events for the signed-in
//! user are handed to the [`EventSink`] as `{"event":"change","data":...}`.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::sync_session::SyncSession;
use crate::services::formatting::{display_host, relative_time};
use crate::types::bookmark::Bookmark;
use crate::types::session::SessionUser;

/// Receives server-initiated notifications (one JSON value per message).
pub type EventSink = Arc<dyn Fn(Value) + Send + Sync + 'static>;

fn bookmark_json(b: &Bookmark, now_ms: i64) -> Value {
    json!({
        "id": b.id,
        "title": b.title,
        "url": b.url,
        "created_at": b.created_at,
        "host": display_host(&b.url),
        "age": relative_time(b.created_at, now_ms),
    })
}

fn session_json(session: &SyncSession) -> Value {
    let user = session.user();
    json!({
        "user_id": user.id,
        "display_name": user.display_name(),
        "initial": user.initial(),
        "ready": session.is_ready(),
        "subscribed": session.is_subscribed(),
        "count": session.len(),
    })
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(
    app: &Mutex<App>,
    method: &str,
    params: &Value,
    events: &EventSink,
) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Session ───
        "session.start" => {
            let user_id = str_param(params, "user_id")?;
            if user_id.trim().is_empty() {
                return Err("missing user_id".to_string());
            }
            let email = params.get("email").and_then(|v| v.as_str()).map(str::to_string);
            let sink = Arc::clone(events);
            let mut a = app.lock().await;
            let session = a
                .start_session(SessionUser::new(user_id, email), move |event| {
                    sink(json!({"event": "change", "data": event}));
                })
                .await
                .map_err(|e| e.to_string())?;
            Ok(session_json(session))
        }
        "session.info" => {
            let a = app.lock().await;
            let session = a.session().ok_or("no active session")?;
            Ok(session_json(session))
        }
        "session.end" => {
            let mut a = app.lock().await;
            Ok(json!({"ok": a.end_session()}))
        }

        // ─── Bookmarks ───
        "bookmark.list" => {
            let a = app.lock().await;
            let session = a.session().ok_or("no active session")?;
            let now = chrono::Utc::now().timestamp_millis();
            let items: Vec<Value> = session
                .snapshot()
                .iter()
                .map(|b| bookmark_json(b, now))
                .collect();
            Ok(json!({"count": items.len(), "items": items}))
        }
        "bookmark.add" => {
            let title = str_param(params, "title")?;
            let url = str_param(params, "url")?;
            let a = app.lock().await;
            let session = a.session().ok_or("no active session")?;
            let created = session
                .add_bookmark(title, url)
                .await
                .map_err(|e| e.to_string())?;
            Ok(bookmark_json(&created, chrono::Utc::now().timestamp_millis()))
        }
        "bookmark.delete" => {
            let id = str_param(params, "id")?;
            let a = app.lock().await;
            let session = a.session().ok_or("no active session")?;
            session.delete_bookmark(id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
