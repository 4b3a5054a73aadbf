//! HTTP endpoint handlers for the observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Greeting page with the live display slot |
//! | `GET` | `/api/greeting` | Current slot snapshot |
//! | `GET` | `/api/health` | Liveness and current revision |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::Uri;
use axum::response::{Html, IntoResponse};
use greeting_core::DisplaySlot;
use greeting_types::SlotSnapshot;

use crate::error::ObserverError;
use crate::state::AppState;

const PAGE_STYLE: &str = r"
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
            display: flex;
            align-items: center;
            justify-content: center;
            min-height: 100vh;
            margin: 0;
        }
        #greeting {
            color: #58a6ff;
            font-size: 2.5rem;
            transition: opacity 0.3s ease, transform 0.3s ease;
        }
";

const PAGE_SCRIPT: &str = r"
        const el = document.getElementById('greeting');
        const proto = location.protocol === 'https:' ? 'wss' : 'ws';
        const connect = () => {
            const socket = new WebSocket(`${proto}://${location.host}/ws/greeting`);
            socket.onmessage = (event) => {
                const snap = JSON.parse(event.data).snapshot;
                el.textContent = snap.text;
                el.style.opacity = String(snap.style.opacity);
                el.style.transform = `translateY(${snap.style.translate_y_px}px)`;
            };
            socket.onclose = () => setTimeout(connect, 5000);
        };
        connect();
";

/// Serve the greeting page.
///
/// The page renders the slot's current state server-side, then follows
/// live updates over `/ws/greeting`.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.slot.snapshot();
    let slot_id = escape_html(&snapshot.slot_id);
    let text = escape_html(&snapshot.text);
    let style = snapshot.style.to_css();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Greeting</title>
    <style>{PAGE_STYLE}    </style>
</head>
<body>
    <h1 id="{slot_id}" style="{style}">{text}</h1>
    <script>{PAGE_SCRIPT}    </script>
</body>
</html>"#
    ))
}

/// Return the current slot snapshot.
pub async fn get_greeting(State(state): State<Arc<AppState>>) -> Json<SlotSnapshot> {
    Json(state.slot.snapshot())
}

/// Report liveness and the slot revision.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.slot.snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "revision": snapshot.revision,
        "started_at": state.started_at,
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ObserverError {
    ObserverError::NotFound(format!("no route for {uri}"))
}

/// Escape text for inclusion in HTML content or a quoted attribute.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
