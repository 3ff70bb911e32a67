use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::feed::{normalize, PollerCommand};
use crate::store::models::Badge;
use crate::store::Database;
use crate::view::{self, ViewOptions};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub cmd_tx: mpsc::Sender<PollerCommand>,
    pub badge_rx: watch::Receiver<Badge>,
    /// "Snapshot changed" notification from the poller
    pub updated_rx: watch::Receiver<Option<DateTime<Utc>>>,
    pub opts: ViewOptions,
    pub image_base_url: String,
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/badge", get(badge_handler))
        .route("/api/status", get(status_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Serve the match list page, injecting the image base URL.
async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let html = DASHBOARD_HTML.replace(
        r#"<body>"#,
        &format!(r#"<body data-imagebase="{}">"#, state.image_base_url),
    );
    Html(html)
}

/// GET /api/matches — the classified, ordered, grouped view.
///
/// An absent or unparseable stored snapshot renders the connection-error
/// state rather than a 5xx; only a database failure is an internal error.
async fn matches_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let stored = state
        .db
        .load_snapshot()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let snapshot = stored.and_then(|(payload, fetched_at)| {
        match normalize::parse_payload(&payload, fetched_at) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Stored snapshot is unusable: {}", e);
                None
            }
        }
    });

    let view = view::build_view(snapshot.as_ref(), Utc::now(), &state.opts);
    Ok(Json(view))
}

/// GET /api/badge — current live-count badge.
async fn badge_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let badge = state.badge_rx.borrow().clone();
    Json(badge)
}

/// GET /api/status — last successful update plus recent poll outcomes.
async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let polls = state
        .db
        .recent_polls(10)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let last_updated = *state.updated_rx.borrow();
    Ok(Json(serde_json::json!({
        "last_updated": last_updated,
        "polls": polls,
    })))
}

/// POST /api/refresh — fire-and-forget "refresh now" to the poller.
async fn refresh_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // A full channel means a poll is already queued; nothing to do
    let _ = state.cmd_tx.try_send(PollerCommand::Refresh);
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"status": "Refreshing data..."})),
    )
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Matchboard</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #2b6ea4;
    --live: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: .8rem; padding: 1rem 1.4rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.2rem; font-weight: 700; }
  .badge { min-width: 1.6rem; text-align: center; padding: .15rem .45rem; border-radius: 10px; font-size: .8rem; font-weight: 700; color: #fff; }
  .badge:empty { display: none; }
  main { max-width: 560px; margin: 0 auto; padding: 1rem 1.2rem; }
  .day-header { color: var(--muted); font-size: .78rem; text-transform: uppercase; letter-spacing: .06em; margin: 1rem 0 .4rem; }
  .match { display: flex; justify-content: space-between; align-items: center; background: var(--card); border: 1px solid var(--border); border-radius: 8px; padding: .7rem .9rem; margin-bottom: .45rem; }
  .match.live { border-color: var(--live); }
  .match.cluster { border-left: 3px solid var(--accent); }
  .event-name { color: var(--muted); font-size: .72rem; margin-bottom: .3rem; }
  .team { display: flex; align-items: center; gap: .45rem; margin: .12rem 0; }
  .team-logo { width: 18px; height: 18px; object-fit: contain; }
  .team-name { font-size: .88rem; }
  .popular-mark { color: var(--accent); font-size: .7rem; margin-left: .3rem; }
  .match-time { color: var(--muted); font-size: .8rem; white-space: nowrap; }
  .match.live .match-time { color: var(--live); font-weight: 700; }
  .empty, .error { color: var(--muted); text-align: center; padding: 2.5rem 0; font-size: .9rem; }
  .error { color: var(--red); }
  .refresh-btn { background: none; border: 1px solid var(--border); color: var(--muted); padding: .3rem .8rem; border-radius: 6px; cursor: pointer; font-size: .8rem; margin-left: auto; }
  .refresh-btn:hover { border-color: var(--accent); color: var(--accent); }
  footer { color: var(--muted); font-size: .72rem; text-align: center; padding: .8rem; }
</style>
</head>
<body>
<header>
  <h1>Matchboard</h1>
  <span class="badge" id="badge"></span>
  <button class="refresh-btn" onclick="refreshNow()">&#8635; Refresh</button>
</header>

<main>
  <div id="match-list"><p class="empty">Loading&hellip;</p></div>
</main>

<footer id="status-line"></footer>

<script>
const IMAGE_BASE = document.body.dataset.imagebase;
const PLACEHOLDER_IMAGE = 'data:image/svg+xml;utf8,' + encodeURIComponent(
  '<svg xmlns="http://www.w3.org/2000/svg" width="18" height="18">' +
  '<circle cx="9" cy="9" r="8" fill="#2a2d3a"/></svg>');

const logoUrl = hash => hash ? `${IMAGE_BASE}/${hash}.png` : PLACEHOLDER_IMAGE;

const timeLabel = (m, lang) => {
  if (m.live) return 'Live';
  const d = new Date(m.start_time);
  if (d.getTime() === 0) return 'TBD';
  return d.toLocaleTimeString(lang || [], { hour: '2-digit', minute: '2-digit' });
};

function renderMatch(m, lang) {
  const cls = ['match', m.live ? 'live' : '', m.cluster != null ? 'cluster' : '']
    .filter(Boolean).join(' ');
  const star = m.popular ? '<span class="popular-mark">&#9733;</span>' : '';
  return `
    <div class="${cls}">
      <div>
        <div class="event-name">${m.event_label}${star}</div>
        <div class="team">
          <img src="${logoUrl(m.home_logo)}" alt="" class="team-logo"
               onerror="this.onerror=null;this.src=PLACEHOLDER_IMAGE;">
          <span class="team-name">${m.home_team}</span>
        </div>
        <div class="team">
          <img src="${logoUrl(m.away_logo)}" alt="" class="team-logo"
               onerror="this.onerror=null;this.src=PLACEHOLDER_IMAGE;">
          <span class="team-name">${m.away_team}</span>
        </div>
      </div>
      <small class="match-time">${timeLabel(m, lang)}</small>
    </div>`;
}

async function loadMatches() {
  const list = document.getElementById('match-list');
  let view;
  try {
    const r = await fetch('/api/matches');
    if (!r.ok) throw new Error(r.status);
    view = await r.json();
  } catch (e) {
    list.innerHTML = '<p class="error">Error loading matches data.</p>';
    return;
  }

  if (view.state === 'connection_error') {
    list.innerHTML = '<p class="error">Connection error. ' +
      '<button class="refresh-btn" onclick="refreshNow()">Retry</button></p>';
    return;
  }
  if (view.state === 'no_matches') {
    list.innerHTML = '<p class="empty">No matches available.</p>';
    return;
  }

  const lang = view.lang;
  list.innerHTML = view.groups.map(g => {
    const header = new Date(g.date + 'T00:00:00Z')
      .toLocaleDateString(lang || [], { weekday: 'long', month: 'short', day: 'numeric', timeZone: 'UTC' });
    return `<div class="day-header">${header}</div>` +
      g.matches.map(m => renderMatch(m, lang)).join('');
  }).join('');
}

async function loadBadge() {
  const r = await fetch('/api/badge');
  if (!r.ok) return;
  const b = await r.json();
  const el = document.getElementById('badge');
  el.textContent = b.text;
  el.style.background = b.color;
}

async function loadStatus() {
  const r = await fetch('/api/status');
  if (!r.ok) return;
  const s = await r.json();
  const el = document.getElementById('status-line');
  if (!s.polls.length) { el.textContent = 'Never polled yet.'; return; }
  const last = s.polls[0];
  const when = new Date(last.polled_at).toLocaleTimeString();
  el.textContent = last.ok
    ? `Updated ${when} (${last.live_count} live)`
    : `Last poll failed at ${when}`;
}

async function refreshNow() {
  await fetch('/api/refresh', { method: 'POST' });
  // Give the poller a moment before re-reading the snapshot
  setTimeout(loadAll, 1500);
}

async function loadAll() {
  await Promise.all([loadMatches(), loadBadge(), loadStatus()]);
}

loadAll();
setInterval(loadAll, 60000);
</script>
</body>
</html>"##;
