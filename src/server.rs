use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::Html,
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use tracing::{error, info};

use crate::AppState;
use crate::api::HttpBackend;
use crate::config::AppConfig;
use crate::error::SubmitError;
use crate::markdown::CmarkRenderer;
use crate::session::{WidgetSession, WidgetStore};
use crate::ui::page::htmx_src;
use crate::ui::{
    PageContext, chat_page, input_html, message_html, placeholder_html, status_rows_html,
    transcript_html,
};

type HandlerError = (StatusCode, String);

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "backend.config.loaded",
        base_url = %config.backend.base_url,
        timeout_secs = config.backend.request_timeout_secs,
        poll_interval_secs = config.widget.poll_interval_secs,
        "Backend configuration loaded"
    );

    let backend = Arc::new(HttpBackend::new(
        &config.backend.base_url,
        config.backend.request_timeout(),
    )?);
    let widgets = WidgetStore::with_max_sessions(
        backend,
        Arc::new(CmarkRenderer::new()),
        Some(config.widget.poll_interval()),
        config.widget.max_sessions,
    );

    let state = AppState {
        widgets: widgets.clone(),
        config: Arc::clone(&config),
    };

    let shutdown = CancellationToken::new();
    let reaper = spawn_idle_reaper(widgets.clone(), config.widget.abandon_after(), shutdown.clone());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %format!("http://{addr}"),
        "Server started"
    );

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                () = signal.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    let _ = reaper.await;
    widgets.shutdown();
    info!(name: "server.stopped", "Server stopped");
    Ok(())
}

/// Build the router for the widget host.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();

    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(|| async { "ok" }))
        .route("/widget/{id}", delete(delete_widget))
        .route("/widget/{id}/prompt", post(submit_prompt))
        .route("/widget/{id}/reply/{seq}", get(prompt_reply))
        .route("/widget/{id}/status", get(status_panel))
        .route("/widget/{id}/suggestion", get(set_suggestion))
        .route("/widget/{id}/messages", get(transcript))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically evict widgets nobody has touched for `idle`.
///
/// Every route touches its widget, and an open page fetches its status
/// panel every poll interval.
fn spawn_idle_reaper(
    widgets: WidgetStore,
    idle: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let period = (idle / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    widgets.cleanup_idle(idle);
                }
            }
        }
    })
}

fn lookup(state: &AppState, id: &str) -> Result<WidgetSession, HandlerError> {
    state.widgets.get(id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("Widget {id} not found; reload the page"),
        )
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Fresh widget per page load.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let script = htmx_src(std::path::Path::new(&state.config.server.static_dir)).await;
    let session = state.widgets.create();
    let ctx = PageContext {
        widget_id: session.id(),
        poll_interval_secs: state.config.widget.poll_interval_secs,
        suggestions: &state.config.widget.suggestions,
        htmx_src: &script,
    };
    Html(session.widget().with_view(|view| chat_page(&ctx, view)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Widget Fragment Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body of the prompt form.
#[derive(Debug, Deserialize)]
struct PromptForm {
    #[serde(default)]
    prompt: String,
}

/// POST /widget/:id/prompt - Start a submission.
///
/// Answers at once with the user message, a placeholder that fetches the
/// reply, and the cleared, disabled input. The backend call runs in the
/// background.
async fn submit_prompt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PromptForm>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    let widget = session.widget();

    info!(
        name: "server.prompt.received",
        session_id = %id,
        prompt_length = form.prompt.len(),
        "Received prompt"
    );

    let submission = match widget.begin_submit(&form.prompt) {
        Ok(submission) => submission,
        Err(e @ SubmitError::EmptyPrompt) => {
            return Err((StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
        }
        Err(e @ SubmitError::Busy) => return Err((StatusCode::CONFLICT, e.to_string())),
    };

    let mut body = message_html(submission.user());
    let reply_url = format!("/widget/{id}/reply/{}", submission.seq());
    body.push_str(&placeholder_html(submission.placeholder(), Some(&reply_url)));
    body.push_str(&widget.with_view(|view| input_html(view.input(), true)));

    session.spawn_reply(submission);
    Ok(Html(body))
}

/// GET /widget/:id/reply/:seq - Wait for a submission's reply.
///
/// Replaces the placeholder with the reply or error message and re-enables
/// the input.
async fn prompt_reply(
    State(state): State<AppState>,
    Path((id, seq)): Path<(String, u64)>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    let handle = session.take_reply(seq).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("No pending reply {seq} for widget {id}"),
        )
    })?;

    let outcome = handle.await.map_err(|e| {
        error!(name: "server.reply.failed", session_id = %id, error = %e, "Reply task failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Reply task failed".to_string())
    })?;

    let mut body = message_html(&outcome.reply);
    body.push_str(&session.widget().with_view(|view| input_html(view.input(), true)));
    Ok(Html(body))
}

/// GET /widget/:id/status - Status panel rows from the latest snapshot.
async fn status_panel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    let url = format!("/widget/{id}/status");
    Ok(Html(
        session
            .widget()
            .with_view(|view| status_rows_html(view, &url)),
    ))
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
    text: String,
}

/// GET /widget/:id/suggestion - Fill the input with a canned prompt.
async fn set_suggestion(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    let widget = session.widget();
    widget.set_suggestion(&query.text);
    Ok(Html(widget.with_view(|view| input_html(view.input(), false))))
}

/// GET /widget/:id/messages - The whole transcript.
async fn transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let session = lookup(&state, &id)?;
    Ok(Html(session.widget().with_view(transcript_html)))
}

/// DELETE /widget/:id - Tear a widget down.
async fn delete_widget(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    match state.widgets.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
