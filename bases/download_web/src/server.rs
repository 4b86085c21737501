// bases/download_web/src/server.rs
use crate::config::Config;
use crate::error::AppError;
use crate::forms::{log_line, parse_download_form, LogLine, StatusTracker, ITEM_FIELD_PREFIX};
use crate::jobs::{DownloadJob, JobResult};
use askama::Template;
use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Html, Redirect, Sse,
    },
    routing::{get, post},
    Form, Router,
};
use futures::Stream;
use media_downloader::{MediaDownloader, ProgressEvent, Session};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    downloader: Arc<MediaDownloader>,

    /// The single browser session; replaced on every resolve
    session: Arc<Mutex<Option<Session>>>,

    /// The most recent download, running or finished
    job: Arc<Mutex<Option<Arc<DownloadJob>>>>,
}

impl AppState {
    fn current_job(&self) -> Result<Arc<DownloadJob>, AppError> {
        self.job.lock().clone().ok_or(AppError::NoDownload)
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    download_path: String,
    last_url: String,
}

struct ItemRow {
    field: String,
    position: usize,
    title: String,
    duration: String,
    id: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "select.html")]
struct SelectTemplate {
    kind: String,
    label: String,
    is_collection: bool,
    rows: Vec<ItemRow>,
    download_path: String,
}

#[derive(Template)]
#[template(path = "progress.html")]
struct ProgressTemplate {
    kind: String,
    label: String,
    selected: usize,
}

#[derive(Template)]
#[template(path = "summary.html")]
struct SummaryTemplate {
    kind: String,
    label: String,
    selected: usize,
    success_count: usize,
    failed_count: usize,
    skipped_count: usize,
    failed_titles: Vec<String>,
    log: Vec<LogLine>,
    saved_to: String,
}

#[derive(Debug, Deserialize)]
struct ResolveForm {
    url: String,
}

/// Run the web front end until the process is stopped
pub async fn run(config: Config) -> color_eyre::Result<()> {
    let downloader = MediaDownloader::new(config.downloader.clone()).await?;
    let state = AppState {
        downloader: Arc::new(downloader),
        session: Arc::new(Mutex::new(None)),
        job: Arc::new(Mutex::new(None)),
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/resolve", post(resolve))
        .route("/download", get(progress).post(start_download))
        .route("/download/events", get(progress_events))
        .route("/download/cancel", post(cancel_download))
        .route("/download/summary", get(summary))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Downloader listening on http://{}", config.addr);
    info!("   Saving to {}", config.downloader.base_dir.display());

    axum::serve(listener, app).await?;

    Ok(())
}

/// URL input page
async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let last_url = state
        .session
        .lock()
        .as_ref()
        .map(|s| s.url().to_string())
        .unwrap_or_default();

    let template = IndexTemplate {
        download_path: download_path(&state),
        last_url,
    };
    Ok(Html(template.render()?))
}

/// Resolve a URL, start a new session and show the selection table
async fn resolve(
    State(state): State<AppState>,
    Form(form): Form<ResolveForm>,
) -> Result<Html<String>, AppError> {
    let url = form.url.trim();
    if url.is_empty() {
        return Err(AppError::Validation("Enter a video or playlist URL.".to_string()));
    }
    info!("Fetching content information for {}", url);

    let session = state.downloader.open_session(url).await?;
    let html = select_page(&session, download_path(&state)).render()?;

    *state.session.lock() = Some(session);
    Ok(Html(html))
}

/// Start downloading the checked rows in the background
async fn start_download(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let form = parse_download_form(&fields)?;

    let session = {
        let mut guard = state.session.lock();
        let session = guard.as_mut().ok_or(AppError::NoSession)?;
        session.select_indices(form.indices)?;
        session.clone()
    };
    if session.selected_count() == 0 {
        return Err(AppError::Validation(
            "No videos selected. Please select videos to download.".to_string(),
        ));
    }

    let mut current = state.job.lock();
    if current.as_ref().is_some_and(|job| !job.is_finished()) {
        return Err(AppError::Validation(
            "A download is already running.".to_string(),
        ));
    }
    *current = Some(DownloadJob::spawn(
        state.downloader.clone(),
        session,
        form.toggles,
    ));

    Ok(Redirect::to("/download"))
}

/// Live progress page for the current download
async fn progress(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let job = state.current_job()?;
    let template = ProgressTemplate {
        kind: job.kind().to_string(),
        label: job.label().to_string(),
        selected: job.selected(),
    };
    Ok(Html(template.render()?))
}

/// Server-sent progress of the current download, replayed from its start
async fn progress_events(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let job = state.current_job()?;
    Ok(Sse::new(progress_stream(job)).keep_alive(default_keep_alive()))
}

async fn cancel_download(State(state): State<AppState>) -> Result<Redirect, AppError> {
    state.current_job()?.cancel();
    Ok(Redirect::to("/download"))
}

/// Summary of the finished download
async fn summary(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let job = state.current_job()?;
    let (outcome, paths) = match job.result() {
        Some(JobResult::Completed { outcome, paths }) => (outcome, paths),
        Some(JobResult::Failed(reason)) => return Err(AppError::JobFailed(reason)),
        None => {
            return Err(AppError::Validation(
                "The download is still running.".to_string(),
            ))
        }
    };

    let template = SummaryTemplate {
        kind: job.kind().to_string(),
        label: job.label().to_string(),
        selected: outcome.total(),
        success_count: outcome.success_count,
        failed_count: outcome.failed_count,
        skipped_count: outcome.skipped_count,
        failed_titles: outcome.failed_titles,
        log: job.events().iter().filter_map(log_line).collect(),
        saved_to: paths.root.display().to_string(),
    };
    Ok(Html(template.render()?))
}

/// One `progress` event per recorded event, then `done` once the job ends
fn progress_stream(job: Arc<DownloadJob>) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut updates = job.subscribe();
        let mut tracker = StatusTracker::default();
        let mut cursor = 0;

        loop {
            let (fresh, finished) = job.since(cursor);
            cursor += fresh.len();
            for event in &fresh {
                if let Some(data) = encode_view(&mut tracker, event) {
                    yield Ok(Event::default().event("progress").data(data));
                }
            }
            if finished {
                yield Ok(Event::default().event("done").data("/download/summary"));
                break;
            }
            if updates.changed().await.is_err() {
                break;
            }
        }
    }
}

fn encode_view(tracker: &mut StatusTracker, event: &ProgressEvent) -> Option<String> {
    serde_json::to_string(&tracker.view(event))
        .map_err(|err| {
            warn!("failed to serialize progress view: {err}");
            err
        })
        .ok()
}

fn default_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(15))
        .text("keep-alive")
}

fn download_path(state: &AppState) -> String {
    state.downloader.config().base_dir.display().to_string()
}

fn select_page(session: &Session, download_path: String) -> SelectTemplate {
    let listing = session.listing();
    let rows = listing
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| ItemRow {
            field: format!("{}{}", ITEM_FIELD_PREFIX, i),
            position: item.position,
            title: item.title.clone(),
            duration: item.duration_label().to_string(),
            id: item.id.clone(),
            selected: session.is_selected(i),
        })
        .collect();

    SelectTemplate {
        kind: listing.kind.to_string(),
        label: listing.label.clone(),
        is_collection: listing.is_collection(),
        rows,
        download_path,
    }
}
