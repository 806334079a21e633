use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::Instant;

use rigging_core::{settings, ManifestSolution, Settings};
use rigging_sync::{
    pipeline::{self, SyncScope},
    ProjectSyncResult,
};

use crate::affinity::OwnerThread;
use crate::error::{io_err, DaemonError};
use crate::lifecycle::{EventHub, LifecycleCoordinator};
use crate::paths::{runtime_dir, socket_path, solution_root};
use crate::protocol::{BuildEvent, DaemonRequest, DaemonResponse};

type Host = OwnerThread<ManifestSolution>;

/// Counters reported by the `status` command.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DaemonStats {
    pub events_processed: u64,
    pub last_event_at_unix: u64,
    pub last_sync: Option<SyncSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub project: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub written: usize,
    pub failures: usize,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub target: String,
    pub projects: Vec<ProjectSummary>,
    pub written: usize,
    pub failures: usize,
    pub duration_ms: u128,
}

/// Start the daemon runtime and block the current thread until it exits.
pub fn start_blocking(solution: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(solution.to_path_buf()))
}

/// Run the daemon for the solution manifest at `solution`.
pub async fn run(solution: PathBuf) -> Result<(), DaemonError> {
    let root = solution_root(&solution);
    ensure_runtime_dir(&root)?;

    let settings = settings::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "using default settings");
        Settings::default()
    });

    let host = {
        let solution = solution.clone();
        Arc::new(OwnerThread::spawn("rigging-host", move || {
            ManifestSolution::open(&solution).map_err(DaemonError::from)
        })?)
    };
    let hub = Arc::new(EventHub::new());
    let mut coordinator = LifecycleCoordinator::attach(hub.clone(), host.clone(), settings.clone());
    tracing::info!(solution = %solution.display(), "daemon started");

    let stats = Arc::new(RwLock::new(DaemonStats::default()));
    let started_at_unix = unix_seconds_now();
    let (event_tx, event_rx) = mpsc::channel::<BuildEvent>(256);
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let processor_handle = {
        let shutdown = shutdown_tx.clone();
        let hub = hub.clone();
        let stats = stats.clone();
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = event_processor_task(hub, stats, event_rx, shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let ctx = SocketContext {
            root: root.clone(),
            solution: solution.clone(),
            host: host.clone(),
            hub: hub.clone(),
            settings,
            stats: stats.clone(),
            event_tx,
            shutdown_tx: shutdown.clone(),
            started_at_unix,
        };
        let shutdown_rx = shutdown.subscribe();
        tokio::spawn(async move {
            let result = socket_server_task(Arc::new(ctx), shutdown_rx).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = tokio::spawn(ctrl_c_task(shutdown_tx.clone(), shutdown_tx.subscribe()));

    let (processor_result, socket_result, signal_result) =
        tokio::join!(processor_handle, socket_handle, signal_handle);

    coordinator.shutdown();
    drop(coordinator);
    drop(hub);
    if let Ok(host) = Arc::try_unwrap(host) {
        tokio::task::spawn_blocking(move || host.shutdown())
            .await
            .map_err(|err| DaemonError::Protocol(format!("owner thread join error: {err}")))?;
    }

    task_outcome("event processor", processor_result)?;
    task_outcome("socket server", socket_result)?;
    task_outcome("signal handler", signal_result)?;
    tracing::info!("daemon stopped");
    Ok(())
}

/// Broadcast shutdown on ctrl-c; returns early once another task shuts down.
async fn ctrl_c_task(
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    tokio::select! {
        _ = shutdown_rx.recv() => Ok(()),
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|err| io_err("ctrl-c handler", err))?;
            tracing::info!("interrupted, stopping daemon");
            let _ = shutdown.send(());
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Event processing
// ---------------------------------------------------------------------------

/// Publish queued events one at a time, in arrival order.
///
/// On shutdown the queue is closed and whatever was already accepted is
/// still published before the task returns.
async fn event_processor_task(
    hub: Arc<EventHub>,
    stats: Arc<RwLock<DaemonStats>>,
    mut event_rx: mpsc::Receiver<BuildEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else { return Ok(()) };
                publish_event(&hub, &stats, event).await?;
            }
        }
    }

    event_rx.close();
    let mut drained = 0usize;
    while let Ok(event) = event_rx.try_recv() {
        publish_event(&hub, &stats, event).await?;
        drained += 1;
    }
    if drained > 0 {
        tracing::info!(drained, "published queued events before shutdown");
    }
    Ok(())
}

async fn publish_event(
    hub: &Arc<EventHub>,
    stats: &RwLock<DaemonStats>,
    event: BuildEvent,
) -> Result<(), DaemonError> {
    let kind = event.kind();
    let hub = hub.clone();
    let handled = tokio::task::spawn_blocking(move || hub.publish(&event))
        .await
        .map_err(|err| DaemonError::Protocol(format!("event task join error: {err}")))?;
    tracing::debug!(event = kind, handled, "event dispatched");

    let mut stats = stats.write().await;
    stats.events_processed += 1;
    stats.last_event_at_unix = unix_seconds_now();
    Ok(())
}

// ---------------------------------------------------------------------------
// Socket server
// ---------------------------------------------------------------------------

struct SocketContext {
    root: PathBuf,
    solution: PathBuf,
    host: Arc<Host>,
    hub: Arc<EventHub>,
    settings: Settings,
    stats: Arc<RwLock<DaemonStats>>,
    event_tx: mpsc::Sender<BuildEvent>,
    shutdown_tx: broadcast::Sender<()>,
    started_at_unix: u64,
}

async fn socket_server_task(
    ctx: Arc<SocketContext>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let socket = socket_path(&ctx.root);
    clear_stale_socket(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(stream, ctx).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    let _ = fs::remove_file(&socket);
    Ok(())
}

async fn handle_socket_client(stream: UnixStream, ctx: Arc<SocketContext>) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| io_err("daemon socket", e))?;
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let (response, close) = match serde_json::from_str::<DaemonRequest>(&line) {
            Ok(request) => dispatch(&ctx, request).await,
            Err(err) => (DaemonResponse::error(format!("malformed request: {err}")), false),
        };
        write_response(&mut writer, &response).await?;
        if close {
            break;
        }
    }

    Ok(())
}

/// Answer one request. The flag is set when the connection should close.
async fn dispatch(ctx: &SocketContext, request: DaemonRequest) -> (DaemonResponse, bool) {
    match request.cmd.as_str() {
        "status" => (DaemonResponse::ok(build_status_payload(ctx).await), false),
        "sync" => {
            let response = run_sync(ctx, request.project)
                .await
                .map_or_else(|err| DaemonResponse::error(err.to_string()), |s| DaemonResponse::ok(json!(s)));
            (response, false)
        }
        "event" => (queue_event(ctx, request.event).await, false),
        "stop" => {
            tracing::info!("stop requested over socket");
            let _ = ctx.shutdown_tx.send(());
            (DaemonResponse::ok(json!({ "stopping": true })), true)
        }
        other => (DaemonResponse::error(format!("unsupported command '{other}'")), false),
    }
}

async fn queue_event(ctx: &SocketContext, event: Option<BuildEvent>) -> DaemonResponse {
    let Some(event) = event else {
        return DaemonResponse::error("event command requires an 'event' object");
    };
    let kind = event.kind();
    match ctx.event_tx.send(event).await {
        Ok(()) => DaemonResponse::ok(json!({ "queued": true, "kind": kind })),
        Err(_) => DaemonResponse::error(DaemonError::ChannelClosed("event queue").to_string()),
    }
}

async fn run_sync(ctx: &SocketContext, project: Option<String>) -> Result<SyncSummary, DaemonError> {
    let started = Instant::now();
    let scope = match project {
        Some(name) => SyncScope::Project(name),
        None => SyncScope::All,
    };
    let target = match &scope {
        SyncScope::All => "all".to_string(),
        SyncScope::Project(name) => name.clone(),
    };
    let settings = ctx.settings.clone();
    let results = ctx
        .host
        .call_async(move |host| pipeline::run(&*host, &scope, &settings, false))
        .await??;

    let summary = build_sync_summary(target, &results, started.elapsed().as_millis());
    ctx.stats.write().await.last_sync = Some(summary.clone());
    Ok(summary)
}

fn build_sync_summary(target: String, results: &[ProjectSyncResult], duration_ms: u128) -> SyncSummary {
    let projects: Vec<ProjectSummary> = results
        .iter()
        .map(|result| match &result.outcome {
            Ok(run) => ProjectSummary {
                project: result.project.clone(),
                ok: true,
                error: None,
                written: run.profiles.written(),
                failures: run.failure_count(),
                saved: run.injection.as_ref().is_some_and(|i| i.saved),
            },
            Err(err) => ProjectSummary {
                project: result.project.clone(),
                ok: false,
                error: Some(err.to_string()),
                written: 0,
                failures: 1,
                saved: false,
            },
        })
        .collect();

    SyncSummary {
        target,
        written: projects.iter().map(|p| p.written).sum(),
        failures: projects.iter().map(|p| p.failures).sum(),
        projects,
        duration_ms,
    }
}

async fn build_status_payload(ctx: &SocketContext) -> Value {
    let stats = ctx.stats.read().await.clone();
    json!({
        "running": true,
        "solution": ctx.solution.display().to_string(),
        "socket": socket_path(&ctx.root).display().to_string(),
        "started_at_unix": ctx.started_at_unix,
        "subscribers": ctx.hub.subscriber_count(),
        "events_processed": stats.events_processed,
        "last_event_at_unix": stats.last_event_at_unix,
        "last_sync": stats.last_sync,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Remove a socket file left behind by a daemon that is no longer listening.
fn clear_stale_socket(socket: &Path) -> Result<(), DaemonError> {
    if StdUnixStream::connect(socket).is_ok() {
        return Err(DaemonError::Protocol(format!(
            "another daemon is listening on {}",
            socket.display()
        )));
    }
    match fs::remove_file(socket) {
        Ok(()) => {
            tracing::warn!(socket = %socket.display(), "removed stale daemon socket");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dir(root: &Path) -> Result<(), DaemonError> {
    let dir = runtime_dir(root);
    fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))
}

/// One JSON object per line.
async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    writer
        .write_all(&line)
        .await
        .map_err(|e| io_err("daemon socket", e))?;
    writer.flush().await.map_err(|e| io_err("daemon socket", e))
}

fn task_outcome(
    task: &str,
    joined: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    joined.unwrap_or_else(|err| Err(DaemonError::Protocol(format!("{task} task failed to join: {err}"))))
}

fn unix_seconds_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
