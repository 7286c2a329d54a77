//! focusguardd - The focusguard background service
//!
//! This is the main entry point for the focusguardd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization and first-run seeding
//! - Core engine with the JSON rule table and tokio alarm scheduler
//! - Change reactor on the store's write stream
//! - IPC server

mod dispatch;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use focusguard_api::{ErrorCode, ErrorInfo, Event, EventPayload, Response};
use focusguard_config::load_config_or_default;
use focusguard_core::{CoreEngine, ResumeOutcome, SESSION_END_ALARM};
use focusguard_host_api::{AlarmEvent, AlarmScheduler};
use focusguard_host_local::{JsonFileRuleTable, TokioAlarmScheduler};
use focusguard_ipc::{IpcServer, ServerMessage};
use focusguard_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use focusguard_util::{default_config_path, RateLimiter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// focusguardd - Timed website blocking service
#[derive(Parser, Debug)]
#[command(name = "focusguardd")]
#[command(about = "Timed website blocking service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/focusguard/config.toml)
    #[arg(short, long, env = "FOCUSGUARD_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set FOCUSGUARD_SOCKET env var)
    #[arg(short, long, env = "FOCUSGUARD_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set FOCUSGUARD_DATA_DIR env var)
    #[arg(short, long, env = "FOCUSGUARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Rule table file override (or set FOCUSGUARD_RULES_PATH env var)
    #[arg(short, long, env = "FOCUSGUARD_RULES_PATH")]
    rules_path: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Main service state
struct Service {
    engine: Arc<CoreEngine>,
    scheduler: Arc<TokioAlarmScheduler>,
    ipc: Arc<IpcServer>,
    store: Arc<dyn Store>,
    rate_limiter: RateLimiter,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        let policy = load_config_or_default(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            groups = policy.predefined_groups.len(),
            "Configuration loaded"
        );

        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| policy.service.socket_path.clone());

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());

        // An explicit data dir relocates the rule file with it unless the
        // rule file was given too
        let rules_path = match (&args.rules_path, &args.data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => focusguard_util::rules_path_in(dir),
            (None, None) => policy.service.rules_path.clone(),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join("focusguard.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;

        let rule_table = Arc::new(JsonFileRuleTable::new(rules_path.clone()));
        info!(rules_path = %rules_path.display(), "Rule table file");

        let scheduler = Arc::new(TokioAlarmScheduler::new());

        let engine = Arc::new(CoreEngine::new(
            policy,
            store.clone(),
            rule_table,
            scheduler.clone(),
        ));

        // A failed pass here leaves the service up; the next write retries
        match engine.initialize(focusguard_util::now()).await {
            Ok(ResumeOutcome::Idle) => info!("No session running"),
            Ok(ResumeOutcome::Resumed { remaining }) => {
                info!(remaining_secs = remaining.as_secs(), "Resumed focus session")
            }
            Ok(ResumeOutcome::Expired(outcome)) => info!(
                focus_minutes = outcome.focus_minutes,
                "Session expired while service was down"
            ),
            Err(e) => warn!(error = %e, "Startup reconciliation failed"),
        }

        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        // Rate limiter: 30 requests per second per client
        let rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

        Ok(Self {
            engine,
            scheduler,
            ipc: Arc::new(ipc),
            store,
            rate_limiter,
        })
    }

    async fn run(mut self) -> Result<()> {
        let mut alarms = self
            .scheduler
            .subscribe()
            .ok_or_else(|| anyhow!("Alarm stream already taken"))?;
        let mut ipc_messages = self
            .ipc
            .take_message_receiver()
            .await
            .ok_or_else(|| anyhow!("IPC message receiver already taken"))?;

        // Keep the rule table in step with every relevant write
        tokio::spawn(self.engine.change_reactor().run(self.store.subscribe()));

        // Forward core events to subscribed clients
        let mut core_events = self.engine.subscribe_events();
        let ipc_events = self.ipc.clone();
        tokio::spawn(async move {
            loop {
                match core_events.recv().await {
                    Ok(event) => {
                        ipc_events.broadcast_event(Event::new(dispatch::event_payload(event)))
                    }
                    Err(RecvError::Lagged(missed)) => warn!(missed, "Event forwarder lagged"),
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let ipc_accept = self.ipc.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }
                _ = sighup.recv() => {
                    info!("Received SIGHUP, shutting down gracefully");
                    break;
                }

                Some(alarm) = alarms.recv() => {
                    self.handle_alarm(alarm).await;
                }

                Some(msg) = ipc_messages.recv() => {
                    self.handle_ipc_message(msg).await;
                }
            }
        }

        info!("Shutting down focusguardd");

        // Persisted state stays as is; a running session resumes on next start
        self.ipc.broadcast_event(Event::new(EventPayload::Shutdown));

        if let Err(e) = self
            .store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
        {
            warn!(error = %e, "Failed to log service shutdown");
        }

        self.ipc.shutdown();
        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_alarm(&self, alarm: AlarmEvent) {
        if alarm.name != SESSION_END_ALARM {
            debug!(name = %alarm.name, "Ignoring unknown alarm");
            return;
        }

        info!("Session alarm fired");
        if let Err(e) = self.engine.expire_session(focusguard_util::now()).await {
            error!(error = %e, "Failed to end expired session");
        }
    }

    async fn handle_ipc_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                if !self.rate_limiter.check(&client_id) {
                    let response = Response::error(
                        request.request_id,
                        ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                    );
                    let _ = self.ipc.send_response(&client_id, response).await;
                    return;
                }

                let response = dispatch::handle_command(
                    &self.engine,
                    &client_id,
                    request.request_id,
                    request.command,
                    focusguard_util::now(),
                )
                .await;
                let _ = self.ipc.send_response(&client_id, response).await;
            }

            ServerMessage::ClientConnected { client_id, info } => {
                debug!(client_id = %client_id, uid = ?info.uid, "Client registered");
                let _ = self.store.append_audit(AuditEvent::new(
                    AuditEventType::ClientConnected {
                        client_id: client_id.to_string(),
                        uid: info.uid,
                    },
                ));
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");
                let _ = self.store.append_audit(AuditEvent::new(
                    AuditEventType::ClientDisconnected {
                        client_id: client_id.to_string(),
                    },
                ));

                self.rate_limiter.remove_client(&client_id);
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "focusguardd starting");

    if focusguard_util::is_mock_time_active() {
        warn!(now = %focusguard_util::now(), "Running on mock time");
    }

    let service = Service::new(&args).await?;
    service.run().await
}
