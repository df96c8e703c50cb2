//! tallyd - The earnings tracking background service
//!
//! This is the main entry point for the tallyd service.
//! It wires together all the components:
//! - Configuration loading
//! - Store initialization
//! - IPC server
//! - Command dispatch (session CRUD, closed dates, sync, stats)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tally_api::{
    Command, ErrorCode, ErrorInfo, Event, EventPayload, HealthStatus, Response, ResponsePayload,
    SessionFilter, SyncStatus,
};
use tally_config::{load_config, Settings};
use tally_ipc::{IpcServer, ServerMessage};
use tally_store::{SqliteStore, Store, StoreError, SyncAction, SyncLogEntry};
use tally_util::{default_config_path, ClientId, DeviceId, Money, RateLimiter};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// tallyd - Earnings tracking service for a massage-therapy practice
#[derive(Parser, Debug)]
#[command(name = "tallyd")]
#[command(about = "Earnings tracking service for a massage-therapy practice", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/tally/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set TALLY_SOCKET env var)
    #[arg(short, long, env = "TALLY_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set TALLY_DATA_DIR env var)
    #[arg(short, long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    settings: Settings,
    store: Arc<dyn Store>,
    ipc: Arc<IpcServer>,
    rate_limiter: RateLimiter,
}

impl Service {
    async fn new(args: &Args) -> Result<Self> {
        // Load configuration
        let settings = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;

        info!(
            config_path = %args.config.display(),
            location_count = settings.locations.len(),
            "Configuration loaded"
        );

        // Determine paths
        let socket_path = args
            .socket
            .clone()
            .unwrap_or_else(|| settings.service.socket_path.clone());

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.service.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("tallyd.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        // Initialize IPC server
        let mut ipc = IpcServer::new(&socket_path);
        ipc.start().await?;

        info!(socket_path = %socket_path.display(), "IPC server started");

        // Rate limiter: 30 requests per second per client
        let rate_limiter = RateLimiter::new(30, Duration::from_secs(1));

        Ok(Self {
            settings,
            store,
            ipc: Arc::new(ipc),
            rate_limiter,
        })
    }

    async fn run(self) -> Result<()> {
        let ipc_ref = self.ipc.clone();
        let mut ipc_messages = ipc_ref
            .take_message_receiver()
            .await
            .expect("Message receiver should be available");

        let settings = Arc::new(self.settings);
        let rate_limiter = Arc::new(Mutex::new(self.rate_limiter));
        let store = self.store.clone();

        // Spawn IPC accept task
        let ipc_accept = ipc_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = ipc_accept.run().await {
                error!(error = %e, "IPC server error");
            }
        });

        // Set up signal handlers
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                // Signals - graceful shutdown
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

                // IPC messages
                Some(msg) = ipc_messages.recv() => {
                    Self::handle_ipc_message(&settings, &store, &ipc_ref, &rate_limiter, msg).await;
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down tallyd");
        ipc_ref.broadcast_event(Event::new(EventPayload::Shutdown));
        info!("Shutdown complete");
        Ok(())
    }

    async fn handle_ipc_message(
        settings: &Arc<Settings>,
        store: &Arc<dyn Store>,
        ipc: &Arc<IpcServer>,
        rate_limiter: &Arc<Mutex<RateLimiter>>,
        msg: ServerMessage,
    ) {
        match msg {
            ServerMessage::Request { client_id, request } => {
                // Rate limiting
                {
                    let mut limiter = rate_limiter.lock().await;
                    if !limiter.check(&client_id) {
                        let response = Response::error(
                            request.request_id,
                            ErrorInfo::new(ErrorCode::RateLimited, "Too many requests"),
                        );
                        let _ = ipc.send_response(&client_id, response).await;
                        return;
                    }
                }

                let response = Self::handle_command(
                    settings,
                    store,
                    ipc,
                    &client_id,
                    request.request_id,
                    request.command,
                );

                let _ = ipc.send_response(&client_id, response).await;
            }

            ServerMessage::ClientConnected { client_id } => {
                debug!(client_id = %client_id, "Client connected");
            }

            ServerMessage::ClientDisconnected { client_id } => {
                debug!(client_id = %client_id, "Client disconnected");

                // Clean up rate limiter
                let mut limiter = rate_limiter.lock().await;
                limiter.remove_client(&client_id);
            }
        }
    }

    fn handle_command(
        settings: &Settings,
        store: &Arc<dyn Store>,
        ipc: &Arc<IpcServer>,
        client_id: &ClientId,
        request_id: u64,
        command: Command,
    ) -> Response {
        match command {
            Command::ListSessions { filter } => match store.list_sessions(&filter) {
                Ok(sessions) => {
                    Response::success(request_id, ResponsePayload::Sessions(sessions))
                }
                Err(e) => store_failure(request_id, e),
            },

            Command::GetSessionsOn { date } => match store.sessions_on(date) {
                Ok(sessions) => {
                    Response::success(request_id, ResponsePayload::Sessions(sessions))
                }
                Err(e) => store_failure(request_id, e),
            },

            Command::CreateSession { record } => match store.insert_session(&record) {
                Ok(()) => {
                    info!(session_id = %record.id, date = %record.date, "Session recorded");
                    ipc.broadcast_event(Event::new(EventPayload::SessionCreated {
                        record: record.clone(),
                    }));
                    Response::success(request_id, ResponsePayload::Session(record))
                }
                Err(StoreError::Conflict(id)) => Response::error(
                    request_id,
                    ErrorInfo::new(
                        ErrorCode::SessionExists,
                        format!("Session already exists: {}", id),
                    ),
                ),
                Err(e) => store_failure(request_id, e),
            },

            Command::UpdateSession { record } => match store.update_session(&record) {
                Ok(()) => {
                    info!(session_id = %record.id, "Session updated");
                    ipc.broadcast_event(Event::new(EventPayload::SessionUpdated {
                        record: record.clone(),
                    }));
                    Response::success(request_id, ResponsePayload::Session(record))
                }
                Err(StoreError::NotFound(id)) => Response::error(
                    request_id,
                    ErrorInfo::new(
                        ErrorCode::SessionNotFound,
                        format!("Session not found: {}", id),
                    ),
                ),
                Err(e) => store_failure(request_id, e),
            },

            Command::DeleteSession { session_id } => match store.delete_session(&session_id) {
                Ok(()) => {
                    info!(session_id = %session_id, "Session deleted");
                    ipc.broadcast_event(Event::new(EventPayload::SessionDeleted { session_id }));
                    Response::success(request_id, ResponsePayload::Deleted)
                }
                Err(StoreError::NotFound(id)) => Response::error(
                    request_id,
                    ErrorInfo::new(
                        ErrorCode::SessionNotFound,
                        format!("Session not found: {}", id),
                    ),
                ),
                Err(e) => store_failure(request_id, e),
            },

            Command::ListClosedDates => match store.closed_dates() {
                Ok(dates) => Response::success(request_id, ResponsePayload::ClosedDates(dates)),
                Err(e) => store_failure(request_id, e),
            },

            Command::CloseDate { date } => match store.close_date(date) {
                Ok(view) => {
                    info!(date = %date, "Date closed");
                    ipc.broadcast_event(Event::new(EventPayload::DateClosed { date }));
                    Response::success(request_id, ResponsePayload::ClosedDate(view))
                }
                Err(e) => store_failure(request_id, e),
            },

            Command::ReopenDate { date } => match store.reopen_date(date) {
                Ok(view) => {
                    info!(date = %date, "Date reopened");
                    ipc.broadcast_event(Event::new(EventPayload::DateReopened { date }));
                    Response::success(request_id, ResponsePayload::ClosedDate(view))
                }
                Err(StoreError::NotFound(d)) => Response::error(
                    request_id,
                    ErrorInfo::new(ErrorCode::DateNotFound, format!("Date not found: {}", d)),
                ),
                Err(e) => store_failure(request_id, e),
            },

            Command::SyncSessions {
                device_id,
                sessions,
            } => {
                let device_id = device_id.unwrap_or_else(DeviceId::unknown);
                let mut synced: u64 = 0;
                for record in &sessions {
                    match store.upsert_session(record) {
                        Ok(()) => synced += 1,
                        Err(e) => {
                            // A bad record must not abort the batch
                            warn!(session_id = %record.id, error = %e, "Skipping record in sync batch");
                        }
                    }
                }

                if let Err(e) = store.append_sync(SyncLogEntry::new(
                    device_id.clone(),
                    SyncAction::Upload,
                    sessions.len() as u64,
                )) {
                    warn!(error = %e, "Failed to log sync");
                }

                info!(device_id = %device_id, synced, total = sessions.len(), "Sync completed");
                ipc.broadcast_event(Event::new(EventPayload::SyncCompleted {
                    device_id,
                    synced,
                }));

                match store.list_sessions(&SessionFilter::default()) {
                    Ok(all_sessions) => {
                        // Statistics are computed after persistence, over
                        // what is actually stored
                        let summary = tally_core::summarize(&all_sessions);
                        Response::success(
                            request_id,
                            ResponsePayload::SyncReport {
                                synced,
                                sessions: all_sessions,
                                summary: Box::new(summary),
                            },
                        )
                    }
                    Err(e) => store_failure(request_id, e),
                }
            }

            Command::GetSyncStatus => {
                let status = store.session_count().and_then(|total_sessions| {
                    let sessions_by_date = store.session_counts_by_date()?.into_iter().collect();
                    let last_sync = store.last_sync()?.map(|entry| entry.to_view());
                    Ok(SyncStatus {
                        total_sessions,
                        sessions_by_date,
                        last_sync,
                    })
                });

                match status {
                    Ok(status) => {
                        Response::success(request_id, ResponsePayload::SyncStatus(status))
                    }
                    Err(e) => store_failure(request_id, e),
                }
            }

            Command::GetStats { filter } => match store.list_sessions(&filter) {
                Ok(sessions) => {
                    let mut summary = tally_core::summarize(&sessions);

                    // Configured locations always appear, zero-filled,
                    // so dashboards render a stable row set.
                    for location in &settings.locations {
                        summary
                            .sessions_by_location
                            .entry(location.id.clone())
                            .or_insert(0);
                        summary
                            .earnings_by_location
                            .entry(location.id.clone())
                            .or_insert(Money::ZERO);
                    }

                    Response::success(request_id, ResponsePayload::Stats(Box::new(summary)))
                }
                Err(e) => store_failure(request_id, e),
            },

            Command::SubscribeEvents => Response::success(
                request_id,
                ResponsePayload::Subscribed {
                    client_id: client_id.clone(),
                },
            ),

            Command::UnsubscribeEvents => {
                Response::success(request_id, ResponsePayload::Unsubscribed)
            }

            Command::GetHealth => {
                let health = HealthStatus {
                    live: true,
                    ready: true,
                    store_ok: store.is_healthy(),
                };
                Response::success(request_id, ResponsePayload::Health(health))
            }

            Command::Ping => Response::success(request_id, ResponsePayload::Pong),
        }
    }
}

/// Map an unexpected store failure onto the protocol
fn store_failure(request_id: u64, error: StoreError) -> Response {
    error!(error = %error, "Store operation failed");
    Response::error(
        request_id,
        ErrorInfo::new(ErrorCode::StoreError, error.to_string()),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "tallyd starting");

    // Create and run the service
    let service = Service::new(&args).await?;
    service.run().await
}
