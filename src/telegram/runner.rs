//! Transport Runner: process lifecycle for exactly one transport.
//!
//! ```text
//! UNINITIALIZED ──initialize()──► INITIALIZED ──run()──► RUNNING ──shutdown──► STOPPED
//! ```
//!
//! `initialize` verifies the token (`getMe`), prepares the scratch root and
//! claims the credential for the chosen mode: push registers the webhook,
//! pull deletes any webhook first. Only one runner per process may hold the
//! transport at a time.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::AllowedUpdate;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::core::config::{Config, TransportMode};
use crate::core::error::AppError;
use crate::telegram::dispatcher::Dispatcher;
use crate::telegram::outbox::{create_bot, TelegramOutbox};
use crate::telegram::polling::Poller;
use crate::telegram::webhook::{health_router, serve, webhook_router};

/// Set while some runner in this process owns the bot credential.
static TRANSPORT_CLAIMED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunnerState {
    Uninitialized = 0,
    Initialized = 1,
    Running = 2,
    Stopped = 3,
}

impl RunnerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => RunnerState::Uninitialized,
            1 => RunnerState::Initialized,
            2 => RunnerState::Running,
            _ => RunnerState::Stopped,
        }
    }
}

/// Atomic lifecycle cell. Transitions only move forward.
#[derive(Debug)]
pub struct Lifecycle(AtomicU8);

impl Default for Lifecycle {
    fn default() -> Self {
        Self(AtomicU8::new(RunnerState::Uninitialized as u8))
    }
}

impl Lifecycle {
    pub fn get(&self) -> RunnerState {
        RunnerState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move `from -> to`, failing if the current state is not `from`.
    pub fn advance(&self, from: RunnerState, to: RunnerState) -> Result<(), AppError> {
        let forward = matches!(
            (from, to),
            (RunnerState::Uninitialized, RunnerState::Initialized) | (RunnerState::Initialized, RunnerState::Running)
        );
        if !forward {
            return Err(AppError::Transport(format!("illegal transition {:?} -> {:?}", from, to)));
        }
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|actual| {
                AppError::Transport(format!(
                    "illegal transition {:?} -> {:?} (runner is {:?})",
                    from,
                    to,
                    RunnerState::from_u8(actual)
                ))
            })
    }

    /// Any state may stop.
    pub fn stop(&self) {
        self.0.store(RunnerState::Stopped as u8, Ordering::SeqCst);
    }
}

/// Held while a runner owns the process-wide transport slot.
struct TransportClaim;

impl TransportClaim {
    fn acquire(mode: TransportMode) -> Result<Self, AppError> {
        TRANSPORT_CLAIMED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| TransportClaim)
            .map_err(|_| {
                AppError::Transport(format!(
                    "cannot start {:?} transport: another transport is already active in this process",
                    mode
                ))
            })
    }
}

impl Drop for TransportClaim {
    fn drop(&mut self) {
        TRANSPORT_CLAIMED.store(false, Ordering::SeqCst);
    }
}

pub struct TransportRunner {
    config: Config,
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    lifecycle: Lifecycle,
    claim: std::sync::Mutex<Option<TransportClaim>>,
}

impl TransportRunner {
    /// Production wiring from configuration.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let bot = create_bot(&config).map_err(|e| AppError::Configuration(format!("cannot create bot: {}", e)))?;
        let dispatcher = Arc::new(Dispatcher::from_config(&config, Arc::new(TelegramOutbox::new(bot.clone()))));
        Ok(Self::with_parts(config, bot, dispatcher))
    }

    /// Assemble from pre-built parts.
    pub fn with_parts(config: Config, bot: Bot, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            config,
            bot,
            dispatcher,
            lifecycle: Lifecycle::default(),
            claim: std::sync::Mutex::new(None),
        }
    }

    pub fn state(&self) -> RunnerState {
        self.lifecycle.get()
    }

    pub fn mode(&self) -> TransportMode {
        self.config.transport
    }

    /// One-time startup, strictly before any request is handled.
    pub async fn initialize(&self) -> Result<(), AppError> {
        self.lifecycle
            .advance(RunnerState::Uninitialized, RunnerState::Initialized)?;

        if let Err(e) = self.claim_credential().await {
            self.release();
            self.lifecycle.stop();
            return Err(e);
        }
        Ok(())
    }

    async fn claim_credential(&self) -> Result<(), AppError> {
        let claim = TransportClaim::acquire(self.config.transport)?;
        *self.claim.lock().unwrap_or_else(|e| e.into_inner()) = Some(claim);

        let me = self.bot.get_me().await?;
        log::info!("Authorized as @{}", me.user.username.as_deref().unwrap_or("unknown"));

        self.dispatcher.scratch().ensure_root().await?;

        match self.config.transport {
            TransportMode::Push => {
                let url = self
                    .config
                    .webhook_url
                    .clone()
                    .ok_or_else(|| AppError::Configuration("WEBHOOK_URL is required in push mode".to_string()))?;
                let mut request = self
                    .bot
                    .set_webhook(url.clone())
                    .allowed_updates(vec![AllowedUpdate::Message]);
                if let Some(secret) = &self.config.webhook_secret {
                    request = request.secret_token(secret.clone());
                }
                request.await?;
                log::info!("Webhook registered at {}", url);
            }
            TransportMode::Pull => {
                self.bot.delete_webhook().await?;
                log::info!("Webhook cleared, long polling can start");
            }
        }
        Ok(())
    }

    fn release(&self) {
        self.claim.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// Run the transport until `shutdown` resolves, serving HTTP on `PORT`.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                log::error!("Cannot bind {}: {}", addr, e);
                self.lifecycle.stop();
                self.release();
                return Err(e.into());
            }
        };
        self.run_on(listener, shutdown).await
    }

    /// Like [`run`](Self::run) on an already bound listener.
    pub async fn run_on<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.lifecycle.advance(RunnerState::Initialized, RunnerState::Running)?;
        log::info!("Transport running in {:?} mode", self.config.transport);

        let (stop_tx, stop_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown.await;
            let _ = stop_tx.send(true);
        });
        let stopped = |mut rx: watch::Receiver<bool>| async move {
            let _ = rx.wait_for(|stop| *stop).await;
        };

        let result = match self.config.transport {
            TransportMode::Push => {
                let app = webhook_router(
                    Arc::clone(&self.dispatcher),
                    &self.config.webhook_path,
                    self.config.webhook_secret.clone(),
                );
                serve(listener, app, stopped(stop_rx.clone())).await
            }
            TransportMode::Pull => {
                let health = tokio::spawn(serve(listener, health_router(), stopped(stop_rx.clone())));
                let poller = Poller::new(self.bot.clone(), Arc::clone(&self.dispatcher), &self.config);
                let polled = poller.run(stopped(stop_rx.clone())).await;
                match health.await {
                    Ok(Err(e)) => log::warn!("Health server ended with error: {}", e),
                    Err(e) => log::warn!("Health server task failed: {}", e),
                    Ok(Ok(())) => {}
                }
                polled
            }
        };

        self.lifecycle.stop();
        self.release();
        log::info!("Transport stopped");
        result
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    log::info!("Shutdown signal received");
}
