// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The session coordinator.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐  Command  ┌──────────────┐  connect  ┌──────────────────┐
//! │ SessionCoordinator │──────────►│ session task │──────────►│ TransportChannel │
//! │    (cloneable)     │           │ (one writer) │◄──────────│    (I/O task)    │
//! └────────────────────┘           └──────────────┘  events   └──────────────────┘
//!           ▲                              │
//!           │ status, store,               ├─ reconnect backoff timer
//!           │ boarding, notices            ├─ resync timer + bulk fetch task
//!           └──────────────────────────────┴─ position reporter
//! ```
//!
//! All writes to the position store, boarding status and connection status
//! happen on the session task. Public methods only read shared state or
//! queue commands for the task.

use std::future::pending;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use busline_core::{
    BoardingAction, BoardingStatus, ClientMessage, ServerMessage, SessionIdentity,
    VehiclePosition,
};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::lifecycle::AppState;
use super::reporter::Reporter;
use super::state::{ConnectionState, SharedStatus};
use crate::backoff::Backoff;
use crate::channel::{
    ChannelEvent, ChannelId, ChannelSender, Inbound, TransportChannel, TransportFactory,
};
use crate::config::SessionConfig;
use crate::error::{DirectoryError, IdentityError};
use crate::listeners::{StatusListeners, Subscription};
use crate::services::{IdentitySource, PositionProvider, VehicleDirectory};
use crate::store::PositionStore;

/// Capacity of the notice broadcast; slow receivers lose the oldest notices.
const NOTICE_CAPACITY: usize = 16;

/// One-shot notifications for the user interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// The rider's boarding state changed.
    Boarding(BoardingStatus),
    /// Automatic reconnection gave up after this many retries.
    ReconnectFailed { attempts: u32 },
    /// The server reported an error.
    ServerError(String),
}

/// External services the coordinator depends on.
pub struct Collaborators {
    pub identity: Arc<dyn IdentitySource>,
    pub directory: Arc<dyn VehicleDirectory>,
    pub provider: Arc<dyn PositionProvider>,
    /// Builds a fresh transport for every connection attempt.
    pub transport: TransportFactory,
}

/// Owns the real-time session: connection, reconciliation and timers.
///
/// Construct one per process and share clones of it; every clone drives the
/// same session.
#[derive(Clone)]
pub struct SessionCoordinator {
    shared: Arc<Shared>,
}

struct Shared {
    config: SessionConfig,
    identity_source: Arc<dyn IdentitySource>,
    directory: Arc<dyn VehicleDirectory>,
    provider: Arc<dyn PositionProvider>,
    transport: TransportFactory,
    status: SharedStatus,
    listeners: StatusListeners,
    store: PositionStore,
    boarding: watch::Sender<Option<BoardingStatus>>,
    notices: broadcast::Sender<Notice>,
    /// Serializes initialize/cleanup and owns the session task.
    lifecycle: tokio::sync::Mutex<Option<SessionHandle>>,
    /// What public readers and senders need about the running session.
    active: Mutex<Option<ActiveSession>>,
}

struct SessionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct ActiveSession {
    identity: SessionIdentity,
    commands: mpsc::UnboundedSender<Command>,
    /// Present only while a channel is open and subscribed.
    sender: Option<ChannelSender>,
}

#[derive(Debug)]
enum Command {
    EnsureActive,
    AppState(AppState),
}

type ResyncResult = (u64, Result<Vec<VehiclePosition>, DirectoryError>);

impl SessionCoordinator {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let (boarding, _) = watch::channel(None);
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        SessionCoordinator {
            shared: Arc::new(Shared {
                config,
                identity_source: collaborators.identity,
                directory: collaborators.directory,
                provider: collaborators.provider,
                transport: collaborators.transport,
                status: SharedStatus::new(),
                listeners: StatusListeners::new(),
                store: PositionStore::new(),
                boarding,
                notices,
                lifecycle: tokio::sync::Mutex::new(None),
                active: Mutex::new(None),
            }),
        }
    }

    /// Starts a session for the signed-in account.
    ///
    /// If a session is already running this only ensures its channel is
    /// active. Returns false if the identity cannot be resolved; the caller
    /// decides whether to retry.
    pub async fn initialize(&self) -> bool {
        let mut lifecycle = self.shared.lifecycle.lock().await;

        if let Some(handle) = lifecycle.as_ref() {
            if !handle.task.is_finished() {
                debug!("session already initialized");
                self.ensure_active();
                return true;
            }
            warn!("session task ended unexpectedly, starting a new session");
            self.shared.active_session().take();
        }

        let identity = match self.resolve_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "cannot initialize session");
                return false;
            }
        };

        let url = self.shared.config.endpoint_for(&identity.organization_id);
        info!(session = %identity, url = %url, "initializing session");

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = SessionTask::new(
            Arc::clone(&self.shared),
            identity.clone(),
            url,
            commands_rx,
            cancel.clone(),
        );

        *self.shared.active_session() = Some(ActiveSession {
            identity,
            commands: commands_tx,
            sender: None,
        });
        *lifecycle = Some(SessionHandle {
            cancel,
            task: tokio::spawn(task.run()),
        });
        true
    }

    /// Tears the session down, waits for things to settle, and starts over.
    ///
    /// Identity is fetched again.
    pub async fn restart(&self) -> bool {
        info!("restarting session");
        self.cleanup().await;
        tokio::time::sleep(self.shared.config.restart_settle()).await;
        self.initialize().await
    }

    /// Starts one connection attempt if the channel is down and none is in flight.
    ///
    /// Safe to call redundantly. Also revives a session whose automatic
    /// reconnection gave up.
    pub fn ensure_active(&self) {
        if !self.shared.command(Command::EnsureActive) {
            debug!("ensure_active: no session");
        }
    }

    /// Stops every timer and task, closes the channel and forgets the identity.
    ///
    /// Returns once all of them have finished.
    pub async fn cleanup(&self) {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        self.shared.active_session().take();

        if let Some(handle) = lifecycle.take() {
            info!("cleaning up session");
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                warn!(error = %e, "session task ended abnormally");
            }
        }

        // Covers a session task that died before its own teardown ran
        self.shared.settle();
    }

    /// Whether the channel is open.
    pub fn connection_status(&self) -> bool {
        self.shared.status.is_open()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.status.state()
    }

    /// Registers a listener called with the new status on every open/closed transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(listener)
    }

    /// Read-only handle to the vehicle position table.
    pub fn positions(&self) -> PositionStore {
        self.shared.store.clone()
    }

    /// Latest boarding status.
    pub fn boarding(&self) -> watch::Receiver<Option<BoardingStatus>> {
        self.shared.boarding.subscribe()
    }

    /// Stream of user-facing notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.shared.notices.subscribe()
    }

    /// Identity of the current session, if one is initialized.
    pub fn identity(&self) -> Option<SessionIdentity> {
        self.shared
            .active_session()
            .as_ref()
            .map(|active| active.identity.clone())
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.active_session().is_some()
    }

    /// Applies a foreground/background transition.
    pub fn set_app_state(&self, state: AppState) {
        if !self.shared.command(Command::AppState(state)) {
            debug!(?state, "app state change ignored: no session");
        }
    }

    /// Tells the server the rider boarded or left a vehicle.
    ///
    /// Returns false if no session is active or the channel is not open.
    pub fn send_boarding_action(&self, vehicle_id: &str, action: BoardingAction) -> bool {
        self.shared.send_with(|identity| {
            ClientMessage::boarding_action(
                vehicle_id,
                identity.organization_id.clone(),
                identity.user_id.clone(),
                action,
            )
        })
    }

    /// Asks the server for the status of one vehicle, or of the whole organization.
    pub fn query_status(&self, vehicle_id: Option<String>) -> bool {
        self.shared.send_with(|identity| {
            ClientMessage::status_query(identity.organization_id.clone(), vehicle_id)
        })
    }

    async fn resolve_identity(&self) -> Result<SessionIdentity, IdentityError> {
        let account = self.shared.identity_source.identity().await?;
        Ok(SessionIdentity::try_from(account)?)
    }
}

impl std::fmt::Debug for SessionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCoordinator")
            .field("state", &self.connection_state())
            .field("identity", &self.identity())
            .field("store", &self.shared.store)
            .finish()
    }
}

impl Shared {
    fn active_session(&self) -> std::sync::MutexGuard<'_, Option<ActiveSession>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues a command for the session task. Returns false if there is no session.
    fn command(&self, command: Command) -> bool {
        match self.active_session().as_ref() {
            Some(active) => active.commands.send(command).is_ok(),
            None => false,
        }
    }

    fn send_with(&self, build: impl FnOnce(&SessionIdentity) -> ClientMessage) -> bool {
        let active = self.active_session();
        let Some(active) = active.as_ref() else {
            warn!("cannot send: no active session");
            return false;
        };
        let Some(sender) = active.sender.as_ref() else {
            warn!("cannot send: channel not open");
            return false;
        };
        sender.send(build(&active.identity))
    }

    fn set_sender(&self, sender: Option<ChannelSender>) {
        if let Some(active) = self.active_session().as_mut() {
            active.sender = sender;
        }
    }

    /// Records the channel as down, notifying listeners on the transition.
    fn mark_closed(&self) {
        self.set_sender(None);
        if self.status.set_open(false) {
            self.listeners.notify(false);
        }
    }

    /// Final state after a session ends.
    fn settle(&self) {
        self.mark_closed();
        self.store.clear();
        self.boarding.send_replace(None);
        self.status.set_state(ConnectionState::Disconnected);
    }
}

/// The single writer: owns the channel and every timer of one session.
struct SessionTask {
    shared: Arc<Shared>,
    identity: SessionIdentity,
    url: String,
    commands: mpsc::UnboundedReceiver<Command>,
    cancel: CancellationToken,
    events_tx: mpsc::UnboundedSender<(ChannelId, ChannelEvent)>,
    events_rx: mpsc::UnboundedReceiver<(ChannelId, ChannelEvent)>,
    channel: Option<TransportChannel>,
    next_channel_id: ChannelId,
    /// A channel exists but has not reported open or closed yet.
    connecting: bool,
    backoff: Backoff,
    reconnect: Option<Pin<Box<Sleep>>>,
    reporter: Option<Reporter>,
    app_state: AppState,
    resync_timer: Option<Interval>,
    resync_task: Option<JoinHandle<()>>,
    resync_tx: mpsc::UnboundedSender<ResyncResult>,
    resync_rx: mpsc::UnboundedReceiver<ResyncResult>,
    /// Bumped on every store clear; fetches started earlier are stale.
    store_epoch: u64,
}

impl SessionTask {
    fn new(
        shared: Arc<Shared>,
        identity: SessionIdentity,
        url: String,
        commands: mpsc::UnboundedReceiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (resync_tx, resync_rx) = mpsc::unbounded_channel();
        let backoff = shared.config.backoff();

        SessionTask {
            shared,
            identity,
            url,
            commands,
            cancel,
            events_tx,
            events_rx,
            channel: None,
            next_channel_id: 0,
            connecting: false,
            backoff,
            reconnect: None,
            reporter: None,
            app_state: AppState::Foreground,
            resync_timer: None,
            resync_task: None,
            resync_tx,
            resync_rx,
            store_epoch: 0,
        }
    }

    async fn run(mut self) {
        self.connect(ConnectionState::Connecting);
        self.restart_resync_timer();

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                Some((id, event)) = self.events_rx.recv() => {
                    self.on_channel_event(id, event).await;
                }

                Some(command) = self.commands.recv() => self.on_command(command),

                Some((epoch, result)) = self.resync_rx.recv() => self.on_resync(epoch, result),

                _ = wait_for(&mut self.reconnect) => {
                    self.reconnect = None;
                    let attempt = self.backoff.attempt();
                    self.connect(ConnectionState::Reconnecting { attempt });
                }

                _ = tick(&mut self.resync_timer) => self.start_resync(),
            }
        }

        self.shutdown().await;
    }

    fn is_open(&self) -> bool {
        self.channel.as_ref().is_some_and(TransportChannel::is_open)
    }

    /// Opens a new channel unless one is open or already connecting.
    fn connect(&mut self, state: ConnectionState) {
        if self.connecting || self.is_open() {
            debug!("connection already active or in flight");
            return;
        }

        self.reconnect = None;
        self.next_channel_id += 1;
        self.connecting = true;
        self.shared.status.set_state(state);
        info!(
            organization_id = %self.identity.organization_id,
            channel = self.next_channel_id,
            state = %state,
            "connecting"
        );

        let transport = (self.shared.transport)();
        self.channel = Some(TransportChannel::connect(
            self.next_channel_id,
            &self.url,
            transport,
            self.shared.config.heartbeat_interval(),
            self.events_tx.clone(),
        ));
    }

    async fn on_channel_event(&mut self, id: ChannelId, event: ChannelEvent) {
        if self.channel.as_ref().map(TransportChannel::id) != Some(id) {
            trace!(channel = id, "ignoring event from a replaced channel");
            return;
        }

        match event {
            ChannelEvent::Open => self.on_open(),
            ChannelEvent::Message(inbound) => self.on_message(inbound),
            ChannelEvent::Error(e) => {
                warn!(channel = id, error = %e, "channel error");
                // Listeners told the channel is down must not see stale vehicles
                self.clear_store();
                self.shared.mark_closed();
            }
            ChannelEvent::Closed { clean } => self.on_closed(clean).await,
        }
    }

    fn on_open(&mut self) {
        let Some(sender) = self.channel.as_ref().map(TransportChannel::sender) else {
            return;
        };

        self.connecting = false;
        self.backoff.reset();
        self.shared.status.set_state(ConnectionState::Connected);
        if self.shared.status.set_open(true) {
            self.shared.listeners.notify(true);
        }

        // Subscribe goes out before anything else can use the sender
        sender.send(ClientMessage::subscribe(
            self.identity.organization_id.clone(),
        ));
        self.shared.set_sender(Some(sender.clone()));

        if self.reporter.is_none() {
            self.reporter = Some(Reporter::start(
                Arc::clone(&self.shared.provider),
                sender,
                self.identity.clone(),
                &self.shared.config.reporting,
            ));
        }

        self.start_resync();
    }

    fn on_message(&mut self, inbound: Inbound) {
        let value = match inbound {
            Inbound::Json(value) => value,
            Inbound::Raw(text) => {
                warn!(len = text.len(), "dropping non-JSON frame");
                return;
            }
        };

        let msg = match ServerMessage::from_value(value) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "dropping message");
                return;
            }
        };

        match msg {
            ServerMessage::ConnectionEstablished { message } => {
                debug!(message = message.as_deref().unwrap_or(""), "server acknowledged connection");
            }
            ServerMessage::VehicleUpdate(position) => {
                let vehicle_id = position.vehicle_id.clone();
                let outcome = self.shared.store.upsert(position);
                debug!(vehicle_id = %vehicle_id, ?outcome, "vehicle update");
            }
            ServerMessage::BoardingUpdate { status, vehicle_id } => {
                let status = BoardingStatus {
                    vehicle_id,
                    state: status,
                };
                info!(vehicle_id = %status.vehicle_id, state = ?status.state, "boarding update");
                self.shared.boarding.send_replace(Some(status.clone()));
                let _ = self.shared.notices.send(Notice::Boarding(status));
            }
            ServerMessage::HeartbeatResponse => trace!("heartbeat acknowledged"),
            ServerMessage::Error { message } => {
                warn!(message = %message, "server reported an error");
                let _ = self.shared.notices.send(Notice::ServerError(message));
            }
        }
    }

    async fn on_closed(&mut self, clean: bool) {
        self.connecting = false;
        self.clear_store();
        self.shared.mark_closed();
        self.stop_reporter().await;
        self.channel = None;

        if clean {
            self.shared.status.set_state(ConnectionState::Disconnected);
            return;
        }

        info!("channel lost");
        self.schedule_reconnect();
    }

    /// Arms the reconnect timer, replacing any pending one, or gives up.
    fn schedule_reconnect(&mut self) {
        match self.backoff.next_delay() {
            Some(delay) => {
                let attempt = self.backoff.attempt();
                info!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling reconnect"
                );
                self.shared
                    .status
                    .set_state(ConnectionState::Reconnecting { attempt });
                self.reconnect = Some(Box::pin(tokio::time::sleep(delay)));
            }
            None => {
                let attempts = self.backoff.attempt();
                warn!(attempts, "giving up reconnecting");
                self.reconnect = None;
                self.shared.status.set_state(ConnectionState::Disconnected);
                let _ = self.shared.notices.send(Notice::ReconnectFailed { attempts });
            }
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::EnsureActive => self.ensure_active(),
            Command::AppState(state) => self.on_app_state(state),
        }
    }

    fn ensure_active(&mut self) {
        if self.connecting || self.is_open() {
            debug!("channel already active");
            return;
        }
        self.connect(ConnectionState::Connecting);
    }

    fn on_app_state(&mut self, state: AppState) {
        self.app_state = state;
        match state {
            AppState::Foreground => {
                info!("app in foreground");
                self.ensure_active();
                self.start_resync();
                self.restart_resync_timer();
            }
            AppState::Background => {
                info!("app in background, pausing resync");
                self.resync_timer = None;
            }
        }
    }

    fn restart_resync_timer(&mut self) {
        if self.app_state != AppState::Foreground {
            return;
        }
        let period = self
            .shared
            .config
            .resync_interval()
            .max(Duration::from_millis(1));
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.resync_timer = Some(timer);
    }

    /// Starts a bulk fetch in the background unless one is in flight.
    fn start_resync(&mut self) {
        if !self.is_open() {
            debug!("skipping resync: channel not open");
            return;
        }
        if self.resync_task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("resync already in flight");
            return;
        }

        let directory = Arc::clone(&self.shared.directory);
        let organization_id = self.identity.organization_id.clone();
        let epoch = self.store_epoch;
        let results = self.resync_tx.clone();

        debug!(organization_id = %organization_id, "starting full resync");
        self.resync_task = Some(tokio::spawn(async move {
            let result = directory.list_active_vehicles(&organization_id).await;
            let _ = results.send((epoch, result));
        }));
    }

    fn on_resync(&mut self, epoch: u64, result: Result<Vec<VehiclePosition>, DirectoryError>) {
        if epoch != self.store_epoch || !self.is_open() {
            debug!("discarding stale resync result");
            return;
        }

        match result {
            Ok(vehicles) => {
                let received = vehicles.len();
                let kept = self.shared.store.replace(vehicles);
                info!(received, kept, "full resync applied");
            }
            Err(e) => warn!(error = %e, "full resync failed"),
        }
    }

    fn clear_store(&mut self) {
        self.store_epoch += 1;
        self.shared.store.clear();
    }

    async fn stop_reporter(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            reporter.stop().await;
        }
    }

    async fn shutdown(mut self) {
        self.shared.status.set_state(ConnectionState::Closing);
        self.reconnect = None;
        self.resync_timer = None;

        if let Some(task) = self.resync_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.stop_reporter().await;
        if let Some(mut channel) = self.channel.take() {
            channel.close().await;
        }

        self.clear_store();
        self.shared.settle();
        info!(session = %self.identity, "session closed");
    }
}

/// Completes when the timer fires; never if there is none.
async fn wait_for(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

async fn tick(timer: &mut Option<Interval>) -> Instant {
    match timer {
        Some(interval) => interval.tick().await,
        None => pending().await,
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
