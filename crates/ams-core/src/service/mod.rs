//! The orchestrator state machine and its worker loop.
//!
//! [`AbilityService`] owns the ability list, the foreground stack, the token
//! allocator, and the pending-launch slot. Exactly one worker task mutates
//! this state: every other task, including the per-application hosts,
//! reaches it by sending a [`ServiceRequest`] into a bounded inbox. The
//! single-writer discipline is the correctness mechanism; no locks are
//! needed because the inbox serializes every transition.
//!
//! Lifecycle transitions are *requested* by the orchestrator and *confirmed*
//! asynchronously by the running ability; only confirmed states are stored
//! in records. The launcher is native and confirms synchronously inside the
//! same dispatch; applications confirm through their host task.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::apphost::{AppMessage, AppSpec, AppTaskHandle, JsAppHost, JsRuntimeFactory};
use crate::bundle::{AdmissionPolicy, BundleRegistry};
use crate::config::AmsConfig;
use crate::error::AmsError;
use crate::list::AbilityList;
use crate::record::{AbilityRecord, LifecycleState, LAUNCHER_TOKEN};
use crate::stack::AbilityStack;
use crate::token::TokenAllocator;
use crate::want::{ElementName, Want};

/// The native launcher ability.
///
/// The launcher lives in the manager's own process; its callbacks are
/// invoked synchronously and render whatever the device shows when no
/// application holds the foreground.
pub trait NativeAbility: Send {
    /// One-time startup notification.
    fn on_start(&mut self, want: &Want);

    /// Brings the launcher to the foreground.
    ///
    /// # Errors
    ///
    /// Returns [`AmsError::SchedulerLifecycle`] when the launcher cannot
    /// take the foreground.
    fn on_active(&mut self, want: &Want) -> Result<(), AmsError>;

    /// Moves the launcher out of the foreground.
    ///
    /// # Errors
    ///
    /// Returns [`AmsError::SchedulerLifecycle`] when the launcher fails to
    /// hide.
    fn on_background(&mut self) -> Result<(), AmsError>;
}

/// One message into the manager inbox.
///
/// Requests carrying a `reply` report their status back to the caller;
/// lifecycle completions are fire-and-forget.
#[derive(Debug)]
pub enum ServiceRequest {
    /// Start the ability described by a want.
    Start {
        /// Launch intent (the manager owns this copy).
        want: Want,
        /// Status channel back to the caller.
        reply: Option<oneshot::Sender<Result<(), AmsError>>>,
    },
    /// Gracefully terminate a token.
    Terminate {
        /// Target identity token.
        token: u16,
        /// Status channel back to the caller.
        reply: Option<oneshot::Sender<Result<(), AmsError>>>,
    },
    /// Asynchronous lifecycle confirmation from a running ability.
    LifecycleDone {
        /// Reporting token.
        token: u16,
        /// Confirmed state.
        state: LifecycleState,
    },
    /// Ungraceful teardown of a token.
    ForceStopApp {
        /// Target identity token.
        token: u16,
        /// Status channel back to the caller.
        reply: Option<oneshot::Sender<Result<(), AmsError>>>,
    },
    /// Ungraceful teardown of a bundle.
    ForceStopBundle {
        /// Target bundle name.
        bundle_name: String,
        /// Status channel back to the caller.
        reply: Option<oneshot::Sender<Result<(), AmsError>>>,
    },
    /// Foreground identity query.
    GetTop {
        /// Answer channel.
        reply: oneshot::Sender<Option<ElementName>>,
    },
}

/// Cloneable handle into the manager inbox.
///
/// This is how every other task, including application hosts, reaches the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct AmsHandle {
    tx: mpsc::Sender<ServiceRequest>,
}

impl AmsHandle {
    fn send_error(e: impl std::fmt::Display) -> AmsError {
        AmsError::ServiceUnavailable(e.to_string())
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), AmsError>>) -> ServiceRequest,
    ) -> Result<(), AmsError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(Self::send_error)?;
        reply_rx.await.map_err(Self::send_error)?
    }

    /// Starts an ability.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's status.
    pub async fn start_ability(&self, want: Want) -> Result<(), AmsError> {
        self.request(|reply| ServiceRequest::Start {
            want,
            reply: Some(reply),
        })
        .await
    }

    /// Gracefully terminates the ability holding `token`.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's status.
    pub async fn terminate_ability(&self, token: u16) -> Result<(), AmsError> {
        self.request(|reply| ServiceRequest::Terminate {
            token,
            reply: Some(reply),
        })
        .await
    }

    /// Reports a confirmed lifecycle transition.
    ///
    /// # Errors
    ///
    /// Fails only when the manager inbox is gone.
    pub async fn lifecycle_done(&self, token: u16, state: LifecycleState) -> Result<(), AmsError> {
        self.tx
            .send(ServiceRequest::LifecycleDone { token, state })
            .await
            .map_err(Self::send_error)
    }

    /// Force-stops the application holding `token`.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's status.
    pub async fn force_stop_app(&self, token: u16) -> Result<(), AmsError> {
        self.request(|reply| ServiceRequest::ForceStopApp {
            token,
            reply: Some(reply),
        })
        .await
    }

    /// Force-stops the application owning `bundle_name`.
    ///
    /// # Errors
    ///
    /// Propagates the orchestrator's status.
    pub async fn force_stop_bundle(&self, bundle_name: String) -> Result<(), AmsError> {
        self.request(|reply| ServiceRequest::ForceStopBundle {
            bundle_name,
            reply: Some(reply),
        })
        .await
    }

    /// Queries the authoritative foreground identity.
    ///
    /// # Errors
    ///
    /// Fails only when the manager inbox is gone.
    pub async fn get_top_ability(&self) -> Result<Option<ElementName>, AmsError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ServiceRequest::GetTop { reply: reply_tx })
            .await
            .map_err(Self::send_error)?;
        reply_rx.await.map_err(Self::send_error)
    }

    /// Handle wired to a bare inbox, for driving hosts in tests.
    #[cfg(test)]
    pub(crate) fn for_tests(depth: usize) -> (Self, mpsc::Receiver<ServiceRequest>) {
        let (tx, rx) = mpsc::channel(depth);
        (Self { tx }, rx)
    }
}

/// The ability lifecycle orchestrator.
pub struct AbilityService {
    config: AmsConfig,
    bundles: Arc<dyn BundleRegistry>,
    admission: Arc<dyn AdmissionPolicy>,
    launcher: Box<dyn NativeAbility>,
    runtimes: Arc<dyn JsRuntimeFactory>,
    abilities: AbilityList,
    stack: AbilityStack,
    tokens: TokenAllocator,
    pending_token: Option<u16>,
    inbox: mpsc::Receiver<ServiceRequest>,
    handle: AmsHandle,
    launcher_data_cleaned: bool,
}

impl AbilityService {
    /// Builds an orchestrator with its collaborators and returns the handle
    /// other tasks use to reach it.
    #[must_use]
    pub fn new(
        config: AmsConfig,
        bundles: Arc<dyn BundleRegistry>,
        admission: Arc<dyn AdmissionPolicy>,
        launcher: Box<dyn NativeAbility>,
        runtimes: Arc<dyn JsRuntimeFactory>,
    ) -> (Self, AmsHandle) {
        let (tx, rx) = mpsc::channel(config.inbox_depth);
        let handle = AmsHandle { tx };
        let service = Self {
            config,
            bundles,
            admission,
            launcher,
            runtimes,
            abilities: AbilityList::new(),
            stack: AbilityStack::new(),
            tokens: TokenAllocator::new(),
            pending_token: None,
            inbox: rx,
            handle: handle.clone(),
            launcher_data_cleaned: false,
        };
        (service, handle)
    }

    /// Runs the worker loop until every handle is dropped.
    ///
    /// Boots the resident launcher first, then processes requests strictly
    /// in receipt order.
    pub async fn run(mut self) {
        self.boot_launcher();
        while let Some(request) = self.inbox.recv().await {
            self.handle_request(request);
        }
        debug!("manager inbox closed, worker exiting");
    }

    fn boot_launcher(&mut self) {
        let record = AbilityRecord::new_launcher(&self.config.launcher_bundle);
        self.abilities.insert(record);
        self.stack.push(LAUNCHER_TOKEN);

        let want = Want::new(ElementName::new(&self.config.launcher_bundle, ""));
        self.launcher.on_start(&want);
        if let Err(e) = self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Active) {
            warn!(error = %e, "launcher failed to activate at boot");
        }
        info!(bundle = %self.config.launcher_bundle, "launcher resident");
    }

    fn handle_request(&mut self, request: ServiceRequest) {
        match request {
            ServiceRequest::Start { want, reply } => {
                let result = self.start_ability(&want);
                Self::finish(reply, result, "start ability");
            },
            ServiceRequest::Terminate { token, reply } => {
                let result = self.terminate_ability(token);
                Self::finish(reply, result, "terminate ability");
            },
            ServiceRequest::LifecycleDone { token, state } => {
                self.scheduler_lifecycle_done(token, state);
            },
            ServiceRequest::ForceStopApp { token, reply } => {
                let result = self.force_stop_app(token);
                Self::finish(reply, result, "force stop");
            },
            ServiceRequest::ForceStopBundle { bundle_name, reply } => {
                let result = self.force_stop_bundle(&bundle_name);
                Self::finish(reply, result, "force stop bundle");
            },
            ServiceRequest::GetTop { reply } => {
                let _ = reply.send(self.get_top_ability());
            },
        }
    }

    fn finish(
        reply: Option<oneshot::Sender<Result<(), AmsError>>>,
        result: Result<(), AmsError>,
        operation: &str,
    ) {
        if let Err(e) = &result {
            warn!(error = %e, "{operation} failed");
        }
        if let Some(tx) = reply {
            if tx.send(result).is_err() {
                debug!("{operation} caller went away before the reply");
            }
        }
    }

    /// Starts the ability a want describes.
    ///
    /// # Errors
    ///
    /// `ParamNull` for a missing target, `ParamCheck` for unknown or
    /// rejected bundles, `CreateAppTask`/`SchedulerLifecycle` for delivery
    /// failures.
    pub fn start_ability(&mut self, want: &Want) -> Result<(), AmsError> {
        let bundle_name = want.bundle_name().ok_or(AmsError::ParamNull("bundle name"))?;
        info!(bundle = %bundle_name, "start ability");

        if bundle_name == self.config.launcher_bundle {
            return self.start_launcher_ability(want);
        }

        let info = self.bundles.query_ability_info(want).ok_or_else(|| {
            AmsError::ParamCheck(format!("bundle '{bundle_name}' is not installed"))
        })?;

        if let Some(top_token) = self.stack.top_app() {
            let top = self
                .abilities
                .get(top_token)
                .ok_or_else(|| AmsError::ParamCheck("stack top has no record".into()))?;

            if top.bundle_name() == info.bundle_name {
                if top.state() == LifecycleState::Background {
                    // Resume: the launcher steps aside and its
                    // background-done re-activates the application.
                    return self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Background);
                }
                debug!(bundle = %info.bundle_name, "already foreground, nothing to do");
                return Ok(());
            }

            // A different application holds the foreground: remember this
            // request and tear the current one down. Its destroy-done
            // launches the pending record.
            self.check_admission(&info.bundle_name)?;
            let token = self.new_app_record(want, &info);
            self.pending_token = Some(token);
            info!(bundle = %info.bundle_name, token, "queued behind terminating foreground app");
            return self.terminate_ability(top_token);
        }

        self.check_admission(&info.bundle_name)?;
        let token = self.new_app_record(want, &info);
        if let Err(e) = self.create_app_task(token) {
            // Roll back the partial admission before surfacing the failure.
            if self.stack.top() == Some(token) {
                self.stack.pop();
            }
            self.release_record(token);
            return Err(e);
        }
        Ok(())
    }

    fn start_launcher_ability(&mut self, want: &Want) -> Result<(), AmsError> {
        let launcher = self
            .abilities
            .get_mut(LAUNCHER_TOKEN)
            .ok_or_else(|| AmsError::ParamCheck("launcher record missing".into()))?;
        launcher.set_app_data(want.data.clone());

        if let Some(app_token) = self.stack.top_app() {
            let app = self
                .abilities
                .get(app_token)
                .ok_or_else(|| AmsError::ParamCheck("stack top has no record".into()))?;
            if app.state() != LifecycleState::Background {
                // The launcher only takes over once the application
                // confirms background.
                return self.scheduler_lifecycle(app_token, LifecycleState::Background);
            }
        }
        self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Active)
    }

    fn check_admission(&self, bundle_name: &str) -> Result<(), AmsError> {
        if self.admission.check(bundle_name) {
            Ok(())
        } else {
            Err(AmsError::ParamCheck(format!(
                "bundle '{bundle_name}' rejected by admission check"
            )))
        }
    }

    fn new_app_record(&mut self, want: &Want, info: &crate::bundle::AbilityInfo) -> u16 {
        let abilities = &self.abilities;
        let token = self.tokens.allocate(|t| abilities.contains(t));
        let element = want
            .element
            .clone()
            .unwrap_or_else(|| ElementName::new(info.bundle_name.clone(), ""));
        let mut record = AbilityRecord::new_app(element, info.src_path.clone(), token);
        record.set_app_data(want.data.clone());
        self.abilities.insert(record);
        token
    }

    /// Gracefully terminates the ability holding `token`.
    ///
    /// # Errors
    ///
    /// `ParamCheck` for tokens that are not the foreground ability (the
    /// record is evicted defensively) or delivery failures.
    pub fn terminate_ability(&mut self, token: u16) -> Result<(), AmsError> {
        info!(token, "terminate ability");
        if token == LAUNCHER_TOKEN {
            // Only meaningful while an application rests in background
            // behind the active launcher: resume it.
            if let Some(app_token) = self.stack.top_app() {
                let launcher_active = self
                    .abilities
                    .get(LAUNCHER_TOKEN)
                    .is_some_and(|l| l.state() == LifecycleState::Active);
                let app_backgrounded = self
                    .abilities
                    .get(app_token)
                    .is_some_and(|a| a.state() == LifecycleState::Background);
                if launcher_active && app_backgrounded {
                    return self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Background);
                }
            }
            return Ok(());
        }

        if self.stack.top() == Some(token) {
            let record = self
                .abilities
                .get_mut(token)
                .ok_or_else(|| AmsError::ParamCheck("stack top has no record".into()))?;
            record.mark_terminated();
            return self.scheduler_lifecycle(token, LifecycleState::Background);
        }

        // Not the foreground ability: evict whatever the token still names.
        self.release_record(token);
        Err(AmsError::ParamCheck(format!(
            "token {token} is not the foreground ability"
        )))
    }

    /// Ungracefully tears down the application holding `token`.
    ///
    /// # Errors
    ///
    /// `ParamCheck` for the launcher token or unknown tokens.
    pub fn force_stop_app(&mut self, token: u16) -> Result<(), AmsError> {
        if token == LAUNCHER_TOKEN {
            return Err(AmsError::ParamCheck(
                "the launcher cannot be force-stopped".into(),
            ));
        }
        if !self.abilities.contains(token) {
            return Err(AmsError::ParamCheck(format!("unknown token {token}")));
        }
        info!(token, "force stop");

        if self.pending_token == Some(token) {
            self.pending_token = None;
        }
        if self.stack.top() == Some(token) {
            self.stack.pop();
        }
        self.release_record(token);
        self.activate_launcher_if_idle();
        Ok(())
    }

    /// Ungracefully tears down whichever record owns `bundle_name`.
    ///
    /// # Errors
    ///
    /// `ParamCheck` for the launcher bundle or bundles that are not
    /// running.
    pub fn force_stop_bundle(&mut self, bundle_name: &str) -> Result<(), AmsError> {
        if bundle_name == self.config.launcher_bundle {
            return Err(AmsError::ParamCheck(
                "the launcher cannot be force-stopped".into(),
            ));
        }
        let token = self.abilities.find_by_bundle(bundle_name).ok_or_else(|| {
            AmsError::ParamCheck(format!("bundle '{bundle_name}' is not running"))
        })?;
        self.force_stop_app(token)
    }

    /// Dispatches one asynchronous lifecycle confirmation.
    ///
    /// Unknown tokens and unexpected states are ignored: a completion may
    /// arrive after its record was evicted.
    pub fn scheduler_lifecycle_done(&mut self, token: u16, state: LifecycleState) {
        debug!(token, ?state, "lifecycle done");
        match state {
            LifecycleState::Active => self.on_active_done(token),
            LifecycleState::Background => self.on_background_done(token),
            LifecycleState::Uninitialized => self.on_destroy_done(token),
            LifecycleState::Initial | LifecycleState::Inactive => {
                debug!(token, ?state, "ignoring unexpected confirmation");
            },
        }
    }

    /// Authoritative foreground identity, by active/background precedence
    /// between launcher and top-of-stack application.
    #[must_use]
    pub fn get_top_ability(&self) -> Option<ElementName> {
        let top = self.stack.top()?;
        let launcher = self.abilities.get(LAUNCHER_TOKEN)?;
        if top == LAUNCHER_TOKEN {
            return Some(launcher.element().clone());
        }
        let app = self.abilities.get(top)?;
        if app.state() == LifecycleState::Active {
            Some(app.element().clone())
        } else {
            Some(launcher.element().clone())
        }
    }

    fn on_active_done(&mut self, token: u16) {
        let Some(record) = self.abilities.get_mut(token) else {
            debug!(token, "active confirmation for evicted record");
            return;
        };
        record.set_state(LifecycleState::Active);
        if token != LAUNCHER_TOKEN {
            return;
        }

        let Some(app_token) = self.stack.top_app() else {
            return;
        };
        let Some(app) = self.abilities.get(app_token) else {
            return;
        };
        if app.state() == LifecycleState::Background {
            if app.terminated() {
                // Graceful shutdown continues now that the launcher is
                // back on screen.
                if let Err(e) = self.scheduler_lifecycle(app_token, LifecycleState::Uninitialized) {
                    warn!(token = app_token, error = %e, "destroy request not delivered");
                }
            }
        } else {
            // The launcher took the foreground while the application still
            // held it: launcher-exit failure, evict the application.
            warn!(token = app_token, "launcher returned over a live foreground app, evicting it");
            if self.stack.top() == Some(app_token) {
                self.stack.pop();
            }
            self.release_record(app_token);
        }
    }

    fn on_background_done(&mut self, token: u16) {
        let Some(record) = self.abilities.get_mut(token) else {
            debug!(token, "background confirmation for evicted record");
            return;
        };
        record.set_state(LifecycleState::Background);

        if token == LAUNCHER_TOKEN {
            if let Some(app_token) = self.stack.top_app() {
                if self.config.clean_ability_data && !self.launcher_data_cleaned {
                    if let Some(launcher) = self.abilities.get_mut(LAUNCHER_TOKEN) {
                        launcher.set_app_data(None);
                    }
                    self.launcher_data_cleaned = true;
                }
                if let Err(e) = self.scheduler_lifecycle(app_token, LifecycleState::Active) {
                    warn!(token = app_token, error = %e, "activation not delivered");
                }
            }
        } else if let Err(e) = self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Active) {
            // An application left the foreground; the launcher takes over.
            warn!(error = %e, "launcher re-activation failed");
        }
    }

    fn on_destroy_done(&mut self, token: u16) {
        if !self.abilities.contains(token) {
            debug!(token, "destroy confirmation for evicted record");
            return;
        }

        if self.stack.top() == Some(token) {
            self.stack.pop();
            self.release_record(token);
            if let Some(pending) = self.pending_token.take() {
                info!(token = pending, "launching pending ability");
                if let Err(e) = self.create_app_task(pending) {
                    warn!(token = pending, error = %e, "pending launch failed");
                    if self.stack.top() == Some(pending) {
                        self.stack.pop();
                    }
                    self.release_record(pending);
                    self.activate_launcher_if_idle();
                }
            }
        } else {
            self.release_record(token);
        }
    }

    /// Requests a transition. Launcher transitions run the native callbacks
    /// and confirm synchronously; application transitions are enqueued on
    /// the app's own queue.
    fn scheduler_lifecycle(&mut self, token: u16, target: LifecycleState) -> Result<(), AmsError> {
        if token == LAUNCHER_TOKEN {
            return self.scheduler_launcher_lifecycle(target);
        }

        let record = self
            .abilities
            .get(token)
            .ok_or_else(|| AmsError::ParamCheck(format!("unknown token {token}")))?;
        let command = match target {
            LifecycleState::Active => AppMessage::Active,
            LifecycleState::Background => AppMessage::Background,
            LifecycleState::Uninitialized => AppMessage::Destroy,
            LifecycleState::Initial | LifecycleState::Inactive => {
                return Err(AmsError::ParamCheck(format!(
                    "{target:?} cannot be requested"
                )));
            },
        };
        let task = record
            .task()
            .ok_or_else(|| AmsError::ParamCheck(format!("token {token} has no task")))?;
        task.try_command(command).map_err(|_| {
            AmsError::SchedulerLifecycle(format!("queue for token {token} is full or closed"))
        })
    }

    fn scheduler_launcher_lifecycle(&mut self, target: LifecycleState) -> Result<(), AmsError> {
        let record = self
            .abilities
            .get(LAUNCHER_TOKEN)
            .ok_or_else(|| AmsError::ParamCheck("launcher record missing".into()))?;
        let want = Want {
            element: Some(record.element().clone()),
            data: record.app_data().map(<[u8]>::to_vec),
        };
        match target {
            LifecycleState::Active => {
                self.launcher.on_active(&want)?;
                self.on_active_done(LAUNCHER_TOKEN);
                Ok(())
            },
            LifecycleState::Background => {
                self.launcher.on_background()?;
                self.on_background_done(LAUNCHER_TOKEN);
                Ok(())
            },
            _ => Err(AmsError::ParamCheck(format!(
                "launcher cannot enter {target:?}"
            ))),
        }
    }

    /// Spawns the host task for an admitted record, pushes it onto the
    /// stack, and asks the launcher to step aside.
    fn create_app_task(&mut self, token: u16) -> Result<(), AmsError> {
        let app_queue_depth = self.config.app_queue_depth;
        let handle = self.handle.clone();
        let runtimes = Arc::clone(&self.runtimes);
        let record = self
            .abilities
            .get_mut(token)
            .ok_or_else(|| AmsError::CreateAppTask(format!("no record for token {token}")))?;

        let (tx, rx) = mpsc::channel(app_queue_depth);
        let spec = AppSpec {
            token,
            element: record.element().clone(),
            src_path: record.src_path().to_string(),
            data: record.app_data().map(<[u8]>::to_vec),
        };
        let host = JsAppHost::new(spec, rx, handle, runtimes);
        let join = tokio::spawn(host.run());
        record.attach_task(AppTaskHandle::new(tx, join));
        record.set_state(LifecycleState::Inactive);
        self.stack.push(token);
        debug!(token, "application task created");

        self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Background)
    }

    /// Synchronously releases a record's task, queue, and host.
    fn release_record(&mut self, token: u16) {
        if let Some(mut record) = self.abilities.remove(token) {
            if let Some(task) = record.detach_task() {
                task.abort();
            }
            debug!(token, bundle = %record.bundle_name(), "record released");
        }
    }

    /// Re-activates the launcher when nothing else can hold the foreground.
    /// A live application on the stack keeps ownership of the hand-off: its
    /// own completions bring the launcher back.
    fn activate_launcher_if_idle(&mut self) {
        if self.stack.top_app().is_some() {
            return;
        }
        let launcher_active = self
            .abilities
            .get(LAUNCHER_TOKEN)
            .is_some_and(|l| l.state() == LifecycleState::Active);
        if !launcher_active {
            if let Err(e) = self.scheduler_lifecycle(LAUNCHER_TOKEN, LifecycleState::Active) {
                warn!(error = %e, "launcher re-activation failed");
            }
        }
    }

    // Test-only inspection helpers.

    #[cfg(test)]
    pub(crate) fn boot_for_tests(&mut self) {
        self.boot_launcher();
    }

    #[cfg(test)]
    pub(crate) const fn abilities(&self) -> &AbilityList {
        &self.abilities
    }

    #[cfg(test)]
    pub(crate) const fn stack(&self) -> &AbilityStack {
        &self.stack
    }

    #[cfg(test)]
    pub(crate) const fn pending_token(&self) -> Option<u16> {
        self.pending_token
    }
}
