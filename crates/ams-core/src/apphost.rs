//! Per-application message loop.
//!
//! Every running application gets one host task owning a private bounded
//! queue. The host translates inbound lifecycle commands into calls against
//! the (out-of-scope) JS ability runtime and reports each completion back to
//! the manager. After a destroy command is dispatched the loop returns and
//! the task ends; no further messages are processed.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::record::LifecycleState;
use crate::service::AmsHandle;
use crate::want::ElementName;

/// Deferred work executed on the application's own task.
pub type AsyncWork = Box<dyn FnOnce() + Send>;

/// Commands accepted by an application host.
pub enum AppMessage {
    /// Show the ability (lazily launching the runtime first).
    Active,
    /// Hide the ability.
    Background,
    /// Tear the runtime down and end the task.
    Destroy,
    /// Forward a back-key press.
    BackPressed,
    /// Run deferred work on the application task.
    AsyncWork(AsyncWork),
    /// Periodic render tick.
    RenderTick,
}

impl std::fmt::Debug for AppMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Background => "Background",
            Self::Destroy => "Destroy",
            Self::BackPressed => "BackPressed",
            Self::AsyncWork(_) => "AsyncWork",
            Self::RenderTick => "RenderTick",
        };
        f.write_str(name)
    }
}

/// Everything a host needs to launch its application.
#[derive(Debug, Clone)]
pub struct AppSpec {
    /// Identity token of the record this host drives.
    pub token: u16,
    /// Target identity.
    pub element: ElementName,
    /// Launch artifact path.
    pub src_path: String,
    /// Opaque launch payload.
    pub data: Option<Vec<u8>>,
}

/// The JS ability runtime consumed by a host.
///
/// The engine behind these calls is an external collaborator; the host only
/// needs opaque show/hide/tick/destroy operations.
pub trait JsRuntime: Send + Sync {
    /// Makes the ability visible.
    fn show(&mut self);
    /// Hides the ability.
    fn hide(&mut self);
    /// Drives one render tick.
    fn handle_render_tick(&mut self);
    /// Forwards a back-key press.
    fn back_pressed(&mut self);
    /// Tears the ability down.
    fn destroy(&mut self);
}

/// Launches runtimes for application hosts.
pub trait JsRuntimeFactory: Send + Sync {
    /// Launches the runtime for an application.
    fn launch(&self, spec: &AppSpec) -> Box<dyn JsRuntime>;
}

/// Task and queue driving one application, held by its record.
///
/// Created and destroyed only by the manager; the application itself never
/// touches these handles.
#[derive(Debug)]
pub struct AppTaskHandle {
    sender: mpsc::Sender<AppMessage>,
    join: JoinHandle<()>,
}

impl AppTaskHandle {
    /// Wraps a spawned host task.
    #[must_use]
    pub const fn new(sender: mpsc::Sender<AppMessage>, join: JoinHandle<()>) -> Self {
        Self { sender, join }
    }

    /// Enqueues a command without waiting; fails when the queue is full or
    /// the host has exited.
    ///
    /// # Errors
    ///
    /// Returns the rejected command.
    pub fn try_command(
        &self,
        command: AppMessage,
    ) -> Result<(), mpsc::error::TrySendError<AppMessage>> {
        self.sender.try_send(command)
    }

    /// Forcefully ends the host task. Accepted resource-leak risk when the
    /// task is mid-message.
    pub fn abort(&self) {
        self.join.abort();
    }
}

/// Message loop driving one application's lifecycle.
pub struct JsAppHost {
    spec: AppSpec,
    inbox: mpsc::Receiver<AppMessage>,
    manager: AmsHandle,
    factory: Arc<dyn JsRuntimeFactory>,
    runtime: Option<Box<dyn JsRuntime>>,
    backgrounded: bool,
}

impl JsAppHost {
    /// Creates a host for the given application.
    #[must_use]
    pub fn new(
        spec: AppSpec,
        inbox: mpsc::Receiver<AppMessage>,
        manager: AmsHandle,
        factory: Arc<dyn JsRuntimeFactory>,
    ) -> Self {
        Self {
            spec,
            inbox,
            manager,
            factory,
            runtime: None,
            backgrounded: false,
        }
    }

    /// Runs the blocking receive loop until destroy or queue teardown.
    pub async fn run(mut self) {
        debug!(token = self.spec.token, bundle = %self.spec.element.bundle_name, "app host started");
        while let Some(message) = self.inbox.recv().await {
            trace!(token = self.spec.token, ?message, "app host command");
            match message {
                AppMessage::Active => {
                    let runtime = self
                        .runtime
                        .get_or_insert_with(|| self.factory.launch(&self.spec));
                    runtime.show();
                    self.backgrounded = false;
                    self.report(LifecycleState::Active).await;
                },
                AppMessage::Background => {
                    if let Some(runtime) = self.runtime.as_mut() {
                        runtime.hide();
                    }
                    self.backgrounded = true;
                    self.report(LifecycleState::Background).await;
                },
                AppMessage::Destroy => {
                    if let Some(mut runtime) = self.runtime.take() {
                        if !self.backgrounded {
                            // Flush the last frame before teardown.
                            runtime.handle_render_tick();
                        }
                        runtime.destroy();
                    }
                    self.report(LifecycleState::Uninitialized).await;
                    break;
                },
                AppMessage::BackPressed => {
                    if let Some(runtime) = self.runtime.as_mut() {
                        runtime.back_pressed();
                    }
                },
                AppMessage::AsyncWork(work) => work(),
                AppMessage::RenderTick => {
                    if let Some(runtime) = self.runtime.as_mut() {
                        runtime.handle_render_tick();
                    }
                },
            }
        }
        debug!(token = self.spec.token, "app host exited");
    }

    async fn report(&self, state: LifecycleState) {
        if let Err(e) = self.manager.lifecycle_done(self.spec.token, state).await {
            // Manager going away during shutdown is the only expected cause.
            warn!(token = self.spec.token, error = %e, "lifecycle completion not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::service::ServiceRequest;

    #[derive(Default)]
    struct RecordingRuntime {
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl JsRuntime for RecordingRuntime {
        fn show(&mut self) {
            self.events.lock().unwrap().push("show");
        }
        fn hide(&mut self) {
            self.events.lock().unwrap().push("hide");
        }
        fn handle_render_tick(&mut self) {
            self.events.lock().unwrap().push("tick");
        }
        fn back_pressed(&mut self) {
            self.events.lock().unwrap().push("back");
        }
        fn destroy(&mut self) {
            self.events.lock().unwrap().push("destroy");
        }
    }

    struct RecordingFactory {
        launches: AtomicUsize,
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl JsRuntimeFactory for RecordingFactory {
        fn launch(&self, _spec: &AppSpec) -> Box<dyn JsRuntime> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Box::new(RecordingRuntime {
                events: Arc::clone(&self.events),
            })
        }
    }

    struct Harness {
        commands: mpsc::Sender<AppMessage>,
        completions: mpsc::Receiver<ServiceRequest>,
        events: Arc<Mutex<Vec<&'static str>>>,
        factory: Arc<RecordingFactory>,
        join: JoinHandle<()>,
    }

    fn spawn_host() -> Harness {
        let events = Arc::new(Mutex::new(Vec::new()));
        let factory = Arc::new(RecordingFactory {
            launches: AtomicUsize::new(0),
            events: Arc::clone(&events),
        });
        let (command_tx, command_rx) = mpsc::channel(8);
        let (manager, completions) = AmsHandle::for_tests(8);
        let spec = AppSpec {
            token: 3,
            element: ElementName::new("com.example.music", "Main"),
            src_path: "/apps/music".into(),
            data: None,
        };
        let host = JsAppHost::new(
            spec,
            command_rx,
            manager,
            Arc::clone(&factory) as Arc<dyn JsRuntimeFactory>,
        );
        let join = tokio::spawn(host.run());
        Harness {
            commands: command_tx,
            completions,
            events,
            factory,
            join,
        }
    }

    async fn next_completion(harness: &mut Harness) -> (u16, LifecycleState) {
        let request = timeout(Duration::from_secs(1), harness.completions.recv())
            .await
            .expect("completion timed out")
            .expect("manager channel closed");
        match request {
            ServiceRequest::LifecycleDone { token, state } => (token, state),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_active_launches_lazily_and_reports() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Active).await.unwrap();
        assert_eq!(
            next_completion(&mut harness).await,
            (3, LifecycleState::Active)
        );
        assert_eq!(harness.factory.launches.load(Ordering::SeqCst), 1);

        // A second activation reuses the runtime.
        harness.commands.send(AppMessage::Active).await.unwrap();
        next_completion(&mut harness).await;
        assert_eq!(harness.factory.launches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_background_hides_and_reports() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Active).await.unwrap();
        next_completion(&mut harness).await;
        harness.commands.send(AppMessage::Background).await.unwrap();
        assert_eq!(
            next_completion(&mut harness).await,
            (3, LifecycleState::Background)
        );
        assert_eq!(
            harness.events.lock().unwrap().as_slice(),
            ["show", "hide"]
        );
    }

    #[tokio::test]
    async fn test_destroy_from_foreground_flushes_one_tick() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Active).await.unwrap();
        next_completion(&mut harness).await;
        harness.commands.send(AppMessage::Destroy).await.unwrap();
        assert_eq!(
            next_completion(&mut harness).await,
            (3, LifecycleState::Uninitialized)
        );
        assert_eq!(
            harness.events.lock().unwrap().as_slice(),
            ["show", "tick", "destroy"]
        );

        // The loop terminates: no message is processed after destroy.
        timeout(Duration::from_secs(1), harness.join)
            .await
            .expect("host task did not exit")
            .unwrap();
    }

    #[tokio::test]
    async fn test_destroy_from_background_skips_flush() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Active).await.unwrap();
        next_completion(&mut harness).await;
        harness.commands.send(AppMessage::Background).await.unwrap();
        next_completion(&mut harness).await;
        harness.commands.send(AppMessage::Destroy).await.unwrap();
        next_completion(&mut harness).await;

        assert_eq!(
            harness.events.lock().unwrap().as_slice(),
            ["show", "hide", "destroy"]
        );
    }

    #[tokio::test]
    async fn test_back_pressed_and_async_work() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Active).await.unwrap();
        next_completion(&mut harness).await;

        harness.commands.send(AppMessage::BackPressed).await.unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = Arc::clone(&ran);
        harness
            .commands
            .send(AppMessage::AsyncWork(Box::new(move || {
                ran_clone.fetch_add(1, Ordering::SeqCst);
            })))
            .await
            .unwrap();
        harness.commands.send(AppMessage::RenderTick).await.unwrap();

        // Destroy drains the queue in order, so completion here proves the
        // earlier commands ran.
        harness.commands.send(AppMessage::Destroy).await.unwrap();
        next_completion(&mut harness).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(
            harness.events.lock().unwrap().as_slice(),
            ["show", "back", "tick", "tick", "destroy"]
        );
    }

    #[tokio::test]
    async fn test_destroy_without_runtime_still_reports() {
        let mut harness = spawn_host();

        harness.commands.send(AppMessage::Destroy).await.unwrap();
        assert_eq!(
            next_completion(&mut harness).await,
            (3, LifecycleState::Uninitialized)
        );
        assert_eq!(harness.factory.launches.load(Ordering::SeqCst), 0);
    }
}
