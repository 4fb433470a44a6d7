//! Per-ability record and lifecycle states.

use crate::apphost::AppTaskHandle;
use crate::want::ElementName;

/// Token reserved for the permanently resident launcher ability.
pub const LAUNCHER_TOKEN: u16 = 0;

/// Confirmed lifecycle state of one ability.
///
/// The numeric values are the wire representation (byte 1 of the
/// transaction-done `msgValue`) and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    /// Not running (STOPPED).
    Uninitialized = 0,
    /// Created but never scheduled. Only transient; no record rests here.
    Initial = 1,
    /// Task exists, ability not yet shown.
    Inactive = 2,
    /// Visible foreground ability.
    Active = 3,
    /// Hidden but still alive.
    Background = 4,
}

impl LifecycleState {
    /// Decodes a wire byte. Unknown values yield `None`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Initial),
            2 => Some(Self::Inactive),
            3 => Some(Self::Active),
            4 => Some(Self::Background),
            _ => None,
        }
    }
}

/// One ability instance: the permanent launcher record or a transient
/// application record.
///
/// Records are exclusively owned by [`crate::list::AbilityList`] and mutated
/// only by the manager's worker task.
#[derive(Debug)]
pub struct AbilityRecord {
    element: ElementName,
    src_path: String,
    app_data: Option<Vec<u8>>,
    state: LifecycleState,
    token: u16,
    terminated: bool,
    task: Option<AppTaskHandle>,
}

impl AbilityRecord {
    /// Creates the launcher record. It holds [`LAUNCHER_TOKEN`] and never
    /// owns a task or launch path.
    #[must_use]
    pub fn new_launcher(bundle_name: impl Into<String>) -> Self {
        Self {
            element: ElementName::new(bundle_name, ""),
            src_path: String::new(),
            app_data: None,
            state: LifecycleState::Uninitialized,
            token: LAUNCHER_TOKEN,
            terminated: false,
            task: None,
        }
    }

    /// Creates an application record with the given identity token.
    #[must_use]
    pub fn new_app(element: ElementName, src_path: impl Into<String>, token: u16) -> Self {
        Self {
            element,
            src_path: src_path.into(),
            app_data: None,
            state: LifecycleState::Uninitialized,
            token,
            terminated: false,
            task: None,
        }
    }

    /// Target identity of this ability.
    #[must_use]
    pub const fn element(&self) -> &ElementName {
        &self.element
    }

    /// Owning bundle identifier.
    #[must_use]
    pub fn bundle_name(&self) -> &str {
        &self.element.bundle_name
    }

    /// Launch artifact path (empty for the launcher).
    #[must_use]
    pub fn src_path(&self) -> &str {
        &self.src_path
    }

    /// Opaque launch payload.
    #[must_use]
    pub fn app_data(&self) -> Option<&[u8]> {
        self.app_data.as_deref()
    }

    /// Replaces the launch payload.
    pub fn set_app_data(&mut self, data: Option<Vec<u8>>) {
        self.app_data = data;
    }

    /// Confirmed lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Stores a confirmed lifecycle state.
    pub fn set_state(&mut self, state: LifecycleState) {
        self.state = state;
    }

    /// Identity token (`0` for the launcher).
    #[must_use]
    pub const fn token(&self) -> u16 {
        self.token
    }

    /// Whether this is the launcher record.
    #[must_use]
    pub const fn is_launcher(&self) -> bool {
        self.token == LAUNCHER_TOKEN
    }

    /// Sticky terminate flag, consulted by completion handlers.
    #[must_use]
    pub const fn terminated(&self) -> bool {
        self.terminated
    }

    /// Marks termination as requested. The flag never clears.
    pub fn mark_terminated(&mut self) {
        self.terminated = true;
    }

    /// Task and queue driving this ability, absent for the launcher.
    #[must_use]
    pub const fn task(&self) -> Option<&AppTaskHandle> {
        self.task.as_ref()
    }

    /// Attaches the task handle created for this ability.
    pub fn attach_task(&mut self, task: AppTaskHandle) {
        self.task = Some(task);
    }

    /// Detaches the task handle for teardown.
    pub fn detach_task(&mut self) -> Option<AppTaskHandle> {
        self.task.take()
    }
}
