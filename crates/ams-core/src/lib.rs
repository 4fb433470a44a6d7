//! ams-core - Ability Lifecycle Manager Core
//!
//! This library implements the ability lifecycle manager for a
//! single-app-at-a-time embedded device: a permanently resident native
//! launcher plus at most one foreground application, each driven through a
//! strict lifecycle state machine by asynchronous message passing.
//!
//! # Runtime Requirements
//!
//! The manager runs as one tokio worker task that exclusively owns all
//! mutable state ([`service::AbilityService`]); every other task reaches it
//! only through bounded message queues. Spawning application hosts requires
//! a tokio runtime context, so embedders must drive the service from inside
//! a runtime (the `ams-daemon` binary configures a multi-threaded runtime).
//!
//! # Modules
//!
//! - [`apphost`]: Per-application message loop translating lifecycle
//!   commands into runtime calls
//! - [`bundle`]: Installed-bundle lookup (`QueryAbilityInfo` collaborator)
//! - [`client`]: Client-side proxy with bounded-retry manager discovery
//! - [`config`]: Manager configuration
//! - [`error`]: Status-code taxonomy and error types
//! - [`ipc`]: Fixed-layout request record codec and frame helpers
//! - [`list`]: Token-to-record ownership map
//! - [`record`]: Per-ability record and lifecycle states
//! - [`service`]: The orchestrator state machine and its worker loop
//! - [`stack`]: Foreground ordering stack
//! - [`token`]: 16-bit identity allocation with wraparound
//! - [`want`]: Launch-intent carrier (`Want`, `ElementName`)

pub mod apphost;
pub mod bundle;
pub mod client;
pub mod config;
pub mod error;
pub mod ipc;
pub mod list;
pub mod record;
pub mod service;
pub mod stack;
pub mod token;
pub mod want;

pub use error::{AmsError, ErrorCode, STATUS_OK};
pub use record::{AbilityRecord, LifecycleState, LAUNCHER_TOKEN};
pub use want::{ElementName, Want};
