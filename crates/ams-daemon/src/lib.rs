//! ams-daemon - Ability Lifecycle Manager Daemon
//!
//! Library half of the daemon binary: the Unix-socket IPC front end plus the
//! stock launcher and application-runtime collaborators the binary wires
//! into [`ams_core::service::AbilityService`]. Kept as a library so
//! integration tests can assemble the same stack in-process.

pub mod launcher;
pub mod runtime;
pub mod server;
