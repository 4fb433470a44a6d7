//! Status-code taxonomy and error types.
//!
//! All orchestrator operations are local, synchronous, and return a status
//! to the immediate caller; nothing is thrown. Over the wire a status is an
//! `i32`: `0` for success, a negative code from [`ErrorCode`] otherwise.

use serde::{Deserialize, Serialize};

/// Wire status for a successful operation.
pub const STATUS_OK: i32 = 0;

/// Status codes carried in IPC replies.
///
/// The numeric values are part of the wire contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Operation invalid for the current state (e.g. terminating a token
    /// that is not the foreground ability).
    ParamCheck,
    /// A required field is missing (null want, empty bundle name).
    ParamNull,
    /// Allocation failure.
    MemoryAlloc,
    /// Application task creation failed.
    CreateAppTask,
    /// A requested lifecycle transition could not be delivered.
    SchedulerLifecycle,
    /// Malformed or undeliverable IPC request.
    Ipc,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// Wire representation of this code.
    #[must_use]
    pub const fn as_status(self) -> i32 {
        match self {
            Self::ParamCheck => -1,
            Self::ParamNull => -2,
            Self::MemoryAlloc => -3,
            Self::CreateAppTask => -4,
            Self::SchedulerLifecycle => -5,
            Self::Ipc => -6,
            Self::Internal => -7,
        }
    }

    /// Decodes a wire status into a code. Non-negative statuses and unknown
    /// values yield `None`.
    #[must_use]
    pub const fn from_status(status: i32) -> Option<Self> {
        match status {
            -1 => Some(Self::ParamCheck),
            -2 => Some(Self::ParamNull),
            -3 => Some(Self::MemoryAlloc),
            -4 => Some(Self::CreateAppTask),
            -5 => Some(Self::SchedulerLifecycle),
            -6 => Some(Self::Ipc),
            -7 => Some(Self::Internal),
            _ => None,
        }
    }
}

/// Errors returned by the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum AmsError {
    /// A required parameter is missing.
    #[error("required parameter is missing: {0}")]
    ParamNull(&'static str),

    /// The operation is invalid for the current state.
    #[error("operation invalid for current state: {0}")]
    ParamCheck(String),

    /// The application task could not be created.
    #[error("failed to create application task: {0}")]
    CreateAppTask(String),

    /// A lifecycle transition could not be delivered to its target.
    #[error("lifecycle transition could not be delivered: {0}")]
    SchedulerLifecycle(String),

    /// The manager inbox rejected the request.
    #[error("manager unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AmsError {
    /// Maps this error onto its wire status code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ParamNull(_) => ErrorCode::ParamNull,
            Self::ParamCheck(_) => ErrorCode::ParamCheck,
            Self::CreateAppTask(_) => ErrorCode::CreateAppTask,
            Self::SchedulerLifecycle(_) => ErrorCode::SchedulerLifecycle,
            Self::ServiceUnavailable(_) => ErrorCode::Internal,
        }
    }

    /// Wire status for this error.
    #[must_use]
    pub const fn as_status(&self) -> i32 {
        self.code().as_status()
    }
}
