//! Stock native launcher.
//!
//! The real launcher UI is a separate component; the daemon ships a headless
//! implementation that honors the lifecycle contract (synchronous callbacks,
//! fallible show/hide) and records transitions to the log. Deployments with
//! a display replace this through the [`NativeAbility`] seam.

use ams_core::service::NativeAbility;
use ams_core::{AmsError, Want};
use tracing::{debug, info};

/// Headless launcher that logs its lifecycle transitions.
#[derive(Debug, Default)]
pub struct HeadlessLauncher {
    started: bool,
}

impl HeadlessLauncher {
    /// Creates a launcher that has not started yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl NativeAbility for HeadlessLauncher {
    fn on_start(&mut self, want: &Want) {
        self.started = true;
        info!(target = ?want.element, "launcher started");
    }

    fn on_active(&mut self, want: &Want) -> Result<(), AmsError> {
        if !self.started {
            return Err(AmsError::SchedulerLifecycle(
                "launcher activated before start".into(),
            ));
        }
        let payload = want.data.as_ref().map_or(0, Vec::len);
        info!(payload_bytes = payload, "launcher foreground");
        Ok(())
    }

    fn on_background(&mut self) -> Result<(), AmsError> {
        debug!("launcher background");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ams_core::ElementName;

    use super::*;

    #[test]
    fn test_active_before_start_is_rejected() {
        let mut launcher = HeadlessLauncher::new();
        let want = Want::new(ElementName::new("launcher", ""));
        assert!(launcher.on_active(&want).is_err());

        launcher.on_start(&want);
        assert!(launcher.on_active(&want).is_ok());
        assert!(launcher.on_background().is_ok());
    }
}
