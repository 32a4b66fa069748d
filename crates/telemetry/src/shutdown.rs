use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{ShutdownError, TelemetryError};

/// A teardown callback. Receives the deadline shared by the whole shutdown
/// pass and is expected to bound its own flush/close work by it.
pub type ShutdownFn = Box<dyn FnOnce(Duration) -> Result<(), TelemetryError> + Send>;

enum State {
    Active(Vec<(String, ShutdownFn)>),
    ShutDown,
}

/// Collects teardown callbacks during startup and runs them exactly once,
/// in registration order, when the process stops.
///
/// Shutdown never short-circuits: a failing callback does not prevent the
/// remaining ones from running, and every failure is folded into a single
/// [`ShutdownError`]. Repeat shutdown calls, including racing ones, are
/// no-ops returning success.
pub struct ShutdownCoordinator {
    state: Mutex<State>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Active(Vec::new())),
        }
    }

    /// Registers a named teardown callback. Valid only before `shutdown`
    /// has run.
    pub fn register(
        &self,
        name: impl Into<String>,
        callback: ShutdownFn,
    ) -> Result<(), TelemetryError> {
        match &mut *self.state.lock() {
            State::Active(callbacks) => {
                let name = name.into();
                debug!("Registered shutdown callback: {name}");
                callbacks.push((name, callback));
                Ok(())
            }
            State::ShutDown => Err(TelemetryError::AlreadyShutDown),
        }
    }

    /// Runs every registered callback in registration order, passing the
    /// same deadline to each, then clears the registry.
    ///
    /// The state flips under the lock before any callback runs, so a racing
    /// second call observes `ShutDown` and returns `Ok(())` immediately.
    pub fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        let callbacks = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::ShutDown) {
                State::Active(callbacks) => callbacks,
                State::ShutDown => return Ok(()),
            }
        };

        info!("Shutting down {} telemetry subsystem(s)", callbacks.len());
        let mut failures = Vec::new();
        for (name, callback) in callbacks {
            match callback(deadline) {
                Ok(()) => debug!("Shut down {name}"),
                Err(e) => failures.push((name, e.to_string())),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShutdownError { failures })
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
