use std::time::Duration;

use crate::ZmqError;

/// Upper bound on a single control-channel poll. Keeps the loop responsive to
/// `stop()` and cancellation; it is not a protocol timeout.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(64);

/// Pause after an empty poll before polling again.
pub const DEFAULT_IDLE_YIELD: Duration = Duration::from_millis(1);

/// Tuning for the monitor run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
  pub poll_interval: Duration,
  pub idle_yield: Duration,
}

impl Default for MonitorOptions {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
      idle_yield: DEFAULT_IDLE_YIELD,
    }
  }
}

impl MonitorOptions {
  /// Worst-case delay between `stop()` and the loop noticing it.
  pub fn stop_latency(&self) -> Duration {
    self.poll_interval + self.idle_yield
  }

  pub(crate) fn validate(&self) -> Result<(), ZmqError> {
    if self.poll_interval.is_zero() {
      return Err(ZmqError::InvalidArgument(
        "monitor poll interval must be greater than zero".into(),
      ));
    }
    Ok(())
  }
}
