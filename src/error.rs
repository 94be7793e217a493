use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive] // Allows adding more variants later without breaking change
pub enum ZmqError {
  // --- Argument Errors ---
  #[error("Invalid argument provided: {0}")]
  InvalidArgument(String), // EINVAL

  // --- Timeouts ---
  /// Returned by `ControlChannel::poll` when nothing arrived within the wait.
  #[error("Operation timed out")]
  Timeout, // ETIMEDOUT / EAGAIN on a bounded poll

  // --- Connection/Binding Errors ---
  #[error("Address already in use: {0}")]
  AddrInUse(String), // EADDRINUSE
  #[error("Connection refused by peer: {0}")]
  ConnectionRefused(String), // ECONNREFUSED
  #[error("Connection closed by peer or transport")]
  ConnectionClosed,

  // --- Endpoint Errors ---
  #[error("Invalid endpoint format: {0}")]
  InvalidEndpoint(String),

  // --- State Errors ---
  #[error("Operation is invalid for the current state: {0}")]
  InvalidState(&'static str), // EFSM / ETERM

  // --- Unsupported ---
  #[error("Transport scheme not supported or enabled: {0}")]
  UnsupportedTransport(String), // EPROTONOSUPPORT
}

impl ZmqError {
  /// True when a bounded poll saw no data. The run loop idles instead of stopping.
  pub fn is_timeout(&self) -> bool {
    matches!(self, ZmqError::Timeout)
  }
}
