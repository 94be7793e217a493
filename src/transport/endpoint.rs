// src/transport/endpoint.rs

use crate::error::ZmqError;

/// Represents a parsed and validated control endpoint address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Endpoint {
  /// In-process endpoint. Stores the name without the `inproc://` prefix.
  Inproc(String),
}

/// Parses an endpoint string into a structured Endpoint enum.
///
/// Only `inproc://` can carry monitor records here. Other well-formed ZeroMQ
/// schemes are recognised and rejected as unsupported.
pub(crate) fn parse_endpoint(endpoint_str: &str) -> Result<Endpoint, ZmqError> {
  let invalid_endpoint_err = || ZmqError::InvalidEndpoint(endpoint_str.to_string());

  let Some(separator_pos) = endpoint_str.find("://") else {
    return Err(invalid_endpoint_err());
  };
  let scheme = &endpoint_str[..separator_pos];
  let address_part = &endpoint_str[separator_pos + 3..];

  match scheme {
    "inproc" => {
      if address_part.is_empty() || address_part.contains('\0') {
        Err(invalid_endpoint_err())
      } else {
        Ok(Endpoint::Inproc(address_part.to_string()))
      }
    }
    "tcp" | "ipc" | "pgm" | "epgm" | "tipc" | "vmci" | "ws" | "wss" => {
      tracing::debug!(endpoint = endpoint_str, "Transport not available for control channels");
      Err(ZmqError::UnsupportedTransport(endpoint_str.to_string()))
    }
    _ => Err(invalid_endpoint_err()),
  }
}
