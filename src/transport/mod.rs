// src/transport/mod.rs

//! Endpoint parsing for the transports a control channel can attach to.

pub(crate) mod endpoint;

pub(crate) use endpoint::{parse_endpoint, Endpoint};
