// src/context.rs

use crate::error::ZmqError;
use crate::socket::events::{EventMask, EventPublisher, RecordReceiver, DEFAULT_MONITOR_CAPACITY};
use crate::socket::PairSocket;
use crate::transport::{parse_endpoint, Endpoint};

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Information stored in the inproc registry for a bound monitor endpoint.
#[derive(Debug)]
pub(crate) struct InprocBinding {
  /// Identifies this particular bind, so a late disconnect never hands a queue
  /// to a newer binding that reused the name.
  pub(crate) binding_id: usize,
  /// Receiving half of the record queue. `None` while a pair socket holds it.
  pub(crate) receiver: Option<RecordReceiver>,
}

/// Holds the internal state shared by multiple `Context` handles.
#[derive(Debug)]
pub(crate) struct ContextInner {
  /// Source for unique handle IDs for sockets and bindings.
  next_handle: AtomicUsize,
  /// Registry for in-process bindings. Key is the inproc name (without scheme).
  inproc_registry: parking_lot::Mutex<HashMap<String, InprocBinding>>,
  /// Set once `term()` runs. New sockets and bindings are refused afterwards.
  shutdown_initiated: AtomicBool,
  monitor_capacity: usize,
}

impl ContextInner {
  fn new(monitor_capacity: usize) -> Self {
    Self {
      next_handle: AtomicUsize::new(1), // Start handle IDs from 1.
      inproc_registry: parking_lot::Mutex::new(HashMap::new()),
      shutdown_initiated: AtomicBool::new(false),
      monitor_capacity,
    }
  }

  /// Generates the next unique handle ID using an atomic counter.
  pub(crate) fn next_handle(&self) -> usize {
    self.next_handle.fetch_add(1, Ordering::Relaxed)
  }

  pub(crate) fn is_terminated(&self) -> bool {
    self.shutdown_initiated.load(Ordering::Acquire)
  }

  pub(crate) fn monitor_capacity(&self) -> usize {
    self.monitor_capacity
  }

  /// Registers an in-process binding for a publisher.
  pub(crate) fn register_inproc(&self, name: &str, binding_id: usize, receiver: RecordReceiver) -> Result<(), ZmqError> {
    let mut registry = self.inproc_registry.lock();
    if registry.contains_key(name) {
      return Err(ZmqError::AddrInUse(format!("inproc://{}", name)));
    }
    tracing::debug!(inproc_name = %name, binding_id, "Registering inproc binding");
    registry.insert(
      name.to_string(),
      InprocBinding {
        binding_id,
        receiver: Some(receiver),
      },
    );
    Ok(())
  }

  /// Unregisters an in-process binding, if it is still the one identified by `binding_id`.
  pub(crate) fn unregister_inproc(&self, name: &str, binding_id: usize) {
    let mut registry = self.inproc_registry.lock();
    if registry.get(name).is_some_and(|b| b.binding_id == binding_id) {
      registry.remove(name);
      tracing::debug!(inproc_name = %name, binding_id, "Unregistered inproc binding");
    }
  }

  /// Hands the record queue of a binding to a connecting pair socket.
  ///
  /// A pair endpoint serves a single peer, so the queue is taken out of the
  /// registry until the peer disconnects.
  pub(crate) fn claim_inproc(&self, name: &str) -> Result<(usize, RecordReceiver), ZmqError> {
    let mut registry = self.inproc_registry.lock();
    let binding = registry
      .get_mut(name)
      .ok_or_else(|| ZmqError::ConnectionRefused(format!("inproc://{}", name)))?;
    match binding.receiver.take() {
      Some(receiver) => Ok((binding.binding_id, receiver)),
      None => Err(ZmqError::AddrInUse(format!("inproc://{}", name))),
    }
  }

  /// Returns a queue claimed by `claim_inproc`. Dropped if the binding is gone.
  pub(crate) fn release_inproc(&self, name: &str, binding_id: usize, receiver: RecordReceiver) {
    let mut registry = self.inproc_registry.lock();
    match registry.get_mut(name) {
      Some(binding) if binding.binding_id == binding_id => {
        binding.receiver = Some(receiver);
        tracing::trace!(inproc_name = %name, binding_id, "Inproc queue returned to binding");
      }
      _ => {
        tracing::trace!(inproc_name = %name, binding_id, "Binding gone, dropping released queue");
      }
    }
  }

  /// Marks the context terminated and drops every registered binding.
  fn shutdown(&self) {
    if self
      .shutdown_initiated
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_ok()
    {
      let mut registry = self.inproc_registry.lock();
      tracing::info!(bindings = registry.len(), "Context shutdown initiated.");
      registry.clear();
    } else {
      tracing::debug!("Context shutdown already initiated.");
    }
  }
}

/// A handle to an rzmq_monitor context, owning the inproc endpoint registry.
/// `Context` handles are cloneable (`Arc`-based).
#[derive(Clone)]
pub struct Context {
  inner: Arc<ContextInner>,
}

impl Context {
  /// Creates a new, independent context.
  pub fn new() -> Result<Self, ZmqError> {
    Self::with_capacity(None)
  }

  /// Creates a new, independent context.
  ///
  /// # Arguments
  /// * `monitor_capacity`: Optionally, the bounded capacity of each monitor record
  ///   queue. If `None`, `DEFAULT_MONITOR_CAPACITY` is used. Minimum capacity is 1.
  pub fn with_capacity(monitor_capacity: Option<usize>) -> Result<Self, ZmqError> {
    let capacity = monitor_capacity.map(|c| c.max(1)).unwrap_or(DEFAULT_MONITOR_CAPACITY);
    tracing::debug!(monitor_capacity = capacity, "Creating new rzmq_monitor Context");
    Ok(Self {
      inner: Arc::new(ContextInner::new(capacity)),
    })
  }

  /// Creates the control-channel socket a monitor reads records from.
  pub fn pair_socket(&self) -> Result<PairSocket, ZmqError> {
    if self.inner.is_terminated() {
      return Err(ZmqError::InvalidState("Context is terminated"));
    }
    let handle = self.inner.next_handle();
    tracing::debug!(socket_handle = handle, "Created pair socket");
    Ok(PairSocket::new(self.clone(), handle))
  }

  /// Starts publishing monitor records for a socket on `endpoint`.
  ///
  /// This is the producer side: the monitored socket reports its transitions
  /// through the returned publisher, filtered by `events`.
  pub fn socket_monitor(&self, endpoint: &str, events: EventMask) -> Result<EventPublisher, ZmqError> {
    if self.inner.is_terminated() {
      return Err(ZmqError::InvalidState("Context is terminated"));
    }
    let Endpoint::Inproc(name) = parse_endpoint(endpoint)?;
    let binding_id = self.inner.next_handle();
    let (tx, rx) = async_channel::bounded(self.inner.monitor_capacity());
    self.inner.register_inproc(&name, binding_id, rx)?;
    Ok(EventPublisher::new(self.clone(), name, binding_id, tx, events))
  }

  /// Terminates the context. Registered bindings are dropped and no new
  /// sockets or publishers can be created. Idempotent.
  pub fn term(&self) {
    self.inner.shutdown();
  }

  pub fn is_terminated(&self) -> bool {
    self.inner.is_terminated()
  }

  pub(crate) fn inner(&self) -> &ContextInner {
    &self.inner
  }
}

impl fmt::Debug for Context {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Context")
      .field("terminated", &self.inner.is_terminated())
      .field("monitor_capacity", &self.inner.monitor_capacity)
      .finish()
  }
}
