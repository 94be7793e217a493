// src/monitor/mod.rs

//! The socket monitor: attaches to a control endpoint, decodes monitor records
//! and dispatches them to observers registered on a `MonitorBuilder`.
//!
//! `Monitor::run` only returns once the loop ends, so callers usually spawn it:
//!
//! ```no_run
//! # async fn demo() -> Result<(), rzmq_monitor::ZmqError> {
//! use rzmq_monitor::{Context, Monitor};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let ctx = Context::new()?;
//! let monitor = Arc::new(
//!   Monitor::builder("inproc://server.monitor")
//!     .on_connected(|args| println!("connected fd={} via {:?}", args.fd(), args.address()))
//!     .build(&ctx)?,
//! );
//! let token = CancellationToken::new();
//! let task = tokio::spawn({
//!   let monitor = monitor.clone();
//!   let token = token.clone();
//!   async move { monitor.run(token).await }
//! });
//! // ...
//! monitor.stop();
//! task.await.expect("monitor task panicked")?;
//! monitor.dispose().await;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod dispatch;
pub mod event;
pub mod options;

use crate::context::Context;
use crate::error::ZmqError;
use crate::socket::ControlChannel;
use crate::transport::parse_endpoint;

use args::{BaseEventArgs, EventArgs, FdEventArgs, IntervalEventArgs};
use dispatch::DispatchTable;
use event::{EventKind, EventRecord};
use options::MonitorOptions;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Flags shared between the run loop and every `StopHandle`.
#[derive(Debug, Default)]
struct RunState {
  running: AtomicBool,
  stop_requested: AtomicBool,
}

/// Cloneable handle that stops a monitor from any task or thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
  state: Arc<RunState>,
}

impl StopHandle {
  /// Requests the run loop to exit. Does not wait; the loop notices within one
  /// poll interval plus one idle yield.
  pub fn stop(&self) {
    self.state.stop_requested.store(true, Ordering::SeqCst);
    self.state.running.store(false, Ordering::SeqCst);
  }

  pub fn is_running(&self) -> bool {
    self.state.running.load(Ordering::SeqCst)
  }
}

/// Clears the running flag however the loop exits, including on observer panic
/// or when the `run` future is dropped.
struct RunningGuard<'a>(&'a RunState);

impl Drop for RunningGuard<'_> {
  fn drop(&mut self) {
    self.0.running.store(false, Ordering::SeqCst);
  }
}

/// Observes a socket's monitor feed and republishes it as typed callbacks.
pub struct Monitor {
  endpoint: String,
  options: MonitorOptions,
  table: DispatchTable,
  channel: tokio::sync::Mutex<Option<Box<dyn ControlChannel>>>,
  state: Arc<RunState>,
  started: AtomicBool,
  disposed: AtomicBool,
}

static_assertions::assert_impl_all!(Monitor: Send, Sync);

impl Monitor {
  /// Starts building a monitor for the control `endpoint`.
  pub fn builder(endpoint: impl Into<String>) -> MonitorBuilder {
    MonitorBuilder::new(endpoint.into())
  }

  /// Creates a monitor with no observers, reading `endpoint` through a pair
  /// socket from `context`.
  pub fn new(context: &Context, endpoint: impl Into<String>) -> Result<Self, ZmqError> {
    Self::builder(endpoint).build(context)
  }

  pub fn endpoint(&self) -> &str {
    &self.endpoint
  }

  pub fn options(&self) -> &MonitorOptions {
    &self.options
  }

  pub fn is_running(&self) -> bool {
    self.state.running.load(Ordering::SeqCst)
  }

  pub fn is_disposed(&self) -> bool {
    self.disposed.load(Ordering::Acquire)
  }

  pub fn stop_handle(&self) -> StopHandle {
    StopHandle {
      state: self.state.clone(),
    }
  }

  /// Requests the run loop to exit. Callable from any context, including an
  /// observer running on the loop itself.
  pub fn stop(&self) {
    self.stop_handle().stop();
  }

  /// Connects the control channel and runs the poll/decode/dispatch loop until
  /// `stop()` is called, `cancel` fires, or polling fails.
  ///
  /// A poll failure other than a timeout ends the loop quietly; callers see it
  /// only through `is_running()`. The channel is disconnected on exit and any
  /// disconnect error is discarded.
  ///
  /// # Errors
  /// * `InvalidState` if the monitor was disposed or `run` was already called.
  ///   A monitor runs at most once.
  /// * Any error from connecting the control channel.
  ///
  /// Observer panics are not caught and unwind out of this call.
  pub async fn run(&self, cancel: CancellationToken) -> Result<(), ZmqError> {
    if self.is_disposed() {
      return Err(ZmqError::InvalidState("Monitor has been disposed"));
    }
    if self
      .started
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      return Err(ZmqError::InvalidState("Monitor run loop was already started"));
    }

    let mut slot = self.channel.lock().await;
    let Some(channel) = slot.as_mut() else {
      return Err(ZmqError::InvalidState("Monitor has been disposed"));
    };

    if let Err(e) = channel.connect(&self.endpoint).await {
      tracing::warn!(endpoint = %self.endpoint, error = %e, "Monitor failed to connect control channel");
      return Err(e);
    }
    self.state.running.store(true, Ordering::SeqCst);
    let _guard = RunningGuard(&self.state);
    tracing::debug!(endpoint = %self.endpoint, options = ?self.options, "Monitor run loop started");

    let mut dispatched: u64 = 0;
    while !self.state.stop_requested.load(Ordering::SeqCst) && !cancel.is_cancelled() {
      match channel.poll(self.options.poll_interval).await {
        Ok(frames) => {
          let record = EventRecord::decode(&frames);
          tracing::trace!(
            endpoint = %self.endpoint,
            code = record.code,
            value = record.value,
            address = ?record.address,
            "Monitor record received"
          );
          self.table.dispatch(self, &record);
          dispatched += 1;
        }
        Err(e) if e.is_timeout() => idle(self.options.idle_yield).await,
        Err(e) => {
          tracing::warn!(endpoint = %self.endpoint, error = %e, "Monitor poll failed, stopping");
          self.state.running.store(false, Ordering::SeqCst);
          break;
        }
      }
    }
    self.state.running.store(false, Ordering::SeqCst);

    if let Err(e) = channel.disconnect(&self.endpoint).await {
      tracing::debug!(endpoint = %self.endpoint, error = %e, "Discarding control channel disconnect error");
    }
    tracing::debug!(
      endpoint = %self.endpoint,
      dispatched,
      cancelled = cancel.is_cancelled(),
      "Monitor run loop exited"
    );
    Ok(())
  }

  /// Stops the monitor and releases the control channel exactly once.
  ///
  /// If the loop is running this waits for it to exit (about one poll
  /// interval). Later calls are no-ops.
  pub async fn dispose(&self) {
    if self
      .disposed
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .is_err()
    {
      tracing::trace!(endpoint = %self.endpoint, "Monitor already disposed");
      return;
    }
    self.stop();

    let channel = self.channel.lock().await.take();
    if let Some(mut channel) = channel {
      channel.close().await;
      tracing::debug!(endpoint = %self.endpoint, "Monitor disposed, control channel released");
    }
  }
}

async fn idle(yield_for: Duration) {
  if yield_for.is_zero() {
    tokio::task::yield_now().await;
  } else {
    tokio::time::sleep(yield_for).await;
  }
}

impl Drop for Monitor {
  fn drop(&mut self) {
    self.stop();
  }
}

impl fmt::Debug for Monitor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Monitor")
      .field("endpoint", &self.endpoint)
      .field("running", &self.is_running())
      .field("disposed", &self.is_disposed())
      .field("options", &self.options)
      .field("observers", &self.table)
      .finish()
  }
}

/// Collects options and observers for a `Monitor`.
///
/// Observers can only be added here. Once built, the dispatch table is fixed.
pub struct MonitorBuilder {
  endpoint: String,
  options: MonitorOptions,
  table: DispatchTable,
}

impl MonitorBuilder {
  fn new(endpoint: String) -> Self {
    Self {
      endpoint,
      options: MonitorOptions::default(),
      table: DispatchTable::new(),
    }
  }

  pub fn options(mut self, options: MonitorOptions) -> Self {
    self.options = options;
    self
  }

  pub fn poll_interval(mut self, interval: Duration) -> Self {
    self.options.poll_interval = interval;
    self
  }

  pub fn idle_yield(mut self, pause: Duration) -> Self {
    self.options.idle_yield = pause;
    self
  }

  /// Registers an observer for `kind` receiving the untyped argument enum.
  /// With `EventKind::AllEvents` it sees every record as `EventArgs::Base`.
  pub fn on_event<F>(mut self, kind: EventKind, observer: F) -> Self
  where
    F: Fn(&EventArgs<'_>) + Send + Sync + 'static,
  {
    self.table.register(kind, Box::new(observer));
    self
  }

  /// Wildcard observer, invoked for every record before any kind-specific one.
  pub fn on_all<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::AllEvents, observer)
  }

  pub fn on_connected<F>(self, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_fd(EventKind::Connected, observer)
  }

  pub fn on_connect_delayed<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::ConnectDelayed, observer)
  }

  pub fn on_connect_retried<F>(self, observer: F) -> Self
  where
    F: Fn(&IntervalEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_event(EventKind::ConnectRetried, move |args| {
      if let EventArgs::Interval(args) = args {
        observer(args)
      }
    })
  }

  pub fn on_listening<F>(self, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_fd(EventKind::Listening, observer)
  }

  pub fn on_bind_failed<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::BindFailed, observer)
  }

  pub fn on_accepted<F>(self, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_fd(EventKind::Accepted, observer)
  }

  pub fn on_accept_failed<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::AcceptFailed, observer)
  }

  pub fn on_closed<F>(self, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_fd(EventKind::Closed, observer)
  }

  pub fn on_close_failed<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::CloseFailed, observer)
  }

  pub fn on_disconnected<F>(self, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_fd(EventKind::Disconnected, observer)
  }

  pub fn on_stopped<F>(self, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_base(EventKind::Stopped, observer)
  }

  fn on_base<F>(self, kind: EventKind, observer: F) -> Self
  where
    F: Fn(&BaseEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_event(kind, move |args| observer(args.base()))
  }

  fn on_fd<F>(self, kind: EventKind, observer: F) -> Self
  where
    F: Fn(&FdEventArgs<'_>) + Send + Sync + 'static,
  {
    self.on_event(kind, move |args| {
      if let EventArgs::FileDescriptor(args) = args {
        observer(args)
      }
    })
  }

  /// Builds the monitor with a pair socket from `context`.
  ///
  /// # Errors
  /// Fails if the endpoint is malformed or unsupported, the options are
  /// invalid, or the context can no longer create sockets.
  pub fn build(self, context: &Context) -> Result<Monitor, ZmqError> {
    parse_endpoint(&self.endpoint)?;
    let socket = context.pair_socket()?;
    self.build_with_channel(Box::new(socket))
  }

  /// Builds the monitor over a caller-supplied control channel.
  pub fn build_with_channel(self, channel: Box<dyn ControlChannel>) -> Result<Monitor, ZmqError> {
    self.options.validate()?;
    tracing::debug!(endpoint = %self.endpoint, observers = ?self.table, "Monitor created");
    Ok(Monitor {
      endpoint: self.endpoint,
      options: self.options,
      table: self.table,
      channel: tokio::sync::Mutex::new(Some(channel)),
      state: Arc::new(RunState::default()),
      started: AtomicBool::new(false),
      disposed: AtomicBool::new(false),
    })
  }
}
