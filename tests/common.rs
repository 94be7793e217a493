// tests/common.rs
#![allow(dead_code)]

use async_trait::async_trait;
use rzmq_monitor::monitor::event::EVENT_HEADER_LEN;
use rzmq_monitor::{Context, ControlChannel, Msg, MsgFlags, ZmqError};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

static INPROC_ENDPOINT_COUNTER: AtomicUsize = AtomicUsize::new(0);

// Use std::sync::Once for one-time initialization
static TRACING_INIT: Once = Once::new();

pub fn setup_tracing() {
  TRACING_INIT.call_once(|| {
    // Can be overridden by RUST_LOG env variable
    let default_filter = "rzmq_monitor=trace,info";
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber = FmtSubscriber::builder()
      .with_max_level(tracing::Level::TRACE)
      .with_env_filter(env_filter)
      .with_target(true)
      .with_line_number(true)
      .with_span_events(FmtSpan::CLOSE)
      .with_test_writer() // Write to test output capture
      .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set global tracing subscriber");
  });
}

// Helper to create a context
pub fn test_context() -> Context {
  setup_tracing();
  Context::new().expect("Failed to create test context")
}

// Helper to create a context with a custom monitor queue capacity
pub fn test_context_with_capacity(capacity: usize) -> Context {
  setup_tracing();
  Context::with_capacity(Some(capacity)).expect("Failed to create test context")
}

// Helper to generate unique Inproc endpoints
pub fn unique_inproc_endpoint() -> String {
  let pid = std::process::id();
  let count = INPROC_ENDPOINT_COUNTER.fetch_add(1, Ordering::Relaxed);
  format!("inproc://rzmq_monitor_test_{}_{}", pid, count)
}

/// Builds the frames of one monitor record by hand.
pub fn record_frames(code: u16, value: i32, address: Option<&str>) -> Vec<Msg> {
  let mut header = Vec::with_capacity(EVENT_HEADER_LEN);
  header.extend_from_slice(&code.to_le_bytes());
  header.extend_from_slice(&value.to_le_bytes());
  let mut first = Msg::from_vec(header);
  match address {
    Some(address) => {
      first.set_flags(MsgFlags::MORE);
      vec![first, Msg::from_vec(address.as_bytes().to_vec())]
    }
    None => vec![first],
  }
}

/// What a `ScriptedChannel` returns from its next poll.
pub enum Step {
  Record(Vec<Msg>),
  Timeout,
  Fail(ZmqError),
}

/// Counters shared between a test and the channel it handed to a monitor.
#[derive(Debug, Default)]
pub struct ChannelStats {
  pub connects: AtomicUsize,
  pub disconnects: AtomicUsize,
  pub polls: AtomicUsize,
  pub closes: AtomicUsize,
}

impl ChannelStats {
  pub fn polls(&self) -> usize {
    self.polls.load(Ordering::SeqCst)
  }
  pub fn closes(&self) -> usize {
    self.closes.load(Ordering::SeqCst)
  }
  pub fn disconnects(&self) -> usize {
    self.disconnects.load(Ordering::SeqCst)
  }
  pub fn connects(&self) -> usize {
    self.connects.load(Ordering::SeqCst)
  }
}

/// Fake control channel that replays a script of poll outcomes, then idles.
#[derive(Debug)]
pub struct ScriptedChannel {
  script: VecDeque<StepSlot>,
  stats: Arc<ChannelStats>,
  pub fail_connect: bool,
  pub fail_disconnect: bool,
}

// ZmqError is not Clone, so steps are kept behind a Debug-friendly wrapper.
struct StepSlot(Step);

impl std::fmt::Debug for StepSlot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.0 {
      Step::Record(frames) => write!(f, "Record({} frames)", frames.len()),
      Step::Timeout => write!(f, "Timeout"),
      Step::Fail(e) => write!(f, "Fail({})", e),
    }
  }
}

impl ScriptedChannel {
  pub fn new(steps: impl IntoIterator<Item = Step>) -> (Self, Arc<ChannelStats>) {
    let stats = Arc::new(ChannelStats::default());
    let channel = Self {
      script: steps.into_iter().map(StepSlot).collect(),
      stats: stats.clone(),
      fail_connect: false,
      fail_disconnect: false,
    };
    (channel, stats)
  }

  pub fn idle() -> (Self, Arc<ChannelStats>) {
    Self::new(Vec::new())
  }
}

#[async_trait]
impl ControlChannel for ScriptedChannel {
  async fn connect(&mut self, endpoint: &str) -> Result<(), ZmqError> {
    self.stats.connects.fetch_add(1, Ordering::SeqCst);
    if self.fail_connect {
      return Err(ZmqError::ConnectionRefused(endpoint.to_string()));
    }
    Ok(())
  }

  async fn disconnect(&mut self, _endpoint: &str) -> Result<(), ZmqError> {
    self.stats.disconnects.fetch_add(1, Ordering::SeqCst);
    if self.fail_disconnect {
      return Err(ZmqError::InvalidState("scripted disconnect failure"));
    }
    Ok(())
  }

  async fn poll(&mut self, timeout: Duration) -> Result<Vec<Msg>, ZmqError> {
    self.stats.polls.fetch_add(1, Ordering::SeqCst);
    match self.script.pop_front().map(|slot| slot.0) {
      Some(Step::Record(frames)) => Ok(frames),
      Some(Step::Fail(e)) => Err(e),
      Some(Step::Timeout) | None => {
        tokio::time::sleep(timeout).await;
        Err(ZmqError::Timeout)
      }
    }
  }

  async fn close(&mut self) {
    self.stats.closes.fetch_add(1, Ordering::SeqCst);
  }
}

/// Polls `cond` every few milliseconds until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, cond: impl Fn() -> bool) -> bool {
  let start = tokio::time::Instant::now();
  while start.elapsed() < limit {
    if cond() {
      return true;
    }
    tokio::time::sleep(Duration::from_millis(2)).await;
  }
  cond()
}
