//! A fixed-window request limiter shared by every caller of an endpoint.

use std::{
  sync::Mutex,
  time::{Duration, Instant},
};

/// Admits at most `limit` requests per `window`; the count resets when a
/// request arrives after the window has elapsed. A limit of zero disables
/// limiting.
#[derive(Debug)]
pub struct FixedWindow {
  limit:  u32,
  window: Duration,
  state:  Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
  started: Instant,
  used:    u32,
}

impl FixedWindow {
  pub fn new(limit: u32, window: Duration) -> Self {
    Self {
      limit,
      window,
      state: Mutex::new(WindowState { started: Instant::now(), used: 0 }),
    }
  }

  /// Take one permit now. Returns `false` when the window is exhausted.
  pub fn try_acquire(&self) -> bool { self.try_acquire_at(Instant::now()) }

  fn try_acquire_at(&self, now: Instant) -> bool {
    if self.limit == 0 {
      return true;
    }
    let mut state = match self.state.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    if now.saturating_duration_since(state.started) >= self.window {
      state.started = now;
      state.used = 0;
    }
    if state.used < self.limit {
      state.used += 1;
      true
    } else {
      false
    }
  }
}
