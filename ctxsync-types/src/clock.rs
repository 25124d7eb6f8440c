//! Millisecond clocks.
//!
//! Every timestamp in ctxsync is a `u64` count of milliseconds since the Unix
//! epoch. Components take an `Arc<dyn Clock>` instead of reading the wall
//! clock directly so that tests can pin time with a [`ManualClock`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Millis = u64;

/// Reads the wall clock in milliseconds.
///
/// A clock set before 1970 reads as 0, the "maximally stale" timestamp.
#[must_use]
pub fn now_millis() -> Millis {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A source of millisecond timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> Millis;
}

/// Wall clock that never goes backwards.
///
/// If the system clock steps back, the last value handed out is repeated
/// until the wall clock catches up.
#[derive(Debug, Default)]
pub struct SystemClock {
    last: AtomicU64,
}

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a shared system clock.
    #[must_use]
    pub fn shared() -> Arc<dyn Clock> {
        Arc::new(Self::new())
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> Millis {
        let wall = now_millis();
        let prev = self.last.fetch_max(wall, Ordering::AcqRel);
        prev.max(wall)
    }
}

/// A settable clock for tests and replay.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// pass another into the component under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a manual clock starting at `start`.
    #[must_use]
    pub fn new(start: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, millis: Millis) {
        self.now.store(millis, Ordering::Release);
    }

    /// Moves the clock forward and returns the new time.
    pub fn advance(&self, millis: Millis) -> Millis {
        self.now.fetch_add(millis, Ordering::AcqRel) + millis
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Millis {
        self.now.load(Ordering::Acquire)
    }
}

/// Cloneable handle to a clock.
///
/// Defaults to a [`SystemClock`]. Two handles always compare equal: a clock is
/// where timestamps come from, not part of the state that carries them.
#[derive(Clone)]
pub struct SharedClock(Arc<dyn Clock>);

impl SharedClock {
    /// Wraps a clock.
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self(Arc::new(clock))
    }

    /// Wraps an already shared clock.
    #[must_use]
    pub fn from_arc(clock: Arc<dyn Clock>) -> Self {
        Self(clock)
    }

    /// A handle to a fresh system clock.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemClock::new())
    }

    /// Returns the current time in milliseconds.
    #[must_use]
    pub fn now_millis(&self) -> Millis {
        self.0.now_millis()
    }
}

impl Default for SharedClock {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for SharedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedClock").field(&self.0).finish()
    }
}

impl PartialEq for SharedClock {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl From<ManualClock> for SharedClock {
    fn from(clock: ManualClock) -> Self {
        Self::new(clock)
    }
}

impl From<SystemClock> for SharedClock {
    fn from(clock: SystemClock) -> Self {
        Self::new(clock)
    }
}
