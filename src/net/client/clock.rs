//! Time interfaces that can be replaced by fake implementations during
//! testing.
//!
//! There are two of them. A [`Clock`] measures how much time has passed
//! since some instant. It is used by the cache to age entries. A [`Timer`]
//! creates futures that resolve after a given duration. It is used by the
//! timeout executor.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use parking_lot::Mutex;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time;
use std::time::Duration;

//------------ Clock -----------------------------------------------------------

/// A trait for storing the current time in an object that implements the
/// [Elapsed] trait.
pub trait Clock: Clone {
    /// The type that implements the [Elapsed] trait.
    type Instant: Clone + Debug + Elapsed + Send + Sync;

    /// Record the current time in an [Self::Instant] object.
    fn now(&self) -> Self::Instant;
}

//------------ Elapsed --------------------------------------------------------

/// Trait for reporting the time that has elapsed since the creation of an
/// instance object.
pub trait Elapsed {
    /// Return the elapsed time.
    fn elapsed(&self) -> Duration;
}

//------------ SystemClock -----------------------------------------------------

/// Implementation of the [Clock] trait using the Instant type from
/// std::time.
#[derive(Clone, Debug, Default)]
pub struct SystemClock {}

impl SystemClock {
    /// Creates a new system clock.
    pub fn new() -> Self {
        Self {}
    }
}

impl Clock for SystemClock {
    type Instant = time::Instant;

    fn now(&self) -> Self::Instant {
        Self::Instant::now()
    }
}

impl Elapsed for time::Instant {
    fn elapsed(&self) -> Duration {
        self.elapsed()
    }
}

//------------ FakeClock -----------------------------------------------------

/// Implementation of the [Clock] trait to fake the passing of time, for
/// example for testing.
///
/// Clones share the same fake time.
#[derive(Clone, Debug, Default)]
pub struct FakeClock {
    /// The current fake time.
    now: Arc<Mutex<Duration>>,
}

impl FakeClock {
    /// Creates a new fake clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the current time by adding a [Duration]
    pub fn adjust_time(&self, adjust: Duration) {
        let mut now = self.now.lock();
        *now = now.saturating_add(adjust);
    }

    /// Return the current (fake) time.
    fn curr_time(&self) -> Duration {
        *self.now.lock()
    }
}

impl Clock for FakeClock {
    type Instant = FakeInstant;

    fn now(&self) -> Self::Instant {
        FakeInstant {
            start: self.curr_time(),
            clock: self.clone(),
        }
    }
}

//------------ FakeInstant ----------------------------------------------------

/// An instant that provides fake time.
#[derive(Clone, Debug)]
pub struct FakeInstant {
    /// When the FakeInstant was created.
    start: Duration,

    /// The clock that was used to create it.
    clock: FakeClock,
}

impl Elapsed for FakeInstant {
    fn elapsed(&self) -> Duration {
        self.clock.curr_time().saturating_sub(self.start)
    }
}

//------------ Timer -----------------------------------------------------------

/// The future returned by [`Timer::sleep`].
pub type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A source of futures that resolve once a duration has passed.
///
/// Dropping a returned future cancels the timer.
pub trait Timer: Send + Sync {
    /// Returns a future that resolves after `duration`.
    fn sleep(&self, duration: Duration) -> Sleep;
}

//------------ TokioTimer ------------------------------------------------------

/// A timer based on the Tokio runtime.
///
/// When the runtime’s time is paused, as is common in tests, these timers
/// follow the paused time.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn sleep(&self, duration: Duration) -> Sleep {
        Box::pin(tokio::time::sleep(duration))
    }
}

//============ Testing =======================================================
