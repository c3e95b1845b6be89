//! Injected dependencies.

use chrono::{DateTime, Utc};

/// Clock trait - abstracts time so stores can stamp records deterministically
/// in tests.
///
/// # Examples
///
/// ```
/// use atendimentos_core::environment::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// assert!(clock.now() <= chrono::Utc::now());
/// ```
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
