//! The time source injection point.
//!
//! History consumes a parameter-less function
//! returning a monotonic numeric timestamp, injected once at init; the
//! engine itself never reads wall-clock time. Erosion's `tick` instead
//! takes the current time as an explicit argument on every call — it has
//! no stored time source of its own.

use std::sync::Arc;

/// A monotonic, caller-defined timestamp. Units (ticks, seconds, turns) are
/// up to the host; the engine only ever compares and stores these values.
pub type Timestamp = i64;

/// A parameter-less time source, injected at History init.
pub type TimeFn = Arc<dyn Fn() -> Timestamp + Send + Sync>;

/// A convenience adapter for hosts that want to wire real wall-clock time
/// into [`TimeFn`]. The engine never calls this itself — it is provided so
/// callers don't each have to hand-roll a `chrono` wrapper closure.
pub fn system_clock() -> TimeFn {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}
