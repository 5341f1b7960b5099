use std::cell::Cell;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};

use crate::model::settings::ViewSettings;

// ----
// Clock sources

/// Time source for the scroll loop. Wall time anchors the viewport;
/// the monotonic reading drives frame deltas so decay stays correct
/// under variable tick rates.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn monotonic(&self) -> StdDuration;
}

/// Real wall clock plus a process-local monotonic origin.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> StdDuration {
        self.origin.elapsed()
    }
}

/// Hand-cranked clock. Both readings advance together only when told to.
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    mono: Cell<StdDuration>,
}

impl ManualClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        ManualClock {
            now: Cell::new(now),
            mono: Cell::new(StdDuration::ZERO),
        }
    }

    pub fn advance_millis(&self, ms: u64) {
        self.mono.set(self.mono.get() + StdDuration::from_millis(ms));
        self.now
            .set(self.now.get() + Duration::milliseconds(ms as i64));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn monotonic(&self) -> StdDuration {
        self.mono.get()
    }
}

/// Lets tests hand the app a clock and keep a handle for cranking it.
impl<T: Clock + ?Sized> Clock for std::rc::Rc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn monotonic(&self) -> StdDuration {
        (**self).monotonic()
    }
}

// ----
// Auto-scroll state machine

/// Keeps the timeline flowing while the view is locked.
///
/// The viewport's `now` is sampled once, at lock time. While locked, each
/// tick decays `scroll_offset` by `cols_per_hour / 3600` columns per elapsed
/// second, which moves content leftward at exactly wall-clock rate; the
/// mapping stays equivalent to re-sampling `now` every frame, but rendering
/// only ever sees one mutated number. Locking again re-samples the anchor
/// and zeroes the offset in one step, so the now line realigns without a
/// visible jump. While unlocked, ticks keep the frame delta current but
/// leave the offset alone.
pub struct AutoScroll {
    anchor: DateTime<Utc>,
    last_tick: StdDuration,
}

impl AutoScroll {
    pub fn new(clock: &dyn Clock) -> Self {
        AutoScroll {
            anchor: clock.now(),
            last_tick: clock.monotonic(),
        }
    }

    /// Wall time the viewport should treat as "now".
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Enter the locked state: re-anchor to the current wall time and
    /// reset the offset so the now line snaps back to its fraction.
    pub fn lock(&mut self, settings: &mut ViewSettings, clock: &dyn Clock) {
        settings.is_locked = true;
        settings.scroll_offset = 0.0;
        self.anchor = clock.now();
        self.last_tick = clock.monotonic();
    }

    /// Leave auto-scroll. The anchor and offset freeze where they are;
    /// manual panning mutates the offset directly from here on.
    pub fn unlock(&mut self, settings: &mut ViewSettings) {
        settings.is_locked = false;
    }

    /// Re-sample the anchor without touching the offset. Used after the
    /// board is reloaded underneath the view, when a persisted offset has
    /// to be re-based on the current wall clock.
    pub fn re_anchor(&mut self, clock: &dyn Clock) {
        self.anchor = clock.now();
        self.last_tick = clock.monotonic();
    }

    /// Advance one frame. Returns the offset delta applied, which is zero
    /// while unlocked.
    pub fn tick(
        &mut self,
        settings: &mut ViewSettings,
        cols_per_hour: f64,
        clock: &dyn Clock,
    ) -> f64 {
        let now_mono = clock.monotonic();
        let elapsed = now_mono.saturating_sub(self.last_tick);
        self.last_tick = now_mono;

        if !settings.is_locked {
            return 0.0;
        }
        let delta = -(cols_per_hour / 3600.0) * elapsed.as_secs_f64();
        settings.scroll_offset += delta;
        delta
    }
}
