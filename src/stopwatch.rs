use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

/// How often a running stopwatch asks to be redrawn.
pub const TICK_INTERVAL: StdDuration = StdDuration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StopwatchError {
    #[error("time should be more than 0")]
    NothingToSave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopwatchMode {
    Idle,
    Running { anchor: DateTime<Utc> },
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Pause,
    Resume,
    Reset,
    Save,
}

impl Control {
    pub fn label(self) -> &'static str {
        match self {
            Control::Start => "Start",
            Control::Pause => "Pause",
            Control::Resume => "Resume",
            Control::Reset => "Reset",
            Control::Save => "Save",
        }
    }
}

/// Accumulated active time. Every transition returns the next state.
///
/// While running, elapsed time is always `saved + (now - anchor)`, so the value
/// depends only on wall-clock samples and never on how often it is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopwatch {
    saved_ms: u64,
    mode: StopwatchMode,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            saved_ms: 0,
            mode: StopwatchMode::Idle,
        }
    }

    pub fn mode(&self) -> StopwatchMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        matches!(self.mode, StopwatchMode::Running { .. })
    }

    pub fn start(self, now: DateTime<Utc>) -> Self {
        match self.mode {
            StopwatchMode::Running { .. } => self,
            StopwatchMode::Idle | StopwatchMode::Paused => Self {
                saved_ms: self.saved_ms,
                mode: StopwatchMode::Running { anchor: now },
            },
        }
    }

    pub fn pause(self, now: DateTime<Utc>) -> Self {
        match self.mode {
            StopwatchMode::Running { .. } => Self {
                saved_ms: self.elapsed_ms(now),
                mode: StopwatchMode::Paused,
            },
            StopwatchMode::Idle | StopwatchMode::Paused => self,
        }
    }

    pub fn reset(self) -> Self {
        Self::new()
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.mode {
            StopwatchMode::Running { anchor } => {
                self.saved_ms + (now - anchor).num_milliseconds().max(0) as u64
            }
            StopwatchMode::Idle | StopwatchMode::Paused => self.saved_ms,
        }
    }

    /// Freezes the watch and hands back the elapsed milliseconds.
    ///
    /// The watch is not reset; callers reset once the time has been stored.
    pub fn save(&self, now: DateTime<Utc>) -> Result<(Self, u64), StopwatchError> {
        let elapsed = self.elapsed_ms(now);
        if elapsed == 0 {
            return Err(StopwatchError::NothingToSave);
        }
        Ok((self.pause(now), elapsed))
    }

    pub fn display(&self, now: DateTime<Utc>) -> String {
        format_elapsed(self.elapsed_ms(now))
    }

    pub fn controls(&self) -> &'static [Control] {
        match self.mode {
            StopwatchMode::Idle => &[Control::Start],
            StopwatchMode::Running { .. } => &[Control::Pause, Control::Reset, Control::Save],
            StopwatchMode::Paused => &[Control::Resume, Control::Reset, Control::Save],
        }
    }
}

/// Recurring redraw trigger. Armed at most once; cancelling disarms it.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(period: StdDuration) -> Self {
        Self {
            period: Duration::from_std(period).unwrap_or_else(|_| Duration::milliseconds(10)),
            next_due: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Returns `false` when the ticker was already armed.
    pub fn arm(&mut self, now: DateTime<Utc>) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.next_due = Some(now + self.period);
        true
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }

    pub fn timeout(&self, now: DateTime<Utc>, idle: StdDuration) -> StdDuration {
        match self.next_due {
            Some(due) => (due - now).to_std().unwrap_or(StdDuration::ZERO),
            None => idle,
        }
    }
}

/// A stopwatch together with the ticker that redraws it.
#[derive(Debug, Clone)]
pub struct StopwatchSession {
    watch: Stopwatch,
    ticker: Ticker,
}

impl Default for StopwatchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl StopwatchSession {
    pub fn new() -> Self {
        Self {
            watch: Stopwatch::new(),
            ticker: Ticker::new(TICK_INTERVAL),
        }
    }

    pub fn watch(&self) -> Stopwatch {
        self.watch
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    /// Starts or resumes; a no-op while the ticker is already armed.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if !self.ticker.arm(now) {
            return false;
        }
        self.watch = self.watch.start(now);
        true
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.ticker.cancel();
        self.watch = self.watch.pause(now);
    }

    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.watch = self.watch.reset();
    }

    /// Leaves the session untouched when there is nothing to save.
    pub fn save(&mut self, now: DateTime<Utc>) -> Result<u64, StopwatchError> {
        let (paused, elapsed) = self.watch.save(now)?;
        self.ticker.cancel();
        self.watch = paused;
        Ok(elapsed)
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.ticker.fire(now)
    }

    pub fn poll_timeout(&self, now: DateTime<Utc>, idle: StdDuration) -> StdDuration {
        self.ticker.timeout(now, idle)
    }

    pub fn display(&self, now: DateTime<Utc>) -> String {
        self.watch.display(now)
    }

    pub fn controls(&self) -> &'static [Control] {
        self.watch.controls()
    }
}

/// `HH:MM:SS.CC`, hours unbounded.
pub fn format_elapsed(elapsed_ms: u64) -> String {
    let hours = elapsed_ms / 3_600_000;
    let minutes = (elapsed_ms / 60_000) % 60;
    let seconds = (elapsed_ms / 1_000) % 60;
    let centis = (elapsed_ms % 1_000) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 2, 18, 0, 0).unwrap()
    }

    fn ms(offset: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(offset)
    }

    #[test]
    fn start_pause_resume_scenario() {
        let watch = Stopwatch::new().start(ms(0));
        assert_eq!(watch.display(ms(100)), "00:00:00.10");

        let watch = watch.pause(ms(100));
        assert_eq!(watch.display(ms(100)), "00:00:00.10");
        assert_eq!(watch.display(ms(5_000)), "00:00:00.10");

        let watch = watch.start(ms(5_000));
        assert_eq!(watch.display(ms(5_100)), "00:00:00.20");
    }

    #[test]
    fn elapsed_never_decreases_while_running() {
        let watch = Stopwatch::new().start(ms(0));
        let mut last = 0;
        for offset in (0..2_000).step_by(7) {
            let elapsed = watch.elapsed_ms(ms(offset));
            assert!(elapsed >= last);
            last = elapsed;
        }
        // A clock that steps backwards never eats into saved time.
        let paused = watch.pause(ms(500)).start(ms(600));
        assert_eq!(paused.elapsed_ms(ms(100)), 500);
    }

    #[test]
    fn reset_returns_to_idle_from_any_state() {
        let running = Stopwatch::new().start(ms(0));
        let paused = running.pause(ms(250));
        for watch in [Stopwatch::new(), running, paused] {
            let reset = watch.reset();
            assert_eq!(reset.mode(), StopwatchMode::Idle);
            assert_eq!(reset.elapsed_ms(ms(10_000)), 0);
        }
    }

    #[test]
    fn pause_only_applies_while_running() {
        let idle = Stopwatch::new();
        assert_eq!(idle.pause(ms(10)), idle);

        let paused = idle.start(ms(0)).pause(ms(40));
        assert_eq!(paused.pause(ms(90)), paused);
        assert_eq!(paused.elapsed_ms(ms(90)), 40);
    }

    #[test]
    fn save_is_rejected_exactly_at_zero() {
        let idle = Stopwatch::new();
        assert_eq!(idle.save(ms(0)), Err(StopwatchError::NothingToSave));
        assert_eq!(idle.mode(), StopwatchMode::Idle);

        let just_started = idle.start(ms(0));
        assert_eq!(just_started.save(ms(0)), Err(StopwatchError::NothingToSave));
        assert!(just_started.is_running());

        let (saved, elapsed) = just_started.save(ms(1_234)).expect("save should work");
        assert_eq!(elapsed, 1_234);
        assert_eq!(saved.mode(), StopwatchMode::Paused);
        assert_eq!(saved.elapsed_ms(ms(9_999)), 1_234);
    }

    #[test]
    fn controls_follow_the_mode() {
        let idle = Stopwatch::new();
        assert_eq!(idle.controls(), &[Control::Start]);
        let running = idle.start(ms(0));
        assert_eq!(running.controls(), &[Control::Pause, Control::Reset, Control::Save]);
        let paused = running.pause(ms(10));
        assert_eq!(paused.controls(), &[Control::Resume, Control::Reset, Control::Save]);
    }

    #[test]
    fn formats_hundredths_and_unbounded_hours() {
        assert_eq!(format_elapsed(0), "00:00:00.00");
        assert_eq!(format_elapsed(9), "00:00:00.00");
        assert_eq!(format_elapsed(61_010), "00:01:01.01");
        assert_eq!(format_elapsed(3_723_450), "01:02:03.45");
        assert_eq!(format_elapsed(360_000_000), "100:00:00.00");
    }

    #[test]
    fn ticker_fires_on_schedule_until_cancelled() {
        let mut ticker = Ticker::new(TICK_INTERVAL);
        assert!(!ticker.fire(ms(100)));
        assert_eq!(ticker.timeout(ms(0), StdDuration::from_millis(250)), StdDuration::from_millis(250));

        assert!(ticker.arm(ms(0)));
        assert!(!ticker.arm(ms(5)));
        assert_eq!(ticker.timeout(ms(4), StdDuration::from_millis(250)), StdDuration::from_millis(6));
        assert!(!ticker.fire(ms(9)));
        assert!(ticker.fire(ms(10)));
        assert!(!ticker.fire(ms(15)));
        assert!(ticker.fire(ms(20)));
        assert_eq!(ticker.timeout(ms(40), StdDuration::from_millis(250)), StdDuration::ZERO);

        ticker.cancel();
        assert!(!ticker.is_armed());
        assert!(!ticker.fire(ms(1_000)));
    }

    #[test]
    fn session_ignores_reentrant_start() {
        let mut session = StopwatchSession::new();
        assert!(session.start(ms(0)));
        assert!(!session.start(ms(50)));
        assert_eq!(session.display(ms(100)), "00:00:00.10");

        session.pause(ms(100));
        assert!(!session.is_ticking());
        assert!(session.start(ms(200)));
        assert_eq!(session.display(ms(300)), "00:00:00.20");
    }

    #[test]
    fn session_save_keeps_state_until_caller_resets() {
        let mut session = StopwatchSession::new();
        assert_eq!(session.save(ms(0)), Err(StopwatchError::NothingToSave));
        assert_eq!(session.watch(), Stopwatch::new());

        session.start(ms(0));
        assert_eq!(session.save(ms(1_500)), Ok(1_500));
        assert!(!session.is_ticking());
        assert_eq!(session.display(ms(9_000)), "00:00:01.50");

        session.reset();
        assert_eq!(session.display(ms(9_000)), "00:00:00.00");
        assert_eq!(session.controls(), &[Control::Start]);
    }
}
