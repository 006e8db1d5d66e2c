//! Playback over the hour axis.
//!
//! [`TimeCursor`] is the pure state machine (Paused / Playing, current hour,
//! speed). [`Playback`] drives it on a Tokio timer: while playing, one tick
//! task advances the cursor every `base_interval / speed`, and every change is
//! published on a watch channel for whoever renders the dashboard.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::error::Result;

/// Playback speeds in the order [`TimeCursor::cycle_speed`] visits them.
pub const PLAYBACK_SPEEDS: [u32; 3] = [1, 2, 4];

/// Wall-clock time one hour of data takes to play at 1x.
pub const DEFAULT_BASE_INTERVAL: Duration = Duration::from_millis(1000);

/// Hour the dashboard opens on.
pub const DEFAULT_INITIAL_HOUR: u32 = 36;

/// Snapshot of the cursor as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    pub current_hour: u32,
    pub is_playing: bool,
    pub playback_speed: u32,
    pub max_hour: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(u32),
    /// Already at the last hour; playback has been paused.
    Stopped,
    /// The cursor is paused, nothing to do.
    Idle,
}

#[derive(Debug, Clone)]
pub struct TimeCursor {
    current_hour: u32,
    max_hour: u32,
    initial_hour: u32,
    is_playing: bool,
    playback_speed: u32,
}

impl TimeCursor {
    /// A paused cursor at `initial_hour` (clamped into range) and 1x speed.
    pub fn new(max_hour: u32, initial_hour: u32) -> Self {
        let initial_hour = initial_hour.min(max_hour);
        Self {
            current_hour: initial_hour,
            max_hour,
            initial_hour,
            is_playing: false,
            playback_speed: PLAYBACK_SPEEDS[0],
        }
    }

    /// Start at a given speed. Speeds outside [`PLAYBACK_SPEEDS`] fall back to 1x.
    pub fn with_speed(mut self, speed: u32) -> Self {
        if PLAYBACK_SPEEDS.contains(&speed) {
            self.playback_speed = speed;
        }
        self
    }

    pub fn current_hour(&self) -> u32 {
        self.current_hour
    }

    pub fn max_hour(&self) -> u32 {
        self.max_hour
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn playback_speed(&self) -> u32 {
        self.playback_speed
    }

    pub fn state(&self) -> CursorState {
        CursorState {
            current_hour: self.current_hour,
            is_playing: self.is_playing,
            playback_speed: self.playback_speed,
            max_hour: self.max_hour,
        }
    }

    /// Position along the axis as a percentage.
    pub fn progress(&self) -> f64 {
        if self.max_hour == 0 {
            return 0.0;
        }
        f64::from(self.current_hour) / f64::from(self.max_hour) * 100.0
    }

    pub fn tick_interval(&self, base: Duration) -> Duration {
        base / self.playback_speed
    }

    /// Enter Playing. From the last hour, playback restarts at hour 0.
    pub fn play(&mut self) {
        if self.current_hour >= self.max_hour {
            self.current_hour = 0;
        }
        self.is_playing = true;
    }

    pub fn pause(&mut self) {
        self.is_playing = false;
    }

    pub fn toggle(&mut self) {
        if self.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pause and return to the hour the cursor was created with.
    pub fn reset(&mut self) {
        self.is_playing = false;
        self.current_hour = self.initial_hour;
    }

    pub fn go_to_start(&mut self) {
        self.is_playing = false;
        self.current_hour = 0;
    }

    pub fn go_to_end(&mut self) {
        self.is_playing = false;
        self.current_hour = self.max_hour;
    }

    pub fn step_forward(&mut self) {
        self.current_hour = (self.current_hour + 1).min(self.max_hour);
    }

    pub fn step_backward(&mut self) {
        self.current_hour = self.current_hour.saturating_sub(1);
    }

    /// Move to `hour`, clamped into `[0, max_hour]`. Play state is untouched.
    pub fn seek_to(&mut self, hour: i64) {
        self.current_hour = hour.clamp(0, i64::from(self.max_hour)) as u32;
    }

    /// 1x -> 2x -> 4x -> 1x
    pub fn cycle_speed(&mut self) {
        let position = PLAYBACK_SPEEDS
            .iter()
            .position(|speed| *speed == self.playback_speed)
            .unwrap_or(PLAYBACK_SPEEDS.len() - 1);
        self.playback_speed = PLAYBACK_SPEEDS[(position + 1) % PLAYBACK_SPEEDS.len()];
    }

    /// One playback step. Reads the hour as it is now, so a seek made between
    /// ticks is honoured.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_playing {
            return TickOutcome::Idle;
        }
        if self.current_hour >= self.max_hour {
            self.is_playing = false;
            return TickOutcome::Stopped;
        }
        self.current_hour += 1;
        TickOutcome::Advanced(self.current_hour)
    }
}

struct Inner {
    cursor: TimeCursor,
    /// Bumped whenever the tick task is cancelled; a task only acts while its
    /// generation is current.
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    armed_speed: Option<u32>,
}

struct Shared {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<CursorState>,
    base_interval: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer-driven [`TimeCursor`]. At most one tick task is alive per instance
/// and it is cancelled whenever playback stops or the instance is dropped.
pub struct Playback {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl Playback {
    /// Must be called from within a Tokio runtime.
    pub fn new(cursor: TimeCursor, base_interval: Duration) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let (state_tx, _) = watch::channel(cursor.state());
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner { cursor, generation: 0, ticker: None, armed_speed: None }),
            state_tx,
            base_interval,
        });
        Ok(Self { shared, runtime })
    }

    pub fn state(&self) -> CursorState {
        self.shared.lock().cursor.state()
    }

    pub fn progress(&self) -> f64 {
        self.shared.lock().cursor.progress()
    }

    /// Receiver notified on every cursor change, including ticks.
    pub fn subscribe(&self) -> watch::Receiver<CursorState> {
        self.shared.state_tx.subscribe()
    }

    #[instrument(skip(self))]
    pub fn play(&self) {
        self.apply(TimeCursor::play);
        info!("Playback started");
    }

    #[instrument(skip(self))]
    pub fn pause(&self) {
        self.apply(TimeCursor::pause);
        info!("Playback paused");
    }

    pub fn toggle(&self) {
        self.apply(TimeCursor::toggle);
    }

    pub fn reset(&self) {
        self.apply(TimeCursor::reset);
    }

    pub fn go_to_start(&self) {
        self.apply(TimeCursor::go_to_start);
    }

    pub fn go_to_end(&self) {
        self.apply(TimeCursor::go_to_end);
    }

    pub fn step_forward(&self) {
        self.apply(TimeCursor::step_forward);
    }

    pub fn step_backward(&self) {
        self.apply(TimeCursor::step_backward);
    }

    pub fn seek_to(&self, hour: i64) {
        self.apply(|cursor| cursor.seek_to(hour));
    }

    /// Changing speed while playing re-arms the tick at the new cadence.
    pub fn cycle_speed(&self) {
        self.apply(TimeCursor::cycle_speed);
    }

    fn apply(&self, operation: impl FnOnce(&mut TimeCursor)) {
        let mut inner = self.shared.lock();
        operation(&mut inner.cursor);
        self.sync_ticker(&mut inner);
        self.shared.state_tx.send_replace(inner.cursor.state());
    }

    fn sync_ticker(&self, inner: &mut Inner) {
        let wanted = inner.cursor.is_playing().then(|| inner.cursor.playback_speed());
        if wanted == inner.armed_speed {
            return;
        }
        cancel_ticker(inner);
        if let Some(speed) = wanted {
            let period = inner.cursor.tick_interval(self.shared.base_interval);
            let ticker = run_ticker(Arc::clone(&self.shared), inner.generation, period);
            let handle = self.runtime.spawn(ticker);
            inner.ticker = Some(handle);
            inner.armed_speed = Some(speed);
            debug!(speed, ?period, "tick armed");
        }
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        cancel_ticker(&mut self.shared.lock());
    }
}

fn cancel_ticker(inner: &mut Inner) {
    inner.generation += 1;
    inner.armed_speed = None;
    if let Some(handle) = inner.ticker.take() {
        handle.abort();
    }
}

async fn run_ticker(shared: Arc<Shared>, generation: u64, period: Duration) {
    let mut ticks = interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        let outcome = inner.cursor.tick();
        debug!(?outcome, "tick");
        shared.state_tx.send_replace(inner.cursor.state());
        if !matches!(outcome, TickOutcome::Advanced(_)) {
            inner.generation += 1;
            inner.armed_speed = None;
            inner.ticker = None;
            if outcome == TickOutcome::Stopped {
                info!(hour = inner.cursor.current_hour(), "Playback reached the last hour");
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use tokio::time::sleep;

    const MAX_HOUR: u32 = 47;

    #[test]
    fn test_new_cursor_is_paused() {
        let cursor = TimeCursor::new(MAX_HOUR, DEFAULT_INITIAL_HOUR);
        assert_eq!(cursor.current_hour(), 36);
        assert!(!cursor.is_playing());
        assert_eq!(cursor.playback_speed(), 1);
        assert_eq!(TimeCursor::new(10, 36).current_hour(), 10);
    }

    #[test]
    fn test_play_from_end_restarts() {
        let mut cursor = TimeCursor::new(MAX_HOUR, MAX_HOUR);
        cursor.play();
        assert_eq!(cursor.current_hour(), 0);
        assert!(cursor.is_playing());
    }

    #[test]
    fn test_tick_at_end_pauses_without_moving() {
        let mut cursor = TimeCursor::new(MAX_HOUR, 46);
        cursor.play();
        assert_eq!(cursor.tick(), TickOutcome::Advanced(47));
        assert_eq!(cursor.tick(), TickOutcome::Stopped);
        assert_eq!(cursor.current_hour(), 47);
        assert!(!cursor.is_playing());
        assert_eq!(cursor.tick(), TickOutcome::Idle);
    }

    #[test_case(-5 => 0 ; "below range")]
    #[test_case(12 => 12 ; "in range")]
    #[test_case(i64::from(MAX_HOUR) + 10 => MAX_HOUR ; "above range")]
    fn test_seek_clamps(hour: i64) -> u32 {
        let mut cursor = TimeCursor::new(MAX_HOUR, 20);
        cursor.seek_to(hour);
        cursor.current_hour()
    }

    #[test]
    fn test_seek_keeps_play_state() {
        let mut cursor = TimeCursor::new(MAX_HOUR, 20);
        cursor.play();
        cursor.seek_to(5);
        assert!(cursor.is_playing());
    }

    #[test_case(1 => 2)]
    #[test_case(2 => 4)]
    #[test_case(4 => 1)]
    fn test_cycle_speed(from: u32) -> u32 {
        let mut cursor = TimeCursor::new(MAX_HOUR, 0).with_speed(from);
        cursor.cycle_speed();
        cursor.playback_speed()
    }

    #[test]
    fn test_steps_saturate_and_keep_playing() {
        let mut cursor = TimeCursor::new(MAX_HOUR, 0);
        cursor.step_backward();
        assert_eq!(cursor.current_hour(), 0);
        cursor.seek_to(i64::from(MAX_HOUR));
        cursor.play();
        cursor.seek_to(i64::from(MAX_HOUR));
        cursor.step_forward();
        assert_eq!(cursor.current_hour(), MAX_HOUR);
        assert!(cursor.is_playing());
    }

    #[test]
    fn test_start_end_and_reset_pause() {
        let mut cursor = TimeCursor::new(MAX_HOUR, 30);
        cursor.play();
        cursor.go_to_end();
        assert_eq!(cursor.current_hour(), MAX_HOUR);
        assert!(!cursor.is_playing());

        cursor.play();
        cursor.go_to_start();
        assert_eq!(cursor.current_hour(), 0);
        assert!(!cursor.is_playing());

        cursor.step_forward();
        cursor.toggle();
        assert!(cursor.is_playing());
        cursor.reset();
        assert_eq!(cursor.current_hour(), 30);
        assert!(!cursor.is_playing());
    }

    #[test]
    fn test_progress_and_interval() {
        let cursor = TimeCursor::new(40, 10).with_speed(4);
        assert_eq!(cursor.progress(), 25.0);
        assert_eq!(cursor.tick_interval(DEFAULT_BASE_INTERVAL), Duration::from_millis(250));
        assert_eq!(TimeCursor::new(0, 0).progress(), 0.0);
    }

    fn playback(initial_hour: u32) -> Playback {
        Playback::new(TimeCursor::new(MAX_HOUR, initial_hour), DEFAULT_BASE_INTERVAL).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_advances_once_per_interval() {
        let playback = playback(10);
        playback.play();
        sleep(Duration::from_millis(3_050)).await;
        assert_eq!(playback.state().current_hour, 13);
        assert!(playback.state().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_shortens_interval() {
        let playback = playback(10);
        playback.cycle_speed();
        playback.cycle_speed();
        playback.play();
        sleep(Duration::from_millis(1_010)).await;
        assert_eq!(playback.state().current_hour, 14);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_change_while_playing_rearms() {
        let playback = playback(0);
        playback.play();
        playback.cycle_speed();
        sleep(Duration::from_millis(1_050)).await;
        assert_eq!(playback.state().current_hour, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_ticks() {
        let playback = playback(10);
        playback.play();
        sleep(Duration::from_millis(1_050)).await;
        playback.pause();
        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(playback.state().current_hour, 11);
        assert!(!playback.state().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_stops_at_last_hour() {
        let playback = playback(45);
        playback.play();
        sleep(Duration::from_millis(5_050)).await;
        let state = playback.state();
        assert_eq!(state.current_hour, MAX_HOUR);
        assert!(!state.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_observes_seek() {
        let playback = playback(10);
        playback.play();
        sleep(Duration::from_millis(1_050)).await;
        playback.seek_to(30);
        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(playback.state().current_hour, 31);
    }

    #[tokio::test(start_paused = true)]
    async fn test_go_to_end_stops_ticks() {
        let playback = playback(10);
        playback.play();
        playback.go_to_end();
        sleep(Duration::from_millis(3_000)).await;
        assert_eq!(playback.state().current_hour, MAX_HOUR);
        assert!(!playback.state().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_ticks() {
        let playback = playback(10);
        let rx = playback.subscribe();
        playback.play();
        drop(playback);
        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(rx.borrow().current_hour, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_changes() {
        let playback = playback(10);
        let mut rx = playback.subscribe();
        playback.step_forward();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().current_hour, 11);

        playback.play();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_playing);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().current_hour, 12);
    }
}
