use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::best_times;
use crate::runtime::TickTask;
use crate::store::KvStore;

/// How often the display line is refreshed while a session runs.
const DISPLAY_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Elapsed-time readout owned by the host UI. Called roughly once per
/// second from the tick task while a session is running.
pub trait TimerDisplay: Send + Sync {
    fn set_timer(&self, elapsed_secs: u64);
}

/// End-of-game surface owned by the host UI. `show` is called exactly once
/// per [`Tracker::show_end_game_modal`]; the tracker never calls `hide`.
pub trait Notifier {
    fn show(&self, payload: &EndGamePayload);
    fn hide(&self);
}

/// What the notifier receives at game end. `message` is ready to present;
/// the structured fields are there for richer hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndGamePayload {
    pub message: String,
    pub elapsed_secs: u64,
    pub rank: usize,
}

/// Measures elapsed play time for one session, keeps the persisted board
/// of the five best completion times, and reports ranking at game end.
///
/// State machine is Idle -> Running -> Finished, with `start()` legal from
/// any state (restart). The board outlives sessions and is only mutated by
/// [`save_time`](Tracker::save_time).
pub struct Tracker {
    display: Arc<dyn TimerDisplay>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn KvStore>,
    started_at: Option<SystemTime>,
    finished: Arc<AtomicBool>,
    tick_interval: Duration,
    tick: Option<TickTask>,
}

impl Tracker {
    pub fn new(
        display: Arc<dyn TimerDisplay>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        Self {
            display,
            notifier,
            store,
            started_at: None,
            finished: Arc::new(AtomicBool::new(false)),
            tick_interval: DISPLAY_TICK_INTERVAL,
            tick: None,
        }
    }

    /// Override the display refresh period. Tests run this at a few
    /// milliseconds; the default is one second.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Begin (or restart) a session: record the start instant, clear the
    /// finished flag and spawn the display tick. Any tick task from a
    /// previous session is cancelled first, so two tickers never overlap.
    pub fn start(&mut self) {
        if let Some(task) = self.tick.take() {
            task.cancel();
        }

        let now = SystemTime::now();
        self.started_at = Some(now);
        self.finished.store(false, Ordering::SeqCst);

        let display = Arc::clone(&self.display);
        let finished = Arc::clone(&self.finished);
        self.tick = Some(TickTask::spawn(self.tick_interval, move || {
            if !finished.load(Ordering::SeqCst) {
                display.set_timer(elapsed_since(now));
            }
        }));
    }

    /// End the session: mark it finished, cancel the display tick and
    /// return elapsed whole seconds. The cancel joins the tick worker, so
    /// no `set_timer` call happens after this returns. Returns 0 when no
    /// session was ever started.
    pub fn stop(&mut self) -> u64 {
        self.finished.store(true, Ordering::SeqCst);
        if let Some(task) = self.tick.take() {
            task.cancel();
        }
        self.elapsed_seconds()
    }

    /// Whole seconds since `start()`, floored; 0 when never started.
    /// Pure read, usable in any state.
    pub fn elapsed_seconds(&self) -> u64 {
        self.started_at.map(elapsed_since).unwrap_or(0)
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Mark the session finished without tearing down the tick task. The
    /// tick closure observes the flag and goes quiet; the task itself is
    /// reclaimed by the next `start()` or `stop()`. For hosts that end a
    /// session out-of-band.
    pub fn mark_finished(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    /// Merge a completion time into the persisted board (ascending, capped
    /// at five entries, duplicates kept) and write it back.
    pub fn save_time(&self, secs: u64) -> std::io::Result<()> {
        let merged = best_times::merge(&self.best_times(), secs);
        self.store
            .set(best_times::BEST_TIMES_KEY, &best_times::encode(&merged))
    }

    /// Current persisted board, ascending. Absent or malformed content
    /// reads as an empty board, never an error.
    pub fn best_times(&self) -> Vec<u64> {
        self.store
            .get(best_times::BEST_TIMES_KEY)
            .map(|value| best_times::decode(&value))
            .unwrap_or_default()
    }

    /// Report the end-of-game result: compute the rank `current_time`
    /// would take on the board and hand the notifier a message carrying
    /// the time and the ranked board. Mutates nothing; persisting the
    /// played time stays with the caller.
    pub fn show_end_game_modal(&self, current_time: u64) {
        let board = self.best_times();
        let rank = best_times::rank_of(&board, current_time);
        let message = compose_message(current_time, &board, rank);
        self.notifier.show(&EndGamePayload {
            message,
            elapsed_secs: current_time,
            rank,
        });
    }
}

fn elapsed_since(start: SystemTime) -> u64 {
    SystemTime::now()
        .duration_since(start)
        .unwrap_or_default()
        .as_secs()
}

fn compose_message(current_time: u64, board: &[u64], rank: usize) -> String {
    let mut message = format!("You finished in {current_time}s!\n");
    if board.is_empty() {
        message.push_str("First time on the board.");
    } else {
        message.push_str(&format!("That puts you at #{rank} on the board.\n"));
        message.push_str("Best times:\n");
        for (idx, secs) in board.iter().enumerate() {
            message.push_str(&format!("#{}: {}s\n", idx + 1, secs));
        }
    }
    message
}
