use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyModifiers};

/// Cancellable periodic task. The worker parks on a cancellation channel
/// and fires the callback each time the wait times out, so `cancel()` is
/// observed at the next wakeup at the latest.
pub struct TickTask {
    cancel_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl TickTask {
    pub fn spawn<F>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel();
        let handle = thread::spawn(move || loop {
            match cancel_rx.recv_timeout(interval) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => tick(),
            }
        });
        Self {
            cancel_tx,
            handle: Some(handle),
        }
    }

    /// Signal the worker and wait for it to exit. No callback invocation
    /// can happen after this returns.
    pub fn cancel(mut self) {
        self.cancel_inner();
    }

    fn cancel_inner(&mut self) {
        let _ = self.cancel_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TickTask {
    fn drop(&mut self) {
        self.cancel_inner();
    }
}

/// The two things a player can ask of a running session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    /// Stop the clock and record the run
    Stop,
    /// Throw the run away
    Abandon,
}

/// Where session commands come from. The terminal implementation decodes
/// key presses on a reader thread; tests feed commands through a channel.
pub trait CommandSource {
    /// Wait up to `timeout` for the next command. None means it expired
    /// with nothing decodable arriving.
    fn next_command(&self, timeout: Duration) -> Option<SessionCommand>;
}

/// Maps a key press to a session command. Enter stops the clock; Esc and
/// ctrl-c abandon the run. Anything else is noise while the clock runs.
pub fn decode_key(code: KeyCode, modifiers: KeyModifiers) -> Option<SessionCommand> {
    match code {
        KeyCode::Enter => Some(SessionCommand::Stop),
        KeyCode::Esc => Some(SessionCommand::Abandon),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(SessionCommand::Abandon)
        }
        _ => None,
    }
}

/// Command source backed by real terminal input. Non-key events are
/// dropped at the reader; this host redraws nothing on resize.
pub struct TerminalCommandSource {
    rx: Receiver<SessionCommand>,
}

impl TerminalCommandSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if let Some(command) = decode_key(key.code, key.modifiers) {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for TerminalCommandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSource for TerminalCommandSource {
    fn next_command(&self, timeout: Duration) -> Option<SessionCommand> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Channel-fed command source for tests and headless hosts.
pub struct ChannelCommandSource {
    rx: Receiver<SessionCommand>,
}

impl ChannelCommandSource {
    pub fn new(rx: Receiver<SessionCommand>) -> Self {
        Self { rx }
    }
}

impl CommandSource for ChannelCommandSource {
    fn next_command(&self, timeout: Duration) -> Option<SessionCommand> {
        self.rx.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn tick_task_fires_repeatedly() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = TickTask::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(60));
        task.cancel();
        assert!(count.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn tick_task_cancel_stops_callbacks() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = TickTask::spawn(Duration::from_millis(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(30));
        task.cancel();

        let after_cancel = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_cancel);
    }

    #[test]
    fn tick_task_drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&count);
            let _task = TickTask::spawn(Duration::from_millis(5), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            std::thread::sleep(Duration::from_millis(20));
        }

        let after_drop = count.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn enter_stops_the_clock() {
        assert_eq!(
            decode_key(KeyCode::Enter, KeyModifiers::NONE),
            Some(SessionCommand::Stop)
        );
    }

    #[test]
    fn esc_and_ctrl_c_abandon_the_run() {
        assert_eq!(
            decode_key(KeyCode::Esc, KeyModifiers::NONE),
            Some(SessionCommand::Abandon)
        );
        assert_eq!(
            decode_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(SessionCommand::Abandon)
        );
    }

    #[test]
    fn other_keys_are_noise() {
        assert_eq!(decode_key(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(decode_key(KeyCode::Char('x'), KeyModifiers::NONE), None);
        assert_eq!(decode_key(KeyCode::Backspace, KeyModifiers::NONE), None);
    }

    #[test]
    fn channel_source_times_out_empty() {
        let (_tx, rx) = mpsc::channel();
        let source = ChannelCommandSource::new(rx);
        assert_eq!(source.next_command(Duration::from_millis(1)), None);
    }

    #[test]
    fn channel_source_delivers_commands_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(SessionCommand::Stop).unwrap();
        tx.send(SessionCommand::Abandon).unwrap();
        let source = ChannelCommandSource::new(rx);

        assert_eq!(
            source.next_command(Duration::from_millis(10)),
            Some(SessionCommand::Stop)
        );
        assert_eq!(
            source.next_command(Duration::from_millis(10)),
            Some(SessionCommand::Abandon)
        );
    }
}
