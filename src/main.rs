use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
    tty::IsTty,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use stint::{
    best_times,
    runtime::{CommandSource, SessionCommand, TerminalCommandSource},
    session_log::{SessionLog, SessionRecord},
    store::{FileKvStore, KvStore},
    tracker::{EndGamePayload, Notifier, TimerDisplay, Tracker},
    util::format_clock,
    TICK_RATE_MS,
};

/// terminal session timer with a persisted best-times board
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Times one play session, keeps your five best completion times on a persisted board, and tells you where the run you just finished would rank."
)]
struct Cli {
    /// print the best-times board and exit
    #[clap(short, long)]
    best: bool,

    /// path to the key-value store file
    #[clap(long)]
    store: Option<PathBuf>,

    /// path to the session history log
    #[clap(long)]
    log: Option<PathBuf>,
}

/// Rewrites a single terminal line with the running clock.
struct StdoutTimerDisplay;

impl TimerDisplay for StdoutTimerDisplay {
    fn set_timer(&self, elapsed_secs: u64) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
        let _ = write!(
            stdout,
            "  {} ({}s)",
            format_clock(elapsed_secs),
            elapsed_secs
        );
        let _ = stdout.flush();
    }
}

/// Prints the end-of-game message; `hide` clears the last shown block's
/// trailing line (line-oriented hosts have nothing else to dismiss).
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, payload: &EndGamePayload) {
        println!();
        for line in payload.message.lines() {
            println!("{line}");
        }
    }

    fn hide(&self) {
        let mut stdout = io::stdout();
        let _ = execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store: Arc<dyn KvStore> = Arc::new(match &cli.store {
        Some(path) => FileKvStore::with_path(path),
        None => FileKvStore::new(),
    });

    if cli.best {
        print_board(store.as_ref());
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut tracker = Tracker::new(
        Arc::new(StdoutTimerDisplay),
        Arc::new(TerminalNotifier),
        Arc::clone(&store),
    );

    enable_raw_mode()?;
    print!("Session running. Enter stops the clock, Esc abandons the run.\r\n");
    io::stdout().flush()?;
    tracker.start();

    let source = TerminalCommandSource::new();
    let poll = Duration::from_millis(TICK_RATE_MS);
    let command = loop {
        if let Some(command) = source.next_command(poll) {
            break command;
        }
    };

    let elapsed = tracker.stop();
    disable_raw_mode()?;
    println!();

    if command == SessionCommand::Abandon {
        println!("Run abandoned after {}s; nothing recorded.", elapsed);
        return Ok(());
    }

    // Rank is reported against the board as it stood before this run.
    let board = tracker.best_times();
    let rank = best_times::rank_of(&board, elapsed);
    tracker.show_end_game_modal(elapsed);
    tracker.save_time(elapsed)?;

    let log = match &cli.log {
        Some(path) => SessionLog::with_path(path),
        None => SessionLog::new(),
    };
    log.append(&SessionRecord::now(elapsed, rank, board.len()))?;

    Ok(())
}

fn print_board(store: &dyn KvStore) {
    let board = store
        .get(best_times::BEST_TIMES_KEY)
        .map(|value| best_times::decode(&value))
        .unwrap_or_default();

    if board.is_empty() {
        println!("No best times recorded yet.");
        return;
    }

    println!("Best times:");
    for (idx, secs) in board.iter().enumerate() {
        println!("#{}: {}s", idx + 1, secs);
    }
}
