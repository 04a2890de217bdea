// Everything the binary and the integration tests share. Types that only
// make sense inside main.rs (the terminal display and notifier) stay there.
pub mod app_dirs;
pub mod best_times;
pub mod runtime;
pub mod session_log;
pub mod store;
pub mod tracker;
pub mod util;

/// Poll interval for the binary's event loop, in milliseconds.
pub const TICK_RATE_MS: u64 = 250;
