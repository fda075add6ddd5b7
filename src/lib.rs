/// Macro for prefixed status logging to stderr (only when stderr is a terminal).
///
/// Usage:
/// ```ignore
/// log_status!("replace", "Processed: {} - {} replacements", path, count);
/// log_status!("refactor", "Renamed file: {} -> {}", from, to);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `wildkit::corpus` instead of `wildkit::core::corpus`
pub use self::core::*;
pub use self::utils::*;
