//! Runtime mode configuration.
//!
//! The mode is set via the `FMI2CB_MODE` environment variable:
//! - `console` (default): the logger prints one line per call to stdout.
//! - `trace`: as `console`, and the memory callbacks print a
//!   `[OK]: allocateMemory()` / `[OK]: freeMemory()` line per call.
//! - `silent`: the logger prints nothing.
//!
//! Hosts that embed the library can override the environment with
//! [`set_log_mode`].

use std::sync::atomic::{AtomicU8, Ordering};

/// Name of the environment variable read on first use.
pub const MODE_ENV_VAR: &str = "FMI2CB_MODE";

/// Output behaviour of the default callbacks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogMode {
    /// Logger lines go to stdout.
    #[default]
    Console,
    /// Logger lines plus allocator/deallocator trace lines.
    Trace,
    /// No output at all.
    Silent,
}

impl LogMode {
    /// Parse from string (case-insensitive). Unrecognised input maps to `Console`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" | "verbose" => Self::Trace,
            "silent" | "off" | "quiet" | "none" => Self::Silent,
            _ => Self::Console,
        }
    }

    /// Whether the logger writes its line.
    #[must_use]
    pub const fn logs_enabled(self) -> bool {
        !matches!(self, Self::Silent)
    }

    /// Whether the memory callbacks announce themselves.
    #[must_use]
    pub const fn traces_memory(self) -> bool {
        matches!(self, Self::Trace)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Trace => "trace",
            Self::Silent => "silent",
        }
    }
}

// Atomic cache: 0=unresolved, 1=Console, 2=Trace, 3=Silent.
static CACHED_MODE: AtomicU8 = AtomicU8::new(0);

const MODE_UNRESOLVED: u8 = 0;
const MODE_CONSOLE: u8 = 1;
const MODE_TRACE: u8 = 2;
const MODE_SILENT: u8 = 3;

fn mode_to_u8(mode: LogMode) -> u8 {
    match mode {
        LogMode::Console => MODE_CONSOLE,
        LogMode::Trace => MODE_TRACE,
        LogMode::Silent => MODE_SILENT,
    }
}

fn u8_to_mode(v: u8) -> LogMode {
    match v {
        MODE_TRACE => LogMode::Trace,
        MODE_SILENT => LogMode::Silent,
        _ => LogMode::Console,
    }
}

/// Get the configured mode (reads the environment on first call, caches thereafter).
#[must_use]
pub fn log_mode() -> LogMode {
    let cached = CACHED_MODE.load(Ordering::Acquire);
    if cached != MODE_UNRESOLVED {
        return u8_to_mode(cached);
    }

    let mode = std::env::var(MODE_ENV_VAR)
        .map(|v| LogMode::from_str_loose(&v))
        .unwrap_or_default();
    // A concurrent set_log_mode wins over the environment.
    match CACHED_MODE.compare_exchange(
        MODE_UNRESOLVED,
        mode_to_u8(mode),
        Ordering::AcqRel,
        Ordering::Acquire,
    ) {
        Ok(_) => mode,
        Err(current) => u8_to_mode(current),
    }
}

/// Override the mode for the rest of the process, ignoring the environment.
pub fn set_log_mode(mode: LogMode) {
    CACHED_MODE.store(mode_to_u8(mode), Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_modes() {
        assert_eq!(LogMode::from_str_loose("console"), LogMode::Console);
        assert_eq!(LogMode::from_str_loose("TRACE"), LogMode::Trace);
        assert_eq!(LogMode::from_str_loose("debug"), LogMode::Trace);
        assert_eq!(LogMode::from_str_loose(" silent "), LogMode::Silent);
        assert_eq!(LogMode::from_str_loose("off"), LogMode::Silent);
        assert_eq!(LogMode::from_str_loose("garbage"), LogMode::Console);
        assert_eq!(LogMode::from_str_loose(""), LogMode::Console);
    }

    #[test]
    fn mode_capabilities() {
        assert!(LogMode::Console.logs_enabled());
        assert!(!LogMode::Console.traces_memory());
        assert!(LogMode::Trace.logs_enabled());
        assert!(LogMode::Trace.traces_memory());
        assert!(!LogMode::Silent.logs_enabled());
        assert!(!LogMode::Silent.traces_memory());
    }

    #[test]
    fn u8_encoding_roundtrips() {
        for mode in [LogMode::Console, LogMode::Trace, LogMode::Silent] {
            assert_eq!(u8_to_mode(mode_to_u8(mode)), mode);
            assert_eq!(LogMode::from_str_loose(mode.as_str()), mode);
        }
        assert_eq!(u8_to_mode(MODE_UNRESOLVED), LogMode::Console);
    }

    #[test]
    fn override_sticks() {
        set_log_mode(LogMode::Trace);
        assert_eq!(log_mode(), LogMode::Trace);
        set_log_mode(LogMode::Console);
        assert_eq!(log_mode(), LogMode::Console);
    }
}
