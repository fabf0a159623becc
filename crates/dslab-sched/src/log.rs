//! Logging facilities.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};

/// Applies the color to the string if stderr (log) goes to console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

/// Logs a message at the info level, prefixed with the tick and component name.
#[macro_export]
macro_rules! log_info {
    ($tick:expr, $name:expr, $msg:expr) => (
        log::info!(
            target: $name,
            "[{:>6} {}  {}] {}",
            $tick, $crate::log::get_colored("INFO", $crate::colored::Color::Green), $name, $msg
        )
    );
    ($tick:expr, $name:expr, $format:expr, $($arg:tt)+) => (
        log::info!(
            target: $name,
            concat!("[{:>6} {}  {}] ", $format),
            $tick, $crate::log::get_colored("INFO", $crate::colored::Color::Green), $name, $($arg)+
        )
    );
}

/// Logs a message at the debug level.
#[macro_export]
macro_rules! log_debug {
    ($tick:expr, $name:expr, $msg:expr) => (
        log::debug!(
            target: $name,
            "[{:>6} {} {}] {}",
            $tick, $crate::log::get_colored("DEBUG", $crate::colored::Color::Blue), $name, $msg
        )
    );
    ($tick:expr, $name:expr, $format:expr, $($arg:tt)+) => (
        log::debug!(
            target: $name,
            concat!("[{:>6} {} {}] ", $format),
            $tick, $crate::log::get_colored("DEBUG", $crate::colored::Color::Blue), $name, $($arg)+
        )
    );
}

/// Logs a message at the trace level.
#[macro_export]
macro_rules! log_trace {
    ($tick:expr, $name:expr, $msg:expr) => (
        log::trace!(
            target: $name,
            "[{:>6} {} {}] {}",
            $tick, $crate::log::get_colored("TRACE", $crate::colored::Color::Cyan), $name, $msg
        )
    );
    ($tick:expr, $name:expr, $format:expr, $($arg:tt)+) => (
        log::trace!(
            target: $name,
            concat!("[{:>6} {} {}] ", $format),
            $tick, $crate::log::get_colored("TRACE", $crate::colored::Color::Cyan), $name, $($arg)+
        )
    );
}

/// Logs a message at the error level.
#[macro_export]
macro_rules! log_error {
    ($tick:expr, $name:expr, $msg:expr) => (
        log::error!(
            target: $name,
            "[{:>6} {} {}] {}",
            $tick, $crate::log::get_colored("ERROR", $crate::colored::Color::Red), $name, $msg
        )
    );
    ($tick:expr, $name:expr, $format:expr, $($arg:tt)+) => (
        log::error!(
            target: $name,
            concat!("[{:>6} {} {}] ", $format),
            $tick, $crate::log::get_colored("ERROR", $crate::colored::Color::Red), $name, $($arg)+
        )
    );
}

/// Logs a message at the warn level.
#[macro_export]
macro_rules! log_warn {
    ($tick:expr, $name:expr, $msg:expr) => (
        log::warn!(
            target: $name,
            "[{:>6} {}  {}] {}",
            $tick, $crate::log::get_colored("WARN", $crate::colored::Color::Yellow), $name, $msg
        )
    );
    ($tick:expr, $name:expr, $format:expr, $($arg:tt)+) => (
        log::warn!(
            target: $name,
            concat!("[{:>6} {}  {}] ", $format),
            $tick, $crate::log::get_colored("WARN", $crate::colored::Color::Yellow), $name, $($arg)+
        )
    );
}
