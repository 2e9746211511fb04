// Copyright 2025 Zurich Instruments AG
// SPDX-License-Identifier: Apache-2.0

//! Logging macros shared by the `qmeas` crates.
//!
//! All records go through the `log` facade with a `qmeas.rust::<module>`
//! target, so a host application can filter them with [`TARGET_PREFIX`].

use std::sync::atomic::{AtomicBool, Ordering};

#[doc(hidden)]
pub use log as _log;

/// Target prefix of every record emitted through the macros of this crate.
pub const TARGET_PREFIX: &str = "qmeas.rust";

/// Log target of the calling module. Starts with [`TARGET_PREFIX`].
#[macro_export]
macro_rules! log_target {
    () => {
        concat!("qmeas.rust::", module_path!())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($level:ident, $msg:literal $(, $arg:expr)* $(,)?) => {
        $crate::_log::$level!(target: $crate::log_target!(), $msg $(, $arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($t:tt)+) => {
        $crate::__log!(info, $($t)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)+) => {
        $crate::__log!(warn, $($t)+)
    };
}

/// Log at info level, but only while diagnostics are enabled.
#[macro_export]
macro_rules! diagnostic {
    ($($t:tt)+) => {
        if $crate::is_diagnostics_enabled() {
            $crate::__log!(info, $($t)+);
        }
    };
}

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::Acquire)
}

/// Set the diagnostics switch.
///
/// Libraries never install a logger; binaries pick their own backend (the
/// `qmeas` CLI uses `env_logger` filtered on [`TARGET_PREFIX`]).
pub fn init_logging(with_diagnostics: bool) {
    DIAGNOSTICS_ENABLED.store(with_diagnostics, Ordering::Release);
}
