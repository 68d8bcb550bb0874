//! Analysis settings and the capability surface value queries consume.
//!
//! A [`Settings`] value is a plain container: which message groups are
//! enabled, whether inconclusive results may be shown, and the library
//! knowledge about valid function-argument values. Queries in the
//! value-flow store take the [`QuerySettings`] capability trait instead
//! of the concrete struct so tests and embedders can supply their own.
//!
//! Termination is a process-wide cooperative flag: any executor may
//! request it, long-running passes poll it between tokens. The core
//! itself never polls.

use std::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use crate::error::{CcflowError, Result};

bitflags! {
    /// Message groups that can be switched on individually.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct EnabledGroups: u32 {
        const WARNING = 0x1;
        const STYLE = 0x2;
        const PERFORMANCE = 0x4;
        const PORTABILITY = 0x8;
        const INFORMATION = 0x10;
        const UNUSED_FUNCTION = 0x20;
        const MISSING_INCLUDE = 0x40;
        const INTERNAL = 0x80;
    }
}

static TERMINATED: AtomicBool = AtomicBool::new(false);

/// Knowledge about external functions: which argument values are valid.
///
/// Unknown functions and arguments are unconstrained — every value is
/// valid for them.
#[derive(Debug, Default)]
pub struct Library {
    int_ranges: FxHashMap<(String, usize), Vec<(i64, i64)>>,
    float_ranges: FxHashMap<(String, usize), Vec<(f64, f64)>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the valid integer ranges (inclusive) for argument `argnr`
    /// of `function`.
    pub fn set_valid_int_args(&mut self, function: &str, argnr: usize, ranges: Vec<(i64, i64)>) {
        self.int_ranges
            .insert((function.to_string(), argnr), ranges);
    }

    /// Declare the valid float ranges (inclusive) for argument `argnr`
    /// of `function`.
    pub fn set_valid_float_args(&mut self, function: &str, argnr: usize, ranges: Vec<(f64, f64)>) {
        self.float_ranges
            .insert((function.to_string(), argnr), ranges);
    }

    pub fn is_int_arg_valid(&self, function: &str, argnr: usize, value: i64) -> bool {
        match self.int_ranges.get(&(function.to_string(), argnr)) {
            Some(ranges) => ranges.iter().any(|&(lo, hi)| lo <= value && value <= hi),
            None => true,
        }
    }

    pub fn is_float_arg_valid(&self, function: &str, argnr: usize, value: f64) -> bool {
        match self.float_ranges.get(&(function.to_string(), argnr)) {
            Some(ranges) => ranges.iter().any(|&(lo, hi)| lo <= value && value <= hi),
            None => true,
        }
    }
}

/// General analysis settings.
#[derive(Debug, Default)]
pub struct Settings {
    enabled: EnabledGroups,
    /// Whether inconclusive results may be reported.
    pub inconclusive: bool,
    /// External-function knowledge.
    pub library: Library,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is the message group switched on?
    #[inline]
    pub fn is_enabled(&self, group: EnabledGroups) -> bool {
        self.enabled.contains(group)
    }

    /// Enable groups from a comma-separated id list, e.g.
    /// `"warning,performance"`. `"all"` enables everything except
    /// internal messages.
    ///
    /// # Errors
    ///
    /// An unrecognized id is a configuration error.
    pub fn add_enabled(&mut self, ids: &str) -> Result<()> {
        for id in ids.split(',') {
            let group = match id {
                "all" => {
                    EnabledGroups::all() & !EnabledGroups::INTERNAL
                }
                "warning" => EnabledGroups::WARNING,
                "style" => EnabledGroups::STYLE,
                "performance" => EnabledGroups::PERFORMANCE,
                "portability" => EnabledGroups::PORTABILITY,
                "information" => EnabledGroups::INFORMATION,
                "unusedFunction" => EnabledGroups::UNUSED_FUNCTION,
                "missingInclude" => EnabledGroups::MISSING_INCLUDE,
                "internal" => EnabledGroups::INTERNAL,
                other => {
                    return Err(CcflowError::Config(format!(
                        "unrecognized --enable parameter: '{other}'"
                    )))
                }
            };
            self.enabled.insert(group);
        }
        Ok(())
    }

    /// Disable every group.
    pub fn clear_enabled(&mut self) {
        self.enabled = EnabledGroups::empty();
    }

    /// Request that long-running analyses stop at their next cooperative
    /// check. Process-wide.
    pub fn terminate(value: bool) {
        TERMINATED.store(value, Ordering::Relaxed);
    }

    /// Has termination been requested?
    pub fn terminated() -> bool {
        TERMINATED.load(Ordering::Relaxed)
    }
}

/// Capability surface the value-flow queries consume.
pub trait QuerySettings {
    /// May inconclusive values be used?
    fn inconclusive_enabled(&self) -> bool;

    /// Are warning-gated (conditional) values usable?
    fn warning_enabled(&self) -> bool;

    /// Is `value` a valid integer for argument `argnr` of `function`?
    fn is_int_arg_valid(&self, function: &str, argnr: usize, value: i64) -> bool;

    /// Is `value` a valid float for argument `argnr` of `function`?
    fn is_float_arg_valid(&self, function: &str, argnr: usize, value: f64) -> bool;
}

impl QuerySettings for Settings {
    fn inconclusive_enabled(&self) -> bool {
        self.inconclusive
    }

    fn warning_enabled(&self) -> bool {
        self.is_enabled(EnabledGroups::WARNING)
    }

    fn is_int_arg_valid(&self, function: &str, argnr: usize, value: i64) -> bool {
        self.library.is_int_arg_valid(function, argnr, value)
    }

    fn is_float_arg_valid(&self, function: &str, argnr: usize, value: f64) -> bool {
        self.library.is_float_arg_valid(function, argnr, value)
    }
}
