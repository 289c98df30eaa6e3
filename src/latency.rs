//! Per-operation latency injection, modelling the cost of a real tape
//! device. A [`LatencyPolicy`] holds three delays and sleeps the caller for
//! the appropriate one at the entry of each [`Tape`](crate::tape::Tape)
//! operation.

use std::{fs, path::Path, thread, time::Duration};

use crate::error::{Error, TapeResult};

/// Three non-negative per-operation delays, in nanoseconds.
///
/// Parsed from a plain-text configuration file containing three
/// whitespace-separated non-negative decimal integers, in the order
/// `read_write_ns step_ns jump_ns`. Absence of a configured path means all
/// delays are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyPolicy {
    read_write: Duration,
    step: Duration,
    jump: Duration,
}

impl LatencyPolicy {
    /// Returns a policy with every delay set to zero.
    pub fn none() -> Self {
        Self::default()
    }

    /// Loads a policy from a configuration file. `None` yields the
    /// zero-delay policy. A supplied path that cannot be opened or does not
    /// contain three non-negative integers is a fatal
    /// [`Error::Configuration`].
    pub fn from_path(path: Option<&Path>) -> TapeResult<Self> {
        let Some(path) = path else {
            return Ok(Self::none());
        };

        let contents = fs::read_to_string(path).map_err(|err| Error::Configuration {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;

        let mut parts = contents.split_ascii_whitespace();
        let mut next_delay = || -> TapeResult<Duration> {
            let token = parts.next().ok_or_else(|| Error::Configuration {
                path: path.display().to_string(),
                reason: "expected three whitespace-separated integers".into(),
            })?;
            let ns: u64 = token.parse().map_err(|_| Error::Configuration {
                path: path.display().to_string(),
                reason: format!("not a non-negative integer: {token:?}"),
            })?;
            Ok(Duration::from_nanos(ns))
        };

        let read_write = next_delay()?;
        let step = next_delay()?;
        let jump = next_delay()?;

        Ok(LatencyPolicy {
            read_write,
            step,
            jump,
        })
    }

    pub(crate) fn sleep_read_write(&self) {
        if !self.read_write.is_zero() {
            thread::sleep(self.read_write);
        }
    }

    pub(crate) fn sleep_step(&self) {
        if !self.step.is_zero() {
            thread::sleep(self.step);
        }
    }

    pub(crate) fn sleep_jump(&self) {
        if !self.jump.is_zero() {
            thread::sleep(self.jump);
        }
    }
}
