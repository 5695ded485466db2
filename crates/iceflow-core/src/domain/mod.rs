pub mod errors;

pub use errors::{CoreResult, ErrorCategory, IceflowError};

use std::path::PathBuf;

/// How a run obtains its starting model state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOptions {
    /// Re-start from a previous run's output dataset; state-carrying
    /// components read their variables' last time record from it.
    Restart { file: PathBuf },
    /// Cold start; state-carrying components synthesize their state with a
    /// zero-length update at the run start time.
    Bootstrap,
}

impl InputOptions {
    pub fn is_restart(&self) -> bool {
        matches!(self, Self::Restart { .. })
    }
}

/// One-time post-init state correction from an explicitly named dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegridOptions {
    pub file: PathBuf,
}

/// Startup context handed to every component's `init`.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input: InputOptions,
    pub regrid: Option<RegridOptions>,
    /// Model time at the start of the run, in years.
    pub start_time: f64,
}

impl RunContext {
    pub fn bootstrap(start_time: f64) -> Self {
        Self {
            input: InputOptions::Bootstrap,
            regrid: None,
            start_time,
        }
    }

    pub fn restart(file: impl Into<PathBuf>, start_time: f64) -> Self {
        Self {
            input: InputOptions::Restart { file: file.into() },
            regrid: None,
            start_time,
        }
    }

    pub fn with_regrid(mut self, file: impl Into<PathBuf>) -> Self {
        self.regrid = Some(RegridOptions { file: file.into() });
        self
    }
}

/// Largest time step a component can represent starting at a given time.
/// `unlimited` means the component imposes no temporal-accuracy constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxTimestep(Option<f64>);

impl MaxTimestep {
    pub fn unlimited() -> Self {
        Self(None)
    }

    pub fn limited(dt: f64) -> Self {
        Self(Some(dt))
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    pub fn is_limited(&self) -> bool {
        self.0.is_some()
    }

    /// The tighter of two constraints.
    pub fn min(self, other: Self) -> Self {
        match (self.0, other.0) {
            (Some(a), Some(b)) => Self(Some(a.min(b))),
            (Some(a), None) => Self(Some(a)),
            (None, b) => Self(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{InputOptions, MaxTimestep, RunContext};

    #[test]
    fn min_picks_the_tighter_constraint() {
        let unlimited = MaxTimestep::unlimited();
        let one_year = MaxTimestep::limited(1.0);
        let decade = MaxTimestep::limited(10.0);

        assert_eq!(unlimited.min(one_year), one_year);
        assert_eq!(one_year.min(unlimited), one_year);
        assert_eq!(decade.min(one_year), one_year);
        assert_eq!(unlimited.min(unlimited), unlimited);
    }

    #[test]
    fn restart_context_records_the_state_file() {
        let ctx = RunContext::restart("out/run.json", 100.0);
        assert!(ctx.input.is_restart());
        assert_eq!(ctx.start_time, 100.0);
        assert!(ctx.regrid.is_none());

        let ctx = RunContext::bootstrap(0.0).with_regrid("regrid.json");
        assert_eq!(ctx.input, InputOptions::Bootstrap);
        assert!(ctx.regrid.is_some());
    }
}
