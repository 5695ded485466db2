use crate::dataset::{Dataset, JsonDataset};
use crate::domain::{CoreResult, IceflowError, MaxTimestep};
use std::path::PathBuf;

/// A non-spatial forcing time series holding an interpolated current value.
///
/// Scalar series are small, so the whole series is kept resident; the
/// bounded-buffer contract applies to gridded forcing only. The series is
/// piecewise-linear with constant extrapolation outside its time axis;
/// periodic series wrap like gridded forcing (axis within `[0, period)`).
#[derive(Debug, Clone)]
pub struct ScalarForcing {
    variable: String,
    units: String,
    long_name: String,
    file: Option<PathBuf>,
    period: f64,
    reference_time: f64,
    times: Vec<f64>,
    values: Vec<f64>,
    current: f64,
    initialized: bool,
}

impl ScalarForcing {
    /// A series read from its own dataset file at `init` time.
    pub fn from_file(
        file: impl Into<PathBuf>,
        variable: impl Into<String>,
        units: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        Self {
            variable: variable.into(),
            units: units.into(),
            long_name: long_name.into(),
            file: Some(file.into()),
            period: 0.0,
            reference_time: 0.0,
            times: Vec::new(),
            values: Vec::new(),
            current: 0.0,
            initialized: false,
        }
    }

    /// A series supplied directly, already initialized.
    pub fn from_series(
        variable: impl Into<String>,
        units: impl Into<String>,
        long_name: impl Into<String>,
        times: Vec<f64>,
        values: Vec<f64>,
    ) -> CoreResult<Self> {
        let mut forcing = Self {
            variable: variable.into(),
            units: units.into(),
            long_name: long_name.into(),
            file: None,
            period: 0.0,
            reference_time: 0.0,
            times,
            values,
            current: 0.0,
            initialized: false,
        };
        forcing.validate_series()?;
        forcing.initialized = true;
        Ok(forcing)
    }

    pub fn with_period(mut self, period: f64, reference_time: f64) -> Self {
        self.period = period;
        self.reference_time = reference_time;
        self
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Loads the series when file-backed and validates its time axis.
    pub fn init(&mut self) -> CoreResult<()> {
        if let Some(file) = &self.file {
            let dataset = JsonDataset::open(file)?;
            let units = dataset.variable_units(&self.variable)?;
            if units != self.units {
                return Err(IceflowError::dataset(
                    dataset.label(),
                    format!(
                        "variable '{}' has units '{units}', expected '{}'",
                        self.variable, self.units
                    ),
                ));
            }
            let (times, values) = dataset.read_scalar_series(&self.variable)?;
            self.times = times;
            self.values = values;
        }
        self.validate_series()?;
        self.initialized = true;
        Ok(())
    }

    /// Sets the current value to the series average over `[t, t + dt]`;
    /// `dt == 0` degenerates to pointwise evaluation at `t`.
    pub fn update(&mut self, t: f64, dt: f64) -> CoreResult<()> {
        if !self.initialized {
            return Err(IceflowError::configuration(format!(
                "scalar forcing '{}' used before init()",
                self.variable
            )));
        }
        if dt < 0.0 {
            return Err(IceflowError::configuration(format!(
                "scalar forcing '{}': update requires dt >= 0, got {dt}",
                self.variable
            )));
        }
        self.current = if dt == 0.0 {
            self.value_at(t)
        } else {
            self.integral(t, t + dt) / dt
        };
        Ok(())
    }

    /// The value computed by the last `update` call.
    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn value_at(&self, t: f64) -> f64 {
        if self.is_periodic() {
            self.eval_phase((t - self.reference_time).rem_euclid(self.period))
        } else {
            self.eval_clamped(t)
        }
    }

    pub fn max_timestep(&self, _t: f64) -> MaxTimestep {
        MaxTimestep::unlimited()
    }

    fn is_periodic(&self) -> bool {
        self.period > 0.0
    }

    fn validate_series(&self) -> CoreResult<()> {
        if self.times.is_empty() || self.times.len() != self.values.len() {
            return Err(IceflowError::dataset(
                self.variable.clone(),
                format!(
                    "series has {} times and {} values",
                    self.times.len(),
                    self.values.len()
                ),
            ));
        }
        for pair in self.times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(IceflowError::dataset(
                    self.variable.clone(),
                    format!(
                        "time axis is not strictly increasing ({} then {})",
                        pair[0], pair[1]
                    ),
                ));
            }
        }
        if self.is_periodic() {
            let first = self.times[0];
            let last = self.times[self.times.len() - 1];
            if first < 0.0 || last >= self.period {
                return Err(IceflowError::dataset(
                    self.variable.clone(),
                    format!(
                        "periodic time axis [{first}, {last}] must lie within [0, {})",
                        self.period
                    ),
                ));
            }
        }
        Ok(())
    }

    fn eval_clamped(&self, t: f64) -> f64 {
        let n = self.times.len();
        if t <= self.times[0] {
            return self.values[0];
        }
        if t >= self.times[n - 1] {
            return self.values[n - 1];
        }
        let k = self.times.partition_point(|&x| x <= t) - 1;
        let alpha = (t - self.times[k]) / (self.times[k + 1] - self.times[k]);
        (1.0 - alpha) * self.values[k] + alpha * self.values[k + 1]
    }

    fn eval_phase(&self, phase: f64) -> f64 {
        let n = self.times.len();
        if n == 1 {
            return self.values[0];
        }
        let first = self.times[0];
        let last = self.times[n - 1];
        if phase <= first || phase >= last {
            // the wrap segment from the last record to the first of the
            // next period
            let span = first + self.period - last;
            let distance = if phase >= last {
                phase - last
            } else {
                phase + self.period - last
            };
            let alpha = distance / span;
            return (1.0 - alpha) * self.values[n - 1] + alpha * self.values[0];
        }
        let k = self.times.partition_point(|&x| x <= phase) - 1;
        let alpha = (phase - self.times[k]) / (self.times[k + 1] - self.times[k]);
        (1.0 - alpha) * self.values[k] + alpha * self.values[k + 1]
    }

    /// Exact integral of the series over `[a, b]`, `a <= b`.
    fn integral(&self, a: f64, b: f64) -> f64 {
        if !self.is_periodic() {
            return self.integral_clamped(a, b);
        }
        let period = self.period;
        let full_periods = ((b - a) / period).floor();
        let one_period = self.integral_phase(0.0, period);
        let start_phase = (a - self.reference_time).rem_euclid(period);
        let remainder = (b - a) - full_periods * period;
        let partial = if start_phase + remainder <= period {
            self.integral_phase(start_phase, start_phase + remainder)
        } else {
            self.integral_phase(start_phase, period)
                + self.integral_phase(0.0, start_phase + remainder - period)
        };
        full_periods * one_period + partial
    }

    fn integral_clamped(&self, a: f64, b: f64) -> f64 {
        self.trapezoid(a, b, |t| self.eval_clamped(t))
    }

    fn integral_phase(&self, a: f64, b: f64) -> f64 {
        self.trapezoid(a, b, |t| self.eval_phase(t))
    }

    /// Trapezoid sum over `[a, b]` split at the series' own knots; exact
    /// for a piecewise-linear integrand.
    fn trapezoid(&self, a: f64, b: f64, eval: impl Fn(f64) -> f64) -> f64 {
        if b <= a {
            return 0.0;
        }
        let mut knots = vec![a];
        for &time in &self.times {
            if time > a && time < b {
                knots.push(time);
            }
        }
        knots.push(b);
        let mut total = 0.0;
        for pair in knots.windows(2) {
            let (x0, x1) = (pair[0], pair[1]);
            total += 0.5 * (eval(x0) + eval(x1)) * (x1 - x0);
        }
        total
    }
}
