use super::buffer::RecordBuffer;
use crate::dataset::Dataset;
use crate::domain::{CoreResult, IceflowError, MaxTimestep};
use crate::grid::{Field2, FieldMetadata, Grid};

/// A gridded, time-indexed forcing variable read through the dataset
/// collaborator.
///
/// Records are cached in a bounded ring buffer; after `update(t, dt)` the
/// buffer holds every record needed to answer pointwise or averaged
/// queries within `[t, t + dt]`. Periodic variables keep all records
/// resident (their time axis must lie within `[0, period)`), so the
/// buffer must be at least as large as the record count.
pub struct ForcingField {
    metadata: FieldMetadata,
    dataset: Box<dyn Dataset>,
    buffer: RecordBuffer,
    times: Vec<f64>,
    period: f64,
    reference_time: f64,
    evaluations_per_year: usize,
    current: Field2,
    initialized: bool,
}

impl std::fmt::Debug for ForcingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForcingField")
            .field("variable", &self.metadata.name)
            .field("n_records", &self.times.len())
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl ForcingField {
    pub fn new(
        grid: &Grid,
        dataset: Box<dyn Dataset>,
        metadata: FieldMetadata,
        buffer_size: usize,
        evaluations_per_year: usize,
        period: f64,
        reference_time: f64,
    ) -> CoreResult<Self> {
        if period < 0.0 {
            return Err(IceflowError::configuration(format!(
                "variable '{}': period must be non-negative, got {period}",
                metadata.name
            )));
        }
        if !dataset.has_variable(&metadata.name) {
            return Err(IceflowError::dataset(
                dataset.label(),
                format!("variable '{}' not found", metadata.name),
            ));
        }
        let units = dataset.variable_units(&metadata.name)?;
        if units != metadata.units {
            return Err(IceflowError::dataset(
                dataset.label(),
                format!(
                    "variable '{}' has units '{units}', expected '{}'",
                    metadata.name, metadata.units
                ),
            ));
        }
        let shape = dataset.variable_shape(&metadata.name)?;
        if shape != (grid.mx(), grid.my()) {
            return Err(IceflowError::dataset(
                dataset.label(),
                format!(
                    "variable '{}' has shape {} x {}, grid is {} x {}",
                    metadata.name,
                    shape.0,
                    shape.1,
                    grid.mx(),
                    grid.my()
                ),
            ));
        }
        let current = Field2::new(grid, metadata.clone());
        Ok(Self {
            metadata,
            dataset,
            buffer: RecordBuffer::new(buffer_size),
            times: Vec::new(),
            period,
            reference_time,
            evaluations_per_year: evaluations_per_year.max(1),
            current,
            initialized: false,
        })
    }

    /// Reads and validates the variable's time axis.
    pub fn init(&mut self) -> CoreResult<()> {
        let times = self.dataset.variable_times(&self.metadata.name)?.to_vec();
        if times.is_empty() {
            return Err(IceflowError::dataset(
                self.dataset.label(),
                format!("variable '{}' has no time records", self.metadata.name),
            ));
        }
        for pair in times.windows(2) {
            if pair[1] <= pair[0] {
                return Err(IceflowError::dataset(
                    self.dataset.label(),
                    format!(
                        "variable '{}': time axis is not strictly increasing ({} then {})",
                        self.metadata.name, pair[0], pair[1]
                    ),
                ));
            }
        }
        if self.is_periodic() {
            let first = times[0];
            let last = times[times.len() - 1];
            if first < 0.0 || last >= self.period {
                return Err(IceflowError::dataset(
                    self.dataset.label(),
                    format!(
                        "variable '{}': periodic time axis [{first}, {last}] must lie within [0, {})",
                        self.metadata.name, self.period
                    ),
                ));
            }
        }
        self.times = times;
        self.initialized = true;
        Ok(())
    }

    pub fn is_periodic(&self) -> bool {
        self.period > 0.0
    }

    pub fn n_records(&self) -> usize {
        self.times.len()
    }

    pub fn metadata(&self) -> &FieldMetadata {
        &self.metadata
    }

    /// The result of the last `average` call.
    pub fn current(&self) -> &Field2 {
        &self.current
    }

    /// Ensures the buffer holds every record needed over `[t, t + dt]`.
    pub fn update(&mut self, t: f64, dt: f64) -> CoreResult<()> {
        self.require_initialized()?;
        if dt < 0.0 {
            return Err(IceflowError::configuration(format!(
                "variable '{}': update requires dt >= 0, got {dt}",
                self.metadata.name
            )));
        }
        let required = self.required_records(t, dt);
        if required.len() > self.buffer.capacity() {
            return Err(IceflowError::dataset(
                self.dataset.label(),
                format!(
                    "variable '{}': interval [{t}, {}] needs {} records but the buffer holds {}",
                    self.metadata.name,
                    t + dt,
                    required.len(),
                    self.buffer.capacity()
                ),
            ));
        }
        for record in required {
            if self.buffer.contains(record) {
                continue;
            }
            let values = self.dataset.read_record(&self.metadata.name, record)?;
            if values.len() != self.current.len() {
                return Err(IceflowError::dataset(
                    self.dataset.label(),
                    format!(
                        "variable '{}': record {record} has {} values, expected {}",
                        self.metadata.name,
                        values.len(),
                        self.current.len()
                    ),
                ));
            }
            self.metadata.check_values(&values)?;
            self.buffer.insert(record, values);
        }
        Ok(())
    }

    /// Piecewise-linear evaluation at an instant. Outside the time axis the
    /// nearest record is used; periodic variables wrap.
    pub fn interp(&self, t: f64) -> CoreResult<Vec<f64>> {
        self.require_initialized()?;
        let n = self.times.len();
        if n == 1 {
            return Ok(self.buffered(0)?.to_vec());
        }
        if self.is_periodic() {
            let phase = (t - self.reference_time).rem_euclid(self.period);
            let first = self.times[0];
            let last = self.times[n - 1];
            if phase <= first {
                // on the wrap segment approaching the first record
                let span = first + self.period - last;
                let alpha = (phase + self.period - last) / span;
                return self.blend(n - 1, 0, alpha);
            }
            if phase >= last {
                let span = first + self.period - last;
                let alpha = (phase - last) / span;
                return self.blend(n - 1, 0, alpha);
            }
            return self.interp_interior(phase);
        }
        if t <= self.times[0] {
            return Ok(self.buffered(0)?.to_vec());
        }
        if t >= self.times[n - 1] {
            return Ok(self.buffered(n - 1)?.to_vec());
        }
        self.interp_interior(t)
    }

    fn interp_interior(&self, t: f64) -> CoreResult<Vec<f64>> {
        let k = self.times.partition_point(|&x| x <= t) - 1;
        if self.times[k] == t {
            return Ok(self.buffered(k)?.to_vec());
        }
        let alpha = (t - self.times[k]) / (self.times[k + 1] - self.times[k]);
        self.blend(k, k + 1, alpha)
    }

    fn blend(&self, left: usize, right: usize, alpha: f64) -> CoreResult<Vec<f64>> {
        let a = self.buffered(left)?;
        let b = self.buffered(right)?;
        Ok(a.iter()
            .zip(b)
            .map(|(x, y)| (1.0 - alpha) * x + alpha * y)
            .collect())
    }

    /// Fills the owned output field with the time average over
    /// `[t, t + dt]`; `dt == 0` degenerates to pointwise evaluation at `t`.
    pub fn average(&mut self, t: f64, dt: f64) -> CoreResult<()> {
        if dt == 0.0 {
            let values = self.interp(t)?;
            return self.current.set_values(&values);
        }
        let samples = ((dt * self.evaluations_per_year as f64).ceil() as usize).max(1);
        let mut accumulated = vec![0.0; self.current.len()];
        for sample in 0..samples {
            let ts = t + (sample as f64 + 0.5) * dt / samples as f64;
            let values = self.interp(ts)?;
            for (sum, value) in accumulated.iter_mut().zip(&values) {
                *sum += value;
            }
        }
        let scale = 1.0 / samples as f64;
        for sum in &mut accumulated {
            *sum *= scale;
        }
        self.current.set_values(&accumulated)
    }

    /// The largest step from `t` whose record needs fit the buffer.
    pub fn max_timestep(&self, t: f64) -> MaxTimestep {
        let n = self.times.len();
        if !self.initialized || self.is_periodic() || n <= self.buffer.capacity() {
            return MaxTimestep::unlimited();
        }
        let k0 = self.times.partition_point(|&x| x <= t).saturating_sub(1);
        let reachable = k0 + self.buffer.capacity() - 1;
        if reachable >= n - 1 {
            return MaxTimestep::unlimited();
        }
        MaxTimestep::limited((self.times[reachable] - t).max(0.0))
    }

    fn required_records(&self, t: f64, dt: f64) -> Vec<usize> {
        let n = self.times.len();
        if n == 1 {
            return vec![0];
        }
        if self.is_periodic() {
            // periodic axes stay fully resident; wrap brackets need both ends
            return (0..n).collect();
        }
        let first = self.times.partition_point(|&x| x <= t).saturating_sub(1);
        let last = self.times.partition_point(|&x| x < t + dt).min(n - 1);
        (first..=last.max(first)).collect()
    }

    fn buffered(&self, record: usize) -> CoreResult<&[f64]> {
        self.buffer.get(record).ok_or_else(|| {
            IceflowError::dataset(
                self.dataset.label(),
                format!(
                    "variable '{}': record {record} is not buffered; update() did not cover the queried interval",
                    self.metadata.name
                ),
            )
        })
    }

    fn require_initialized(&self) -> CoreResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(IceflowError::dataset(
                self.dataset.label(),
                format!("variable '{}' used before init()", self.metadata.name),
            ))
        }
    }
}
