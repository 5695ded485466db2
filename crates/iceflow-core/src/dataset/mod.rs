//! Contract of the dataset I/O collaborator plus the reference
//! implementations shipped with the crate.
//!
//! A dataset holds named variables; each variable carries units, an
//! optional valid range, a 2D shape (scalar series use 1 x 1), and a
//! monotonic sequence of time records. `MemoryDataset` backs unit tests;
//! `JsonDataset` is the file format the CLI reads and writes.

use crate::domain::{CoreResult, IceflowError};
use crate::grid::FieldMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Read/write access to named time-record variables.
///
/// Reading never mutates; writing is define-then-append. `define_variable`
/// is idempotent for an unchanged shape so that state writers can define
/// lazily before each write.
pub trait Dataset {
    /// Identifies the dataset in error messages (a path for file-backed
    /// implementations).
    fn label(&self) -> &str;

    fn has_variable(&self, name: &str) -> bool;

    fn variable_units(&self, name: &str) -> CoreResult<&str>;

    fn variable_shape(&self, name: &str) -> CoreResult<(usize, usize)>;

    /// Times of the variable's records, in the order they were written.
    fn variable_times(&self, name: &str) -> CoreResult<&[f64]>;

    fn read_record(&self, name: &str, record: usize) -> CoreResult<Vec<f64>>;

    fn define_variable(&mut self, metadata: &FieldMetadata, shape: (usize, usize))
    -> CoreResult<()>;

    fn append_record(&mut self, name: &str, time: f64, values: &[f64]) -> CoreResult<()>;

    fn n_records(&self, name: &str) -> CoreResult<usize> {
        Ok(self.variable_times(name)?.len())
    }

    /// The variable's last available time record, the one restart
    /// consumers read.
    fn read_last_record(&self, name: &str) -> CoreResult<(f64, Vec<f64>)> {
        let times = self.variable_times(name)?;
        let last = times.len().checked_sub(1).ok_or_else(|| {
            IceflowError::dataset(
                self.label(),
                format!("variable '{name}' has no time records"),
            )
        })?;
        let time = times[last];
        Ok((time, self.read_record(name, last)?))
    }

    /// Reads a whole 1 x 1 variable as a (times, values) series.
    fn read_scalar_series(&self, name: &str) -> CoreResult<(Vec<f64>, Vec<f64>)> {
        let shape = self.variable_shape(name)?;
        if shape != (1, 1) {
            return Err(IceflowError::dataset(
                self.label(),
                format!(
                    "variable '{name}' has shape {} x {}, expected a scalar series",
                    shape.0, shape.1
                ),
            ));
        }
        let times = self.variable_times(name)?.to_vec();
        let mut values = Vec::with_capacity(times.len());
        for record in 0..times.len() {
            values.push(self.read_record(name, record)?[0]);
        }
        Ok((times, values))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVariable {
    units: String,
    long_name: String,
    valid_range: Option<(f64, f64)>,
    shape: (usize, usize),
    times: Vec<f64>,
    records: Vec<Vec<f64>>,
}

/// Variable storage shared by the in-memory and JSON-backed datasets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct VariableStore {
    variables: BTreeMap<String, StoredVariable>,
}

impl VariableStore {
    fn variable<'a>(&'a self, label: &str, name: &str) -> CoreResult<&'a StoredVariable> {
        self.variables.get(name).ok_or_else(|| {
            IceflowError::dataset(label, format!("variable '{name}' not found"))
        })
    }

    fn read_record(&self, label: &str, name: &str, record: usize) -> CoreResult<Vec<f64>> {
        let variable = self.variable(label, name)?;
        variable.records.get(record).cloned().ok_or_else(|| {
            IceflowError::dataset(
                label,
                format!(
                    "variable '{name}' has {} records, record {record} requested",
                    variable.records.len()
                ),
            )
        })
    }

    fn define_variable(
        &mut self,
        label: &str,
        metadata: &FieldMetadata,
        shape: (usize, usize),
    ) -> CoreResult<()> {
        if let Some(existing) = self.variables.get(&metadata.name) {
            if existing.shape != shape {
                return Err(IceflowError::dataset(
                    label,
                    format!(
                        "variable '{}' already defined with shape {} x {}",
                        metadata.name, existing.shape.0, existing.shape.1
                    ),
                ));
            }
            return Ok(());
        }
        self.variables.insert(
            metadata.name.clone(),
            StoredVariable {
                units: metadata.units.clone(),
                long_name: metadata.long_name.clone(),
                valid_range: metadata.valid_range,
                shape,
                times: Vec::new(),
                records: Vec::new(),
            },
        );
        Ok(())
    }

    fn append_record(
        &mut self,
        label: &str,
        name: &str,
        time: f64,
        values: &[f64],
    ) -> CoreResult<()> {
        let variable = self.variables.get_mut(name).ok_or_else(|| {
            IceflowError::dataset(label, format!("variable '{name}' not defined"))
        })?;
        let expected = variable.shape.0 * variable.shape.1;
        if values.len() != expected {
            return Err(IceflowError::dataset(
                label,
                format!(
                    "variable '{name}': record of {} values does not match shape {} x {}",
                    values.len(),
                    variable.shape.0,
                    variable.shape.1
                ),
            ));
        }
        variable.times.push(time);
        variable.records.push(values.to_vec());
        Ok(())
    }
}

macro_rules! impl_dataset_via_store {
    ($type:ty) => {
        impl Dataset for $type {
            fn label(&self) -> &str {
                &self.label
            }

            fn has_variable(&self, name: &str) -> bool {
                self.store.variables.contains_key(name)
            }

            fn variable_units(&self, name: &str) -> CoreResult<&str> {
                Ok(&self.store.variable(&self.label, name)?.units)
            }

            fn variable_shape(&self, name: &str) -> CoreResult<(usize, usize)> {
                Ok(self.store.variable(&self.label, name)?.shape)
            }

            fn variable_times(&self, name: &str) -> CoreResult<&[f64]> {
                Ok(&self.store.variable(&self.label, name)?.times)
            }

            fn read_record(&self, name: &str, record: usize) -> CoreResult<Vec<f64>> {
                self.store.read_record(&self.label, name, record)
            }

            fn define_variable(
                &mut self,
                metadata: &FieldMetadata,
                shape: (usize, usize),
            ) -> CoreResult<()> {
                self.store.define_variable(&self.label, metadata, shape)
            }

            fn append_record(&mut self, name: &str, time: f64, values: &[f64]) -> CoreResult<()> {
                self.store.append_record(&self.label, name, time, values)
            }
        }
    };
}

/// In-memory dataset for tests and synthetic forcing.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    label: String,
    store: VariableStore,
}

impl MemoryDataset {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            store: VariableStore::default(),
        }
    }
}

impl_dataset_via_store!(MemoryDataset);

/// The serde_json-backed reference dataset used by the CLI and the restart
/// round-trip path.
#[derive(Debug, Clone)]
pub struct JsonDataset {
    path: PathBuf,
    label: String,
    store: VariableStore,
}

impl JsonDataset {
    pub fn open(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| {
            IceflowError::dataset(path, format!("cannot read: {error}"))
        })?;
        let store: VariableStore = serde_json::from_str(&contents).map_err(|error| {
            IceflowError::dataset(path, format!("corrupt dataset: {error}"))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            label: path.display().to_string(),
            store,
        })
    }

    pub fn create(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            path: path.to_path_buf(),
            label: path.display().to_string(),
            store: VariableStore::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the dataset back to its path.
    pub fn save(&self) -> CoreResult<()> {
        let contents = serde_json::to_string_pretty(&self.store).map_err(|error| {
            IceflowError::io_system(format!(
                "cannot serialize dataset '{}': {error}",
                self.label
            ))
        })?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|error| {
                    IceflowError::io_system(format!(
                        "cannot create '{}': {error}",
                        parent.display()
                    ))
                })?;
            }
        }
        fs::write(&self.path, contents).map_err(|error| {
            IceflowError::io_system(format!("cannot write '{}': {error}", self.label))
        })
    }
}

impl_dataset_via_store!(JsonDataset);
