use std::collections::VecDeque;

/// Bounded cache of dataset records keyed by record index.
///
/// Eviction policy: when the buffer is full and a record not yet cached is
/// required, the cached record with the smallest index is evicted.
#[derive(Debug, Clone)]
pub struct RecordBuffer {
    capacity: usize,
    entries: VecDeque<(usize, Vec<f64>)>,
}

impl RecordBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, record: usize) -> bool {
        self.entries.iter().any(|(index, _)| *index == record)
    }

    pub fn get(&self, record: usize) -> Option<&[f64]> {
        self.entries
            .iter()
            .find(|(index, _)| *index == record)
            .map(|(_, values)| values.as_slice())
    }

    pub fn insert(&mut self, record: usize, values: Vec<f64>) {
        if let Some(entry) = self.entries.iter_mut().find(|(index, _)| *index == record) {
            entry.1 = values;
            return;
        }
        if self.entries.len() == self.capacity {
            if let Some(position) = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (index, _))| *index)
                .map(|(position, _)| position)
            {
                self.entries.remove(position);
            }
        }
        self.entries.push_back((record, values));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
