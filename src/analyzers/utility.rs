use crate::analyzers::types::NamedCount;
use std::collections::HashMap;

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Formats an average for display with one decimal place.
pub fn format_average(value: f64) -> String {
    format!("{value:.1}")
}

/// Frequency counter that remembers the order in which keys were first seen.
#[derive(Debug, Default)]
pub struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn add_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a String>) {
        for key in keys {
            self.add(key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `n` most frequent keys, highest count first.
    ///
    /// The sort is stable, so keys with equal counts keep first-seen order.
    pub fn top_n(&self, n: usize) -> Vec<NamedCount> {
        let mut ranked: Vec<&(String, usize)> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(n)
            .map(|(name, count)| NamedCount {
                name: name.clone(),
                count: *count,
            })
            .collect()
    }
}
