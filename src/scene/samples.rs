//!
//! Time sampled values.
//!

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::interval::ClosedInterval;
use crate::ops::Contains;

/// Where to read or write a value: the untimed default or a specific sample time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TimeCode {
    Default,
    At(f64),
}

impl TimeCode {
    pub fn time(self) -> Option<f64> {
        match self {
            TimeCode::Default => None,
            TimeCode::At(t) => Some(t),
        }
    }
}

impl From<f64> for TimeCode {
    fn from(t: f64) -> Self {
        TimeCode::At(t)
    }
}

/// A value with an optional default and any number of time samples.
///
/// Reading at a time uses held interpolation: the latest sample at or before the time, or the
/// first sample when the time precedes all of them. The default is only seen when there are no
/// samples, or when reading at `TimeCode::Default`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSamples<T> {
    default: Option<T>,
    samples: BTreeMap<OrderedFloat<f64>, T>,
}

impl<T> Default for TimeSamples<T> {
    fn default() -> Self {
        TimeSamples {
            default: None,
            samples: BTreeMap::new(),
        }
    }
}

impl<T> TimeSamples<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, time: TimeCode, value: T) {
        match time {
            TimeCode::Default => self.default = Some(value),
            TimeCode::At(t) => {
                self.samples.insert(OrderedFloat(t), value);
            }
        }
    }

    pub fn get(&self, time: TimeCode) -> Option<&T> {
        let t = match time {
            TimeCode::Default => return self.default.as_ref(),
            TimeCode::At(t) => OrderedFloat(t),
        };
        self.samples
            .range(..=t)
            .next_back()
            .or_else(|| self.samples.iter().next())
            .map(|(_, v)| v)
            .or(self.default.as_ref())
    }

    /// The value stored exactly at the given time.
    pub fn get_exact(&self, time: TimeCode) -> Option<&T> {
        match time {
            TimeCode::Default => self.default.as_ref(),
            TimeCode::At(t) => self.samples.get(&OrderedFloat(t)),
        }
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples with a time inside `interval`.
    pub fn samples_in_interval(&self, interval: &ClosedInterval<f64>) -> usize {
        self.samples
            .keys()
            .filter(|t| interval.contains(t.into_inner()))
            .count()
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.keys().map(|t| t.into_inner())
    }

    /// Whether a default or any sample was written.
    pub fn is_authored(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_interpolation() {
        let mut s = TimeSamples::new();
        assert!(s.get(TimeCode::At(0.0)).is_none());
        s.set(TimeCode::Default, 0);
        s.set(TimeCode::At(1.0), 1);
        s.set(TimeCode::At(5.0), 5);
        assert_eq!(s.get(TimeCode::At(0.0)), Some(&1));
        assert_eq!(s.get(TimeCode::At(3.0)), Some(&1));
        assert_eq!(s.get(TimeCode::At(5.0)), Some(&5));
        assert_eq!(s.get(TimeCode::At(9.0)), Some(&5));
        assert_eq!(s.get(TimeCode::Default), Some(&0));
        assert_eq!(s.get_exact(TimeCode::At(3.0)), None);
    }

    #[test]
    fn count_samples_in_interval() {
        let mut s = TimeSamples::new();
        for t in 0..10 {
            s.set(TimeCode::At(t as f64), t);
        }
        assert_eq!(s.samples_in_interval(&ClosedInterval::new(2.0, 4.0)), 3);
        assert_eq!(s.samples_in_interval(&ClosedInterval::instant(4.5)), 0);
        assert_eq!(s.num_samples(), 10);
        assert!(s.is_authored());
    }
}
