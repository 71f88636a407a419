//!
//! Validity intervals of the native mesh data and the gate deciding whether an attribute sample
//! must be written.
//!

use crate::interval::{ClosedInterval, EndPoint};
use crate::ops::{Contains, Empty, Intersect};
use crate::scene::TimeSamples;

/// Parts of the native mesh whose changes are tracked separately.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChangeChannel {
    Topology,
    Geometry,
    TexMap,
    VertexColor,
}

impl ChangeChannel {
    pub const ALL: [ChangeChannel; 4] = [
        ChangeChannel::Topology,
        ChangeChannel::Geometry,
        ChangeChannel::TexMap,
        ChangeChannel::VertexColor,
    ];

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// Time ranges over which each change channel is known to stay the same.
///
/// A missing interval means nothing is known about the channel.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ChannelIntervals([Option<ClosedInterval<f64>>; 4]);

impl ChannelIntervals {
    /// Nothing known about any channel.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Every channel valid over the same interval.
    pub fn uniform(interval: ClosedInterval<f64>) -> Self {
        ChannelIntervals([Some(interval); 4])
    }

    pub fn set(&mut self, channel: ChangeChannel, interval: ClosedInterval<f64>) {
        self.0[channel.slot()] = Some(interval);
    }

    pub fn with(mut self, channel: ChangeChannel, interval: ClosedInterval<f64>) -> Self {
        self.set(channel, interval);
        self
    }

    pub fn get(&self, channel: ChangeChannel) -> Option<ClosedInterval<f64>> {
        self.0[channel.slot()]
    }

    /// Shrink every channel to the single instant `t`.
    pub fn collapse_to(&mut self, t: f64) {
        self.0 = [Some(ClosedInterval::instant(t)); 4];
    }

    /// Intersection of the intervals of the given channels. `None` if any of them is unknown.
    pub fn combined(&self, deps: &[ChangeChannel]) -> Option<ClosedInterval<f64>> {
        deps.iter().try_fold(ClosedInterval::forever(), |acc, &ch| {
            self.get(ch).map(|iv| acc.intersect(iv))
        })
    }

    /// Decide whether an attribute depending on `deps` must be written at time `t`, given the
    /// samples it already holds.
    ///
    /// Writes unless the combined interval is known, contains `t`, `t` is not its upper end, and
    /// the attribute holds exactly one sample within the interval. More than one sample means the
    /// interval was already broken on an earlier frame and cannot be trusted.
    pub fn should_write<T>(&self, deps: &[ChangeChannel], t: f64, samples: &TimeSamples<T>) -> bool {
        let interval = match self.combined(deps) {
            Some(iv) => iv,
            None => return true,
        };
        if interval.is_empty() || !interval.contains(t) {
            return true;
        }
        if t == interval.endpoint(EndPoint::Upper) {
            return true;
        }
        samples.samples_in_interval(&interval) != 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TimeCode;

    fn deps() -> [ChangeChannel; 2] {
        [ChangeChannel::Topology, ChangeChannel::Geometry]
    }

    #[test]
    fn unknown_channels_always_write() {
        let intervals = ChannelIntervals::unknown().with(ChangeChannel::Topology, ClosedInterval::new(0.0, 10.0));
        let mut samples = TimeSamples::new();
        samples.set(TimeCode::At(0.0), 1);
        assert!(intervals.should_write(&deps(), 1.0, &samples));
        assert!(!intervals.should_write(&[ChangeChannel::Topology], 1.0, &samples));
    }

    #[test]
    fn gate_counts_existing_samples() {
        let intervals = ChannelIntervals::uniform(ClosedInterval::new(0.0, 10.0));
        let mut samples = TimeSamples::new();
        assert!(intervals.should_write(&deps(), 0.0, &samples));
        samples.set(TimeCode::At(0.0), 1);
        assert!(!intervals.should_write(&deps(), 1.0, &samples));
        // The end of the interval is always written.
        assert!(intervals.should_write(&deps(), 10.0, &samples));
        samples.set(TimeCode::At(10.0), 1);
        assert!(intervals.should_write(&deps(), 5.0, &samples));
        // Outside the interval.
        assert!(intervals.should_write(&deps(), 11.0, &samples));
    }

    #[test]
    fn combined_interval() {
        let intervals = ChannelIntervals::uniform(ClosedInterval::new(0.0, 10.0))
            .with(ChangeChannel::Geometry, ClosedInterval::new(5.0, 20.0));
        assert_eq!(intervals.combined(&deps()), Some(ClosedInterval::new(5.0, 10.0)));

        let disjoint = intervals.with(ChangeChannel::Geometry, ClosedInterval::new(12.0, 20.0));
        assert!(disjoint.combined(&deps()).unwrap().is_empty());
        let samples = TimeSamples::<i32>::new();
        assert!(disjoint.should_write(&deps(), 5.0, &samples));
    }

    #[test]
    fn collapse_forces_writes() {
        let mut intervals = ChannelIntervals::uniform(ClosedInterval::new(0.0, 10.0));
        let mut samples = TimeSamples::new();
        samples.set(TimeCode::At(0.0), 1);
        intervals.collapse_to(3.0);
        assert_eq!(intervals.get(ChangeChannel::TexMap), Some(ClosedInterval::instant(3.0)));
        assert!(intervals.should_write(&deps(), 3.0, &samples));
    }
}
