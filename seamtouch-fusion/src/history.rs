//! Bounded touch history
//!
//! Fixed-capacity ring of fused samples, newest first when read. The
//! newest slot is rewritten in place as the lifecycle promotes its event
//! kind, and the deghoster can take it back out entirely.

use seamtouch_common::TouchSample;

/// Number of samples retained across all sensors
pub const HISTORY_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Option<TouchSample>>,
    /// Index of the newest sample
    write: usize,
    /// Number of valid samples
    load: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self {
            slots: vec![None; HISTORY_CAPACITY],
            write: 0,
            load: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.load
    }

    pub fn is_empty(&self) -> bool {
        self.load == 0
    }

    /// Insert a sample as the newest entry, evicting the oldest when full
    pub fn push(&mut self, sample: TouchSample) {
        if self.load == 0 {
            self.write = 0;
        } else {
            self.write = (self.write + 1) % HISTORY_CAPACITY;
        }
        self.slots[self.write] = Some(sample);
        self.load = (self.load + 1).min(HISTORY_CAPACITY);
    }

    pub fn latest(&self) -> Option<&TouchSample> {
        self.get(0)
    }

    pub fn latest_mut(&mut self) -> Option<&mut TouchSample> {
        if self.load == 0 {
            return None;
        }
        self.slots[self.write].as_mut()
    }

    /// Sample `age` steps back from the newest (0 = newest)
    pub fn get(&self, age: usize) -> Option<&TouchSample> {
        if age >= self.load {
            return None;
        }
        let index = (self.write + HISTORY_CAPACITY - age) % HISTORY_CAPACITY;
        self.slots[index].as_ref()
    }

    /// The sample inserted just before the newest
    pub fn previous(&self) -> Option<&TouchSample> {
        self.get(1)
    }

    /// Remove the newest sample and make the one before it newest again
    pub fn retract_latest(&mut self) -> Option<TouchSample> {
        if self.load == 0 {
            return None;
        }
        let removed = self.slots[self.write].take();
        self.load -= 1;
        self.write = (self.write + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY;
        removed
    }

    /// Newest-to-oldest walk over the valid samples
    pub fn iter_recent(&self) -> Recent<'_> {
        Recent { history: self, age: 0 }
    }

    /// Most recent sample older than the newest that matches `predicate`
    pub fn find_previous<P>(&self, mut predicate: P) -> Option<&TouchSample>
    where
        P: FnMut(&TouchSample) -> bool,
    {
        self.iter_recent().skip(1).find(|sample| predicate(sample))
    }
}

/// Read cursor over a [`HistoryBuffer`]
///
/// Never wraps past the oldest valid sample.
pub struct Recent<'a> {
    history: &'a HistoryBuffer,
    age: usize,
}

impl<'a> Iterator for Recent<'a> {
    type Item = &'a TouchSample;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.history.get(self.age)?;
        self.age += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.history.len().saturating_sub(self.age);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Recent<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use seamtouch_common::{SensorGeometry, SensorPosition, TouchEvent};
    use std::sync::Arc;

    fn sample(t: u64) -> TouchSample {
        let sensor = Arc::new(SensorGeometry::new(SensorPosition::TopLeft, 1000, 1600, "H1"));
        TouchSample::new(t as u32, t as u32, TouchEvent::Move, t, sensor)
    }

    fn timestamps(history: &HistoryBuffer) -> Vec<u64> {
        history.iter_recent().map(|s| s.timestamp_ms).collect()
    }

    #[test]
    fn test_empty_history() {
        let history = HistoryBuffer::new();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
        assert!(history.previous().is_none());
        assert_eq!(history.iter_recent().count(), 0);
    }

    #[test]
    fn test_push_orders_newest_first() {
        let mut history = HistoryBuffer::new();
        for t in 1..=3 {
            history.push(sample(t));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(timestamps(&history), vec![3, 2, 1]);
        assert_eq!(history.previous().map(|s| s.timestamp_ms), Some(2));
    }

    #[test]
    fn test_push_past_capacity_evicts_oldest() {
        let mut history = HistoryBuffer::new();
        for t in 0..(HISTORY_CAPACITY as u64 + 4) {
            history.push(sample(t));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);

        let seen = timestamps(&history);
        assert_eq!(seen.len(), HISTORY_CAPACITY);
        assert_eq!(seen.first(), Some(&(HISTORY_CAPACITY as u64 + 3)));
        assert_eq!(seen.last(), Some(&4));
    }

    #[test]
    fn test_retract_restores_previous_newest() {
        let mut history = HistoryBuffer::new();
        history.push(sample(1));
        history.push(sample(2));

        let removed = history.retract_latest().unwrap();
        assert_eq!(removed.timestamp_ms, 2);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().map(|s| s.timestamp_ms), Some(1));

        // Next push lands where the retracted sample was
        history.push(sample(3));
        assert_eq!(timestamps(&history), vec![3, 1]);
    }

    #[test]
    fn test_retract_to_empty_then_push() {
        let mut history = HistoryBuffer::new();
        history.push(sample(1));
        history.retract_latest();
        assert!(history.is_empty());
        assert!(history.retract_latest().is_none());

        history.push(sample(2));
        assert_eq!(timestamps(&history), vec![2]);
    }

    #[test]
    fn test_retract_after_wraparound() {
        let mut history = HistoryBuffer::new();
        for t in 0..(HISTORY_CAPACITY as u64 + 1) {
            history.push(sample(t));
        }
        history.retract_latest();
        assert_eq!(history.len(), HISTORY_CAPACITY - 1);
        assert_eq!(history.latest().map(|s| s.timestamp_ms), Some(HISTORY_CAPACITY as u64 - 1));
    }

    #[test]
    fn test_latest_mut_rewrites_in_place() {
        let mut history = HistoryBuffer::new();
        history.push(sample(1));
        history.latest_mut().unwrap().event = TouchEvent::Up;
        assert_eq!(history.latest().unwrap().event, TouchEvent::Up);
    }

    #[test]
    fn test_find_previous_skips_newest() {
        let mut history = HistoryBuffer::new();
        history.push(sample(1));
        history.push(sample(2));

        let found = history.find_previous(|s| s.timestamp_ms >= 1).unwrap();
        assert_eq!(found.timestamp_ms, 1);
        assert!(history.find_previous(|s| s.timestamp_ms == 2).is_none());
    }
}
