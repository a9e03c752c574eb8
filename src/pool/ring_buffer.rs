//! Fixed-capacity observation ring
//!
//! Storage is allocated once at `capacity` slots. `cardinality` counts the
//! slots in use and only grows to `cardinality_next` when the write cursor
//! wraps, so older observations are never reordered.

use anyhow::{bail, Result};

use super::Observation;

#[derive(Debug, Clone)]
pub struct ObservationRing {
    slots: Box<[Observation]>,
    /// Slot holding the most recent observation
    index: u16,
    cardinality: u16,
    cardinality_next: u16,
}

impl ObservationRing {
    /// Creates a ring holding a single observation at `timestamp`
    pub fn new(capacity: u16, timestamp: u32) -> Result<Self> {
        if capacity == 0 {
            bail!("observation ring capacity must be at least 1");
        }
        let mut slots = vec![Observation::default(); usize::from(capacity)].into_boxed_slice();
        slots[0] = Observation {
            block_timestamp: timestamp,
            tick_cumulative: 0,
            initialized: true,
        };
        Ok(Self {
            slots,
            index: 0,
            cardinality: 1,
            cardinality_next: 1,
        })
    }

    pub fn capacity(&self) -> u16 {
        // constructed from a u16
        self.slots.len() as u16
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn cardinality(&self) -> u16 {
        self.cardinality
    }

    pub fn cardinality_next(&self) -> u16 {
        self.cardinality_next
    }

    /// Raw slot access; slots past the populated range read as uninitialized
    pub fn get(&self, index: u16) -> Option<Observation> {
        self.slots.get(usize::from(index)).copied()
    }

    pub fn latest(&self) -> Observation {
        self.slots[usize::from(self.index)]
    }

    /// Requests more slots; takes effect once the cursor reaches the end of
    /// the current range. Returns the effective target, clamped to capacity.
    pub fn grow(&mut self, next: u16) -> u16 {
        let next = next.min(self.capacity());
        if next > self.cardinality_next {
            self.cardinality_next = next;
        }
        self.cardinality_next
    }

    /// Records `tick` as the tick that held since the previous observation.
    ///
    /// Returns `false` when an observation already exists for `timestamp`.
    pub fn write(&mut self, timestamp: u32, tick: i32) -> Result<bool> {
        let last = self.latest();
        if timestamp == last.block_timestamp {
            return Ok(false);
        }
        if timestamp < last.block_timestamp {
            bail!(
                "observation timestamp {} precedes latest {}",
                timestamp,
                last.block_timestamp
            );
        }

        if self.cardinality_next > self.cardinality && self.index == self.cardinality - 1 {
            self.cardinality = self.cardinality_next;
        }
        self.index = ((u32::from(self.index) + 1) % u32::from(self.cardinality)) as u16;

        let elapsed = i64::from(timestamp - last.block_timestamp);
        self.slots[usize::from(self.index)] = Observation {
            block_timestamp: timestamp,
            tick_cumulative: last.tick_cumulative + i64::from(tick) * elapsed,
            initialized: true,
        };
        Ok(true)
    }
}
