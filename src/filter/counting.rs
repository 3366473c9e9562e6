// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::hash::Hash;

use crate::extract::MembershipOracle;
use crate::extract::SlotView;
use crate::hash::SlotHasher;

/// How the k probe slots of an element are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Raw double hashing; two probes of the same element may collide on
    /// one slot, which then counts the element twice.
    #[default]
    Plain,
    /// Sequential re-probing (`slot + 1 mod m`) on self-collision, so every
    /// element occupies exactly k distinct slots.
    CollisionAvoidant,
}

/// A counting Bloom filter supporting insertion, deletion, and membership
/// checks over m counters and k probes per element.
///
/// Use [`super::CountingFilterBuilder`] to construct instances.
///
/// Invariant: `counters[i]` equals the number of probe landings of
/// currently inserted elements on slot `i`. Collisions between distinct
/// elements sharing a slot are indistinguishable by counter value alone,
/// which is precisely the ambiguity the extraction engine exploits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountingFilter {
    /// Hash seed for slot derivation
    pub(super) seed: u64,
    /// Number of probes per element (k)
    pub(super) num_probes: u16,
    /// Probe derivation mode
    pub(super) probe_mode: ProbeMode,
    /// Number of currently inserted elements
    pub(super) num_items: u64,
    /// One counter per slot; length = m
    pub(super) counters: Vec<u32>,
}

impl CountingFilter {
    /// Inserts an element, incrementing each of its probed counters.
    ///
    /// # Examples
    ///
    /// ```
    /// # use filterleak::filter::CountingFilterBuilder;
    /// let mut filter = CountingFilterBuilder::with_size(64, 2).build();
    /// filter.add(&17_u64);
    /// assert!(filter.check(&17_u64));
    /// ```
    pub fn add<T: Hash>(&mut self, item: &T) {
        for slot in self.probe_slots(item) {
            self.counters[slot] += 1;
        }
        self.num_items += 1;
    }

    /// Removes an element, decrementing each of its probed counters.
    ///
    /// The element need not have been inserted (the black-box extraction
    /// protocol deliberately removes candidates that are merely accepted),
    /// but every probed counter must be nonzero.
    ///
    /// In [`ProbeMode::Plain`] a self-colliding element probes one slot more
    /// than once, and that counter must hold at least as many counts as the
    /// element lands there. A membership check alone does not guarantee
    /// this.
    ///
    /// # Panics
    ///
    /// Panics if any probed counter holds fewer counts than the element's
    /// probe landings on that slot, or if the filter holds no items. Both
    /// indicate a caller bug, not a recoverable condition.
    pub fn remove<T: Hash>(&mut self, item: &T) {
        let slots = self.probe_slots(item);
        for &slot in &slots {
            let landings = slots.iter().filter(|&&s| s == slot).count() as u32;
            assert!(
                self.counters[slot] >= landings,
                "remove would drive counter at slot {slot} negative"
            );
        }
        for slot in slots {
            self.counters[slot] -= 1;
        }
        assert!(self.num_items > 0, "remove from an empty filter");
        self.num_items -= 1;
    }

    /// Tests whether an element is accepted by the filter.
    ///
    /// Returns `true` when all k probed counters are nonzero: the element
    /// was **possibly** inserted (or is a false positive). Returns `false`
    /// when the element was **definitely not** inserted.
    pub fn check<T: Hash>(&self, item: &T) -> bool {
        self.probe_slots(item)
            .into_iter()
            .all(|slot| self.counters[slot] > 0)
    }

    /// Returns the k slot indices assigned to an element, with sequential
    /// re-probing applied in [`ProbeMode::CollisionAvoidant`].
    ///
    /// In [`ProbeMode::Plain`] the result may contain duplicates; every
    /// occurrence counts separately.
    pub fn probe_slots<T: Hash>(&self, item: &T) -> Vec<usize> {
        let (h0, h1) = self.compute_hash(item);
        let m = self.counters.len() as u64;
        let mut slots = Vec::with_capacity(self.num_probes as usize);
        for i in 1..=u64::from(self.num_probes) {
            let mut index = probe_index(h0, h1, i, m) as usize;
            if self.probe_mode == ProbeMode::CollisionAvoidant {
                while slots.contains(&index) {
                    index = (index + 1) % self.counters.len();
                }
            }
            slots.push(index);
        }
        slots
    }

    /// Returns the raw slot for one probe of an element, without
    /// re-probing. Probe indices are 0-based.
    ///
    /// # Panics
    ///
    /// Panics if `probe` is not below the number of probes.
    pub fn slot<T: Hash>(&self, item: &T, probe: u16) -> usize {
        assert!(probe < self.num_probes, "probe index out of range");
        let (h0, h1) = self.compute_hash(item);
        probe_index(h0, h1, u64::from(probe) + 1, self.counters.len() as u64) as usize
    }

    /// Returns an owned copy of the counter array.
    ///
    /// This is the whitebox capability: the peeling decoder works against
    /// such a snapshot, never against the live array.
    pub fn snapshot_counters(&self) -> Vec<u32> {
        self.counters.clone()
    }

    /// Returns the live counter array.
    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    /// Returns the number of slots (m).
    pub fn num_slots(&self) -> usize {
        self.counters.len()
    }

    /// Returns the number of probes per element (k).
    pub fn num_probes(&self) -> u16 {
        self.num_probes
    }

    /// Returns the number of currently inserted elements.
    pub fn num_items(&self) -> u64 {
        self.num_items
    }

    /// Returns whether the filter holds no items.
    pub fn is_empty(&self) -> bool {
        self.num_items == 0
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the probe derivation mode.
    pub fn probe_mode(&self) -> ProbeMode {
        self.probe_mode
    }

    /// Resets the filter to its initial empty state, preserving the
    /// configuration.
    pub fn reset(&mut self) {
        self.counters.fill(0);
        self.num_items = 0;
    }

    /// Computes the 128-bit element hash whose halves seed the probe
    /// schedule.
    fn compute_hash<T: Hash>(&self, item: &T) -> (u64, u64) {
        let mut hasher = SlotHasher::with_seed(self.seed);
        item.hash(&mut hasher);
        hasher.finish128()
    }
}

/// Computes a slot index using double hashing (Kirsch-Mitzenmacher).
///
/// Formula:
/// ```text
/// slot = ((h0 + i * h1) >> 1) % m
/// ```
///
/// The right shift by 1 improves slot distribution. The probe `i` is
/// 1-based.
#[inline]
fn probe_index(h0: u64, h1: u64, i: u64, m: u64) -> u64 {
    let hash = h0.wrapping_add(i.wrapping_mul(h1));
    (hash >> 1) % m
}

impl<T: Hash> SlotView<T> for CountingFilter {
    fn num_slots(&self) -> usize {
        CountingFilter::num_slots(self)
    }

    fn num_probes(&self) -> usize {
        usize::from(self.num_probes)
    }

    fn probe_slots(&self, item: &T) -> Vec<usize> {
        CountingFilter::probe_slots(self, item)
    }

    fn snapshot_counters(&self) -> Vec<u32> {
        CountingFilter::snapshot_counters(self)
    }
}

impl<T: Hash> MembershipOracle<T> for CountingFilter {
    fn add(&mut self, item: &T) {
        CountingFilter::add(self, item)
    }

    fn remove(&mut self, item: &T) {
        CountingFilter::remove(self, item)
    }

    fn check(&self, item: &T) -> bool {
        CountingFilter::check(self, item)
    }
}
