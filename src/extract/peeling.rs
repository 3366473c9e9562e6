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

use std::collections::BTreeSet;
use std::collections::VecDeque;

use crate::error::Error;
use crate::extract::Extraction;
use crate::extract::IncidenceIndex;
use crate::extract::SlotView;

/// The whitebox peeling decoder.
///
/// Works against a counter snapshot and the candidate incidence index. A
/// slot is *fully explained* when its local candidate count equals the
/// filter's counter: the genuine occupancy leaves no room for an
/// undetected collision, so every candidate mapped there is a proven
/// member. Confirmed elements are peeled out of the working state;
/// whenever a slot's remaining genuine occupancy drops to zero while
/// candidates are still listed, those candidates are proven false
/// positives and their elimination cascades further. Passes repeat until
/// a full scan confirms nothing.
///
/// An optional *degree cap* restricts confirmation to slots at or below a
/// given local count. `Some(1)` reproduces exactly the decision power of
/// single-element black-box testing, `Some(2)` (on a collision-avoidant
/// filter) that of the pair extension, which is the whitebox side of the
/// cross-validation between the two modes.
///
/// The decoder owns its working state per run; termination is guaranteed
/// because the total remaining degree strictly decreases, and the output
/// is independent of slot visitation order within a pass.
///
/// # Examples
///
/// ```
/// use filterleak::extract::PeelingDecoder;
/// use filterleak::filter::CountingFilterBuilder;
///
/// let mut filter = CountingFilterBuilder::with_size(256, 3).build();
/// let universe: Vec<u64> = (0..32).collect();
/// for element in &universe {
///     filter.add(element);
/// }
///
/// let extraction = PeelingDecoder::new().extract(&filter, &universe).unwrap();
/// assert_eq!(extraction.confirmed().len(), 32);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeelingDecoder {
    degree_cap: Option<u32>,
}

impl PeelingDecoder {
    /// Creates a decoder with no degree cap: every fully explained slot is
    /// peeled regardless of its local count.
    pub fn new() -> Self {
        Self { degree_cap: None }
    }

    /// Creates a decoder that only peels slots whose local count is at
    /// most `cap`.
    ///
    /// # Panics
    ///
    /// Panics if `cap` is zero; a zero cap would peel nothing.
    pub fn with_degree_cap(cap: u32) -> Self {
        assert!(cap > 0, "degree cap must be at least 1");
        Self {
            degree_cap: Some(cap),
        }
    }

    /// Returns the configured degree cap.
    pub fn degree_cap(&self) -> Option<u32> {
        self.degree_cap
    }

    /// Decodes a candidate universe against a filter view.
    ///
    /// The counter snapshot is taken once at entry; the scan relies on it
    /// staying unchanged by anything but the decoder's own bookkeeping, so
    /// the filter must not be mutated elsewhere during the run.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidConfig` when the view is degenerate (zero slots
    /// or probes). An empty universe yields an empty extraction.
    pub fn extract<T, F>(&self, view: &F, universe: &[T]) -> Result<Extraction<T>, Error>
    where
        T: Ord + Clone,
        F: SlotView<T>,
    {
        let mut index = IncidenceIndex::build(view, universe)?;
        let mut counters = view.snapshot_counters();
        assert!(
            counters.len() == index.num_slots(),
            "counter snapshot length {} does not match slot count {}",
            counters.len(),
            index.num_slots()
        );

        let mut confirmed: BTreeSet<T> = BTreeSet::new();
        let mut eliminated: BTreeSet<T> = BTreeSet::new();

        loop {
            let mut found = false;
            for slot in 0..index.num_slots() {
                let count = index.counts[slot];
                if count == 0 || count != counters[slot] {
                    continue;
                }
                if self.degree_cap.is_some_and(|cap| count > cap) {
                    continue;
                }
                // Fully explained slot: everything listed here is genuine.
                found = true;
                let batch = index.slots[slot].clone();
                self.cascade(
                    view,
                    &mut index,
                    &mut counters,
                    batch,
                    &mut confirmed,
                    &mut eliminated,
                );
            }
            if !found {
                break;
            }
        }

        index.assert_consistent();

        let undetermined = universe
            .iter()
            .filter(|element| !confirmed.contains(element) && !eliminated.contains(element))
            .cloned()
            .collect();
        Ok(Extraction::new(confirmed, eliminated, undetermined))
    }

    /// Peels a confirmed batch out of the working state, draining the
    /// transitive eliminations it triggers.
    ///
    /// Entries are `(element, genuine)`: genuine only for the initial
    /// confirmed batch. Removing a genuine element also decrements the
    /// counter snapshot; a slot left with zero genuine occupancy but
    /// nonzero local count proves its remaining candidates false. The
    /// queue replaces the natural recursive formulation, which could
    /// otherwise nest as deep as the cascade is long.
    fn cascade<T, F>(
        &self,
        view: &F,
        index: &mut IncidenceIndex<T>,
        counters: &mut [u32],
        batch: Vec<T>,
        confirmed: &mut BTreeSet<T>,
        eliminated: &mut BTreeSet<T>,
    ) where
        T: Ord + Clone,
        F: SlotView<T>,
    {
        let mut queue: VecDeque<(T, bool)> =
            batch.into_iter().map(|element| (element, true)).collect();

        while let Some((element, genuine)) = queue.pop_front() {
            // An element may be queued from several slots; only the first
            // arrival does any work.
            if confirmed.contains(&element) || eliminated.contains(&element) {
                continue;
            }
            if genuine {
                confirmed.insert(element.clone());
            } else {
                eliminated.insert(element.clone());
            }

            for slot in view.probe_slots(&element) {
                // One removal per probe occurrence; a probe pair landing on
                // the same plain-mode slot is visited (and removed) twice.
                let list = &mut index.slots[slot];
                let Some(at) = list.iter().position(|e| *e == element) else {
                    continue;
                };
                list.remove(at);
                assert!(
                    index.counts[slot] > 0,
                    "local count underflow at slot {slot}"
                );
                index.counts[slot] -= 1;

                if genuine {
                    assert!(counters[slot] > 0, "counter underflow at slot {slot}");
                    counters[slot] -= 1;
                }

                // Genuine occupancy fully accounted for, candidates still
                // listed: all of them are provably false positives.
                if counters[slot] == 0 && index.counts[slot] != 0 {
                    for pending in &index.slots[slot] {
                        queue.push_back((pending.clone(), false));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::CountingFilterBuilder;
    use crate::filter::ProbeMode;

    #[test]
    fn test_members_only_universe_fully_confirmed() {
        let mut filter = CountingFilterBuilder::with_size(128, 3).build();
        let universe: Vec<u64> = (0..16).collect();
        for element in &universe {
            filter.add(element);
        }

        let extraction = PeelingDecoder::new().extract(&filter, &universe).unwrap();
        assert_eq!(extraction.confirmed().len(), 16);
        assert!(extraction.eliminated().is_empty());
        assert_eq!(extraction.num_undetermined(), 0);
    }

    #[test]
    fn test_empty_universe() {
        let filter = CountingFilterBuilder::with_size(64, 2).build();
        let extraction = PeelingDecoder::new()
            .extract(&filter, &Vec::<u64>::new())
            .unwrap();
        assert!(extraction.confirmed().is_empty());
        assert!(extraction.eliminated().is_empty());
        assert_eq!(extraction.num_undetermined(), 0);
    }

    #[test]
    fn test_degree_cap_never_confirms_more() {
        let mut filter = CountingFilterBuilder::with_size(48, 2)
            .probe_mode(ProbeMode::CollisionAvoidant)
            .build();
        let universe: Vec<u64> = (0..24).collect();
        for element in &universe {
            filter.add(element);
        }

        let capped = PeelingDecoder::with_degree_cap(1)
            .extract(&filter, &universe)
            .unwrap();
        let full = PeelingDecoder::new().extract(&filter, &universe).unwrap();
        assert!(capped.confirmed().is_subset(full.confirmed()));
    }

    #[test]
    fn test_decoder_does_not_mutate_the_filter() {
        let mut filter = CountingFilterBuilder::with_size(64, 2).build();
        let universe: Vec<u64> = (0..8).collect();
        for element in &universe {
            filter.add(element);
        }
        let before = filter.snapshot_counters();

        PeelingDecoder::new().extract(&filter, &universe).unwrap();
        assert_eq!(filter.snapshot_counters(), before);
    }

    #[test]
    #[should_panic(expected = "degree cap must be at least 1")]
    fn test_zero_degree_cap_rejected() {
        PeelingDecoder::with_degree_cap(0);
    }
}
