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

use crate::error::Error;
use crate::extract::SlotView;

/// The bipartite incidence mapping from slots to the candidate elements
/// probing them, with per-slot local counts.
///
/// Built once per decoding run in O(|P| * k) and then mutated only by the
/// peeling decoder's own eliminations. `counts[i]` always equals
/// `slots[i].len()`; the local count is the candidate-side twin of the
/// filter's counter for slot `i`, and the whitebox proof is exactly the
/// comparison of the two.
///
/// In a plain-mode filter a self-colliding element appears twice in one
/// slot's list, matching the double increment its insertion applied to
/// that counter.
#[derive(Debug, Clone)]
pub struct IncidenceIndex<T> {
    pub(super) slots: Vec<Vec<T>>,
    pub(super) counts: Vec<u32>,
}

impl<T: Clone> IncidenceIndex<T> {
    /// Builds the index for a candidate universe against a filter view.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidConfig` when the view reports zero slots or zero
    /// probes. An empty universe is legal and builds an empty index.
    pub fn build<F: SlotView<T>>(view: &F, universe: &[T]) -> Result<Self, Error> {
        let num_slots = view.num_slots();
        let num_probes = view.num_probes();
        if num_slots == 0 || num_probes == 0 {
            return Err(Error::degenerate_filter(num_slots, num_probes));
        }

        let mut slots = vec![Vec::new(); num_slots];
        let mut counts = vec![0u32; num_slots];
        for element in universe {
            for slot in view.probe_slots(element) {
                slots[slot].push(element.clone());
                counts[slot] += 1;
            }
        }

        Ok(Self { slots, counts })
    }

    /// Number of slots covered by the index.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// The candidate elements currently mapped to a slot.
    pub fn slot_elements(&self, slot: usize) -> &[T] {
        &self.slots[slot]
    }

    /// The local count for a slot.
    pub fn count(&self, slot: usize) -> u32 {
        self.counts[slot]
    }

    /// Total remaining probe landings across all slots.
    pub fn total_degree(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Checks the list/count invariant over every slot.
    ///
    /// # Panics
    ///
    /// Panics on any mismatch; that is a decoder bug, never a legal-input
    /// condition.
    pub(super) fn assert_consistent(&self) {
        for (slot, list) in self.slots.iter().enumerate() {
            assert!(
                list.len() == self.counts[slot] as usize,
                "slot {slot}: local count {} does not match list length {}",
                self.counts[slot],
                list.len()
            );
        }
    }
}
