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

use std::collections::BTreeMap;

use filterleak::extract::MembershipOracle;
use filterleak::extract::SlotView;

/// A counting-filter double with a hand-assigned slot table, so tests can
/// exercise the decoders on an exactly known geometry instead of whatever
/// the hash happens to produce.
///
/// Elements must be assigned before they are inserted or probed.
#[derive(Debug, Clone)]
pub struct ScriptedFilter {
    num_probes: usize,
    assignments: BTreeMap<u64, Vec<usize>>,
    counters: Vec<u32>,
}

#[allow(dead_code)] // not every integration test uses every helper
impl ScriptedFilter {
    pub fn new(num_slots: usize, num_probes: usize) -> Self {
        Self {
            num_probes,
            assignments: BTreeMap::new(),
            counters: vec![0; num_slots],
        }
    }

    /// Pins the probe slots of an element.
    pub fn assign(&mut self, element: u64, slots: &[usize]) {
        assert_eq!(slots.len(), self.num_probes, "one slot per probe");
        assert!(slots.iter().all(|slot| *slot < self.counters.len()));
        self.assignments.insert(element, slots.to_vec());
    }

    /// Inserts an already-assigned element.
    pub fn insert(&mut self, element: u64) {
        let slots = self.slots_of(&element).to_vec();
        for slot in slots {
            self.counters[slot] += 1;
        }
    }

    pub fn counters(&self) -> &[u32] {
        &self.counters
    }

    fn slots_of(&self, element: &u64) -> &[usize] {
        self.assignments
            .get(element)
            .expect("element has no scripted slot assignment")
    }
}

impl SlotView<u64> for ScriptedFilter {
    fn num_slots(&self) -> usize {
        self.counters.len()
    }

    fn num_probes(&self) -> usize {
        self.num_probes
    }

    fn probe_slots(&self, item: &u64) -> Vec<usize> {
        self.slots_of(item).to_vec()
    }

    fn snapshot_counters(&self) -> Vec<u32> {
        self.counters.clone()
    }
}

impl MembershipOracle<u64> for ScriptedFilter {
    fn add(&mut self, item: &u64) {
        let slots = self.slots_of(item).to_vec();
        for slot in slots {
            self.counters[slot] += 1;
        }
    }

    fn remove(&mut self, item: &u64) {
        let slots = self.slots_of(item).to_vec();
        for slot in slots {
            assert!(
                self.counters[slot] > 0,
                "remove would drive counter at slot {slot} negative",
            );
            self.counters[slot] -= 1;
        }
    }

    fn check(&self, item: &u64) -> bool {
        self.slots_of(item).iter().all(|slot| self.counters[*slot] > 0)
    }
}

/// The canonical small scenario used across decoder tests: members 1, 2, 3
/// and a decoy 4 that the counters keep positive.
///
/// Geometry (16 slots, 2 probes):
///   1 -> {0, 1}
///   2 -> {1, 2}
///   3 -> {3, 4}
///   4 -> {0, 2}   (decoy, never inserted)
///
/// Members 1 and 2 interlock through slot 1 and the decoy covers both of
/// their outer slots, so no single differential test resolves them; member
/// 3 sits alone and resolves immediately.
#[allow(dead_code)]
pub fn interlocked_scenario() -> (ScriptedFilter, Vec<u64>) {
    let mut filter = ScriptedFilter::new(16, 2);
    filter.assign(1, &[0, 1]);
    filter.assign(2, &[1, 2]);
    filter.assign(3, &[3, 4]);
    filter.assign(4, &[0, 2]);
    filter.insert(1);
    filter.insert(2);
    filter.insert(3);
    (filter, vec![1, 2, 3, 4])
}
