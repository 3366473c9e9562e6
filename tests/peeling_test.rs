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

mod common;

use std::collections::BTreeSet;

use common::interlocked_scenario;
use common::ScriptedFilter;
use filterleak::extract::PeelingDecoder;
use filterleak::extract::SlotView;
use filterleak::extract::Verdict;
use filterleak::filter::CountingFilterBuilder;
use filterleak::filter::ProbeMode;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[test]
fn test_interlocked_scenario_fully_decoded() {
    // Slot 1 carries counter 2 and exactly two candidates, so both are
    // proven genuine at once; peeling them out zeroes the decoy's slots
    // while candidates remain there, proving it false.
    let (filter, universe) = interlocked_scenario();
    let extraction = PeelingDecoder::new()
        .extract(&filter, &universe)
        .expect("valid geometry");

    assert_eq!(extraction.confirmed(), &BTreeSet::from([1, 2, 3]));
    assert_eq!(extraction.eliminated(), &BTreeSet::from([4]));
    assert_eq!(extraction.num_undetermined(), 0);
    // Decoding reads a snapshot; the filter itself is untouched.
    assert_eq!(filter.counters()[1], 2);
}

#[test]
fn test_degree_cap_one_skips_interlocked_slot() {
    // Capped at degree 1, slot 1 (two candidates) is out of bounds and
    // only the lone member 3 resolves.
    let (filter, universe) = interlocked_scenario();
    let extraction = PeelingDecoder::with_degree_cap(1)
        .extract(&filter, &universe)
        .expect("valid geometry");

    assert_eq!(extraction.confirmed(), &BTreeSet::from([3]));
    assert_eq!(extraction.verdict(&1), Verdict::Undetermined);
    assert_eq!(extraction.verdict(&4), Verdict::Undetermined);
}

#[test]
fn test_empty_filter_resolves_nothing() {
    // Candidates the filter does not even accept are outside the decoder's
    // contract; eliminations only arise from peeling a confirmed member,
    // so against an all-zero counter array nothing moves.
    let mut filter = ScriptedFilter::new(8, 2);
    filter.assign(10, &[0, 1]);
    filter.assign(11, &[2, 3]);
    let extraction = PeelingDecoder::new()
        .extract(&filter, &[10, 11])
        .expect("valid geometry");

    assert!(extraction.confirmed().is_empty());
    assert!(extraction.eliminated().is_empty());
    assert_eq!(extraction.num_undetermined(), 2);
}

#[test]
fn test_unlisted_members_stall_the_cascade() {
    // A member missing from the candidate universe leaves its counters
    // unexplained; slots it touches can never be fully accounted for.
    let mut filter = ScriptedFilter::new(8, 2);
    filter.assign(1, &[0, 1]);
    filter.assign(2, &[1, 2]);
    filter.insert(1);
    filter.insert(2);

    // Only element 2 is offered as a candidate; slot 1 carries element
    // 1's contribution, so counts never match counters there.
    let extraction = PeelingDecoder::new()
        .extract(&filter, &[2])
        .expect("valid geometry");
    // Slot 2 is private to element 2, which proves it on its own.
    assert_eq!(extraction.confirmed(), &BTreeSet::from([2]));
    assert!(extraction.eliminated().is_empty());
}

#[test]
fn test_chain_cascade() {
    // A chain of members each sharing one slot with the next: peeling the
    // end of the chain unlocks the next link, all the way down.
    let mut filter = ScriptedFilter::new(8, 2);
    filter.assign(1, &[0, 1]);
    filter.assign(2, &[1, 2]);
    filter.assign(3, &[2, 3]);
    filter.assign(4, &[3, 4]);
    for element in 1..=4 {
        filter.insert(element);
    }

    let extraction = PeelingDecoder::with_degree_cap(1)
        .extract(&filter, &[1, 2, 3, 4])
        .expect("valid geometry");
    // Slot 0 is private to 1 and slot 4 private to 4; confirming those
    // frees slots 1 and 3, which in turn prove 2 and 3.
    assert_eq!(extraction.confirmed(), &BTreeSet::from([1, 2, 3, 4]));
}

#[test]
fn test_members_only_universe_on_real_filter() {
    // A lightly loaded real filter peels completely when the candidate
    // list is exactly the membership.
    let mut rng = ChaCha20Rng::seed_from_u64(3);
    let mut filter = CountingFilterBuilder::with_size(1024, 3)
        .probe_mode(ProbeMode::CollisionAvoidant)
        .build();
    let members: BTreeSet<u64> = (0..64).map(|_| rng.gen_range(1..=u64::MAX)).collect();
    for member in &members {
        filter.add(member);
    }
    let universe: Vec<u64> = members.iter().copied().collect();

    let extraction = PeelingDecoder::new()
        .extract(&filter, &universe)
        .expect("valid geometry");
    assert_eq!(extraction.confirmed(), &members);
    assert_eq!(extraction.num_undetermined(), 0);
}

#[test]
fn test_all_false_positive_universe_makes_no_progress() {
    // Three members pile counter 3 onto slots 0 and 1; the two decoy
    // candidates explain only 2 of it, so no slot is ever fully explained
    // and the first pass already finds nothing.
    let mut filter = ScriptedFilter::new(8, 2);
    for member in 1..=3 {
        filter.assign(member, &[0, 1]);
        filter.insert(member);
    }
    filter.assign(8, &[0, 1]);
    filter.assign(9, &[0, 1]);

    let extraction = PeelingDecoder::new()
        .extract(&filter, &[8, 9])
        .expect("valid geometry");
    assert!(extraction.confirmed().is_empty());
    assert!(extraction.eliminated().is_empty());
    assert_eq!(extraction.num_undetermined(), 2);
}

#[test]
fn test_universe_order_is_irrelevant() {
    let (filter, universe) = interlocked_scenario();
    let mut reversed = universe.clone();
    reversed.reverse();

    let decoder = PeelingDecoder::new();
    let forward = decoder.extract(&filter, &universe).expect("valid geometry");
    let backward = decoder.extract(&filter, &reversed).expect("valid geometry");
    assert_eq!(forward, backward);
}

#[test]
fn test_snapshot_is_not_mutated() {
    let (filter, universe) = interlocked_scenario();
    let before = filter.snapshot_counters();
    let _ = PeelingDecoder::new()
        .extract(&filter, &universe)
        .expect("valid geometry");
    assert_eq!(filter.snapshot_counters(), before);
}
