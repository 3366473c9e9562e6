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

use crate::extract::Extraction;
use crate::extract::MembershipOracle;

/// Result of one differential hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    /// The tested element(s) are proven members; the filter permanently
    /// dropped them and every candidate their removal exposed.
    Confirmed,
    /// No proof this round; the filter was restored to its exact pre-test
    /// state.
    Inconclusive,
}

/// The black-box differential oracle tester.
///
/// Sees no counters, only `add`, `remove`, `check` on the live filter.
/// The core move: remove a candidate and recompute which other candidates
/// stopped checking positive (the *diff*). A candidate that only takes
/// itself out is a proven member. When the removal drags others along, the
/// tester re-adds the bystanders one at a time, verifying each re-add; if
/// the candidate under test then still checks negative, its own insertion
/// was the only thing keeping it positive, proving membership. Every
/// failure path rolls the filter back to exactly its pre-test state.
///
/// Pair tests extend the same protocol to two candidates removed together,
/// unlocking configurations where any single removal flips the partner.
///
/// The tester holds the only mutate access to the filter for its lifetime
/// (the `&mut` borrow), because every probe assumes a filter state the
/// tester fully controls. Progress is incremental: each completed pass
/// leaves valid state, so a caller may interleave passes and stop early,
/// keeping whatever was proven so far.
///
/// # Examples
///
/// ```
/// use filterleak::extract::OracleTester;
/// use filterleak::filter::CountingFilterBuilder;
///
/// let mut filter = CountingFilterBuilder::with_size(256, 3).build();
/// let universe: Vec<u64> = (0..32).collect();
/// for element in &universe {
///     filter.add(element);
/// }
///
/// let tester = OracleTester::new(&mut filter, &universe);
/// let extraction = tester.run(true);
/// assert!(extraction.confirmed().len() <= 32);
/// ```
#[derive(Debug)]
pub struct OracleTester<'a, F, T: Ord> {
    filter: &'a mut F,
    working: BTreeSet<T>,
    confirmed: BTreeSet<T>,
    eliminated: BTreeSet<T>,
}

impl<'a, F, T> OracleTester<'a, F, T>
where
    F: MembershipOracle<T>,
    T: Ord + Clone,
{
    /// Creates a tester over a candidate universe, taking exclusive mutate
    /// access to the filter.
    pub fn new(filter: &'a mut F, universe: &[T]) -> Self {
        Self {
            filter,
            working: universe.iter().cloned().collect(),
            confirmed: BTreeSet::new(),
            eliminated: BTreeSet::new(),
        }
    }

    /// Elements proven members so far.
    pub fn confirmed(&self) -> &BTreeSet<T> {
        &self.confirmed
    }

    /// Elements proven false positives so far.
    pub fn eliminated(&self) -> &BTreeSet<T> {
        &self.eliminated
    }

    /// Candidates still unresolved.
    pub fn remaining(&self) -> &BTreeSet<T> {
        &self.working
    }

    /// Runs single-element passes to a fixpoint, then (optionally)
    /// alternates pair passes and single passes until a full round of both
    /// finds nothing new, and yields the extraction.
    ///
    /// Confirmed elements stay permanently removed from the filter;
    /// everything else is exactly as inserted.
    pub fn run(mut self, pair_tests: bool) -> Extraction<T> {
        while self.single_pass() > 0 {}
        if pair_tests {
            loop {
                if self.pair_pass() == 0 {
                    break;
                }
                // Pair confirmations free slots that may unlock new
                // single-element proofs; drain those before trying pairs
                // again.
                while self.single_pass() > 0 {}
            }
        }
        self.into_extraction()
    }

    /// Consumes the tester, yielding verdicts for the whole universe.
    pub fn into_extraction(self) -> Extraction<T> {
        Extraction::new(self.confirmed, self.eliminated, self.working)
    }

    /// One pass of single-element tests over a snapshot of the working
    /// set. Candidates resolved mid-pass are skipped. Returns the number
    /// of confirmations.
    pub fn single_pass(&mut self) -> usize {
        let snapshot: Vec<T> = self.working.iter().cloned().collect();
        let mut found = 0;
        for x in &snapshot {
            if !self.working.contains(x) {
                continue;
            }
            if self.test_element(x) == TestOutcome::Confirmed {
                found += 1;
            }
        }
        found
    }

    /// One pass of pair tests over all ordered pairs of a working-set
    /// snapshot. Returns the number of confirmed pairs.
    pub fn pair_pass(&mut self) -> usize {
        let snapshot: Vec<T> = self.working.iter().cloned().collect();
        let mut found = 0;
        for x in &snapshot {
            for y in &snapshot {
                if x == y || !self.working.contains(x) || !self.working.contains(y) {
                    continue;
                }
                if self.test_pair(x, y) == TestOutcome::Confirmed {
                    found += 1;
                }
            }
        }
        found
    }

    /// Tests the hypothesis that `x` is a genuine member.
    ///
    /// On [`TestOutcome::Confirmed`], `x` (and every candidate its removal
    /// exposed as a non-member) is permanently removed from the filter and
    /// the working set. On [`TestOutcome::Inconclusive`] the filter is
    /// restored bit for bit.
    pub fn test_element(&mut self, x: &T) -> TestOutcome {
        if !self.working.contains(x) {
            return TestOutcome::Inconclusive;
        }
        // A candidate that stopped checking positive cannot be a current
        // member; resolve it without touching the filter.
        if !self.filter.check(x) {
            self.resolve_eliminated(x);
            return TestOutcome::Inconclusive;
        }

        self.filter.remove(x);
        let diff = self.dropped_candidates();

        if diff.len() == 1 && diff.contains(x) {
            // Only x itself flipped: nothing else was leaning on its
            // counters, so x's own insertion is proven. Leave it removed.
            self.resolve_confirmed(x);
            return TestOutcome::Confirmed;
        }

        if diff.is_empty() {
            // No evidence either way.
            self.filter.add(x);
            return TestOutcome::Inconclusive;
        }

        // Shared-slot fallout: re-add the bystanders and see whether x
        // stays negative on its own.
        let bystanders: Vec<T> = diff.iter().filter(|e| *e != x).cloned().collect();
        for (done, element) in bystanders.iter().enumerate() {
            self.filter.add(element);
            if !self.filter.check(element) {
                // A genuine hash collision inside the diff set makes the
                // hypothesis untestable this round.
                for re_added in &bystanders[..=done] {
                    self.filter.remove(re_added);
                }
                self.filter.add(x);
                return TestOutcome::Inconclusive;
            }
        }

        if !self.filter.check(x) {
            // With every bystander restored x is still negative: x was the
            // member. The bystanders were only held positive by x's
            // counters, so they are proven false positives.
            for element in &bystanders {
                self.filter.remove(element);
            }
            self.resolve_confirmed(x);
            for element in bystanders {
                self.resolve_eliminated(&element);
            }
            return TestOutcome::Confirmed;
        }

        // x came back positive through the re-adds; undo everything.
        for element in &bystanders {
            self.filter.remove(element);
        }
        self.filter.add(x);
        TestOutcome::Inconclusive
    }

    /// Tests the hypothesis that `x` and `y` are both genuine members, for
    /// configurations where single removal of either flips the other.
    pub fn test_pair(&mut self, x: &T, y: &T) -> TestOutcome {
        if x == y || !self.working.contains(x) || !self.working.contains(y) {
            return TestOutcome::Inconclusive;
        }
        if !self.filter.check(x) {
            self.resolve_eliminated(x);
            return TestOutcome::Inconclusive;
        }
        if !self.filter.check(y) {
            self.resolve_eliminated(y);
            return TestOutcome::Inconclusive;
        }

        // Cheap pre-checks: a pair that interacts destructively under a
        // single removal is untestable, in either direction.
        self.filter.remove(x);
        if !self.filter.check(y) {
            self.filter.add(x);
            return TestOutcome::Inconclusive;
        }
        self.filter.add(x);
        self.filter.remove(y);
        if !self.filter.check(x) {
            self.filter.add(y);
            return TestOutcome::Inconclusive;
        }

        // y is already out; take x out as well and require both negative.
        self.filter.remove(x);
        if self.filter.check(x) || self.filter.check(y) {
            self.filter.add(x);
            self.filter.add(y);
            return TestOutcome::Inconclusive;
        }

        let diff = self.dropped_candidates();

        if diff.len() == 2 {
            // Both are negative, so the pair is the whole diff: nothing
            // else depended on their counters.
            self.resolve_confirmed(x);
            self.resolve_confirmed(y);
            return TestOutcome::Confirmed;
        }

        if diff.len() > 2 {
            let bystanders: Vec<T> = diff
                .iter()
                .filter(|e| *e != x && *e != y)
                .cloned()
                .collect();
            for (done, element) in bystanders.iter().enumerate() {
                self.filter.add(element);
                if !self.filter.check(element) {
                    for re_added in &bystanders[..=done] {
                        self.filter.remove(re_added);
                    }
                    self.filter.add(x);
                    self.filter.add(y);
                    return TestOutcome::Inconclusive;
                }
            }

            if !self.filter.check(x) && !self.filter.check(y) {
                for element in &bystanders {
                    self.filter.remove(element);
                }
                self.resolve_confirmed(x);
                self.resolve_confirmed(y);
                for element in bystanders {
                    self.resolve_eliminated(&element);
                }
                return TestOutcome::Confirmed;
            }

            for element in &bystanders {
                self.filter.remove(element);
            }
            self.filter.add(x);
            self.filter.add(y);
            return TestOutcome::Inconclusive;
        }

        // diff smaller than the pair cannot happen once both checked
        // negative, but restore and bail rather than trust it.
        self.filter.add(x);
        self.filter.add(y);
        TestOutcome::Inconclusive
    }

    /// Candidates of the working set that no longer check positive.
    fn dropped_candidates(&self) -> BTreeSet<T> {
        self.working
            .iter()
            .filter(|element| !self.filter.check(element))
            .cloned()
            .collect()
    }

    fn resolve_confirmed(&mut self, element: &T) {
        self.working.remove(element);
        self.confirmed.insert(element.clone());
    }

    fn resolve_eliminated(&mut self, element: &T) {
        self.working.remove(element);
        self.eliminated.insert(element.clone());
    }
}
