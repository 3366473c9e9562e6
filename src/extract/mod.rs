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

//! The extraction engine: reconstructing a counting filter's contents.
//!
//! Given a *candidate universe* (elements the filter accepts, an unlabeled
//! mix of genuine members and accidental false positives), this module
//! proves membership or non-membership of as many candidates as possible,
//! under two access models:
//!
//! - **Whitebox** ([`PeelingDecoder`]): direct read access to the counter
//!   array. A slot whose counter is exactly matched by the number of
//!   candidates mapped there leaves no room for an undetected collision;
//!   all of them are genuine. Peeling them out may expose slots whose
//!   genuine occupancy is fully accounted for, proving the remaining
//!   candidates there false. Eliminations cascade until a fixpoint.
//! - **Black-box** ([`OracleTester`]): a mutate/query oracle only.
//!   Removing a candidate and watching which others flip negative yields
//!   differential evidence; an elaborate re-add/verify/rollback protocol
//!   turns that evidence into proofs while restoring the filter exactly
//!   whenever a test is inconclusive.
//!
//! [`DensityEstimator`] is the analytic companion: a fixed-point recurrence
//! predicting, per access model, the extractable fraction as a function of
//! the false-positive/true-positive ratio, including the phase-transition
//! threshold where peeling collapses.
//!
//! Neither decoder claims completeness or unique decoding: the output
//! contains exactly the elements that can be *proven*, and a residual
//! [`Verdict::Undetermined`] set may remain forever.
//!
//! The engine consumes the filter through the capability traits
//! [`SlotView`] and [`MembershipOracle`] rather than a concrete type, so
//! the same decoders run against production filters and scripted test
//! doubles alike. The `&mut` borrow taken by [`OracleTester`] enforces the
//! single-writer discipline its rollback protocol depends on.

mod estimator;
mod incidence;
mod oracle;
mod peeling;

pub use self::estimator::DensityEstimator;
pub use self::estimator::ExtractionMode;
pub use self::incidence::IncidenceIndex;
pub use self::oracle::OracleTester;
pub use self::oracle::TestOutcome;
pub use self::peeling::PeelingDecoder;

use std::collections::BTreeSet;

/// Whitebox capability: read-only structural access to a counting filter.
///
/// Exposes the slot geometry, the deterministic probe assignment, and a
/// snapshot of the counters. Snapshots must be stable for the duration of
/// a decoding run; the decoder never observes the live array.
pub trait SlotView<T> {
    /// Number of slots (m).
    fn num_slots(&self) -> usize;

    /// Number of probes per element (k).
    fn num_probes(&self) -> usize;

    /// The slots assigned to an element, one entry per probe. Duplicates
    /// are legal (a self-colliding element in a plain-mode filter) and
    /// every occurrence counts.
    fn probe_slots(&self, item: &T) -> Vec<usize>;

    /// An owned copy of the current counter values.
    fn snapshot_counters(&self) -> Vec<u32>;
}

/// Black-box capability: mutate/query access revealing no counters.
///
/// The differential tester requires exclusive mutate access for the
/// duration of a run, which the `&mut` receivers encode; a second writer
/// would corrupt its rollback protocol.
pub trait MembershipOracle<T> {
    /// Inserts an element.
    fn add(&mut self, item: &T);

    /// Removes an element. Callers only remove elements that currently
    /// check positive.
    fn remove(&mut self, item: &T);

    /// Tests whether an element is accepted.
    fn check(&self, item: &T) -> bool;
}

/// The terminal classification of a candidate element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Proven genuine member of the filter.
    Confirmed,
    /// Proven false positive.
    Eliminated,
    /// No proof either way; the initial state, possibly permanent.
    Undetermined,
}

/// The outcome of a decoding run: the candidate universe partitioned into
/// proven members, proven false positives, and the undetermined residue.
///
/// Confirmed and Eliminated are terminal: within a run these sets only
/// grow, and no element is ever reclassified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction<T: Ord> {
    confirmed: BTreeSet<T>,
    eliminated: BTreeSet<T>,
    undetermined: BTreeSet<T>,
}

impl<T: Ord> Extraction<T> {
    pub(crate) fn new(
        confirmed: BTreeSet<T>,
        eliminated: BTreeSet<T>,
        undetermined: BTreeSet<T>,
    ) -> Self {
        Self {
            confirmed,
            eliminated,
            undetermined,
        }
    }

    /// Elements proven to be genuine members.
    pub fn confirmed(&self) -> &BTreeSet<T> {
        &self.confirmed
    }

    /// Elements proven to be false positives.
    pub fn eliminated(&self) -> &BTreeSet<T> {
        &self.eliminated
    }

    /// Candidates the run could not classify.
    pub fn undetermined(&self) -> &BTreeSet<T> {
        &self.undetermined
    }

    /// Number of unclassified candidates.
    pub fn num_undetermined(&self) -> usize {
        self.undetermined.len()
    }

    /// The verdict for a single candidate. Elements outside the candidate
    /// universe report [`Verdict::Undetermined`].
    pub fn verdict(&self, item: &T) -> Verdict {
        if self.confirmed.contains(item) {
            Verdict::Confirmed
        } else if self.eliminated.contains(item) {
            Verdict::Eliminated
        } else {
            Verdict::Undetermined
        }
    }

    /// Fraction of `total` candidates that were confirmed.
    pub fn extracted_fraction(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.confirmed.len() as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdicts_are_disjoint() {
        let extraction = Extraction::new(
            BTreeSet::from([1_u64, 2]),
            BTreeSet::from([3_u64]),
            BTreeSet::from([4_u64]),
        );

        assert_eq!(extraction.verdict(&1), Verdict::Confirmed);
        assert_eq!(extraction.verdict(&3), Verdict::Eliminated);
        assert_eq!(extraction.verdict(&4), Verdict::Undetermined);
        assert_eq!(extraction.verdict(&99), Verdict::Undetermined);
        assert_eq!(extraction.num_undetermined(), 1);
    }

    #[test]
    fn test_extracted_fraction() {
        let extraction = Extraction::new(
            BTreeSet::from([1_u64, 2]),
            BTreeSet::new(),
            BTreeSet::from([3_u64, 4]),
        );
        assert_eq!(extraction.extracted_fraction(4), 0.5);
        assert_eq!(Extraction::<u64>::default().extracted_fraction(0), 0.0);
    }
}
