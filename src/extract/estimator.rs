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

const FIXPOINT_ROUNDS: usize = 1000;
const THRESHOLD_SEARCH_HIGH: f64 = 500.0;
const THRESHOLD_TOLERANCE: f64 = 1e-4;
const CORE_VANISHES_BELOW: f64 = 1e-6;

/// Which extraction procedure the fixpoint models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Counter-reading peeling: only false-positive load blocks a slot.
    Whitebox,
    /// Single-element differential tests: genuine load blocks too.
    BlackboxSingle,
    /// Single plus pair tests: slots of genuine degree one or two resolve.
    BlackboxPairs,
}

/// Density-evolution model of the extraction fixpoint.
///
/// Treats slot occupancy as Poisson and iterates the survival
/// probabilities of false positives (`p_f`) and genuine members (`p_s`)
/// under the chosen [`ExtractionMode`], the same style of analysis used
/// for peeling-decodable codes. Loads are per-slot: a genuine load of
/// `ln 2 / k` corresponds to a filter sized for its design capacity.
///
/// All methods are pure math on the configuration; nothing here touches a
/// filter.
///
/// # Examples
///
/// ```
/// use filterleak::extract::DensityEstimator;
/// use filterleak::extract::ExtractionMode;
///
/// let estimator = DensityEstimator::new(8)?;
/// let threshold = estimator.critical_threshold(ExtractionMode::Whitebox);
/// assert!(threshold > 0.0);
/// # Ok::<(), filterleak::error::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DensityEstimator {
    num_probes: u16,
    slot_load: f64,
}

impl DensityEstimator {
    /// Creates an estimator for filters with `num_probes` probes per
    /// element, at the design genuine load of `ln 2 / num_probes`.
    pub fn new(num_probes: u16) -> Result<Self, Error> {
        if num_probes == 0 {
            return Err(Error::invalid_config(
                "estimator requires at least one probe per element",
            ));
        }
        Ok(Self {
            num_probes,
            slot_load: f64::ln(2.0) / f64::from(num_probes),
        })
    }

    /// The per-slot genuine load the estimator models.
    pub fn slot_load(&self) -> f64 {
        self.slot_load
    }

    /// Surviving core density for a given per-slot false-positive load:
    /// the fraction of genuine members the extraction never resolves.
    ///
    /// Zero (up to the fixpoint's numerical floor) means full extraction.
    pub fn core_density(&self, fp_load: f64, mode: ExtractionMode) -> f64 {
        assert!(fp_load >= 0.0, "false-positive load must be non-negative");
        let k = f64::from(self.num_probes);
        let mut resolved_fp = 0.0;
        let mut resolved_genuine = 0.0;
        for _ in 0..FIXPOINT_ROUNDS {
            (resolved_fp, resolved_genuine) =
                self.step(fp_load, resolved_fp, resolved_genuine, mode);
        }
        (1.0 - resolved_genuine).powf(k)
    }

    /// The largest per-slot false-positive load under which the core still
    /// vanishes, found by bisection. Loads above it leave a macroscopic
    /// unresolved core.
    pub fn critical_threshold(&self, mode: ExtractionMode) -> f64 {
        let mut low = 0.0;
        let mut high = THRESHOLD_SEARCH_HIGH;
        while high - low > THRESHOLD_TOLERANCE {
            let mid = (low + high) / 2.0;
            if self.core_density(mid, mode) < CORE_VANISHES_BELOW {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Predicted extracted fraction of the genuine members when the
    /// candidate universe carries `fp_ratio` false positives per member.
    pub fn predicted_extraction(&self, fp_ratio: f64, mode: ExtractionMode) -> f64 {
        assert!(fp_ratio >= 0.0, "false-positive ratio must be non-negative");
        // A universe ratio translates to per-slot load through the design
        // false-positive rate 2^-k: only a 2^-k fraction of decoys would
        // land in the filter, so a candidate list carrying `fp_ratio`
        // false positives per member was drawn 2^k times larger.
        let fp_load = fp_ratio * f64::from(self.num_probes).exp2() * self.slot_load;
        1.0 - self.core_density(fp_load, mode)
    }

    /// One round of the survival fixpoint. `resolved_fp` and
    /// `resolved_genuine` are the probabilities that a given false
    /// positive (resp. member) has been resolved so far; returns the
    /// updated pair.
    fn step(
        &self,
        fp_load: f64,
        resolved_fp: f64,
        resolved_genuine: f64,
        mode: ExtractionMode,
    ) -> (f64, f64) {
        let k = f64::from(self.num_probes);
        // Mean count of *unresolved* false positives (resp. members)
        // sharing one fixed probe of an element, Poisson-thinned by the
        // current resolution probabilities.
        let fp_blockers = k * fp_load * (1.0 - resolved_fp).powf(k - 1.0);
        let genuine_blockers = k * self.slot_load * (1.0 - resolved_genuine).powf(k - 1.0);

        let next_genuine = match mode {
            // Peeling reads counters, so genuine co-occupants of a slot
            // are accounted for exactly; only unresolved false positives
            // block it.
            ExtractionMode::Whitebox => (-fp_blockers).exp(),
            // A single test needs a slot free of everyone else.
            ExtractionMode::BlackboxSingle => (-fp_blockers - genuine_blockers).exp(),
            // A pair test tolerates exactly one other unresolved member in
            // the slot.
            ExtractionMode::BlackboxPairs => {
                (-fp_blockers - genuine_blockers).exp() * (1.0 + genuine_blockers)
            }
        };
        // A false positive resolves once some probe is free of unresolved
        // members.
        let next_fp = (-genuine_blockers).exp();
        (next_fp, next_genuine)
    }
}
