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

use super::CountingFilter;
use super::ProbeMode;
use crate::hash::DEFAULT_SLOT_SEED;

pub const MIN_NUM_SLOTS: usize = 1;
pub const MAX_NUM_SLOTS: usize = i32::MAX as usize;
pub const MIN_NUM_PROBES: u16 = 1;
pub const MAX_NUM_PROBES: u16 = i16::MAX as u16;

/// Builder for creating [`CountingFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): specify target items and
///   false positive rate (recommended)
/// - [`with_size()`](Self::with_size): specify slot and probe counts
///   (manual)
#[derive(Debug, Clone)]
pub struct CountingFilterBuilder {
    num_slots: usize,
    num_probes: u16,
    seed: u64,
    probe_mode: ProbeMode,
}

impl CountingFilterBuilder {
    /// Creates a builder with optimal parameters for a target accuracy.
    ///
    /// Automatically calculates the optimal slot and probe counts to
    /// achieve the desired false positive probability for a given number
    /// of items.
    ///
    /// # Arguments
    ///
    /// - `max_items`: Maximum expected number of distinct items
    /// - `fpp`: Target false positive probability (e.g., 0.01 for 1%)
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is 0 or `fpp` is not in (0.0, 1.0].
    ///
    /// # Examples
    ///
    /// ```
    /// # use filterleak::filter::CountingFilterBuilder;
    /// let filter = CountingFilterBuilder::with_accuracy(10_000, 0.01)
    ///     .seed(42)
    ///     .build();
    /// ```
    pub fn with_accuracy(max_items: u64, fpp: f64) -> Self {
        assert!(max_items > 0, "max_items must be greater than 0");
        assert!(
            fpp > 0.0 && fpp <= 1.0,
            "fpp must be between 0.0 and 1.0 (inclusive of 1.0)"
        );

        let num_slots = Self::suggest_num_slots(max_items, fpp);
        let num_probes = Self::suggest_num_probes(max_items, num_slots);

        CountingFilterBuilder {
            num_slots,
            num_probes,
            seed: DEFAULT_SLOT_SEED,
            probe_mode: ProbeMode::Plain,
        }
    }

    /// Creates a builder with manual size specification.
    ///
    /// # Arguments
    ///
    /// - `num_slots`: Number of counters in the filter (m)
    /// - `num_probes`: Number of probes per element (k)
    ///
    /// # Panics
    ///
    /// Panics if either count is zero or exceeds the supported maximum.
    ///
    /// # Examples
    ///
    /// ```
    /// # use filterleak::filter::CountingFilterBuilder;
    /// let filter = CountingFilterBuilder::with_size(1024, 3).build();
    /// assert_eq!(filter.num_slots(), 1024);
    /// assert_eq!(filter.num_probes(), 3);
    /// ```
    pub fn with_size(num_slots: usize, num_probes: u16) -> Self {
        assert!(
            num_slots >= MIN_NUM_SLOTS,
            "num_slots must be at least {}",
            MIN_NUM_SLOTS
        );
        assert!(
            num_slots <= MAX_NUM_SLOTS,
            "num_slots must not exceed {}",
            MAX_NUM_SLOTS
        );
        assert!(
            num_probes >= MIN_NUM_PROBES,
            "num_probes must be at least {}",
            MIN_NUM_PROBES
        );
        assert!(
            num_probes <= MAX_NUM_PROBES,
            "num_probes must not exceed {}",
            MAX_NUM_PROBES
        );

        CountingFilterBuilder {
            num_slots,
            num_probes,
            seed: DEFAULT_SLOT_SEED,
            probe_mode: ProbeMode::Plain,
        }
    }

    /// Sets a custom hash seed (default: 9001).
    ///
    /// **Important**: the extraction engine must observe a filter through
    /// the same seed it was built with; slot proofs across seeds are
    /// meaningless.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the probe derivation mode (default: [`ProbeMode::Plain`]).
    pub fn probe_mode(mut self, probe_mode: ProbeMode) -> Self {
        self.probe_mode = probe_mode;
        self
    }

    /// Builds the counting filter.
    ///
    /// # Panics
    ///
    /// Panics if the mode is [`ProbeMode::CollisionAvoidant`] and the probe
    /// count exceeds the slot count, since re-probing could never place an
    /// element on k distinct slots.
    pub fn build(self) -> CountingFilter {
        if self.probe_mode == ProbeMode::CollisionAvoidant {
            assert!(
                usize::from(self.num_probes) <= self.num_slots,
                "num_probes must not exceed num_slots in collision-avoidant mode"
            );
        }
        CountingFilter {
            seed: self.seed,
            num_probes: self.num_probes,
            probe_mode: self.probe_mode,
            num_items: 0,
            counters: vec![0; self.num_slots],
        }
    }

    /// Suggests the optimal slot count given max items and target FPP.
    ///
    /// Formula: `m = -n * ln(p) / (ln(2)^2)`
    /// where n = max_items, p = fpp
    pub fn suggest_num_slots(max_items: u64, fpp: f64) -> usize {
        let n = max_items as f64;
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;

        let slots = (-n * fpp.ln() / ln2_squared).ceil() as usize;

        slots.clamp(MIN_NUM_SLOTS, MAX_NUM_SLOTS)
    }

    /// Suggests the optimal probe count given max items and slot count.
    ///
    /// Formula: `k = (m/n) * ln(2)`
    /// where m = num_slots, n = max_items
    pub fn suggest_num_probes(max_items: u64, num_slots: usize) -> u16 {
        let k = (num_slots as f64 / max_items as f64 * std::f64::consts::LN_2).ceil();
        (k as u16).clamp(MIN_NUM_PROBES, MAX_NUM_PROBES)
    }
}
