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

//! Workload construction for extraction experiments.
//!
//! An experiment needs two candidate populations drawn from a value domain
//! `1..=max_value`: genuine members inserted into the filter, and *decoys*,
//! values that were never inserted but which the loaded filter accepts
//! anyway. Decoys are found by rejection sampling against the live filter,
//! so their cost scales inversely with the filter's false-positive rate;
//! both samplers carry an attempt budget and fail with
//! [`ErrorKind::Exhausted`](crate::error::ErrorKind::Exhausted) instead of
//! looping forever on an infeasible request.

use std::collections::BTreeSet;

use rand::Rng;

use crate::error::Error;
use crate::extract::MembershipOracle;

// Rejection-sampling budgets, per requested value. Member draws only
// reject duplicates; decoy draws also reject everything the filter turns
// away, so their budget covers false-positive rates down to roughly 1e-4.
const MEMBER_ATTEMPTS_PER_SAMPLE: usize = 1_000;
const DECOY_ATTEMPTS_PER_SAMPLE: usize = 100_000;

/// Draws `count` distinct values uniformly from `1..=max_value` and
/// inserts each into the filter.
///
/// # Examples
///
/// ```
/// use filterleak::filter::CountingFilterBuilder;
/// use filterleak::workload::sample_members;
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha20Rng;
///
/// let mut rng = ChaCha20Rng::seed_from_u64(7);
/// let mut filter = CountingFilterBuilder::with_size(1024, 3).build();
/// let members = sample_members(&mut rng, 50, 1 << 32, &mut filter)?;
/// assert_eq!(members.len(), 50);
/// assert!(members.iter().all(|m| filter.check(m)));
/// # Ok::<(), filterleak::error::Error>(())
/// ```
pub fn sample_members<F, R>(
    rng: &mut R,
    count: usize,
    max_value: u64,
    filter: &mut F,
) -> Result<Vec<u64>, Error>
where
    F: MembershipOracle<u64>,
    R: Rng + ?Sized,
{
    if max_value == 0 || count as u64 > max_value {
        return Err(Error::invalid_config(
            "value domain too small for the requested member count",
        )
        .with_context("count", count)
        .with_context("max_value", max_value));
    }

    let mut drawn = BTreeSet::new();
    let mut members = Vec::with_capacity(count);
    let mut budget = count.saturating_mul(MEMBER_ATTEMPTS_PER_SAMPLE);
    while members.len() < count {
        if budget == 0 {
            return Err(Error::exhausted("member sampling ran out of attempts")
                .with_context("requested", count)
                .with_context("found", members.len()));
        }
        budget -= 1;
        let value = rng.gen_range(1..=max_value);
        if drawn.insert(value) {
            filter.add(&value);
            members.push(value);
        }
    }
    Ok(members)
}

/// Draws `count` distinct values from `1..=max_value` that the filter
/// accepts even though they are not members: neither in `exclude` (the
/// inserted members) nor drawn before.
pub fn sample_decoys<F, R>(
    rng: &mut R,
    count: usize,
    max_value: u64,
    filter: &F,
    exclude: &[u64],
) -> Result<Vec<u64>, Error>
where
    F: MembershipOracle<u64>,
    R: Rng + ?Sized,
{
    if max_value == 0 {
        return Err(
            Error::invalid_config("value domain is empty").with_context("max_value", max_value)
        );
    }

    let excluded: BTreeSet<u64> = exclude.iter().copied().collect();
    let mut drawn = BTreeSet::new();
    let mut decoys = Vec::with_capacity(count);
    let mut budget = count.saturating_mul(DECOY_ATTEMPTS_PER_SAMPLE);
    while decoys.len() < count {
        if budget == 0 {
            return Err(Error::exhausted("decoy sampling ran out of attempts")
                .with_context("requested", count)
                .with_context("found", decoys.len()));
        }
        budget -= 1;
        let value = rng.gen_range(1..=max_value);
        if excluded.contains(&value) || drawn.contains(&value) {
            continue;
        }
        if filter.check(&value) {
            drawn.insert(value);
            decoys.push(value);
        }
    }
    Ok(decoys)
}
