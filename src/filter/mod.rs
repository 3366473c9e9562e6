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

//! Counting Bloom filter: the structure under attack.
//!
//! A counting filter keeps m counters instead of m bits. Inserting an
//! element increments the k probe-selected counters, removing decrements
//! them, and a membership check reports positive when all k probed
//! counters are nonzero. Deletions are what the plain Bloom filter cannot
//! do, and the counters are exactly what the whitebox extraction mode
//! reads.
//!
//! # Properties
//!
//! - **No false negatives**: an inserted element always checks positive
//!   until it is removed.
//! - **Possible false positives**: an element never inserted may check
//!   positive when other insertions happen to cover all of its slots.
//!   These accidental positives are the raw material of the extraction
//!   engine in [`crate::extract`].
//! - **Removals**: removing an element the filter does not even accept
//!   would corrupt the counters of whatever shares its slots; this
//!   implementation asserts that every probed counter covers the
//!   element's probe landings on that slot before decrementing.
//!
//! # Probe modes
//!
//! The k slot indices come from double hashing (Kirsch–Mitzenmacher) over
//! a single 128-bit MurmurHash3 of the element. In [`ProbeMode::Plain`]
//! two probes of one element may land on the same slot, which then counts
//! that element twice. [`ProbeMode::CollisionAvoidant`] re-probes
//! sequentially (`slot + 1 mod m`) until the element holds k distinct
//! slots, modeling the filter variant that forbids self-collision; the
//! pair-wise black-box extraction guarantees are stated against this
//! variant.
//!
//! # Usage
//!
//! ```rust
//! use filterleak::filter::CountingFilterBuilder;
//! use filterleak::filter::ProbeMode;
//!
//! let mut filter = CountingFilterBuilder::with_size(1024, 3)
//!     .probe_mode(ProbeMode::CollisionAvoidant)
//!     .build();
//!
//! filter.add(&"apple");
//! assert!(filter.check(&"apple"));
//!
//! filter.remove(&"apple");
//! assert!(!filter.check(&"apple"));
//! assert!(filter.is_empty());
//! ```

mod builder;
mod counting;

pub use self::builder::CountingFilterBuilder;
pub use self::counting::CountingFilter;
pub use self::counting::ProbeMode;
