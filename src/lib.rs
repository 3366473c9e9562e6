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

//! Set extraction from counting Bloom filters.
//!
//! A counting Bloom filter leaks information about its contents: given a set
//! of *candidate positives* (elements the filter accepts, a mix of genuine
//! members and accidental false positives), an adversary can often prove
//! which candidates are genuine. This crate implements the two extraction
//! modes and the analytic model that predicts how far each one gets:
//!
//! - **Whitebox peeling** ([`extract::PeelingDecoder`]): reads the counter
//!   array directly and peels slots whose counter is exactly explained by
//!   the candidates mapped there, cascading eliminations until a fixpoint.
//! - **Black-box oracle probing** ([`extract::OracleTester`]): sees only
//!   `add`/`remove`/`check`, and proves membership by removing candidates
//!   (alone or in pairs) and observing which other candidates flip, always
//!   restoring the filter when a test is inconclusive.
//! - **Analytic density model** ([`extract::DensityEstimator`]): a fixed
//!   point recurrence over slot-occupancy probabilities that predicts the
//!   extractable fraction and the decoy-density threshold where peeling
//!   stops working, analogous to the core threshold of erasure-decoding
//!   graphs.
//!
//! Both decoders report only what they can *prove*: every confirmed element
//! is a genuine member, every eliminated element is a provable false
//! positive, and everything else stays undetermined.
//!
//! # Usage
//!
//! ```rust
//! use filterleak::extract::{OracleTester, PeelingDecoder};
//! use filterleak::filter::{CountingFilterBuilder, ProbeMode};
//!
//! let mut filter = CountingFilterBuilder::with_size(1024, 3)
//!     .probe_mode(ProbeMode::CollisionAvoidant)
//!     .build();
//! for element in 1..=64_u64 {
//!     filter.add(&element);
//! }
//!
//! // Candidate universe: everything the filter accepts (here: the members).
//! let universe: Vec<u64> = (1..=64).collect();
//!
//! // Whitebox: peel against the counter array.
//! let extraction = PeelingDecoder::new().extract(&filter, &universe).unwrap();
//! assert_eq!(extraction.confirmed().len(), 64);
//!
//! // Black-box: same universe, mutate/query access only.
//! let tester = OracleTester::new(&mut filter, &universe);
//! let extraction = tester.run(true);
//! assert!(extraction.confirmed().len() <= 64);
//! ```
//!
//! The extraction engine consumes the filter through the capability traits
//! [`extract::SlotView`] (whitebox) and [`extract::MembershipOracle`]
//! (black-box), so any filter implementation can be analyzed, including
//! test doubles with scripted slot tables. [`filter::CountingFilter`]
//! implements both.

pub mod error;
pub mod extract;
pub mod filter;
pub mod workload;

mod hash;
