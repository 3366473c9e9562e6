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

mod murmurhash;

pub(crate) use self::murmurhash::SlotHasher;

/// Default seed for the filter's slot derivation, a small prime.
///
/// Choosing a seed is somewhat arbitrary. What matters here is that the
/// probe function is deterministic: the extraction engine recomputes an
/// element's slots on every peel and every oracle probe, and all of its
/// proofs assume those recomputations agree with the slots the filter
/// incremented at insertion time. Two filters can only be compared, or one
/// filter attacked from a reconstructed incidence index, when seed and hash
/// function are identical on both sides.
pub(crate) const DEFAULT_SLOT_SEED: u64 = 9001;
