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

use std::hash::Hasher;

use byteorder::ByteOrder;
use byteorder::LE;

const C1: u64 = 0x87c37b91114253d5;
const C2: u64 = 0x4cf5ad432745937f;

/// A seeded MurmurHash3 x64 128-bit hasher for deterministic slot
/// derivation.
///
/// The 128-bit output doubles as the `(h0, h1)` pair consumed by the
/// filter's double-hashing probe schedule, so a single hash computation
/// covers all k probes of an element.
///
/// Elements are fed through the std [`Hasher`] interface. The written bytes
/// are buffered and the hash computed in one shot at finalization; filter
/// elements hash to a handful of bytes, so streaming block state would buy
/// nothing here.
#[derive(Debug)]
pub(crate) struct SlotHasher {
    seed: u64,
    buf: Vec<u8>,
}

impl SlotHasher {
    pub fn with_seed(seed: u64) -> Self {
        SlotHasher {
            seed,
            buf: Vec::with_capacity(16),
        }
    }

    /// Finalizes the full 128-bit hash of everything written so far.
    pub fn finish128(&self) -> (u64, u64) {
        murmur3_x64_128(&self.buf, self.seed)
    }
}

impl Hasher for SlotHasher {
    fn finish(&self) -> u64 {
        self.finish128().0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

/// One-shot MurmurHash3 x64 128 over a complete byte slice.
fn murmur3_x64_128(data: &[u8], seed: u64) -> (u64, u64) {
    let mut h1 = seed;
    let mut h2 = seed;

    // Body: full 128-bit blocks.
    let mut blocks = data.chunks_exact(16);
    for block in blocks.by_ref() {
        let k1 = LE::read_u64(&block[0..8]);
        let k2 = LE::read_u64(&block[8..16]);

        h1 ^= mix_k1(k1);
        h1 = h1.rotate_left(27);
        h1 = h1.wrapping_add(h2);
        h1 = h1.wrapping_mul(5).wrapping_add(0x52dce729);

        h2 ^= mix_k2(k2);
        h2 = h2.rotate_left(31);
        h2 = h2.wrapping_add(h1);
        h2 = h2.wrapping_mul(5).wrapping_add(0x38495ab5);
    }

    // Tail: up to 15 remaining bytes, zero-padded little endian.
    let tail = blocks.remainder();
    if !tail.is_empty() {
        if tail.len() > 8 {
            h2 ^= mix_k2(read_u64_padded(&tail[8..]));
        }
        h1 ^= mix_k1(read_u64_padded(&tail[..tail.len().min(8)]));
    }

    let total = data.len() as u64;
    h1 ^= total;
    h2 ^= total;
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    h1 = fmix64(h1);
    h2 = fmix64(h2);
    h1 = h1.wrapping_add(h2);
    h2 = h2.wrapping_add(h1);
    (h1, h2)
}

#[inline]
fn mix_k1(mut k1: u64) -> u64 {
    k1 = k1.wrapping_mul(C1);
    k1 = k1.rotate_left(31);
    k1.wrapping_mul(C2)
}

#[inline]
fn mix_k2(mut k2: u64) -> u64 {
    k2 = k2.wrapping_mul(C2);
    k2 = k2.rotate_left(33);
    k2.wrapping_mul(C1)
}

/// Reads at most 8 bytes as a zero-padded little-endian u64.
#[inline]
fn read_u64_padded(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Finalization mix: force all bits of a hash block to avalanche.
#[inline]
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51afd7ed558ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ceb9fe1a85ec53);
    k ^ (k >> 33)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_bytes(key: &[u8], seed: u64) -> (u64, u64) {
        let mut hasher = SlotHasher::with_seed(seed);
        hasher.write(key);
        hasher.finish128()
    }

    #[test]
    fn test_known_vectors() {
        // remainder > 8
        let key = "The quick brown fox jumps over the lazy dog";
        let (h1, h2) = hash_bytes(key.as_bytes(), 0);
        assert_eq!(h1, 0xe34bbc7bbc071b6c);
        assert_eq!(h2, 0x7a433ca9c49a9347);

        // change one bit
        let key = "The quick brown fox jumps over the lazy eog";
        let (h1, h2) = hash_bytes(key.as_bytes(), 0);
        assert_eq!(h1, 0x362108102c62d1c9);
        assert_eq!(h2, 0x3285cd100292b305);

        // remainder < 8
        let key = "The quick brown fox jumps over the lazy dogdogdog";
        let (h1, h2) = hash_bytes(key.as_bytes(), 0);
        assert_eq!(h1, 0x9c8205300e612fc4);
        assert_eq!(h2, 0xcbc0af6136aa3df9);

        // remainder = 8
        let key = "The quick brown fox jumps over the lazy1";
        let (h1, h2) = hash_bytes(key.as_bytes(), 0);
        assert_eq!(h1, 0xe3301a827e5cdfe3);
        assert_eq!(h2, 0xbdbf05f8da0f0392);
    }

    #[test]
    fn test_split_writes_match_single_write() {
        let key = b"counting filters leak their contents";
        let (h1, h2) = hash_bytes(key, 9001);

        let mut hasher = SlotHasher::with_seed(9001);
        hasher.write(&key[..7]);
        hasher.write(&key[7..20]);
        hasher.write(&key[20..]);
        assert_eq!(hasher.finish128(), (h1, h2));
    }

    #[test]
    fn test_seed_changes_output() {
        let key = b"element";
        assert_ne!(hash_bytes(key, 0), hash_bytes(key, 1));
    }
}
