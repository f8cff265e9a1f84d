// Copyright 2023 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

/// Compact fixed-size set of bits.
///
/// Used e.g. for contact masks and for marking visited indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    len: usize,
    chunks: Vec<u64>,
}

const CHUNK_BITS: usize = u64::BITS as usize;

impl BitSet {
    /// Create a new bitset with `len` cleared bits.
    pub fn new(len: usize) -> anyhow::Result<Self> {
        if len == 0 {
            anyhow::bail!("Bitset length must be positive");
        }
        Ok(Self {
            len,
            chunks: vec![0; len.div_ceil(CHUNK_BITS)],
        })
    }

    /// Number of bits.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, index: usize) {
        let (chunk, bit) = self.locate(index);
        self.chunks[chunk] |= 1 << bit;
    }

    pub fn clear(&mut self, index: usize) {
        let (chunk, bit) = self.locate(index);
        self.chunks[chunk] &= !(1 << bit);
    }

    /// Value of the bit at `index`.
    pub fn get(&self, index: usize) -> bool {
        let (chunk, bit) = self.locate(index);
        (self.chunks[chunk] >> bit) & 1 == 1
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.chunks.iter().map(|c| c.count_ones() as usize).sum()
    }

    /// Indices of all set bits in increasing order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(|&i| self.get(i))
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        assert!(
            index < self.len,
            "bit index {index} out of range for length {}",
            self.len
        );
        (index / CHUNK_BITS, index % CHUNK_BITS)
    }
}
