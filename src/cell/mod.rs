//! Ordinary TON cells and the builder used to create them.
//!
//! A cell carries up to 1023 data bits and up to four references to other
//! cells. Cells are immutable once built; the representation hash and depth
//! are computed at construction and cached.

use crate::error::{DeployError, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

mod boc;

pub use boc::{deserialize_boc, serialize_boc, BocOptions};

pub const MAX_DATA_BITS: usize = 1023;
pub const MAX_REFS: usize = 4;
pub const MAX_DEPTH: u16 = 1024;

pub type CellHash = [u8; 32];

#[derive(Clone)]
pub struct Cell(Arc<CellInner>);

struct CellInner {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
    hash: CellHash,
    depth: u16,
}

impl Cell {
    #[must_use]
    pub fn empty() -> Self {
        Self::from_parts(Vec::new(), 0, Vec::new())
    }

    /// Assembles a cell from already validated parts.
    ///
    /// `data` must hold exactly `bit_len.div_ceil(8)` bytes with the unused
    /// trailing bits cleared.
    fn from_parts(data: Vec<u8>, bit_len: usize, refs: Vec<Self>) -> Self {
        let depth = refs
            .iter()
            .map(Self::depth)
            .max()
            .map_or(0, |deepest| deepest.saturating_add(1));
        let descriptors = descriptors_for(bit_len, refs.len());
        let hash = representation_hash(descriptors, &pad_data(&data, bit_len), &refs);

        Self(Arc::new(CellInner {
            data,
            bit_len,
            refs,
            hash,
            depth,
        }))
    }

    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.0.bit_len
    }

    /// Raw data bytes, without the completion tag.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0.data
    }

    #[must_use]
    pub fn refs(&self) -> &[Self] {
        &self.0.refs
    }

    #[must_use]
    pub fn hash(&self) -> CellHash {
        self.0.hash
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.0.hash)
    }

    #[must_use]
    pub fn depth(&self) -> u16 {
        self.0.depth
    }

    /// The `d1`/`d2` descriptor bytes of an ordinary level-0 cell.
    #[must_use]
    pub fn descriptors(&self) -> [u8; 2] {
        descriptors_for(self.0.bit_len, self.0.refs.len())
    }

    /// Data bytes with the completion tag appended when the bit length is not
    /// byte aligned.
    #[must_use]
    pub fn padded_data(&self) -> Vec<u8> {
        pad_data(&self.0.data, self.0.bit_len)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn descriptors_for(bit_len: usize, refs: usize) -> [u8; 2] {
    // bit_len <= 1023 and refs <= 4 keep both values in u8 range.
    let d1 = refs as u8;
    let d2 = (bit_len / 8 + bit_len.div_ceil(8)) as u8;
    [d1, d2]
}

fn pad_data(data: &[u8], bit_len: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    let rem = bit_len % 8;
    if rem != 0 {
        if let Some(last) = padded.last_mut() {
            *last |= 0x80 >> rem;
        }
    }
    padded
}

fn representation_hash(descriptors: [u8; 2], padded: &[u8], refs: &[Cell]) -> CellHash {
    let mut hasher = Sha256::new();
    hasher.update(descriptors);
    hasher.update(padded);
    for child in refs {
        hasher.update(child.depth().to_be_bytes());
    }
    for child in refs {
        hasher.update(child.hash());
    }
    hasher.finalize().into()
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.0.hash == other.0.hash
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash.hash(state);
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("bits", &self.0.bit_len)
            .field("data", &hex::encode(&self.0.data))
            .field("refs", &self.0.refs.len())
            .field("hash", &self.hash_hex())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Cell>,
}

impl CellBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            bit_len: 0,
            refs: Vec::new(),
        }
    }

    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.bit_len
    }

    #[must_use]
    pub const fn remaining_bits(&self) -> usize {
        MAX_DATA_BITS - self.bit_len
    }

    /// # Errors
    /// Returns `DeployError::CellError` if the cell has no room left.
    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Stores `value` as an unsigned big-endian integer of `bits` width.
    ///
    /// # Errors
    /// Returns `DeployError::CellError` if `bits > 64`, the value does not fit,
    /// or the cell overflows.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        if bits > 64 {
            return Err(DeployError::CellError(format!(
                "uint width {bits} exceeds 64 bits"
            )));
        }
        if bits < 64 && value >> bits != 0 {
            return Err(DeployError::CellError(format!(
                "value {value} does not fit in {bits} bits"
            )));
        }
        self.ensure_bits(bits)?;
        for shift in (0..bits).rev() {
            self.push_bit((value >> shift) & 1 == 1);
        }
        Ok(self)
    }

    /// # Errors
    /// Returns `DeployError::CellError` if the cell overflows.
    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.ensure_bits(bytes.len() * 8)?;
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
        } else {
            for byte in bytes {
                for shift in (0..8).rev() {
                    self.push_bit((byte >> shift) & 1 == 1);
                }
            }
        }
        Ok(self)
    }

    /// # Errors
    /// Returns `DeployError::CellError` if four references are already stored.
    pub fn store_ref(&mut self, cell: Cell) -> Result<&mut Self> {
        if self.refs.len() >= MAX_REFS {
            return Err(DeployError::CellError(format!(
                "cell already holds {MAX_REFS} references"
            )));
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Stores TL-B `Maybe ^Cell`: a presence bit, then the reference if any.
    ///
    /// # Errors
    /// Returns `DeployError::CellError` on bit or reference overflow.
    pub fn store_maybe_ref(&mut self, cell: Option<Cell>) -> Result<&mut Self> {
        match cell {
            Some(cell) => {
                if self.refs.len() >= MAX_REFS {
                    return Err(DeployError::CellError(format!(
                        "cell already holds {MAX_REFS} references"
                    )));
                }
                self.store_bit(true)?;
                self.refs.push(cell);
            }
            None => {
                self.store_bit(false)?;
            }
        }
        Ok(self)
    }

    /// # Errors
    /// Returns `DeployError::CellError` if the resulting cell would exceed the
    /// maximum depth.
    pub fn build(&self) -> Result<Cell> {
        let deepest = self.refs.iter().map(Cell::depth).max().unwrap_or(0);
        if !self.refs.is_empty() && deepest >= MAX_DEPTH {
            return Err(DeployError::CellError(format!(
                "cell depth exceeds {MAX_DEPTH}"
            )));
        }
        Ok(Cell::from_parts(
            self.data.clone(),
            self.bit_len,
            self.refs.clone(),
        ))
    }

    fn ensure_bits(&self, extra: usize) -> Result<()> {
        if self.bit_len + extra > MAX_DATA_BITS {
            return Err(DeployError::CellError(format!(
                "cell overflow: {} + {extra} bits exceeds {MAX_DATA_BITS}",
                self.bit_len
            )));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            if let Some(last) = self.data.last_mut() {
                *last |= 0x80 >> (self.bit_len % 8);
            }
        }
        self.bit_len += 1;
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn code_cell() -> Cell {
        let mut builder = CellBuilder::new();
        builder
            .store_bytes(&hex::decode("ff00f4a413f4bcf2c80b").unwrap())
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn empty_cell_hash_matches_reference() {
        assert_eq!(
            Cell::empty().hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
        assert_eq!(Cell::empty().depth(), 0);
    }

    #[test]
    fn unaligned_bits_are_padded_before_hashing() {
        let mut builder = CellBuilder::new();
        builder.store_uint(0b101, 3).unwrap();
        let cell = builder.build().unwrap();

        assert_eq!(cell.data(), &[0b1010_0000]);
        assert_eq!(cell.padded_data(), vec![0b1011_0000]);
        assert_eq!(cell.descriptors(), [0, 1]);
        assert_eq!(
            cell.hash_hex(),
            "c8235418b5cd55bc46073ea5cf9f3aac5a594ed782bee88dcd0acfd8ede4c756"
        );
    }

    #[test]
    fn single_zero_bit_cell_hash() {
        let mut builder = CellBuilder::new();
        builder.store_bit(false).unwrap();
        assert_eq!(
            builder.build().unwrap().hash_hex(),
            "90aec8965afabb16ebc3cb9b408ebae71b618d78788bc80d09843593cac98da4"
        );
    }

    #[test]
    fn byte_aligned_code_cell_hash() {
        assert_eq!(
            code_cell().hash_hex(),
            "a15302bda5e65b3ac33010ffe05d525c1067ff6af37fe20807ea4a0c07b923d8"
        );
    }

    #[test]
    fn depth_follows_deepest_reference() {
        let leaf = Cell::empty();
        let mut mid = CellBuilder::new();
        mid.store_ref(leaf.clone()).unwrap();
        let mid = mid.build().unwrap();

        let mut root = CellBuilder::new();
        root.store_ref(leaf).unwrap().store_ref(mid).unwrap();
        let root = root.build().unwrap();

        assert_eq!(root.depth(), 2);
        assert_eq!(root.descriptors(), [2, 0]);
    }

    #[test]
    fn builder_rejects_overflow() {
        let mut builder = CellBuilder::new();
        builder.store_bytes(&[0u8; 127]).unwrap();
        builder.store_uint(0, 7).unwrap();
        assert_eq!(builder.remaining_bits(), 0);
        assert!(builder.store_bit(true).is_err());

        let mut refs = CellBuilder::new();
        for _ in 0..MAX_REFS {
            refs.store_ref(Cell::empty()).unwrap();
        }
        assert!(refs.store_ref(Cell::empty()).is_err());
        assert!(refs.store_maybe_ref(Some(Cell::empty())).is_err());
    }

    #[test]
    fn store_uint_rejects_values_wider_than_requested() {
        let mut builder = CellBuilder::new();
        assert!(builder.store_uint(4, 2).is_err());
        assert!(builder.store_uint(1, 65).is_err());
        assert_eq!(builder.bit_len(), 0);
        builder.store_uint(u64::MAX, 64).unwrap();
        assert_eq!(builder.bit_len(), 64);
    }

    #[test]
    fn unaligned_store_bytes_matches_bitwise_store() {
        let mut shifted = CellBuilder::new();
        shifted.store_bit(true).unwrap().store_bytes(&[0xAB]).unwrap();

        let mut bitwise = CellBuilder::new();
        bitwise.store_bit(true).unwrap().store_uint(0xAB, 8).unwrap();

        assert_eq!(shifted.build().unwrap(), bitwise.build().unwrap());
    }
}
