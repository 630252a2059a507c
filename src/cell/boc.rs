use super::{Cell, CellHash, MAX_DATA_BITS, MAX_DEPTH, MAX_REFS};
use crate::error::{DeployError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crc::{Crc, CRC_32_ISCSI};
use std::collections::{HashMap, HashSet};
use tracing::debug;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];
const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BocOptions {
    pub with_index: bool,
    pub with_crc32c: bool,
}

impl Default for BocOptions {
    fn default() -> Self {
        Self {
            with_index: false,
            with_crc32c: true,
        }
    }
}

/// Serializes `roots` and every cell reachable from them into a bag of cells.
///
/// Cells are stored once per distinct hash, parents before children.
///
/// # Errors
/// Returns `DeployError::BocError` if `roots` is empty.
pub fn serialize_boc(roots: &[Cell], options: BocOptions) -> Result<Vec<u8>> {
    if roots.is_empty() {
        return Err(DeployError::BocError("no root cells to serialize".to_string()));
    }

    let order = topological_order(roots);
    let index: HashMap<CellHash, usize> = order
        .iter()
        .enumerate()
        .map(|(idx, cell)| (cell.hash(), idx))
        .collect();

    let size_bytes = byte_width(order.len());
    let mut payload = Vec::new();
    let mut offsets = Vec::with_capacity(order.len());
    for cell in &order {
        payload.extend_from_slice(&cell.descriptors());
        payload.extend_from_slice(&cell.padded_data());
        for child in cell.refs() {
            let child_idx = index.get(&child.hash()).copied().ok_or_else(|| {
                DeployError::Internal("referenced cell missing from order".to_string())
            })?;
            push_be(&mut payload, child_idx, size_bytes);
        }
        offsets.push(payload.len());
    }
    let off_bytes = byte_width(payload.len());

    let mut flags = u8::try_from(size_bytes)
        .map_err(|_| DeployError::BocError("too many cells".to_string()))?;
    if options.with_index {
        flags |= 0x80;
    }
    if options.with_crc32c {
        flags |= 0x40;
    }

    let mut out = Vec::with_capacity(payload.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(flags);
    out.push(
        u8::try_from(off_bytes)
            .map_err(|_| DeployError::BocError("payload too large".to_string()))?,
    );
    push_be(&mut out, order.len(), size_bytes);
    push_be(&mut out, roots.len(), size_bytes);
    push_be(&mut out, 0, size_bytes);
    push_be(&mut out, payload.len(), off_bytes);
    for root in roots {
        let root_idx = index.get(&root.hash()).copied().ok_or_else(|| {
            DeployError::Internal("root cell missing from order".to_string())
        })?;
        push_be(&mut out, root_idx, size_bytes);
    }
    if options.with_index {
        for offset in offsets {
            push_be(&mut out, offset, off_bytes);
        }
    }
    out.extend_from_slice(&payload);
    if options.with_crc32c {
        let checksum = CRC32C.checksum(&out);
        out.extend_from_slice(&checksum.to_le_bytes());
    }

    debug!(cells = order.len(), bytes = out.len(), "serialized bag of cells");
    Ok(out)
}

/// Parses a bag of cells and returns its root cells.
///
/// # Errors
/// Returns `DeployError::BocError` for malformed input.
pub fn deserialize_boc(bytes: &[u8]) -> Result<Vec<Cell>> {
    let mut reader = BocReader::new(bytes);
    if reader.take(4)? != BOC_MAGIC {
        return Err(DeployError::BocError("unknown BoC magic".to_string()));
    }

    let flags = reader.byte()?;
    let has_index = flags & 0x80 != 0;
    let has_crc = flags & 0x40 != 0;
    let size_bytes = usize::from(flags & 0x07);
    if size_bytes == 0 || size_bytes > 4 {
        return Err(DeployError::BocError(format!(
            "invalid reference size {size_bytes}"
        )));
    }
    let off_bytes = usize::from(reader.byte()?);
    if off_bytes == 0 || off_bytes > 8 {
        return Err(DeployError::BocError(format!(
            "invalid offset size {off_bytes}"
        )));
    }

    if has_crc {
        let split = bytes
            .len()
            .checked_sub(4)
            .ok_or_else(|| DeployError::BocError("truncated checksum".to_string()))?;
        let (body, tail) = bytes.split_at(split);
        let expected = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);
        if CRC32C.checksum(body) != expected {
            return Err(DeployError::BocError("CRC32C mismatch".to_string()));
        }
    }

    let cell_count = reader.uint(size_bytes)?;
    let root_count = reader.uint(size_bytes)?;
    let absent = reader.uint(size_bytes)?;
    let total_size = reader.uint(off_bytes)?;
    if root_count == 0 || root_count > cell_count {
        return Err(DeployError::BocError(format!(
            "invalid root count {root_count} for {cell_count} cells"
        )));
    }
    if absent != 0 {
        return Err(DeployError::BocError("absent cells are not supported".to_string()));
    }

    let roots = (0..root_count)
        .map(|_| reader.uint(size_bytes))
        .collect::<Result<Vec<_>>>()?;
    if has_index {
        reader.take(cell_count.saturating_mul(off_bytes))?;
    }

    let cells_start = reader.position();
    let raw = (0..cell_count)
        .map(|idx| RawCell::read(&mut reader, idx, cell_count, size_bytes))
        .collect::<Result<Vec<_>>>()?;
    if reader.position() - cells_start != total_size {
        return Err(DeployError::BocError(
            "cell payload size does not match header".to_string(),
        ));
    }
    let payload_end = bytes.len().saturating_sub(if has_crc { 4 } else { 0 });
    if reader.position() != payload_end {
        return Err(DeployError::BocError(format!(
            "{} trailing bytes after cell payload",
            payload_end.abs_diff(reader.position())
        )));
    }

    let mut built: Vec<Option<Cell>> = vec![None; cell_count];
    for (idx, raw_cell) in raw.into_iter().enumerate().rev() {
        let refs = raw_cell
            .refs
            .iter()
            .map(|child| {
                built
                    .get(*child)
                    .and_then(Clone::clone)
                    .ok_or_else(|| DeployError::BocError(format!("dangling reference {child}")))
            })
            .collect::<Result<Vec<_>>>()?;
        let cell = Cell::from_parts(raw_cell.data, raw_cell.bit_len, refs);
        if cell.depth() > MAX_DEPTH {
            return Err(DeployError::BocError(format!(
                "cell {idx} exceeds depth {MAX_DEPTH}"
            )));
        }
        built[idx] = Some(cell);
    }

    roots
        .into_iter()
        .map(|root| {
            built
                .get(root)
                .and_then(Clone::clone)
                .ok_or_else(|| DeployError::BocError(format!("root index {root} out of range")))
        })
        .collect()
}

impl Cell {
    /// Single-root BoC in the default layout, base64 encoded.
    ///
    /// # Errors
    /// Propagates serialization failures.
    pub fn to_boc_base64(&self) -> Result<String> {
        let bytes = serialize_boc(std::slice::from_ref(self), BocOptions::default())?;
        Ok(STANDARD.encode(bytes))
    }

    /// Parses a base64 BoC and returns its first root.
    ///
    /// # Errors
    /// Returns `DeployError::BocError` if the input is not valid base64 or
    /// not a valid bag of cells.
    pub fn from_boc_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DeployError::BocError(format!("invalid base64: {e}")))?;
        Self::from_boc(&bytes)
    }

    /// # Errors
    /// Returns `DeployError::BocError` for malformed input.
    pub fn from_boc(bytes: &[u8]) -> Result<Self> {
        deserialize_boc(bytes)?
            .into_iter()
            .next()
            .ok_or_else(|| DeployError::BocError("BoC has no roots".to_string()))
    }
}

struct RawCell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<usize>,
}

impl RawCell {
    fn read(
        reader: &mut BocReader<'_>,
        idx: usize,
        cell_count: usize,
        size_bytes: usize,
    ) -> Result<Self> {
        let d1 = reader.byte()?;
        let d2 = reader.byte()?;
        if d1 & 0x08 != 0 {
            return Err(DeployError::BocError(format!(
                "cell {idx} is exotic; only ordinary cells are supported"
            )));
        }
        if d1 & 0x10 != 0 || d1 >> 5 != 0 {
            return Err(DeployError::BocError(format!(
                "cell {idx} carries stored hashes or a non-zero level"
            )));
        }
        let ref_count = usize::from(d1 & 0x07);
        if ref_count > MAX_REFS {
            return Err(DeployError::BocError(format!(
                "cell {idx} declares {ref_count} references"
            )));
        }

        let byte_len = usize::from(d2).div_ceil(2);
        let mut data = reader.take(byte_len)?.to_vec();
        let bit_len = if d2 % 2 == 0 {
            byte_len * 8
        } else {
            strip_completion_tag(&mut data)
                .ok_or_else(|| {
                    DeployError::BocError(format!(
                        "cell {idx} has a missing or non-canonical completion tag"
                    ))
                })?
        };
        if bit_len > MAX_DATA_BITS {
            return Err(DeployError::BocError(format!("cell {idx} has too many bits")));
        }

        let refs = (0..ref_count)
            .map(|_| reader.uint(size_bytes))
            .collect::<Result<Vec<_>>>()?;
        if let Some(bad) = refs.iter().find(|child| **child <= idx || **child >= cell_count) {
            return Err(DeployError::BocError(format!(
                "cell {idx} references invalid index {bad}"
            )));
        }

        Ok(Self {
            data,
            bit_len,
            refs,
        })
    }
}

/// Clears the trailing `1` tag bit and returns the real bit length.
///
/// A tag alone in the last byte means the data fits in one byte less, which
/// is not a canonical encoding.
fn strip_completion_tag(data: &mut [u8]) -> Option<usize> {
    let len = data.len();
    let last = data.last_mut()?;
    let tag_pos = last.trailing_zeros() as usize;
    if tag_pos >= 7 {
        return None;
    }
    *last &= !(1u8 << tag_pos);
    Some(len * 8 - tag_pos - 1)
}

struct BocReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BocReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    const fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| DeployError::BocError("unexpected end of BoC".to_string()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn uint(&mut self, width: usize) -> Result<usize> {
        Ok(self
            .take(width)?
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte)))
    }
}

fn topological_order(roots: &[Cell]) -> Vec<Cell> {
    let mut visited = HashSet::new();
    let mut post_order = Vec::new();
    for root in roots.iter().rev() {
        visit(root, &mut visited, &mut post_order);
    }
    post_order.reverse();
    post_order
}

fn visit(cell: &Cell, visited: &mut HashSet<CellHash>, post_order: &mut Vec<Cell>) {
    if !visited.insert(cell.hash()) {
        return;
    }
    for child in cell.refs().iter().rev() {
        visit(child, visited, post_order);
    }
    post_order.push(cell.clone());
}

const fn byte_width(value: usize) -> usize {
    let bits = usize::BITS - value.leading_zeros();
    let width = (bits as usize).div_ceil(8);
    if width == 0 {
        1
    } else {
        width
    }
}

fn push_be(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}
