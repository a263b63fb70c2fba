//! Exhaustive (flat) vector index with squared-L2 distance.
//!
//! Vectors are stored row-major in one contiguous buffer; row *i* is the
//! *i*-th vector ever appended. Nothing is normalised here: callers that want
//! cosine ranking must normalise before appending.

use byteorder::{ByteOrder, LittleEndian};

use docqa_core::types::SearchResult;
use docqa_core::{Error, Result};

const MAGIC: &[u8; 8] = b"DQFLAT01";
const HEADER_LEN: usize = 8 + 4 + 8;
/// Largest dimension the blob header can record.
pub const MAX_DIMENSION: usize = u32::MAX as usize;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatIndex {
    dimension: Option<usize>,
    data: Vec<f32>,
}

impl FlatIndex {
    pub fn new() -> Self { Self::default() }

    /// Fix the vector dimension. Re-initialising with the same value is a no-op.
    pub fn initialize(&mut self, dimension: usize) -> Result<()> {
        check_dimension(dimension)?;
        match self.dimension {
            Some(fixed) if fixed != dimension => Err(Error::Dimension { expected: fixed, actual: dimension }),
            _ => { self.dimension = Some(dimension); Ok(()) }
        }
    }

    pub fn dimension(&self) -> Option<usize> { self.dimension }

    pub fn len(&self) -> usize {
        match self.dimension {
            Some(d) => self.data.len() / d,
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Append in order. Every vector must match the fixed dimension (the first
    /// vector fixes it on an uninitialised index); on mismatch nothing is appended.
    pub fn append(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let Some(first) = vectors.first() else { return Ok(()) };
        let dim = self.dimension.unwrap_or(first.len());
        check_dimension(dim)?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::Dimension { expected: dim, actual: bad.len() });
        }
        self.dimension = Some(dim);
        self.data.reserve(vectors.len() * dim);
        for v in vectors { self.data.extend_from_slice(v); }
        Ok(())
    }

    /// Up to `k` nearest rows by ascending squared L2 distance; ties go to the
    /// lower position.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let Some(dim) = self.dimension else { return Ok(Vec::new()) };
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != dim {
            return Err(Error::Dimension { expected: dim, actual: query.len() });
        }
        let mut hits: Vec<SearchResult> = self
            .data
            .chunks_exact(dim)
            .enumerate()
            .map(|(position, row)| SearchResult { position, distance: squared_l2(query, row) })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.position.cmp(&b.position)));
        hits.truncate(k);
        Ok(hits)
    }

    pub fn reset(&mut self) {
        self.dimension = None;
        self.data.clear();
    }

    /// Layout: magic `DQFLAT01`, dimension `u32` LE, count `u64` LE, then
    /// `count * dimension` `f32` LE values. An uninitialised index has dimension 0.
    pub fn serialize(&self) -> Vec<u8> {
        let dim = self.dimension.unwrap_or(0);
        let mut buf = vec![0u8; HEADER_LEN + self.data.len() * 4];
        buf[..8].copy_from_slice(MAGIC);
        // lossless: every stored dimension passed `check_dimension`
        LittleEndian::write_u32(&mut buf[8..12], dim as u32);
        LittleEndian::write_u64(&mut buf[12..20], self.len() as u64);
        LittleEndian::write_f32_into(&self.data, &mut buf[HEADER_LEN..]);
        buf
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[..8] != MAGIC {
            return Err(Error::snapshot("vector index blob has no valid header"));
        }
        let dim = LittleEndian::read_u32(&bytes[8..12]) as usize;
        let count = usize::try_from(LittleEndian::read_u64(&bytes[12..20]))
            .map_err(|_| Error::snapshot("vector count does not fit in memory"))?;
        if dim == 0 {
            if count != 0 || bytes.len() != HEADER_LEN {
                return Err(Error::snapshot("uninitialised index blob carries vectors"));
            }
            return Ok(Self::new());
        }
        let values = count
            .checked_mul(dim)
            .ok_or_else(|| Error::snapshot("vector index blob size overflows"))?;
        let expected = values
            .checked_mul(4)
            .and_then(|b| b.checked_add(HEADER_LEN))
            .ok_or_else(|| Error::snapshot("vector index blob size overflows"))?;
        if bytes.len() != expected {
            return Err(Error::snapshot(format!("vector index blob is {} bytes, expected {}", bytes.len(), expected)));
        }
        let mut data = vec![0f32; values];
        LittleEndian::read_f32_into(&bytes[HEADER_LEN..], &mut data);
        Ok(Self { dimension: Some(dim), data })
    }
}

fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 {
        return Err(Error::Dimension { expected: 1, actual: 0 });
    }
    if dimension > MAX_DIMENSION {
        return Err(Error::Dimension { expected: MAX_DIMENSION, actual: dimension });
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| { let d = x - y; d * d }).sum()
}
