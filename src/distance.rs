
// imports
use crate::compressor::{Compress, Deflate};
use crate::error::{NcdError, Result};

/// A fixed second operand with its compressed size computed once.
///
/// Classification compares many corpus texts against the same query, so the
/// query's size is cached here instead of being recompressed per pair.
#[derive(Clone, Copy, Debug)]
pub struct Reference<'a> {
    text: &'a [u8],
    size: usize,
}

impl<'a> Reference<'a> {

    pub fn text(&self) -> &'a [u8] {
        self.text
    }

    pub fn compressed_size(&self) -> usize {
        self.size
    }
}

/// Normalized compression distance over a given compressor.
#[derive(Clone, Debug, Default)]
pub struct NcdEngine<C: Compress = Deflate> {
    compressor: C,
}

impl<C: Compress> NcdEngine<C> {

    pub fn new(compressor: C) -> NcdEngine<C> {
        Self {
            compressor: compressor
        }
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    pub fn reference<'a>(&self, text: &'a [u8]) -> Result<Reference<'a>> {
        let size = self.compressor.compressed_size(text)?;
        Ok(Reference { text: text, size: size })
    }

    /// `(C(ab) - min(C(a), C(b))) / max(C(a), C(b))`.
    ///
    /// The concatenation is always `a` then `b`, so `ncd(a, b)` and `ncd(b, a)`
    /// can differ.
    pub fn ncd(&self, a: &[u8], b: &[u8]) -> Result<f64> {
        let reference = self.reference(b)?;
        self.ncd_with_reference(a, &reference)
    }

    pub fn ncd_with_reference(&self, a: &[u8], reference: &Reference<'_>) -> Result<f64> {

        let ca = self.compressor.compressed_size(a)?;

        // the joined buffer only lives for this pair
        let cab = {
            let mut ab: Vec<u8> = Vec::with_capacity(a.len() + reference.text.len());
            ab.extend_from_slice(a);
            ab.extend_from_slice(reference.text);
            self.compressor.compressed_size(&ab)?
        };

        ncd_from_sizes(ca, reference.size, cab)
    }

}

/// Evaluates the distance formula on already known compressed sizes.
///
/// The result is not clamped: real compressors can push it slightly below 0 or
/// above 1.
pub fn ncd_from_sizes(ca: usize, cb: usize, cab: usize) -> Result<f64> {

    let mn = ca.min(cb) as f64;
    let mx = ca.max(cb) as f64;
    if mx == 0.0 {
        return Err(NcdError::DegenerateDistance);
    }

    Ok((cab as f64 - mn) / mx)
}
