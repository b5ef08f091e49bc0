
// imports
use crate::error::{NcdError, Result};

use std::fmt::Display;
use std::io;
use std::str::FromStr;
use flate2::{Compress as DeflateStream, Compression, FlushCompress, Status};

// the smallest scratch buffer handed to the stream, so that empty or tiny inputs
// still have room for the framing bytes.
const MIN_SCRATCH: usize = 64;

/// Anything that can report the compressed size of a byte buffer.
///
/// Implementations must be deterministic and keep no state between calls, since one
/// instance is shared by every worker of a classification.
pub trait Compress: Sync {
    fn compressed_size(&self, buffer: &[u8]) -> Result<usize>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    Zlib,
    Raw,
}

impl FromStr for Framing {
    type Err = NcdError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zlib" => Ok(Framing::Zlib),
            "raw" | "deflate" => Ok(Framing::Raw),
            _ => Err(NcdError::Config(format!("unrecognized compression '{}', expected zlib or raw", s)))
        }
    }
}

impl Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Framing::Zlib => write!(f, "zlib"),
            Framing::Raw => write!(f, "raw"),
        }
    }
}

/// DEFLATE through `flate2`, one single-shot stream per call.
#[derive(Clone, Copy, Debug)]
pub struct Deflate {
    framing: Framing,
    level: Compression,
}

impl Default for Deflate {
    fn default() -> Self {
        Self {
            framing: Framing::Zlib,
            level: Compression::best()
        }
    }
}

impl Deflate {

    pub fn new(framing: Framing, level: u32) -> Result<Deflate> {

        if level > 9 {
            return Err(NcdError::InvalidArgument(format!("compression level must be within 0..=9, got {}", level)));
        }

        Ok(
            Self {
                framing: framing,
                level: Compression::new(level)
            }
        )
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }

    // deflate may expand incompressible input, the scratch buffer starts at twice
    // the input and the vec grows whenever the stream runs out of room.
    fn scratch_capacity(input_len: usize) -> usize {
        input_len.saturating_mul(2).max(MIN_SCRATCH)
    }

}

impl Compress for Deflate {

    fn compressed_size(&self, buffer: &[u8]) -> Result<usize> {

        // the stream lives for this call only and is released on every exit path
        let mut stream = DeflateStream::new(self.level, self.framing == Framing::Zlib);
        let mut output: Vec<u8> = Vec::with_capacity(Deflate::scratch_capacity(buffer.len()));

        loop {
            let consumed = stream.total_in() as usize;
            let status = stream
                .compress_vec(&buffer[consumed..], &mut output, FlushCompress::Finish)
                .map_err(|e| NcdError::CompressionFailure(io::Error::new(io::ErrorKind::Other, e)))?;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let grow = output.capacity().max(MIN_SCRATCH);
                    output.reserve(grow);
                }
            }
        }

        Ok(stream.total_out() as usize)
    }

}


#[cfg(test)]
mod tests {

    use super::{Compress, Deflate, Framing};
    use flate2::{Compression, write::{ZlibEncoder, DeflateEncoder}};
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use std::io::Write;

    fn random_bytes(n: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..n).map(|_| rng.gen::<u8>()).collect()
    }

    #[test]
    fn matches_encoder_test() {

        // the single-shot stream must agree byte for byte with flate2's writers
        let text = "the quick brown fox jumps over the lazy dog, again and again and again".repeat(20);

        let mut enc = ZlibEncoder::new(Vec::new(), Compression::best());
        enc.write_all(text.as_bytes()).unwrap();
        let zlib_len = enc.finish().unwrap().len();
        assert_eq!(Deflate::default().compressed_size(text.as_bytes()).unwrap(), zlib_len);

        let mut enc = DeflateEncoder::new(Vec::new(), Compression::new(6));
        enc.write_all(text.as_bytes()).unwrap();
        let raw_len = enc.finish().unwrap().len();
        let raw = Deflate::new(Framing::Raw, 6).unwrap();
        assert_eq!(raw.compressed_size(text.as_bytes()).unwrap(), raw_len);
    }

    #[test]
    fn deterministic_test() {
        let compressor = Deflate::default();
        let data = random_bytes(4096);
        let first = compressor.compressed_size(&data).unwrap();
        let second = compressor.compressed_size(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_test() {
        // only framing overhead is left
        let zlib = Deflate::default().compressed_size(b"").unwrap();
        let raw = Deflate::new(Framing::Raw, 9).unwrap().compressed_size(b"").unwrap();
        assert!(zlib > 0);
        assert!(raw > 0);
        assert!(zlib > raw);
    }

    #[test]
    fn incompressible_expands_test() {
        // random data is stored, not shrunk, the output is slightly larger than the input
        let data = random_bytes(10_000);
        let size = Deflate::default().compressed_size(&data).unwrap();
        assert!(size > data.len(), "expected expansion, got {} for {}", size, data.len());
    }

    #[test]
    fn repetitive_compresses_test() {
        let data = "a".repeat(10_000);
        let size = Deflate::default().compressed_size(data.as_bytes()).unwrap();
        assert!(size < 100, "got {}", size);
    }

    #[test]
    fn level_validation_test() {
        assert!(Deflate::new(Framing::Zlib, 10).is_err());
        assert_eq!(Deflate::new(Framing::Zlib, 0).unwrap().level(), 0);
        assert_eq!(Deflate::default().level(), 9);
    }

    #[test]
    fn framing_parse_test() {
        assert_eq!("zlib".parse::<Framing>().unwrap(), Framing::Zlib);
        assert_eq!("Deflate".parse::<Framing>().unwrap(), Framing::Raw);
        assert_eq!("raw".parse::<Framing>().unwrap().to_string(), "raw");
        assert!("gzip".parse::<Framing>().is_err());
    }

}
