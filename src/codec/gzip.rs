//! Gzip payload codec.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::codec::Decompress;
use crate::config::Limits;
use crate::error::{Error, Result};

/// Gzip decompressor for inbound frames.
///
/// Concatenated gzip members are decoded back to back, the way `gzip -d`
/// treats them. Output is capped at `max_output` bytes so a small frame
/// cannot inflate without bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gzip {
    max_output: usize,
}

impl Gzip {
    /// Create a decoder that rejects payloads inflating past `max_output`
    /// bytes.
    #[must_use]
    pub const fn with_max_output(max_output: usize) -> Self {
        Self { max_output }
    }

    /// Largest decompressed payload accepted, in bytes.
    #[must_use]
    pub const fn max_output(&self) -> usize {
        self.max_output
    }
}

impl Default for Gzip {
    /// Capped at the default maximum message size.
    fn default() -> Self {
        Self::with_max_output(Limits::default().max_message_size)
    }
}

impl Decompress for Gzip {
    fn decompress(&self, data: &[u8]) -> Result<String> {
        if data.is_empty() {
            return Err(Error::Decode("empty payload".into()));
        }

        // One byte past the cap is enough to tell an oversized payload apart.
        let bound = (self.max_output as u64).saturating_add(1);
        let mut decoder = MultiGzDecoder::new(data).take(bound);
        let capacity = data.len().saturating_mul(4).min(self.max_output);
        let mut decompressed = Vec::with_capacity(capacity);
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| Error::Decode(format!("gzip: {e}")))?;

        if decompressed.len() > self.max_output {
            return Err(Error::Decode(format!(
                "decompressed payload exceeds {} bytes",
                self.max_output
            )));
        }

        String::from_utf8(decompressed)
            .map_err(|e| Error::Decode(format!("payload is not valid UTF-8: {e}")))
    }
}

/// Gzip-compress `data` at the default level.
///
/// The inverse of [`Gzip`]; servers and tests use it to produce frames.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the encoder fails, which only happens on
/// allocation failure.
pub fn gzip_compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::Decode(format!("gzip: {e}")))?;
    encoder
        .finish()
        .map_err(|e| Error::Decode(format!("gzip: {e}")))
}
