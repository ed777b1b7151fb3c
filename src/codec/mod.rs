//! Payload decompression.
//!
//! The session treats decompression as a pure function from the raw frame
//! payload to text. [`Gzip`] is what gzip-framed market feeds need;
//! [`Identity`] covers feeds that send plain text.

mod gzip;

pub use gzip::{Gzip, gzip_compress};

use crate::error::Result;

/// Turns a raw inbound payload into text.
pub trait Decompress: Send + Sync {
    /// Decompress `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`](crate::Error::Decode) on malformed input or
    /// output that is not UTF-8.
    fn decompress(&self, data: &[u8]) -> Result<String>;
}

/// Passes payloads through unchanged, only checking UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Decompress for Identity {
    fn decompress(&self, data: &[u8]) -> Result<String> {
        Ok(std::str::from_utf8(data)?.to_owned())
    }
}

impl<F> Decompress for F
where
    F: Fn(&[u8]) -> Result<String> + Send + Sync,
{
    fn decompress(&self, data: &[u8]) -> Result<String> {
        self(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_identity_passthrough() {
        assert_eq!(Identity.decompress(b"{\"ping\": 1}").unwrap(), "{\"ping\": 1}");
    }

    #[test]
    fn test_identity_rejects_invalid_utf8() {
        assert!(matches!(
            Identity.decompress(&[0xc3, 0x28]),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_closure_decompressor() {
        let upper = |data: &[u8]| -> Result<String> {
            Ok(String::from_utf8_lossy(data).to_uppercase())
        };
        assert_eq!(upper.decompress(b"tick").unwrap(), "TICK");
    }
}
