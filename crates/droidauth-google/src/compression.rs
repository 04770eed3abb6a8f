//! gzip helpers.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

/// gzip-compress `data`.
pub fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompress a gzip stream.
pub fn gunzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data).read_to_end(&mut out)?;
    Ok(out)
}

/// True if a `Content-Encoding` header value names gzip.
pub fn is_gzip_encoding(value: &str) -> bool {
    value
        .split(',')
        .any(|part| part.trim().eq_ignore_ascii_case("gzip"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_gunzip() {
        let data = b"<html>hello</html>".repeat(20);
        let packed = gzip(&data).unwrap();
        assert_eq!(&packed[..2], &[0x1f, 0x8b]);
        assert_eq!(gunzip(&packed).unwrap(), data);
    }

    #[test]
    fn test_gunzip_rejects_garbage() {
        assert!(gunzip(b"not gzip").is_err());
    }

    #[test]
    fn test_is_gzip_encoding() {
        assert!(is_gzip_encoding("gzip"));
        assert!(is_gzip_encoding("GZIP"));
        assert!(!is_gzip_encoding("br"));
        assert!(!is_gzip_encoding("identity"));
    }
}
