//! # Codec Primitives
//!
//! A bounded big-endian reader and length-prefixed writers shared by every
//! request and response variant. Every read checks the remaining input first,
//! so a hostile length prefix fails before anything is allocated.

use bytes::{Buf, BufMut};

use super::errors::WireError;

/// Cursor over an input buffer that never reads past the end.
pub struct WireReader<'a> {
    buf: &'a [u8],
    total: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading `data` from the beginning.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            buf: data,
            total: data.len(),
        }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn ensure(&self, n: usize, field: &'static str) -> Result<(), WireError> {
        if self.buf.remaining() < n {
            return Err(WireError::Truncated { field });
        }
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, WireError> {
        self.ensure(1, field)?;
        Ok(self.buf.get_u8())
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self, field: &'static str) -> Result<u16, WireError> {
        self.ensure(2, field)?;
        Ok(self.buf.get_u16())
    }

    /// Read a big-endian `u32`.
    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, WireError> {
        self.ensure(4, field)?;
        Ok(self.buf.get_u32())
    }

    /// Read a big-endian `u64`.
    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, WireError> {
        self.ensure(8, field)?;
        Ok(self.buf.get_u64())
    }

    /// Read a big-endian `i64`.
    pub fn read_i64(&mut self, field: &'static str) -> Result<i64, WireError> {
        self.ensure(8, field)?;
        Ok(self.buf.get_i64())
    }

    /// Read a strict boolean (0 or 1).
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool, WireError> {
        match self.read_u8(field)? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::InvalidBool { field, value }),
        }
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N], WireError> {
        self.ensure(N, field)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize, field: &'static str) -> Result<Vec<u8>, WireError> {
        self.ensure(len, field)?;
        let (head, tail) = self.buf.split_at(len);
        let out = head.to_vec();
        self.buf = tail;
        Ok(out)
    }

    /// Read a `u32` length prefix followed by that many bytes.
    ///
    /// `max` caps the declared length before the body is read.
    pub fn read_len_prefixed(
        &mut self,
        max: Option<usize>,
        field: &'static str,
    ) -> Result<Vec<u8>, WireError> {
        let len = self.read_u32(field)? as usize;
        if let Some(max) = max {
            if len > max {
                return Err(WireError::LengthExceeded {
                    field,
                    len: len as u64,
                    max: max as u64,
                });
            }
        }
        self.read_bytes(len, field)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self, max: usize, field: &'static str) -> Result<String, WireError> {
        let raw = self.read_len_prefixed(Some(max), field)?;
        String::from_utf8(raw).map_err(|_| WireError::InvalidUtf8 { field })
    }

    /// Fail if any input is left over.
    pub fn finish(&self) -> Result<(), WireError> {
        if self.buf.has_remaining() {
            return Err(WireError::ExcessBytes);
        }
        Ok(())
    }
}

/// Append a `u32` length prefix followed by `data`.
pub fn put_len_prefixed(buf: &mut Vec<u8>, data: &[u8], field: &'static str) -> Result<(), WireError> {
    let len = u32::try_from(data.len()).map_err(|_| WireError::TooLong(field))?;
    buf.put_u32(len);
    buf.put_slice(data);
    Ok(())
}

/// Append a one-byte element count.
pub fn put_count(buf: &mut Vec<u8>, count: usize, field: &'static str) -> Result<(), WireError> {
    let count = u8::try_from(count).map_err(|_| WireError::TooLong(field))?;
    buf.put_u8(count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_big_endian() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03];
        let mut r = WireReader::new(&data);
        assert_eq!(r.read_u8("a").unwrap(), 1);
        assert_eq!(r.read_u16("b").unwrap(), 2);
        assert_eq!(r.read_u32("c").unwrap(), 3);
        assert_eq!(r.position(), 7);
        assert!(r.finish().is_ok());
    }

    #[test]
    fn test_truncated_read_names_field() {
        let mut r = WireReader::new(&[0x00]);
        assert_eq!(
            r.read_u32("nonce"),
            Err(WireError::Truncated { field: "nonce" })
        );
    }

    #[test]
    fn test_hostile_length_prefix_fails_before_allocating() {
        // Declares 4 GiB with 2 bytes of body.
        let data = [0xff, 0xff, 0xff, 0xff, 0xaa, 0xbb];
        let mut r = WireReader::new(&data);
        assert_eq!(
            r.read_len_prefixed(None, "result"),
            Err(WireError::Truncated { field: "result" })
        );
    }

    #[test]
    fn test_length_cap_enforced() {
        let mut buf = Vec::new();
        put_len_prefixed(&mut buf, &[0u8; 10], "block id").unwrap();
        let mut r = WireReader::new(&buf);
        assert!(matches!(
            r.read_len_prefixed(Some(8), "block id"),
            Err(WireError::LengthExceeded { len: 10, max: 8, .. })
        ));
    }

    #[test]
    fn test_strict_bool() {
        let mut r = WireReader::new(&[0, 1, 2]);
        assert!(!r.read_bool("flag").unwrap());
        assert!(r.read_bool("flag").unwrap());
        assert_eq!(
            r.read_bool("flag"),
            Err(WireError::InvalidBool { field: "flag", value: 2 })
        );
    }

    #[test]
    fn test_excess_bytes() {
        let r = WireReader::new(&[0]);
        assert_eq!(r.finish(), Err(WireError::ExcessBytes));
    }
}
