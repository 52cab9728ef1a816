use crate::error::DecodeError;

type Result<T> = std::result::Result<T, InvalidIndexError>;

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidIndexError;

/// Cursor-style reads over a byte slice. Each successful read consumes the
/// bytes from the front.
pub trait BufferReader<'a> {
    fn read<const N: usize>(&mut self) -> Result<[u8; N]>;
    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]>;
    fn pop_front(&mut self) -> Result<u8>;

    fn read_u32_le(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read()?))
    }
    fn read_u64_le(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read()?))
    }
    fn read_i16_le(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read()?))
    }
    fn read_f32_le(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read()?))
    }
}

impl<'a> BufferReader<'a> for &'a [u8] {
    fn read<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (head, tail) = self.split_first_chunk::<N>().ok_or(InvalidIndexError)?;
        *self = tail;
        Ok(*head)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.len() < len {
            return Err(InvalidIndexError);
        }
        let (head, tail) = self.split_at(len);
        *self = tail;
        Ok(head)
    }

    fn pop_front(&mut self) -> Result<u8> {
        let (first, tail) = self.split_first().ok_or(InvalidIndexError)?;
        *self = tail;
        Ok(*first)
    }
}

impl From<InvalidIndexError> for DecodeError {
    fn from(_: InvalidIndexError) -> Self {
        Self::InvalidIndex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_extracts_from_front() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut buf = &data[..];
        let result: [u8; 2] = buf.read().unwrap();
        assert_eq!(result, [0x01, 0x02]);
        assert_eq!(buf, &[0x03, 0x04]);
    }

    #[test]
    fn read_insufficient_data_errors() {
        let data = [0x01];
        let mut buf = &data[..];
        let result: Result<[u8; 4]> = buf.read();
        assert!(result.is_err());
        assert_eq!(buf, &[0x01]);
    }

    #[test]
    fn read_slice_borrows_from_source() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut buf = &data[..];
        assert_eq!(buf.read_slice(2).unwrap(), &[0xAA, 0xBB]);
        assert!(buf.read_slice(2).is_err());
        assert_eq!(buf, &[0xCC]);
    }

    #[test]
    fn pop_front_empty_errors() {
        let mut buf: &[u8] = &[];
        assert!(buf.pop_front().is_err());
    }

    #[test]
    fn read_u32_le_parses_correctly() {
        let data = [0x04, 0x03, 0x02, 0x01, 0xFF];
        let mut buf = &data[..];
        assert_eq!(buf.read_u32_le().unwrap(), 0x01020304);
        assert_eq!(buf, &[0xFF]);
    }

    #[test]
    fn read_i16_le_is_twos_complement() {
        let data = [0xFE, 0xFF, 0x00, 0x80];
        let mut buf = &data[..];
        assert_eq!(buf.read_i16_le().unwrap(), -2);
        assert_eq!(buf.read_i16_le().unwrap(), i16::MIN);
    }
}
