//! Length prefixed records.
//!
//! A record is its byte length followed by the bytes. Lengths below 127
//! take a single signed byte, longer records write `-1` followed by the
//! length as a little endian `i64`.

use std::io::{ErrorKind, Read, Write};

use crate::error::{ColgenError, Result};

const LONG_RECORD_MARKER: i8 = -1;
const SHORT_RECORD_LIMIT: usize = 127;

pub fn write_record<W: Write>(out: &mut W, data: &[u8]) -> Result<()> {
    if data.len() < SHORT_RECORD_LIMIT {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let size = data.len() as i8;
        out.write_all(&size.to_le_bytes())?;
    } else {
        let size = i64::try_from(data.len())
            .map_err(|_| ColgenError::CorruptPool("record too large".to_string()))?;
        out.write_all(&LONG_RECORD_MARKER.to_le_bytes())?;
        out.write_all(&size.to_le_bytes())?;
    }
    out.write_all(data)?;
    Ok(())
}

/// Reads the next record. Running out of data inside a record is an error.
pub fn read_record<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    try_read_record(input)?
        .ok_or_else(|| ColgenError::CorruptPool("unexpected end of stream".to_string()))
}

/// Like [`read_record`] but returns `None` if the stream ends cleanly
/// before the length prefix.
pub fn try_read_record<R: Read>(input: &mut R) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0_u8; 1];
    match input.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let short_size = i8::from_le_bytes(prefix);
    let size = if short_size == LONG_RECORD_MARKER {
        let mut long = [0_u8; 8];
        input.read_exact(&mut long)?;
        let size = i64::from_le_bytes(long);
        usize::try_from(size)
            .map_err(|_| ColgenError::CorruptPool(format!("negative record size {size}")))?
    } else {
        usize::try_from(short_size)
            .map_err(|_| ColgenError::CorruptPool(format!("negative record size {short_size}")))?
    };

    // the size is untrusted, grow the buffer only as data arrives
    let limit = u64::try_from(size)
        .map_err(|_| ColgenError::CorruptPool(format!("record size {size}")))?;
    let mut data = Vec::new();
    input.by_ref().take(limit).read_to_end(&mut data)?;
    if data.len() != size {
        return Err(ColgenError::CorruptPool(format!(
            "record of {size} bytes ends after {} bytes",
            data.len()
        )));
    }
    log::trace!("read record of {size} bytes");
    Ok(Some(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn short_and_long_records() {
        let mut buffer = Vec::new();
        write_record(&mut buffer, b"ColumnPool").unwrap();
        let long = vec![7_u8; 300];
        write_record(&mut buffer, &long).unwrap();
        write_record(&mut buffer, &[]).unwrap();

        assert_eq!(buffer[0], 10);
        assert_eq!(buffer[11] as i8, -1);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(read_record(&mut cursor).unwrap(), b"ColumnPool");
        assert_eq!(read_record(&mut cursor).unwrap(), long);
        assert!(read_record(&mut cursor).unwrap().is_empty());
        assert!(try_read_record(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn boundary_length_uses_long_prefix() {
        let mut buffer = Vec::new();
        write_record(&mut buffer, &[1_u8; 126]).unwrap();
        assert_eq!(buffer.len(), 127);

        let mut buffer = Vec::new();
        write_record(&mut buffer, &[1_u8; 127]).unwrap();
        assert_eq!(buffer.len(), 1 + 8 + 127);
    }

    #[test]
    fn truncated_record_fails() {
        let mut buffer = Vec::new();
        write_record(&mut buffer, b"ColumnPool").unwrap();
        buffer.truncate(5);
        let mut cursor = Cursor::new(buffer);
        assert!(matches!(read_record(&mut cursor), Err(ColgenError::CorruptPool(_))));
    }

    #[test]
    fn huge_record_size_fails() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&LONG_RECORD_MARKER.to_le_bytes());
        buffer.extend_from_slice(&(1_i64 << 60).to_le_bytes());
        buffer.extend_from_slice(&[3_u8; 16]);

        let mut cursor = Cursor::new(buffer);
        assert!(matches!(read_record(&mut cursor), Err(ColgenError::CorruptPool(_))));
    }
}
