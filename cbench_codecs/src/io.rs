//! Adapters for codecs whose crates only speak `Read`/`Write`.

use std::io::{self, Cursor, Read};

use anyhow::Context;

/// Run a streaming encoder that writes straight into `output`.
///
/// Returns the number of bytes written. Running out of room surfaces as an
/// error from the encoder (`WriteZero`), never as truncated output.
pub(crate) fn write_into<F>(output: &mut [u8], encode: F) -> anyhow::Result<usize>
where
    F: FnOnce(&mut Cursor<&mut [u8]>) -> io::Result<()>,
{
    let capacity = output.len();
    let mut cursor = Cursor::new(output);
    encode(&mut cursor).with_context(|| format!("writing into a {capacity}-byte buffer"))?;
    Ok(cursor.position() as usize)
}

/// Drain `reader` into `output`, failing if the decoded stream does not fit.
pub(crate) fn read_into(mut reader: impl Read, output: &mut [u8]) -> anyhow::Result<usize> {
    let mut filled = 0;
    while filled < output.len() {
        match reader.read(&mut output[filled..]) {
            Ok(0) => return Ok(filled),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        anyhow::bail!("decoded data exceeds the {}-byte buffer", output.len());
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn write_into_counts_bytes() {
        let mut buf = [0u8; 8];
        let n = write_into(&mut buf, |w| w.write_all(b"abc")).unwrap();
        assert_eq!(n, 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn write_into_reports_overflow() {
        let mut buf = [0u8; 2];
        assert!(write_into(&mut buf, |w| w.write_all(b"abc")).is_err());
    }

    #[test]
    fn read_into_exact_and_overflow() {
        let mut buf = [0u8; 3];
        assert_eq!(read_into(&b"abc"[..], &mut buf).unwrap(), 3);
        assert_eq!(read_into(&b"ab"[..], &mut buf).unwrap(), 2);
        assert!(read_into(&b"abcd"[..], &mut buf).is_err());
    }
}
