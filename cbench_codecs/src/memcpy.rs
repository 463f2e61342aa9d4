use cbench_core::codec::{Codec, CodecContext, CodecParams};

/// No-op codec: copies bytes verbatim.
///
/// Useful for:
/// - Measuring the harness's own overhead (the copy is the floor every real
///   codec has to beat).
/// - Checking the round-trip and reporting paths independently of any codec.
pub struct MemcpyCodec;

impl Codec for MemcpyCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        copy(input, output)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        copy(input, output)
    }
}

fn copy(input: &[u8], output: &mut [u8]) -> anyhow::Result<usize> {
    let capacity = output.len();
    let dst = output.get_mut(..input.len()).ok_or_else(|| {
        anyhow::anyhow!(
            "memcpy: {} input bytes do not fit a {capacity}-byte buffer",
            input.len()
        )
    })?;
    dst.copy_from_slice(input);
    Ok(input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_and_rejects_short_output() {
        let params = CodecParams::default();
        let mut out = [0u8; 8];
        assert_eq!(MemcpyCodec.compress(b"abc", &mut out, params, None).unwrap(), 3);
        assert_eq!(&out[..3], b"abc");

        let mut short = [0u8; 2];
        let err = MemcpyCodec.decompress(b"abc", &mut short, params, None).unwrap_err();
        assert!(err.to_string().contains("2-byte buffer"));
    }
}
