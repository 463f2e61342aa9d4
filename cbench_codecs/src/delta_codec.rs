use cbench_core::codec::{Codec, CodecContext, CodecParams};
use cbench_core::preprocess::{delta_decode_into, delta_decode_sum, delta_encode_into};

/// Largest chunk the query variant is registered with.
pub const DELTA_QUERY_MAX_BLOCK: usize = 80 << 10;

/// Size-preserving delta transform; the level is the element width in bytes.
///
/// Measures the cost of the transform itself. The output is exactly as
/// large as the input.
pub struct DeltaCodec;

/// Query form of [`DeltaCodec`]: decompression decodes each chunk straight
/// into the wrapping sum of its elements (8 bytes, little-endian) instead
/// of restoring the bytes. Registered query-only.
pub struct DeltaQueryCodec;

fn width(params: CodecParams) -> usize {
    params.level.clamp(1, 8) as usize
}

fn encode(input: &[u8], output: &mut [u8], params: CodecParams) -> anyhow::Result<usize> {
    let capacity = output.len();
    let dst = output.get_mut(..input.len()).ok_or_else(|| {
        anyhow::anyhow!(
            "delta: {} input bytes do not fit a {capacity}-byte buffer",
            input.len()
        )
    })?;
    delta_encode_into(input, dst, width(params));
    Ok(input.len())
}

impl Codec for DeltaCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        encode(input, output, params)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let capacity = output.len();
        let dst = output.get_mut(..input.len()).ok_or_else(|| {
            anyhow::anyhow!(
                "delta: {} encoded bytes do not fit a {capacity}-byte buffer",
                input.len()
            )
        })?;
        delta_decode_into(input, dst, width(params));
        Ok(input.len())
    }
}

impl Codec for DeltaQueryCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        encode(input, output, params)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let sum = delta_decode_sum(input, width(params)).to_le_bytes();
        let dst = output
            .get_mut(..sum.len())
            .ok_or_else(|| anyhow::anyhow!("deltaQuery: output buffer smaller than 8 bytes"))?;
        dst.copy_from_slice(&sum);
        Ok(sum.len())
    }
}
