use lz4_flex::block::{compress_into, decompress_into};

use cbench_core::codec::{Codec, CodecContext, CodecParams};

/// Largest input the LZ4 block format accepts in one call.
pub const LZ4_MAX_INPUT_SIZE: usize = 0x7E00_0000;

/// LZ4 block codec (raw blocks, no frame or size prefix).
///
/// Fastest decompression of all bundled codecs, typically 3-5 GB/s on
/// modern hardware. Single level; the catalog registers it with a block
/// limit of [`LZ4_MAX_INPUT_SIZE`] so oversized inputs get chunked.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let written = compress_into(input, output)
            .map_err(|e| anyhow::anyhow!("lz4 compress error: {}", e))?;
        Ok(written)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let written = decompress_into(input, output)
            .map_err(|e| anyhow::anyhow!("lz4 decompress error: {}", e))?;
        Ok(written)
    }
}
