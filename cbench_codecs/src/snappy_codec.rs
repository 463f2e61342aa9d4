use snap::raw::{Decoder, Encoder};

use cbench_core::codec::{Codec, CodecContext, CodecParams};

/// Snappy raw format via `snap`. Single level.
pub struct SnappyCodec;

struct SnappyContext {
    encoder: Encoder,
    decoder: Decoder,
}

/// Snappy's own worst case, which the harness compares against its
/// generic bound and keeps the larger of the two.
pub fn snappy_bound(size: usize) -> usize {
    snap::raw::max_compress_len(size)
}

impl Codec for SnappyCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let written = match ctx.and_then(|c| c.downcast_mut::<SnappyContext>()) {
            Some(s) => s.encoder.compress(input, output)?,
            None => Encoder::new().compress(input, output)?,
        };
        Ok(written)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let written = match ctx.and_then(|c| c.downcast_mut::<SnappyContext>()) {
            Some(s) => s.decoder.decompress(input, output)?,
            None => Decoder::new().decompress(input, output)?,
        };
        Ok(written)
    }

    fn create_context(
        &self,
        _max_input: usize,
        _params: CodecParams,
    ) -> anyhow::Result<Option<CodecContext>> {
        Ok(Some(Box::new(SnappyContext {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
        })))
    }
}
