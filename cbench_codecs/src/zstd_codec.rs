use zstd::bulk::{Compressor, Decompressor};
use zstd::zstd_safe::CParameter;

use cbench_core::codec::{Codec, CodecContext, CodecParams};

/// Zstandard codec.
///
/// `level` is the compression level (1 = fast / larger, 22 = slow /
/// smallest). A non-zero `param2` pins the window log, which is how the
/// `zstd22` / `zstd24` catalog entries differ from plain `zstd`.
///
/// With a context, one compressor and one decompressor serve every chunk of
/// an invocation.
pub struct ZstdCodec;

struct ZstdContext {
    compressor: Compressor<'static>,
    decompressor: Decompressor<'static>,
}

fn compressor(params: CodecParams) -> anyhow::Result<Compressor<'static>> {
    let mut c = Compressor::new(params.level)?;
    if params.param2 > 0 {
        c.set_parameter(CParameter::WindowLog(params.param2 as u32))?;
    }
    Ok(c)
}

impl Codec for ZstdCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let written = match ctx.and_then(|c| c.downcast_mut::<ZstdContext>()) {
            Some(z) => z.compressor.compress_to_buffer(input, output)?,
            None => compressor(params)?.compress_to_buffer(input, output)?,
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
        // The frame header carries the content size, so no size hint is
        // needed; `output` is already at least that large.
        let written = match ctx.and_then(|c| c.downcast_mut::<ZstdContext>()) {
            Some(z) => z.decompressor.decompress_to_buffer(input, output)?,
            None => zstd::bulk::decompress_to_buffer(input, output)?,
        };
        Ok(written)
    }

    fn create_context(
        &self,
        _max_input: usize,
        params: CodecParams,
    ) -> anyhow::Result<Option<CodecContext>> {
        Ok(Some(Box::new(ZstdContext {
            compressor: compressor(params)?,
            decompressor: Decompressor::new()?,
        })))
    }
}
