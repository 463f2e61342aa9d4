use brotli::enc::BrotliEncoderParams;

use cbench_core::codec::{Codec, CodecContext, CodecParams};

use crate::io::{read_into, write_into};

/// Window log used when `param2` does not pin one.
pub const DEFAULT_LGWIN: i32 = 22;

const BUFFER_SIZE: usize = 4096;

/// Brotli via the pure-Rust `brotli` crate, quality 0..11.
///
/// `param2` is the window log (10..24); `brotli22` and `brotli24` register
/// the same codec with the window pinned.
pub struct BrotliCodec;

fn encoder_params(params: CodecParams, size_hint: usize) -> BrotliEncoderParams {
    BrotliEncoderParams {
        quality: params.level,
        lgwin: if params.param2 > 0 {
            params.param2
        } else {
            DEFAULT_LGWIN
        },
        size_hint,
        ..Default::default()
    }
}

impl Codec for BrotliCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let enc = encoder_params(params, input.len());
        write_into(output, |w| {
            brotli::BrotliCompress(&mut &input[..], w, &enc).map(|_| ())
        })
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        read_into(brotli::Decompressor::new(input, BUFFER_SIZE), output)
    }
}
