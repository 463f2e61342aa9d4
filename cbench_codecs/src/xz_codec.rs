use xz2::stream::{Action, Check, Status, Stream};

use cbench_core::codec::{Codec, CodecContext, CodecParams};

/// Memory cap handed to liblzma's decoder.
const DECODER_MEMLIMIT: u64 = u64::MAX;

/// xz (LZMA2) via liblzma, presets 0..9.
///
/// Both directions run a single `process` call over the whole chunk; a
/// stream that has not ended once the output is full is an error.
pub struct XzCodec;

fn finish(stream: &mut Stream, input: &[u8], output: &mut [u8]) -> anyhow::Result<usize> {
    match stream.process(input, output, Action::Finish)? {
        Status::StreamEnd => Ok(stream.total_out() as usize),
        status => anyhow::bail!(
            "xz stream did not finish ({status:?}) within {} bytes",
            output.len()
        ),
    }
}

impl Codec for XzCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let mut stream = Stream::new_easy_encoder(params.level.clamp(0, 9) as u32, Check::Crc64)?;
        finish(&mut stream, input, output)
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let mut stream = Stream::new_stream_decoder(DECODER_MEMLIMIT, 0)?;
        finish(&mut stream, input, output)
    }
}
