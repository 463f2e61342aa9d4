use std::io::Write;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use cbench_core::codec::{Codec, CodecContext, CodecParams};

use crate::io::{read_into, write_into};

/// Container selected through `param2`.
pub const ZLIB: i32 = 0;
pub const GZIP: i32 = 1;
pub const DEFLATE: i32 = 2;

/// DEFLATE family via `flate2` (levels 1..9).
///
/// `param2` selects the container: [`ZLIB`], [`GZIP`] or raw [`DEFLATE`].
/// The zlib and raw variants keep a reusable stream pair in the context and
/// reset it per call; gzip goes through the streaming encoder each time.
pub struct FlateCodec;

struct FlateContext {
    compress: Compress,
    decompress: Decompress,
}

fn zlib_header(params: CodecParams) -> bool {
    params.param2 == ZLIB
}

fn level(params: CodecParams) -> Compression {
    Compression::new(params.level.clamp(0, 9) as u32)
}

fn deflate_into(stream: &mut Compress, input: &[u8], output: &mut [u8]) -> anyhow::Result<usize> {
    stream.reset();
    match stream.compress(input, output, FlushCompress::Finish)? {
        Status::StreamEnd => Ok(stream.total_out() as usize),
        status => anyhow::bail!(
            "deflate stream did not finish ({status:?}) within {} bytes",
            output.len()
        ),
    }
}

fn inflate_into(
    stream: &mut Decompress,
    header: bool,
    input: &[u8],
    output: &mut [u8],
) -> anyhow::Result<usize> {
    stream.reset(header);
    match stream.decompress(input, output, FlushDecompress::Finish)? {
        Status::StreamEnd => Ok(stream.total_out() as usize),
        status => anyhow::bail!(
            "inflate stream did not finish ({status:?}) within {} bytes",
            output.len()
        ),
    }
}

impl Codec for FlateCodec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        if params.param2 == GZIP {
            return write_into(output, |w| {
                let mut enc = GzEncoder::new(w, level(params));
                enc.write_all(input)?;
                enc.finish().map(|_| ())
            });
        }
        match ctx.and_then(|c| c.downcast_mut::<FlateContext>()) {
            Some(f) => deflate_into(&mut f.compress, input, output),
            None => deflate_into(
                &mut Compress::new(level(params), zlib_header(params)),
                input,
                output,
            ),
        }
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        if params.param2 == GZIP {
            return read_into(GzDecoder::new(input), output);
        }
        let header = zlib_header(params);
        match ctx.and_then(|c| c.downcast_mut::<FlateContext>()) {
            Some(f) => inflate_into(&mut f.decompress, header, input, output),
            None => inflate_into(&mut Decompress::new(header), header, input, output),
        }
    }

    fn create_context(
        &self,
        _max_input: usize,
        params: CodecParams,
    ) -> anyhow::Result<Option<CodecContext>> {
        if params.param2 == GZIP {
            return Ok(None);
        }
        Ok(Some(Box::new(FlateContext {
            compress: Compress::new(level(params), zlib_header(params)),
            decompress: Decompress::new(zlib_header(params)),
        })))
    }
}
