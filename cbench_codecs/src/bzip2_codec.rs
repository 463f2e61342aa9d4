use std::io::Write;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;

use cbench_core::codec::{Codec, CodecContext, CodecParams};

use crate::io::{read_into, write_into};

/// bzip2 via libbz2; level is the block size in 100 kB units (1..9).
pub struct Bzip2Codec;

impl Codec for Bzip2Codec {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        let level = Compression::new(params.level.clamp(1, 9) as u32);
        write_into(output, |w| {
            let mut enc = BzEncoder::new(w, level);
            enc.write_all(input)?;
            enc.finish().map(|_| ())
        })
    }

    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        _params: CodecParams,
        _ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize> {
        read_into(BzDecoder::new(input), output)
    }
}
