//! Bundled codec catalog for cbench.
//!
//! [`default_registry`] is what the CLI benchmarks against; tests and
//! embedders can build their own [`Registry`] from the individual codecs.

mod brotli_codec;
mod bzip2_codec;
mod delta_codec;
mod flate_codec;
mod io;
mod lz4_codec;
mod memcpy;
mod snappy_codec;
mod xz_codec;
mod zstd_codec;

pub use brotli_codec::BrotliCodec;
pub use bzip2_codec::Bzip2Codec;
pub use delta_codec::{DeltaCodec, DeltaQueryCodec, DELTA_QUERY_MAX_BLOCK};
pub use flate_codec::{FlateCodec, DEFLATE, GZIP, ZLIB};
pub use lz4_codec::{Lz4Codec, LZ4_MAX_INPUT_SIZE};
pub use memcpy::MemcpyCodec;
pub use snappy_codec::{snappy_bound, SnappyCodec};
pub use xz_codec::XzCodec;
pub use zstd_codec::ZstdCodec;

use std::sync::Arc;

use cbench_core::{CodecDescriptor, Registry};

/// Alias used when no encoder list is given.
pub const DEFAULT_ALIAS: &str = "fast";

/// Every bundled codec plus the stock aliases.
pub fn default_registry() -> Registry {
    let mut reg = Registry::new();
    register_codecs(&mut reg);
    register_aliases(&mut reg);
    reg
}

fn register_codecs(reg: &mut Registry) {
    let memcpy = Arc::new(MemcpyCodec);
    let zstd = Arc::new(ZstdCodec);
    let flate = Arc::new(FlateCodec);
    let brotli = Arc::new(BrotliCodec);

    reg.register(CodecDescriptor::new("memcpy", "", (0, 0), memcpy.clone()))
        .register(CodecDescriptor::new("materialized", "", (0, 0), memcpy))
        .register(CodecDescriptor::new("zstd", "1.5", (1, 22), zstd.clone()))
        .register(CodecDescriptor::new("zstd22", "1.5", (1, 22), zstd.clone()).with_param(22))
        .register(CodecDescriptor::new("zstd24", "1.5", (1, 22), zstd).with_param(24))
        .register(
            CodecDescriptor::new("lz4", "0.11", (0, 0), Arc::new(Lz4Codec))
                .with_max_block_size(LZ4_MAX_INPUT_SIZE),
        )
        .register(CodecDescriptor::new("zlib", "1.0", (1, 9), flate.clone()).with_param(ZLIB))
        .register(CodecDescriptor::new("gzip", "1.0", (1, 9), flate.clone()).with_param(GZIP))
        .register(CodecDescriptor::new("deflate", "1.0", (1, 9), flate).with_param(DEFLATE))
        .register(
            CodecDescriptor::new("snappy", "1.1", (0, 0), Arc::new(SnappyCodec))
                .with_bound(snappy_bound),
        )
        .register(CodecDescriptor::new("brotli", "3.4", (0, 11), brotli.clone()))
        .register(CodecDescriptor::new("brotli22", "3.4", (0, 11), brotli.clone()).with_param(22))
        .register(CodecDescriptor::new("brotli24", "3.4", (0, 11), brotli).with_param(24))
        .register(CodecDescriptor::new("bzip2", "1.0", (1, 9), Arc::new(Bzip2Codec)))
        .register(CodecDescriptor::new("xz", "5.2", (0, 9), Arc::new(XzCodec)))
        .register(CodecDescriptor::new("delta", "", (1, 8), Arc::new(DeltaCodec)))
        .register(
            CodecDescriptor::new("deltaQuery", "", (1, 8), Arc::new(DeltaQueryCodec))
                .with_max_block_size(DELTA_QUERY_MAX_BLOCK)
                .query_only(),
        );
}

fn register_aliases(reg: &mut Registry) {
    reg.register_alias(
        "fast",
        "lz4/snappy/zstd,1,2,3,4,5/deflate,1/brotli,0,1,2",
    )
    .register_alias(
        "all",
        "memcpy/brotli,0,2,5,8,11/bzip2,1,5,9/deflate,1,6,9/gzip,1,6,9/lz4/snappy/\
         xz,0,3,6,9/zlib,1,6,9/zstd,1,2,5,8,11,15,18,22/delta,1,2,4,8",
    )
    .register_alias(
        "opt",
        "brotli,6,7,8,9,10,11/bzip2,9/xz,1,2,3,4,5,6,7,8,9/zstd,18,19,20,21,22",
    )
    .register_alias("flate", "deflate/gzip/zlib")
    // Shadows the zstd codec at top level; inside this expansion `zstd`
    // still names the codec.
    .register_alias("zstd", "zstd,1,3,5,9,15,19,22")
    .register_alias("brotli", "brotli,0,5,9,11")
    .register_alias("window", "brotli22,11/brotli24,11/zstd22,19/zstd24,19");
}
