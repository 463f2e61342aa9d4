use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::codec::{Codec, CodecContext, CodecParams};
use crate::error::{BenchError, Result};
use crate::registry::CodecDescriptor;

/// Constant slack added to every worst-case bound: 16 KB.
pub const PAD_SIZE: usize = 16 * 1024;

/// Compressed and decompressed buffers start on this boundary.
pub const ALIGN_BYTES: usize = 32;

/// Default worst-case compressed size: `size + 6*size/15 + PAD_SIZE`.
///
/// Generous enough for every bundled codec, including those that expand
/// incompressible input.
pub fn compress_bound(size: usize) -> usize {
    size + 6 * size / 15 + PAD_SIZE
}

/// Output capacity handed to `desc` for a chunk of `size` bytes.
///
/// A codec's own bound can only widen the default, never shrink it.
pub fn chunk_capacity(desc: &CodecDescriptor, size: usize) -> usize {
    compress_bound(size).max((desc.bound)(size))
}

/// Largest chunk a single compress call may see: the smaller of the
/// configured chunk size and the codec's block limit, 0 meaning unlimited.
pub fn effective_chunk_size(chunk_size: usize, max_block_size: usize) -> usize {
    match (chunk_size, max_block_size) {
        (0, 0) => 0,
        (0, m) => m,
        (c, 0) => c,
        (c, m) => c.min(m),
    }
}

/// Split `total` bytes into consecutive chunks no larger than
/// `effective_chunk_size(chunk_size, max_block_size)`.
///
/// Empty input yields one empty chunk so codecs still get exercised.
pub fn plan_chunks(total: usize, chunk_size: usize, max_block_size: usize) -> Vec<Range<usize>> {
    let limit = effective_chunk_size(chunk_size, max_block_size);
    if total == 0 {
        return vec![0..0];
    }
    if limit == 0 || limit >= total {
        return vec![0..total];
    }
    (0..total)
        .step_by(limit)
        .map(|start| start..(start + limit).min(total))
        .collect()
}

/// Zero-initialized byte buffer whose usable region starts on an
/// [`ALIGN_BYTES`] boundary.
pub struct AlignedBuf {
    storage: Vec<u8>,
    offset: usize,
    len: usize,
}

impl AlignedBuf {
    /// Allocate `len` usable bytes, reporting allocator refusal instead of
    /// aborting the process.
    pub fn try_new(len: usize) -> std::result::Result<Self, std::collections::TryReserveError> {
        let mut storage = Vec::new();
        storage.try_reserve_exact(len + ALIGN_BYTES)?;
        storage.resize(len + ALIGN_BYTES, 0);
        let offset = match storage.as_ptr().align_offset(ALIGN_BYTES) {
            off if off < ALIGN_BYTES => off,
            _ => 0,
        };
        Ok(Self {
            storage,
            offset,
            len,
        })
    }

    /// Copy `data` into a fresh aligned block followed by [`PAD_SIZE`]
    /// zeroed bytes. The usable region is exactly `data`.
    pub fn try_padded_copy(
        data: &[u8],
    ) -> std::result::Result<Self, std::collections::TryReserveError> {
        let mut buf = Self::try_new(data.len() + PAD_SIZE)?;
        buf.as_mut_slice()[..data.len()].copy_from_slice(data);
        buf.len = data.len();
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.offset..self.offset + self.len]
    }
}

/// Where one chunk lives in the input and in the output buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSlot {
    /// Byte range in the input.
    pub input: Range<usize>,
    /// Region reserved for this chunk in the compressed and decompressed
    /// buffers; its length is the chunk's worst-case bound.
    pub region: Range<usize>,
}

impl ChunkSlot {
    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}

/// Chunk layout for one input under one codec.
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub slots: Vec<ChunkSlot>,
    /// Sum of all region lengths; size of each output buffer.
    pub capacity: usize,
}

impl ChunkLayout {
    pub fn new(desc: &CodecDescriptor, input_len: usize, chunk_size: usize) -> Self {
        let mut capacity = 0;
        let slots = plan_chunks(input_len, chunk_size, desc.max_block_size)
            .into_iter()
            .map(|input| {
                let cap = chunk_capacity(desc, input.len());
                let region = capacity..capacity + cap;
                capacity += cap;
                ChunkSlot { input, region }
            })
            .collect();
        Self { slots, capacity }
    }

    pub fn largest_chunk(&self) -> usize {
        self.slots.iter().map(ChunkSlot::len).max().unwrap_or(0)
    }
}

/// Private output buffers for one (invocation, input) pair.
pub struct BufferSet {
    pub layout: ChunkLayout,
    pub compressed: AlignedBuf,
    pub decompressed: AlignedBuf,
    /// Bytes actually written per chunk by the last compress pass.
    pub compressed_sizes: Vec<usize>,
    /// Bytes actually written per chunk by the last decompress pass.
    pub decompressed_sizes: Vec<usize>,
}

impl BufferSet {
    /// Bytes that [`allocate`](Self::allocate) will request for `layout`.
    pub fn required(layout: &ChunkLayout, compress_only: bool) -> usize {
        if compress_only {
            layout.capacity
        } else {
            layout.capacity * 2
        }
    }

    /// Allocate buffers for `layout`, honoring `mem_limit` (0 = unlimited).
    ///
    /// `label` and `file` only feed the error message.
    pub fn allocate(
        layout: ChunkLayout,
        mem_limit: usize,
        compress_only: bool,
        label: &str,
        file: &str,
    ) -> Result<Self> {
        let required = Self::required(&layout, compress_only);
        if mem_limit != 0 && required > mem_limit {
            return Err(BenchError::MemoryLimit {
                label: label.to_string(),
                file: file.to_string(),
                required,
                limit: mem_limit,
            });
        }
        let alloc = |len: usize| {
            AlignedBuf::try_new(len).map_err(|_| BenchError::Allocation {
                label: label.to_string(),
                requested: len,
            })
        };
        let compressed = alloc(layout.capacity)?;
        let decompressed = alloc(if compress_only { 0 } else { layout.capacity })?;
        debug!(
            chunks = layout.slots.len(),
            capacity = layout.capacity,
            "allocated buffers for {label} on {file}"
        );
        let chunks = layout.slots.len();
        Ok(Self {
            layout,
            compressed,
            decompressed,
            compressed_sizes: vec![0; chunks],
            decompressed_sizes: vec![0; chunks],
        })
    }

    pub fn total_compressed(&self) -> usize {
        self.compressed_sizes.iter().sum()
    }
}

/// Codec working memory scoped to one invocation.
///
/// The context goes back to the codec when the guard drops, so every exit
/// path of the driver (including early `?` returns) releases it.
pub struct WorkMem {
    codec: Arc<dyn Codec>,
    ctx: Option<CodecContext>,
}

impl WorkMem {
    pub fn acquire(codec: Arc<dyn Codec>, max_input: usize, params: CodecParams) -> anyhow::Result<Self> {
        let ctx = codec.create_context(max_input, params)?;
        Ok(Self { codec, ctx })
    }

    pub fn context(&mut self) -> Option<&mut CodecContext> {
        self.ctx.as_mut()
    }
}

impl Drop for WorkMem {
    fn drop(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.codec.release_context(ctx);
        }
    }
}
