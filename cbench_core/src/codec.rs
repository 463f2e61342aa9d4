use std::any::Any;

/// Per-invocation codec parameters.
///
/// `level` is the value being benchmarked; `param2` is the descriptor's
/// secondary parameter (window log, container format, element width...),
/// fixed per catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecParams {
    pub level: i32,
    pub param2: i32,
}

/// Opaque working memory created by [`Codec::create_context`].
///
/// Codecs downcast it back to their own state type. The driver only moves it
/// around and hands it back to [`Codec::release_context`].
pub type CodecContext = Box<dyn Any + Send>;

/// Core compression abstraction.
///
/// Each `Codec` implementation:
/// - Writes into a caller-supplied output slice and returns the number of
///   bytes written. The harness always passes a slice at least as large as
///   the descriptor's worst-case bound, so a codec never needs to grow it.
/// - Treats every call independently; no state may leak between chunks
///   except through the optional context.
/// - Signals failure through `Err`. The harness reports it and moves on.
pub trait Codec: Send + Sync {
    fn compress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize>;

    /// Inverse of [`compress`](Codec::compress). Query-only codecs may write
    /// a derived result here instead of the original bytes.
    fn decompress(
        &self,
        input: &[u8],
        output: &mut [u8],
        params: CodecParams,
        ctx: Option<&mut CodecContext>,
    ) -> anyhow::Result<usize>;

    /// Allocate working memory shared by every chunk of one invocation.
    ///
    /// `max_input` is the largest chunk the codec will see. Codecs without
    /// reusable state keep the default.
    fn create_context(
        &self,
        _max_input: usize,
        _params: CodecParams,
    ) -> anyhow::Result<Option<CodecContext>> {
        Ok(None)
    }

    fn release_context(&self, ctx: CodecContext) {
        drop(ctx);
    }
}
