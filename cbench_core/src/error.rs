use thiserror::Error;

/// Everything that can go wrong while resolving or running a benchmark.
///
/// None of these abort a run on their own. Configuration errors skip the
/// offending encoder-list entry; the rest abort only the current invocation
/// and are recorded in the result table's failure list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BenchError {
    #[error("unrecognized codec '{0}'")]
    UnknownCodec(String),

    #[error("level {level} is outside the range {first}..={last} of codec '{codec}'")]
    LevelOutOfRange {
        codec: String,
        level: i64,
        first: i32,
        last: i32,
    },

    #[error("malformed encoder entry '{entry}': {reason}")]
    MalformedSpec { entry: String, reason: String },

    #[error("alias '{0}' expands to itself")]
    AliasCycle(String),

    #[error("{label} on {file}: needs {required} bytes of buffers but the memory limit is {limit}")]
    MemoryLimit {
        label: String,
        file: String,
        required: usize,
        limit: usize,
    },

    #[error("{label}: failed to allocate {requested} bytes")]
    Allocation { label: String, requested: usize },

    #[error("{label} failed to {stage} {file}: {message}")]
    CodecFailure {
        label: String,
        file: String,
        stage: Stage,
        message: String,
    },

    #[error("{label} on {file}: decompressed output differs from the input at byte {offset} (xxh3 {expected:016x} vs {actual:016x})")]
    VerificationMismatch {
        label: String,
        file: String,
        offset: usize,
        expected: u64,
        actual: u64,
    },

    #[error("worker pool: {0}")]
    ThreadPool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which half of an invocation a codec failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Compress,
    Decompress,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::Init => "initialize for",
            Stage::Compress => "compress",
            Stage::Decompress => "decompress",
        })
    }
}

/// Coarse classification used by the reporter's failure section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Resource,
    Codec,
    Verification,
    Other,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorCategory::Config => "config",
            ErrorCategory::Resource => "resource",
            ErrorCategory::Codec => "codec",
            ErrorCategory::Verification => "verify",
            ErrorCategory::Other => "other",
        })
    }
}

impl BenchError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BenchError::UnknownCodec(_)
            | BenchError::LevelOutOfRange { .. }
            | BenchError::MalformedSpec { .. }
            | BenchError::AliasCycle(_) => ErrorCategory::Config,
            BenchError::MemoryLimit { .. } | BenchError::Allocation { .. } => {
                ErrorCategory::Resource
            }
            BenchError::CodecFailure { .. } => ErrorCategory::Codec,
            BenchError::VerificationMismatch { .. } => ErrorCategory::Verification,
            BenchError::ThreadPool(_) | BenchError::Io(_) => ErrorCategory::Other,
        }
    }

    pub fn is_config(&self) -> bool {
        self.category() == ErrorCategory::Config
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
