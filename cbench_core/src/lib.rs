pub mod alias;
pub mod bench;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod preprocess;
pub mod registry;
pub mod report;
pub mod results;
pub mod timing;
pub mod verify;

pub use alias::{resolve, InvocationSpec, Resolution};
pub use bench::{run_benchmark, Bencher, InputFile};
pub use buffer::{compress_bound, PAD_SIZE};
pub use codec::{Codec, CodecContext, CodecParams};
pub use config::BenchConfig;
pub use error::{BenchError, ErrorCategory};
pub use preprocess::Preprocessor;
pub use registry::{AliasDescriptor, CodecDescriptor, Registry};
pub use report::{render, OutputFormat};
pub use results::{ResultRow, ResultTable, SortKey};
pub use timing::{TimeStat, TrialPolicy};
