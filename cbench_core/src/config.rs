use std::time::Duration;

use crate::preprocess::Preprocessor;
use crate::report::OutputFormat;
use crate::results::SortKey;
use crate::timing::{TimeStat, TrialPolicy};

pub const KB: usize = 1 << 10;
pub const MB: usize = 1 << 20;

/// Run-wide benchmark parameters.
///
/// Built by the caller and passed by reference; the driver never mutates it.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Bytes per independently compressed chunk; 0 compresses each input
    /// in one call (subject to each codec's block limit).
    pub chunk_size: usize,
    pub compress: TrialPolicy,
    pub decompress: TrialPolicy,
    /// Give up on an invocation after one compression trial slower than
    /// this many bytes per second. 0 disables the check.
    pub speed_threshold: u64,
    /// Cap on the output buffers of one invocation, in bytes; 0 = unlimited.
    pub mem_limit: usize,
    pub threads: usize,
    pub time_stat: TimeStat,
    pub format: OutputFormat,
    /// `None` keeps completion order.
    pub sort: Option<SortKey>,
    pub verify: bool,
    /// Skip decompression (and therefore verification) entirely.
    pub compress_only: bool,
    pub preprocessors: Vec<Preprocessor>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            chunk_size: 0,
            compress: TrialPolicy::default(),
            decompress: TrialPolicy::default(),
            speed_threshold: 0,
            mem_limit: 0,
            threads: 1,
            time_stat: TimeStat::Fastest,
            format: OutputFormat::Text,
            sort: None,
            verify: true,
            compress_only: false,
            preprocessors: Vec::new(),
        }
    }
}

impl BenchConfig {
    pub fn set_chunk_size(&mut self, bytes: usize) -> &mut Self {
        self.chunk_size = bytes;
        self
    }

    pub fn set_iterations(&mut self, compress: u32, decompress: u32) -> &mut Self {
        self.compress.max_iters = compress;
        self.decompress.max_iters = decompress;
        self
    }

    pub fn set_min_time(&mut self, compress: Duration, decompress: Duration) -> &mut Self {
        self.compress.min_time = compress;
        self.decompress.min_time = decompress;
        self
    }

    pub fn set_loop_time(&mut self, loop_time: Duration) -> &mut Self {
        self.compress.loop_time = loop_time;
        self.decompress.loop_time = loop_time;
        self
    }

    pub fn set_speed_threshold(&mut self, bytes_per_sec: u64) -> &mut Self {
        self.speed_threshold = bytes_per_sec;
        self
    }

    pub fn set_mem_limit(&mut self, bytes: usize) -> &mut Self {
        self.mem_limit = bytes;
        self
    }

    pub fn set_threads(&mut self, threads: usize) -> &mut Self {
        self.threads = threads.max(1);
        self
    }

    pub fn set_time_stat(&mut self, stat: TimeStat) -> &mut Self {
        self.time_stat = stat;
        self
    }

    pub fn set_format(&mut self, format: OutputFormat) -> &mut Self {
        self.format = format;
        self
    }

    pub fn set_sort(&mut self, key: Option<SortKey>) -> &mut Self {
        self.sort = key;
        self
    }

    pub fn set_verify(&mut self, verify: bool) -> &mut Self {
        self.verify = verify;
        self
    }

    pub fn set_compress_only(&mut self, compress_only: bool) -> &mut Self {
        self.compress_only = compress_only;
        self
    }

    pub fn add_preprocessor(&mut self, p: Preprocessor) -> &mut Self {
        self.preprocessors.push(p);
        self
    }
}
