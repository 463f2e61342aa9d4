use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::alias::{resolve, InvocationSpec};
use crate::buffer::{AlignedBuf, BufferSet, ChunkLayout, WorkMem};
use crate::codec::CodecParams;
use crate::config::BenchConfig;
use crate::error::{BenchError, Result, Stage};
use crate::preprocess::{apply_all, label_suffix};
use crate::registry::{CodecDescriptor, Registry};
use crate::results::{ResultRow, ResultTable};
use crate::timing::{run_trials, time_trial, timed, TrialPolicy};
use crate::verify::verify_round_trip;

/// One benchmark input, already loaded by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub label: String,
    pub data: Vec<u8>,
}

impl InputFile {
    pub fn new(label: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    /// Concatenate `files` into a single input labelled with every name.
    pub fn join(files: Vec<InputFile>) -> Self {
        let label = files
            .iter()
            .map(|f| f.label.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let mut data = Vec::with_capacity(files.iter().map(|f| f.data.len()).sum());
        for f in files {
            data.extend_from_slice(&f.data);
        }
        Self { label, data }
    }
}

/// Resolve `encoder_list`, benchmark every resulting invocation against
/// every input and return the (optionally sorted) table.
///
/// Configuration errors from the encoder list end up in the table's
/// failure section; they never stop the run.
pub fn run_benchmark(
    registry: &Registry,
    config: &BenchConfig,
    encoder_list: &str,
    inputs: Vec<InputFile>,
) -> Result<ResultTable> {
    let resolution = resolve(registry, encoder_list);
    let inputs = preprocess_inputs(inputs, config);

    let mut table = Bencher::new(registry, config).run(&resolution.specs, &inputs)?;
    for err in &resolution.errors {
        table.record_failure(err);
    }
    if let Some(key) = config.sort {
        table.sort_by(key);
    }
    Ok(table)
}

/// Apply the configured preprocessors, tagging each label with them.
pub fn preprocess_inputs(inputs: Vec<InputFile>, config: &BenchConfig) -> Vec<InputFile> {
    if config.preprocessors.is_empty() {
        return inputs;
    }
    let suffix = label_suffix(&config.preprocessors);
    inputs
        .into_iter()
        .map(|f| InputFile {
            data: apply_all(&f.data, &config.preprocessors),
            label: format!("{}{suffix}", f.label),
        })
        .collect()
}

/// Runs resolved invocations under one configuration.
pub struct Bencher<'a> {
    registry: &'a Registry,
    config: &'a BenchConfig,
}

impl<'a> Bencher<'a> {
    pub fn new(registry: &'a Registry, config: &'a BenchConfig) -> Self {
        Self { registry, config }
    }

    /// Benchmark each spec against each input.
    ///
    /// With one thread, invocations run strictly one after another. With
    /// more, they are spread over a fixed pool; rows are appended in
    /// completion order and only the append is serialized.
    pub fn run(&self, specs: &[InvocationSpec], inputs: &[InputFile]) -> Result<ResultTable> {
        let staged = stage_inputs(inputs)?;
        let inputs = staged.as_slice();
        if self.config.threads <= 1 {
            let mut table = ResultTable::new();
            for spec in specs {
                for outcome in self.run_invocation(spec, inputs) {
                    record(&mut table, outcome);
                }
            }
            return Ok(table);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .map_err(|e| BenchError::ThreadPool(e.to_string()))?;
        let shared = Mutex::new(ResultTable::new());
        pool.install(|| {
            specs.par_iter().for_each(|spec| {
                let outcomes = self.run_invocation(spec, inputs);
                let mut table = shared.lock().unwrap_or_else(PoisonError::into_inner);
                for outcome in outcomes {
                    record(&mut table, outcome);
                }
            })
        });
        Ok(shared.into_inner().unwrap_or_else(PoisonError::into_inner))
    }

    /// Benchmark one (codec, level) against every input, sharing one codec
    /// context across all of them. Returns one outcome per input.
    fn run_invocation(&self, spec: &InvocationSpec, inputs: &[Staged]) -> Vec<Result<ResultRow>> {
        let desc = self.registry.codec_at(spec.index);
        let params = CodecParams {
            level: spec.level,
            param2: spec.param2,
        };
        let label = desc.label(spec.level);
        let layouts: Vec<ChunkLayout> = inputs
            .iter()
            .map(|input| ChunkLayout::new(desc, input.block.len(), self.config.chunk_size))
            .collect();
        let max_input = layouts
            .iter()
            .map(ChunkLayout::largest_chunk)
            .max()
            .unwrap_or(0);

        info!("benchmarking {label}");
        let mut workmem = match WorkMem::acquire(desc.codec.clone(), max_input, params) {
            Ok(workmem) => workmem,
            Err(e) => {
                return vec![Err(BenchError::CodecFailure {
                    label,
                    file: "*".to_string(),
                    stage: Stage::Init,
                    message: format!("{e:#}"),
                })]
            }
        };

        inputs
            .iter()
            .zip(layouts)
            .map(|(input, layout)| {
                let run = Invocation {
                    desc,
                    params,
                    label: &label,
                    file: input.label,
                    config: self.config,
                };
                run.bench(&mut workmem, input.block.as_slice(), layout)
            })
            .collect()
    }
}

/// An input copied into an aligned block with zeroed padding past its end,
/// the form codecs read from.
struct Staged<'a> {
    label: &'a str,
    block: AlignedBuf,
}

fn stage_inputs(inputs: &[InputFile]) -> Result<Vec<Staged<'_>>> {
    inputs
        .iter()
        .map(|input| {
            let block = AlignedBuf::try_padded_copy(&input.data).map_err(|_| {
                BenchError::Allocation {
                    label: format!("input {}", input.label),
                    requested: input.data.len(),
                }
            })?;
            debug!(file = %input.label, bytes = block.len(), "staged input");
            Ok(Staged {
                label: &input.label,
                block,
            })
        })
        .collect()
}

fn record(table: &mut ResultTable, outcome: Result<ResultRow>) {
    match outcome {
        Ok(row) => {
            info!(
                compressed = row.compressed_size,
                original = row.original_size,
                ctime = ?row.compress_time,
                dtime = ?row.decompress_time,
                "{} on {}",
                row.label,
                row.file
            );
            table.push(row);
        }
        Err(err) => {
            error!("{err}");
            table.record_failure(&err);
        }
    }
}

/// Everything needed to measure one (codec, level, input) triple.
struct Invocation<'a> {
    desc: &'a CodecDescriptor,
    params: CodecParams,
    label: &'a str,
    file: &'a str,
    config: &'a BenchConfig,
}

impl Invocation<'_> {
    fn failure(&self, stage: Stage, message: String) -> BenchError {
        BenchError::CodecFailure {
            label: self.label.to_string(),
            file: self.file.to_string(),
            stage,
            message,
        }
    }

    fn bench(&self, workmem: &mut WorkMem, data: &[u8], layout: ChunkLayout) -> Result<ResultRow> {
        let cfg = self.config;
        let mut buffers = BufferSet::allocate(
            layout,
            cfg.mem_limit,
            cfg.compress_only,
            self.label,
            self.file,
        )?;
        let bytes = data.len();

        let compress = run_trials(&cfg.compress, bytes, cfg.speed_threshold, || {
            time_trial(cfg.compress.loop_time, || {
                self.compress_pass(workmem, data, &mut buffers)
            })
        })?;
        if compress.abandoned {
            warn!(
                "{} on {}: below the speed threshold, skipping further trials",
                self.label, self.file
            );
        }

        let decompress_time = if cfg.compress_only {
            Duration::ZERO
        } else {
            let policy = if compress.abandoned {
                TrialPolicy {
                    min_time: Duration::ZERO,
                    max_iters: 1,
                    ..cfg.decompress
                }
            } else {
                cfg.decompress
            };
            let decompress = run_trials(&policy, bytes, 0, || {
                time_trial(policy.loop_time, || {
                    self.decompress_pass(workmem, &mut buffers)
                })
            })?;

            if !cfg.verify {
                debug!("verification disabled for {}", self.label);
            } else if self.desc.query_only {
                debug!("{} is query-only, skipping verification", self.label);
            } else {
                verify_round_trip(data, &buffers, self.label, self.file)?;
            }
            decompress.reduce(cfg.time_stat)
        };

        Ok(ResultRow {
            label: self.label.to_string(),
            compress_time: compress.reduce(cfg.time_stat),
            decompress_time,
            compressed_size: buffers.total_compressed() as u64,
            original_size: bytes as u64,
            file: self.file.to_string(),
        })
    }

    /// Compress every chunk once; the sample is the summed codec time.
    fn compress_pass(
        &self,
        workmem: &mut WorkMem,
        data: &[u8],
        buffers: &mut BufferSet,
    ) -> Result<Duration> {
        let BufferSet {
            layout,
            compressed,
            compressed_sizes,
            ..
        } = buffers;
        let mut total = Duration::ZERO;

        for (slot, size) in layout.slots.iter().zip(compressed_sizes.iter_mut()) {
            let src = &data[slot.input.clone()];
            let dst = &mut compressed.as_mut_slice()[slot.region.clone()];
            let capacity = dst.len();

            let (res, elapsed) = timed(|| {
                self.desc
                    .codec
                    .compress(src, dst, self.params, workmem.context())
            });
            let written = res.map_err(|e| self.failure(Stage::Compress, format!("{e:#}")))?;
            if written > capacity {
                return Err(self.failure(
                    Stage::Compress,
                    format!("reported {written} bytes written into a {capacity}-byte buffer"),
                ));
            }
            *size = written;
            total += elapsed;
        }
        Ok(total)
    }

    /// Decompress every chunk produced by the last compress pass.
    fn decompress_pass(&self, workmem: &mut WorkMem, buffers: &mut BufferSet) -> Result<Duration> {
        let BufferSet {
            layout,
            compressed,
            decompressed,
            compressed_sizes,
            decompressed_sizes,
        } = buffers;
        let mut total = Duration::ZERO;

        for ((slot, &csize), dsize) in layout
            .slots
            .iter()
            .zip(compressed_sizes.iter())
            .zip(decompressed_sizes.iter_mut())
        {
            let src = &compressed.as_slice()[slot.region.start..slot.region.start + csize];
            let dst = &mut decompressed.as_mut_slice()[slot.region.clone()];
            let capacity = dst.len();

            let (res, elapsed) = timed(|| {
                self.desc
                    .codec
                    .decompress(src, dst, self.params, workmem.context())
            });
            let written = res.map_err(|e| self.failure(Stage::Decompress, format!("{e:#}")))?;
            if written > capacity {
                return Err(self.failure(
                    Stage::Decompress,
                    format!("reported {written} bytes written into a {capacity}-byte buffer"),
                ));
            }
            *dsize = written;
            total += elapsed;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::codec::{Codec, CodecContext};
    use crate::registry::CodecDescriptor;
    use crate::results::SortKey;

    struct Identity;

    impl Codec for Identity {
        fn compress(
            &self,
            input: &[u8],
            output: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            output[..input.len()].copy_from_slice(input);
            Ok(input.len())
        }

        fn decompress(
            &self,
            input: &[u8],
            output: &mut [u8],
            p: CodecParams,
            c: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            self.compress(input, output, p, c)
        }
    }

    /// Round-trips everything except that decompression flips byte 0.
    struct Corrupting;

    impl Codec for Corrupting {
        fn compress(
            &self,
            input: &[u8],
            output: &mut [u8],
            p: CodecParams,
            c: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Identity.compress(input, output, p, c)
        }

        fn decompress(
            &self,
            input: &[u8],
            output: &mut [u8],
            p: CodecParams,
            c: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            let n = Identity.decompress(input, output, p, c)?;
            if n > 0 {
                output[0] ^= 1;
            }
            Ok(n)
        }
    }

    struct Failing;

    impl Codec for Failing {
        fn compress(
            &self,
            _: &[u8],
            _: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            anyhow::bail!("refusing to compress")
        }

        fn decompress(
            &self,
            _: &[u8],
            _: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Ok(0)
        }
    }

    /// Identity that refuses input not starting on an `ALIGN_BYTES` boundary.
    struct AlignedOnly;

    impl Codec for AlignedOnly {
        fn compress(
            &self,
            input: &[u8],
            output: &mut [u8],
            p: CodecParams,
            c: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            let misalign = input.as_ptr() as usize % crate::buffer::ALIGN_BYTES;
            if misalign != 0 {
                anyhow::bail!("input starts {misalign} bytes past an aligned boundary");
            }
            Identity.compress(input, output, p, c)
        }

        fn decompress(
            &self,
            input: &[u8],
            output: &mut [u8],
            p: CodecParams,
            c: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Identity.decompress(input, output, p, c)
        }
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register(CodecDescriptor::new("copy", "", (0, 0), Arc::new(Identity)))
            .register(CodecDescriptor::new("copy3", "1", (1, 3), Arc::new(Identity)))
            .register(CodecDescriptor::new("bad", "", (0, 0), Arc::new(Corrupting)))
            .register(CodecDescriptor::new("badq", "", (0, 0), Arc::new(Corrupting)).query_only())
            .register(CodecDescriptor::new("fail", "", (0, 0), Arc::new(Failing)))
            .register(
                CodecDescriptor::new("small", "", (0, 0), Arc::new(Identity)).with_max_block_size(100),
            );
        reg
    }

    fn inputs() -> Vec<InputFile> {
        vec![
            InputFile::new("a", vec![1u8; 1000]),
            InputFile::new("b", (0..2000u32).map(|i| i as u8).collect()),
        ]
    }

    #[test]
    fn one_row_per_spec_and_input() {
        let reg = registry();
        let config = BenchConfig::default();
        let table = run_benchmark(&reg, &config, "copy/copy3,2", inputs()).unwrap();
        let got: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.label.as_str(), r.file.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![("copy", "a"), ("copy", "b"), ("copy3 1 -2", "a"), ("copy3 1 -2", "b")]
        );
        assert!(table.failures().is_empty());
    }

    #[test]
    fn mismatch_and_codec_failure_do_not_stop_the_run() {
        let reg = registry();
        let config = BenchConfig::default();
        let table = run_benchmark(&reg, &config, "bad/fail/copy/nope", inputs()).unwrap();

        assert_eq!(table.rows().len(), 2);
        assert!(table.rows().iter().all(|r| r.label == "copy"));

        let cats: Vec<_> = table.failures().iter().map(|f| f.category).collect();
        use crate::error::ErrorCategory::*;
        assert_eq!(cats, vec![Verification, Verification, Codec, Codec, Config]);
    }

    #[test]
    fn codecs_read_inputs_from_aligned_blocks() {
        let mut reg = registry();
        reg.register(CodecDescriptor::new("aligned", "", (0, 0), Arc::new(AlignedOnly)));
        let backing: Vec<u8> = (0..4096u32).map(|i| (i * 7) as u8).collect();
        let files: Vec<InputFile> = (0..32)
            .map(|off| InputFile::new(format!("f{off}"), backing[off..off + 500].to_vec()))
            .collect();

        let table = run_benchmark(&reg, &BenchConfig::default(), "aligned", files).unwrap();
        assert!(table.failures().is_empty(), "{:?}", table.failures());
        assert_eq!(table.rows().len(), 32);
    }

    #[test]
    fn query_only_codecs_skip_verification() {
        let reg = registry();
        let table = run_benchmark(&reg, &BenchConfig::default(), "badq", inputs()).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert!(table.failures().is_empty());
    }

    #[test]
    fn unverified_run_accepts_corrupt_output() {
        let reg = registry();
        let mut config = BenchConfig::default();
        config.set_verify(false);
        let table = run_benchmark(&reg, &config, "bad", inputs()).unwrap();
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn chunking_sums_compressed_sizes() {
        let reg = registry();
        let mut config = BenchConfig::default();
        config.set_chunk_size(300);
        let table = run_benchmark(&reg, &config, "small/copy", inputs()).unwrap();
        assert_eq!(table.rows().len(), 4);
        for r in table.rows() {
            assert_eq!(r.compressed_size, r.original_size);
        }
    }

    #[test]
    fn memory_limit_fails_only_that_invocation() {
        let reg = registry();
        let mut config = BenchConfig::default();
        // Two 1000-byte chunks need 2 * (1000 + 400 + 16K); 2000 bytes need more.
        config.set_mem_limit(2 * (1000 + 400 + crate::buffer::PAD_SIZE));
        let table = run_benchmark(&reg, &config, "copy", inputs()).unwrap();
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].file, "a");
        assert_eq!(table.failures().len(), 1);
        assert_eq!(table.failures()[0].category, crate::error::ErrorCategory::Resource);
    }

    #[test]
    fn compress_only_reports_zero_decompress_time() {
        let reg = registry();
        let mut config = BenchConfig::default();
        config.set_compress_only(true);
        let table = run_benchmark(&reg, &config, "bad", inputs()).unwrap();
        assert_eq!(table.rows().len(), 2);
        assert!(table.rows().iter().all(|r| r.decompress_time == Duration::ZERO));
    }

    #[test]
    fn threaded_run_collects_every_row() {
        let reg = registry();
        let mut config = BenchConfig::default();
        config.set_threads(4).set_sort(Some(SortKey::Name));
        let table = run_benchmark(&reg, &config, "copy3/copy", inputs()).unwrap();
        assert_eq!(table.rows().len(), 8);
        assert_eq!(table.rows()[0].label, "copy");
    }

    #[test]
    fn preprocessing_tags_labels() {
        let mut config = BenchConfig::default();
        config.add_preprocessor(crate::preprocess::Preprocessor::Delta(1));
        let out = preprocess_inputs(vec![InputFile::new("x", vec![3, 4, 5])], &config);
        assert_eq!(out[0].label, "x+delta1");
        assert_eq!(out[0].data, vec![3, 1, 1]);
    }

    #[test]
    fn join_concatenates() {
        let joined = InputFile::join(inputs());
        assert_eq!(joined.label, "a,b");
        assert_eq!(joined.data.len(), 3000);
    }
}
