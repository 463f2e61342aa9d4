//! Trial loop and sample reduction.
//!
//! Timings are noisy in one direction only: preemption, cache misses and
//! frequency scaling make a run slower, never faster. The default statistic
//! is therefore the fastest trial.

use std::time::{Duration, Instant};

use tracing::debug;

/// How repeated samples collapse into the reported time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStat {
    #[default]
    Fastest,
    Average,
    /// Lower median for even sample counts; no interpolation.
    Median,
}

impl std::str::FromStr for TimeStat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fastest" | "min" | "1" => Ok(TimeStat::Fastest),
            "average" | "avg" | "mean" | "2" => Ok(TimeStat::Average),
            "median" | "3" => Ok(TimeStat::Median),
            other => Err(format!("unknown statistic '{other}' (fastest, average, median)")),
        }
    }
}

/// Convergence policy for one side (compress or decompress) of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPolicy {
    /// Keep issuing trials until their cumulative time exceeds this.
    pub min_time: Duration,
    /// Hard cap on the number of trials. Treated as at least 1.
    pub max_iters: u32,
    /// Within one trial, repeat the pass until this much time has elapsed and
    /// report the mean per pass. Zero means one pass per trial.
    pub loop_time: Duration,
}

impl Default for TrialPolicy {
    fn default() -> Self {
        Self {
            min_time: Duration::ZERO,
            max_iters: 1,
            loop_time: Duration::ZERO,
        }
    }
}

/// Outcome of [`run_trials`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trials {
    pub samples: Vec<Duration>,
    /// The speed threshold cut the loop short after the first trial.
    pub abandoned: bool,
}

impl Trials {
    pub fn reduce(&self, stat: TimeStat) -> Duration {
        reduce(&self.samples, stat)
    }
}

/// Run `trial` until the policy converges.
///
/// `trial` performs one timed pass and returns its sample. `bytes` is the
/// input size used to evaluate `speed_threshold` (bytes per second, 0 =
/// disabled) against the first sample.
pub fn run_trials<E, F>(
    policy: &TrialPolicy,
    bytes: usize,
    speed_threshold: u64,
    mut trial: F,
) -> Result<Trials, E>
where
    F: FnMut() -> Result<Duration, E>,
{
    let max_iters = policy.max_iters.max(1);
    let mut samples = Vec::with_capacity(max_iters.min(1024) as usize);
    let mut total = Duration::ZERO;
    let mut abandoned = false;

    loop {
        let sample = trial()?;
        total += sample;
        samples.push(sample);

        if samples.len() == 1 && speed_threshold > 0 && below_threshold(bytes, sample, speed_threshold)
        {
            abandoned = true;
            break;
        }
        if total > policy.min_time || samples.len() as u32 >= max_iters {
            break;
        }
    }

    debug!(trials = samples.len(), ?total, abandoned, "trials converged");
    Ok(Trials { samples, abandoned })
}

/// Time `pass` once, or repeatedly until `loop_time` elapses, returning the
/// mean duration of one pass.
///
/// `pass` reports its own elapsed time so that per-chunk bookkeeping between
/// codec calls stays out of the measurement.
pub fn time_trial<E, F>(loop_time: Duration, mut pass: F) -> Result<Duration, E>
where
    F: FnMut() -> Result<Duration, E>,
{
    let mut spent = Duration::ZERO;
    let mut passes = 0u32;
    loop {
        spent += pass()?;
        passes += 1;
        if spent >= loop_time {
            break;
        }
    }
    Ok(spent / passes)
}

/// Run `f` and measure it with the monotonic clock.
#[inline]
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

fn below_threshold(bytes: usize, sample: Duration, threshold: u64) -> bool {
    let secs = sample.as_secs_f64();
    if secs <= 0.0 {
        return false;
    }
    (bytes as f64 / secs) < threshold as f64
}

/// Collapse `samples` to one duration. An empty slice reduces to zero.
pub fn reduce(samples: &[Duration], stat: TimeStat) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }
    match stat {
        TimeStat::Fastest => samples.iter().copied().min().unwrap_or_default(),
        TimeStat::Average => {
            let sum: u128 = samples.iter().map(Duration::as_nanos).sum();
            nanos(sum / samples.len() as u128)
        }
        TimeStat::Median => {
            let mut sorted = samples.to_vec();
            sorted.sort_unstable();
            sorted[(sorted.len() - 1) / 2]
        }
    }
}

fn nanos(n: u128) -> Duration {
    Duration::from_nanos(u64::try_from(n).unwrap_or(u64::MAX))
}
