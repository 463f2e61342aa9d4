/// Transform applied to an input before it is benchmarked.
///
/// The transformed bytes become the benchmark input: codecs compress them
/// and verification compares against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessor {
    /// Wrapping delta over little-endian elements of 1, 2, 4 or 8 bytes.
    Delta(usize),
}

impl Preprocessor {
    pub fn name(&self) -> String {
        match self {
            Preprocessor::Delta(width) => format!("delta{width}"),
        }
    }

    pub fn apply(&self, data: &[u8]) -> Vec<u8> {
        match *self {
            Preprocessor::Delta(width) => delta_encode(data, width),
        }
    }
}

impl std::str::FromStr for Preprocessor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delta" | "delta1" | "1" => Ok(Preprocessor::Delta(1)),
            "delta2" | "2" => Ok(Preprocessor::Delta(2)),
            "delta4" | "3" => Ok(Preprocessor::Delta(4)),
            "delta8" | "4" => Ok(Preprocessor::Delta(8)),
            other => Err(format!(
                "unknown preprocessor '{other}' (delta1, delta2, delta4, delta8)"
            )),
        }
    }
}

/// Apply `preprocessors` in order.
pub fn apply_all(data: &[u8], preprocessors: &[Preprocessor]) -> Vec<u8> {
    let mut out = data.to_vec();
    for p in preprocessors {
        out = p.apply(&out);
    }
    out
}

/// Suffix appended to a file label, e.g. `+delta2+delta1`. Empty when no
/// preprocessors run.
pub fn label_suffix(preprocessors: &[Preprocessor]) -> String {
    preprocessors
        .iter()
        .map(|p| format!("+{}", p.name()))
        .collect()
}

fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn write_le(dst: &mut [u8], value: u64) {
    for (i, b) in dst.iter_mut().enumerate() {
        *b = (value >> (8 * i)) as u8;
    }
}

fn mask(width: usize) -> u64 {
    if width >= 8 {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Each element becomes its difference from the previous one. Trailing
/// bytes that do not fill an element are copied unchanged.
pub fn delta_encode(data: &[u8], width: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    delta_encode_into(data, &mut out, width);
    out
}

/// Inverse of [`delta_encode`].
pub fn delta_decode(data: &[u8], width: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    delta_decode_into(data, &mut out, width);
    out
}

/// Slice form of [`delta_encode`]; `dst` must be as long as `src`.
pub fn delta_encode_into(src: &[u8], dst: &mut [u8], width: usize) {
    dst[..src.len()].copy_from_slice(src);
    if width == 0 || width > 8 {
        return;
    }
    let m = mask(width);
    let mut prev = 0u64;
    for (s, d) in src.chunks_exact(width).zip(dst.chunks_exact_mut(width)) {
        let cur = read_le(s);
        write_le(d, cur.wrapping_sub(prev) & m);
        prev = cur;
    }
}

/// Slice form of [`delta_decode`]; `dst` must be as long as `src`.
pub fn delta_decode_into(src: &[u8], dst: &mut [u8], width: usize) {
    dst[..src.len()].copy_from_slice(src);
    if width == 0 || width > 8 {
        return;
    }
    let m = mask(width);
    let mut prev = 0u64;
    for (s, d) in src.chunks_exact(width).zip(dst.chunks_exact_mut(width)) {
        let cur = read_le(s).wrapping_add(prev) & m;
        write_le(d, cur);
        prev = cur;
    }
}

/// Sum of the elements a delta stream decodes to, without materializing it.
pub fn delta_decode_sum(src: &[u8], width: usize) -> u64 {
    if width == 0 || width > 8 {
        return src.iter().map(|&b| b as u64).sum();
    }
    let m = mask(width);
    let mut prev = 0u64;
    let mut sum = 0u64;
    for s in src.chunks_exact(width) {
        prev = read_le(s).wrapping_add(prev) & m;
        sum = sum.wrapping_add(prev);
    }
    src.chunks_exact(width)
        .remainder()
        .iter()
        .fold(sum, |acc, &b| acc.wrapping_add(b as u64))
}
