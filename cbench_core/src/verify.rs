use xxhash_rust::xxh3::xxh3_64;

use crate::buffer::BufferSet;
use crate::error::{BenchError, Result};

/// Check that every decompressed chunk in `buffers` reproduces its slice of
/// `input` exactly.
///
/// The reported offset is relative to the start of `input`; when lengths
/// differ but the common prefix matches, it is the end of the shorter one.
pub fn verify_round_trip(input: &[u8], buffers: &BufferSet, label: &str, file: &str) -> Result<()> {
    for (slot, &written) in buffers
        .layout
        .slots
        .iter()
        .zip(buffers.decompressed_sizes.iter())
    {
        let expected = &input[slot.input.clone()];
        let region = &buffers.decompressed.as_slice()[slot.region.clone()];
        let actual = &region[..written.min(region.len())];

        if let Some(offset) = first_difference(expected, actual) {
            return Err(BenchError::VerificationMismatch {
                label: label.to_string(),
                file: file.to_string(),
                offset: slot.input.start + offset,
                expected: xxh3_64(expected),
                actual: xxh3_64(actual),
            });
        }
    }
    Ok(())
}

/// Index of the first byte where `a` and `b` disagree, if any.
pub fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    if a == b {
        return None;
    }
    Some(
        a.iter()
            .zip(b)
            .position(|(x, y)| x != y)
            .unwrap_or_else(|| a.len().min(b.len())),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::buffer::ChunkLayout;
    use crate::codec::{Codec, CodecContext, CodecParams};
    use crate::registry::CodecDescriptor;

    struct Nop;

    impl Codec for Nop {
        fn compress(
            &self,
            _: &[u8],
            _: &mut [u8],
            _: CodecParams,
            _: Option<&mut CodecContext>,
        ) -> anyhow::Result<usize> {
            Ok(0)
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

    fn filled(input: &[u8], chunk: usize) -> BufferSet {
        let desc = CodecDescriptor::new("nop", "", (0, 0), Arc::new(Nop));
        let layout = ChunkLayout::new(&desc, input.len(), chunk);
        let mut set = BufferSet::allocate(layout, 0, false, "nop", "t").unwrap();
        let slots = set.layout.slots.clone();
        for (i, slot) in slots.iter().enumerate() {
            let dst = &mut set.decompressed.as_mut_slice()[slot.region.clone()];
            dst[..slot.len()].copy_from_slice(&input[slot.input.clone()]);
            set.decompressed_sizes[i] = slot.len();
        }
        set
    }

    #[test]
    fn identical_chunks_pass() {
        let input: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let set = filled(&input, 1024);
        assert!(verify_round_trip(&input, &set, "nop", "t").is_ok());
    }

    #[test]
    fn corrupted_byte_is_located() {
        let input: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let mut set = filled(&input, 1024);
        let region_start = set.layout.slots[2].region.start;
        set.decompressed.as_mut_slice()[region_start + 10] ^= 0xFF;

        match verify_round_trip(&input, &set, "nop", "t") {
            Err(BenchError::VerificationMismatch { offset, expected, actual, .. }) => {
                assert_eq!(offset, 2048 + 10);
                assert_ne!(expected, actual);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn short_output_is_a_mismatch() {
        let input = vec![7u8; 300];
        let mut set = filled(&input, 0);
        set.decompressed_sizes[0] = 299;
        let err = verify_round_trip(&input, &set, "nop", "t").unwrap_err();
        assert!(matches!(err, BenchError::VerificationMismatch { offset: 299, .. }));
    }

    #[test]
    fn first_difference_cases() {
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert_eq!(first_difference(b"abc", b"abd"), Some(2));
        assert_eq!(first_difference(b"abc", b"ab"), Some(2));
        assert_eq!(first_difference(b"", b""), None);
    }
}
