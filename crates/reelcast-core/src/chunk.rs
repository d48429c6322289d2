//! Chunk planning for multi-part uploads.
//!
//! A source of `len` bytes is split into 1-indexed, contiguous parts of
//! `chunk_size` bytes; only the last part may be shorter.

use crate::error::UploadError;

/// Smallest part the object store accepts for every part except the last.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

pub const DEFAULT_CHUNK_SIZE: u64 = MIN_PART_SIZE;

/// Object stores cap multi-part uploads at 10,000 parts.
pub const MAX_PART_COUNT: u32 = 10_000;

/// One contiguous byte range `[start, end)` of the source, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Part {
    pub part_number: u32,
    pub start: u64,
    pub end: u64,
}

impl Part {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Plan the parts covering `[0, len)`.
///
/// Returns no parts for an empty source; callers treat that as a usage error
/// rather than starting an empty multi-part upload.
pub fn plan_parts(len: u64, chunk_size: u64) -> Result<Vec<Part>, UploadError> {
    if chunk_size == 0 {
        return Err(UploadError::Validation(
            "chunk_size must be greater than 0".to_string(),
        ));
    }

    let count = len.div_ceil(chunk_size);
    if count > MAX_PART_COUNT as u64 {
        return Err(UploadError::Validation(format!(
            "Part count {} exceeds maximum {}; use a larger chunk size",
            count, MAX_PART_COUNT
        )));
    }

    let parts = (0..count)
        .map(|index| {
            let start = index * chunk_size;
            Part {
                part_number: index as u32 + 1,
                start,
                end: (start + chunk_size).min(len),
            }
        })
        .collect();

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn assert_covers(parts: &[Part], len: u64) {
        let mut cursor = 0;
        for (index, part) in parts.iter().enumerate() {
            assert_eq!(part.part_number, index as u32 + 1);
            assert_eq!(part.start, cursor, "parts must be contiguous");
            assert!(!part.is_empty());
            cursor = part.end;
        }
        assert_eq!(cursor, len, "parts must cover the whole source");
    }

    #[test]
    fn empty_source_has_no_parts() {
        assert!(plan_parts(0, DEFAULT_CHUNK_SIZE).unwrap().is_empty());
    }

    #[test]
    fn small_source_is_one_part() {
        let parts = plan_parts(42, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(
            parts,
            vec![Part {
                part_number: 1,
                start: 0,
                end: 42
            }]
        );
    }

    #[test]
    fn twelve_mib_in_five_mib_chunks() {
        let parts = plan_parts(12 * MIB, 5 * MIB).unwrap();
        let sizes: Vec<u64> = parts.iter().map(Part::len).collect();
        assert_eq!(sizes, vec![5 * MIB, 5 * MIB, 2 * MIB]);
        assert_covers(&parts, 12 * MIB);
    }

    #[test]
    fn exact_multiple_has_no_short_tail() {
        let parts = plan_parts(10 * MIB, 5 * MIB).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].len(), 5 * MIB);
    }

    #[test]
    fn part_count_is_ceil_for_many_lengths() {
        for len in 1..=64u64 {
            for chunk_size in 1..=9u64 {
                let parts = plan_parts(len, chunk_size).unwrap();
                assert_eq!(parts.len() as u64, len.div_ceil(chunk_size));
                assert_covers(&parts, len);
            }
        }
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = plan_parts(10, 0).unwrap_err();
        assert!(matches!(err, UploadError::Validation(_)));
    }

    #[test]
    fn too_many_parts_is_rejected() {
        let err = plan_parts(MAX_PART_COUNT as u64 + 1, 1).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
