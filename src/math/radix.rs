//! LSD radix sort for (Morton code, leaf index) pairs
//!
//! Four 8-bit passes over 30-bit codes, O(n) time, one reused scratch
//! buffer. The sort is stable: pairs with equal codes keep insertion order,
//! which is what breaks Morton ties deterministically in the tree build.

/// Reusable radix sorter
///
/// The scratch buffer is retained between sorts so steady-state rebuilds do
/// not allocate once capacity has grown to the working-set size.
pub struct RadixSorter {
    scratch: Vec<(u32, u32)>,
}

impl RadixSorter {
    pub fn new() -> Self {
        Self { scratch: Vec::new() }
    }

    /// Sort pairs ascending by code, stable within equal codes
    pub fn sort(&mut self, pairs: &mut [(u32, u32)]) {
        let n = pairs.len();
        if n <= 1 {
            return;
        }
        self.scratch.clear();
        self.scratch.resize(n, (0, 0));

        // Ping-pong between the caller's buffer and scratch; four passes
        // leave the result back in the caller's buffer.
        for pass in 0..4 {
            let shift = pass * 8;
            if pass % 2 == 0 {
                radix_pass(pairs, &mut self.scratch, shift);
            } else {
                radix_pass(&self.scratch, pairs, shift);
            }
        }
    }
}

impl Default for RadixSorter {
    fn default() -> Self {
        Self::new()
    }
}

fn radix_pass(src: &[(u32, u32)], dst: &mut [(u32, u32)], shift: u32) {
    let mut counts = [0usize; 256];
    for &(code, _) in src {
        counts[((code >> shift) & 0xff) as usize] += 1;
    }

    let mut offsets = [0usize; 256];
    let mut sum = 0;
    for (offset, &count) in offsets.iter_mut().zip(counts.iter()) {
        *offset = sum;
        sum += count;
    }

    for &pair in src {
        let bucket = ((pair.0 >> shift) & 0xff) as usize;
        dst[offsets[bucket]] = pair;
        offsets[bucket] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_ascending() {
        let mut sorter = RadixSorter::new();
        let mut pairs: Vec<(u32, u32)> = vec![
            (0x3fffffff, 0),
            (5, 1),
            (0x00ff00ff, 2),
            (0, 3),
            (5, 4),
        ];
        sorter.sort(&mut pairs);

        let codes: Vec<u32> = pairs.iter().map(|p| p.0).collect();
        let mut expected = codes.clone();
        expected.sort();
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_sort_stable_for_equal_codes() {
        let mut sorter = RadixSorter::new();
        let mut pairs: Vec<(u32, u32)> = vec![(7, 0), (3, 1), (7, 2), (3, 3), (7, 4)];
        sorter.sort(&mut pairs);

        assert_eq!(pairs, vec![(3, 1), (3, 3), (7, 0), (7, 2), (7, 4)]);
    }

    #[test]
    fn test_sort_empty_and_single() {
        let mut sorter = RadixSorter::new();
        let mut empty: Vec<(u32, u32)> = Vec::new();
        sorter.sort(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![(42, 7)];
        sorter.sort(&mut single);
        assert_eq!(single, vec![(42, 7)]);
    }

    #[test]
    fn test_sort_matches_std_sort() {
        let mut sorter = RadixSorter::new();
        // Deterministic pseudo-random codes
        let mut state = 0x12345678u32;
        let mut pairs: Vec<(u32, u32)> = (0..1000)
            .map(|i| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state & 0x3fffffff, i)
            })
            .collect();
        let mut expected = pairs.clone();
        expected.sort_by_key(|p| p.0);

        sorter.sort(&mut pairs);
        let codes: Vec<u32> = pairs.iter().map(|p| p.0).collect();
        let expected_codes: Vec<u32> = expected.iter().map(|p| p.0).collect();
        assert_eq!(codes, expected_codes);
    }
}
