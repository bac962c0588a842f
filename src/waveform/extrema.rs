//! Per-column min/max reduction of a sample buffer.

/// Lowest and highest sample value within one pixel column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extrema {
    pub min: i16,
    pub max: i16,
}

/// First sample index covered by `column` out of `columns` over `len` samples,
/// i.e. `floor(column / columns * len)` in exact integer arithmetic.
fn column_start(column: usize, len: usize, columns: usize) -> usize {
    (column as u64 * len as u64 / columns as u64) as usize
}

/// Reduces `samples` to `columns` (min, max) pairs.
///
/// Column `x` covers samples `[floor(x/W·N), floor((x+1)/W·N))`. When there
/// are more columns than samples a column's range can be empty; it then takes
/// the single sample at its start index, so every column is defined and the
/// table always has exactly `columns` entries.
///
/// The ranges tile the buffer, so the whole reduction is one pass over the
/// samples plus the output allocation. An empty buffer or zero columns
/// yields an empty table.
pub fn extremes(samples: &[i16], columns: usize) -> Vec<Extrema> {
    let len = samples.len();
    if len == 0 || columns == 0 {
        return Vec::new();
    }

    let mut table = Vec::with_capacity(columns);
    let mut start = 0;
    for column in 0..columns {
        let end = column_start(column + 1, len, columns).max(start + 1);
        let (min, max) = samples[start..end]
            .iter()
            .fold((i16::MAX, i16::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        table.push(Extrema { min, max });
        start = column_start(column + 1, len, columns).min(len - 1);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_columns() {
        let samples = [1, -4, 3, 2, -1, 7, 0, 0];
        let table = extremes(&samples, 4);
        assert_eq!(
            table,
            vec![
                Extrema { min: -4, max: 1 },
                Extrema { min: 2, max: 3 },
                Extrema { min: -1, max: 7 },
                Extrema { min: 0, max: 0 },
            ]
        );
    }

    #[test]
    fn test_uneven_columns_use_floor_boundaries() {
        // N = 10, W = 3: ranges [0,3), [3,6), [6,10)
        let samples: Vec<i16> = (0..10).collect();
        let table = extremes(&samples, 3);
        assert_eq!(table[0], Extrema { min: 0, max: 2 });
        assert_eq!(table[1], Extrema { min: 3, max: 5 });
        assert_eq!(table[2], Extrema { min: 6, max: 9 });
    }

    #[test]
    fn test_length_and_ordering_hold_for_many_sizes() {
        let samples: Vec<i16> = (0..997)
            .map(|i| ((i * 7919) % 65536) as i32 - 32768)
            .map(|v| v as i16)
            .collect();
        for width in [1, 2, 3, 17, 100, 500, 996, 997] {
            let table = extremes(&samples, width);
            assert_eq!(table.len(), width);
            assert!(table.iter().all(|e| e.max >= e.min));
        }
    }

    #[test]
    fn test_more_columns_than_samples_repeat_samples() {
        let samples = [10, -20, 30];
        let table = extremes(&samples, 7);
        assert_eq!(table.len(), 7);
        // floor(x * 3 / 7) for x = 0..7 -> 0,0,0,1,1,2,2
        let picked: Vec<i16> = table.iter().map(|e| e.max).collect();
        assert_eq!(picked, vec![10, 10, 10, -20, -20, 30, 30]);
        assert!(table.iter().all(|e| e.min == e.max));
    }

    #[test]
    fn test_full_scale_values() {
        let table = extremes(&[i16::MIN, i16::MAX], 1);
        assert_eq!(table, vec![Extrema { min: i16::MIN, max: i16::MAX }]);
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(extremes(&[], 10).is_empty());
        assert!(extremes(&[1, 2, 3], 0).is_empty());
    }
}
