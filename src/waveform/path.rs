//! Builds the filled peak-envelope outline of a waveform.

use super::extrema::Extrema;
use crate::surface::Path;

/// Maps a sample value to a y-coordinate around `center_y`.
///
/// Full-scale positive samples land on y = 0. `i16::MIN` lands slightly below
/// `2 * center_y` because the ratio is taken against `i16::MAX`.
pub fn amplitude_to_y(sample: i16, center_y: f32) -> f32 {
    center_y - (sample as f32 / i16::MAX as f32) * center_y
}

/// Traces a single closed silhouette: from `(0, center_y)` along the column
/// maxima left to right, then back along the minima right to left.
pub fn outline(extrema: &[Extrema], center_y: f32) -> Path {
    let mut path = Path::with_capacity(extrema.len() * 2 + 1);
    path.move_to(0.0, center_y);

    for (x, column) in extrema.iter().enumerate() {
        path.line_to(x as f32, amplitude_to_y(column.max, center_y));
    }
    for (x, column) in extrema.iter().enumerate().rev() {
        path.line_to(x as f32, amplitude_to_y(column.min, center_y));
    }

    path.close();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_mapping() {
        assert_eq!(amplitude_to_y(0, 50.0), 50.0);
        assert_eq!(amplitude_to_y(i16::MAX, 50.0), 0.0);
        let bottom = amplitude_to_y(i16::MIN, 50.0);
        assert!(bottom > 100.0 && bottom < 100.01);
    }

    #[test]
    fn test_outline_traces_max_then_min() {
        let extrema = [
            Extrema { min: -100, max: 200 },
            Extrema { min: -300, max: 400 },
        ];
        let path = outline(&extrema, 10.0);
        let xs: Vec<f32> = path.points().iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 0.0, 1.0, 1.0, 0.0]);
        assert_eq!(path.points()[0], (0.0, 10.0));
        assert_eq!(path.points()[2].1, amplitude_to_y(400, 10.0));
        assert_eq!(path.points()[3].1, amplitude_to_y(-300, 10.0));
        assert!(path.is_closed());
    }
}
