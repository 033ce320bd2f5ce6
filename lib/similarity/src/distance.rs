//! Per-feature similarity functions
//!
//! All functions return a similarity score in range [0.0, 1.0] where 1.0
//! means identical.

use crate::schema::Feature;
use geosearch_core::Descriptor;

/// Denominator floor for [`scalar_similarity`]
pub const SIMILARITY_EPSILON: f64 = 1e-12;

/// Relative distance: `1 - |q - c| / max(|q|, |c|, eps)`, floored at 0.
pub fn scalar_similarity(query: f64, candidate: f64) -> f64 {
    let scale = query.abs().max(candidate.abs()).max(SIMILARITY_EPSILON);
    let similarity = 1.0 - (query - candidate).abs() / scale;
    if similarity.is_finite() {
        similarity.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Histogram overlap: `1 - L1(a, b) / 2`.
///
/// For two probability histograms this equals the shared mass. The shorter
/// histogram is padded with empty bins.
pub fn histogram_similarity(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().max(b.len());
    let l1: f64 = (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0);
            let y = b.get(i).copied().unwrap_or(0.0);
            (x - y).abs()
        })
        .sum();
    (1.0 - 0.5 * l1).clamp(0.0, 1.0)
}

/// Score between two unit comparison vectors: `1 - |a - b|^2 / 4`.
///
/// Zero for opposite vectors, one for identical ones. Used only to
/// prefilter candidates before full scoring.
pub fn vector_similarity(a: &[f32], b: &[f32]) -> f64 {
    let len = a.len().max(b.len());
    let squared: f64 = (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0.0) as f64;
            let y = b.get(i).copied().unwrap_or(0.0) as f64;
            (x - y) * (x - y)
        })
        .sum();
    (1.0 - squared / 4.0).max(0.0)
}

/// Similarity of one feature between two descriptors
pub fn feature_similarity(feature: Feature, query: &Descriptor, candidate: &Descriptor) -> f64 {
    match feature {
        Feature::ShapeDistribution => histogram_similarity(
            &query.shape_distribution.histogram,
            &candidate.shape_distribution.histogram,
        ),
        scalar => scalar_similarity(scalar.value(query), scalar.value(candidate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_similarity() {
        assert_eq!(scalar_similarity(5.0, 5.0), 1.0);
        assert_eq!(scalar_similarity(0.0, 0.0), 1.0);
        assert_relative_eq!(scalar_similarity(2.0, 1.0), 0.5);
        assert_relative_eq!(scalar_similarity(1.0, 2.0), 0.5);
        assert_eq!(scalar_similarity(1.0, -1.0), 0.0);
        assert_eq!(scalar_similarity(0.0, 3.0), 0.0);
    }

    #[test]
    fn test_scalar_similarity_is_bounded() {
        for (q, c) in [(1e-300, 1e300), (f64::MAX, -f64::MAX), (1e6, 1e6), (-4.0, -2.0)] {
            let s = scalar_similarity(q, c);
            assert!((0.0..=1.0).contains(&s), "{} vs {} gave {}", q, c, s);
        }
    }

    #[test]
    fn test_histogram_similarity() {
        let a = [0.5, 0.5, 0.0];
        assert_eq!(histogram_similarity(&a, &a), 1.0);
        assert_eq!(histogram_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_relative_eq!(histogram_similarity(&[0.5, 0.5], &[1.0, 0.0]), 0.5);
    }

    #[test]
    fn test_histogram_similarity_pads_shorter() {
        assert_relative_eq!(histogram_similarity(&[1.0], &[0.5, 0.5]), 0.5);
        assert_eq!(histogram_similarity(&[0.2, 0.8], &[0.2, 0.8, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_vector_similarity() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 1.0];
        let c = [-1.0f32, 0.0];
        assert_eq!(vector_similarity(&a, &a), 1.0);
        assert_relative_eq!(vector_similarity(&a, &b), 0.5);
        assert_eq!(vector_similarity(&a, &c), 0.0);
    }
}
