//! Portable vector kernels shared by the metrics.
//!
//! All kernels walk the shared prefix `min(a.len(), b.len())`; callers that
//! need equal lengths check before calling.
//!
//! ```rust
//! use cbir_core::ops::{dot, norm, sum};
//!
//! let a = [1.0_f32, 2.0, 2.0];
//! assert_eq!(dot(&a, &a), 9.0);
//! assert_eq!(norm(&a), 3.0);
//! assert_eq!(sum(&a), 5.0);
//! ```

/// Dot product.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Dot product accumulated in f64.
#[inline]
#[must_use]
pub fn dot_f64(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

/// Arithmetic mean in f64; 0 for an empty slice.
#[inline]
#[must_use]
pub fn mean_f64(v: &[f32]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().map(|x| f64::from(*x)).sum::<f64>() / v.len() as f64
}

/// L2 norm of a vector.
#[inline]
#[must_use]
pub fn norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Sum of all components.
#[inline]
#[must_use]
pub fn sum(v: &[f32]) -> f32 {
    v.iter().sum()
}

/// Arithmetic mean; 0 for an empty slice.
#[inline]
#[must_use]
pub fn mean(v: &[f32]) -> f32 {
    if v.is_empty() {
        return 0.0;
    }
    sum(v) / v.len() as f32
}

/// L2 distance squared (no sqrt, preserves ordering).
#[inline]
#[must_use]
pub fn l2_distance_squared(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// L2 (Euclidean) distance.
#[inline]
#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    l2_distance_squared(a, b).sqrt()
}

/// Component-wise minimum, summed.
#[inline]
#[must_use]
pub fn min_sum(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x.min(*y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_basic() {
        let a = [1.0_f32, 2.0, 3.0];
        let b = [4.0_f32, 5.0, 6.0];
        assert!((dot(&a, &b) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_f64_does_not_overflow() {
        let a = [1e20_f32, 1e20];
        assert!(dot(&a, &a).is_infinite());
        assert!((dot_f64(&a, &a) / 2e40 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mean_f64() {
        assert_eq!(mean_f64(&[]), 0.0);
        assert!((mean_f64(&[0.001, 0.002, 0.003]) - 0.002).abs() < 1e-9);
    }

    #[test]
    fn test_norm() {
        let v = [3.0_f32, 4.0];
        assert!((norm(&v) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance() {
        let a = [0.0_f32, 0.0];
        let b = [3.0_f32, 4.0];
        assert!((l2_distance(&a, &b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_uses_shared_prefix() {
        let a = [1.0_f32, 1.0, 100.0];
        let b = [1.0_f32, 2.0];
        assert!((l2_distance(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_min_sum() {
        let a = [0.2_f32, 0.5, 0.3];
        let b = [0.4_f32, 0.1, 0.5];
        assert!((min_sum(&a, &b) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-6);
    }
}
