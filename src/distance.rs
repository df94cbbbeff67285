//! Distance metrics between flattened images.
//!
//! Squared differences are accumulated in `f64`. Rounding in `f32` over a few thousand pixels
//! biases the L2 distance, and L2 is the number the membership decision is made on.
use crate::PixelFloat;
use float_cmp::approx_eq;
use ndarray::{ArrayView1, Zip};

fn check_len(op: &str, a: &ArrayView1<PixelFloat>, b: &ArrayView1<PixelFloat>) {
    assert_eq!(a.len(), b.len(), "{}: input lengths differ", op);
}

/// Euclidean distance.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn l2_distance(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> f64 {
    check_len("distance::l2_distance", &a, &b);
    Zip::from(&a)
        .and(&b)
        .fold(0f64, |acc, &x, &y| {
            let diff = f64::from(x - y);
            acc + diff * diff
        })
        .sqrt()
}

pub fn l2_norm(v: ArrayView1<PixelFloat>) -> f64 {
    v.fold(0f64, |acc, &x| acc + f64::from(x) * f64::from(x))
        .sqrt()
}

/// Largest absolute elementwise difference.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn linf_distance(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> f64 {
    check_len("distance::linf_distance", &a, &b);
    Zip::from(&a).and(&b).fold(0f64, |acc, &x, &y| {
        let diff = f64::from(x - y).abs();
        if diff > acc {
            diff
        } else {
            acc
        }
    })
}

/// Number of positions where `a` and `b` are not exactly equal.
///
/// Noise left behind by clipping or interpolation counts as a change. Use
/// [`l0_distance_with_tolerance`] to ignore it.
///
/// # Panics
/// If `a` and `b` differ in length.
#[allow(clippy::float_cmp)]
pub fn l0_distance(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> usize {
    check_len("distance::l0_distance", &a, &b);
    Zip::from(&a)
        .and(&b)
        .fold(0, |acc, &x, &y| if x == y { acc } else { acc + 1 })
}

/// Number of positions where `a` and `b` differ by more than `eps`.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn l0_distance_with_tolerance(
    a: ArrayView1<PixelFloat>,
    b: ArrayView1<PixelFloat>,
    eps: PixelFloat,
) -> usize {
    check_len("distance::l0_distance_with_tolerance", &a, &b);
    Zip::from(&a).and(&b).fold(0, |acc, &x, &y| {
        if approx_eq!(f32, x, y, epsilon = eps) {
            acc
        } else {
            acc + 1
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::assert_le;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_known_distances() {
        let a = array![0.0, 0.0, 0.0];
        let b = array![3.0, 4.0, 0.0];
        assert_abs_diff_eq!(l2_distance(a.view(), b.view()), 5.0);
        assert_abs_diff_eq!(l2_norm(b.view()), 5.0);
        assert_abs_diff_eq!(linf_distance(a.view(), b.view()), 4.0);
        assert_eq!(l0_distance(a.view(), b.view()), 2);
    }

    #[test]
    fn test_l0_tolerance_ignores_noise() {
        let a = array![0.5, 0.25, 1.0];
        let b = array![0.5 + 1e-7, 0.25, 0.0];
        assert_eq!(l0_distance(a.view(), b.view()), 2);
        assert_eq!(l0_distance_with_tolerance(a.view(), b.view(), 1e-6), 1);
    }

    #[test]
    #[should_panic(expected = "distance::l2_distance")]
    fn test_l2_length_mismatch_panics() {
        l2_distance(array![1.0].view(), array![1.0, 2.0].view());
    }

    #[test]
    fn test_l2_accumulates_in_double_precision() {
        // 3072 pixels each off by 1e-4: f32 accumulation drifts, f64 does not.
        let a = ndarray::Array1::<f32>::zeros(crate::FLATTENED_SIZE);
        let b = ndarray::Array1::<f32>::from_elem(crate::FLATTENED_SIZE, 1e-4);
        let expected = (crate::FLATTENED_SIZE as f64).sqrt() * f64::from(1e-4f32);
        assert_abs_diff_eq!(l2_distance(a.view(), b.view()), expected, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn test_l2_self_distance_is_zero(v in image(16)) {
            prop_assert_eq!(l2_distance(v.view(), v.view()), 0.);
        }

        #[test]
        fn test_l2_symmetric((a, b) in image_pair(16)) {
            prop_assert_eq!(l2_distance(a.view(), b.view()), l2_distance(b.view(), a.view()));
        }

        #[test]
        fn test_l2_triangle_inequality((a, b, c) in image_triple(16)) {
            let ab = l2_distance(a.view(), b.view());
            let bc = l2_distance(b.view(), c.view());
            let ac = l2_distance(a.view(), c.view());
            assert_le!(ac, ab + bc + 1e-9);
        }

        #[test]
        fn test_linf_bounded_by_l2((a, b) in image_pair(16)) {
            assert_le!(linf_distance(a.view(), b.view()), l2_distance(a.view(), b.view()) + 1e-9);
        }
    }
}
