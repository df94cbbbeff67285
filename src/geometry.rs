use crate::distance::l2_norm;
use crate::{Image, PixelFloat};
use ndarray::{Array1, ArrayView1, Zip};

/// Norms below this are treated as zero by [`normalize`].
pub const NORM_EPSILON: f64 = 1e-12;

/// Point `a + (b - a) * t`. `t` is not clamped.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn interpolate(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>, t: PixelFloat) -> Image {
    assert_eq!(a.len(), b.len(), "geometry::interpolate: input lengths differ");
    Zip::from(&a).and(&b).map_collect(|&x, &y| x + (y - x) * t)
}

/// Unit vector in the direction of `v`, or the zero vector when `v` has (near) zero norm.
pub fn normalize(v: ArrayView1<PixelFloat>) -> Image {
    let norm = l2_norm(v);
    if norm < NORM_EPSILON {
        return Array1::zeros(v.len());
    }
    #[allow(clippy::cast_possible_truncation)]
    let scale = 1.0 / norm as PixelFloat;
    v.mapv(|x| x * scale)
}

/// Shrinks `v` onto the L2 ball of `radius`. Vectors already inside are copied unchanged.
#[allow(clippy::cast_possible_truncation)]
pub fn project_to_sphere(v: ArrayView1<PixelFloat>, radius: PixelFloat) -> Image {
    let norm = l2_norm(v);
    if norm <= f64::from(radius) {
        return v.to_owned();
    }
    let scale = f64::from(radius) / norm;
    v.mapv(|x| (f64::from(x) * scale) as PixelFloat)
}

/// Cosine of the angle between `a` and `b`; zero if either has zero norm.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn cosine_sim(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> f64 {
    assert_eq!(a.len(), b.len(), "geometry::cosine_sim: input lengths differ");
    let (dot, norm_a_sq, norm_b_sq) =
        Zip::from(&a)
            .and(&b)
            .fold((0f64, 0f64, 0f64), |(dot, na, nb), &x, &y| {
                let (x, y) = (f64::from(x), f64::from(y));
                (dot + x * y, na + x * x, nb + y * y)
            });
    if norm_a_sq == 0. || norm_b_sq == 0. {
        return 0.;
    }
    dot / (norm_a_sq.sqrt() * norm_b_sq.sqrt())
}
