//! Elementwise arithmetic over flattened images.
//!
//! Every function allocates its output, so none of them can alias an input. Two-operand
//! functions panic when the lengths differ.
use crate::{Image, PixelFloat};
use ndarray::{Array1, ArrayView1, Zip};

/// Vector of `size` copies of `value`.
pub fn new(size: usize, value: PixelFloat) -> Image {
    Array1::from_elem(size, value)
}

fn zip_with<F>(op: &str, a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>, f: F) -> Image
where
    F: Fn(PixelFloat, PixelFloat) -> PixelFloat,
{
    assert_eq!(a.len(), b.len(), "{}: vectors must have the same length", op);
    Zip::from(&a).and(&b).map_collect(|&x, &y| f(x, y))
}

/// # Panics
/// If `a` and `b` differ in length.
pub fn add(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> Image {
    zip_with("vector::add", a, b, |x, y| x + y)
}

/// # Panics
/// If `a` and `b` differ in length.
pub fn sub(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> Image {
    zip_with("vector::sub", a, b, |x, y| x - y)
}

/// Hadamard product.
///
/// # Panics
/// If `a` and `b` differ in length.
pub fn mul(a: ArrayView1<PixelFloat>, b: ArrayView1<PixelFloat>) -> Image {
    zip_with("vector::mul", a, b, |x, y| x * y)
}

pub fn scale(v: ArrayView1<PixelFloat>, s: PixelFloat) -> Image {
    v.mapv(|x| x * s)
}

/// Clamp every element into `[lo, hi]`.
pub fn clip(v: ArrayView1<PixelFloat>, lo: PixelFloat, hi: PixelFloat) -> Image {
    v.mapv(|x| {
        if x < lo {
            lo
        } else if x > hi {
            hi
        } else {
            x
        }
    })
}

pub fn clone(v: ArrayView1<PixelFloat>) -> Image {
    v.to_owned()
}
