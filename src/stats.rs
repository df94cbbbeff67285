//! Small statistics over label scores and batches of images.
use crate::{Image, PixelFloat};
use ndarray::{Array1, ArrayView1};
use ndarray_stats::QuantileExt;

/// Index of the first maximum, or `None` for empty input or input containing NaN.
pub fn arg_max(probs: ArrayView1<PixelFloat>) -> Option<usize> {
    probs.argmax().ok()
}

/// Elementwise mean of a batch, accumulated in `f64`. `None` for an empty batch.
///
/// # Panics
/// If the vectors do not all have the same length.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn mean_vector(vectors: &[Image]) -> Option<Image> {
    let first = vectors.first()?;
    let mut sum = Array1::<f64>::zeros(first.len());
    for v in vectors {
        assert_eq!(
            v.len(),
            first.len(),
            "stats::mean_vector: input lengths differ"
        );
        sum.zip_mut_with(v, |acc, &x| *acc += f64::from(x));
    }
    let rows = vectors.len() as f64;
    Some(sum.mapv(|x| (x / rows) as PixelFloat))
}

/// Probability distribution from unnormalised scores. The largest score is subtracted before
/// exponentiating so large logits do not overflow.
#[allow(clippy::cast_possible_truncation)]
pub fn softmax(logits: ArrayView1<PixelFloat>) -> Image {
    if logits.is_empty() {
        return Array1::zeros(0);
    }
    let max_logit = *logits.max_skipnan();
    let exps = logits.mapv(|x| f64::from(x - max_logit).exp());
    let total = exps.sum();
    exps.mapv(|x| (x / total) as PixelFloat)
}
