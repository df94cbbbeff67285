#![cfg(test)]
use crate::Image;
use ndarray::Array1;
use proptest::arbitrary::functor::ArbitraryF1;
use proptest::prelude::*;
use proptest::sample::SizeRange;

prop_compose! {
    pub fn image(len: usize)(v in Vec::lift1_with(-10.0f32 .. 10.0, SizeRange::new(len..=len))) -> Image {
        Array1::from_vec(v)
    }
}

prop_compose! {
    pub fn image_pair(len: usize)(a in image(len), b in image(len)) -> (Image, Image) {
        (a, b)
    }
}

prop_compose! {
    pub fn image_triple(len: usize)(a in image(len), b in image(len), c in image(len)) -> (Image, Image, Image) {
        (a, b, c)
    }
}

prop_compose! {
    pub fn nonzero_image(len: usize)(v in image(len).prop_filter("zero norm", |v| v.iter().any(|x| x.abs() > 1e-3))) -> Image {
        v
    }
}
