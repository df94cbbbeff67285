use crate::membership::MembershipPolicy;
use crate::Image;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One labelled input to attack.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Sample {
    pub id: usize,
    pub data: Image,
    pub label: usize,
    /// Source file, for debugging only.
    pub filename: String,
}

impl Sample {
    pub fn new(id: usize, data: Image, label: usize, filename: impl Into<String>) -> Self {
        Self {
            id,
            data,
            label,
            filename: filename.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of attacking one sample. This is the record a reporter consumes.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttackResult {
    sample_id: usize,
    original_label: usize,
    final_label: usize,
    is_success: bool,
    queries: usize,
    distance: f64,
    is_member: bool,
    adversarial: Option<Image>,
}

impl AttackResult {
    /// Result of an attack that reached an adversarial point, whether or not the final check
    /// confirmed it.
    pub fn new(
        sample_id: usize,
        original_label: usize,
        final_label: usize,
        queries: usize,
        distance: f64,
        adversarial: Image,
    ) -> Self {
        Self {
            sample_id,
            original_label,
            final_label,
            is_success: final_label != original_label,
            queries,
            distance,
            is_member: false,
            adversarial: Some(adversarial),
        }
    }

    /// Result of an attack that never found an adversarial point.
    pub fn failed(sample_id: usize, original_label: usize, queries: usize) -> Self {
        Self {
            sample_id,
            original_label,
            final_label: original_label,
            is_success: false,
            queries,
            distance: 0.,
            is_member: false,
            adversarial: None,
        }
    }

    /// Copy of this record with the membership verdict filled in by `policy`.
    #[must_use]
    pub fn with_membership<P: MembershipPolicy + ?Sized>(&self, policy: &P) -> Self {
        Self {
            is_member: policy.is_member(self),
            ..self.clone()
        }
    }

    pub const fn sample_id(&self) -> usize {
        self.sample_id
    }

    pub const fn original_label(&self) -> usize {
        self.original_label
    }

    pub const fn final_label(&self) -> usize {
        self.final_label
    }

    pub const fn is_success(&self) -> bool {
        self.is_success
    }

    pub const fn queries(&self) -> usize {
        self.queries
    }

    /// L2 distance between the sample and the adversarial point, computed in `f64`.
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn is_member(&self) -> bool {
        self.is_member
    }

    pub const fn adversarial(&self) -> Option<&Image> {
        self.adversarial.as_ref()
    }
}

impl fmt::Display for AttackResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "sample {}: {} -> {} success={} queries={} distance={:.6} member={}",
            self.sample_id,
            self.original_label,
            self.final_label,
            self.is_success,
            self.queries,
            self.distance,
            self.is_member
        )
    }
}
