//! Membership verdicts from boundary distances.
//!
//! Training samples tend to sit further from the decision boundary than unseen ones, so a
//! large distance to the nearest adversarial point is read as evidence of membership.
use crate::sample::AttackResult;
use serde::{Deserialize, Serialize};

pub trait MembershipPolicy {
    fn is_member(&self, result: &AttackResult) -> bool;
}

impl<F> MembershipPolicy for F
where
    F: Fn(&AttackResult) -> bool,
{
    fn is_member(&self, result: &AttackResult) -> bool {
        self(result)
    }
}

/// Member iff the attack succeeded and its distance is strictly above `threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct DistanceThreshold {
    pub threshold: f64,
}

impl DistanceThreshold {
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl MembershipPolicy for DistanceThreshold {
    fn is_member(&self, result: &AttackResult) -> bool {
        result.is_success() && result.distance() > self.threshold
    }
}
