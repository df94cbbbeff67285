//! The label-only view of a classifier, and the query-budget wrapper the attack drives it through.
use crate::{Image, PixelFloat};
use log::{trace, warn};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A classifier that only reveals its top-1 label.
pub trait Oracle {
    /// # Errors
    /// Whatever the model backend fails with, e.g. a transport failure.
    fn predict(&self, input: ArrayView1<PixelFloat>) -> Result<usize, OracleError>;

    /// Labels for several inputs in one round trip, one outcome per input and in input order.
    /// Every input counts as sent, failed or not; a failure of the whole round trip is one
    /// `Err` per input. The default issues one `predict` per input.
    fn predict_batch(&self, inputs: &[Image]) -> Vec<Result<usize, OracleError>> {
        inputs.iter().map(|x| self.predict(x.view())).collect()
    }

    /// Length of the flattened input the model expects.
    fn input_size(&self) -> usize;
}

impl<T: Oracle + ?Sized> Oracle for &T {
    fn predict(&self, input: ArrayView1<PixelFloat>) -> Result<usize, OracleError> {
        (**self).predict(input)
    }

    fn predict_batch(&self, inputs: &[Image]) -> Vec<Result<usize, OracleError>> {
        (**self).predict_batch(inputs)
    }

    fn input_size(&self) -> usize {
        (**self).input_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleError {
    Transport { message: String },
    InvalidInput { expected: usize, given: usize },
    BatchSizeMismatch { expected: usize, given: usize },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "oracle transport failure: {}", message),
            Self::InvalidInput { expected, given } => write!(
                f,
                "oracle expected input of length {}, got {}",
                expected, given
            ),
            Self::BatchSizeMismatch { expected, given } => write!(
                f,
                "oracle returned {} labels for a batch of {}",
                given, expected
            ),
        }
    }
}

impl std::error::Error for OracleError {}

/// What the attack does when the oracle fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorPolicy {
    /// Stop the attack and report the failure.
    Abort,
    /// Count the query and read it as "boundary not crossed".
    TreatAsNonAdversarial,
}

impl Default for OracleErrorPolicy {
    fn default() -> Self {
        Self::Abort
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    BudgetExhausted { max_queries: usize },
    Oracle(OracleError),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BudgetExhausted { max_queries } => {
                write!(f, "query budget of {} exhausted", max_queries)
            }
            Self::Oracle(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Oracle(err) => Some(err),
            Self::BudgetExhausted { .. } => None,
        }
    }
}

impl From<OracleError> for QueryError {
    fn from(err: OracleError) -> Self {
        Self::Oracle(err)
    }
}

/// Counts every call made to the wrapped oracle and refuses calls past `max_queries`.
///
/// Failed calls are counted too. Under [`OracleErrorPolicy::TreatAsNonAdversarial`] a failed
/// call answers with `fallback_label`, which the attack sets to the label it is trying to leave.
pub struct CountingOracle<'a, O: Oracle + ?Sized> {
    inner: &'a O,
    queries: usize,
    max_queries: usize,
    policy: OracleErrorPolicy,
    fallback_label: usize,
}

impl<'a, O: Oracle + ?Sized> CountingOracle<'a, O> {
    pub fn new(
        inner: &'a O,
        max_queries: usize,
        policy: OracleErrorPolicy,
        fallback_label: usize,
    ) -> Self {
        Self {
            inner,
            queries: 0,
            max_queries,
            policy,
            fallback_label,
        }
    }

    pub const fn queries(&self) -> usize {
        self.queries
    }

    pub const fn max_queries(&self) -> usize {
        self.max_queries
    }

    pub const fn remaining(&self) -> usize {
        self.max_queries.saturating_sub(self.queries)
    }

    pub const fn is_exhausted(&self) -> bool {
        self.queries >= self.max_queries
    }

    pub fn input_size(&self) -> usize {
        self.inner.input_size()
    }

    /// # Errors
    /// `BudgetExhausted` without calling the oracle once the budget is spent, and `Oracle` when
    /// the call fails under [`OracleErrorPolicy::Abort`].
    pub fn predict(&mut self, input: ArrayView1<PixelFloat>) -> Result<usize, QueryError> {
        if self.is_exhausted() {
            return Err(QueryError::BudgetExhausted {
                max_queries: self.max_queries,
            });
        }
        self.queries += 1;
        trace!("query {}/{}", self.queries, self.max_queries);
        match self.inner.predict(input) {
            Ok(label) => Ok(label),
            Err(err) => self.recover(err),
        }
    }

    /// Predicts as many of `inputs`, from the front, as the remaining budget allows. The
    /// returned labels may therefore be fewer than the inputs.
    ///
    /// Each input is charged and, on failure, handled by the error policy on its own, exactly as
    /// if it had gone through [`CountingOracle::predict`]. Under `Abort` the first failure is
    /// returned once the whole batch has been charged, since every input in it was sent.
    ///
    /// # Errors
    /// As for [`CountingOracle::predict`]; `BudgetExhausted` only when no input could be sent.
    /// A reply with the wrong number of outcomes is a `BatchSizeMismatch` for the whole batch.
    pub fn predict_batch(&mut self, inputs: &[Image]) -> Result<Vec<usize>, QueryError> {
        if inputs.is_empty() {
            return Ok(vec![]);
        }
        let n = inputs.len().min(self.remaining());
        if n == 0 {
            return Err(QueryError::BudgetExhausted {
                max_queries: self.max_queries,
            });
        }
        let outcomes = self.inner.predict_batch(&inputs[..n]);
        self.queries += n;
        trace!("batch of {} queries, {}/{}", n, self.queries, self.max_queries);
        if outcomes.len() != n {
            let err = OracleError::BatchSizeMismatch {
                expected: n,
                given: outcomes.len(),
            };
            return self.recover(err).map(|label| vec![label; n]);
        }
        outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(label) => Ok(label),
                Err(err) => self.recover(err),
            })
            .collect()
    }

    fn recover(&self, err: OracleError) -> Result<usize, QueryError> {
        match self.policy {
            OracleErrorPolicy::Abort => Err(QueryError::Oracle(err)),
            OracleErrorPolicy::TreatAsNonAdversarial => {
                warn!(
                    "oracle error after {} queries treated as label {}: {}",
                    self.queries, self.fallback_label, err
                );
                Ok(self.fallback_label)
            }
        }
    }
}
