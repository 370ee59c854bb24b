use std::time::Duration;

use credence_proof::ProofScheme;

use crate::validator::ValidationResult;

/// How a batch reacts to a failing item.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Keep processing after a failure; `false` stops at the first one.
    pub continue_on_error: bool,
    /// Scheme applied to requests that did not name one.
    pub default_proof_scheme: Option<ProofScheme>,
}

/// A failed batch item, carrying the original request for attribution.
#[derive(Debug, Clone)]
pub struct BatchItemError<R> {
    pub request: R,
    pub message: String,
    pub code: String,
}

/// Aggregate outcome of a batch operation. Successes and errors keep the
/// processing order of the input list.
#[derive(Debug, Clone)]
pub struct BatchResult<T, R> {
    pub successes: Vec<T>,
    pub errors: Vec<BatchItemError<R>>,
    pub continue_on_error: bool,
}

impl<T, R> BatchResult<T, R> {
    pub fn new(continue_on_error: bool) -> Self {
        Self {
            successes: Vec::new(),
            errors: Vec::new(),
            continue_on_error,
        }
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Permissive success policy: a batch run with `continue_on_error`
    /// counts as successful when any item succeeded. Callers alerting on
    /// batch failure should inspect `error_count` as well.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() || (self.continue_on_error && !self.successes.is_empty())
    }
}

/// Per-item validation results of a batch verification.
#[derive(Debug)]
pub struct BatchVerificationResult {
    pub results: Vec<ValidationResult>,
    pub elapsed: Duration,
}

impl BatchVerificationResult {
    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_valid).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.results.len() - self.valid_count()
    }
}
