use monocal_core::Real;
use serde::{Deserialize, Serialize};

/// Termination criteria for the minimiser.
///
/// `epsilon` is used as both the relative cost and the relative step
/// tolerance. `max_iters` bounds the number of Jacobian evaluations; the
/// backend follows the MINPACK convention of `max_iters * (n + 1)` residual
/// evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermCriteria {
    pub max_iters: usize,
    pub epsilon: Real,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iters: 100,
            epsilon: 1e-12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let c: TermCriteria = serde_json::from_str(r#"{"max_iters": 30}"#).unwrap();
        assert_eq!(c.max_iters, 30);
        assert_eq!(c.epsilon, 1e-12);
    }
}
