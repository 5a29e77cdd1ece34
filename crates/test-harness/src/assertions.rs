//! Assertion helpers: the first failing verdict becomes a harness error.

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Fail with the verdict's detail unless it passed.
pub fn require(verdict: &OracleVerdict) -> Result<(), HarnessError> {
    if verdict.passed {
        Ok(())
    } else {
        Err(HarnessError::AssertionFailed {
            detail: format!("[{}] {}", verdict.oracle_name, verdict.detail),
        })
    }
}

/// Require every verdict in order, halting at the first failure.
pub fn require_all<'a>(
    verdicts: impl IntoIterator<Item = &'a OracleVerdict>,
) -> Result<(), HarnessError> {
    verdicts.into_iter().try_for_each(require)
}

/// Collect the failing verdicts, for reports that list every problem at once.
pub fn failures(verdicts: &[OracleVerdict]) -> Vec<&OracleVerdict> {
    verdicts.iter().filter(|v| !v.passed).collect()
}
