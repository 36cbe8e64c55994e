use thiserror::Error;

/// Failures raised at call entry, before any output is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

impl SimulationError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Returns an invalid-argument error for `name` unless `condition` holds.
pub(crate) fn require(
    condition: bool,
    name: &'static str,
    reason: impl Into<String>,
) -> anyhow::Result<()> {
    if condition {
        Ok(())
    } else {
        Err(SimulationError::invalid(name, reason).into())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SimulationError;

    pub fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    pub fn assert_invalid_argument<T: std::fmt::Debug>(
        result: anyhow::Result<T>,
        expected_name: &str,
    ) {
        let err = result.expect_err("expected invalid-argument error");
        match err.downcast_ref::<SimulationError>() {
            Some(SimulationError::InvalidArgument { name, .. }) => {
                assert_eq!(*name, expected_name, "unexpected argument in \"{err}\"")
            }
            None => panic!("expected SimulationError, got \"{err}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_passes_when_condition_holds() {
        assert!(require(true, "steps", "unused").is_ok());
    }

    #[test]
    fn require_reports_argument_name_and_reason() {
        let err = require(false, "steps", "must be at least 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument `steps`: must be at least 1"
        );
        assert!(matches!(
            err.downcast_ref::<SimulationError>(),
            Some(SimulationError::InvalidArgument { name: "steps", .. })
        ));
    }
}
