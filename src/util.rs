use crate::{errors::RcfError, types::Result};

/// If the test condition is false, return an InvalidArgument error with
/// the given error message. Otherwise return Ok.
pub(crate) fn check_argument(test: bool, msg: &'static str) -> Result<()> {
    if test {
        Ok(())
    } else {
        Err(RcfError::InvalidArgument { msg })
    }
}

/// Arithmetic mean of a slice of scores. Zero for an empty slice.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_argument_reports_message() {
        assert_eq!(check_argument(true, "unused"), Ok(()));
        assert_eq!(
            check_argument(false, "num_trees must be positive"),
            Err(RcfError::InvalidArgument { msg: "num_trees must be positive" })
        );
    }

    #[test]
    fn mean_of_scores() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[0.25, 0.75]), 0.5);
    }
}
