use crate::error::{Result, SignError};

/// Validity used when no ceiling is configured.
pub const DEFAULT_VALIDITY_DAYS: u32 = 3;

/// Largest accepted ceiling. Keeps every `notAfter` well inside the years an
/// X.509 time can encode.
pub const MAX_VALIDITY_DAYS: u32 = 36_500;

/// Resolves how long an issued certificate is valid for.
///
/// The configured ceiling is never exceeded. A requested validity below one
/// day is rejected rather than producing an empty or inverted window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidityPolicy {
    ceiling_days: u32,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        Self {
            ceiling_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

impl ValidityPolicy {
    pub fn new(ceiling_days: u32) -> Result<Self> {
        if ceiling_days == 0 {
            return Err(SignError::StartupFailure(
                "certificate validity ceiling must be at least one day".to_string(),
            ));
        }
        if ceiling_days > MAX_VALIDITY_DAYS {
            return Err(SignError::StartupFailure(format!(
                "certificate validity ceiling of {ceiling_days} days exceeds {MAX_VALIDITY_DAYS}"
            )));
        }
        Ok(Self { ceiling_days })
    }

    pub fn ceiling_days(&self) -> u32 {
        self.ceiling_days
    }

    /// Effective validity in days: `min(requested, ceiling)`, or the ceiling
    /// when nothing was requested.
    pub fn resolve(&self, requested: Option<i64>) -> Result<u32> {
        match requested {
            None => Ok(self.ceiling_days),
            Some(days) if days < 1 => Err(SignError::InvalidValidity(days)),
            Some(days) => Ok(u32::try_from(days)
                .map_or(self.ceiling_days, |days| days.min(self.ceiling_days))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_is_capped_at_ceiling() {
        let policy = ValidityPolicy::new(3).unwrap();
        assert_eq!(policy.resolve(Some(30)).unwrap(), 3);
        assert_eq!(policy.resolve(Some(3)).unwrap(), 3);
        assert_eq!(policy.resolve(Some(2)).unwrap(), 2);
        assert_eq!(policy.resolve(Some(1)).unwrap(), 1);
        assert_eq!(policy.resolve(Some(i64::MAX)).unwrap(), 3);
    }

    #[test]
    fn test_missing_request_uses_ceiling() {
        assert_eq!(ValidityPolicy::new(10).unwrap().resolve(None).unwrap(), 10);
        assert_eq!(ValidityPolicy::default().resolve(None).unwrap(), 3);
    }

    #[test]
    fn test_non_positive_request_is_rejected() {
        let policy = ValidityPolicy::default();
        assert_eq!(policy.resolve(Some(0)), Err(SignError::InvalidValidity(0)));
        assert_eq!(policy.resolve(Some(-5)), Err(SignError::InvalidValidity(-5)));
    }

    #[test]
    fn test_zero_ceiling_is_a_startup_failure() {
        assert!(matches!(
            ValidityPolicy::new(0),
            Err(SignError::StartupFailure(_))
        ));
    }

    #[test]
    fn test_oversized_ceiling_is_a_startup_failure() {
        assert!(matches!(
            ValidityPolicy::new(4_000_000),
            Err(SignError::StartupFailure(_))
        ));
        assert!(matches!(
            ValidityPolicy::new(MAX_VALIDITY_DAYS + 1),
            Err(SignError::StartupFailure(_))
        ));
        assert_eq!(
            ValidityPolicy::new(MAX_VALIDITY_DAYS).unwrap().ceiling_days(),
            MAX_VALIDITY_DAYS
        );
    }
}
