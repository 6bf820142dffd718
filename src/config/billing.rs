//! Billing lifecycle configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Billing lifecycle configuration.
///
/// Controls the durations the lifecycle handlers stamp onto subscriptions
/// they create or escalate. Webhook-driven reconciliation takes its period
/// dates from the provider event instead.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Length of the trial window for new trial subscriptions, in days.
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,

    /// Billing period length assumed for internally created subscriptions,
    /// in days. Overwritten by provider period dates on first webhook.
    #[serde(default = "default_period_days")]
    pub default_period_days: u32,

    /// How long a delinquent subscription keeps access once escalated to
    /// the grace period, in days.
    #[serde(default = "default_grace_period_days")]
    pub grace_period_days: u32,
}

fn default_trial_days() -> u32 {
    14
}

fn default_period_days() -> u32 {
    30
}

fn default_grace_period_days() -> u32 {
    14
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            default_period_days: default_period_days(),
            grace_period_days: default_grace_period_days(),
        }
    }
}

impl BillingConfig {
    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.trial_days == 0 || self.trial_days > 365 {
            return Err(ValidationError::InvalidTrialLength);
        }
        if self.default_period_days == 0 || self.default_period_days > 365 {
            return Err(ValidationError::InvalidPeriodLength);
        }
        if self.grace_period_days == 0 || self.grace_period_days > 90 {
            return Err(ValidationError::InvalidGracePeriod);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BillingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trial_days, 14);
        assert_eq!(config.default_period_days, 30);
        assert_eq!(config.grace_period_days, 14);
    }

    #[test]
    fn zero_trial_days_is_rejected() {
        let config = BillingConfig {
            trial_days: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTrialLength)
        ));
    }

    #[test]
    fn oversized_grace_period_is_rejected() {
        let config = BillingConfig {
            grace_period_days: 120,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidGracePeriod)
        ));
    }

    #[test]
    fn period_length_bounds_are_enforced() {
        let config = BillingConfig {
            default_period_days: 400,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidPeriodLength)
        ));
    }
}
