//! Budget alert decision logic

use std::fmt;

use tracing::{debug, info, warn};

use crate::billing::{BillingController, StopOutcome};
use crate::models::{BudgetAlertMessage, ProjectName};

/// Spend, in the budget's currency, at which billing is disabled
pub const SPEND_THRESHOLD: f64 = 50.0;

/// What happened to a budget alert
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The alert carried no cost amount; the publisher is misbehaving
    AmountUndefined,
    /// Spend is below the threshold and the provider flag is not set
    NoAction {
        /// Reported spend
        cost_amount: f64,
    },
    /// Billing was detached from the project
    BillingDisabled {
        /// The project that lost its billing account
        project: ProjectName,
    },
    /// Billing was already detached
    AlreadyDisabled,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmountUndefined => {
                f.write_str("Amount spent is undefined - this is weird - report to admin")
            }
            Self::NoAction { cost_amount } => {
                write!(f, "No action necessary. (Current cost: {cost_amount})")
            }
            Self::BillingDisabled { project } => {
                write!(f, "Billing has been disabled for the project: {project}")
            }
            Self::AlreadyDisabled => f.write_str("Billing is already disabled"),
        }
    }
}

/// Decides whether a budget alert warrants disabling billing
#[derive(Clone)]
pub struct BudgetEvaluator {
    controller: BillingController,
}

impl BudgetEvaluator {
    /// Create an evaluator that escalates to `controller`
    pub fn new(controller: BillingController) -> Self {
        Self { controller }
    }

    /// The controller escalations go to
    pub fn controller(&self) -> &BillingController {
        &self.controller
    }

    /// Evaluate one alert, disabling billing when spend is too high
    pub async fn evaluate(&self, message: &BudgetAlertMessage) -> crate::error::Result<Outcome> {
        let Some(cost_amount) = message.cost_amount else {
            warn!(
                budget = message.budget_display_name.as_deref().unwrap_or_default(),
                "Amount spent is undefined - this is weird - report to admin"
            );
            return Ok(Outcome::AmountUndefined);
        };

        let threshold_exceeded = message.threshold_exceeded();

        debug!(
            cost_amount,
            threshold = SPEND_THRESHOLD,
            threshold_exceeded,
            currency = message.currency_code.as_deref().unwrap_or_default(),
            "Evaluating budget alert"
        );

        if !should_escalate(cost_amount, threshold_exceeded) {
            info!(cost_amount, "No action necessary");
            return Ok(Outcome::NoAction { cost_amount });
        }

        warn!(
            cost_amount,
            threshold_exceeded,
            project = %self.controller.project(),
            "Spend threshold reached, stopping billing"
        );

        let outcome = match self.controller.stop_billing().await? {
            StopOutcome::Disabled => Outcome::BillingDisabled {
                project: self.controller.project().clone(),
            },
            StopOutcome::AlreadyDisabled => Outcome::AlreadyDisabled,
        };

        Ok(outcome)
    }
}

/// Either signal alone is enough to escalate
pub fn should_escalate(cost_amount: f64, threshold_exceeded: bool) -> bool {
    cost_amount >= SPEND_THRESHOLD || threshold_exceeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::testing::FakeBilling;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn evaluator(fake: &Arc<FakeBilling>) -> BudgetEvaluator {
        BudgetEvaluator::new(BillingController::new(
            fake.clone(),
            ProjectName::from_project_id("demo-project"),
        ))
    }

    fn message(payload: Value) -> BudgetAlertMessage {
        BudgetAlertMessage::from_value(&payload).unwrap()
    }

    #[rstest]
    #[case(0.0, false, false)]
    #[case(49.99, false, false)]
    #[case(50.0, false, true)]
    #[case(6000.0, false, true)]
    #[case(10.0, true, true)]
    fn test_should_escalate(#[case] cost: f64, #[case] flag: bool, #[case] expected: bool) {
        assert_eq!(should_escalate(cost, flag), expected);
    }

    #[tokio::test]
    async fn test_low_cost_takes_no_action() {
        let fake = Arc::new(FakeBilling::enabled());

        let outcome = evaluator(&fake)
            .evaluate(&message(json!({ "costAmount": 10 })))
            .await
            .unwrap();

        assert_eq!(outcome.to_string(), "No action necessary. (Current cost: 10)");
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_high_cost_disables_billing() {
        let fake = Arc::new(FakeBilling::enabled());

        let outcome = evaluator(&fake)
            .evaluate(&message(json!({ "costAmount": 6000 })))
            .await
            .unwrap();

        assert_eq!(
            outcome.to_string(),
            "Billing has been disabled for the project: projects/demo-project"
        );
        assert_eq!(fake.status_calls(), 1);
        assert_eq!(fake.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_high_cost_already_disabled() {
        let fake = Arc::new(FakeBilling::disabled());

        let outcome = evaluator(&fake)
            .evaluate(&message(json!({ "costAmount": 6000 })))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::AlreadyDisabled);
        assert_eq!(outcome.to_string(), "Billing is already disabled");
        assert_eq!(fake.status_calls(), 1);
        assert_eq!(fake.update_calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_flag_escalates_low_cost() {
        let fake = Arc::new(FakeBilling::enabled());

        let outcome = evaluator(&fake)
            .evaluate(&message(json!({ "alertThresholdExceeded": 1, "costAmount": 10 })))
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::BillingDisabled { .. }));
        assert_eq!(fake.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_amount_is_anomaly() {
        let fake = Arc::new(FakeBilling::enabled());

        let outcome = evaluator(&fake).evaluate(&message(json!({}))).await.unwrap();

        assert_eq!(outcome, Outcome::AmountUndefined);
        assert_eq!(
            outcome.to_string(),
            "Amount spent is undefined - this is weird - report to admin"
        );
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_amount_wins_over_flag() {
        let fake = Arc::new(FakeBilling::enabled());

        let outcome = evaluator(&fake)
            .evaluate(&message(json!({ "alertThresholdExceeded": 1 })))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::AmountUndefined);
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_second_run_sees_disabled_billing() {
        let fake = Arc::new(FakeBilling::enabled());
        let evaluator = evaluator(&fake);
        let alert = message(json!({ "costAmount": 6000 }));

        let first = evaluator.evaluate(&alert).await.unwrap();
        let second = evaluator.evaluate(&alert).await.unwrap();

        assert!(matches!(first, Outcome::BillingDisabled { .. }));
        assert_eq!(second, Outcome::AlreadyDisabled);
        assert_eq!(fake.status_calls(), 2);
        assert_eq!(fake.update_calls(), 1);
    }

    #[tokio::test]
    async fn test_disable_failure_propagates() {
        let fake = Arc::new(FakeBilling::enabled().failing_update());

        let err = evaluator(&fake)
            .evaluate(&message(json!({ "costAmount": 6000 })))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Billing(_)));
    }
}
