//! Outermost boundary for inbound budget alerts

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use super::evaluator::{BudgetEvaluator, Outcome};
use crate::billing::{BillingApi, BillingController, CloudBillingClient};
use crate::config::{Config, HandlerFailurePolicy};
use crate::error::Result;
use crate::models::BudgetAlertMessage;

/// Runs the evaluation chain for one delivered message
#[derive(Clone)]
pub struct MessageHandler {
    evaluator: BudgetEvaluator,
    on_failure: HandlerFailurePolicy,
}

impl MessageHandler {
    /// Create a handler applying `on_failure` to evaluation errors
    pub fn new(evaluator: BudgetEvaluator, on_failure: HandlerFailurePolicy) -> Self {
        Self {
            evaluator,
            on_failure,
        }
    }

    /// Wire the production chain: Cloud Billing client, controller, evaluator
    pub fn from_config(config: &Config) -> Result<Self> {
        let client: Arc<dyn BillingApi> = Arc::new(CloudBillingClient::new(&config.billing)?);
        let controller = BillingController::new(client, config.project_name());

        Ok(Self::new(
            BudgetEvaluator::new(controller),
            config.policy.on_failure,
        ))
    }

    /// The evaluator messages are run through
    pub fn evaluator(&self) -> &BudgetEvaluator {
        &self.evaluator
    }

    /// The configured failure policy
    pub fn failure_policy(&self) -> HandlerFailurePolicy {
        self.on_failure
    }

    /// Handle one budget alert payload
    ///
    /// Returns `Ok(None)` when the message could not be processed but should
    /// still be acknowledged: payloads that are not a budget alert object, and
    /// evaluation failures under [`HandlerFailurePolicy::Swallow`]. Under
    /// [`HandlerFailurePolicy::Propagate`] evaluation failures are returned.
    pub async fn handle(&self, payload: &Value) -> Result<Option<Outcome>> {
        let message = match BudgetAlertMessage::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                error!(error = %e, data = %payload, "Error receiving data from pubsub");
                return Ok(None);
            }
        };

        match self.evaluator.evaluate(&message).await {
            Ok(outcome) => {
                info!(outcome = %outcome, "Budget alert handled");
                Ok(Some(outcome))
            }
            Err(e) => {
                error!(
                    error = %e,
                    data = %payload,
                    policy = ?self.on_failure,
                    "Error receiving data from pubsub"
                );
                match self.on_failure {
                    HandlerFailurePolicy::Swallow => Ok(None),
                    HandlerFailurePolicy::Propagate => Err(e),
                }
            }
        }
    }
}
