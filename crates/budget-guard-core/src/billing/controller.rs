//! Billing status checks and the disable mutation

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{BillingApi, BillingError};
use crate::models::{BillingInfoUpdate, ProjectName};

/// Status reported when the billing API cannot be queried.
///
/// Unknown status must never suppress a disable attempt.
pub const ASSUME_ENABLED_WHEN_UNKNOWN: bool = true;

/// Result of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Billing was enabled and has now been detached
    Disabled,
    /// Billing was already detached; nothing was changed
    AlreadyDisabled,
}

/// Checks and detaches billing for the guarded project
#[derive(Clone)]
pub struct BillingController {
    api: Arc<dyn BillingApi>,
    project: ProjectName,
}

impl BillingController {
    /// Create a controller for `project`
    pub fn new(api: Arc<dyn BillingApi>, project: ProjectName) -> Self {
        Self { api, project }
    }

    /// The guarded project
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Whether billing is enabled, falling back to
    /// [`ASSUME_ENABLED_WHEN_UNKNOWN`] when the API call fails
    pub async fn is_billing_enabled(&self, project: &ProjectName) -> bool {
        match self.api.get_project_billing_info(project).await {
            Ok(info) => info.billing_enabled,
            Err(e) => {
                error!(
                    project = %project,
                    error = %e,
                    assumed_enabled = ASSUME_ENABLED_WHEN_UNKNOWN,
                    "Unable to determine if billing is enabled on project"
                );
                ASSUME_ENABLED_WHEN_UNKNOWN
            }
        }
    }

    /// Detach the billing account from `project`
    pub async fn disable_billing(&self, project: &ProjectName) -> Result<(), BillingError> {
        self.api
            .update_project_billing_info(project, &BillingInfoUpdate::detach())
            .await
            .map(|_| ())
            .map_err(|e| {
                error!(project = %project, error = %e, "Unable to disable billing for project");
                e
            })
    }

    /// Disable billing for the guarded project unless it is already off
    pub async fn stop_billing(&self) -> Result<StopOutcome, BillingError> {
        if !self.is_billing_enabled(&self.project).await {
            info!(project = %self.project, "Billing is already disabled");
            return Ok(StopOutcome::AlreadyDisabled);
        }

        warn!(project = %self.project, "Billing is enabled, disabling now");
        self.disable_billing(&self.project).await?;
        info!(project = %self.project, "Billing disabled");

        Ok(StopOutcome::Disabled)
    }
}
