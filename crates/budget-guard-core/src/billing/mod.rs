//! Cloud Billing integration
//!
//! [`BillingApi`] is the seam between the decision logic and the provider. The
//! production implementation is [`CloudBillingClient`]; it is built once at
//! startup and shared behind an `Arc`.

mod auth;
mod client;
mod controller;

pub use auth::{AccessTokenProvider, TokenSource};
pub use client::CloudBillingClient;
pub use controller::{BillingController, StopOutcome, ASSUME_ENABLED_WHEN_UNKNOWN};

use crate::models::{BillingInfoUpdate, ProjectBillingInfo, ProjectName};

/// Cloud Billing errors
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Operations against a project's billing info
#[async_trait::async_trait]
pub trait BillingApi: Send + Sync {
    /// Fetch the billing info of a project
    async fn get_project_billing_info(
        &self,
        project: &ProjectName,
    ) -> Result<ProjectBillingInfo, BillingError>;

    /// Replace the billing info of a project
    async fn update_project_billing_info(
        &self,
        project: &ProjectName,
        update: &BillingInfoUpdate,
    ) -> Result<ProjectBillingInfo, BillingError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;

    /// In-memory billing API that counts calls
    pub struct FakeBilling {
        enabled: Mutex<bool>,
        fail_status: bool,
        fail_update: bool,
        status_calls: AtomicUsize,
        update_calls: AtomicUsize,
    }

    impl FakeBilling {
        pub fn enabled() -> Self {
            Self::with_state(true)
        }

        pub fn disabled() -> Self {
            Self::with_state(false)
        }

        fn with_state(enabled: bool) -> Self {
            Self {
                enabled: Mutex::new(enabled),
                fail_status: false,
                fail_update: false,
                status_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
            }
        }

        pub fn failing_status(mut self) -> Self {
            self.fail_status = true;
            self
        }

        pub fn failing_update(mut self) -> Self {
            self.fail_update = true;
            self
        }

        pub fn status_calls(&self) -> usize {
            self.status_calls.load(Ordering::SeqCst)
        }

        pub fn update_calls(&self) -> usize {
            self.update_calls.load(Ordering::SeqCst)
        }

        pub fn total_calls(&self) -> usize {
            self.status_calls() + self.update_calls()
        }

        pub fn is_enabled(&self) -> bool {
            *self.enabled.lock()
        }

        fn info(&self, project: &ProjectName) -> ProjectBillingInfo {
            let enabled = *self.enabled.lock();
            ProjectBillingInfo {
                name: format!("{project}/billingInfo"),
                project_id: project.as_str().trim_start_matches("projects/").to_string(),
                billing_account_name: if enabled {
                    "billingAccounts/000000-000000-000000".to_string()
                } else {
                    String::new()
                },
                billing_enabled: enabled,
            }
        }
    }

    fn permission_denied() -> BillingError {
        BillingError::Api {
            status: 403,
            code: "PERMISSION_DENIED".to_string(),
            message: "The caller does not have permission".to_string(),
        }
    }

    #[async_trait::async_trait]
    impl BillingApi for FakeBilling {
        async fn get_project_billing_info(
            &self,
            project: &ProjectName,
        ) -> Result<ProjectBillingInfo, BillingError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_status {
                return Err(permission_denied());
            }
            Ok(self.info(project))
        }

        async fn update_project_billing_info(
            &self,
            project: &ProjectName,
            update: &BillingInfoUpdate,
        ) -> Result<ProjectBillingInfo, BillingError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_update {
                return Err(permission_denied());
            }
            *self.enabled.lock() = !update.billing_account_name.is_empty();
            Ok(self.info(project))
        }
    }
}
