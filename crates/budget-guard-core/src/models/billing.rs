//! Cloud Billing resource models

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resource name of a project, `projects/<project-id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectName(String);

impl ProjectName {
    /// Build the resource name for a bare project id
    pub fn from_project_id(project_id: &str) -> Self {
        Self(format!("projects/{project_id}"))
    }

    /// The full resource name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Billing information attached to a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBillingInfo {
    /// `projects/<id>/billingInfo`
    #[serde(default)]
    pub name: String,

    /// Bare project id
    #[serde(default)]
    pub project_id: String,

    /// `billingAccounts/<id>`, empty when detached
    #[serde(default)]
    pub billing_account_name: String,

    /// Omitted by the API when false
    #[serde(default)]
    pub billing_enabled: bool,
}

/// Request body for updating a project's billing info
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingInfoUpdate {
    /// Billing account to link; empty detaches billing
    pub billing_account_name: String,
}

impl BillingInfoUpdate {
    /// Update that removes the billing account link
    pub fn detach() -> Self {
        Self {
            billing_account_name: String::new(),
        }
    }
}
