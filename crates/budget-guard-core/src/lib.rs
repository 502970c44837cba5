//! # Budget Guard
//!
//! Automatic billing kill switch for Google Cloud projects.
//!
//! A Cloud Billing budget publishes alerts to a Pub/Sub topic; a push
//! subscription delivers them to this service. When the reported spend reaches
//! the threshold (or the budget flags its own threshold as exceeded), the
//! billing account is detached from the project, which stops further charges.
//! Re-linking billing is done by hand in the console.
//!
//! ## Architecture
//!
//! - **Alerting**: decides whether an alert warrants disabling billing
//! - **Billing**: Cloud Billing REST client and the disable controller
//! - **API**: HTTP endpoint for Pub/Sub push deliveries
//!
//! ## Quick Start
//!
//! ```bash
//! # Serve the push endpoint
//! GCLOUD_PROJECT=my-project budget-guard serve
//!
//! # Feed a single alert through the handler
//! echo '{"costAmount": 6000}' | budget-guard evaluate
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod api;
pub mod billing;
pub mod config;
pub mod error;
pub mod models;

pub use crate::config::Config;
pub use crate::error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::{BudgetEvaluator, MessageHandler, Outcome};
    pub use crate::billing::{BillingApi, BillingController, CloudBillingClient};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
}
