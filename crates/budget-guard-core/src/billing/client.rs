//! Cloud Billing REST client

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::debug;

use super::auth::{AccessTokenProvider, TokenSource};
use super::{BillingApi, BillingError};
use crate::config::BillingConfig;
use crate::models::{BillingInfoUpdate, ProjectBillingInfo, ProjectName};

/// Client for the `projects.getBillingInfo` / `projects.updateBillingInfo` calls
pub struct CloudBillingClient {
    http: Client,
    endpoint: String,
    tokens: AccessTokenProvider,
}

impl CloudBillingClient {
    /// Create a client from configuration
    pub fn new(config: &BillingConfig) -> Result<Self, BillingError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        let tokens = AccessTokenProvider::new(TokenSource::from_config(config), http.clone());

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    fn billing_info_url(&self, project: &ProjectName) -> String {
        format!("{}/{}/billingInfo", self.endpoint, project)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<ProjectBillingInfo, BillingError> {
        let token = self.tokens.token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &body));
        }

        response
            .json::<ProjectBillingInfo>()
            .await
            .map_err(|e| BillingError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl BillingApi for CloudBillingClient {
    async fn get_project_billing_info(
        &self,
        project: &ProjectName,
    ) -> Result<ProjectBillingInfo, BillingError> {
        debug!(project = %project, "Fetching project billing info");
        self.execute(self.http.get(self.billing_info_url(project)))
            .await
    }

    async fn update_project_billing_info(
        &self,
        project: &ProjectName,
        update: &BillingInfoUpdate,
    ) -> Result<ProjectBillingInfo, BillingError> {
        debug!(
            project = %project,
            billing_account = %update.billing_account_name,
            "Updating project billing info"
        );
        self.execute(self.http.put(self.billing_info_url(project)).json(update))
            .await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Google APIs wrap failures as `{"error": {"code", "message", "status"}}`
fn api_error(status: u16, body: &str) -> BillingError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => BillingError::Api {
            status,
            code: envelope.error.status,
            message: envelope.error.message,
        },
        Err(_) => BillingError::Api {
            status,
            code: String::new(),
            message: body.to_string(),
        },
    }
}
