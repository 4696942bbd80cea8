use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    domain::{Charge, CreateChargeRequest},
    error::{AppError, Result},
    payments::PaymentGateway,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Omise REST client. Authenticates with the secret key as the basic-auth
/// user and an empty password.
pub struct OmiseClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct OmiseError {
    code: Option<String>,
    message: Option<String>,
}

impl OmiseClient {
    pub fn new(base_url: impl Into<String>, secret_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    async fn read_charge(response: reqwest::Response) -> Result<Charge> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<OmiseError>(&body)
                .ok()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.unwrap_or_else(|| "error".to_string()),
                        e.message.unwrap_or_default()
                    )
                })
                .unwrap_or(body);
            return Err(AppError::External(format!("Omise returned {}: {}", status, detail)));
        }

        response
            .json::<Charge>()
            .await
            .map_err(|e| AppError::External(format!("Unreadable charge from Omise: {}", e)))
    }
}

#[async_trait]
impl PaymentGateway for OmiseClient {
    async fn create_charge(&self, request: &CreateChargeRequest) -> Result<Charge> {
        let response = self.http
            .post(format!("{}/charges", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(request)
            .send()
            .await?;

        Self::read_charge(response).await
    }

    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge> {
        if charge_id.is_empty() || !charge_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(AppError::BadRequest(format!("Invalid charge id: {}", charge_id)));
        }

        let response = self.http
            .get(format!("{}/charges/{}", self.base_url, charge_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        Self::read_charge(response).await
    }
}
