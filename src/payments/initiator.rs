use std::sync::Arc;

use crate::{
    domain::{Charge, CreateChargeRequest},
    error::{AppError, Result},
    payments::PaymentGateway,
};

/// Creates charges. Gateway failures collapse into one generic error and are
/// never retried here; the caller resubmits.
pub struct ChargeInitiator {
    gateway: Arc<dyn PaymentGateway>,
}

impl ChargeInitiator {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    pub async fn create(&self, request: &CreateChargeRequest) -> Result<Charge> {
        if request.amount <= 0 {
            return Err(AppError::Validation(
                "amount must be a positive number of minor units".to_string(),
            ));
        }
        if request.currency.trim().is_empty() {
            return Err(AppError::Validation("currency is required".to_string()));
        }

        let charge = self.gateway
            .create_charge(request)
            .await
            .map_err(|e| {
                tracing::error!("Charge creation failed: {}", e);
                AppError::Payment("Failed to create payment".to_string())
            })?;

        if charge.id.is_empty() {
            tracing::error!("Gateway returned a charge without an id");
            return Err(AppError::Payment("Failed to create payment".to_string()));
        }

        if request.source.is_promptpay() && charge.qr_image_url().is_none() {
            tracing::error!("Charge {} has no scannable code", charge.id);
            return Err(AppError::Payment("QR code not generated".to_string()));
        }

        tracing::info!(
            "Created charge {} for {} {} ({})",
            charge.id, request.amount, request.currency, charge.status.as_str()
        );

        Ok(charge)
    }
}
