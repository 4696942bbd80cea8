use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Gateway charge status. Anything the gateway adds later maps to `Unknown`
/// and is treated as still in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChargeStatus {
    Pending,
    Successful,
    Failed,
    Expired,
    #[serde(other)]
    Unknown,
}

impl ChargeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChargeStatus::Successful | ChargeStatus::Failed | ChargeStatus::Expired
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeStatus::Pending => "pending",
            ChargeStatus::Successful => "successful",
            ChargeStatus::Failed => "failed",
            ChargeStatus::Expired => "expired",
            ChargeStatus::Unknown => "unknown",
        }
    }
}

/// A charge as returned by the gateway. Fields this service does not read
/// are kept in `extra` so the proxy endpoints pass the object through intact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charge {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: ChargeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ChargeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Charge {
    /// Download URI of the PromptPay QR image, if the source has one.
    pub fn qr_image_url(&self) -> Option<&str> {
        self.source
            .as_ref()
            .and_then(|s| s.scannable_code.as_ref())
            .map(|code| code.image.download_uri.as_str())
    }

    /// Stand-in returned by check-payment when error masking is enabled.
    pub fn synthetic_pending(id: &str, amount: i64, currency: &str) -> Self {
        Self {
            id: id.to_string(),
            amount,
            currency: currency.to_string(),
            status: ChargeStatus::Pending,
            description: None,
            source: None,
            failure_message: None,
            expires_at: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeSource {
    #[serde(rename = "type")]
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scannable_code: Option<ScannableCode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannableCode {
    pub image: ScannableImage,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannableImage {
    pub download_uri: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateChargeRequest {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub source: SourceRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRequest {
    #[serde(rename = "type")]
    pub source_type: String,
}

impl SourceRequest {
    pub fn promptpay() -> Self {
        Self {
            source_type: "promptpay".to_string(),
        }
    }

    pub fn is_promptpay(&self) -> bool {
        self.source_type == "promptpay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_gateway_charge_with_qr_code() {
        let raw = json!({
            "object": "charge",
            "id": "chrg_test_5xyz",
            "amount": 2000,
            "currency": "THB",
            "status": "pending",
            "livemode": false,
            "source": {
                "object": "source",
                "type": "promptpay",
                "scannable_code": {
                    "object": "barcode",
                    "type": "qr",
                    "image": {
                        "object": "document",
                        "download_uri": "https://api.omise.co/charges/chrg_test_5xyz/documents/docu_test/downloads/ABC"
                    }
                }
            }
        });

        let charge: Charge = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(charge.id, "chrg_test_5xyz");
        assert_eq!(charge.status, ChargeStatus::Pending);
        assert!(charge.qr_image_url().unwrap().ends_with("/downloads/ABC"));

        // unread fields survive the proxy round trip
        let back = serde_json::to_value(&charge).unwrap();
        assert_eq!(back["livemode"], json!(false));
        assert_eq!(back["source"]["scannable_code"]["type"], json!("qr"));
    }

    #[test]
    fn unknown_status_is_not_terminal() {
        let charge: Charge = serde_json::from_value(json!({
            "id": "chrg_1",
            "amount": 100,
            "currency": "THB",
            "status": "reversed"
        }))
        .unwrap();

        assert_eq!(charge.status, ChargeStatus::Unknown);
        assert!(!charge.status.is_terminal());
        assert!(ChargeStatus::Expired.is_terminal());
        assert!(!ChargeStatus::Pending.is_terminal());
    }
}
