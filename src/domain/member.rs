use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validation::{validate_id_card, validate_optional_email, validate_phone};

pub const OTHER_CHOICE: &str = "อื่นๆ";

pub const TITLES: &[&str] = &["นาย", "นาง", "นางสาว", OTHER_CHOICE];

pub const RELIGIONS: &[&str] = &["พุทธ", "อิสลาม", "คริสต์", OTHER_CHOICE];

pub const NATIONALITIES: &[&str] = &[
    "สัญชาติไทยโดยกำเนิด",
    "สัญชาติไทยโดยการแปลงสัญชาติซึ่งได้สัญชาติมาแล้วไม่น้อยกว่า 5 ปี",
];

/// A stored membership record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    #[serde(flatten)]
    pub application: MembershipApplication,
    pub status: MemberStatus,
    pub payment_status: PaymentStatus,
    pub charge_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn full_name(&self) -> String {
        self.application.full_name()
    }
}

/// Everything the applicant fills in on the registration form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct MembershipApplication {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub title_other: Option<String>,
    #[validate(length(min = 1, message = "first name is required"))]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[validate(length(min = 1, message = "religion is required"))]
    pub religion: String,
    #[serde(default)]
    pub religion_other: Option<String>,
    #[validate(length(min = 1, message = "nationality is required"))]
    pub nationality: String,

    #[validate(custom(function = "validate_id_card"))]
    pub id_card: String,
    pub card_issue_date: NaiveDate,
    pub card_expiry_date: NaiveDate,
    pub birth_date: NaiveDate,

    #[validate(length(min = 1, message = "house number is required"))]
    pub house_number: String,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub soi: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub moo: Option<String>,
    #[validate(length(min = 1, message = "province is required"))]
    pub province: String,
    #[validate(length(min = 1, message = "district is required"))]
    pub district: String,
    #[validate(length(min = 1, message = "sub-district is required"))]
    pub sub_district: String,
    #[validate(length(min = 1, message = "postal code is required"))]
    pub postal_code: String,

    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: Option<String>,
    #[serde(default)]
    pub line_id: Option<String>,
    #[serde(default)]
    pub political_opinion: Option<String>,

    pub membership_type: MembershipType,
    pub payment_method: PaymentMethod,

    #[validate(length(min = 1, message = "a selfie holding the document is required"))]
    pub selfie_with_document_url: String,
    #[validate(length(min = 1, message = "an ID card image is required"))]
    pub id_card_image_url: String,
}

impl MembershipApplication {
    pub fn full_name(&self) -> String {
        let title = match self.title_other.as_deref() {
            Some(other) if self.title == OTHER_CHOICE && !other.is_empty() => other,
            _ => self.title.as_str(),
        };
        match self.last_name.as_deref() {
            Some(last) if !last.is_empty() => format!("{}{} {}", title, self.first_name, last),
            _ => format!("{}{}", title, self.first_name),
        }
    }

    pub fn short_address(&self) -> String {
        format!(
            "{} {} {} {}",
            self.house_number, self.sub_district, self.district, self.province
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Pending,
    Approved,
    Rejected,
}

impl MemberStatus {
    pub fn label_th(&self) -> &'static str {
        match self {
            MemberStatus::Pending => "รอดำเนินการ",
            MemberStatus::Approved => "อนุมัติ",
            MemberStatus::Rejected => "ปฏิเสธ",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MembershipType {
    Yearly,
    Lifetime,
}

impl MembershipType {
    /// Fee in baht.
    pub fn price_baht(&self) -> i64 {
        match self {
            MembershipType::Yearly => 20,
            MembershipType::Lifetime => 200,
        }
    }

    /// Fee in satang, the unit the gateway charges in.
    pub fn amount_satang(&self) -> i64 {
        self.price_baht() * 100
    }

    pub fn label_en(&self) -> &'static str {
        match self {
            MembershipType::Yearly => "Yearly",
            MembershipType::Lifetime => "Lifetime",
        }
    }

    pub fn label_th(&self) -> &'static str {
        match self {
            MembershipType::Yearly => "รายปี",
            MembershipType::Lifetime => "ตลอดชีพ",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    #[serde(rename = "cash")]
    Cash,
    #[serde(rename = "promptpay")]
    PromptPay,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    None,
    Completed,
}

/// Row to insert. `charge_id` is only set for records committed after a
/// successful PromptPay charge.
#[derive(Debug, Clone)]
pub struct NewMemberRecord {
    pub application: MembershipApplication,
    pub payment_status: PaymentStatus,
    pub charge_id: Option<String>,
}

impl NewMemberRecord {
    pub fn unpaid(application: MembershipApplication) -> Self {
        Self {
            application,
            payment_status: PaymentStatus::None,
            charge_id: None,
        }
    }

    pub fn paid(application: MembershipApplication, charge_id: impl Into<String>) -> Self {
        Self {
            application,
            payment_status: PaymentStatus::Completed,
            charge_id: Some(charge_id.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberFilter {
    pub search: Option<String>,
    pub status: Option<MemberStatus>,
}

impl MemberFilter {
    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct MemberStats {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
}
