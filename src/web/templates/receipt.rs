use askama::Template;
use chrono::{DateTime, Duration, Utc};

use crate::domain::{Charge, Member};

#[derive(Template)]
#[template(path = "receipt.html")]
pub struct ReceiptTemplate {
    pub party_name: String,
    pub full_name: String,
    pub id_card: String,
    pub membership_label: String,
    pub charge_id: String,
    pub paid_on: String,
    pub amount: String,
    pub currency_label: String,
    pub issued_at: String,
}

/// Receipts show Bangkok local time (UTC+7, no DST).
const BANGKOK_OFFSET_HOURS: i64 = 7;

fn local(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt + Duration::hours(BANGKOK_OFFSET_HOURS)
}

impl ReceiptTemplate {
    pub fn new(party_name: &str, member: &Member, charge: &Charge, now: DateTime<Utc>) -> Self {
        let paid_at = charge
            .extra
            .get("paid_at")
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);

        let currency_label = if charge.currency.eq_ignore_ascii_case("THB") {
            "บาท".to_string()
        } else {
            charge.currency.to_uppercase()
        };

        Self {
            party_name: party_name.to_string(),
            full_name: member.full_name(),
            id_card: member.application.id_card.clone(),
            membership_label: member.application.membership_type.label_th().to_string(),
            charge_id: charge.id.clone(),
            paid_on: local(paid_at).format("%d/%m/%Y").to_string(),
            amount: format_minor_units(charge.amount),
            currency_label,
            issued_at: local(now).format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

/// 2000 satang -> "20", 2050 -> "20.50".
pub fn format_minor_units(amount: i64) -> String {
    if amount % 100 == 0 {
        format!("{}", amount / 100)
    } else {
        format!("{}.{:02}", amount / 100, (amount % 100).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_satang_as_baht() {
        assert_eq!(format_minor_units(2000), "20");
        assert_eq!(format_minor_units(20000), "200");
        assert_eq!(format_minor_units(2050), "20.50");
    }
}
