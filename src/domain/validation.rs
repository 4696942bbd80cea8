//! Registration form rules that the derive attributes cannot express on their
//! own: Thai ID and phone formats, "other" choices, and date relationships.

use std::borrow::Cow;

use chrono::NaiveDate;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use super::member::{MembershipApplication, OTHER_CHOICE};

pub const MINIMUM_AGE: u32 = 18;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Thai national ID: exactly 13 ASCII digits.
pub fn validate_id_card(value: &str) -> Result<(), ValidationError> {
    if value.len() == 13 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(error("id_card", "ID card number must be 13 digits"))
    }
}

/// `^(\+66|0)[0-9]{8,9}$`
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let rest = value
        .strip_prefix("+66")
        .or_else(|| value.strip_prefix('0'));

    match rest {
        Some(digits)
            if (8..=9).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            Ok(())
        }
        _ => Err(error("phone", "invalid phone number")),
    }
}

/// Email is optional, and the form submits an empty string when left blank.
pub fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(error("email", "invalid email address"))
    }
}

/// Full validation of an application as of `today`.
pub fn validate_application(
    application: &MembershipApplication,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = match application.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };

    if application.title == OTHER_CHOICE && is_blank(&application.title_other) {
        errors.add("title_other", error("required", "please specify the title"));
    }

    if application.religion == OTHER_CHOICE && is_blank(&application.religion_other) {
        errors.add("religion_other", error("required", "please specify the religion"));
    }

    if application.card_expiry_date <= application.card_issue_date {
        errors.add(
            "card_expiry_date",
            error("card_dates", "expiry date must be after the issue date"),
        );
    } else if application.card_expiry_date < today {
        errors.add("card_expiry_date", error("card_expired", "ID card has expired"));
    }

    let age = today.years_since(application.birth_date).unwrap_or(0);
    if age < MINIMUM_AGE {
        errors.add("birth_date", error("minimum_age", "applicant must be at least 18 years old"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or("").is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MembershipType, PaymentMethod};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn application() -> MembershipApplication {
        MembershipApplication {
            title: "นาย".to_string(),
            title_other: None,
            first_name: "สมชาย".to_string(),
            last_name: Some("ใจดี".to_string()),
            religion: "พุทธ".to_string(),
            religion_other: None,
            nationality: "สัญชาติไทยโดยกำเนิด".to_string(),
            id_card: "1103700012345".to_string(),
            card_issue_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            card_expiry_date: NaiveDate::from_ymd_opt(2028, 1, 1).unwrap(),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
            house_number: "99/1".to_string(),
            village: None,
            soi: None,
            road: None,
            moo: None,
            province: "กรุงเทพมหานคร".to_string(),
            district: "เขตดุสิต".to_string(),
            sub_district: "ดุสิต".to_string(),
            postal_code: "10300".to_string(),
            phone: "0812345678".to_string(),
            email: Some(String::new()),
            line_id: None,
            political_opinion: None,
            membership_type: MembershipType::Yearly,
            payment_method: PaymentMethod::Cash,
            selfie_with_document_url: "uploads/selfie.jpg".to_string(),
            id_card_image_url: "uploads/card.jpg".to_string(),
        }
    }

    fn failing_fields(app: &MembershipApplication) -> Vec<String> {
        let errors = validate_application(app, today()).unwrap_err();
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn valid_application_passes() {
        assert!(validate_application(&application(), today()).is_ok());
    }

    #[test]
    fn id_card_must_be_thirteen_digits() {
        assert!(validate_id_card("1234567890123").is_ok());
        assert!(validate_id_card("123456789012").is_err());
        assert!(validate_id_card("12345678901234").is_err());
        assert!(validate_id_card("12345678901a3").is_err());
        assert!(validate_id_card("๑๒๓๔๕๖๗๘๙๐๑๒๓").is_err());
    }

    #[test]
    fn phone_accepts_local_and_international_prefix() {
        assert!(validate_phone("0812345678").is_ok());
        assert!(validate_phone("021234567").is_ok());
        assert!(validate_phone("+66812345678").is_ok());
        assert!(validate_phone("812345678").is_err());
        assert!(validate_phone("0812").is_err());
        assert!(validate_phone("+6681234567890").is_err());
        assert!(validate_phone("08123456x8").is_err());
    }

    #[test]
    fn blank_email_is_allowed_but_garbage_is_not() {
        assert!(validate_optional_email("").is_ok());
        assert!(validate_optional_email("someone@example.com").is_ok());
        assert!(validate_optional_email("not-an-email").is_err());
    }

    #[test]
    fn other_title_and_religion_need_details() {
        let mut app = application();
        app.title = OTHER_CHOICE.to_string();
        app.religion = OTHER_CHOICE.to_string();
        app.religion_other = Some("   ".to_string());

        assert_eq!(failing_fields(&app), vec!["religion_other", "title_other"]);

        app.title_other = Some("ดร.".to_string());
        app.religion_other = Some("ซิกข์".to_string());
        assert!(validate_application(&app, today()).is_ok());
    }

    #[test]
    fn card_dates_are_checked() {
        let mut app = application();
        app.card_expiry_date = app.card_issue_date;
        assert_eq!(failing_fields(&app), vec!["card_expiry_date"]);

        let mut app = application();
        app.card_expiry_date = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        assert_eq!(failing_fields(&app), vec!["card_expiry_date"]);

        let mut app = application();
        app.card_expiry_date = today();
        assert!(validate_application(&app, today()).is_ok());
    }

    #[test]
    fn applicant_must_be_an_adult() {
        let mut app = application();
        app.birth_date = NaiveDate::from_ymd_opt(2007, 6, 2).unwrap();
        assert_eq!(failing_fields(&app), vec!["birth_date"]);

        app.birth_date = NaiveDate::from_ymd_opt(2007, 6, 1).unwrap();
        assert!(validate_application(&app, today()).is_ok());
    }

    #[test]
    fn derive_rules_are_reported_alongside_cross_field_rules() {
        let mut app = application();
        app.first_name.clear();
        app.id_card = "123".to_string();
        app.selfie_with_document_url.clear();
        app.birth_date = today();

        assert_eq!(
            failing_fields(&app),
            vec!["birth_date", "first_name", "id_card", "selfie_with_document_url"]
        );
    }
}
