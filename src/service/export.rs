use chrono::NaiveDate;
use csv_async::{AsyncWriterBuilder, QuoteStyle};

use crate::{
    domain::Member,
    error::{AppError, Result},
};

const HEADERS: [&str; 8] = [
    "ชื่อ-นามสกุล",
    "เลขบัตรประชาชน",
    "เบอร์โทรศัพท์",
    "อีเมล",
    "ที่อยู่",
    "ประเภทสมาชิก",
    "สถานะ",
    "วันที่สมัคร",
];

pub fn export_filename(today: NaiveDate) -> String {
    format!("members_{}.csv", today.format("%Y%m%d"))
}

/// Renders members as CSV with every cell quoted.
pub async fn members_csv(members: &[Member]) -> Result<Vec<u8>> {
    let mut writer = AsyncWriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .create_writer(Vec::new());

    writer.write_record(&HEADERS).await.map_err(csv_error)?;

    for member in members {
        let application = &member.application;
        writer
            .write_record(&[
                member.full_name(),
                application.id_card.clone(),
                application.phone.clone(),
                application.email.clone().unwrap_or_default(),
                application.short_address(),
                application.membership_type.label_th().to_string(),
                member.status.label_th().to_string(),
                member.created_at.format("%d/%m/%Y").to_string(),
            ])
            .await
            .map_err(csv_error)?;
    }

    writer
        .into_inner()
        .await
        .map_err(|_| AppError::Internal("Failed to finish CSV export".to_string()))
}

fn csv_error(e: csv_async::Error) -> AppError {
    AppError::Internal(format!("CSV export failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_compact_date() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(export_filename(day), "members_20250309.csv");
    }

    #[tokio::test]
    async fn empty_export_has_quoted_header_row() {
        let bytes = members_csv(&[]).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("\"ชื่อ-นามสกุล\",\"เลขบัตรประชาชน\""));
        assert_eq!(text.lines().count(), 1);
    }
}
