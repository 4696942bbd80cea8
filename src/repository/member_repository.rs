use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{
        Member, MemberFilter, MemberStats, MemberStatus, MembershipApplication, MembershipType,
        NewMemberRecord, PaymentMethod, PaymentStatus,
    },
    error::{AppError, Result},
    repository::MemberRepository,
};

const MEMBER_COLUMNS: &str = r#"
    id, title, title_other, first_name, last_name, religion, religion_other,
    nationality, id_card, card_issue_date, card_expiry_date, birth_date,
    house_number, village, soi, road, moo, province, district, sub_district,
    postal_code, phone, email, line_id, political_opinion, membership_type,
    payment_method, selfie_with_document_url, id_card_image_url, status,
    payment_status, charge_id, created_at, updated_at
"#;

// Status filter and free-text search; each `?` pair is (value IS NULL, value)
const FILTER_CLAUSE: &str = r#"
    WHERE (? IS NULL OR status = ?)
      AND (? IS NULL
           OR instr(lower(first_name), lower(?)) > 0
           OR instr(lower(COALESCE(last_name, '')), lower(?)) > 0
           OR instr(id_card, ?) > 0
           OR instr(phone, ?) > 0)
"#;

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct MemberRow {
    id: String,
    title: String,
    title_other: Option<String>,
    first_name: String,
    last_name: Option<String>,
    religion: String,
    religion_other: Option<String>,
    nationality: String,
    id_card: String,
    card_issue_date: NaiveDate,
    card_expiry_date: NaiveDate,
    birth_date: NaiveDate,
    house_number: String,
    village: Option<String>,
    soi: Option<String>,
    road: Option<String>,
    moo: Option<String>,
    province: String,
    district: String,
    sub_district: String,
    postal_code: String,
    phone: String,
    email: Option<String>,
    line_id: Option<String>,
    political_opinion: Option<String>,
    membership_type: String,
    payment_method: String,
    selfie_with_document_url: String,
    id_card_image_url: String,
    status: String,
    payment_status: String,
    charge_id: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_member(row: MemberRow) -> Result<Member> {
        Ok(Member {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            application: MembershipApplication {
                title: row.title,
                title_other: row.title_other,
                first_name: row.first_name,
                last_name: row.last_name,
                religion: row.religion,
                religion_other: row.religion_other,
                nationality: row.nationality,
                id_card: row.id_card,
                card_issue_date: row.card_issue_date,
                card_expiry_date: row.card_expiry_date,
                birth_date: row.birth_date,
                house_number: row.house_number,
                village: row.village,
                soi: row.soi,
                road: row.road,
                moo: row.moo,
                province: row.province,
                district: row.district,
                sub_district: row.sub_district,
                postal_code: row.postal_code,
                phone: row.phone,
                email: row.email,
                line_id: row.line_id,
                political_opinion: row.political_opinion,
                membership_type: Self::parse_membership_type(&row.membership_type)?,
                payment_method: Self::parse_payment_method(&row.payment_method)?,
                selfie_with_document_url: row.selfie_with_document_url,
                id_card_image_url: row.id_card_image_url,
            },
            status: Self::parse_member_status(&row.status)?,
            payment_status: Self::parse_payment_status(&row.payment_status)?,
            charge_id: row.charge_id,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_member_status(s: &str) -> Result<MemberStatus> {
        match s {
            "Pending" => Ok(MemberStatus::Pending),
            "Approved" => Ok(MemberStatus::Approved),
            "Rejected" => Ok(MemberStatus::Rejected),
            _ => Err(AppError::Database(format!("Invalid member status: {}", s))),
        }
    }

    fn member_status_to_str(status: &MemberStatus) -> &'static str {
        match status {
            MemberStatus::Pending => "Pending",
            MemberStatus::Approved => "Approved",
            MemberStatus::Rejected => "Rejected",
        }
    }

    fn parse_membership_type(s: &str) -> Result<MembershipType> {
        match s {
            "Yearly" => Ok(MembershipType::Yearly),
            "Lifetime" => Ok(MembershipType::Lifetime),
            _ => Err(AppError::Database(format!("Invalid membership type: {}", s))),
        }
    }

    fn membership_type_to_str(membership_type: &MembershipType) -> &'static str {
        match membership_type {
            MembershipType::Yearly => "Yearly",
            MembershipType::Lifetime => "Lifetime",
        }
    }

    fn parse_payment_method(s: &str) -> Result<PaymentMethod> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "PromptPay" => Ok(PaymentMethod::PromptPay),
            _ => Err(AppError::Database(format!("Invalid payment method: {}", s))),
        }
    }

    fn payment_method_to_str(method: &PaymentMethod) -> &'static str {
        match method {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::PromptPay => "PromptPay",
        }
    }

    fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
        match s {
            "None" => Ok(PaymentStatus::None),
            "Completed" => Ok(PaymentStatus::Completed),
            _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
        }
    }

    fn payment_status_to_str(status: &PaymentStatus) -> &'static str {
        match status {
            PaymentStatus::None => "None",
            PaymentStatus::Completed => "Completed",
        }
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE {} = ?",
            MEMBER_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_member(r)?)),
            None => Ok(None),
        }
    }

    async fn count_with_status(&self, status: Option<MemberStatus>) -> Result<i64> {
        let count = match status {
            Some(status) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members WHERE status = ?")
                    .bind(Self::member_status_to_str(&status))
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, record: NewMemberRecord) -> Result<Member> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let app = &record.application;

        sqlx::query(&format!(
            "INSERT INTO members ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            MEMBER_COLUMNS
        ))
        .bind(id.to_string())
        .bind(&app.title)
        .bind(&app.title_other)
        .bind(&app.first_name)
        .bind(&app.last_name)
        .bind(&app.religion)
        .bind(&app.religion_other)
        .bind(&app.nationality)
        .bind(&app.id_card)
        .bind(app.card_issue_date)
        .bind(app.card_expiry_date)
        .bind(app.birth_date)
        .bind(&app.house_number)
        .bind(&app.village)
        .bind(&app.soi)
        .bind(&app.road)
        .bind(&app.moo)
        .bind(&app.province)
        .bind(&app.district)
        .bind(&app.sub_district)
        .bind(&app.postal_code)
        .bind(&app.phone)
        .bind(&app.email)
        .bind(&app.line_id)
        .bind(&app.political_opinion)
        .bind(Self::membership_type_to_str(&app.membership_type))
        .bind(Self::payment_method_to_str(&app.payment_method))
        .bind(&app.selfie_with_document_url)
        .bind(&app.id_card_image_url)
        .bind(Self::member_status_to_str(&MemberStatus::Pending))
        .bind(Self::payment_status_to_str(&record.payment_status))
        .bind(&record.charge_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.message().contains("UNIQUE") => {
                AppError::Conflict("A member record already exists for this charge".to_string())
            }
            e => AppError::Database(e.to_string()),
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created member".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        self.fetch_one_by("id", &id.to_string()).await
    }

    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Member>> {
        self.fetch_one_by("charge_id", charge_id).await
    }

    async fn list(&self, filter: &MemberFilter, limit: i64, offset: i64) -> Result<Vec<Member>> {
        let status = filter.status.as_ref().map(Self::member_status_to_str);
        let search = filter.search_term();

        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            MEMBER_COLUMNS, FILTER_CLAUSE
        ))
        .bind(status)
        .bind(status)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(Self::row_to_member)
            .collect()
    }

    async fn count(&self, filter: &MemberFilter) -> Result<i64> {
        let status = filter.status.as_ref().map(Self::member_status_to_str);
        let search = filter.search_term();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM members {}",
            FILTER_CLAUSE
        ))
        .bind(status)
        .bind(status)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn update(&self, id: Uuid, app: MembershipApplication) -> Result<Member> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE members
            SET title = ?, title_other = ?, first_name = ?, last_name = ?,
                religion = ?, religion_other = ?, nationality = ?, id_card = ?,
                card_issue_date = ?, card_expiry_date = ?, birth_date = ?,
                house_number = ?, village = ?, soi = ?, road = ?, moo = ?,
                province = ?, district = ?, sub_district = ?, postal_code = ?,
                phone = ?, email = ?, line_id = ?, political_opinion = ?,
                membership_type = ?, payment_method = ?,
                selfie_with_document_url = ?, id_card_image_url = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&app.title)
        .bind(&app.title_other)
        .bind(&app.first_name)
        .bind(&app.last_name)
        .bind(&app.religion)
        .bind(&app.religion_other)
        .bind(&app.nationality)
        .bind(&app.id_card)
        .bind(app.card_issue_date)
        .bind(app.card_expiry_date)
        .bind(app.birth_date)
        .bind(&app.house_number)
        .bind(&app.village)
        .bind(&app.soi)
        .bind(&app.road)
        .bind(&app.moo)
        .bind(&app.province)
        .bind(&app.district)
        .bind(&app.sub_district)
        .bind(&app.postal_code)
        .bind(&app.phone)
        .bind(&app.email)
        .bind(&app.line_id)
        .bind(&app.political_opinion)
        .bind(Self::membership_type_to_str(&app.membership_type))
        .bind(Self::payment_method_to_str(&app.payment_method))
        .bind(&app.selfie_with_document_url)
        .bind(&app.id_card_image_url)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated member".to_string())
        })
    }

    async fn update_status(&self, id: Uuid, status: MemberStatus) -> Result<Member> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query("UPDATE members SET status = ?, updated_at = ? WHERE id = ?")
            .bind(Self::member_status_to_str(&status))
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated member".to_string())
        })
    }

    async fn mark_payment_completed(&self, id: Uuid) -> Result<Member> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query("UPDATE members SET payment_status = ?, updated_at = ? WHERE id = ?")
            .bind(Self::payment_status_to_str(&PaymentStatus::Completed))
            .bind(now)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated member".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Member not found".to_string()));
        }

        Ok(())
    }

    async fn stats(&self) -> Result<MemberStats> {
        Ok(MemberStats {
            total: self.count_with_status(None).await?,
            approved: self.count_with_status(Some(MemberStatus::Approved)).await?,
            pending: self.count_with_status(Some(MemberStatus::Pending)).await?,
            rejected: self.count_with_status(Some(MemberStatus::Rejected)).await?,
        })
    }
}
