#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use ktmember::{
    domain::*,
    error::{AppError, Result},
    payments::PaymentGateway,
    repository::MemberRepository,
};
use serde_json::Map;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use uuid::Uuid;

/// One connection, so every query sees the same in-memory database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

pub fn application(payment_method: PaymentMethod) -> MembershipApplication {
    MembershipApplication {
        title: "นาย".to_string(),
        title_other: None,
        first_name: "สมชาย".to_string(),
        last_name: Some("ใจดี".to_string()),
        religion: "พุทธ".to_string(),
        religion_other: None,
        nationality: NATIONALITIES[0].to_string(),
        id_card: "1103700012345".to_string(),
        card_issue_date: NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
        card_expiry_date: NaiveDate::from_ymd_opt(2028, 1, 14).unwrap(),
        birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
        house_number: "99/1".to_string(),
        village: None,
        soi: Some("สุขุมวิท 11".to_string()),
        road: Some("สุขุมวิท".to_string()),
        moo: None,
        province: "กรุงเทพมหานคร".to_string(),
        district: "เขตวัฒนา".to_string(),
        sub_district: "คลองเตยเหนือ".to_string(),
        postal_code: "10110".to_string(),
        phone: "0812345678".to_string(),
        email: Some("somchai@example.com".to_string()),
        line_id: None,
        political_opinion: None,
        membership_type: MembershipType::Yearly,
        payment_method,
        selfie_with_document_url: "uploads/selfie.jpg".to_string(),
        id_card_image_url: "uploads/card.jpg".to_string(),
    }
}

/// What the fake answers to one status query.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Status(ChargeStatus),
    Unreachable,
}

/// Scripted gateway. Status queries consume `script` in order and answer
/// `pending` once it runs out.
#[derive(Default)]
pub struct FakeGateway {
    script: Mutex<VecDeque<Step>>,
    created: AtomicUsize,
    retrievals: AtomicUsize,
    fail_create: bool,
}

impl FakeGateway {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    pub fn push(&self, steps: impl IntoIterator<Item = Step>) {
        self.script.lock().unwrap().extend(steps);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }

    pub fn charge(id: &str, amount: i64, currency: &str, status: ChargeStatus) -> Charge {
        let mut charge = Charge::synthetic_pending(id, amount, currency);
        charge.status = status;
        charge.source = Some(ChargeSource {
            source_type: "promptpay".to_string(),
            scannable_code: Some(ScannableCode {
                image: ScannableImage {
                    download_uri: format!("https://api.omise.co/charges/{}/documents/qr.svg", id),
                    extra: Map::new(),
                },
                extra: Map::new(),
            }),
            extra: Map::new(),
        });
        charge
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_charge(&self, request: &CreateChargeRequest) -> Result<Charge> {
        if self.fail_create {
            return Err(AppError::External("gateway unavailable".to_string()));
        }

        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Self::charge(
            &format!("chrg_test_{}", n),
            request.amount,
            &request.currency,
            ChargeStatus::Pending,
        ))
    }

    async fn retrieve_charge(&self, charge_id: &str) -> Result<Charge> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();

        match step {
            Some(Step::Unreachable) => Err(AppError::External("connection reset".to_string())),
            Some(Step::Status(status)) => Ok(Self::charge(charge_id, 2000, "THB", status)),
            None => Ok(Self::charge(charge_id, 2000, "THB", ChargeStatus::Pending)),
        }
    }
}

/// Member store that counts writes. Used where a real pool would fight the
/// paused test clock.
#[derive(Default)]
pub struct RecordingMemberRepository {
    members: Mutex<Vec<Member>>,
    writes: AtomicUsize,
    create_attempts: AtomicUsize,
    fail_create: bool,
}

impl RecordingMemberRepository {
    /// Every insert fails as if the database were down.
    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn create_attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }

    pub fn members(&self) -> Vec<Member> {
        self.members.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemberRepository for RecordingMemberRepository {
    async fn create(&self, record: NewMemberRecord) -> Result<Member> {
        self.create_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(AppError::Database("disk I/O error".to_string()));
        }

        let mut members = self.members.lock().unwrap();
        if record.charge_id.is_some()
            && members.iter().any(|m| m.charge_id == record.charge_id)
        {
            return Err(AppError::Conflict("duplicate charge".to_string()));
        }

        let now = Utc::now();
        let member = Member {
            id: Uuid::new_v4(),
            application: record.application,
            status: MemberStatus::Pending,
            payment_status: record.payment_status,
            charge_id: record.charge_id,
            created_at: now,
            updated_at: now,
        };
        members.push(member.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(member)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Member>> {
        Ok(self.members.lock().unwrap().iter().find(|m| m.id == id).cloned())
    }

    async fn find_by_charge_id(&self, charge_id: &str) -> Result<Option<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.charge_id.as_deref() == Some(charge_id))
            .cloned())
    }

    async fn list(&self, _filter: &MemberFilter, limit: i64, offset: i64) -> Result<Vec<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, _filter: &MemberFilter) -> Result<i64> {
        Ok(self.members.lock().unwrap().len() as i64)
    }

    async fn update(&self, _id: Uuid, _application: MembershipApplication) -> Result<Member> {
        Err(AppError::Internal("not supported".to_string()))
    }

    async fn update_status(&self, _id: Uuid, _status: MemberStatus) -> Result<Member> {
        Err(AppError::Internal("not supported".to_string()))
    }

    async fn mark_payment_completed(&self, _id: Uuid) -> Result<Member> {
        Err(AppError::Internal("not supported".to_string()))
    }

    async fn delete(&self, _id: Uuid) -> Result<()> {
        Err(AppError::Internal("not supported".to_string()))
    }

    async fn stats(&self) -> Result<MemberStats> {
        Ok(MemberStats {
            total: self.members.lock().unwrap().len() as i64,
            ..Default::default()
        })
    }
}
