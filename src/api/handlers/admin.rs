use axum::{
    extract::{Extension, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentAdmin, state::AppState},
    domain::{Charge, Member, MemberFilter, MemberStats, MemberStatus},
    error::{AppError, Result},
    service::export::{export_filename, members_csv},
    web::templates::{receipt::ReceiptTemplate, HtmlTemplate},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    search: Option<String>,
    /// `all`, `pending`, `approved` or `rejected`.
    #[serde(default)]
    status: Option<String>,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
}

fn default_limit() -> i64 {
    50
}

impl ListParams {
    fn filter(&self) -> Result<MemberFilter> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some("pending") => Some(MemberStatus::Pending),
            Some("approved") => Some(MemberStatus::Approved),
            Some("rejected") => Some(MemberStatus::Rejected),
            Some(other) => {
                return Err(AppError::BadRequest(format!("Unknown status filter: {}", other)))
            }
        };

        Ok(MemberFilter {
            search: self.search.clone(),
            status,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    members: Vec<Member>,
    total: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentCheckResponse {
    member: Member,
    charge: Charge,
}

pub async fn list_members(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>> {
    let filter = params.filter()?;
    let members_service = &state.service_context.member_service;

    let members = members_service
        .list(&filter, params.limit.clamp(1, 500), params.offset.max(0))
        .await?;
    let total = members_service.count(&filter).await?;

    Ok(Json(ListResponse { members, total }))
}

pub async fn export_members(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse> {
    let filter = params.filter()?;
    let members = state.service_context.member_service.list_all(&filter).await?;
    let csv = members_csv(&members).await?;
    let filename = export_filename(chrono::Local::now().date_naive());

    tracing::info!("Exported {} members", members.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        csv,
    ))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Member>> {
    Ok(Json(state.service_context.member_service.get(id).await?))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(changes): Json<Map<String, Value>>,
) -> Result<Json<Member>> {
    Ok(Json(state.service_context.member_service.update(id, changes).await?))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.member_service.delete(id).await?;
    tracing::info!("Member {} deleted by {}", id, current.admin.email);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn approve_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> Result<Json<Member>> {
    let member = state.service_context.member_service.approve(id).await?;
    tracing::info!("Member {} approved by {}", id, current.admin.email);
    Ok(Json(member))
}

pub async fn reject_member(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> Result<Json<Member>> {
    let member = state.service_context.member_service.reject(id).await?;
    tracing::info!("Member {} rejected by {}", id, current.admin.email);
    Ok(Json(member))
}

pub async fn check_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentCheckResponse>> {
    let (member, charge) = state.service_context.member_service.check_payment(id).await?;
    Ok(Json(PaymentCheckResponse { member, charge }))
}

pub async fn receipt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (member, charge) = state.service_context.member_service.receipt(id).await?;

    Ok(HtmlTemplate(ReceiptTemplate::new(
        &state.settings.payment.party_name,
        &member,
        &charge,
        chrono::Utc::now(),
    )))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<MemberStats>> {
    Ok(Json(state.service_context.member_service.stats().await?))
}
