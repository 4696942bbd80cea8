use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    api::state::AppState,
    domain::{District, Province, SubDistrict},
};

#[derive(Debug, Serialize)]
pub struct PostalCode {
    pub sub_district_id: u32,
    /// `null` for an unknown sub-district.
    pub postal_code: Option<String>,
}

pub async fn provinces(State(state): State<AppState>) -> Json<Vec<Province>> {
    Json(state.service_context.address_book.provinces().to_vec())
}

pub async fn districts(
    State(state): State<AppState>,
    Path(province_id): Path<u32>,
) -> Json<Vec<District>> {
    let book = &state.service_context.address_book;
    Json(book.districts_of(province_id).into_iter().cloned().collect())
}

pub async fn sub_districts(
    State(state): State<AppState>,
    Path(district_id): Path<u32>,
) -> Json<Vec<SubDistrict>> {
    let book = &state.service_context.address_book;
    Json(book.sub_districts_of(district_id).into_iter().cloned().collect())
}

pub async fn postal_code(
    State(state): State<AppState>,
    Path(sub_district_id): Path<u32>,
) -> Json<PostalCode> {
    let postal_code = state.service_context.address_book.postal_code_of(sub_district_id);

    Json(PostalCode { sub_district_id, postal_code })
}
