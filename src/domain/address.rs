use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Province {
    pub id: u32,
    pub name_th: String,
    pub name_en: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct District {
    pub id: u32,
    pub name_th: String,
    pub name_en: String,
    pub province_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubDistrict {
    pub id: u32,
    pub name_th: String,
    pub name_en: String,
    #[serde(alias = "amphure_id")]
    pub district_id: u32,
    pub zip_code: u32,
}
