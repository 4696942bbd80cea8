//! Thai administrative divisions for the cascading address picker.

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::{
    config::AddressConfig,
    domain::{District, Province, SubDistrict},
    error::{AppError, Result},
};

/// Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    provinces: Vec<Province>,
    districts: Vec<District>,
    sub_districts: Vec<SubDistrict>,
    zip_by_sub_district: HashMap<u32, u32>,
}

impl AddressBook {
    pub fn from_parts(
        mut provinces: Vec<Province>,
        mut districts: Vec<District>,
        mut sub_districts: Vec<SubDistrict>,
    ) -> Self {
        provinces.sort_by_key(|p| p.id);
        districts.sort_by_key(|d| d.id);
        sub_districts.sort_by_key(|s| s.id);

        let zip_by_sub_district = sub_districts
            .iter()
            .map(|s| (s.id, s.zip_code))
            .collect();

        Self {
            provinces,
            districts,
            sub_districts,
            zip_by_sub_district,
        }
    }

    /// Loads all three datasets. Each source is an http(s) URL or a file path.
    pub async fn load(config: &AddressConfig) -> Result<Self> {
        let http = reqwest::Client::new();
        let provinces = fetch_json::<Vec<Province>>(&http, &config.provinces).await?;
        let districts = fetch_json::<Vec<District>>(&http, &config.districts).await?;
        let sub_districts = fetch_json::<Vec<SubDistrict>>(&http, &config.sub_districts).await?;

        tracing::info!(
            "Loaded address data: {} provinces, {} districts, {} sub-districts",
            provinces.len(), districts.len(), sub_districts.len()
        );

        Ok(Self::from_parts(provinces, districts, sub_districts))
    }

    /// Like [`AddressBook::load`], but an unreachable source leaves the book
    /// empty instead of stopping the server.
    pub async fn load_or_empty(config: &AddressConfig) -> Self {
        match Self::load(config).await {
            Ok(book) => book,
            Err(e) => {
                tracing::warn!("Address data unavailable, lookups will be empty: {}", e);
                Self::default()
            }
        }
    }

    pub fn provinces(&self) -> &[Province] {
        &self.provinces
    }

    pub fn districts_of(&self, province_id: u32) -> Vec<&District> {
        self.districts
            .iter()
            .filter(|d| d.province_id == province_id)
            .collect()
    }

    pub fn sub_districts_of(&self, district_id: u32) -> Vec<&SubDistrict> {
        self.sub_districts
            .iter()
            .filter(|s| s.district_id == district_id)
            .collect()
    }

    pub fn postal_code_of(&self, sub_district_id: u32) -> Option<String> {
        self.zip_by_sub_district
            .get(&sub_district_id)
            .map(|zip| format!("{:05}", zip))
    }

    pub fn is_empty(&self) -> bool {
        self.provinces.is_empty()
    }
}

async fn fetch_json<T: DeserializeOwned>(http: &reqwest::Client, source: &str) -> Result<T> {
    let raw = if source.starts_with("http://") || source.starts_with("https://") {
        http.get(source)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?
    } else {
        tokio::fs::read_to_string(source)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", source, e)))?
    };

    serde_json::from_str(&raw)
        .map_err(|e| AppError::Internal(format!("Malformed address data in {}: {}", source, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> AddressBook {
        AddressBook::from_parts(
            vec![
                Province { id: 1, name_th: "กรุงเทพมหานคร".into(), name_en: "Bangkok".into() },
                Province { id: 2, name_th: "สมุทรปราการ".into(), name_en: "Samut Prakan".into() },
            ],
            vec![
                District { id: 1001, name_th: "เขตพระนคร".into(), name_en: "Phra Nakhon".into(), province_id: 1 },
                District { id: 1002, name_th: "เขตดุสิต".into(), name_en: "Dusit".into(), province_id: 1 },
                District { id: 1101, name_th: "เมืองสมุทรปราการ".into(), name_en: "Mueang Samut Prakan".into(), province_id: 2 },
            ],
            vec![
                SubDistrict { id: 100101, name_th: "พระบรมมหาราชวัง".into(), name_en: "Phra Borom Maha Ratchawang".into(), district_id: 1001, zip_code: 10200 },
                SubDistrict { id: 100102, name_th: "วังบูรพาภิรมย์".into(), name_en: "Wang Burapha Phirom".into(), district_id: 1001, zip_code: 10200 },
                SubDistrict { id: 100201, name_th: "ดุสิต".into(), name_en: "Dusit".into(), district_id: 1002, zip_code: 10300 },
            ],
        )
    }

    #[test]
    fn cascades_province_to_postal_code() {
        let book = book();
        assert_eq!(book.provinces().len(), 2);

        let districts = book.districts_of(1);
        assert_eq!(districts.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1001, 1002]);

        let subs = book.sub_districts_of(1001);
        assert_eq!(subs.len(), 2);

        assert_eq!(book.postal_code_of(100201).as_deref(), Some("10300"));
    }

    #[test]
    fn unknown_ids_are_empty() {
        let book = book();
        assert!(book.districts_of(99).is_empty());
        assert!(book.sub_districts_of(99).is_empty());
        assert_eq!(book.postal_code_of(99), None);
    }

    #[test]
    fn reads_upstream_field_names() {
        let sub: SubDistrict = serde_json::from_str(
            r#"{"id":100101,"zip_code":10200,"name_th":"พระบรมมหาราชวัง","name_en":"Phra Borom Maha Ratchawang","amphure_id":1001,"created_at":"2019-08-09T03:33:09.000+07:00"}"#,
        )
        .unwrap();
        assert_eq!(sub.district_id, 1001);
    }

    #[tokio::test]
    async fn load_or_empty_tolerates_missing_files() {
        let config = AddressConfig {
            provinces: "/nonexistent/province.json".into(),
            districts: "/nonexistent/district.json".into(),
            sub_districts: "/nonexistent/sub_district.json".into(),
        };
        assert!(AddressBook::load_or_empty(&config).await.is_empty());
    }
}
