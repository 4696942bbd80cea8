use serde::Deserialize;
use config::{Config, ConfigError, Environment, File};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub payment: PaymentConfig,
    pub address: AddressConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub admin: AdminBootstrapConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub session_duration_hours: i64,
}

/// Omise credentials. Both keys must be configured for the gateway client to
/// be built; there are no compiled-in keys.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
    /// Hosts the QR proxy and exporter may fetch charge documents from.
    #[serde(default = "default_qr_hosts")]
    pub qr_hosts: Vec<String>,
}

fn default_qr_hosts() -> Vec<String> {
    vec!["api.omise.co".to_string()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.omise.co".to_string(),
            public_key: None,
            secret_key: None,
            qr_hosts: default_qr_hosts(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub party_name: String,
    pub currency: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
    /// Answer check-payment failures with a synthetic pending charge instead
    /// of a 502.
    #[serde(default)]
    pub mask_check_errors: bool,
}

/// Sources for the province / district / sub-district dataset. Each value is
/// either an `http(s)://` URL or a local file path.
#[derive(Debug, Deserialize, Clone)]
pub struct AddressConfig {
    pub provinces: String,
    pub districts: String,
    pub sub_districts: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadsConfig {
    pub dir: String,
}

/// When both fields are set, an admin account with these credentials is
/// created at startup if it does not exist yet.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminBootstrapConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

const THAI_PROVINCE_DATA: &str =
    "https://raw.githubusercontent.com/kongvut/thai-province-data/refs/heads/master/api/latest";

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3001)?
            .set_default("server.base_url", "http://localhost:3001")?
            .set_default("database.url", "sqlite://ktmember.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("auth.session_duration_hours", 24)?
            .set_default("gateway.base_url", "https://api.omise.co")?
            .set_default("payment.party_name", "Kla Tham Party")?
            .set_default("payment.currency", "THB")?
            .set_default("payment.poll_interval_secs", 3)?
            .set_default("payment.poll_timeout_secs", 600)?
            .set_default("payment.mask_check_errors", false)?
            .set_default("address.provinces", format!("{THAI_PROVINCE_DATA}/province.json"))?
            .set_default("address.districts", format!("{THAI_PROVINCE_DATA}/district.json"))?
            .set_default("address.sub_districts", format!("{THAI_PROVINCE_DATA}/sub_district.json"))?
            .set_default("uploads.dir", "uploads")?

            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))

            // Add environment variables (with KTMEMBER__ prefix, double underscore separates levels)
            .add_source(Environment::with_prefix("KTMEMBER").separator("__"))

            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3001,
                base_url: "http://localhost:3001".to_string(),
            },
            database: DatabaseConfig {
                url: "sqlite://ktmember.db?mode=rwc".to_string(),
                max_connections: 10,
            },
            auth: AuthConfig {
                session_duration_hours: 24,
            },
            gateway: GatewayConfig::default(),
            payment: PaymentConfig {
                party_name: "Kla Tham Party".to_string(),
                currency: "THB".to_string(),
                poll_interval_secs: 3,
                poll_timeout_secs: 600,
                mask_check_errors: false,
            },
            address: AddressConfig {
                provinces: format!("{THAI_PROVINCE_DATA}/province.json"),
                districts: format!("{THAI_PROVINCE_DATA}/district.json"),
                sub_districts: format!("{THAI_PROVINCE_DATA}/sub_district.json"),
            },
            uploads: UploadsConfig {
                dir: "uploads".to_string(),
            },
            admin: AdminBootstrapConfig::default(),
        }
    }
}
