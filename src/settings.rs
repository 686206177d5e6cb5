// Configuration chargée depuis l'environnement (.env inclus)

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: String,
    pub public_base_url: String,
    pub cors_origin: String,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    pub expose_internal_errors: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let settings = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("jwt_ttl_hours", 24 * 365)?
            .set_default("upload_dir", "uploads")?
            .set_default("public_base_url", "http://127.0.0.1:8080")?
            .set_default("cors_origin", "http://localhost:5173")?
            .set_default("expose_internal_errors", false)?
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("admin_emails"),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(admins: &[&str]) -> Settings {
        Settings {
            host: "127.0.0.1".into(),
            port: 8080,
            database_url: "sqlite::memory:".into(),
            jwt_secret: "secret".into(),
            jwt_ttl_hours: 1,
            upload_dir: "uploads".into(),
            public_base_url: "http://localhost".into(),
            cors_origin: "http://localhost:5173".into(),
            admin_emails: admins.iter().map(|s| s.to_string()).collect(),
            expose_internal_errors: false,
        }
    }

    #[test]
    fn admin_match_ignores_case_and_whitespace() {
        let s = settings(&["Owner@Shop.io"]);
        assert!(s.is_admin(" owner@shop.io"));
        assert!(!s.is_admin("someone@shop.io"));
        assert!(!settings(&[]).is_admin("owner@shop.io"));
    }
}
