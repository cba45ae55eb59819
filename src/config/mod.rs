//! Configuration loading and management
//!
//! Configuration comes from a YAML file with every section optional, then
//! environment variables override individual values.

use crate::invoice::i18n::Language;
use crate::invoice::layout::{PageGeometry, SectionHeights};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Hosted backend (REST tables + object storage)
///
/// When `url` is empty the service runs against in-memory storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_key: String::new(),
            bucket: "invoices".to_string(),
        }
    }
}

impl BackendConfig {
    pub fn is_remote(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Transactional email API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub from_name: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from_address: "rechnung@example.com".to_string(),
            from_name: None,
        }
    }
}

impl EmailConfig {
    /// `Name <address>` when a display name is configured
    pub fn sender(&self) -> String {
        match &self.from_name {
            Some(name) if !name.trim().is_empty() => format!("{} <{}>", name, self.from_address),
            _ => self.from_address.clone(),
        }
    }
}

/// Invoice document settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceConfig {
    pub default_language: Language,
    pub payment_term_days: u32,
    pub page: PageGeometry,
    pub sections: SectionHeights,
}

impl Default for InvoiceConfig {
    fn default() -> Self {
        Self {
            default_language: Language::De,
            payment_term_days: 14,
            page: PageGeometry::a4(),
            sections: SectionHeights::default(),
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub email: EmailConfig,
    pub invoice: InvoiceConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply `INVOICER_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("INVOICER_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = lookup("INVOICER_BACKEND_URL") {
            self.backend.url = url;
        }
        if let Some(key) = lookup("INVOICER_BACKEND_KEY") {
            self.backend.service_key = key;
        }
        if let Some(bucket) = lookup("INVOICER_BUCKET") {
            self.backend.bucket = bucket;
        }
        if let Some(api_url) = lookup("INVOICER_EMAIL_API_URL") {
            self.email.api_url = api_url;
        }
        if let Some(key) = lookup("INVOICER_EMAIL_API_KEY") {
            self.email.api_key = key;
        }
        if let Some(from) = lookup("INVOICER_EMAIL_FROM") {
            self.email.from_address = from;
        }
        if let Some(language) = lookup("INVOICER_DEFAULT_LANGUAGE") {
            self.invoice.default_language = language.parse()?;
        }
        if let Some(days) = lookup("INVOICER_PAYMENT_TERM_DAYS") {
            self.invoice.payment_term_days = days.parse()?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(!config.backend.is_remote());
        assert_eq!(config.invoice.payment_term_days, 14);
        assert_eq!(config.invoice.page.available_height(), 257.0);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
backend:
  url: https://project.example.co
  service_key: secret
invoice:
  default_language: en
  page:
    margin_top_mm: 15
"#;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert!(config.backend.is_remote());
        assert_eq!(config.backend.bucket, "invoices");
        assert_eq!(config.invoice.default_language, Language::En);
        assert_eq!(config.invoice.page.margin_top_mm, 15.0);
        assert_eq!(config.invoice.page.height_mm, 297.0);
        assert_eq!(config.invoice.sections.header, 40.0);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = ServiceConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = ServiceConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.email.api_url, config.email.api_url);
        assert_eq!(parsed.invoice.page, config.invoice.page);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("INVOICER_BIND", "0.0.0.0:8080"),
            ("INVOICER_DEFAULT_LANGUAGE", "fr"),
            ("INVOICER_PAYMENT_TERM_DAYS", "30"),
        ]
        .into_iter()
        .collect();

        let config = ServiceConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.invoice.default_language, Language::Fr);
        assert_eq!(config.invoice.payment_term_days, 30);
    }

    #[test]
    fn test_invalid_override_is_an_error() {
        let result = ServiceConfig::default().with_overrides(|key| {
            (key == "INVOICER_DEFAULT_LANGUAGE").then(|| "xx".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_sender_with_name() {
        let mut email = EmailConfig::default();
        email.from_name = Some("Heizöl Nord".to_string());
        assert_eq!(email.sender(), "Heizöl Nord <rechnung@example.com>");
    }

    #[test]
    fn test_from_yaml_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  bind: 127.0.0.1:9000").unwrap();
        let config = ServiceConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
    }
}
