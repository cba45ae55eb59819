//! Integration tests for configuration loading and its effect on layout

use invoicer::invoice::layout::SectionKind;
use invoicer::prelude::*;

#[test]
fn test_full_yaml_config() {
    let yaml = r#"
server:
  bind: 0.0.0.0:8080
backend:
  url: https://project.example.co
  service_key: service-role-key
  bucket: rechnungen
email:
  api_key: re_123
  from_address: rechnung@heizoel-nord.test
  from_name: Heizöl Nord
invoice:
  default_language: nl
  payment_term_days: 7
"#;

    let config = ServiceConfig::from_yaml_str(yaml).unwrap();

    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert!(config.backend.is_remote());
    assert_eq!(config.backend.bucket, "rechnungen");
    assert_eq!(
        config.email.sender(),
        "Heizöl Nord <rechnung@heizoel-nord.test>"
    );
    assert_eq!(config.invoice.default_language, Language::Nl);
    assert_eq!(config.invoice.payment_term_days, 7);
}

#[test]
fn test_empty_yaml_is_default() {
    let config = ServiceConfig::from_yaml_str("{}").unwrap();

    assert!(!config.backend.is_remote());
    assert_eq!(config.invoice.default_language, Language::De);
    assert_eq!(config.invoice.page, PageGeometry::a4());
}

#[test]
fn test_unknown_language_in_yaml_is_rejected() {
    let yaml = "invoice:\n  default_language: klingon\n";
    assert!(ServiceConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn test_env_overrides_win_over_yaml() {
    let config = ServiceConfig::from_yaml_str("backend:\n  bucket: from-yaml\n")
        .unwrap()
        .with_overrides(|key| match key {
            "INVOICER_BUCKET" => Some("from-env".to_string()),
            "INVOICER_EMAIL_API_KEY" => Some("secret".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(config.backend.bucket, "from-env");
    assert_eq!(config.email.api_key, "secret");
}

#[test]
fn test_configured_section_heights_drive_layout() {
    let yaml = r#"
invoice:
  sections:
    footer: 100
    table_row: 20
"#;
    let config = ServiceConfig::from_yaml_str(yaml).unwrap();

    let layout = compute_layout(config.invoice.page, &config.invoice.sections, 5);

    // 40 + 30 + 45 + 10 + 5 * 20 + 35 + 100 = 360 mm on a 257 mm page
    assert!(layout.scale < 1.0);
    assert!((layout.scale - 257.0 / 360.0).abs() < 1e-9);
    let footer = layout.section(SectionKind::Footer).unwrap();
    assert!((footer.bottom_mm() - (20.0 + 257.0)).abs() < 1e-9);
}
