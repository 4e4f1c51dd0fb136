use super::*;
use chrono::TimeZone;

#[test]
fn test_parse_valid_name() {
    let name = MigrationName::parse("20240102000000_add_col").unwrap();
    assert_eq!(name.id(), "20240102000000");
    assert_eq!(name, "20240102000000_add_col");
}

#[test]
fn test_parse_rejects_missing_separator() {
    let err = MigrationName::parse("20240102000000").unwrap_err();
    assert!(err.contains("<timestamp>_<label>"));
}

#[test]
fn test_parse_rejects_short_timestamp() {
    assert!(MigrationName::parse("2024_init").is_err());
    assert!(MigrationName::parse("2024010200000x_init").is_err());
}

#[test]
fn test_parse_rejects_empty_label() {
    assert!(MigrationName::parse("20240102000000_").is_err());
}

#[test]
fn test_from_parts_formats_compact_utc_timestamp() {
    let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
    let name = MigrationName::from_parts(at, "add_users");
    assert_eq!(name.as_str(), "20240309070501_add_users");
    assert_eq!(name.id().len(), TIMESTAMP_LEN);
}

#[test]
fn test_ordering_is_chronological() {
    let earlier = MigrationName::parse("20231231235959_zzz").unwrap();
    let later = MigrationName::parse("20240101000000_aaa").unwrap();
    assert!(earlier < later);
}

#[test]
fn test_deserialize_validates() {
    let ok: Result<MigrationName, _> = serde_yaml::from_str("\"20240101000000_init\"");
    assert!(ok.is_ok());
    let bad: Result<MigrationName, _> = serde_yaml::from_str("\"init\"");
    assert!(bad.is_err());
}
