//! Unit tests for identity and instance configuration models.

use session_provisioner::models::identity::SessionIdentity;
use session_provisioner::models::instance_config::{InstanceConfig, InstanceDefaults};

#[test]
fn validated_identity_normalizes_owner() {
    let identity =
        SessionIdentity::validated(" kord_ai-abc123xyz ", "+234 801 234 5678").expect("valid");
    assert_eq!(identity.session_token(), "kord_ai-abc123xyz");
    assert_eq!(identity.owner_number(), "2348012345678");
}

#[test]
fn validated_identity_rejects_bad_token() {
    assert!(SessionIdentity::validated("foo-bar", "2348012345678").is_err());
}

#[test]
fn trusted_identity_skips_validation() {
    let identity = SessionIdentity::trusted("anything".into(), "not-a-number".into());
    assert_eq!(identity.session_token(), "anything");
    assert_eq!(identity.owner_number(), "not-a-number");
}

#[test]
fn identity_serializes_with_record_field_names() {
    let identity = SessionIdentity::trusted("kord_ai-x".into(), "2348012345678".into());
    let json = serde_json::to_value(&identity).expect("serialize");
    assert_eq!(json["session"], "kord_ai-x");
    assert_eq!(json["owner"], "2348012345678");
}

#[test]
fn config_for_identity_has_fixed_key_order() {
    let identity = SessionIdentity::trusted("kord_ai-x".into(), "2348012345678".into());
    let config = InstanceConfig::for_identity(&identity, &InstanceDefaults::default());

    let keys: Vec<&str> = config.iter().map(|(k, _)| k).collect();
    assert_eq!(
        keys,
        [
            "SESSION_ID",
            "OWNER_NUMBER",
            "WORKTYPE",
            "PREFIX",
            "TIMEZONE",
            "OWNER_NAME",
            "BOT_NAME"
        ]
    );
    assert_eq!(config.get("SESSION_ID"), Some("kord_ai-x"));
    assert_eq!(config.get("OWNER_NUMBER"), Some("2348012345678"));
}

#[test]
fn set_replaces_in_place() {
    let mut config = InstanceConfig::new();
    config.set("A", "1");
    config.set("B", "2");
    config.set("A", "3");

    assert_eq!(config.iter().collect::<Vec<_>>(), vec![("A", "3"), ("B", "2")]);
    assert_eq!(config.len(), 2);
}

#[test]
fn empty_config() {
    let config = InstanceConfig::new();
    assert!(config.is_empty());
    assert_eq!(config.get("A"), None);
}
