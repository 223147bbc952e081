use ai_invoice_license::{DenialClass, LicenseError};

#[test]
fn unauthorized_class() {
    for err in [
        LicenseError::MissingToken,
        LicenseError::Malformed("bad".into()),
        LicenseError::UnknownKey("k1".into()),
        LicenseError::InvalidSignature,
        LicenseError::Expired("2025-01-01T00:00:00Z".into()),
    ] {
        assert_eq!(err.class(), DenialClass::Unauthorized, "{err}");
    }
}

#[test]
fn forbidden_class() {
    assert_eq!(
        LicenseError::Revoked("token jti".into()).class(),
        DenialClass::Forbidden
    );
    assert_eq!(
        LicenseError::FeatureNotLicensed("predict".into()).class(),
        DenialClass::Forbidden
    );
}

#[test]
fn key_unavailable_class() {
    let err = LicenseError::KeyUnavailable("missing".into());
    assert_eq!(err.class(), DenialClass::Unavailable);
    assert!(format!("{err}").contains("unavailable"));
}

#[test]
fn caller_errors_are_invalid_input() {
    assert_eq!(
        LicenseError::InvalidFeature(String::new()).class(),
        DenialClass::InvalidInput
    );
    assert_eq!(
        LicenseError::InvalidRequest("blank tenant".into()).class(),
        DenialClass::InvalidInput
    );
}

#[test]
fn reasons_are_stable() {
    assert_eq!(LicenseError::InvalidSignature.reason(), "invalid_signature");
    assert_eq!(LicenseError::Expired(String::new()).reason(), "expired");
    assert_eq!(LicenseError::Revoked(String::new()).reason(), "revoked");
    assert_eq!(
        LicenseError::FeatureNotLicensed(String::new()).reason(),
        "feature_not_licensed"
    );
    assert_eq!(LicenseError::UnknownKey(String::new()).reason(), "unknown_key");
}

#[test]
fn messages_name_the_cause() {
    assert!(format!("{}", LicenseError::Expired("2025-01-01T00:00:00Z".into())).contains("expired"));
    assert!(format!("{}", LicenseError::Revoked("subject t1".into())).contains("revoked"));
    let msg = format!("{}", LicenseError::FeatureNotLicensed("predict".into()));
    assert!(msg.contains("predict"));
}

#[test]
fn error_from_serde_json() {
    let serde_err: Result<serde_json::Value, _> = serde_json::from_str("not json");
    let license_err: LicenseError = serde_err.unwrap_err().into();
    assert!(format!("{license_err}").contains("serialization"));
}
