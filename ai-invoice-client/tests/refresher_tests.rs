use ai_invoice_client::{EnvRefresher, LicenseArtifact, LicenseRefresher, RefreshContext};
use chrono::{TimeZone, Utc};
use serial_test::serial;

const TOKEN_VAR: &str = "AI_INVOICE_TEST_LICENSE_TOKEN";
const EXPIRES_VAR: &str = "AI_INVOICE_TEST_LICENSE_EXPIRES_AT";

fn refresher() -> EnvRefresher {
    EnvRefresher::with_vars(TOKEN_VAR, EXPIRES_VAR)
}

fn set_env(token: Option<&str>, expires: Option<&str>) {
    // SAFETY: tests touching the environment run serially.
    unsafe {
        match token {
            Some(value) => std::env::set_var(TOKEN_VAR, value),
            None => std::env::remove_var(TOKEN_VAR),
        }
        match expires {
            Some(value) => std::env::set_var(EXPIRES_VAR, value),
            None => std::env::remove_var(EXPIRES_VAR),
        }
    }
}

fn context() -> RefreshContext {
    RefreshContext::new("extract_invoice").with_status(401)
}

#[tokio::test]
#[serial]
async fn unset_variable_is_nothing_new() {
    set_env(None, None);
    assert!(refresher().refresh(None, &context()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn blank_variable_is_nothing_new() {
    set_env(Some("   "), None);
    assert!(refresher().refresh(None, &context()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn new_token_with_expiry_is_returned() {
    set_env(Some(" fresh-token \n"), Some("2027-01-31T00:00:00Z"));
    let artifact = refresher().refresh(None, &context()).await.unwrap().unwrap();
    assert_eq!(artifact.token(), "fresh-token");
    assert_eq!(
        artifact.expires_at(),
        Some(Utc.with_ymd_and_hms(2027, 1, 31, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
#[serial]
async fn token_matching_current_is_nothing_new() {
    set_env(Some("same-token"), None);
    let current = LicenseArtifact::new("same-token", None).unwrap();
    assert!(refresher()
        .refresh(Some(&current), &context())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
#[serial]
async fn unparseable_expiry_is_dropped() {
    set_env(Some("fresh-token"), Some("next tuesday"));
    let artifact = refresher().refresh(None, &context()).await.unwrap().unwrap();
    assert_eq!(artifact.expires_at(), None);
}

#[test]
fn default_variables() {
    assert_eq!(EnvRefresher::default().token_var(), "AI_INVOICE_LICENSE_TOKEN");
}
