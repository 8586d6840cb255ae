//! Unit tests for session configuration.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key: &NamedTempFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key.path().display().to_string()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn resolve(
    vars: HashMap<&'static str, String>,
    overrides: &SessionOverrides,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    session_settings(overrides, &mock_env(vars), mode)
}

#[rstest]
fn release_accepts_a_complete_environment() {
    let key = key_file(64);
    let settings = resolve(release_vars(&key), &SessionOverrides::default(), BuildMode::Release)
        .expect("valid release config");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
}

#[rstest]
fn overrides_win_over_the_environment() {
    let key = key_file(64);
    let other = key_file(64);
    let mut vars = release_vars(&other);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "Lax".to_owned());
    let overrides = SessionOverrides {
        key_file: Some(key.path().to_path_buf()),
        cookie_secure: Some(true),
    };
    let settings = resolve(vars, &overrides, BuildMode::Release).expect("valid config");
    assert!(settings.cookie_secure);
    assert_eq!(
        fingerprint::key_fingerprint(&settings.key),
        fingerprint::key_fingerprint(&Key::derive_from(&[b'k'; 64]))
    );
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(#[case] missing: &'static str) {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.remove(missing);
    let err = resolve(vars, &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("missing toggle must fail");
    assert!(
        matches!(err, SessionConfigError::MissingEnv { name } if name == missing),
        "{err}"
    );
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(SAMESITE_ENV, "Sometimes")]
fn release_rejects_invalid_values(#[case] name: &'static str, #[case] value: &str) {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(name, value.to_owned());
    let err = resolve(vars, &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("invalid value must fail");
    assert!(matches!(err, SessionConfigError::InvalidEnv { .. }), "{err}");
}

#[rstest]
fn release_rejects_same_site_none_without_secure_cookies() {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());
    let err = resolve(vars, &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("insecure SameSite=None must fail");
    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_rejects_ephemeral_keys() {
    let key = key_file(64);
    let mut vars = release_vars(&key);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());
    let err = resolve(vars, &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("ephemeral keys are dev only");
    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_short_keys() {
    let key = key_file(16);
    let err = resolve(release_vars(&key), &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("short key must fail");
    assert!(
        matches!(err, SessionConfigError::KeyTooShort { length: 16, .. }),
        "{err}"
    );
}

#[rstest]
fn release_fails_when_the_key_file_is_missing() {
    let mut vars = HashMap::from([
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);
    vars.insert(KEY_FILE_ENV, "/nonexistent/retail/session_key".to_owned());
    let err = resolve(vars, &SessionOverrides::default(), BuildMode::Release)
        .err()
        .expect("missing key must fail");
    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn debug_falls_back_to_lax_secure_cookies_and_a_generated_key() {
    let vars = HashMap::from([(KEY_FILE_ENV, "/nonexistent/retail/session_key".to_owned())]);
    let settings = resolve(vars, &SessionOverrides::default(), BuildMode::Debug)
        .expect("debug tolerates missing config");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[rstest]
#[case("1", true)]
#[case("TRUE", true)]
#[case(" y ", true)]
#[case("0", false)]
#[case("no", false)]
#[case("bogus", true)]
fn debug_parses_cookie_secure_leniently(#[case] raw: &str, #[case] expected: bool) {
    let vars = HashMap::from([
        (COOKIE_SECURE_ENV, raw.to_owned()),
        (KEY_FILE_ENV, "/nonexistent/retail/session_key".to_owned()),
    ]);
    let settings =
        resolve(vars, &SessionOverrides::default(), BuildMode::Debug).expect("debug config");
    assert_eq!(settings.cookie_secure, expected);
}
