use clap::Parser;
use secrecy::ExposeSecret;
use std::fs;
use tempfile::TempDir;
use zoneforge::cli::Cli;
use zoneforge::config::Settings;
use zoneforge::error::ClientError;
use zoneforge_editor::FailurePolicy;

fn cli(config: &std::path::Path, extra: &[&str]) -> Cli {
    let mut argv = vec!["zoneforge", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(extra);
    argv.extend_from_slice(&["list", "users"]);
    Cli::parse_from(argv)
}

#[test]
fn test_load_from_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("zoneforge.toml");

    let toml = r#"
assume_yes = true

[backend]
base_url = "https://dns.example.org"
timeout_seconds = 15

[auth]
username = "admin"
password = "secret"

[editor]
failure_policy = "rollback"
password_length = 24

[log]
level = "warn"
"#;
    fs::write(&path, toml)?;

    let settings = Settings::new_with_cli(&cli(&path, &[]))?;

    assert_eq!(settings.backend.base_url, "https://dns.example.org");
    assert_eq!(settings.backend.timeout(), Some(std::time::Duration::from_secs(15)));
    assert!(settings.assume_yes);
    assert!(settings.auth.token().is_none());
    assert_eq!(settings.auth.login().map(|(username, _)| username), Some("admin"));
    assert_eq!(
        settings.auth.login().map(|(_, password)| password.expose_secret().to_string()),
        Some("secret".to_string())
    );
    // credentials are redacted as soon as they are loaded
    let printed = format!("{:?}", settings.auth);
    assert!(!printed.contains("secret"));
    assert_eq!(settings.editor.failure_policy, FailurePolicy::Rollback);
    assert_eq!(settings.editor.password_length, 24);
    // unset editor keys keep their defaults
    assert_eq!(settings.editor.record_type_url, "/api/types/recordtype");
    assert_eq!(settings.log_directive(), "zoneforge=warn,zoneforge_editor=warn");

    Ok(())
}

#[test]
fn test_missing_file_uses_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::new_with_cli(&cli(&temp_dir.path().join("absent.toml"), &[]))?;

    assert_eq!(settings.backend.base_url, "http://127.0.0.1:5000");
    assert!(settings.backend.timeout().is_none());
    assert_eq!(settings.editor.failure_policy, FailurePolicy::StayEditing);
    assert_eq!(settings.editor.password_length, 16);
    assert!(!settings.assume_yes);
    assert_eq!(settings.log.level, "info");

    Ok(())
}

#[test]
fn test_cli_overrides_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("zoneforge.toml");
    fs::write(
        &path,
        r#"
[backend]
base_url = "https://dns.example.org"

[editor]
failure_policy = "rollback"
"#,
    )?;

    let settings = Settings::new_with_cli(&cli(
        &path,
        &[
            "--base-url",
            "http://localhost:8000",
            "--token",
            "abc",
            "--failure-policy",
            "stay-editing",
            "--timeout",
            "3",
            "-y",
            "-v",
        ],
    ))?;

    assert_eq!(settings.backend.base_url, "http://localhost:8000");
    assert_eq!(settings.backend.timeout_seconds, Some(3));
    assert_eq!(settings.auth.token().map(|token| token.expose_secret()), Some("abc"));
    assert!(!format!("{:?}", settings).contains("abc"));
    assert_eq!(settings.editor.failure_policy, FailurePolicy::StayEditing);
    assert!(settings.assume_yes);
    assert_eq!(settings.log.level, "debug");

    Ok(())
}

#[test]
fn test_invalid_values_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("zoneforge.toml");

    fs::write(&path, "[backend]\nbase_url = \"dns.example.org\"\n")?;
    let err = Settings::new_with_cli(&cli(&path, &[])).unwrap_err();
    assert!(matches!(err, ClientError::InvalidSettings(_)));

    let err = Settings::new_with_cli(&cli(&path, &["--base-url", "http://ok.example", "--timeout", "0"])).unwrap_err();
    assert!(matches!(err, ClientError::InvalidSettings(_)));

    fs::write(&path, "[editor]\nfailure_policy = \"retry\"\n")?;
    let err = Settings::new_with_cli(&cli(&path, &[])).unwrap_err();
    assert!(matches!(err, ClientError::Config(_)));

    Ok(())
}
