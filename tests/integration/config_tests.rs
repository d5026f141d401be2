use clap::Parser;
use dupscan::cli::Cli;
use dupscan::config::{Config, ConfigError, ENV_PREFIX};
use dupscan::error::ExitCode;
use dupscan::run_app;
use dupscan::scanner::HashAlgorithm;
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::ffi::OsString;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

/// Serializes tests that touch process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_load_full_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupscan.toml");
    fs::write(
        &path,
        r#"
algorithm = "sha256"
chunk_size = 65536
io_threads = 4
verify = true
skip_hidden = true
respect_gitignore = true
ignore_patterns = ["target/", "*.tmp"]
report_name = "dupes.csv"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.chunk_size, 65536);
    assert_eq!(config.io_threads, 4);
    assert!(config.verify);
    assert!(config.skip_hidden);
    assert!(config.respect_gitignore);
    assert_eq!(config.ignore_patterns, vec!["target/", "*.tmp"]);
    assert_eq!(config.report_name, "dupes.csv");
}

#[test]
fn test_env_overrides_defaults() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("DUPSCAN_ALGORITHM", "md5");
    std::env::set_var("DUPSCAN_IO_THREADS", "6");

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract();

    std::env::remove_var("DUPSCAN_ALGORITHM");
    std::env::remove_var("DUPSCAN_IO_THREADS");

    let config = result.unwrap();
    assert_eq!(config.algorithm, HashAlgorithm::Md5);
    assert_eq!(config.io_threads, 6);
    assert_eq!(config.chunk_size, Config::default().chunk_size);
}

#[test]
fn test_cli_flags_win_over_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dupscan.toml");
    fs::write(&path, "algorithm = \"md5\"\nio_threads = 2\n").unwrap();

    let mut config = Config::load_from_path(&path).unwrap();
    let cli = Cli::try_parse_from(["dupscan", "--algorithm", "sha256"]).unwrap();
    config.merge_cli(&cli);

    assert_eq!(config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(config.io_threads, 2);
}

#[test]
fn test_invalid_toml_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "algorithm = [unterminated\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_config_file_sets_report_name() {
    let root = tempdir().unwrap();
    fs::write(root.path().join("a"), b"dup").unwrap();
    fs::write(root.path().join("b"), b"dup").unwrap();

    let conf_dir = tempdir().unwrap();
    let conf = conf_dir.path().join("dupscan.toml");
    fs::write(&conf, "report_name = \"custom_report.csv\"\n").unwrap();

    let args: Vec<OsString> = vec![
        "dupscan".into(),
        "-q".into(),
        "--config".into(),
        conf.as_os_str().to_owned(),
        root.path().as_os_str().to_owned(),
    ];
    let cli = Cli::try_parse_from(args).unwrap();

    let code = run_app(cli).unwrap();
    assert_eq!(code, ExitCode::Success);

    let report = fs::read_to_string(root.path().join("custom_report.csv")).unwrap();
    assert_eq!(report.lines().count(), 3);
    assert!(!root.path().join("duplicates_report.csv").exists());
}
