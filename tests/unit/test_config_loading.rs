use morpho::core::config::MorphoConfig;
use morpho::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn absent_file_falls_back_to_defaults() {
    // Explicit None and no morpho.toml in scope: defaults apply.
    let dir = tempfile::tempdir().unwrap();
    let config = MorphoConfig::from_file(&dir.path().join("morpho.toml"));
    assert!(config.is_err());

    let config = MorphoConfig::default();
    assert_eq!(config.storage.user_root, PathBuf::from("user-transformations"));
    assert_eq!(config.engine.name, "rulemap");
}

#[test]
fn explicit_missing_path_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = MorphoConfig::load(Some(&missing)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn full_config_round_trips_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("morpho.toml");
    std::fs::write(
        &path,
        r#"
        [storage]
        builtin_root = "shipped"
        user_root = "mine"
        scratch_root = "scratch"

        [engine]
        name = "rulemap"

        [limits]
        run_timeout_seconds = 7
        chain_timeout_seconds = 21
        "#,
    )
    .unwrap();

    let config = MorphoConfig::load(Some(&path)).unwrap();
    assert_eq!(config.storage.builtin_root, PathBuf::from("shipped"));
    assert_eq!(config.storage.user_root, PathBuf::from("mine"));
    assert_eq!(config.storage.scratch_root, Some(PathBuf::from("scratch")));
    assert_eq!(config.run_timeout(), Duration::from_secs(7));
    assert_eq!(config.chain_timeout(), Duration::from_secs(21));
}

#[test]
fn malformed_toml_is_a_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("morpho.toml");
    std::fs::write(&path, "storage = 12").unwrap();
    let err = MorphoConfig::load(Some(&path)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
