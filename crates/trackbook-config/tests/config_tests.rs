use std::{fs, path::PathBuf};

use tempfile::tempdir;
use trackbook_config::{Config, ConfigError, ConfigManager};

#[test]
fn default_config_matches_documented_values() {
    let cfg = Config::default();

    assert_eq!(cfg.backup_retention, 5);
    assert_eq!(cfg.delete_substitute, None);
    assert!(cfg.color);
    assert_eq!(cfg.log_filter, "trackbook=info");
    assert!(cfg.data_dir.is_none());
}

#[test]
fn missing_file_loads_defaults() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::new(dir.path().join("config.json"));
    assert_eq!(manager.load().expect("load config"), Config::default());
}

#[test]
fn config_manager_persists_and_loads_config() {
    let dir = tempdir().expect("tempdir");
    let manager = ConfigManager::with_base_dir(dir.path().join("home")).expect("manager");

    let cfg = Config {
        data_dir: Some(PathBuf::from("/srv/books")),
        backup_retention: 9,
        delete_substitute: Some("Imbalance".into()),
        color: false,
        log_filter: "trackbook=debug".into(),
    };

    manager.save(&cfg).expect("save config");
    assert!(manager.config_path().ends_with("config.json"));
    assert!(!dir.path().join("home/config.json.tmp").exists());
    assert_eq!(manager.load().expect("load config"), cfg);
}

#[test]
fn partial_files_fill_in_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "color": false }"#).unwrap();

    let cfg = ConfigManager::new(path).load().expect("load config");
    assert!(!cfg.color);
    assert_eq!(cfg.backup_retention, 5);
    assert_eq!(cfg.log_filter, "trackbook=info");
}

#[test]
fn malformed_file_is_a_serde_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, "{ color: ").unwrap();

    let err = ConfigManager::new(path).load().unwrap_err();
    assert!(matches!(err, ConfigError::Serde(_)));
}

#[test]
fn invalid_settings_are_refused_on_load_and_save() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{ "backup_retention": 0 }"#).unwrap();
    let manager = ConfigManager::new(path);

    assert!(matches!(
        manager.load().unwrap_err(),
        ConfigError::Invalid { field: "backup_retention", .. }
    ));

    let cfg = Config {
        log_filter: "  ".into(),
        ..Config::default()
    };
    assert!(matches!(
        manager.save(&cfg).unwrap_err(),
        ConfigError::Invalid { field: "log_filter", .. }
    ));
}
