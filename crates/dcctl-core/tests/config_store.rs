use tempfile::TempDir;

use dcctl_core::config::ClientConfig;
use dcctl_core::config::store::ConfigStore;

#[test]
fn load_missing_returns_empty_config() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_dir(&temp.path().join("dcctl"));

    let config = store.load().unwrap();

    assert_eq!(config, ClientConfig::default());
}

#[test]
fn save_then_load_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_dir(&temp.path().join("nested").join("dcctl"));

    let mut config = ClientConfig::new("acme", "prod", "user:token");
    config.timeout_secs = Some(15);

    store.save(&config).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, config);
    assert!(store.config_path().ends_with("dcctl/config.toml"));
}

#[test]
fn malformed_file_reports_path() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_dir(temp.path());
    std::fs::write(store.config_path(), "organization = \"acme\"\ndeployment = \n").unwrap();

    let err = store.load().unwrap_err();

    let rendered = format!("{err:#}");
    assert!(rendered.contains("config.toml"));
    assert!(rendered.contains("TOML parsing error"));
}
