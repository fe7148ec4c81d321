// tests/watcher_config.rs
use event_feed_watcher::config::watcher::{ENV_CONFIG_PATH, PAGE_URL};
use event_feed_watcher::{WatchError, WatcherConfig};
use std::path::PathBuf;
use std::{env, fs};

#[test]
fn load_from_toml_and_json() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("watcher.toml");
    fs::write(
        &p_toml,
        r#"
page_url = "https://host.test/o/organizer-9"
feed_title = "Organizer 9"
"#,
    )
    .unwrap();
    let t = WatcherConfig::load_from(&p_toml).unwrap();
    assert_eq!(t.page_url, "https://host.test/o/organizer-9");
    assert_eq!(t.feed_title, "Organizer 9");
    assert_eq!(t.timeout_secs, 20);

    let p_json = dir.path().join("watcher.json");
    fs::write(&p_json, r#"{"seen_path": "state/seen.json"}"#).unwrap();
    let j = WatcherConfig::load_from(&p_json).unwrap();
    assert_eq!(j.seen_path, PathBuf::from("state/seen.json"));
    assert_eq!(j.page_url, PAGE_URL);
}

#[test]
fn invalid_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("watcher.toml");
    fs::write(&p, r#"page_url = "not a url""#).unwrap();
    assert!(matches!(
        WatcherConfig::load_from(&p),
        Err(WatchError::Config(_))
    ));
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_CONFIG_PATH);

    // 1) Nothing on disk → built-in defaults
    let v = WatcherConfig::load_default().unwrap();
    assert_eq!(v, WatcherConfig::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("watcher.toml"), r#"feed_path = "public/feed.xml""#).unwrap();
    let vt = WatcherConfig::load_default().unwrap();
    assert_eq!(vt.feed_path, PathBuf::from("public/feed.xml"));

    // 3) Env wins over the fallback
    let p_env = tmp.path().join("override.json");
    fs::write(&p_env, r#"{"feed_path": "env/feed.xml"}"#).unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    let ve = WatcherConfig::load_default().unwrap();
    assert_eq!(ve.feed_path, PathBuf::from("env/feed.xml"));

    // 4) Env pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(WatcherConfig::load_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}
