// tests/ingest_sources.rs
use csdept_news::ingest::sources::{
    default_sources, load_sources_default, load_sources_from, ENV_SOURCES_PATH,
};
use csdept_news::{Category, Region};
use std::{env, fs};

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("news_sources.toml");
    fs::write(
        &p_toml,
        r#"
[[sources]]
url = "https://research.test/rss"
name = " Research Desk "
category = "Research"
region = "local"

[[sources]]
url = "https://RESEARCH.test/rss"
name = "Duplicate"
category = "AI"
region = "international"
"#,
    )
    .unwrap();
    let v = load_sources_from(&p_toml).unwrap();
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].name, "Research Desk");
    assert_eq!(v[0].region, Region::Local);

    let p_json = dir.path().join("news_sources.json");
    fs::write(
        &p_json,
        r#"[{"url":"https://sec.test/feed","name":"Sec","category":"Cybersecurity","region":"international"}]"#,
    )
    .unwrap();
    let vj = load_sources_from(&p_json).unwrap();
    assert_eq!(vj[0].category, Category::Cybersecurity);
}

#[test]
fn unknown_category_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.json");
    fs::write(
        &p,
        r#"[{"url":"https://x.test/feed","name":"X","category":"Gardening","region":"local"}]"#,
    )
    .unwrap();
    assert!(load_sources_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // isolate CWD so the repo's own config/ is never read
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_SOURCES_PATH);

    // 1) nothing configured -> built-in registry
    let v = load_sources_default().unwrap();
    assert_eq!(v, default_sources());

    // 2) ./config/news_sources.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("news_sources.toml"),
        r#"
[[sources]]
url = "https://toml.test/feed"
name = "From TOML"
category = "Software"
region = "international"
"#,
    )
    .unwrap();
    let vt = load_sources_default().unwrap();
    assert_eq!(vt.len(), 1);
    assert_eq!(vt[0].name, "From TOML");

    // 3) env var wins
    let p_env = tmp.path().join("override.json");
    fs::write(
        &p_env,
        r#"[{"url":"https://env.test/feed","name":"From Env","category":"AI","region":"local"}]"#,
    )
    .unwrap();
    env::set_var(ENV_SOURCES_PATH, &p_env);
    let ve = load_sources_default().unwrap();
    assert_eq!(ve[0].name, "From Env");

    // 4) env var pointing nowhere is an error, not a silent fallback
    env::set_var(ENV_SOURCES_PATH, tmp.path().join("missing.toml"));
    assert!(load_sources_default().is_err());

    env::remove_var(ENV_SOURCES_PATH);
    env::set_current_dir(old).unwrap();
}
