//! Unit tests for config_store module
//! No filesystem or timing dependencies; documents live in memory.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::time::Duration;

use crate::{
    config_store::{ConfigStore, path_ops},
    error::{ConfigError, LookupFailure},
    field::{Field, FieldKind, RawValue, Section},
    source::MemorySource,
    strategy::{ManagedReloadingStrategy, ReloadState},
};

const DOC: &str = r#"
name = "service"
port = 8080
timeout = "1m30s"

[servers.alpha]
ip = "10.0.0.1"
dc = "eu"

[servers.beta]
ip = "10.0.0.2"
"#;

fn tree() -> Section {
    let mut alpha = Section::new();
    alpha.insert("ip".to_string(), Field::String("10.0.0.1".to_string()));
    let mut servers = Section::new();
    servers.insert("alpha".to_string(), Field::Section(alpha));
    let mut root = Section::new();
    root.insert("servers".to_string(), Field::Section(servers));
    root.insert("port".to_string(), Field::Int(8080));
    root
}

fn open(doc: &str) -> (ConfigStore, MemorySource) {
    let source = MemorySource::new("app.toml", doc);
    let store = ConfigStore::builder()
        .source(source.clone())
        .reloading_strategy(ManagedReloadingStrategy::new())
        .open()
        .unwrap();
    (store, source)
}

#[test]
fn resolve_nested_key() {
    let root = tree();
    assert_eq!(
        path_ops::resolve(&root, "servers.alpha.ip"),
        Ok(&Field::String("10.0.0.1".to_string()))
    );
    assert_eq!(path_ops::resolve(&root, "port"), Ok(&Field::Int(8080)));
}

#[test]
fn resolve_missing_segment() {
    let root = tree();
    assert_eq!(
        path_ops::resolve(&root, "servers.gamma.ip"),
        Err(LookupFailure::Missing {
            segment: "gamma".to_string()
        })
    );
    assert_eq!(
        path_ops::resolve(&root, "servers.alpha.port"),
        Err(LookupFailure::Missing {
            segment: "port".to_string()
        })
    );
}

#[test]
fn resolve_through_non_section() {
    let root = tree();
    assert_eq!(
        path_ops::resolve(&root, "port.value"),
        Err(LookupFailure::NotASection {
            segment: "port".to_string(),
            kind: FieldKind::Int,
        })
    );
}

#[test]
fn resolve_empty_keys_fail_like_missing() {
    let root = tree();
    assert!(path_ops::resolve(&root, "").is_err());
    assert!(path_ops::resolve(&root, "servers.").is_err());
    assert!(path_ops::resolve(&root, ".servers").is_err());
    assert!(!path_ops::contains_key(&root, "servers.alpha."));
}

#[test]
fn contains_key_matches_resolve() {
    let root = tree();
    for key in ["port", "servers", "servers.alpha", "servers.alpha.ip"] {
        assert!(path_ops::contains_key(&root, key), "{key}");
    }
    for key in ["nope", "port.x", "servers.alpha.ip.x"] {
        assert!(!path_ops::contains_key(&root, key), "{key}");
    }
}

#[test]
fn section_at_follows_path() {
    let root = tree();
    let path = vec!["servers".to_string(), "alpha".to_string()];
    let alpha = path_ops::section_at(&root, &path).unwrap();
    assert!(alpha.contains_key("ip"));

    assert!(path_ops::section_at(&root, &["port".to_string()]).is_none());
    assert!(path_ops::section_at(&root, &[]).is_some());
}

#[test]
fn typed_getters() {
    let (store, _) = open(DOC);

    assert_eq!(store.get_string("name").unwrap(), "service");
    assert_eq!(store.get_int64("port").unwrap(), 8080);
    assert_eq!(store.get_uint32("port").unwrap(), 8080);
    assert_eq!(store.get_duration("timeout").unwrap(), Duration::from_secs(90));
    assert_eq!(store.get_string("servers.beta.ip").unwrap(), "10.0.0.2");
}

#[test]
fn getter_reports_type_mismatch() {
    let (store, _) = open(DOC);

    match store.get_int("name") {
        Err(ConfigError::TypeMismatch {
            expected, actual, ..
        }) => {
            assert_eq!(expected, FieldKind::Int);
            assert_eq!(actual, FieldKind::String);
        }
        other => panic!("expected type mismatch, got {other:?}"),
    }
}

#[test]
fn missing_key_is_strict() {
    let (store, _) = open(DOC);

    let err = store.get_string("absent").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.get_or("absent", 7_i64).unwrap(), 7);
    assert!(matches!(
        store.get_or("name", 7_i64),
        Err(ConfigError::TypeMismatch { .. })
    ));
}

#[test]
fn section_view_shares_tree() {
    let (store, _) = open(DOC);
    let servers = store.get_section("servers").unwrap();
    let alpha = servers.get_section("alpha").unwrap();

    assert_eq!(servers.depth(), 1);
    assert_eq!(alpha.depth(), 2);
    assert_eq!(alpha.view_path(), "servers.alpha");
    assert_eq!(alpha.get_string("ip").unwrap(), "10.0.0.1");

    alpha.set("ip", "10.0.0.9").unwrap();
    assert_eq!(store.get_string("servers.alpha.ip").unwrap(), "10.0.0.9");
    assert_eq!(servers.get_string("alpha.ip").unwrap(), "10.0.0.9");
}

#[test]
fn get_section_rejects_scalars() {
    let (store, _) = open(DOC);
    assert!(matches!(
        store.get_section("port"),
        Err(ConfigError::TypeMismatch {
            expected: FieldKind::Section,
            ..
        })
    ));
}

#[test]
fn view_goes_stale_after_tree_replacement() {
    let (store, _) = open(DOC);
    let alpha = store.get_section("servers.alpha").unwrap();

    store.load_bytes(DOC.as_bytes()).unwrap();

    assert!(matches!(
        alpha.get_string("ip"),
        Err(ConfigError::StaleView { .. })
    ));
    assert!(!alpha.contains_key("ip"));
    assert!(store.get_section("servers.alpha").is_ok());
}

#[test]
fn view_goes_stale_when_section_is_overwritten() {
    let (store, _) = open(DOC);
    let servers = store.get_section("servers").unwrap();

    store.set("servers", "none").unwrap();
    assert!(matches!(
        servers.get_string("alpha.ip"),
        Err(ConfigError::StaleView { .. })
    ));
}

#[test]
fn whole_tree_operations_rejected_on_views() {
    let (store, _) = open(DOC);
    let servers = store.get_section("servers").unwrap();

    assert!(matches!(
        servers.load_bytes(b""),
        Err(ConfigError::UnsupportedOnView {
            operation: "load_bytes",
            ..
        })
    ));
    assert!(matches!(
        servers.reload(),
        Err(ConfigError::UnsupportedOnView { .. })
    ));
    assert!(matches!(
        servers.load(),
        Err(ConfigError::UnsupportedOnView { .. })
    ));
}

#[test]
fn set_writes_source() {
    let (store, source) = open(DOC);

    store.set("retries", 3_i64).unwrap();
    assert_eq!(store.get_int("retries").unwrap(), 3);

    let written = String::from_utf8(source.contents()).unwrap();
    assert!(written.contains("retries = 3"));
    assert_eq!(store.reload_state().unwrap(), ReloadState::Fresh);
}

#[test]
fn set_rejects_dotted_and_empty_keys() {
    let (store, _) = open(DOC);

    assert!(matches!(
        store.set("servers.alpha.ip", "x"),
        Err(ConfigError::InvalidKey { .. })
    ));
    assert!(matches!(
        store.set("", "x"),
        Err(ConfigError::InvalidKey { .. })
    ));
}

#[test]
fn set_rejects_unclassifiable_values() {
    let (store, _) = open(DOC);

    let mixed = RawValue::Seq(vec![RawValue::Int(1), RawValue::from("a")]);
    assert!(matches!(
        store.set("mixed", mixed),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(!store.contains_key("mixed"));
}

#[test]
fn set_classifies_strings() {
    let (store, _) = open(DOC);

    store.set("interval", "250ms").unwrap();
    assert_eq!(
        store.get_duration("interval").unwrap(),
        Duration::from_millis(250)
    );
}

#[test]
fn load_bytes_keeps_tree_on_decode_error() {
    let (store, _) = open(DOC);

    assert!(matches!(
        store.load_bytes(b"name = "),
        Err(ConfigError::Decode { .. })
    ));
    assert_eq!(store.get_string("name").unwrap(), "service");
}

#[test]
fn load_stream_replaces_tree() {
    let (store, _) = open(DOC);

    store.load_stream(&b"name = \"other\"\n"[..]).unwrap();
    assert_eq!(store.get_string("name").unwrap(), "other");
    assert!(!store.contains_key("port"));
}

#[test]
fn managed_refresh_triggers_reload_on_next_read() {
    let source = MemorySource::new("app.toml", DOC);
    let strategy = ManagedReloadingStrategy::new();
    let handle = strategy.handle();
    let store = ConfigStore::builder()
        .source(source.clone())
        .reloading_strategy(strategy)
        .open()
        .unwrap();

    source.replace("name = \"edited\"\n");
    assert_eq!(store.get_string("name").unwrap(), "service");

    handle.refresh();
    assert_eq!(store.reload_state().unwrap(), ReloadState::Stale);
    assert_eq!(store.get_string("name").unwrap(), "edited");
    assert_eq!(store.reload_state().unwrap(), ReloadState::Fresh);
}

#[test]
fn failed_implicit_reload_keeps_previous_tree() {
    let source = MemorySource::new("app.toml", DOC);
    let strategy = ManagedReloadingStrategy::new();
    let handle = strategy.handle();
    let store = ConfigStore::builder()
        .source(source.clone())
        .reloading_strategy(strategy)
        .open()
        .unwrap();

    source.replace("name = ");
    handle.refresh();

    assert_eq!(store.get_string("name").unwrap(), "service");
    assert_eq!(store.reload_state().unwrap(), ReloadState::Fresh);
    assert!(matches!(store.reload(), Err(ConfigError::Decode { .. })));
}

#[test]
fn save_stream_encodes_document() {
    let (store, _) = open(DOC);

    let mut out = Vec::new();
    store.save_stream(&mut out).unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("[servers.alpha]"));
    assert!(text.contains("timeout = \"1m30s\""));
}

#[test]
fn save_to_other_source() {
    let (store, _) = open(DOC);
    let target = MemorySource::new("copy.toml", "");

    store.save_to(&target).unwrap();

    let copy = ConfigStore::builder().source(target).open().unwrap();
    assert_eq!(copy.snapshot().unwrap(), store.snapshot().unwrap());
}

#[test]
fn accessors_describe_source() {
    let (store, _) = open(DOC);

    assert_eq!(store.format(), "toml");
    assert_eq!(store.locator(), "app.toml");
    assert_eq!(store.file_name(), Some("app"));
    assert_eq!(store.depth(), 0);
    assert_eq!(store.view_path(), "");

    let nested = ConfigStore::builder()
        .source(MemorySource::new("conf/app.toml", DOC))
        .open()
        .unwrap();
    assert_eq!(nested.file_name(), Some("app"));
    assert_eq!(nested.locator(), "conf/app.toml");
}

#[test]
fn slice_getters_return_copies() {
    let (store, _) = open("tags = [\"api\", \"edge\"]\nports = [80, 443]\n");

    let mut tags = store.get_string_slice("tags").unwrap();
    tags[0] = "changed".to_string();
    tags.push("extra".to_string());

    assert_eq!(store.get_string_slice("tags").unwrap(), vec!["api", "edge"]);
    assert_eq!(store.get_uint_slice("ports").unwrap(), vec![80_usize, 443]);
}
