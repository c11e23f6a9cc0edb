//! Unit tests for the built-in codecs and the registry
//! No filesystem, timing, or external dependencies.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::{sync::Arc, time::Duration};

use chrono::{TimeZone, Utc};

use crate::{
    codec::{Codec, CodecError, CodecRegistry, Decoder, Encoder, TomlCodec, YamlCodec},
    field::{Field, FieldError, Section},
};

const TOML_DOC: &str = r#"
name = "service"
port = 8080
ratio = 0.5
enabled = true
timeout = "1m30s"
started = 2024-03-01T12:00:00Z
tags = ["a", "b"]

[servers.alpha]
ip = "10.0.0.1"
"#;

const YAML_DOC: &str = r#"
name: service
port: 8080
ratio: 0.5
enabled: true
timeout: 1m30s
started: "2024-03-01T12:00:00Z"
tags: [a, b]
servers:
  alpha:
    ip: 10.0.0.1
"#;

fn section<'a>(tree: &'a Section, key: &str) -> &'a Section {
    tree.get(key).and_then(Field::as_section).unwrap()
}

fn assert_sample_tree(tree: &Section) {
    assert_eq!(tree.get("name"), Some(&Field::String("service".to_string())));
    assert_eq!(tree.get("port"), Some(&Field::Int(8080)));
    assert_eq!(tree.get("ratio"), Some(&Field::Float(0.5)));
    assert_eq!(tree.get("enabled"), Some(&Field::Bool(true)));
    assert_eq!(
        tree.get("timeout"),
        Some(&Field::Duration(Duration::from_secs(90)))
    );
    assert_eq!(
        tree.get("started"),
        Some(&Field::Time(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap().fixed_offset()
        ))
    );
    assert_eq!(
        tree.get("tags"),
        Some(&Field::StringSlice(vec!["a".to_string(), "b".to_string()]))
    );

    let alpha = section(section(tree, "servers"), "alpha");
    assert_eq!(alpha.get("ip"), Some(&Field::String("10.0.0.1".to_string())));
}

#[test]
fn toml_decode_classifies_every_kind() {
    let tree = TomlCodec.decode(TOML_DOC.as_bytes()).unwrap();
    assert_sample_tree(&tree);
}

#[test]
fn yaml_decode_classifies_every_kind() {
    let tree = YamlCodec.decode(YAML_DOC.as_bytes()).unwrap();
    assert_sample_tree(&tree);
}

#[test]
fn toml_round_trip() {
    let tree = TomlCodec.decode(TOML_DOC.as_bytes()).unwrap();
    let bytes = TomlCodec.encode(&tree).unwrap();
    assert_eq!(TomlCodec.decode(&bytes).unwrap(), tree);
}

#[test]
fn yaml_round_trip() {
    let tree = YamlCodec.decode(YAML_DOC.as_bytes()).unwrap();
    let bytes = YamlCodec.encode(&tree).unwrap();
    assert_eq!(YamlCodec.decode(&bytes).unwrap(), tree);
}

#[test]
fn formats_agree_on_the_same_tree() {
    let from_toml = TomlCodec.decode(TOML_DOC.as_bytes()).unwrap();
    let as_yaml = YamlCodec.encode(&from_toml).unwrap();
    assert_eq!(YamlCodec.decode(&as_yaml).unwrap(), from_toml);
}

#[test]
fn toml_local_datetimes_are_utc() {
    let tree = TomlCodec
        .decode(b"at = 2024-03-01T08:30:00\nday = 2024-03-01\n")
        .unwrap();

    assert_eq!(
        tree.get("at"),
        Some(&Field::Time(
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap().fixed_offset()
        ))
    );
    assert_eq!(
        tree.get("day"),
        Some(&Field::Time(
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().fixed_offset()
        ))
    );
}

#[test]
fn toml_rejects_bare_times() {
    let result = TomlCodec.decode(b"at = 08:30:00\n");
    assert!(matches!(
        result,
        Err(CodecError::Field(FieldError::UnsupportedDatetime { .. }))
    ));
}

#[test]
fn toml_rejects_mixed_arrays() {
    let result = TomlCodec.decode(b"mixed = [1, \"a\"]\n");
    assert!(matches!(
        result,
        Err(CodecError::Field(FieldError::MixedSequence { .. }))
    ));
}

#[test]
fn toml_syntax_error() {
    assert!(matches!(
        TomlCodec.decode(b"name = "),
        Err(CodecError::Syntax(_))
    ));
}

#[test]
fn yaml_empty_document_is_empty_tree() {
    assert!(YamlCodec.decode(b"").unwrap().is_empty());
    assert!(YamlCodec.decode(b"---\n").unwrap().is_empty());
}

#[test]
fn yaml_root_must_be_mapping() {
    assert!(matches!(
        YamlCodec.decode(b"- a\n- b\n"),
        Err(CodecError::NotAMapping(_))
    ));
}

#[test]
fn yaml_rejects_null_values() {
    assert!(matches!(
        YamlCodec.decode(b"key: ~\n"),
        Err(CodecError::Field(FieldError::Null))
    ));
}

#[test]
fn yaml_stringifies_scalar_keys() {
    let tree = YamlCodec.decode(b"1: one\ntrue: yes\n").unwrap();
    assert_eq!(tree.get("1"), Some(&Field::String("one".to_string())));
    assert!(tree.contains_key("true"));
}

#[test]
fn yaml_rejects_unsigned_overflow() {
    assert!(matches!(
        YamlCodec.decode(b"big: 18446744073709551615\n"),
        Err(CodecError::Field(FieldError::NumberOutOfRange { .. }))
    ));
}

#[test]
fn registry_defaults() {
    let registry = CodecRegistry::default();

    assert!(registry.supports("toml"));
    assert!(registry.supports("yml"));
    assert!(registry.supports("yaml"));
    assert!(!registry.supports("json"));
    assert_eq!(registry.formats(), vec!["toml", "yaml", "yml"]);
}

#[test]
fn registry_last_registration_wins() {
    struct Fixed;

    impl Decoder for Fixed {
        fn decode(&self, _bytes: &[u8]) -> Result<Section, CodecError> {
            let mut tree = Section::new();
            tree.insert("fixed".to_string(), Field::Bool(true));
            Ok(tree)
        }
    }

    let mut registry = CodecRegistry::default();
    let codec = Codec::from_pair(TomlCodec).with_decoder(Arc::new(Fixed));
    registry.register("toml", codec);

    let tree = registry.lookup("toml").unwrap().decode(b"ignored").unwrap();
    assert_eq!(tree.get("fixed"), Some(&Field::Bool(true)));
}

#[test]
fn registry_empty() {
    let registry = CodecRegistry::empty();
    assert!(registry.lookup("toml").is_none());
    assert!(registry.formats().is_empty());
}
