//! Integration tests for score loaders against fixture files.

use pt_formats::{load_c_source, load_score};
use std::fs;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../tests/fixtures/scores")
}

fn read_fixture(name: &str) -> Vec<u8> {
    let path = fixtures_dir().join(name);
    fs::read(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[test]
fn ode_to_joy_c_source() {
    let source = String::from_utf8(read_fixture("ode_to_joy.c")).unwrap();
    let loaded = load_c_source(&source, 2).unwrap();

    assert!(loaded.header.is_none());
    assert_eq!(loaded.bytes.len(), 115);
    assert_eq!(loaded.summary.total_notes, 19);
    assert_eq!(loaded.summary.note_range, Some((43, 67)));
    assert_eq!(loaded.summary.channels_used, 0b11);
    assert_eq!(loaded.summary.duration_ms, 4800);
    assert!(!loaded.summary.loops);
}

#[test]
fn siren_binary_with_header() {
    let loaded = load_score(&read_fixture("siren.bin"), 2).unwrap();

    let header = loaded.header.expect("siren.bin has a header");
    assert_eq!(header.tone_generators, 2);
    assert!(!header.has_volume());
    assert!(!header.has_percussion());
    assert_eq!(loaded.summary.duration_ms, 600);
    assert!(loaded.summary.loops);
    assert_eq!(loaded.summary.end_offset, loaded.bytes.len());
}

#[test]
fn two_voice_fixtures_reject_one_channel_players() {
    let source = String::from_utf8(read_fixture("ode_to_joy.c")).unwrap();
    assert!(load_c_source(&source, 1).is_err());
    assert!(load_score(&read_fixture("siren.bin"), 1).is_err());
}
