//! Seed loading for the server entrypoint.

use metasidebar::memory::SeedData;
use metasidebar::models::ListOptions;
use metasidebar::{load_service, Config, MetadataApi};
use std::io::Write;

#[test]
fn demo_data_is_used_without_seed_path() {
    let api = load_service(&Config::default()).expect("service");
    let file = api.file("1001").expect("demo file");
    let listed = api
        .get_editors(&file, &ListOptions::default())
        .expect("list");
    assert_eq!(listed.editors.len(), 1);
}

#[test]
fn seed_file_replaces_demo_data() {
    let mut seed = SeedData::demo();
    seed.files.retain(|file| file.id == "1002");
    seed.instances.clear();

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(serde_json::to_string(&seed).expect("encode").as_bytes())
        .expect("write seed");

    let config = Config {
        seed_path: Some(file.path().to_string_lossy().to_string()),
        ..Config::default()
    };
    let api = load_service(&config).expect("service");
    assert!(api.file("1001").is_err());
    assert!(!api.file("1002").expect("seeded file").can_edit());
}

#[test]
fn broken_seed_file_is_reported() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"{ not json").expect("write seed");
    let config = Config {
        seed_path: Some(file.path().to_string_lossy().to_string()),
        ..Config::default()
    };
    assert!(load_service(&config).is_err());
}
