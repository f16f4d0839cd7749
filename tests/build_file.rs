use hc_adapters::{BuilderKind, Builder, ConfigError};
use hcflow_rust::BuildFile;

#[test]
fn builder_fields_and_provision_list_share_one_document() {
    let json = r#"{
        "type": "clone",
        "build_name": "web",
        "hypercloud_url": "https://api.example",
        "hypercloud_access_token": "tok",
        "template_slug": "ubuntu-22.04",
        "disk_performance_tier_id": "tier-disk",
        "instance_performance_tier_id": "tier-vm",
        "network_id": "net",
        "ssh_private_key_file": "/keys/id_build",
        "disk_size": 20,
        "provision": ["apt-get update", "apt-get -y upgrade"]
    }"#;
    let file = BuildFile::from_json(json).expect("build file válido");
    assert_eq!(file.provision, vec!["apt-get update".to_string(), "apt-get -y upgrade".to_string()]);
    assert_eq!(file.builder.kind, BuilderKind::Clone);
    assert_eq!(file.builder.disk_size, 20);

    let builder = Builder::prepare(file.builder).expect("config válida");
    assert_eq!(builder.config().vm_name, "web");
    assert_eq!(builder.api_config().url, "https://api.example");
}

#[test]
fn provision_is_optional() {
    let file = BuildFile::from_json(r#"{ "type": "vnc", "build_name": "iso" }"#).expect("json válido");
    assert!(file.provision.is_empty());
    assert_eq!(file.builder.kind, BuilderKind::Vnc);
}

#[test]
fn unreadable_and_malformed_files_are_config_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope.json");
    assert!(matches!(BuildFile::load(&missing), Err(ConfigError::Read(_))));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"build_name\": ").expect("escribir");
    assert!(matches!(BuildFile::load(&broken), Err(ConfigError::Parse(_))));
}
