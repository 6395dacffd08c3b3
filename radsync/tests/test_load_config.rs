use std::fs::write;

use serial_test::serial;
use tempfile::NamedTempFile;

/// A full config exercising every settings section parses into the model.
#[test]
#[serial]
fn load_config_success_with_all_sections() {
    let config_yaml = r#"
radarr:
  hostname: "radarr.example.com"
  port: 17878
  protocol: https
  api_key: "0123456789abcdef0123456789abcdef"
  settings:
    tags:
      definitions:
        - anime
    download_clients:
      definitions:
        Transmission:
          type: transmission
          host: transmission
          port: 9091
    indexers:
      delete_unmanaged: true
      definitions:
        Nyaa:
          type: nyaa
          website_url: "https://nyaa.example.com"
          tags:
            - anime
    notifications:
      definitions:
        Discord:
          type: discord
          webhook_url: "https://discord.example.com/webhook"
    custom_formats:
      definitions:
        Freeleech:
          conditions:
            freeleech:
              type: release_title
              regex: "\\bfreeleech\\b"
    quality_profiles:
      definitions:
        HD:
          upgrades_allowed: true
          upgrade_until_quality: Bluray-1080p
          qualities:
            - Bluray-1080p
            - name: WEB 1080p
              members:
                - WEBDL-1080p
                - WEBRip-1080p
          custom_formats:
            Freeleech: 10
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let document =
        radsync::load_config::load_config(config_file.path()).expect("Config should load");
    let instances = document.radarr.resolve_instances();
    assert_eq!(instances.len(), 1);

    let instance = &instances[0];
    assert_eq!(instance.host_url(), "https://radarr.example.com:17878");
    assert!(instance.api_key.is_some());
    assert!(instance.settings.indexers.delete_unmanaged);
    assert_eq!(instance.settings.indexers.definitions.len(), 1);
    assert_eq!(instance.settings.quality_profiles.definitions.len(), 1);
    assert_eq!(instance.settings.custom_formats.definitions.len(), 1);
    assert_eq!(
        instance.settings.referenced_tag_labels().len(),
        1,
        "tags section and indexer reference collapse to one label"
    );
}

/// Instances inherit connection details from the global block.
#[test]
#[serial]
fn load_config_with_multiple_instances() {
    let config_yaml = r#"
radarr:
  port: 7878
  instances:
    radarr-hd: {}
    radarr-4k:
      hostname: "radarr-4k.example.com"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let document =
        radsync::load_config::load_config(config_file.path()).expect("Config should load");
    let instances = document.radarr.resolve_instances();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].host_url(), "http://radarr-4k.example.com:7878");
    assert_eq!(instances[1].host_url(), "http://radarr-hd:7878");
}

#[test]
#[serial]
fn load_config_rejects_invalid_yaml() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "radarr: [not: a, mapping").unwrap();

    let err = radsync::load_config::load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("parse"), "got: {err}");
}

#[test]
#[serial]
fn load_config_rejects_out_of_range_values() {
    let config_yaml = r#"
radarr:
  settings:
    indexers:
      definitions:
        Nyaa:
          type: nyaa
          website_url: "https://nyaa.example.com"
          priority: 51
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = radsync::load_config::load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("priority"), "got: {err}");
}

#[test]
#[serial]
fn load_config_rejects_malformed_api_key() {
    let config_yaml = r#"
radarr:
  api_key: "too-short"
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let err = radsync::load_config::load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("32"), "got: {err}");
}
