//! Orchestrator tests against a mocked remote instance.
//!
//! Every remote call is expected explicitly; a call without an expectation
//! panics, so these tests also prove which endpoints a run does NOT touch.

use mockall::{predicate, Sequence};
use serde_json::json;

use radsync_core::config::{Definition, EncodeContext, Settings};
use radsync_core::contract::MockRadarrApi;
use radsync_core::remote::{FieldResource, LanguageResource, TagResource};
use radsync_core::sync::{synchronise, SectionReport, SyncReport};

fn settings(value: serde_json::Value) -> Settings {
    serde_json::from_value(value).unwrap()
}

fn resource(value: serde_json::Value) -> FieldResource {
    serde_json::from_value(value).unwrap()
}

fn section<'a>(report: &'a SyncReport, name: &str) -> &'a SectionReport {
    report
        .sections
        .iter()
        .find(|s| s.section == name)
        .unwrap_or_else(|| panic!("no section report for {name:?}"))
}

fn nyaa_settings() -> Settings {
    settings(json!({
        "indexers": {
            "definitions": {
                "Nyaa": {
                    "type": "nyaa",
                    "website_url": "https://nyaa.example.com",
                    "tags": ["anime"]
                }
            }
        }
    }))
}

fn nyaa_schema() -> FieldResource {
    resource(json!({
        "implementation": "Nyaa",
        "configContract": "NyaaSettings",
        "fields": [
            {"name": "websiteUrl", "label": "Website URL"},
            {"name": "additionalParameters", "label": "Additional Parameters"}
        ]
    }))
}

#[tokio::test]
async fn creates_missing_resources_on_an_empty_remote() {
    let settings = nyaa_settings();

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_create_tag()
        .withf(|label| label == "anime")
        .times(1)
        .returning(|label| {
            Ok(TagResource {
                id: 3,
                label: label.to_string(),
            })
        });
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| Ok(vec![]));
    api.expect_indexer_schemas()
        .times(1)
        .returning(|| Ok(vec![nyaa_schema()]));
    api.expect_create_indexer()
        .withf(|resource| {
            resource.name == "Nyaa"
                && resource.is_implementation("Nyaa")
                && resource.tags == vec![3]
                && resource.field_string("websiteUrl").as_deref()
                    == Some("https://nyaa.example.com")
        })
        .times(1)
        .returning(|resource| {
            let mut created = resource.clone();
            created.id = 11;
            Ok(created)
        });
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert!(report.changed());
    assert_eq!(section(&report, "tags").created, 1);
    let indexers = section(&report, "indexers");
    assert_eq!(
        (indexers.created, indexers.updated, indexers.deleted),
        (1, 0, 0)
    );
}

#[tokio::test]
async fn converged_remote_gets_no_mutating_calls() {
    let settings = nyaa_settings();

    // A remote resource that decodes back into exactly the desired definition.
    let ctx = EncodeContext::new([("anime".to_string(), 3)].into(), Default::default());
    let mut remote_indexer = FieldResource {
        id: 11,
        name: "Nyaa".to_string(),
        implementation: "Nyaa".to_string(),
        ..FieldResource::default()
    };
    settings.indexers.definitions["Nyaa"]
        .encode_into(&mut remote_indexer, &ctx)
        .unwrap();

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| {
        Ok(vec![TagResource {
            id: 3,
            label: "anime".to_string(),
        }])
    });
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers()
        .times(1)
        .returning(move || Ok(vec![remote_indexer.clone()]));
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert!(!report.changed());
    assert_eq!(section(&report, "indexers").unchanged, 1);
}

#[tokio::test]
async fn unmanaged_deletions_remove_indexers_before_download_clients() {
    let settings = settings(json!({
        "indexers": {"delete_unmanaged": true},
        "download_clients": {"delete_unmanaged": true}
    }));

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients().times(1).returning(|| {
        Ok(vec![resource(json!({
            "id": 3,
            "name": "transmission",
            "implementation": "Transmission"
        }))])
    });
    api.expect_list_indexers().times(1).returning(|| {
        Ok(vec![resource(json!({
            "id": 7,
            "name": "Old Indexer",
            "implementation": "HDBits"
        }))])
    });
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));

    // An indexer can pin a download client, so it has to go first.
    let mut order = Sequence::new();
    api.expect_delete_indexer()
        .with(predicate::eq(7))
        .times(1)
        .in_sequence(&mut order)
        .returning(|_| Ok(()));
    api.expect_delete_download_client()
        .with(predicate::eq(3))
        .times(1)
        .in_sequence(&mut order)
        .returning(|_| Ok(()));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert_eq!(section(&report, "indexers").deleted, 1);
    assert_eq!(section(&report, "download_clients").deleted, 1);
}

#[tokio::test]
async fn unmanaged_resources_survive_without_the_flag() {
    let settings = settings(json!({}));

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| {
        Ok(vec![resource(json!({
            "id": 7,
            "name": "Prowlarr Managed",
            "implementation": "Torznab"
        }))])
    });
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert!(!report.changed());
    assert_eq!(section(&report, "indexers").unmanaged, 1);
}

#[tokio::test]
async fn dry_run_only_reads_from_the_remote() {
    let settings = nyaa_settings();

    // Mutating endpoints and even schema fetches get no expectations; any
    // call to them fails the test.
    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| Ok(vec![]));
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));

    let report = synchronise(&settings, &api, true).await.unwrap();
    assert!(report.changed());
    assert_eq!(section(&report, "tags").created, 1);
    assert_eq!(section(&report, "indexers").created, 1);
}

#[tokio::test]
async fn quality_profile_create_loads_the_lookup_tables() {
    let settings = settings(json!({
        "quality_profiles": {
            "definitions": {
                "HD": {"qualities": ["Bluray-1080p"]}
            }
        }
    }));

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| Ok(vec![]));
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    // Listed once by the custom format pass and once more for the profile
    // encoding tables.
    api.expect_list_custom_formats()
        .times(2)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_definitions().times(1).returning(|| {
        Ok(serde_json::from_value(json!([
            {"quality": {"id": 1, "name": "SDTV"}},
            {"quality": {"id": 30, "name": "Bluray-1080p"}}
        ]))
        .unwrap())
    });
    api.expect_list_languages().times(1).returning(|| {
        Ok(vec![LanguageResource {
            id: 1,
            name: "English".to_string(),
        }])
    });
    api.expect_create_quality_profile()
        .withf(|resource| {
            resource.name == "HD"
                && resource.cutoff == 30
                && resource.items.len() == 2
                && !resource.items[0].allowed
                && resource.items[1].allowed
        })
        .times(1)
        .returning(|resource| {
            let mut created = resource.clone();
            created.id = 9;
            Ok(created)
        });

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert!(report.changed());
    assert_eq!(section(&report, "quality_profiles").created, 1);
}

#[tokio::test]
async fn custom_format_is_created_before_the_profile_scoring_it() {
    let settings = settings(json!({
        "custom_formats": {
            "definitions": {
                "Freeleech": {
                    "conditions": {
                        "freeleech": {"type": "release_title", "regex": "\\bfreeleech\\b"}
                    }
                }
            }
        },
        "quality_profiles": {
            "definitions": {
                "HD": {
                    "qualities": ["Bluray-1080p"],
                    "custom_formats": {"Freeleech": 25}
                }
            }
        }
    }));

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| Ok(vec![]));
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_custom_format_schemas().times(1).returning(|| {
        Ok(vec![resource(json!({
            "implementation": "ReleaseTitleSpecification",
            "fields": [{"name": "value", "label": "Regular Expression"}]
        }))])
    });
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_definitions().times(1).returning(|| {
        Ok(serde_json::from_value(json!([
            {"quality": {"id": 30, "name": "Bluray-1080p"}}
        ]))
        .unwrap())
    });
    api.expect_list_languages().times(1).returning(|| {
        Ok(vec![LanguageResource {
            id: 1,
            name: "English".to_string(),
        }])
    });

    // A profile scoring a format can only be created after the format. The
    // format pass sees an empty remote; by the time the profile encoding
    // tables are read the format exists and resolves to its id.
    let mut order = Sequence::new();
    api.expect_list_custom_formats()
        .times(1)
        .in_sequence(&mut order)
        .returning(|| Ok(vec![]));
    api.expect_create_custom_format()
        .withf(|format| {
            format.name == "Freeleech"
                && format.specifications.len() == 1
                && format.specifications[0].field_string("value").as_deref()
                    == Some("\\bfreeleech\\b")
        })
        .times(1)
        .in_sequence(&mut order)
        .returning(|format| {
            let mut created = format.clone();
            created.id = 4;
            Ok(created)
        });
    api.expect_list_custom_formats()
        .times(1)
        .in_sequence(&mut order)
        .returning(|| {
            Ok(serde_json::from_value(json!([{"id": 4, "name": "Freeleech"}])).unwrap())
        });
    api.expect_create_quality_profile()
        .withf(|profile| {
            profile.format_items.len() == 1
                && profile.format_items[0].format == 4
                && profile.format_items[0].score == 25
        })
        .times(1)
        .in_sequence(&mut order)
        .returning(|profile| Ok(profile.clone()));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert_eq!(section(&report, "custom_formats").created, 1);
    assert_eq!(section(&report, "quality_profiles").created, 1);
}

#[tokio::test]
async fn drifted_metadata_consumer_gets_updated() {
    let settings = settings(json!({
        "metadata": {"wdtv": {"enable": true}}
    }));

    let mut api = MockRadarrApi::new();
    api.expect_list_tags().times(1).returning(|| Ok(vec![]));
    api.expect_list_download_clients()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_indexers().times(1).returning(|| Ok(vec![]));
    api.expect_list_notifications()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_custom_formats()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_quality_profiles()
        .times(1)
        .returning(|| Ok(vec![]));
    api.expect_list_metadata().times(1).returning(|| {
        Ok(vec![resource(json!({
            "id": 2,
            "name": "WDTV",
            "implementation": "WdtvMetadata",
            "enable": false,
            "fields": [
                {"name": "movieMetadata", "value": true},
                {"name": "movieImages", "value": true}
            ]
        }))])
    });
    api.expect_update_metadata()
        .withf(|id, updated| *id == 2 && updated.attr_bool("enable", false))
        .times(1)
        .returning(|_, updated| Ok(updated.clone()));

    let report = synchronise(&settings, &api, false).await.unwrap();
    assert!(report.changed());
    assert_eq!(section(&report, "metadata").updated, 1);
}
