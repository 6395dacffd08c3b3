//! Notification connection settings.
//!
//! ```yaml
//! notifications:
//!   delete_unmanaged: false
//!   definitions:
//!     Email:
//!       type: "email"
//!       notification_triggers:
//!         on_health_issue: true
//!         include_health_warnings: false
//!       tags:
//!         - "example"
//!       server: "smtp.example.com"
//!       port: 465
//!       use_encryption: true
//!       from_address: "radarr@example.com"
//!       recipient_addresses:
//!         - "admin@example.com"
//! ```
//!
//! OAuth2-gated targets (e.g. Trakt) cannot be managed declaratively and must
//! be configured by hand; they decode as unmanaged here. With
//! `delete_unmanaged` enabled such hand-configured connections are removed on
//! every run, so the CLI warns before applying deletions in this section.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::json;

use super::{Definition, EncodeContext};
use crate::contract::ApiError;
use crate::remote::FieldResource;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationsSettings {
    /// Delete remote connections not declared here. Removes manually
    /// configured connections (including OAuth-gated ones) on every run.
    pub delete_unmanaged: bool,
    pub definitions: BTreeMap<String, Notification>,
}

/// Event conditions controlling when a connection is invoked.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotificationTriggers {
    /// Notify when a release is grabbed from an indexer.
    pub on_grab: bool,
    /// Notify when a movie file is imported.
    pub on_import: bool,
    /// Notify when an imported file upgrades an existing one.
    pub on_upgrade: bool,
    /// Notify when a movie file is renamed.
    pub on_rename: bool,
    pub on_movie_added: bool,
    pub on_movie_delete: bool,
    pub on_movie_file_delete: bool,
    /// Notify on health check failures.
    pub on_health_issue: bool,
    /// Also notify on health warnings. Requires `on_health_issue`.
    pub include_health_warnings: bool,
    /// Notify when Radarr itself is updated.
    pub on_application_update: bool,
}

const TRIGGER_ATTRS: &[(&str, fn(&NotificationTriggers) -> bool)] = &[
    ("onGrab", |t| t.on_grab),
    ("onDownload", |t| t.on_import),
    ("onUpgrade", |t| t.on_upgrade),
    ("onRename", |t| t.on_rename),
    ("onMovieAdded", |t| t.on_movie_added),
    ("onMovieDelete", |t| t.on_movie_delete),
    ("onMovieFileDelete", |t| t.on_movie_file_delete),
    ("onHealthIssue", |t| t.on_health_issue),
    ("includeHealthWarnings", |t| t.include_health_warnings),
    ("onApplicationUpdate", |t| t.on_application_update),
];

impl NotificationTriggers {
    fn decode(resource: &FieldResource) -> Self {
        NotificationTriggers {
            on_grab: resource.attr_bool("onGrab", false),
            on_import: resource.attr_bool("onDownload", false),
            on_upgrade: resource.attr_bool("onUpgrade", false),
            on_rename: resource.attr_bool("onRename", false),
            on_movie_added: resource.attr_bool("onMovieAdded", false),
            on_movie_delete: resource.attr_bool("onMovieDelete", false),
            on_movie_file_delete: resource.attr_bool("onMovieFileDelete", false),
            on_health_issue: resource.attr_bool("onHealthIssue", false),
            include_health_warnings: resource.attr_bool("includeHealthWarnings", false),
            on_application_update: resource.attr_bool("onApplicationUpdate", false),
        }
    }

    fn encode_into(&self, resource: &mut FieldResource) {
        for (attr, read) in TRIGGER_ATTRS {
            resource.set_attr(attr, json!(read(self)));
        }
    }
}

/// One notification connection: triggers and tags common to all types, plus a
/// typed variant selected by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub notification_triggers: NotificationTriggers,
    /// Only notify for movies with at least one matching tag.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub implementation: NotificationImpl,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationImpl {
    Email(EmailNotification),
    Webhook(WebhookNotification),
    Discord(DiscordNotification),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmailNotification {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "super::default_true")]
    pub use_encryption: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    pub from_address: String,
    pub recipient_addresses: Vec<String>,
    #[serde(default)]
    pub cc_addresses: Vec<String>,
    #[serde(default)]
    pub bcc_addresses: Vec<String>,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookNotification {
    pub url: String,
    #[serde(default = "default_webhook_method")]
    pub method: WebhookMethod,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    Post,
    Put,
}

impl WebhookMethod {
    fn as_api_value(self) -> i64 {
        match self {
            WebhookMethod::Post => 1,
            WebhookMethod::Put => 2,
        }
    }

    fn from_api_value(value: i64) -> Self {
        match value {
            2 => WebhookMethod::Put,
            _ => WebhookMethod::Post,
        }
    }
}

fn default_webhook_method() -> WebhookMethod {
    WebhookMethod::Post
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DiscordNotification {
    pub webhook_url: String,
    /// Displayed sender name; the server default when unset.
    #[serde(default)]
    pub username: Option<String>,
    /// Avatar image URL for notification messages.
    #[serde(default)]
    pub avatar: Option<String>,
}

fn optional_field(resource: &FieldResource, name: &str) -> Option<String> {
    resource.field_string(name).filter(|s| !s.is_empty())
}

impl Definition for Notification {
    fn implementation(&self) -> &'static str {
        match self.implementation {
            NotificationImpl::Email(_) => "Email",
            NotificationImpl::Webhook(_) => "Webhook",
            NotificationImpl::Discord(_) => "Discord",
        }
    }

    fn decode(resource: &FieldResource, ctx: &EncodeContext) -> Option<Self> {
        let implementation = if resource.is_implementation("Email") {
            NotificationImpl::Email(EmailNotification {
                server: resource.field_string("server")?,
                port: resource.field_i64("port", 587) as u16,
                use_encryption: resource.field_bool("requireEncryption", true),
                username: optional_field(resource, "username"),
                password: optional_field(resource, "password"),
                from_address: resource.field_string("from").unwrap_or_default(),
                recipient_addresses: resource.field_string_array("to"),
                cc_addresses: resource.field_string_array("cc"),
                bcc_addresses: resource.field_string_array("bcc"),
            })
        } else if resource.is_implementation("Webhook") {
            NotificationImpl::Webhook(WebhookNotification {
                url: resource.field_string("url")?,
                method: WebhookMethod::from_api_value(resource.field_i64("method", 1)),
                username: optional_field(resource, "username"),
                password: optional_field(resource, "password"),
            })
        } else if resource.is_implementation("Discord") {
            NotificationImpl::Discord(DiscordNotification {
                webhook_url: resource.field_string("webHookUrl")?,
                username: optional_field(resource, "username"),
                avatar: optional_field(resource, "avatar"),
            })
        } else {
            return None;
        };

        Some(Notification {
            notification_triggers: NotificationTriggers::decode(resource),
            tags: ctx.decode_tags(&resource.tags),
            implementation,
        })
    }

    fn encode_into(
        &self,
        resource: &mut FieldResource,
        ctx: &EncodeContext,
    ) -> Result<(), ApiError> {
        self.notification_triggers.encode_into(resource);
        resource.tags = ctx.encode_tags(&self.tags)?;

        match &self.implementation {
            NotificationImpl::Email(email) => {
                resource.set_field("server", json!(email.server));
                resource.set_field("port", json!(email.port));
                resource.set_field("requireEncryption", json!(email.use_encryption));
                resource.set_field("username", json!(email.username.clone().unwrap_or_default()));
                resource.set_field("password", json!(email.password.clone().unwrap_or_default()));
                resource.set_field("from", json!(email.from_address));
                resource.set_field("to", json!(email.recipient_addresses));
                resource.set_field("cc", json!(email.cc_addresses));
                resource.set_field("bcc", json!(email.bcc_addresses));
            }
            NotificationImpl::Webhook(webhook) => {
                resource.set_field("url", json!(webhook.url));
                resource.set_field("method", json!(webhook.method.as_api_value()));
                resource.set_field(
                    "username",
                    json!(webhook.username.clone().unwrap_or_default()),
                );
                resource.set_field(
                    "password",
                    json!(webhook.password.clone().unwrap_or_default()),
                );
            }
            NotificationImpl::Discord(discord) => {
                resource.set_field("webHookUrl", json!(discord.webhook_url));
                resource.set_field(
                    "username",
                    json!(discord.username.clone().unwrap_or_default()),
                );
                resource.set_field("avatar", json!(discord.avatar.clone().unwrap_or_default()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_round_trips_through_resource_encoding() {
        let definition: Notification = serde_json::from_value(serde_json::json!({
            "type": "email",
            "notification_triggers": {
                "on_health_issue": true,
                "on_application_update": true
            },
            "server": "smtp.example.com",
            "port": 465,
            "from_address": "radarr@example.com",
            "recipient_addresses": ["admin@example.com"]
        }))
        .unwrap();
        let ctx = EncodeContext::default();

        let mut resource = FieldResource {
            implementation: "Email".to_string(),
            ..FieldResource::default()
        };
        definition.encode_into(&mut resource, &ctx).unwrap();
        assert!(resource.attr_bool("onHealthIssue", false));
        assert!(!resource.attr_bool("onGrab", true));

        let decoded = Notification::decode(&resource, &ctx).expect("email decodes");
        assert_eq!(decoded, definition);
    }

    #[test]
    fn webhook_method_maps_to_api_values() {
        assert_eq!(WebhookMethod::Post.as_api_value(), 1);
        assert_eq!(WebhookMethod::from_api_value(2), WebhookMethod::Put);

        let definition: Notification = serde_json::from_value(serde_json::json!({
            "type": "webhook",
            "url": "https://hooks.example.com/radarr",
            "method": "PUT"
        }))
        .unwrap();
        match &definition.implementation {
            NotificationImpl::Webhook(webhook) => assert_eq!(webhook.method, WebhookMethod::Put),
            other => panic!("expected webhook, got {other:?}"),
        }
    }

    #[test]
    fn oauth_gated_implementation_decodes_to_none() {
        let resource = FieldResource {
            implementation: "Trakt".to_string(),
            ..FieldResource::default()
        };
        assert!(Notification::decode(&resource, &EncodeContext::default()).is_none());
    }
}
