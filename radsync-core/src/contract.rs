//! # RadarrApi: the remote contract the reconciler runs against
//!
//! This module defines a single trait (`RadarrApi`) covering every remote call
//! the sync engine makes: listing current resources, fetching schema templates
//! for create operations, and the create/update/delete calls themselves.
//!
//! ## Interface & Extensibility
//! - The production implementation (a reqwest client) lives in the `radsync`
//!   crate; this crate only depends on the contract.
//! - All methods are async and return a boxed error type, so transport and
//!   API-shape failures surface uniformly.
//! - The trait is annotated for `mockall` so tests can drive the orchestrator
//!   against a deterministic fake instance.

use async_trait::async_trait;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::remote::{
    CustomFormatResource, FieldResource, LanguageResource, QualityDefinitionResource,
    QualityProfileResource, SystemStatus, TagResource,
};

/// Error type for remote operations (boxed, transport-agnostic).
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

pub type ApiResult<T> = Result<T, ApiError>;

/// Remote surface of a Radarr v3 instance, as consumed by the sync engine.
///
/// Implementors are responsible for authentication and transport; the methods
/// map one-to-one onto API endpoints.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RadarrApi: Send + Sync {
    /// Probe the instance, verifying credentials and reading the version.
    async fn system_status(&self) -> ApiResult<SystemStatus>;

    async fn list_tags(&self) -> ApiResult<Vec<TagResource>>;
    async fn create_tag(&self, label: &str) -> ApiResult<TagResource>;

    async fn list_indexers(&self) -> ApiResult<Vec<FieldResource>>;
    /// Schema templates, one per supported indexer implementation.
    async fn indexer_schemas(&self) -> ApiResult<Vec<FieldResource>>;
    async fn create_indexer(&self, resource: &FieldResource) -> ApiResult<FieldResource>;
    async fn update_indexer(&self, id: i64, resource: &FieldResource) -> ApiResult<FieldResource>;
    async fn delete_indexer(&self, id: i64) -> ApiResult<()>;

    async fn list_download_clients(&self) -> ApiResult<Vec<FieldResource>>;
    async fn download_client_schemas(&self) -> ApiResult<Vec<FieldResource>>;
    async fn create_download_client(&self, resource: &FieldResource) -> ApiResult<FieldResource>;
    async fn update_download_client(
        &self,
        id: i64,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource>;
    async fn delete_download_client(&self, id: i64) -> ApiResult<()>;

    async fn list_notifications(&self) -> ApiResult<Vec<FieldResource>>;
    async fn notification_schemas(&self) -> ApiResult<Vec<FieldResource>>;
    async fn create_notification(&self, resource: &FieldResource) -> ApiResult<FieldResource>;
    async fn update_notification(
        &self,
        id: i64,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource>;
    async fn delete_notification(&self, id: i64) -> ApiResult<()>;

    /// The universe of qualities known to the instance, used when encoding
    /// quality profiles (disabled qualities must still be listed).
    async fn list_quality_definitions(&self) -> ApiResult<Vec<QualityDefinitionResource>>;
    async fn list_languages(&self) -> ApiResult<Vec<LanguageResource>>;

    async fn list_custom_formats(&self) -> ApiResult<Vec<CustomFormatResource>>;
    /// Condition schema templates, one per specification implementation.
    /// Carry the select options needed to translate resolution and source
    /// names to their API values.
    async fn custom_format_schemas(&self) -> ApiResult<Vec<FieldResource>>;
    async fn create_custom_format(
        &self,
        resource: &CustomFormatResource,
    ) -> ApiResult<CustomFormatResource>;
    async fn update_custom_format(
        &self,
        id: i64,
        resource: &CustomFormatResource,
    ) -> ApiResult<CustomFormatResource>;
    async fn delete_custom_format(&self, id: i64) -> ApiResult<()>;

    async fn list_quality_profiles(&self) -> ApiResult<Vec<QualityProfileResource>>;
    async fn create_quality_profile(
        &self,
        resource: &QualityProfileResource,
    ) -> ApiResult<QualityProfileResource>;
    async fn update_quality_profile(
        &self,
        id: i64,
        resource: &QualityProfileResource,
    ) -> ApiResult<QualityProfileResource>;
    async fn delete_quality_profile(&self, id: i64) -> ApiResult<()>;

    /// Metadata consumers are fixed remote resources: list and update only.
    async fn list_metadata(&self) -> ApiResult<Vec<FieldResource>>;
    async fn update_metadata(&self, id: i64, resource: &FieldResource) -> ApiResult<FieldResource>;
}
