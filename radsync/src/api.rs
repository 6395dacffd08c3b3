//! HTTP implementation of the remote contract.
//!
//! [`RadarrClient`] wires the `RadarrApi` trait from `radsync-core` to a real
//! Radarr v3 instance over `reqwest`. Authentication uses the `X-Api-Key`
//! header on every request; transport, serialization and status handling are
//! encapsulated here so the sync engine stays transport-agnostic.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use radsync_core::contract::{ApiError, ApiResult, RadarrApi};
use radsync_core::remote::{
    CustomFormatResource, FieldResource, LanguageResource, QualityDefinitionResource,
    QualityProfileResource, SystemStatus, TagResource,
};

/// A Radarr v3 API client bound to one instance.
pub struct RadarrClient {
    http: reqwest::Client,
    base_url: String,
}

impl RadarrClient {
    /// Build a client for the given host URL (scheme://host:port), sending the
    /// API key with every request.
    pub fn new(host_url: &str, api_key: &str) -> Result<Self, ApiError> {
        let mut api_key_header = HeaderValue::from_str(api_key)?;
        api_key_header.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", api_key_header);

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(RadarrClient {
            http,
            base_url: format!("{}/api/v3", host_url.trim_end_matches('/')),
        })
    }

    /// Probe the instance, verifying the API key and base URL.
    pub async fn probe(&self) -> ApiResult<SystemStatus> {
        self.system_status().await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn check(response: Response, method: &str, path: &str) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            debug!(method, path, status = %status, "API call succeeded");
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(format!("{method} {path} failed with status {status}: check the API key").into());
        }
        let body = response.text().await.unwrap_or_default();
        Err(format!("{method} {path} failed with status {status}: {body}").into())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(Self::check(response, "GET", path).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Ok(Self::check(response, "POST", path).await?.json().await?)
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self.http.put(self.url(path)).json(body).send().await?;
        Ok(Self::check(response, "PUT", path).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = self.http.delete(self.url(path)).send().await?;
        Self::check(response, "DELETE", path).await?;
        Ok(())
    }
}

#[async_trait]
impl RadarrApi for RadarrClient {
    async fn system_status(&self) -> ApiResult<SystemStatus> {
        self.get_json("system/status").await
    }

    async fn list_tags(&self) -> ApiResult<Vec<TagResource>> {
        self.get_json("tag").await
    }

    async fn create_tag(&self, label: &str) -> ApiResult<TagResource> {
        self.post_json("tag", &serde_json::json!({ "label": label }))
            .await
    }

    async fn list_indexers(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("indexer").await
    }

    async fn indexer_schemas(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("indexer/schema").await
    }

    async fn create_indexer(&self, resource: &FieldResource) -> ApiResult<FieldResource> {
        self.post_json("indexer", resource).await
    }

    async fn update_indexer(&self, id: i64, resource: &FieldResource) -> ApiResult<FieldResource> {
        self.put_json(&format!("indexer/{id}"), resource).await
    }

    async fn delete_indexer(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("indexer/{id}")).await
    }

    async fn list_download_clients(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("downloadclient").await
    }

    async fn download_client_schemas(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("downloadclient/schema").await
    }

    async fn create_download_client(&self, resource: &FieldResource) -> ApiResult<FieldResource> {
        self.post_json("downloadclient", resource).await
    }

    async fn update_download_client(
        &self,
        id: i64,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource> {
        self.put_json(&format!("downloadclient/{id}"), resource)
            .await
    }

    async fn delete_download_client(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("downloadclient/{id}")).await
    }

    async fn list_notifications(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("notification").await
    }

    async fn notification_schemas(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("notification/schema").await
    }

    async fn create_notification(&self, resource: &FieldResource) -> ApiResult<FieldResource> {
        self.post_json("notification", resource).await
    }

    async fn update_notification(
        &self,
        id: i64,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource> {
        self.put_json(&format!("notification/{id}"), resource).await
    }

    async fn delete_notification(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("notification/{id}")).await
    }

    async fn list_quality_definitions(&self) -> ApiResult<Vec<QualityDefinitionResource>> {
        self.get_json("qualitydefinition").await
    }

    async fn list_custom_formats(&self) -> ApiResult<Vec<CustomFormatResource>> {
        self.get_json("customformat").await
    }

    async fn custom_format_schemas(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("customformat/schema").await
    }

    async fn create_custom_format(
        &self,
        resource: &CustomFormatResource,
    ) -> ApiResult<CustomFormatResource> {
        self.post_json("customformat", resource).await
    }

    async fn update_custom_format(
        &self,
        id: i64,
        resource: &CustomFormatResource,
    ) -> ApiResult<CustomFormatResource> {
        self.put_json(&format!("customformat/{id}"), resource)
            .await
    }

    async fn delete_custom_format(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("customformat/{id}")).await
    }

    async fn list_languages(&self) -> ApiResult<Vec<LanguageResource>> {
        self.get_json("language").await
    }

    async fn list_quality_profiles(&self) -> ApiResult<Vec<QualityProfileResource>> {
        self.get_json("qualityprofile").await
    }

    async fn create_quality_profile(
        &self,
        resource: &QualityProfileResource,
    ) -> ApiResult<QualityProfileResource> {
        self.post_json("qualityprofile", resource).await
    }

    async fn update_quality_profile(
        &self,
        id: i64,
        resource: &QualityProfileResource,
    ) -> ApiResult<QualityProfileResource> {
        self.put_json(&format!("qualityprofile/{id}"), resource)
            .await
    }

    async fn delete_quality_profile(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("qualityprofile/{id}")).await
    }

    async fn list_metadata(&self) -> ApiResult<Vec<FieldResource>> {
        self.get_json("metadata").await
    }

    async fn update_metadata(&self, id: i64, resource: &FieldResource) -> ApiResult<FieldResource> {
        self.put_json(&format!("metadata/{id}"), resource).await
    }
}
