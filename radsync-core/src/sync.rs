//! High-level pipeline: converge a Radarr instance onto the desired settings.
//!
//! This module orchestrates one synchronisation run:
//!   - Ensures every referenced tag label exists on the remote
//!   - Snapshots each section's remote resources and decodes them into the
//!     local model
//!   - Plans per-section actions with [`crate::plan::plan`]
//!   - Applies creates and updates section by section, in dependency order
//!     (tags, then download clients before indexers so name references
//!     resolve, then notifications, custom formats before the quality
//!     profiles that score them, then metadata)
//!   - Applies deletions last, indexers before download clients and quality
//!     profiles before custom formats, so the remote never rejects a delete
//!     for a still-referenced resource
//!   - Aggregates and returns a [`SyncReport`] of what changed.
//!
//! With `dry_run` set, plans are computed and logged but nothing is applied.
//!
//! # Error Handling
//! The run is fail-fast: the first failed remote call aborts with its error.
//! Sections already applied stay applied; a rerun converges the remainder.

use std::collections::BTreeMap;

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::config::custom_formats::{decode_format, encode_format};
use crate::config::metadata::{MetadataConsumer, MetadataSettings};
use crate::config::quality_profiles::{decode_profile, encode_profile, QualityContext};
use crate::config::{Definition, EncodeContext, Settings};
use crate::contract::{ApiError, ApiResult, RadarrApi};
use crate::plan::{plan, Plan, PlanAction, PlanCounts, RemoteResource};
use crate::remote::{tag_ids_by_label, CustomFormatResource, FieldResource, QualityProfileResource};

/// Per-section outcome of a synchronisation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionReport {
    pub section: &'static str,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub unmanaged: usize,
}

impl SectionReport {
    fn from_counts(section: &'static str, counts: PlanCounts) -> Self {
        SectionReport {
            section,
            created: counts.create,
            updated: counts.update,
            deleted: counts.delete,
            unchanged: counts.unchanged,
            unmanaged: counts.unmanaged,
        }
    }

    pub fn changed(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

/// Aggregated outcome of a full run, for audit and CLI summary output.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub sections: Vec<SectionReport>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        self.sections.iter().any(SectionReport::changed)
    }
}

/// The field-resource section kinds sharing one reconciliation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    DownloadClient,
    Indexer,
    Notification,
}

impl FieldKind {
    fn section(self) -> &'static str {
        match self {
            FieldKind::DownloadClient => "download_clients",
            FieldKind::Indexer => "indexers",
            FieldKind::Notification => "notifications",
        }
    }

    async fn list<A: RadarrApi>(self, api: &A) -> ApiResult<Vec<FieldResource>> {
        match self {
            FieldKind::DownloadClient => api.list_download_clients().await,
            FieldKind::Indexer => api.list_indexers().await,
            FieldKind::Notification => api.list_notifications().await,
        }
    }

    async fn schemas<A: RadarrApi>(self, api: &A) -> ApiResult<Vec<FieldResource>> {
        match self {
            FieldKind::DownloadClient => api.download_client_schemas().await,
            FieldKind::Indexer => api.indexer_schemas().await,
            FieldKind::Notification => api.notification_schemas().await,
        }
    }

    async fn create<A: RadarrApi>(
        self,
        api: &A,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource> {
        match self {
            FieldKind::DownloadClient => api.create_download_client(resource).await,
            FieldKind::Indexer => api.create_indexer(resource).await,
            FieldKind::Notification => api.create_notification(resource).await,
        }
    }

    async fn update<A: RadarrApi>(
        self,
        api: &A,
        id: i64,
        resource: &FieldResource,
    ) -> ApiResult<FieldResource> {
        match self {
            FieldKind::DownloadClient => api.update_download_client(id, resource).await,
            FieldKind::Indexer => api.update_indexer(id, resource).await,
            FieldKind::Notification => api.update_notification(id, resource).await,
        }
    }

    async fn delete<A: RadarrApi>(self, api: &A, id: i64) -> ApiResult<()> {
        match self {
            FieldKind::DownloadClient => api.delete_download_client(id).await,
            FieldKind::Indexer => api.delete_indexer(id).await,
            FieldKind::Notification => api.delete_notification(id).await,
        }
    }
}

/// Result of one field section pass: the report tally, the remote id of every
/// definition now present, and deletions deferred to the final phase.
struct SectionOutcome {
    counts: PlanCounts,
    ids: BTreeMap<String, i64>,
    pending_deletes: Vec<(String, i64)>,
}

/// Entrypoint: converge the remote instance onto `settings`.
pub async fn synchronise<A>(
    settings: &Settings,
    api: &A,
    dry_run: bool,
) -> Result<SyncReport, ApiError>
where
    A: RadarrApi,
{
    info!(dry_run, "starting synchronisation run");
    let mut report = SyncReport::default();

    // Tags first: every label referenced by a section must exist before that
    // section's definitions can be encoded.
    let (tag_ids, tags_report) = ensure_tags(api, settings, dry_run).await?;
    report.sections.push(tags_report);

    let mut ctx = EncodeContext::new(tag_ids, BTreeMap::new());

    let clients = sync_field_section(
        api,
        FieldKind::DownloadClient,
        &settings.download_clients.definitions,
        settings.download_clients.delete_unmanaged,
        &ctx,
        dry_run,
    )
    .await?;
    ctx.set_download_clients(clients.ids.clone());

    let indexers = sync_field_section(
        api,
        FieldKind::Indexer,
        &settings.indexers.definitions,
        settings.indexers.delete_unmanaged,
        &ctx,
        dry_run,
    )
    .await?;

    let notifications = sync_field_section(
        api,
        FieldKind::Notification,
        &settings.notifications.definitions,
        settings.notifications.delete_unmanaged,
        &ctx,
        dry_run,
    )
    .await?;

    // Custom formats before quality profiles: profiles score formats by name,
    // so a newly declared format must exist when the profile is encoded.
    let (format_counts, format_deletes) = sync_custom_formats(api, settings, dry_run).await?;

    let (profile_counts, profile_deletes) = sync_quality_profiles(api, settings, dry_run).await?;

    let metadata_report = sync_metadata(api, &settings.metadata, dry_run).await?;

    // Deletion phase. Indexers go before download clients: an indexer pinned
    // to a download client blocks that client's deletion.
    if !dry_run {
        for (kind, deletes) in [
            (FieldKind::Indexer, &indexers.pending_deletes),
            (FieldKind::DownloadClient, &clients.pending_deletes),
            (FieldKind::Notification, &notifications.pending_deletes),
        ] {
            for (name, id) in deletes {
                info!(section = kind.section(), name = %name, id, "deleting unmanaged resource");
                kind.delete(api, *id).await?;
            }
        }
        for (name, id) in &profile_deletes {
            info!(section = "quality_profiles", name = %name, id, "deleting unmanaged resource");
            api.delete_quality_profile(*id).await?;
        }
        // Formats last: a profile scoring a format blocks its deletion.
        for (name, id) in &format_deletes {
            info!(section = "custom_formats", name = %name, id, "deleting unmanaged resource");
            api.delete_custom_format(*id).await?;
        }
    }

    report
        .sections
        .push(SectionReport::from_counts("download_clients", clients.counts));
    report
        .sections
        .push(SectionReport::from_counts("indexers", indexers.counts));
    report.sections.push(SectionReport::from_counts(
        "notifications",
        notifications.counts,
    ));
    report.sections.push(SectionReport::from_counts(
        "custom_formats",
        format_counts,
    ));
    report.sections.push(SectionReport::from_counts(
        "quality_profiles",
        profile_counts,
    ));
    report.sections.push(metadata_report);

    info!(changed = report.changed(), "synchronisation run finished");
    Ok(report)
}

/// Create every referenced tag label that does not exist on the remote.
/// Remote-only tags are never deleted; other applications share them.
async fn ensure_tags<A: RadarrApi>(
    api: &A,
    settings: &Settings,
    dry_run: bool,
) -> Result<(BTreeMap<String, i64>, SectionReport), ApiError> {
    let remote_tags = api.list_tags().await?;
    let mut tag_ids = tag_ids_by_label(&remote_tags);

    let referenced = settings.referenced_tag_labels();
    let missing: Vec<&String> = referenced
        .iter()
        .filter(|label| !tag_ids.contains_key(*label))
        .collect();

    let counts = PlanCounts {
        create: missing.len(),
        unchanged: referenced.len() - missing.len(),
        unmanaged: tag_ids
            .keys()
            .filter(|label| !referenced.contains(*label))
            .count(),
        ..PlanCounts::default()
    };

    if missing.is_empty() {
        debug!(section = "tags", "all referenced tags already exist");
    } else if dry_run {
        info!(section = "tags", missing = ?missing, "would create missing tags");
    } else {
        info!(section = "tags", missing = ?missing, "creating missing tags");
        let created =
            try_join_all(missing.iter().map(|label| api.create_tag(label.as_str()))).await?;
        for tag in created {
            tag_ids.insert(tag.label, tag.id);
        }
    }

    Ok((tag_ids, SectionReport::from_counts("tags", counts)))
}

/// Decode a remote resource list into the planner's shape, keeping the raw
/// resources around for update overlays.
fn snapshot_remote<T: Definition>(
    resources: Vec<FieldResource>,
    ctx: &EncodeContext,
    section: &'static str,
) -> (
    BTreeMap<String, RemoteResource<T>>,
    BTreeMap<String, FieldResource>,
) {
    let mut decoded = BTreeMap::new();
    let mut raw = BTreeMap::new();
    for resource in resources {
        let definition = T::decode(&resource, ctx);
        if definition.is_none() {
            debug!(
                section,
                name = %resource.name,
                implementation = %resource.implementation,
                "remote resource has an unmodelled implementation"
            );
        }
        decoded.insert(
            resource.name.clone(),
            RemoteResource {
                id: resource.id,
                definition,
            },
        );
        raw.insert(resource.name.clone(), resource);
    }
    (decoded, raw)
}

/// Find the schema template for a definition's implementation and fill it in.
fn resource_for_create<T: Definition>(
    name: &str,
    definition: &T,
    schemas: &[FieldResource],
    ctx: &EncodeContext,
) -> Result<FieldResource, ApiError> {
    let schema = schemas
        .iter()
        .find(|schema| schema.is_implementation(definition.implementation()))
        .ok_or_else(|| {
            format!(
                "remote instance offers no schema for implementation {:?}",
                definition.implementation()
            )
        })?;
    let mut resource = schema.clone();
    resource.id = 0;
    resource.name = name.to_string();
    definition.encode_into(&mut resource, ctx)?;
    Ok(resource)
}

/// Overlay a definition onto the live remote resource, preserving everything
/// the local model does not manage.
fn resource_for_update<T: Definition>(
    remote: &FieldResource,
    definition: &T,
    ctx: &EncodeContext,
) -> Result<FieldResource, ApiError> {
    let mut resource = remote.clone();
    definition.encode_into(&mut resource, ctx)?;
    Ok(resource)
}

async fn sync_field_section<T, A>(
    api: &A,
    kind: FieldKind,
    desired: &BTreeMap<String, T>,
    delete_unmanaged: bool,
    ctx: &EncodeContext,
    dry_run: bool,
) -> Result<SectionOutcome, ApiError>
where
    T: Definition + Send + Sync,
    A: RadarrApi,
{
    let section = kind.section();
    let (remote, raw) = snapshot_remote::<T>(kind.list(api).await?, ctx, section);
    let section_plan: Plan<T> = plan(desired, &remote, delete_unmanaged);
    let counts = section_plan.counts();
    info!(
        section,
        create = counts.create,
        update = counts.update,
        delete = counts.delete,
        unchanged = counts.unchanged,
        unmanaged = counts.unmanaged,
        "section planned"
    );

    let mut ids: BTreeMap<String, i64> = raw
        .values()
        .map(|resource| (resource.name.clone(), resource.id))
        .collect();
    let mut pending_deletes = Vec::new();

    // Schema templates are only needed when something will be created.
    let schemas = if !dry_run && counts.create > 0 {
        kind.schemas(api).await?
    } else {
        Vec::new()
    };

    for action in &section_plan.actions {
        match action {
            PlanAction::Create { name, definition } => {
                if dry_run {
                    info!(section, name = %name, "would create");
                    continue;
                }
                let resource = resource_for_create(name, definition, &schemas, ctx)?;
                info!(section, name = %name, "creating resource");
                let created = kind.create(api, &resource).await?;
                ids.insert(name.clone(), created.id);
            }
            PlanAction::Update {
                name,
                id,
                definition,
            } => {
                if dry_run {
                    info!(section, name = %name, id, "would update");
                    continue;
                }
                let remote_resource = raw
                    .get(name)
                    .ok_or_else(|| format!("remote resource vanished mid-run: {name:?}"))?;
                let resource = resource_for_update(remote_resource, definition, ctx)?;
                info!(section, name = %name, id, "updating resource");
                kind.update(api, *id, &resource).await?;
            }
            PlanAction::Delete { name, id } => {
                if dry_run {
                    info!(section, name = %name, id, "would delete");
                    continue;
                }
                pending_deletes.push((name.clone(), *id));
            }
            PlanAction::Unchanged { name, .. } => {
                debug!(section, name = %name, "resource already converged");
            }
            PlanAction::Unmanaged { name, .. } => {
                debug!(section, name = %name, "remote resource is unmanaged, leaving in place");
            }
        }
    }

    Ok(SectionOutcome {
        counts,
        ids,
        pending_deletes,
    })
}

async fn sync_custom_formats<A: RadarrApi>(
    api: &A,
    settings: &Settings,
    dry_run: bool,
) -> Result<(PlanCounts, Vec<(String, i64)>), ApiError> {
    let section = "custom_formats";
    let desired = &settings.custom_formats.definitions;
    let remote_resources = api.list_custom_formats().await?;

    // Condition schemas are needed to decode the remote side as well as to
    // encode, so they are fetched even on a dry run.
    let schemas = if desired.is_empty() && remote_resources.is_empty() {
        Vec::new()
    } else {
        api.custom_format_schemas().await?
    };

    let mut remote = BTreeMap::new();
    let mut raw: BTreeMap<String, CustomFormatResource> = BTreeMap::new();
    for resource in remote_resources {
        let definition = decode_format(&resource, &schemas);
        if definition.is_none() {
            debug!(
                section,
                name = %resource.name,
                "remote format has an unmodelled condition, treating as drifted"
            );
        }
        remote.insert(
            resource.name.clone(),
            RemoteResource {
                id: resource.id,
                definition,
            },
        );
        raw.insert(resource.name.clone(), resource);
    }

    let section_plan = plan(desired, &remote, settings.custom_formats.delete_unmanaged);
    let counts = section_plan.counts();
    info!(
        section,
        create = counts.create,
        update = counts.update,
        delete = counts.delete,
        unchanged = counts.unchanged,
        unmanaged = counts.unmanaged,
        "section planned"
    );

    let mut pending_deletes = Vec::new();
    for action in &section_plan.actions {
        match action {
            PlanAction::Create { name, definition } => {
                if dry_run {
                    info!(section, name = %name, "would create");
                    continue;
                }
                let resource = encode_format(name, definition, &schemas)?;
                info!(section, name = %name, "creating custom format");
                api.create_custom_format(&resource).await?;
            }
            PlanAction::Update {
                name,
                id,
                definition,
            } => {
                if dry_run {
                    info!(section, name = %name, id, "would update");
                    continue;
                }
                let mut resource = encode_format(name, definition, &schemas)?;
                resource.id = *id;
                if let Some(remote_resource) = raw.get(name) {
                    resource.extra = remote_resource.extra.clone();
                }
                info!(section, name = %name, id, "updating custom format");
                api.update_custom_format(*id, &resource).await?;
            }
            PlanAction::Delete { name, id } => {
                if dry_run {
                    info!(section, name = %name, id, "would delete");
                    continue;
                }
                pending_deletes.push((name.clone(), *id));
            }
            PlanAction::Unchanged { name, .. } => {
                debug!(section, name = %name, "format already converged");
            }
            PlanAction::Unmanaged { name, .. } => {
                debug!(section, name = %name, "remote format is unmanaged, leaving in place");
            }
        }
    }

    Ok((counts, pending_deletes))
}

async fn sync_quality_profiles<A: RadarrApi>(
    api: &A,
    settings: &Settings,
    dry_run: bool,
) -> Result<(PlanCounts, Vec<(String, i64)>), ApiError> {
    let section = "quality_profiles";
    let desired = &settings.quality_profiles.definitions;
    let remote_resources = api.list_quality_profiles().await?;

    let mut remote = BTreeMap::new();
    let mut raw: BTreeMap<String, QualityProfileResource> = BTreeMap::new();
    for resource in remote_resources {
        remote.insert(
            resource.name.clone(),
            RemoteResource {
                id: resource.id,
                definition: decode_profile(&resource),
            },
        );
        raw.insert(resource.name.clone(), resource);
    }

    let section_plan = plan(desired, &remote, settings.quality_profiles.delete_unmanaged);
    let counts = section_plan.counts();
    info!(
        section,
        create = counts.create,
        update = counts.update,
        delete = counts.delete,
        unchanged = counts.unchanged,
        unmanaged = counts.unmanaged,
        "section planned"
    );

    // Encoding needs the instance's quality/format/language tables; skip the
    // lookups entirely when nothing would be written.
    let quality_ctx = if !dry_run && counts.create + counts.update > 0 {
        Some(load_quality_context(api).await?)
    } else {
        None
    };
    let mut pending_deletes = Vec::new();

    for action in &section_plan.actions {
        match action {
            PlanAction::Create { name, definition } => {
                if dry_run {
                    info!(section, name = %name, "would create");
                    continue;
                }
                let ctx = quality_ctx
                    .as_ref()
                    .ok_or("quality tables were not loaded")?;
                let resource = encode_profile(name, definition, ctx)?;
                info!(section, name = %name, "creating quality profile");
                api.create_quality_profile(&resource).await?;
            }
            PlanAction::Update {
                name,
                id,
                definition,
            } => {
                if dry_run {
                    info!(section, name = %name, id, "would update");
                    continue;
                }
                let ctx = quality_ctx
                    .as_ref()
                    .ok_or("quality tables were not loaded")?;
                let mut resource = encode_profile(name, definition, ctx)?;
                resource.id = *id;
                // Carry over attributes the local model does not manage.
                if let Some(remote_resource) = raw.get(name) {
                    resource.extra = remote_resource.extra.clone();
                }
                info!(section, name = %name, id, "updating quality profile");
                api.update_quality_profile(*id, &resource).await?;
            }
            PlanAction::Delete { name, id } => {
                if dry_run {
                    info!(section, name = %name, id, "would delete");
                    continue;
                }
                pending_deletes.push((name.clone(), *id));
            }
            PlanAction::Unchanged { name, .. } => {
                debug!(section, name = %name, "profile already converged");
            }
            PlanAction::Unmanaged { name, .. } => {
                debug!(section, name = %name, "remote profile is unmanaged, leaving in place");
            }
        }
    }

    Ok((counts, pending_deletes))
}

async fn load_quality_context<A: RadarrApi>(api: &A) -> Result<QualityContext, ApiError> {
    let qualities = api
        .list_quality_definitions()
        .await?
        .into_iter()
        .map(|definition| (definition.quality.name.clone(), definition.quality))
        .collect();
    let formats = api
        .list_custom_formats()
        .await?
        .into_iter()
        .map(|format| (format.name, format.id))
        .collect();
    let languages = api
        .list_languages()
        .await?
        .into_iter()
        .map(|language| (language.name, language.id))
        .collect();
    Ok(QualityContext {
        qualities,
        formats,
        languages,
    })
}

async fn sync_metadata<A: RadarrApi>(
    api: &A,
    settings: &MetadataSettings,
    dry_run: bool,
) -> Result<SectionReport, ApiError> {
    let mut counts = PlanCounts::default();
    if settings.is_empty() {
        return Ok(SectionReport::from_counts("metadata", counts));
    }

    let resources = api.list_metadata().await?;
    sync_metadata_consumer(api, &resources, settings.kodi_emby.as_ref(), &mut counts, dry_run)
        .await?;
    sync_metadata_consumer(api, &resources, settings.roksbox.as_ref(), &mut counts, dry_run)
        .await?;
    sync_metadata_consumer(api, &resources, settings.wdtv.as_ref(), &mut counts, dry_run).await?;

    Ok(SectionReport::from_counts("metadata", counts))
}

async fn sync_metadata_consumer<C, A>(
    api: &A,
    resources: &[FieldResource],
    desired: Option<&C>,
    counts: &mut PlanCounts,
    dry_run: bool,
) -> Result<(), ApiError>
where
    C: MetadataConsumer + Sync,
    A: RadarrApi,
{
    let Some(desired) = desired else {
        return Ok(());
    };
    let Some(resource) = resources
        .iter()
        .find(|resource| resource.is_implementation(C::IMPLEMENTATION))
    else {
        warn!(
            section = "metadata",
            consumer = C::KEY,
            "remote instance offers no such metadata consumer"
        );
        return Ok(());
    };

    if &C::decode(resource) == desired {
        debug!(section = "metadata", consumer = C::KEY, "already converged");
        counts.unchanged += 1;
        return Ok(());
    }

    counts.update += 1;
    if dry_run {
        info!(section = "metadata", consumer = C::KEY, "would update");
        return Ok(());
    }
    let mut updated = resource.clone();
    desired.encode_into(&mut updated);
    info!(section = "metadata", consumer = C::KEY, id = resource.id, "updating metadata consumer");
    api.update_metadata(resource.id, &updated).await?;
    Ok(())
}
