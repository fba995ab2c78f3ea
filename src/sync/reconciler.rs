use super::context::ReconciliationContext;
use super::outcome::{SkipReason, SyncAction, SyncOutcome, SyncReport};
use super::SyncError;
use crate::backup::BackupStore;
use crate::config::SyncConfig;
use crate::event::PrefixEvent;
use crate::ipam::IpamClient;
use crate::notify::{Notification, Notifier, NotifyError};
use crate::object::{line_diff, MergeEngine, RegistryObject};
use crate::overlap::OverlapResolver;
use crate::prefix::{AddressRange, Eligibility, PrefixError, PrefixValidator};
use crate::registry::{classify, Classified, RegistryTransport, RequestMethod, WhoisResponse};
use crate::template::{TemplateResolver, TemplateStore};
use crate::utils::backup_key;
use std::sync::Arc;
use tracing::{error, info, warn};

/// How often a create is retried after removing an overlapping object
pub const OVERLAP_RETRIES: usize = 1;

/// External systems the reconciler talks to
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn RegistryTransport>,
    pub ipam: Arc<dyn IpamClient>,
    pub backup: Arc<dyn BackupStore>,
    pub notifier: Arc<dyn Notifier>,
    pub templates: Arc<dyn TemplateStore>,
}

/// Drives one event from validation to notification:
/// validate -> back up -> create / update / delete -> notify.
pub struct Reconciler {
    config: SyncConfig,
    validator: PrefixValidator,
    templates: TemplateResolver,
    merge: MergeEngine,
    overlap: OverlapResolver,
    collaborators: Collaborators,
}

/// Result of trying to clear the way for a conflicting create
enum OverlapResolution {
    /// Nothing conflicting was found
    NoCandidate,
    /// A conflicting object exists but the IPAM still uses it
    Blocked(AddressRange),
    /// The conflicting object was deleted
    Deleted(AddressRange),
}

impl Reconciler {
    pub fn new(config: SyncConfig, collaborators: Collaborators) -> Self {
        let validator = PrefixValidator::new(config.smallest_prefix_v4, config.smallest_prefix_v6);
        let templates = TemplateResolver::new(Arc::clone(&collaborators.templates));
        let merge = MergeEngine::new(config.sandbox.clone());
        let overlap = OverlapResolver::new(
            Arc::clone(&collaborators.transport),
            Arc::clone(&collaborators.ipam),
        );

        Self {
            config,
            validator,
            templates,
            merge,
            overlap,
            collaborators,
        }
    }

    /// Reconcile one event. Too-small and non-routed prefixes come back as
    /// [`SyncOutcome::Skipped`]; everything else that stops the flow is an error.
    pub async fn handle(&self, event: &PrefixEvent) -> Result<SyncOutcome, SyncError> {
        let range = AddressRange::parse(&event.prefix)?;

        if let Some(reason) = self.check_eligibility(&range) {
            info!(prefix = %range, reason = %reason, "Skipping prefix");
            return Ok(SyncOutcome::Skipped(reason));
        }

        let mut ctx = self.build_context(event, range).await?;

        let old_object = self.backup_object(&ctx).await?;

        let report = if event.is_delete() {
            info!(prefix = %ctx.range, "Deleting prefix from registry");
            self.delete_object(&ctx).await?
        } else if let Some(old_object) = old_object {
            info!(prefix = %ctx.range, "Updating prefix in registry");
            self.update_object(&mut ctx, &old_object).await?
        } else {
            info!(prefix = %ctx.range, "Creating prefix in registry");
            self.create_object(&mut ctx).await?
        };

        Ok(SyncOutcome::Completed(report))
    }

    fn check_eligibility(&self, range: &AddressRange) -> Option<SkipReason> {
        match self.validator.classify(range) {
            Eligibility::Eligible => None,
            Eligibility::TooSmall { max } => Some(SkipReason::TooSmall(
                PrefixError::TooSmall {
                    prefix_len: range.prefix_len(),
                    max,
                }
                .to_string(),
            )),
            Eligibility::NotRoutable => Some(SkipReason::NotRoutable(
                PrefixError::NotRoutable(range.to_string()).to_string(),
            )),
        }
    }

    async fn build_context(
        &self,
        event: &PrefixEvent,
        range: AddressRange,
    ) -> Result<ReconciliationContext, SyncError> {
        let (org, country) = if event.is_delete() {
            (None, None)
        } else {
            let org = self.collaborators.ipam.lookup_org(&range).await?;
            let country = match &event.site {
                Some(site) => self.collaborators.ipam.lookup_country(site).await?,
                None => None,
            };
            let country = match country {
                Some(country) => Some(country),
                None => self.config.default_country()?,
            };
            (org, country)
        };

        info!(prefix = %range, org = ?org, country = ?country, "Built reconciliation context");

        Ok(ReconciliationContext::new(
            range,
            event.username.clone(),
            org,
            event.template.clone(),
            country,
            self.config.environment,
        ))
    }

    /// Read the current object and save its raw form before anything changes.
    /// Saving is best-effort; a failed read is not.
    async fn backup_object(
        &self,
        ctx: &ReconciliationContext,
    ) -> Result<Option<RegistryObject>, SyncError> {
        info!(prefix = %ctx.range, "Getting old registry object");
        let response = self
            .collaborators
            .transport
            .fetch(ctx.object_type, &ctx.range.to_string())
            .await?;

        if response.is_not_found() {
            info!(prefix = %ctx.range, "Object does not exist in registry");
            return Ok(None);
        }

        if !response.is_success() {
            error!(prefix = %ctx.range, status = response.status, "Could not query old object");
            return Err(SyncError::RegistryRequestError(format!(
                "GET {} returned {}",
                ctx.range, response.status
            )));
        }

        let key = backup_key(&ctx.range.to_string());
        if let Err(e) = self
            .collaborators
            .backup
            .put(&key, response.body.as_bytes())
            .await
        {
            warn!(key = %key, error = %e, "Failed to save backup, continuing");
        }

        Ok(Some(classify(&response).object))
    }

    async fn delete_object(&self, ctx: &ReconciliationContext) -> Result<SyncReport, SyncError> {
        let response = self
            .collaborators
            .transport
            .delete(ctx.object_type, &ctx.range.to_string())
            .await?;
        let classified = classify(&response);
        let text = classified.object.format("-");

        if !classified.success && !response.is_not_found() {
            error!(prefix = %ctx.range, status = response.status, errors = ?classified.errors, "DELETE failed");
            self.notify_failure(ctx, RequestMethod::Delete, text, response.status, classified.errors.clone())
                .await;
            return Err(SyncError::RegistryRequestError(format!(
                "DELETE for {} failed with {}: {}",
                ctx.range,
                response.status,
                classified.errors.join("; ")
            )));
        }

        let action = if response.is_not_found() {
            info!(prefix = %ctx.range, "Object was already absent");
            SyncAction::AlreadyAbsent
        } else {
            SyncAction::Deleted
        };

        self.notify(ctx, RequestMethod::Delete, text, response.status, classified.errors.clone())
            .await?;

        Ok(SyncReport {
            action,
            range: ctx.range,
            status_code: response.status,
            errors: classified.errors,
            deleted_overlap: None,
        })
    }

    /// Build the desired object for the context from its template
    async fn generate_object(
        &self,
        ctx: &mut ReconciliationContext,
    ) -> Result<RegistryObject, SyncError> {
        let name = ctx.template.clone().ok_or_else(|| {
            SyncError::MissingRequiredField("data.custom_fields.ripe_template".to_string())
        })?;
        let template = self.templates.resolve(&name).await?;
        let attributes = self.merge.merge(ctx, &template.attributes, &template.master);
        Ok(RegistryObject::new(self.config.environment.id(), attributes))
    }

    async fn update_object(
        &self,
        ctx: &mut ReconciliationContext,
        old_object: &RegistryObject,
    ) -> Result<SyncReport, SyncError> {
        let new_object = self.generate_object(ctx).await?;
        let document = WhoisResponse::from_object(&new_object);

        let response = self
            .collaborators
            .transport
            .update(ctx.object_type, &ctx.range.registry_key(), &document)
            .await?;
        let classified = classify(&response);
        let diff = line_diff(&old_object.format(""), &classified.object.format(""));

        if !classified.success {
            error!(prefix = %ctx.range, status = response.status, errors = ?classified.errors, "UPDATE failed");
            self.notify_failure(ctx, RequestMethod::Put, diff, response.status, classified.errors.clone())
                .await;
            return Err(SyncError::RegistryRequestError(format!(
                "UPDATE for {} failed with {}: {}",
                ctx.range,
                response.status,
                classified.errors.join("; ")
            )));
        }

        self.notify(ctx, RequestMethod::Put, diff, response.status, classified.errors.clone())
            .await?;

        Ok(SyncReport {
            action: SyncAction::Updated,
            range: ctx.range,
            status_code: response.status,
            errors: classified.errors,
            deleted_overlap: None,
        })
    }

    /// Create the object. A conflict (400) triggers at most [`OVERLAP_RETRIES`]
    /// rounds of: find overlap -> delete it if the IPAM allows -> create again.
    async fn create_object(&self, ctx: &mut ReconciliationContext) -> Result<SyncReport, SyncError> {
        let new_object = self.generate_object(ctx).await?;
        let document = WhoisResponse::from_object(&new_object);

        let mut response = self
            .collaborators
            .transport
            .create(ctx.object_type, &document)
            .await?;
        let mut classified = classify(&response);
        let mut deleted_overlap = None;
        let mut retries = 0;

        while !classified.success && response.is_bad_request() && retries < OVERLAP_RETRIES {
            let resolution = match self.resolve_overlap(ctx).await {
                Ok(resolution) => resolution,
                Err(e) => {
                    self.notify_create_failure(ctx, response.status, &classified).await;
                    return Err(e);
                }
            };

            match resolution {
                OverlapResolution::NoCandidate => break,
                OverlapResolution::Blocked(candidate) => {
                    classified
                        .errors
                        .push(format!("Overlap found for {}: {}", ctx.range, candidate));
                    break;
                }
                OverlapResolution::Deleted(candidate) => {
                    deleted_overlap = Some(candidate);
                    retries += 1;
                    info!(prefix = %ctx.range, attempt = retries, "Retrying create after removing overlap");
                    response = self
                        .collaborators
                        .transport
                        .create(ctx.object_type, &document)
                        .await?;
                    classified = classify(&response);
                }
            }
        }

        if !classified.success {
            self.notify_create_failure(ctx, response.status, &classified).await;
            error!(prefix = %ctx.range, status = response.status, errors = ?classified.errors, "CREATE failed");
            return Err(SyncError::RegistryRequestError(format!(
                "Could not create prefix {}: {}",
                ctx.range,
                classified.errors.join("; ")
            )));
        }

        let mut errors = classified.errors.clone();
        if let Some(candidate) = deleted_overlap {
            let msg = format!("I had to delete overlapped: {}", candidate);
            info!(prefix = %ctx.range, "{}", msg);
            errors = vec![msg];
        }

        self.notify(
            ctx,
            RequestMethod::Post,
            classified.object.format("+ "),
            response.status,
            errors.clone(),
        )
        .await?;

        Ok(SyncReport {
            action: SyncAction::Created,
            range: ctx.range,
            status_code: response.status,
            errors,
            deleted_overlap,
        })
    }

    /// Compensating step of a conflicting create: remove the overlapping
    /// object when the IPAM does not know it. The context's range is swapped
    /// to the candidate for the delete and always restored afterwards.
    async fn resolve_overlap(
        &self,
        ctx: &mut ReconciliationContext,
    ) -> Result<OverlapResolution, SyncError> {
        let Some(candidate) = self.overlap.find_overlap(ctx).await? else {
            return Ok(OverlapResolution::NoCandidate);
        };

        if !self.overlap.authorize_delete(&candidate).await? {
            return Ok(OverlapResolution::Blocked(candidate));
        }

        let original = ctx.swap_range(candidate);
        let deleted = self.delete_object(ctx).await;
        ctx.swap_range(original);

        deleted?;
        Ok(OverlapResolution::Deleted(candidate))
    }

    async fn notify_create_failure(
        &self,
        ctx: &ReconciliationContext,
        status: u16,
        classified: &Classified,
    ) {
        self.notify_failure(
            ctx,
            RequestMethod::Post,
            classified.object.format("+ "),
            status,
            classified.errors.clone(),
        )
        .await;
    }

    /// Send a notification after a success. An unreachable notifier is a
    /// configuration error; other send failures are only logged.
    async fn notify(
        &self,
        ctx: &ReconciliationContext,
        method: RequestMethod,
        object_text: String,
        status: u16,
        errors: Vec<String>,
    ) -> Result<(), SyncError> {
        let notification =
            Notification::new(object_text, method, ctx.range, ctx.username.clone(), status, errors);

        match self.collaborators.notifier.notify(&notification).await {
            Ok(()) => Ok(()),
            Err(NotifyError::Unreachable(msg)) => {
                error!(error = %msg, "Unable to reach notification transport");
                Err(SyncError::ConfigurationError(msg))
            }
            Err(e) => {
                warn!(error = %e, "Failed to send notification");
                Ok(())
            }
        }
    }

    /// Best-effort notification on the way to an error; the original error wins
    async fn notify_failure(
        &self,
        ctx: &ReconciliationContext,
        method: RequestMethod,
        object_text: String,
        status: u16,
        errors: Vec<String>,
    ) {
        if let Err(e) = self.notify(ctx, method, object_text, status, errors).await {
            warn!(error = %e, "Failure notification was not delivered");
        }
    }
}
