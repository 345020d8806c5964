//! Link creation, resolution and deletion service.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::audit::AuditDispatcher;
use crate::deletion::DeletionPipeline;
use crate::domain::audit_event::AuditEvent;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::{StorageError, UrlRepository};
use crate::error::AppError;
use crate::utils::code_generator::generate_short_id;

/// Attempts before giving up on finding a free short id.
const MAX_ATTEMPTS: usize = 10;

/// Result of a shorten request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortened {
    /// A new mapping was stored.
    Created(String),
    /// The URL was already shortened; carries the existing short URL.
    Existing(String),
}

/// Service for creating, resolving and deleting short links.
///
/// Publishes audit events for successful shorten and follow operations and
/// hands bulk deletions to the [`DeletionPipeline`]; neither blocks the caller.
pub struct LinkService {
    repository: Arc<dyn UrlRepository>,
    audit: Arc<AuditDispatcher>,
    deletion: Arc<DeletionPipeline>,
    base_url: String,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// # Arguments
    ///
    /// - `repository` - storage backend
    /// - `audit` - dispatcher receiving shorten/follow events
    /// - `deletion` - pipeline receiving bulk deletions
    /// - `base_url` - prefix of every returned short URL
    pub fn new(
        repository: Arc<dyn UrlRepository>,
        audit: Arc<AuditDispatcher>,
        deletion: Arc<DeletionPipeline>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            audit,
            deletion,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds the public short URL for `short_id`.
    pub fn short_url(&self, short_id: &str) -> String {
        format!("{}/{}", self.base_url, short_id)
    }

    /// Shortens `original_url` on behalf of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL is not an absolute HTTP(S) URL.
    /// Returns [`AppError::Internal`] on storage errors or when no free short id
    /// was found.
    pub async fn shorten(&self, original_url: &str, user_id: &str) -> Result<Shortened, AppError> {
        let original_url = original_url.trim();
        validate_url(original_url)?;
        self.store(original_url, user_id).await
    }

    /// Shortens every URL of `original_urls`, returning short URLs in input order.
    ///
    /// URLs that were already shortened resolve to their existing short URL.
    /// The batch is validated as a whole before anything is stored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty batch or if any URL is
    /// invalid. Returns [`AppError::Internal`] on storage errors.
    pub async fn shorten_batch(
        &self,
        original_urls: &[String],
        user_id: &str,
    ) -> Result<Vec<String>, AppError> {
        if original_urls.is_empty() {
            return Err(AppError::bad_request("Batch is empty", json!({})));
        }

        let trimmed: Vec<&str> = original_urls.iter().map(|u| u.trim()).collect();
        for (index, url) in trimmed.iter().enumerate() {
            validate_url(url).map_err(|e| match e {
                AppError::Validation { message, details } => AppError::bad_request(
                    message,
                    json!({ "index": index, "reason": details }),
                ),
                other => other,
            })?;
        }

        let mut short_urls = Vec::with_capacity(trimmed.len());
        for url in trimmed {
            let short_url = match self.store(url, user_id).await? {
                Shortened::Created(short_url) | Shortened::Existing(short_url) => short_url,
            };
            short_urls.push(short_url);
        }

        info!(count = short_urls.len(), "Batch shortened");
        Ok(short_urls)
    }

    async fn store(&self, original_url: &str, user_id: &str) -> Result<Shortened, AppError> {
        if let Some(existing) = self.repository.find_by_original_url(original_url).await? {
            debug!(short_id = %existing.short_id, "URL already shortened");
            return Ok(Shortened::Existing(self.short_url(&existing.short_id)));
        }

        for _ in 0..MAX_ATTEMPTS {
            let short_id = generate_short_id().map_err(|e| {
                AppError::internal("Failed to generate short id", json!({ "reason": e.to_string() }))
            })?;

            let record = UrlRecord::new(short_id.as_str(), original_url, user_id);
            match self.repository.save(record).await {
                Ok(()) => {
                    info!(short_id = %short_id, "Short link created");
                    self.audit
                        .publish(AuditEvent::shorten(Some(user_id.to_string()), original_url));
                    return Ok(Shortened::Created(self.short_url(&short_id)));
                }
                Err(StorageError::DuplicateShortId(_)) => continue,
                // Lost a race with a concurrent shorten of the same URL.
                Err(StorageError::DuplicateOriginalUrl { short_id }) => {
                    debug!(short_id = %short_id, "URL shortened concurrently");
                    return Ok(Shortened::Existing(self.short_url(&short_id)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::internal(
            "Failed to generate unique short id",
            json!({ "reason": "Too many collisions" }),
        ))
    }

    /// Resolves `short_id` to its original URL and records a follow event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for unknown ids and [`AppError::Gone`]
    /// for deleted ones.
    pub async fn expand(&self, short_id: &str, user_id: Option<&str>) -> Result<String, AppError> {
        let record = self
            .repository
            .find_by_short_id(short_id)
            .await?
            .ok_or_else(|| AppError::not_found("Short link not found", json!({ "id": short_id })))?;

        if record.is_deleted {
            return Err(AppError::gone(
                "Short link has been deleted",
                json!({ "id": short_id }),
            ));
        }

        self.audit.publish(AuditEvent::follow(
            user_id.map(str::to_string),
            record.original_url.as_str(),
        ));
        Ok(record.original_url)
    }

    /// Lists the live links owned by `user_id` as `(short_url, original_url)`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn user_urls(&self, user_id: &str) -> Result<Vec<(String, String)>, AppError> {
        Ok(self
            .repository
            .find_by_owner(user_id)
            .await?
            .into_iter()
            .map(|r| (self.short_url(&r.short_id), r.original_url))
            .collect())
    }

    /// Queues deletion of `short_ids` owned by `user_id`.
    ///
    /// Returns immediately. Ids not owned by the user are ignored when the
    /// batch reaches storage.
    pub fn delete_urls(&self, user_id: &str, short_ids: Vec<String>) {
        info!(count = short_ids.len(), "Bulk delete accepted");
        self.deletion.submit(user_id, short_ids);
    }

    /// Checks that storage answers.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the backend is unavailable.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await?;
        Ok(())
    }
}

fn validate_url(raw: &str) -> Result<(), AppError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() })))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::bad_request(
            "Only http and https URLs can be shortened",
            json!({ "url": raw }),
        ));
    }
    Ok(())
}
