use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::domain::{
    Category, DirectoryEntry, DirectoryFilter, ProfessionalId, ProfessionalProfile,
    ProfessionalStatus, ServiceFormat,
};
use super::storage::DirectoryStore;
use super::DirectoryError;

/// Public directory row. Projection of [`DirectoryEntry`] that never carries
/// email or moderation state.
#[derive(Debug, Clone, Serialize)]
pub struct PublicListing {
    pub id: ProfessionalId,
    pub display_name: String,
    pub activity_area: String,
    pub target_age_min: i64,
    pub target_age_max: i64,
    pub service_format: ServiceFormat,
    pub bio: String,
    pub hourly_rate_min: Option<i64>,
    pub hourly_rate_max: Option<i64>,
    pub profile_image_url: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub categories: String,
}

impl From<DirectoryEntry> for PublicListing {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            id: entry.id,
            display_name: entry.display_name,
            activity_area: entry.activity_area,
            target_age_min: entry.target_age_min,
            target_age_max: entry.target_age_max,
            service_format: entry.service_format,
            bio: entry.bio,
            hourly_rate_min: entry.hourly_rate_min,
            hourly_rate_max: entry.hourly_rate_max,
            profile_image_url: entry.profile_image_url,
            view_count: entry.view_count,
            created_at: entry.created_at,
            categories: entry.categories,
        }
    }
}

/// Admin application row: moderation-relevant columns only.
#[derive(Debug, Clone, Serialize)]
pub struct AdminListing {
    pub id: ProfessionalId,
    pub display_name: String,
    pub email: String,
    pub activity_area: String,
    pub status: ProfessionalStatus,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub categories: String,
}

impl From<DirectoryEntry> for AdminListing {
    fn from(entry: DirectoryEntry) -> Self {
        Self {
            id: entry.id,
            display_name: entry.display_name,
            email: entry.email,
            activity_area: entry.activity_area,
            status: entry.status,
            is_published: entry.is_published,
            created_at: entry.created_at,
            categories: entry.categories,
        }
    }
}

/// Directory query engine over approved, published professionals plus the
/// unfiltered admin view.
pub struct DirectoryQuery {
    store: Arc<dyn DirectoryStore>,
}

impl DirectoryQuery {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Filtered public listing, newest first. The nationwide sentinel and
    /// blank filter values are collapsed before they reach the store.
    pub async fn list_public(
        &self,
        filter: DirectoryFilter,
    ) -> Result<Vec<PublicListing>, DirectoryError> {
        let filter = filter.normalized();
        let entries = self.store.list_professionals(&filter, true).await?;
        Ok(entries.into_iter().map(PublicListing::from).collect())
    }

    /// Single public profile. Every successful fetch bumps the view counter;
    /// the bump is fire-and-forget relative to the returned profile, so the
    /// count shown is the pre-fetch value.
    pub async fn get_public(
        &self,
        id: ProfessionalId,
    ) -> Result<ProfessionalProfile, DirectoryError> {
        let profile = self.store.get_professional(id, true).await?;

        if let Err(err) = self.store.increment_view_count(id).await {
            warn!(%id, error = %err, "view count increment failed");
        }

        Ok(profile)
    }

    /// Every application regardless of state, newest first.
    pub async fn list_all_for_admin(&self) -> Result<Vec<AdminListing>, DirectoryError> {
        let entries = self
            .store
            .list_professionals(&DirectoryFilter::default(), false)
            .await?;
        Ok(entries.into_iter().map(AdminListing::from).collect())
    }

    /// Active category master data for the registration and filter UIs.
    pub async fn list_categories(&self) -> Result<Vec<Category>, DirectoryError> {
        Ok(self.store.list_categories().await?)
    }
}
