use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use super::domain::{
    Category, CategoryRef, DirectoryEntry, DirectoryFilter, NewProfessional, ProfessionalId,
    ProfessionalProfile, ProfessionalStatus,
};
use super::resolver;

/// Error enumeration for storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("record not found")]
    NotFound,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage port for the directory core. Both the SQLite adapter and the
/// in-memory adapter satisfy this contract identically, so the engines can be
/// exercised against either.
///
/// Email uniqueness must be enforced atomically by the backend (a constraint,
/// not a check-then-insert), and `insert_professional` always creates rows as
/// `pending`, unpublished, with a zero view count.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_professional(&self, new: NewProfessional)
        -> Result<ProfessionalId, StoreError>;

    /// Fetch one record. With `public_only`, only `approved` and published
    /// rows are visible; everything else is `NotFound`.
    async fn get_professional(
        &self,
        id: ProfessionalId,
        public_only: bool,
    ) -> Result<ProfessionalProfile, StoreError>;

    /// Filtered listing, newest first. The unfiltered, non-public variant
    /// backs the admin application list.
    async fn list_professionals(
        &self,
        filter: &DirectoryFilter,
        public_only: bool,
    ) -> Result<Vec<DirectoryEntry>, StoreError>;

    /// Overwrite the moderation fields. `approved_at` is only written when
    /// supplied, so rejections leave any earlier approval timestamp in place.
    /// Zero affected rows is `NotFound`.
    async fn update_status(
        &self,
        id: ProfessionalId,
        status: ProfessionalStatus,
        published: bool,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Best-effort counter bump; not required to be transactional with reads.
    async fn increment_view_count(&self, id: ProfessionalId) -> Result<(), StoreError>;

    /// Resolve caller-supplied slugs to category records, in request order.
    /// Unknown slugs are simply absent from the result.
    async fn resolve_categories_by_slug(
        &self,
        slugs: &[String],
    ) -> Result<Vec<CategoryRef>, StoreError>;

    async fn insert_category_links(
        &self,
        id: ProfessionalId,
        category_ids: &[i64],
        primary_index: usize,
    ) -> Result<(), StoreError>;

    async fn insert_skills(&self, id: ProfessionalId, names: &[String]) -> Result<(), StoreError>;

    /// Active category master data, in display order.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    /// Persist a full registration: professional row, category links (first
    /// resolved slug primary), and skill rows.
    ///
    /// The default composition runs the steps sequentially through the port;
    /// backends with multi-statement transactions override it so a failure
    /// after the insert cannot leave an orphaned professional behind.
    async fn insert_registration(
        &self,
        new: NewProfessional,
        category_slugs: &[String],
        skills: &[String],
    ) -> Result<ProfessionalId, StoreError> {
        let id = self.insert_professional(new).await?;

        if !category_slugs.is_empty() {
            let resolved = self.resolve_categories_by_slug(category_slugs).await?;
            let dropped = resolver::dropped_slugs(category_slugs, &resolved);
            if !dropped.is_empty() {
                warn!(?dropped, %id, "unknown category slugs dropped during registration");
            }
            if !resolved.is_empty() {
                let category_ids: Vec<i64> = resolved.iter().map(|category| category.id).collect();
                self.insert_category_links(id, &category_ids, 0).await?;
            }
        }

        if !skills.is_empty() {
            self.insert_skills(id, skills).await?;
        }

        Ok(id)
    }
}
