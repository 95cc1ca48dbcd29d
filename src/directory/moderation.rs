use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{ProfessionalId, ProfessionalStatus};
use super::storage::DirectoryStore;
use super::DirectoryError;

/// Moderation state machine: `pending → approved | rejected`.
///
/// Transitions overwrite unconditionally, so an admin can re-approve a
/// rejected application after a second look. Approval and publication flip
/// together, which is what keeps published rows approved by construction.
pub struct Moderation {
    store: Arc<dyn DirectoryStore>,
}

impl Moderation {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self { store }
    }

    /// Approve and publish. Stamps `approved_at`; re-approval restamps it.
    pub async fn approve(&self, id: ProfessionalId) -> Result<(), DirectoryError> {
        self.store
            .update_status(id, ProfessionalStatus::Approved, true, Some(Utc::now()))
            .await?;
        info!(%id, "application approved and published");
        Ok(())
    }

    /// Reject and unpublish. An earlier approval timestamp is left in place.
    pub async fn reject(&self, id: ProfessionalId) -> Result<(), DirectoryError> {
        self.store
            .update_status(id, ProfessionalStatus::Rejected, false, None)
            .await?;
        info!(%id, "application rejected");
        Ok(())
    }
}
