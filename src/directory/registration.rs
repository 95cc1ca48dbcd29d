use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::ProfessionalId;
use super::intake;
use super::storage::DirectoryStore;
use super::{DirectoryError, RegistrationForm};

/// bcrypt work factor used in production, matching the platform's historical
/// setting. Tests dial this down to keep hashing fast.
pub const DEFAULT_HASH_COST: u32 = 12;

/// Localized acknowledgement returned to every accepted registration.
pub const REGISTRATION_ACCEPTED: &str =
    "登録申請が完了しました。審査結果をメールでお知らせいたします。";

/// Outcome of an accepted registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationReceipt {
    pub id: ProfessionalId,
    pub message: &'static str,
}

/// Registration engine: validates a raw form, hashes the credential, and
/// persists the professional with their categories and skills as one unit.
pub struct RegistrationEngine {
    store: Arc<dyn DirectoryStore>,
    hash_cost: u32,
}

impl RegistrationEngine {
    pub fn new(store: Arc<dyn DirectoryStore>) -> Self {
        Self::with_hash_cost(store, DEFAULT_HASH_COST)
    }

    pub fn with_hash_cost(store: Arc<dyn DirectoryStore>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    /// Accept a registration. New professionals always start `pending` and
    /// unpublished; a duplicate email surfaces as `StoreError::DuplicateEmail`
    /// with nothing written.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationReceipt, DirectoryError> {
        let screened = intake::screen(form)?;

        let mut professional = screened.professional;
        if let Some(password) = &screened.password {
            professional.password_hash = Some(bcrypt::hash(password, self.hash_cost)?);
        }

        let id = self
            .store
            .insert_registration(professional, &screened.category_slugs, &screened.skills)
            .await?;

        info!(%id, "registration accepted for review");

        Ok(RegistrationReceipt {
            id,
            message: REGISTRATION_ACCEPTED,
        })
    }
}
