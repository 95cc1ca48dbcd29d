use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{
    Category, CategoryRef, DirectoryEntry, DirectoryFilter, NewProfessional, ProfessionalId,
    ProfessionalProfile, ProfessionalStatus,
};
use super::storage::{DirectoryStore, StoreError};

/// In-process adapter for the storage port. Used by tests and by the
/// `DATABASE_URL=memory` configuration; state lives behind one mutex and is
/// discarded with the instance, never held in ambient globals.
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    professionals: BTreeMap<i64, ProfessionalRow>,
    categories: Vec<Category>,
    links: Vec<CategoryLink>,
    skills: Vec<SkillRow>,
}

#[derive(Debug, Clone)]
struct ProfessionalRow {
    fields: NewProfessional,
    status: ProfessionalStatus,
    is_published: bool,
    view_count: i64,
    approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CategoryLink {
    professional_id: i64,
    category_id: i64,
    is_primary: bool,
}

#[derive(Debug, Clone)]
struct SkillRow {
    professional_id: i64,
    skill_name: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_categories(Vec::new())
    }

    /// Construct with injected category master data, mirroring the seeded
    /// `categories` table of the relational backend.
    pub fn with_categories(categories: Vec<Category>) -> Self {
        Self {
            tables: Mutex::new(Tables {
                categories,
                ..Tables::default()
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_: PoisonError<_>| StoreError::Unavailable("store mutex poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn category_names(&self, professional_id: i64) -> String {
        let names: Vec<&str> = self
            .links
            .iter()
            .filter(|link| link.professional_id == professional_id)
            .filter_map(|link| {
                self.categories
                    .iter()
                    .find(|category| category.id == link.category_id)
                    .map(|category| category.name.as_str())
            })
            .collect();
        names.join(",")
    }

    fn skill_names(&self, professional_id: i64) -> String {
        let names: Vec<&str> = self
            .skills
            .iter()
            .filter(|skill| skill.professional_id == professional_id)
            .map(|skill| skill.skill_name.as_str())
            .collect();
        names.join(",")
    }

    fn linked_to_slug(&self, professional_id: i64, slug: &str) -> bool {
        self.links
            .iter()
            .filter(|link| link.professional_id == professional_id)
            .any(|link| {
                self.categories
                    .iter()
                    .any(|category| category.id == link.category_id && category.slug == slug)
            })
    }

    fn matches(&self, id: i64, row: &ProfessionalRow, filter: &DirectoryFilter) -> bool {
        if let Some(slug) = &filter.category {
            if !self.linked_to_slug(id, slug) {
                return false;
            }
        }

        if let Some(area) = &filter.area {
            if &row.fields.activity_area != area {
                return false;
            }
        }

        if let Some(keyword) = &filter.keyword {
            let needle = keyword.to_lowercase();
            let in_name = row.fields.display_name.to_lowercase().contains(&needle);
            let in_bio = row.fields.bio.to_lowercase().contains(&needle);
            let in_categories = self.category_names(id).to_lowercase().contains(&needle);
            if !(in_name || in_bio || in_categories) {
                return false;
            }
        }

        true
    }

    fn entry(&self, id: i64, row: &ProfessionalRow) -> DirectoryEntry {
        DirectoryEntry {
            id: ProfessionalId(id),
            display_name: row.fields.display_name.clone(),
            email: row.fields.email.clone(),
            activity_area: row.fields.activity_area.clone(),
            target_age_min: row.fields.target_age_min,
            target_age_max: row.fields.target_age_max,
            service_format: row.fields.service_format,
            bio: row.fields.bio.clone(),
            hourly_rate_min: row.fields.hourly_rate_min,
            hourly_rate_max: row.fields.hourly_rate_max,
            profile_image_url: row.fields.profile_image_url.clone(),
            status: row.status,
            is_published: row.is_published,
            view_count: row.view_count,
            created_at: row.fields.created_at,
            categories: self.category_names(id),
        }
    }

    fn profile(&self, id: i64, row: &ProfessionalRow) -> ProfessionalProfile {
        ProfessionalProfile {
            id: ProfessionalId(id),
            email: row.fields.email.clone(),
            display_name: row.fields.display_name.clone(),
            full_name: row.fields.full_name.clone(),
            phone: row.fields.phone.clone(),
            activity_area: row.fields.activity_area.clone(),
            target_age_min: row.fields.target_age_min,
            target_age_max: row.fields.target_age_max,
            service_format: row.fields.service_format,
            bio: row.fields.bio.clone(),
            teaching_philosophy: row.fields.teaching_philosophy.clone(),
            hourly_rate_min: row.fields.hourly_rate_min,
            hourly_rate_max: row.fields.hourly_rate_max,
            price_note: row.fields.price_note.clone(),
            profile_image_url: row.fields.profile_image_url.clone(),
            instagram_url: row.fields.instagram_url.clone(),
            twitter_url: row.fields.twitter_url.clone(),
            facebook_url: row.fields.facebook_url.clone(),
            youtube_url: row.fields.youtube_url.clone(),
            website_url: row.fields.website_url.clone(),
            status: row.status,
            is_published: row.is_published,
            view_count: row.view_count,
            created_at: row.fields.created_at,
            approved_at: row.approved_at,
            categories: self.category_names(id),
            skills: self.skill_names(id),
        }
    }
}

fn publicly_visible(row: &ProfessionalRow) -> bool {
    row.status == ProfessionalStatus::Approved && row.is_published
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_professional(
        &self,
        new: NewProfessional,
    ) -> Result<ProfessionalId, StoreError> {
        let mut tables = self.lock()?;

        if tables
            .professionals
            .values()
            .any(|row| row.fields.email == new.email)
        {
            return Err(StoreError::DuplicateEmail);
        }

        tables.next_id += 1;
        let id = tables.next_id;
        tables.professionals.insert(
            id,
            ProfessionalRow {
                fields: new,
                status: ProfessionalStatus::Pending,
                is_published: false,
                view_count: 0,
                approved_at: None,
            },
        );

        Ok(ProfessionalId(id))
    }

    async fn get_professional(
        &self,
        id: ProfessionalId,
        public_only: bool,
    ) -> Result<ProfessionalProfile, StoreError> {
        let tables = self.lock()?;
        let row = tables.professionals.get(&id.0).ok_or(StoreError::NotFound)?;
        if public_only && !publicly_visible(row) {
            return Err(StoreError::NotFound);
        }
        Ok(tables.profile(id.0, row))
    }

    async fn list_professionals(
        &self,
        filter: &DirectoryFilter,
        public_only: bool,
    ) -> Result<Vec<DirectoryEntry>, StoreError> {
        let tables = self.lock()?;

        let mut entries: Vec<DirectoryEntry> = tables
            .professionals
            .iter()
            .filter(|(_, row)| !public_only || publicly_visible(row))
            .filter(|(id, row)| tables.matches(**id, row, filter))
            .map(|(id, row)| tables.entry(*id, row))
            .collect();

        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });

        Ok(entries)
    }

    async fn update_status(
        &self,
        id: ProfessionalId,
        status: ProfessionalStatus,
        published: bool,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables
            .professionals
            .get_mut(&id.0)
            .ok_or(StoreError::NotFound)?;

        row.status = status;
        row.is_published = published;
        if let Some(timestamp) = approved_at {
            row.approved_at = Some(timestamp);
        }

        Ok(())
    }

    async fn increment_view_count(&self, id: ProfessionalId) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let row = tables
            .professionals
            .get_mut(&id.0)
            .ok_or(StoreError::NotFound)?;
        row.view_count += 1;
        Ok(())
    }

    async fn resolve_categories_by_slug(
        &self,
        slugs: &[String],
    ) -> Result<Vec<CategoryRef>, StoreError> {
        let tables = self.lock()?;
        Ok(slugs
            .iter()
            .filter_map(|slug| {
                tables
                    .categories
                    .iter()
                    .find(|category| &category.slug == slug)
                    .map(|category| CategoryRef {
                        id: category.id,
                        slug: category.slug.clone(),
                    })
            })
            .collect())
    }

    async fn insert_category_links(
        &self,
        id: ProfessionalId,
        category_ids: &[i64],
        primary_index: usize,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        for (index, category_id) in category_ids.iter().enumerate() {
            tables.links.push(CategoryLink {
                professional_id: id.0,
                category_id: *category_id,
                is_primary: index == primary_index,
            });
        }
        Ok(())
    }

    async fn insert_skills(&self, id: ProfessionalId, names: &[String]) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        for name in names {
            tables.skills.push(SkillRow {
                professional_id: id.0,
                skill_name: name.clone(),
            });
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.lock()?;
        let mut categories: Vec<Category> = tables
            .categories
            .iter()
            .filter(|category| category.is_active)
            .cloned()
            .collect();
        categories.sort_by_key(|category| category.sort_order);
        Ok(categories)
    }
}

/// The platform's standard category master data, matching the relational
/// migration seed. Injected into [`MemoryStore`] by the binary wiring.
pub fn standard_categories() -> Vec<Category> {
    let entries = [
        ("music", "音楽・芸術"),
        ("education", "学習・教育"),
        ("sports", "スポーツ"),
        ("art", "アート・創作"),
        ("programming", "プログラミング"),
        ("language", "語学"),
        ("business", "企業支援"),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(index, (slug, name))| Category {
            id: index as i64 + 1,
            name: (*name).to_string(),
            slug: (*slug).to_string(),
            sort_order: index as i64 + 1,
            is_active: true,
        })
        .collect()
}
