use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use tracing::warn;

use super::domain::{
    Category, CategoryRef, DirectoryEntry, DirectoryFilter, NewProfessional, ProfessionalId,
    ProfessionalProfile, ProfessionalStatus, ServiceFormat,
};
use super::resolver;
use super::storage::{DirectoryStore, StoreError};

/// SQLite adapter for the storage port. Registrations run in a single
/// transaction so a failed category or skill insert rolls back the
/// professional row instead of stranding it.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool (tests hand in a single-connection in-memory
    /// pool) and bring the schema up to date.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { pool })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

const INSERT_PROFESSIONAL: &str = "\
INSERT INTO professionals (
    email, password_hash, display_name, full_name, phone, activity_area,
    target_age_min, target_age_max, service_format, bio, teaching_philosophy,
    hourly_rate_min, hourly_rate_max, price_note, profile_image_url,
    instagram_url, twitter_url, facebook_url, youtube_url, website_url,
    status, is_published, view_count, created_at
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0, 0, ?)";

const CATEGORY_NAMES_SUBQUERY: &str = "COALESCE((SELECT GROUP_CONCAT(c.name) \
FROM professional_categories pc JOIN categories c ON c.id = pc.category_id \
WHERE pc.professional_id = p.id), '')";

const SKILL_NAMES_SUBQUERY: &str = "COALESCE((SELECT GROUP_CONCAT(ps.skill_name) \
FROM professional_skills ps WHERE ps.professional_id = p.id), '')";

async fn insert_professional_row(
    conn: &mut SqliteConnection,
    new: &NewProfessional,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(INSERT_PROFESSIONAL)
        .bind(new.email.as_str())
        .bind(new.password_hash.as_deref())
        .bind(new.display_name.as_str())
        .bind(new.full_name.as_deref())
        .bind(new.phone.as_deref())
        .bind(new.activity_area.as_str())
        .bind(new.target_age_min)
        .bind(new.target_age_max)
        .bind(new.service_format.label())
        .bind(new.bio.as_str())
        .bind(new.teaching_philosophy.as_deref())
        .bind(new.hourly_rate_min)
        .bind(new.hourly_rate_max)
        .bind(new.price_note.as_deref())
        .bind(new.profile_image_url.as_deref())
        .bind(new.instagram_url.as_deref())
        .bind(new.twitter_url.as_deref())
        .bind(new.facebook_url.as_deref())
        .bind(new.youtube_url.as_deref())
        .bind(new.website_url.as_deref())
        .bind(new.created_at)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

async fn resolve_slug_rows(
    conn: &mut SqliteConnection,
    slugs: &[String],
) -> Result<Vec<CategoryRef>, sqlx::Error> {
    if slugs.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, slug FROM categories WHERE slug IN (");
    let mut separated = builder.separated(", ");
    for slug in slugs {
        separated.push_bind(slug.as_str());
    }
    builder.push(")");

    let rows = builder.build().fetch_all(&mut *conn).await?;
    let mut found = Vec::with_capacity(rows.len());
    for row in rows {
        found.push(CategoryRef {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
        });
    }

    // Re-order to the request order so the first submitted slug stays primary.
    Ok(slugs
        .iter()
        .filter_map(|slug| found.iter().find(|category| &category.slug == slug))
        .cloned()
        .collect())
}

async fn insert_link_rows(
    conn: &mut SqliteConnection,
    professional_id: i64,
    category_ids: &[i64],
    primary_index: usize,
) -> Result<(), sqlx::Error> {
    for (index, category_id) in category_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO professional_categories (professional_id, category_id, is_primary) \
             VALUES (?, ?, ?)",
        )
        .bind(professional_id)
        .bind(category_id)
        .bind(index == primary_index)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn insert_skill_rows(
    conn: &mut SqliteConnection,
    professional_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    for name in names {
        sqlx::query(
            "INSERT INTO professional_skills (professional_id, skill_name, skill_type) \
             VALUES (?, ?, 'skill')",
        )
        .bind(professional_id)
        .bind(name.as_str())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Keywords are plain substrings; `%` and `_` in user input must match
/// themselves, not act as LIKE wildcards.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn parse_status(raw: &str) -> Result<ProfessionalStatus, StoreError> {
    ProfessionalStatus::from_label(raw)
        .ok_or_else(|| StoreError::Unavailable(format!("unknown status '{raw}' in store")))
}

fn map_entry(row: &SqliteRow) -> Result<DirectoryEntry, StoreError> {
    let status: String = row.try_get("status")?;
    let service_format: String = row.try_get("service_format")?;

    Ok(DirectoryEntry {
        id: ProfessionalId(row.try_get("id")?),
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
        activity_area: row.try_get("activity_area")?,
        target_age_min: row.try_get("target_age_min")?,
        target_age_max: row.try_get("target_age_max")?,
        service_format: ServiceFormat::from_input(Some(&service_format)),
        bio: row.try_get("bio")?,
        hourly_rate_min: row.try_get("hourly_rate_min")?,
        hourly_rate_max: row.try_get("hourly_rate_max")?,
        profile_image_url: row.try_get("profile_image_url")?,
        status: parse_status(&status)?,
        is_published: row.try_get("is_published")?,
        view_count: row.try_get("view_count")?,
        created_at: row.try_get("created_at")?,
        categories: row.try_get("categories")?,
    })
}

fn map_profile(row: &SqliteRow) -> Result<ProfessionalProfile, StoreError> {
    let status: String = row.try_get("status")?;
    let service_format: String = row.try_get("service_format")?;
    let approved_at: Option<DateTime<Utc>> = row.try_get("approved_at")?;

    Ok(ProfessionalProfile {
        id: ProfessionalId(row.try_get("id")?),
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        full_name: row.try_get("full_name")?,
        phone: row.try_get("phone")?,
        activity_area: row.try_get("activity_area")?,
        target_age_min: row.try_get("target_age_min")?,
        target_age_max: row.try_get("target_age_max")?,
        service_format: ServiceFormat::from_input(Some(&service_format)),
        bio: row.try_get("bio")?,
        teaching_philosophy: row.try_get("teaching_philosophy")?,
        hourly_rate_min: row.try_get("hourly_rate_min")?,
        hourly_rate_max: row.try_get("hourly_rate_max")?,
        price_note: row.try_get("price_note")?,
        profile_image_url: row.try_get("profile_image_url")?,
        instagram_url: row.try_get("instagram_url")?,
        twitter_url: row.try_get("twitter_url")?,
        facebook_url: row.try_get("facebook_url")?,
        youtube_url: row.try_get("youtube_url")?,
        website_url: row.try_get("website_url")?,
        status: parse_status(&status)?,
        is_published: row.try_get("is_published")?,
        view_count: row.try_get("view_count")?,
        created_at: row.try_get("created_at")?,
        approved_at,
        categories: row.try_get("categories")?,
        skills: row.try_get("skills")?,
    })
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn insert_professional(
        &self,
        new: NewProfessional,
    ) -> Result<ProfessionalId, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_professional_row(&mut conn, &new).await?;
        Ok(ProfessionalId(id))
    }

    async fn get_professional(
        &self,
        id: ProfessionalId,
        public_only: bool,
    ) -> Result<ProfessionalProfile, StoreError> {
        let mut sql = format!(
            "SELECT p.*, {CATEGORY_NAMES_SUBQUERY} AS categories, {SKILL_NAMES_SUBQUERY} AS skills \
             FROM professionals p WHERE p.id = ?"
        );
        if public_only {
            sql.push_str(" AND p.status = 'approved' AND p.is_published = 1");
        }

        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        map_profile(&row)
    }

    async fn list_professionals(
        &self,
        filter: &DirectoryFilter,
        public_only: bool,
    ) -> Result<Vec<DirectoryEntry>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT p.id, p.display_name, p.email, p.activity_area, p.target_age_min, \
             p.target_age_max, p.service_format, p.bio, p.hourly_rate_min, p.hourly_rate_max, \
             p.profile_image_url, p.status, p.is_published, p.view_count, p.created_at, \
             {CATEGORY_NAMES_SUBQUERY} AS categories FROM professionals p WHERE 1 = 1"
        ));

        if public_only {
            builder.push(" AND p.status = 'approved' AND p.is_published = 1");
        }

        if let Some(slug) = &filter.category {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM professional_categories pc \
                     JOIN categories c ON c.id = pc.category_id \
                     WHERE pc.professional_id = p.id AND c.slug = ",
                )
                .push_bind(slug.as_str())
                .push(")");
        }

        if let Some(area) = &filter.area {
            builder.push(" AND p.activity_area = ").push_bind(area.as_str());
        }

        if let Some(keyword) = &filter.keyword {
            let pattern = format!("%{}%", escape_like(keyword));
            builder
                .push(" AND (p.display_name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR p.bio LIKE ")
                .push_bind(pattern.clone())
                .push(
                    " ESCAPE '\\' OR EXISTS (SELECT 1 FROM professional_categories pc \
                     JOIN categories c ON c.id = pc.category_id \
                     WHERE pc.professional_id = p.id AND c.name LIKE ",
                )
                .push_bind(pattern)
                .push(" ESCAPE '\\'))");
        }

        builder.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_entry).collect()
    }

    async fn update_status(
        &self,
        id: ProfessionalId,
        status: ProfessionalStatus,
        published: bool,
        approved_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE professionals SET status = ?, is_published = ?, \
             approved_at = COALESCE(?, approved_at) WHERE id = ?",
        )
        .bind(status.label())
        .bind(published)
        .bind(approved_at)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn increment_view_count(&self, id: ProfessionalId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE professionals SET view_count = view_count + 1 WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn resolve_categories_by_slug(
        &self,
        slugs: &[String],
    ) -> Result<Vec<CategoryRef>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(resolve_slug_rows(&mut conn, slugs).await?)
    }

    async fn insert_category_links(
        &self,
        id: ProfessionalId,
        category_ids: &[i64],
        primary_index: usize,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(insert_link_rows(&mut conn, id.0, category_ids, primary_index).await?)
    }

    async fn insert_skills(&self, id: ProfessionalId, names: &[String]) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(insert_skill_rows(&mut conn, id.0, names).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, slug, sort_order, is_active FROM categories \
             WHERE is_active = 1 ORDER BY sort_order",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut categories = Vec::with_capacity(rows.len());
        for row in rows {
            categories.push(Category {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                sort_order: row.try_get("sort_order")?,
                is_active: row.try_get("is_active")?,
            });
        }
        Ok(categories)
    }

    /// One transaction for the whole registration fan-out. A duplicate email
    /// aborts before any link or skill row exists; a later failure rolls the
    /// professional row back.
    async fn insert_registration(
        &self,
        new: NewProfessional,
        category_slugs: &[String],
        skills: &[String],
    ) -> Result<ProfessionalId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let id = insert_professional_row(&mut tx, &new).await?;

        if !category_slugs.is_empty() {
            let resolved = resolve_slug_rows(&mut tx, category_slugs).await?;
            let dropped = resolver::dropped_slugs(category_slugs, &resolved);
            if !dropped.is_empty() {
                warn!(?dropped, professional_id = id, "unknown category slugs dropped during registration");
            }
            if !resolved.is_empty() {
                let category_ids: Vec<i64> = resolved.iter().map(|category| category.id).collect();
                insert_link_rows(&mut tx, id, &category_ids, 0).await?;
            }
        }

        if !skills.is_empty() {
            insert_skill_rows(&mut tx, id, skills).await?;
        }

        tx.commit().await?;
        Ok(ProfessionalId(id))
    }
}
