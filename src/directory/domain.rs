use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel region label meaning "available nationwide". Supplying it as an
/// area filter disables area filtering entirely.
pub const NATIONWIDE: &str = "全国";

/// Identifier wrapper for professional rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfessionalId(pub i64);

impl fmt::Display for ProfessionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Moderation lifecycle of a registration. `Pending` is the initial state;
/// the moderation engine moves records to `Approved` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfessionalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProfessionalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ProfessionalStatus::Pending => "pending",
            ProfessionalStatus::Approved => "approved",
            ProfessionalStatus::Rejected => "rejected",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// How a professional delivers their service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFormat {
    Online,
    Offline,
    Both,
}

impl ServiceFormat {
    pub const fn label(self) -> &'static str {
        match self {
            ServiceFormat::Online => "online",
            ServiceFormat::Offline => "offline",
            ServiceFormat::Both => "both",
        }
    }

    /// Lenient parse used at intake: absent or unrecognized input falls back
    /// to `Both` rather than failing the registration.
    pub fn from_input(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("online") => Self::Online,
            Some("offline") => Self::Offline,
            _ => Self::Both,
        }
    }
}

/// Raw registration payload as posted by the sign-up form. Numeric fields
/// arrive as free-form strings and are normalized at intake, never rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub activity_area: Option<String>,
    #[serde(default)]
    pub target_age_min: Option<String>,
    #[serde(default)]
    pub target_age_max: Option<String>,
    #[serde(default)]
    pub service_format: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub teaching_philosophy: Option<String>,
    /// Newline-delimited free text; one skill row per non-blank line.
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub hourly_rate_min: Option<String>,
    #[serde(default)]
    pub hourly_rate_max: Option<String>,
    #[serde(default)]
    pub price_note: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    /// Opaque attachment handle produced by the upload collaborator.
    #[serde(default)]
    pub profile_image_url: Option<String>,
    /// Category slugs; the first one becomes the primary category.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Validated, normalized registration ready for insertion. The store sets
/// `status=pending`, `is_published=false`, and `view_count=0` on insert.
#[derive(Debug, Clone)]
pub struct NewProfessional {
    pub email: String,
    /// bcrypt digest; plaintext never reaches the storage layer.
    pub password_hash: Option<String>,
    pub display_name: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub activity_area: String,
    pub target_age_min: i64,
    pub target_age_max: i64,
    pub service_format: ServiceFormat,
    pub bio: String,
    pub teaching_philosophy: Option<String>,
    pub hourly_rate_min: Option<i64>,
    pub hourly_rate_max: Option<i64>,
    pub price_note: Option<String>,
    pub profile_image_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub youtube_url: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Full stored record as returned by single-profile fetches. Carries the
/// denormalized category and skill names; the credential digest is never
/// part of any fetched view.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalProfile {
    pub id: ProfessionalId,
    pub email: String,
    pub display_name: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub activity_area: String,
    pub target_age_min: i64,
    pub target_age_max: i64,
    pub service_format: ServiceFormat,
    pub bio: String,
    pub teaching_philosophy: Option<String>,
    pub hourly_rate_min: Option<i64>,
    pub hourly_rate_max: Option<i64>,
    pub price_note: Option<String>,
    pub profile_image_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub youtube_url: Option<String>,
    pub website_url: Option<String>,
    pub status: ProfessionalStatus,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    /// Comma-joined category display names.
    pub categories: String,
    /// Comma-joined skill names.
    pub skills: String,
}

/// Listing row produced by `DirectoryStore::list_professionals`. A superset
/// of the public and admin views; the query engine projects it down so email
/// and status never leak into public responses.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub id: ProfessionalId,
    pub display_name: String,
    pub email: String,
    pub activity_area: String,
    pub target_age_min: i64,
    pub target_age_max: i64,
    pub service_format: ServiceFormat,
    pub bio: String,
    pub hourly_rate_min: Option<i64>,
    pub hourly_rate_max: Option<i64>,
    pub profile_image_url: Option<String>,
    pub status: ProfessionalStatus,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    /// Comma-joined category display names.
    pub categories: String,
}

/// Category master data. Seeded externally (migration), read-only to the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sort_order: i64,
    pub is_active: bool,
}

/// Slug-resolution result; just enough to build join rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub slug: String,
}

/// Public directory filter. All supplied filters combine with logical AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

impl DirectoryFilter {
    /// Collapse blank values and the nationwide sentinel into "no filter" so
    /// adapters only ever see effective predicates.
    pub fn normalized(self) -> Self {
        let scrub = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let area = scrub(self.area).filter(|area| area != NATIONWIDE);

        Self {
            category: scrub(self.category),
            area,
            keyword: scrub(self.keyword),
        }
    }
}
