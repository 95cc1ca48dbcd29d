use chrono::Utc;

use super::domain::{NewProfessional, RegistrationForm, ServiceFormat};
use super::resolver;
use super::DirectoryError;

/// Default audience bounds applied when the form leaves the ages blank.
const DEFAULT_AGE_MIN: i64 = 0;
const DEFAULT_AGE_MAX: i64 = 18;

/// Registration that passed intake: normalized fields ready for insertion,
/// plus the plaintext credential (hashed by the registration engine before it
/// goes anywhere near a store) and the category/skill side inputs.
#[derive(Debug, Clone)]
pub struct ScreenedRegistration {
    pub professional: NewProfessional,
    pub password: Option<String>,
    pub category_slugs: Vec<String>,
    pub skills: Vec<String>,
}

/// Validate and normalize a raw registration form.
///
/// Required fields missing or blank fail with the full list of offenders so
/// the caller can fix the form in one round trip. Numeric fields are parsed
/// leniently: unparseable input falls back to defaults (ages) or `None`
/// (rates) instead of erroring.
pub fn screen(form: RegistrationForm) -> Result<ScreenedRegistration, DirectoryError> {
    let email = required(form.email.as_deref());
    let display_name = required(form.display_name.as_deref());
    let bio = required(form.bio.as_deref());
    let activity_area = required(form.activity_area.as_deref());

    let mut missing = Vec::new();
    if email.is_none() {
        missing.push("email");
    }
    if display_name.is_none() {
        missing.push("display_name");
    }
    if bio.is_none() {
        missing.push("bio");
    }
    if activity_area.is_none() {
        missing.push("activity_area");
    }
    if !missing.is_empty() {
        return Err(DirectoryError::MissingFields(missing));
    }

    let target_age_min = parse_int(form.target_age_min.as_deref()).unwrap_or(DEFAULT_AGE_MIN);
    let target_age_max = parse_int(form.target_age_max.as_deref()).unwrap_or(DEFAULT_AGE_MAX);
    if target_age_min > target_age_max {
        return Err(DirectoryError::InvertedAgeRange {
            min: target_age_min,
            max: target_age_max,
        });
    }

    let skills = form
        .skills
        .as_deref()
        .map(resolver::split_skills)
        .unwrap_or_default();

    let category_slugs: Vec<String> = form
        .categories
        .iter()
        .map(|slug| slug.trim().to_string())
        .filter(|slug| !slug.is_empty())
        .collect();

    let professional = NewProfessional {
        // Checked above; unwraps cannot fire past the missing-field gate.
        email: email.unwrap_or_default(),
        password_hash: None,
        display_name: display_name.unwrap_or_default(),
        full_name: optional(form.full_name),
        phone: optional(form.phone),
        activity_area: activity_area.unwrap_or_default(),
        target_age_min,
        target_age_max,
        service_format: ServiceFormat::from_input(form.service_format.as_deref()),
        bio: bio.unwrap_or_default(),
        teaching_philosophy: optional(form.teaching_philosophy),
        hourly_rate_min: parse_int(form.hourly_rate_min.as_deref()),
        hourly_rate_max: parse_int(form.hourly_rate_max.as_deref()),
        price_note: optional(form.price_note),
        profile_image_url: optional(form.profile_image_url),
        instagram_url: optional(form.instagram_url),
        twitter_url: optional(form.twitter_url),
        facebook_url: optional(form.facebook_url),
        youtube_url: optional(form.youtube_url),
        website_url: optional(form.website_url),
        created_at: Utc::now(),
    };

    Ok(ScreenedRegistration {
        professional,
        password: optional(form.password),
        category_slugs,
        skills,
    })
}

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|raw| raw.trim().parse::<i64>().ok())
}
