use super::common::*;

use crate::directory::domain::{DirectoryFilter, ProfessionalId, RegistrationForm, NATIONWIDE};
use crate::directory::storage::StoreError;
use crate::directory::DirectoryError;

fn filter(
    category: Option<&str>,
    area: Option<&str>,
    keyword: Option<&str>,
) -> DirectoryFilter {
    DirectoryFilter {
        category: category.map(str::to_string),
        area: area.map(str::to_string),
        keyword: keyword.map(str::to_string),
    }
}

#[tokio::test]
async fn public_listing_only_shows_approved_published() {
    let store = store();
    let approved = register(&store, piano_teacher_form()).await;
    register(&store, tutor_form()).await;
    moderation(store.clone()).approve(approved).await.expect("approve");

    let listed = query(store)
        .list_public(DirectoryFilter::default())
        .await
        .expect("listing");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, approved);
}

#[tokio::test]
async fn rejected_records_disappear_from_listing() {
    let store = store();
    let id = register(&store, piano_teacher_form()).await;
    let moderation = moderation(store.clone());
    moderation.approve(id).await.expect("approve");
    moderation.reject(id).await.expect("reject");

    let listed = query(store)
        .list_public(DirectoryFilter::default())
        .await
        .expect("listing");
    assert!(listed.is_empty());
}

#[tokio::test]
async fn category_filter_matches_by_slug() {
    let store = store();
    let moderation = moderation(store.clone());
    let pianist = register(&store, piano_teacher_form()).await;
    let tutor = register(&store, tutor_form()).await;
    moderation.approve(pianist).await.expect("approve");
    moderation.approve(tutor).await.expect("approve");

    let listed = query(store)
        .list_public(filter(Some("education"), None, None))
        .await
        .expect("listing");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, tutor);
}

#[tokio::test]
async fn area_filter_is_exact_match() {
    let store = store();
    let moderation = moderation(store.clone());
    let pianist = register(&store, piano_teacher_form()).await;
    let tutor = register(&store, tutor_form()).await;
    moderation.approve(pianist).await.expect("approve");
    moderation.approve(tutor).await.expect("approve");

    let listed = query(store.clone())
        .list_public(filter(None, Some("東京都"), None))
        .await
        .expect("listing");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, tutor);

    // The nationwide sentinel disables area filtering entirely.
    let nationwide = query(store)
        .list_public(filter(None, Some(NATIONWIDE), None))
        .await
        .expect("listing");
    assert_eq!(nationwide.len(), 2);
}

#[tokio::test]
async fn keyword_searches_name_bio_and_category_names() {
    let store = store();
    let moderation = moderation(store.clone());
    let pianist = register(&store, piano_teacher_form()).await;
    let tutor = register(&store, tutor_form()).await;
    moderation.approve(pianist).await.expect("approve");
    moderation.approve(tutor).await.expect("approve");
    let query = query(store);

    let by_bio = query
        .list_public(filter(None, None, Some("ピアノ講師")))
        .await
        .expect("listing");
    assert_eq!(by_bio.len(), 1);
    assert_eq!(by_bio[0].id, pianist);

    let by_category_name = query
        .list_public(filter(None, None, Some("学習")))
        .await
        .expect("listing");
    assert_eq!(by_category_name.len(), 1);
    assert_eq!(by_category_name[0].id, tutor);

    let no_match = query
        .list_public(filter(None, None, Some("存在しない")))
        .await
        .expect("listing");
    assert!(no_match.is_empty());
}

#[tokio::test]
async fn keyword_is_case_insensitive() {
    let store = store();
    let form = RegistrationForm {
        bio: Some("Piano lessons for beginners.".to_string()),
        ..piano_teacher_form()
    };
    let id = register(&store, form).await;
    moderation(store.clone()).approve(id).await.expect("approve");

    let listed = query(store)
        .list_public(filter(None, None, Some("PIANO")))
        .await
        .expect("listing");
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn keyword_wildcards_are_literal() {
    let store = store();
    let form = RegistrationForm {
        bio: Some("Fully booked lessons.".to_string()),
        ..piano_teacher_form()
    };
    let id = register(&store, form).await;
    moderation(store.clone()).approve(id).await.expect("approve");
    let query = query(store);

    let underscore = query
        .list_public(filter(None, None, Some("f_lly")))
        .await
        .expect("listing");
    assert!(underscore.is_empty());

    let percent = query
        .list_public(filter(None, None, Some("booked%lessons")))
        .await
        .expect("listing");
    assert!(percent.is_empty());
}

#[tokio::test]
async fn combined_filters_are_conjunctive() {
    let store = store();
    let moderation = moderation(store.clone());
    let pianist = register(&store, piano_teacher_form()).await;
    let tutor = register(&store, tutor_form()).await;
    moderation.approve(pianist).await.expect("approve");
    moderation.approve(tutor).await.expect("approve");

    let listed = query(store)
        .list_public(filter(Some("music"), Some("東京都"), None))
        .await
        .expect("listing");
    assert!(listed.is_empty(), "no record matches both predicates");
}

#[tokio::test]
async fn newest_registrations_list_first() {
    let store = store();
    let moderation = moderation(store.clone());
    let first = register(&store, piano_teacher_form()).await;
    let second = register(&store, tutor_form()).await;
    moderation.approve(first).await.expect("approve");
    moderation.approve(second).await.expect("approve");

    let listed = query(store)
        .list_public(DirectoryFilter::default())
        .await
        .expect("listing");
    assert_eq!(listed[0].id, second);
    assert_eq!(listed[1].id, first);
}

#[tokio::test]
async fn profile_fetch_bumps_view_count_afterwards() {
    let store = store();
    let id = register(&store, piano_teacher_form()).await;
    moderation(store.clone()).approve(id).await.expect("approve");
    let query = query(store);

    let first = query.get_public(id).await.expect("profile");
    assert_eq!(first.view_count, 0);

    let second = query.get_public(id).await.expect("profile");
    assert_eq!(second.view_count, 1);
}

#[tokio::test]
async fn pending_profile_is_not_publicly_fetchable() {
    let store = store();
    let id = register(&store, piano_teacher_form()).await;

    let result = query(store).get_public(id).await;
    assert!(matches!(
        result,
        Err(DirectoryError::Store(StoreError::NotFound))
    ));
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let store = store();
    let result = query(store).get_public(ProfessionalId(999)).await;
    assert!(matches!(
        result,
        Err(DirectoryError::Store(StoreError::NotFound))
    ));
}

#[tokio::test]
async fn admin_listing_spans_every_state() {
    let store = store();
    let moderation = moderation(store.clone());
    let approved = register(&store, piano_teacher_form()).await;
    let pending = register(&store, tutor_form()).await;
    moderation.approve(approved).await.expect("approve");

    let all = query(store).list_all_for_admin().await.expect("admin list");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, pending);
    assert_eq!(all[1].id, approved);
    assert!(all.iter().all(|row| !row.email.is_empty()));
}

#[tokio::test]
async fn categories_come_back_in_display_order() {
    let store = store();
    let categories = query(store).list_categories().await.expect("categories");

    assert_eq!(categories.len(), 7);
    assert_eq!(categories[0].slug, "music");
    assert_eq!(categories[6].slug, "business");
    assert!(categories.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
}
