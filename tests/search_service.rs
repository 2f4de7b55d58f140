mod common;

use lesgo_api::{
    dto::search::SearchMode,
    entity::{profiles::Role, tutor_profiles},
    geo::Coordinates,
    services::search_service::{SearchRequest, rank_by_distance, resolve},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use common::{account, active_tutor, harness};

/// A tutor `km` kilometers due north of `origin`.
fn tutor_north_of(origin: Coordinates, km: f64) -> tutor_profiles::Model {
    let mut tutor = active_tutor(Uuid::new_v4());
    tutor.latitude = Some(origin.lat + (km / 6371.0).to_degrees());
    tutor.longitude = Some(origin.lng);
    tutor
}

#[test]
fn radius_is_inclusive_and_sorted_by_distance() {
    let origin = Coordinates::new(-6.2, 106.8);
    let far = tutor_north_of(origin, 16.0);
    let edge = tutor_north_of(origin, 15.0);
    let near = tutor_north_of(origin, 1.0);
    let mut unplaced = active_tutor(Uuid::new_v4());
    unplaced.latitude = None;

    let ranked = rank_by_distance(
        vec![far.clone(), edge.clone(), unplaced, near.clone()],
        origin,
        15.0,
    );

    let ids: Vec<Uuid> = ranked.iter().map(|(t, _)| t.id).collect();
    assert_eq!(ids, vec![near.id, edge.id]);
    assert!((ranked[1].1 - 15.0).abs() < 1e-6);
}

#[test]
fn equal_distances_are_ordered_by_id() {
    let origin = Coordinates::new(-6.2, 106.8);
    let a = tutor_north_of(origin, 3.0);
    let mut b = a.clone();
    b.id = Uuid::new_v4();

    let ranked = rank_by_distance(vec![a.clone(), b.clone()], origin, 15.0);
    let mut expected = vec![a.id, b.id];
    expected.sort();
    let ids: Vec<Uuid> = ranked.iter().map(|(t, _)| t.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn village_results_take_precedence() {
    let tutor = active_tutor(Uuid::new_v4());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tutor.clone()]])
        .append_query_results([vec![account(tutor.user_id, "Sari Wulandari", Role::Tutor)]])
        .into_connection();
    let h = harness(db);

    let result = resolve(
        &h.state,
        SearchRequest::Manual {
            subject: "Matematika".into(),
            village_id: "31.71.01.1001".into(),
            district_id: Some("31.71.01".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(result.mode, SearchMode::Village);
    assert!(!result.expanded);
    assert!(!result.used_gps);
    assert_eq!(result.tutors.len(), 1);
    assert_eq!(result.tutors[0].full_name, "Sari Wulandari");
    assert!(!result.tutors[0].expanded_search);
    assert_eq!(result.tutors[0].distance_km, None);
}

#[tokio::test]
async fn empty_village_falls_back_to_district() {
    let mut tutor = active_tutor(Uuid::new_v4());
    tutor.village_id = Some("31.71.01.1002".into());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tutor_profiles::Model>::new()])
        .append_query_results([vec![tutor.clone()]])
        .append_query_results([vec![account(tutor.user_id, "Budi Santoso", Role::Tutor)]])
        .into_connection();
    let h = harness(db);

    let result = resolve(
        &h.state,
        SearchRequest::Manual {
            subject: "Matematika".into(),
            village_id: "31.71.01.1001".into(),
            district_id: Some("31.71.01".into()),
        },
    )
    .await
    .unwrap();

    assert_eq!(result.mode, SearchMode::District);
    assert!(result.expanded);
    assert_eq!(result.tutors.len(), 1);
    assert!(result.tutors[0].expanded_search);
    assert_eq!(result.tutors[0].village_id.as_deref(), Some("31.71.01.1002"));
}

#[tokio::test]
async fn no_tutors_anywhere_is_an_empty_list() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tutor_profiles::Model>::new()])
        .append_query_results([Vec::<tutor_profiles::Model>::new()])
        .into_connection();
    let h = harness(db);

    let result = resolve(
        &h.state,
        SearchRequest::Manual {
            subject: "Kimia".into(),
            village_id: "31.71.01.1001".into(),
            district_id: Some("31.71.01".into()),
        },
    )
    .await
    .unwrap();

    assert!(result.tutors.is_empty());
}

#[tokio::test]
async fn village_without_district_does_not_expand() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<tutor_profiles::Model>::new()])
        .into_connection();
    let h = harness(db);

    let result = resolve(
        &h.state,
        SearchRequest::Manual {
            subject: "Kimia".into(),
            village_id: "31.71.01.1001".into(),
            district_id: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(result.mode, SearchMode::Village);
    assert!(!result.expanded);
    assert!(result.tutors.is_empty());
}

#[tokio::test]
async fn gps_search_filters_and_reports_distance() {
    let origin = Coordinates::new(-6.2, 106.8);
    let near = tutor_north_of(origin, 2.0);
    let far = tutor_north_of(origin, 40.0);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![far, near.clone()]])
        .append_query_results([vec![account(near.user_id, "Sari Wulandari", Role::Tutor)]])
        .into_connection();
    let h = harness(db);

    let result = resolve(
        &h.state,
        SearchRequest::Gps {
            subject: "Matematika".into(),
            origin,
            max_distance_km: 15.0,
        },
    )
    .await
    .unwrap();

    assert_eq!(result.mode, SearchMode::Gps);
    assert!(result.used_gps);
    assert_eq!(result.max_distance_km, Some(15.0));
    assert_eq!(result.tutors.len(), 1);
    assert_eq!(result.tutors[0].user_id, near.user_id);
    let distance = result.tutors[0].distance_km.unwrap();
    assert!((distance - 2.0).abs() < 1e-6);
}
