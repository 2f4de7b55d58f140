use lesgo_api::geo::{Coordinates, haversine_km};

#[test]
fn same_point_is_zero_km() {
    assert_eq!(haversine_km(-6.2, 106.8, -6.2, 106.8), 0.0);
}

#[test]
fn distance_is_symmetric() {
    let monas = Coordinates::new(-6.1754, 106.8272);
    let bandung = Coordinates::new(-6.9175, 107.6191);
    let there = monas.distance_to(&bandung);
    let back = bandung.distance_to(&monas);
    assert!((there - back).abs() < 1e-9);
}

#[test]
fn jakarta_to_bandung_is_about_120_km() {
    let km = haversine_km(-6.1754, 106.8272, -6.9175, 107.6191);
    assert!((km - 120.0).abs() < 2.0, "got {km}");
}

#[test]
fn one_degree_of_latitude_is_about_111_km() {
    let km = haversine_km(0.0, 0.0, 1.0, 0.0);
    assert!((km - 111.19).abs() < 0.01, "got {km}");
}
