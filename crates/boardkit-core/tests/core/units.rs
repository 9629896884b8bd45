use boardkit_core::units::{mil, mm};
use boardkit_core::{format_coord, parse_coord, MeasurementSystem};

#[test]
fn test_parse_matches_helpers() {
    assert_eq!(parse_coord("4mm"), Some(mm(4.0)));
    assert_eq!(parse_coord("10mil"), Some(mil(10.0)));
    assert_eq!(parse_coord("0.5in"), Some(mil(500.0)));
}

#[test]
fn test_format_round_trip_metric() {
    let text = format_coord(mm(2.25), MeasurementSystem::Metric);
    assert_eq!(text, "2.2500mm");
    assert_eq!(parse_coord(&text), Some(mm(2.25)));
}

#[test]
fn test_measurement_system_serde() {
    let json = serde_json::to_string(&MeasurementSystem::Imperial).unwrap();
    assert_eq!(json, "\"imperial\"");
}
