use std::fs::File;
use std::io::Write;

use blastgate_config::{ActuatorKind, SensorKind, load_roster_csv};
use rstest::rstest;
use tempfile::tempdir;

fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("roster.csv");
    let mut f = File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[rstest]
fn loads_rows_as_gpio_stepper_gates() {
    let (_dir, path) = write_csv(
        "id,name,sensor_pin,open_switch,closed_switch\n0,saw,5,0,1\n1,drillpress,6,2,3\n",
    );
    let gates = load_roster_csv(&path).expect("load roster");
    assert_eq!(gates.len(), 2);
    assert_eq!(gates[1].name, "drillpress");
    assert_eq!(gates[1].sensor, SensorKind::Gpio);
    assert_eq!(gates[1].sensor_pin, Some(6));
    assert_eq!(gates[1].actuator, ActuatorKind::Stepper);
    assert_eq!((gates[1].open_switch, gates[1].closed_switch), (2, 3));
}

#[rstest]
#[case("id,name,pin,open_switch,closed_switch\n0,saw,5,0,1\n", "must have headers")]
#[case("name,id,sensor_pin,open_switch,closed_switch\n", "must have headers")]
#[case("id,name,sensor_pin,open_switch,closed_switch\n0,saw,five,0,1\n", "invalid CSV row 2")]
#[case("id,name,sensor_pin,open_switch,closed_switch\n", "has no gates")]
fn rejects_malformed_rosters(#[case] contents: &str, #[case] needle: &str) {
    let (_dir, path) = write_csv(contents);
    let err = load_roster_csv(&path).expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}");
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let err = load_roster_csv(&dir.path().join("nope.csv")).expect_err("missing");
    assert!(format!("{err}").contains("open roster CSV"));
}
