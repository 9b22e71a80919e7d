use blastgate_config::{ActuatorKind, Config, SensorKind, load_roster_csv, load_toml};

const SAMPLE: &str = include_str!("../../etc/blastgate.toml");

#[test]
fn shipped_sample_is_valid_and_matches_defaults() {
    let cfg = load_toml(SAMPLE).expect("sample parses");
    cfg.validate().expect("sample validates");

    let defaults = Config::default();
    assert_eq!(cfg.controller.tick_ms, defaults.controller.tick_ms);
    assert_eq!(cfg.controller.grace_ms, defaults.controller.grace_ms);
    assert_eq!(cfg.stepper.steps_per_action, defaults.stepper.steps_per_action);
    assert_eq!(cfg.simulation.travel_steps, defaults.simulation.travel_steps);

    let names: Vec<&str> = cfg.gates.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["saw", "drillpress", "lathe", "router"]);
    for (g, d) in cfg.gates.iter().zip(&defaults.gates) {
        assert_eq!((g.open_switch, g.closed_switch), (d.open_switch, d.closed_switch));
        assert_eq!(g.sensor, SensorKind::Sim);
        assert_eq!(g.actuator, ActuatorKind::Stepper);
    }
}

#[test]
fn shipped_roster_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../etc/roster.csv");
    let gates = load_roster_csv(&path).expect("roster loads");
    assert_eq!(gates.len(), 4);
    assert_eq!(gates[2].sensor_pin, Some(16));
}
