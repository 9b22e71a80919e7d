//! Human-readable error descriptions and structured JSON error formatting.

use crate::run::UntrustedGates;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use blastgate_core::error::{BuildError, GateError, MoveFault};

    if let Some(u) = err.downcast_ref::<UntrustedGates>() {
        return format!(
            "What happened: Self-check failed; {u}.\nLikely causes: A limit switch is dead or miswired, or a gate is jammed.\nHow to fix: Check the closed-limit switch and carriage of each listed gate, then rerun self-check."
        );
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingMotor => {
                "What happened: No collector motor was provided to the controller.\nLikely causes: The relay failed to initialize or was not wired into the builder.\nHow to fix: Set collector.relay_pin in the config and check the relay wiring.".to_string()
            }
            BuildError::NoGates => {
                "What happened: The gate roster is empty.\nLikely causes: No [[gates]] in the config and no --roster CSV.\nHow to fix: Add at least one gate to the config or pass --roster.".to_string()
            }
            BuildError::DuplicateGateId(id) => format!(
                "What happened: Gate id {id} appears more than once.\nLikely causes: A copy-pasted [[gates]] entry or roster row.\nHow to fix: Give every gate a unique id."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun check-config."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GateError>() {
        return match ge {
            GateError::Timeout => "What happened: Hardware did not answer in time.\nLikely causes: Limit-switch bank or driver not powered, or wrong pins.\nHow to fix: Verify power and the [switches] and [[gates]] pin numbers.".to_string(),
            GateError::SwitchOutOfRange { id, width } => format!(
                "What happened: Limit switch {id} does not exist on the {width}-input bank.\nLikely causes: A gate's open_switch or closed_switch is too large.\nHow to fix: Use switch ids below {width} or raise switches.width."
            ),
            GateError::Move { gate, fault } => {
                let hint = match fault {
                    MoveFault::BothLimits => "Both limit switches read closed at once: check the switch wiring for shorts.",
                    MoveFault::StepCeiling | MoveFault::HomingFailed => "The carriage never reached its stop: check for jams, a loose coupling or a dead switch.",
                    MoveFault::Timeout => "The move was too slow: check the driver current or raise stepper.move_timeout_ms.",
                };
                format!(
                    "What happened: Gate {gate} move failed ({fault}).\nLikely causes: {hint}\nHow to fix: Fix the gate, then run self-check."
                )
            }
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("roster csv must have headers") {
        return "Invalid headers in roster CSV. Expected 'id,name,sensor_pin,open_switch,closed_switch'.".to_string();
    }

    if lower.contains("read config") || lower.contains("parse config") {
        let mut cause = String::new();
        if let Some(src) = err.source() {
            cause = format!(" Cause: {src}");
        }
        return format!(
            "What happened: The config file could not be loaded.{cause}\nLikely causes: Wrong --config path or a TOML syntax error.\nHow to fix: Check the path and the file, then rerun check-config."
        );
    }

    const CONFIG_HINTS: [&str; 7] = [
        "must be",
        "must differ",
        "must not be empty",
        "is required",
        "unreasonably large",
        "used by another gate",
        "duplicate gate id",
    ];
    if CONFIG_HINTS.iter().any(|h| lower.contains(h)) || lower.contains("outside the") {
        return format!(
            "What happened: Configuration is invalid ({msg}).\nLikely causes: Out-of-range or conflicting values in the TOML.\nHow to fix: Edit the config file, then rerun check-config."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 for a failed self-check, 4 for hardware faults,
/// 1 for everything else. Usage errors exit 2 via clap.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use blastgate_core::error::GateError;
    if err.downcast_ref::<UntrustedGates>().is_some() {
        return 3;
    }
    if let Some(ge) = err.downcast_ref::<GateError>() {
        return match ge {
            GateError::Config(_) | GateError::SwitchOutOfRange { .. } => 1,
            _ => 4,
        };
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    use blastgate_core::error::{BuildError, GateError};
    if err.downcast_ref::<UntrustedGates>().is_some() {
        "SelfCheck"
    } else if err.downcast_ref::<BuildError>().is_some() {
        "Build"
    } else if let Some(ge) = err.downcast_ref::<GateError>() {
        match ge {
            GateError::Timeout => "Timeout",
            GateError::Move { .. } => "Move",
            GateError::Config(_) | GateError::SwitchOutOfRange { .. } => "Config",
            _ => "Hardware",
        }
    } else {
        "Error"
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(u) = err.downcast_ref::<UntrustedGates>() {
        obj["details"] = json!({ "gates": u.0 });
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastgate_core::error::{BuildError, GateError, MoveFault};

    #[test]
    fn self_check_failure_has_its_own_exit_code() {
        let err = eyre::Report::new(UntrustedGates(vec!["0 (saw)".into()]));
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("0 (saw)"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "SelfCheck");
        assert_eq!(v["details"]["gates"][0], "0 (saw)");
    }

    #[test]
    fn move_faults_explain_the_stop() {
        let err = eyre::Report::new(GateError::Move {
            gate: 2,
            fault: MoveFault::BothLimits,
        });
        assert_eq!(exit_code_for_error(&err), 4);
        assert!(humanize(&err).contains("wiring"));
    }

    #[test]
    fn config_side_gate_errors_are_not_hardware_faults() {
        for ge in [
            GateError::Config("bad pin".into()),
            GateError::SwitchOutOfRange { id: 9, width: 8 },
        ] {
            let err = eyre::Report::new(ge);
            assert_eq!(exit_code_for_error(&err), 1);
            assert_eq!(reason_name(&err), "Config");
        }
        assert_eq!(exit_code_for_error(&eyre::Report::new(GateError::Timeout)), 4);
    }

    #[test]
    fn build_errors_are_generic_failures() {
        let err = eyre::Report::new(BuildError::DuplicateGateId(1));
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).contains("Gate id 1"));
    }
}
