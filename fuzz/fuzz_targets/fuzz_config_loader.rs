#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = blastgate_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must map onto the runtime types without panicking.
            let _: blastgate_core::ControllerCfg = (&cfg.controller).into();
            let _: blastgate_core::StepperCfg = (&cfg.stepper).into();
            let _: blastgate_core::SwitchCfg = (&cfg.switches).into();
        }
    }
});
