use std::sync::Arc;
use std::time::Duration;

use blastgate_core::mocks::ScriptedBank;
use blastgate_core::{DebouncedSwitches, GateError};
use blastgate_traits::{ManualClock, SwitchInput};
use rstest::rstest;

const WINDOW: Duration = Duration::from_millis(20);

fn bank(script: &[u64]) -> (DebouncedSwitches<ScriptedBank>, ManualClock) {
    let clock = ManualClock::new();
    let sw = DebouncedSwitches::new(
        ScriptedBank::new(8, script.to_vec()),
        Arc::new(clock.clone()),
        WINDOW,
    )
    .unwrap();
    (sw, clock)
}

#[test]
fn single_sample_glitch_is_rejected() {
    // Low for one sample, high again one window later.
    let (mut sw, clock) = bank(&[0xFE, 0xFF, 0xFF]);
    assert!(!sw.read_switch(0).unwrap());
    assert_eq!(clock.elapsed(), WINDOW);
    assert!(!sw.read_switch(0).unwrap());
    assert_eq!(sw.stable(), 0xFF);
}

#[test]
fn sustained_change_is_accepted_once() {
    let (mut sw, clock) = bank(&[0xFE, 0xFE, 0xFE, 0xFE]);
    assert!(sw.read_switch(0).unwrap());
    assert_eq!(clock.elapsed(), WINDOW);
    // Already stable: no further wait.
    assert!(sw.read_switch(0).unwrap());
    assert_eq!(clock.elapsed(), WINDOW);
}

#[test]
fn release_is_debounced_too() {
    let (mut sw, _) = bank(&[0xFE, 0xFE, 0xFF, 0xFE, 0xFF, 0xFF]);
    assert!(sw.read_switch(0).unwrap());
    // Bounce on release: stays asserted.
    assert!(sw.read_switch(0).unwrap());
    assert!(!sw.read_switch(0).unwrap());
}

#[test]
fn bits_above_width_are_masked() {
    let clock = ManualClock::new();
    let mut sw = DebouncedSwitches::new(
        ScriptedBank::new(4, vec![u64::MAX & !0b0100]),
        Arc::new(clock),
        WINDOW,
    )
    .unwrap();
    assert_eq!(sw.poll().unwrap(), 0b1011);
    assert!(sw.is_asserted(2).unwrap());
}

#[rstest]
#[case(8)]
#[case(9)]
#[case(63)]
fn out_of_range_switch_is_an_error(#[case] id: u8) {
    let (mut sw, _) = bank(&[0xFF]);
    let err = sw.read_switch(id).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GateError>(),
        Some(GateError::SwitchOutOfRange { width: 8, .. })
    ));
    assert!(sw.is_asserted(id).is_err());
}

#[rstest]
#[case(0)]
#[case(65)]
fn unusable_bank_width_is_rejected(#[case] width: u8) {
    let res = DebouncedSwitches::new(
        ScriptedBank::new(width, vec![0]),
        Arc::new(ManualClock::new()),
        WINDOW,
    );
    assert!(res.is_err());
}
