use blastgate_hardware::SimBench;
use blastgate_hardware::error::HwError;
use blastgate_traits::{Direction, InputBank, StepperDriver};
use rstest::rstest;

fn bench_with_axis(travel: u32) -> (SimBench, usize) {
    let bench = SimBench::new(16).expect("bench");
    let axis = bench.add_axis(travel, 1, 0).expect("axis");
    (bench, axis)
}

#[rstest]
#[case(Direction::Open, 10, 0b01)]
#[case(Direction::Close, 0, 0b10)]
fn driving_to_a_stop_asserts_its_switch(
    #[case] dir: Direction,
    #[case] expected_pos: u32,
    #[case] expected_bits: u64,
) {
    let (bench, axis) = bench_with_axis(10);
    let mut drv = bench.driver(axis).unwrap();
    drv.enable().unwrap();
    drv.set_direction(dir).unwrap();
    for _ in 0..20 {
        drv.step().unwrap();
    }
    assert_eq!(bench.position(axis).unwrap(), expected_pos);
    let raw = bench.inputs().read_raw().unwrap();
    assert_eq!(raw & 0b11, expected_bits);
}

#[test]
fn jammed_axis_counts_pulses_without_moving() {
    let (bench, axis) = bench_with_axis(10);
    bench.set_jammed(axis, true).unwrap();
    let mut drv = bench.driver(axis).unwrap();
    drv.enable().unwrap();
    drv.set_direction(Direction::Open).unwrap();
    for _ in 0..3 {
        drv.step().unwrap();
    }
    assert_eq!(bench.pulses(axis).unwrap(), 3);
    assert_eq!(bench.position(axis).unwrap(), 5);
}

#[test]
fn dead_switch_never_asserts() {
    let (bench, axis) = bench_with_axis(10);
    bench.set_dead_switch(axis, Direction::Close, true).unwrap();
    bench.set_position(axis, 0).unwrap();
    let raw = bench.inputs().read_raw().unwrap();
    assert_eq!(raw & 0b11, 0b11);
}

#[test]
fn forced_low_and_width_mask() {
    let bench = SimBench::new(4).unwrap();
    bench.force_low(2, true).unwrap();
    let mut inputs = bench.inputs();
    assert_eq!(inputs.width(), 4);
    assert_eq!(inputs.read_raw().unwrap(), 0b1011);
    bench.force_low(2, false).unwrap();
    assert_eq!(inputs.read_raw().unwrap(), 0b1111);
}

#[test]
fn offline_bank_reports_timeout() {
    let (bench, _) = bench_with_axis(10);
    bench.set_bank_offline(true).unwrap();
    let err = bench.inputs().read_raw().expect_err("offline");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Timeout)));
}

#[test]
fn bank_wider_than_64_is_rejected() {
    assert!(matches!(SimBench::new(65), Err(HwError::BankTooWide(65))));
}
