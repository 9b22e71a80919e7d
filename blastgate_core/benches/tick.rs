use std::sync::Arc;

use blastgate_core::mocks::{RecordingActuator, RecordingMotor};
use blastgate_core::{Gate, GateController, Machine};
use blastgate_hardware::{SensorHandle, SimulatedSensor};
use blastgate_traits::{ManualClock, SensorState};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn shop(clock: &ManualClock) -> (GateController, Vec<SensorHandle>) {
    let mut tools = Vec::new();
    let gates: Vec<Gate> = ["saw", "drillpress", "lathe", "router"]
        .iter()
        .zip(0u8..)
        .map(|(name, id)| {
            let sensor = SimulatedSensor::new();
            tools.push(sensor.handle());
            Gate::new(
                id,
                *name,
                Box::new(RecordingActuator::new()),
                Machine::new(*name, Box::new(sensor)),
            )
        })
        .collect();
    let ctl = GateController::builder()
        .with_gates(gates)
        .with_motor(RecordingMotor::new())
        .with_clock(Arc::new(clock.clone()))
        .build()
        .expect("build");
    (ctl, tools)
}

pub fn bench_tick(c: &mut Criterion) {
    let mut g = c.benchmark_group("tick");
    // Quick runs without CLI flags:
    //   BENCH_SAMPLE_SIZE=10 cargo bench -p blastgate_core --bench tick
    match std::env::var("BENCH_SAMPLE_SIZE")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        Some(n) => g.sample_size(n.max(10)),
        None => g.sample_size(50),
    };

    g.bench_function("idle_4_gates", |b| {
        let clock = ManualClock::new();
        let (mut ctl, _tools) = shop(&clock);
        b.iter(|| black_box(ctl.tick().expect("tick")));
    });

    g.bench_function("toggle_4_gates", |b| {
        b.iter_batched(
            || {
                let clock = ManualClock::new();
                let (ctl, tools) = shop(&clock);
                (ctl, tools, clock)
            },
            |(mut ctl, tools, clock)| {
                for tool in &tools {
                    tool.set(SensorState::On);
                }
                ctl.tick().expect("tick");
                for tool in &tools {
                    tool.set(SensorState::Off);
                }
                for _ in 0..12 {
                    clock.advance(ctl.tick_period());
                    black_box(ctl.tick().expect("tick"));
                }
            },
            BatchSize::SmallInput,
        );
    });
    g.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
