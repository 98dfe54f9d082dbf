// FlowLink - Simple Flowmeter Example
//
// A sensor node on a simulated clock: a pulse train that ramps up, holds,
// stops, and the frames the node would put on the air.
//
// Run with: RUST_LOG=debug cargo run --example simple_flowmeter

use flowlink::{
    ManualClock, MemoryRadio, NodeConfig, RadioConfig, RetryStrategy, SenderNode,
    StatisticsRecord,
};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== FlowLink Simple Flowmeter ===\n");

    let config = NodeConfig {
        link_init_retry: RetryStrategy::fixed(5, Duration::ZERO),
        ..NodeConfig::default()
    };
    println!(
        "Tick {} ms, epoch {} ms, {} pulses per unit\n",
        config.tick_interval_ms, config.epoch_ms, config.calibration_factor
    );

    let clock = ManualClock::new(0);
    // The first two init attempts fail, as a cold radio often does
    let radio = MemoryRadio::with_failing_begins(2);
    let mut node = SenderNode::new(config, RadioConfig::default(), radio, &clock)?;
    let attempts = node.start()?;
    println!("Radio up after {} attempt(s)", attempts);

    // The interrupt handler would hold this handle
    let pulses = node.pulse_counter();

    // Edge spacing per second of simulated time; 0 means no flow
    let profile_ms = [0u32, 40, 25, 12, 12, 12, 0, 0, 0, 0, 20];

    let mut now = 0u32;
    let mut next_edge = 0u32;
    for (second, &spacing) in profile_ms.iter().enumerate() {
        let second_end = (second as u32 + 1) * 1000;
        while now < second_end {
            now += 1;
            if spacing > 0 && now >= next_edge {
                pulses.on_edge(now);
                // Contact bounce, rejected by the debounce floor
                pulses.on_edge(now + 1);
                next_edge = now + spacing;
            }
            clock.set(now);
            node.poll();
        }

        while let Some(bytes) = node.radio_mut().pop_outgoing() {
            let record = StatisticsRecord::decode(&bytes)?;
            println!("  t={:>5} ms  frame {:02X?}  -> {}", now, bytes, record);
        }
    }

    println!("\n--- Summary ---");
    println!("Stats:        {:?}", node.stats());
    println!("Total volume: {:.3} units", node.total_volume());

    Ok(())
}
