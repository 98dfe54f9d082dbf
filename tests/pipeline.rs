//! End-to-end tests for the sensor pipeline
//!
//! Pulses in, frames out. The stress test at the bottom is ignored by
//! default; run with: cargo test --release -- --ignored

use approx::assert_relative_eq;
use flowlink::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

fn quick_config() -> NodeConfig {
    NodeConfig {
        link_init_retry: RetryStrategy::fixed(3, Duration::ZERO),
        ..Default::default()
    }
}

fn started_node<R: RadioLink>(radio: R, clock: &ManualClock) -> SenderNode<R, &ManualClock> {
    let mut node = SenderNode::new(quick_config(), RadioConfig::default(), radio, clock).unwrap();
    node.start().unwrap();
    node
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn test_fifteen_pulses_in_one_tick() {
    let config = NodeConfig::default();
    let mut sampler = FlowSampler::new(&config);

    let sample = sampler.sample(
        PulseDrain {
            count: 15,
            since_last_edge_ms: 0,
        },
        50,
    );
    assert_relative_eq!(sample.rate, 2400.0, epsilon = 1e-3);
    assert_relative_eq!(sampler.total_volume(), 2.0, epsilon = 1e-6);
}

#[test]
fn test_idle_epoch_statistics() {
    let mut window = StatisticsWindow::new(200);
    for t in [50, 100, 150] {
        window
            .push(FlowSample {
                rate: 0.0,
                captured_at_ms: t,
            })
            .unwrap();
    }

    let record = window.build_and_reset(1000).unwrap();
    assert_eq!(record.mean, 0.0);
    assert_eq!(record.stddev, 0.0);
    assert!(window.build_and_reset(2000).is_none());
}

#[test]
fn test_reference_frame_decodes() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1000u32.to_ne_bytes());
    bytes.extend_from_slice(&2.5f32.to_ne_bytes());
    bytes.extend_from_slice(&0.1f32.to_ne_bytes());

    let record = StatisticsRecord::decode(&bytes).unwrap();
    assert_eq!(record.timestamp, 1000);
    assert_relative_eq!(record.mean, 2.5);
    assert_relative_eq!(record.stddev, 0.1);

    assert_eq!(
        StatisticsRecord::decode(&bytes[..10]),
        Err(DecodeError::InvalidLength {
            expected: 12,
            actual: 10
        })
    );
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_stall_timeout_boundary() {
    let config = NodeConfig::default();
    let mut sampler = FlowSampler::new(&config);
    sampler.sample(
        PulseDrain {
            count: 3,
            since_last_edge_ms: 0,
        },
        50,
    );
    let held = sampler.rate();

    let at_timeout = sampler.sample(
        PulseDrain {
            count: 0,
            since_last_edge_ms: config.flow_timeout_ms,
        },
        100,
    );
    assert_eq!(at_timeout.rate, held);

    let past_timeout = sampler.sample(
        PulseDrain {
            count: 0,
            since_last_edge_ms: config.flow_timeout_ms + 1,
        },
        150,
    );
    assert_eq!(past_timeout.rate, 0.0);
}

#[test]
fn test_window_matches_population_formulas() {
    let mut rng = StdRng::seed_from_u64(11);
    let rates: Vec<f32> = (0..150).map(|_| rng.gen_range(0.0..50.0)).collect();

    let mut window = StatisticsWindow::new(200);
    for (i, &rate) in rates.iter().enumerate() {
        window
            .push(FlowSample {
                rate,
                captured_at_ms: i as u32 * 50,
            })
            .unwrap();
    }

    let n = rates.len() as f64;
    let mean = rates.iter().map(|&r| r as f64).sum::<f64>() / n;
    let variance = rates.iter().map(|&r| (r as f64 - mean).powi(2)).sum::<f64>() / n;

    let record = window.build_and_reset(7500).unwrap();
    assert_relative_eq!(record.mean as f64, mean, epsilon = 1e-3);
    assert_relative_eq!(record.stddev as f64, variance.sqrt(), epsilon = 1e-3);
}

#[test]
fn test_codec_preserves_timestamp_exactly() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..100 {
        let record = StatisticsRecord::new(rng.gen(), rng.gen_range(0.0..5000.0), rng.gen());
        let decoded = StatisticsRecord::decode(record.encode().as_ref()).unwrap();
        assert_eq!(decoded.timestamp, record.timestamp);
        assert_relative_eq!(decoded.mean, record.mean);
        assert_relative_eq!(decoded.stddev, record.stddev);
    }
}

// ============================================================================
// Sender node
// ============================================================================

#[test]
fn test_steady_flow_over_several_epochs() {
    let clock = ManualClock::new(0);
    let mut node = started_node(MemoryRadio::new(), &clock);
    let counter = node.pulse_counter();

    for tick in 1..=60u32 {
        let start = (tick - 1) * 50;
        counter.on_edge(start + 20);
        counter.on_edge(start + 40);
        clock.set(tick * 50);
        node.poll();
    }

    assert_eq!(node.stats().records_sent, 3);
    let mut timestamps = Vec::new();
    while let Some(bytes) = node.radio_mut().pop_outgoing() {
        let record = StatisticsRecord::decode(&bytes).unwrap();
        // 2 pulses per tick: 2 / 7.5 * 1200
        assert_relative_eq!(record.mean, 320.0, epsilon = 1e-3);
        assert_relative_eq!(record.stddev, 0.0, epsilon = 1e-3);
        timestamps.push(record.timestamp);
    }
    assert_eq!(timestamps, [1000, 2000, 3000]);
    // 120 pulses at 7.5 per unit
    assert_relative_eq!(node.total_volume(), 16.0, epsilon = 1e-4);
}

#[test]
fn test_flow_stops_and_rate_drops_to_zero() {
    let clock = ManualClock::new(0);
    let mut node = started_node(MemoryRadio::new(), &clock);
    let counter = node.pulse_counter();

    counter.on_edge(20);
    let mut last_rate = 0.0;
    for tick in 1..=80u32 {
        clock.set(tick * 50);
        if let Some(sample) = node.poll().sample {
            last_rate = sample.rate;
            if tick * 50 - 20 <= 3000 {
                assert!(sample.rate > 0.0, "rate dropped early at tick {}", tick);
            }
        }
    }
    assert_eq!(last_rate, 0.0);
}

#[test]
fn test_lossy_link_never_stops_the_node() {
    let clock = ManualClock::new(0);
    let mut node = started_node(LossyRadio::new(0.5), &clock);
    let counter = node.pulse_counter();

    for tick in 1..=200u32 {
        counter.on_edge((tick - 1) * 50 + 25);
        clock.set(tick * 50);
        node.poll();
    }

    let metrics = node.radio().metrics();
    assert_eq!(node.stats().records_sent, 10);
    assert_eq!(metrics.datagrams_sent, 10);
    assert_eq!(
        metrics.datagrams_lost + node.radio().inner().pending_outgoing() as u64,
        10
    );
}

#[test]
fn test_sender_to_receiver_over_the_air() {
    let clock = ManualClock::new(0);
    let mut pair = RadioPair::new();
    pair.receiver.begin(&RadioConfig::default()).unwrap();
    let mut node = started_node(std::mem::take(&mut pair.sender), &clock);
    let counter = node.pulse_counter();

    for tick in 1..=20u32 {
        counter.on_edge((tick - 1) * 50 + 30);
        clock.set(tick * 50);
        node.poll();
    }

    node.radio_mut().transfer_to(&mut pair.receiver, -71);
    let datagram = pair.receiver.receive().unwrap();
    assert_eq!(datagram.rssi, -71);
    let record = StatisticsRecord::decode(&datagram.payload).unwrap();
    assert_eq!(record.timestamp, 1000);
    assert_relative_eq!(record.mean, 160.0, epsilon = 1e-3);
}

// ============================================================================
// Stress
// ============================================================================

#[test]
#[ignore]
fn stress_test_epoch_pipeline() {
    let clock = ManualClock::new(0);
    let mut node = started_node(MemoryRadio::new(), &clock);
    let counter = node.pulse_counter();

    let ticks = 1_000_000u32;
    let start = Instant::now();
    for tick in 1..=ticks {
        counter.on_edge(tick.wrapping_mul(50).wrapping_sub(25));
        clock.set(tick.wrapping_mul(50));
        node.poll();
        node.radio_mut().pop_outgoing();
    }
    let elapsed = start.elapsed();
    let rate = ticks as f64 / elapsed.as_secs_f64();

    println!("Processed {} ticks in {:?}", ticks, elapsed);
    println!("Rate: {:.0} ticks/second", rate);

    assert_eq!(node.stats().records_sent, (ticks / 20) as u64);
    assert!(rate > 100_000.0, "Should process at least 100k ticks/s, got {:.0}", rate);
}
