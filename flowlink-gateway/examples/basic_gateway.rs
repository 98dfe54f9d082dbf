// FlowLink Gateway - Basic Example
//
// A simulated flowmeter and gateway sharing an in-memory radio. The
// collector is a local stand-in that prints what it receives; set
// FLOWLINK_COLLECTOR to an http(s) URL to post to a real one instead.
//
// Run with: RUST_LOG=info cargo run --example basic_gateway

use flowlink::{ManualClock, NodeConfig, RadioConfig, RadioPair, RetryStrategy, SenderNode};
use flowlink_gateway::{
    CollectorResponse, CollectorTransport, DeliveryFailure, ForwardingClient, GatewayConfig,
    HttpTransport, ReceiverNode, SimulatedNetwork,
};
use std::time::Duration;

/// Prints each payload and answers 200
struct ConsoleCollector;

impl CollectorTransport for ConsoleCollector {
    fn post_json(&self, body: &str) -> Result<CollectorResponse, DeliveryFailure> {
        println!("  collector <- {}", body);
        Ok(CollectorResponse::new(200, "{\"status\":\"success\"}"))
    }
}

/// Either the console stand-in or a real HTTP collector
enum Collector {
    Console(ConsoleCollector),
    Http(HttpTransport),
}

impl CollectorTransport for Collector {
    fn post_json(&self, body: &str) -> Result<CollectorResponse, DeliveryFailure> {
        match self {
            Collector::Console(c) => c.post_json(body),
            Collector::Http(c) => c.post_json(body),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== FlowLink Gateway Basic Example ===\n");

    let clock = ManualClock::new(0);
    let mut air = RadioPair::new();

    let node_config = NodeConfig {
        link_init_retry: RetryStrategy::fixed(3, Duration::ZERO),
        ..Default::default()
    };
    let mut sender = SenderNode::new(
        node_config,
        RadioConfig::default(),
        std::mem::take(&mut air.sender),
        &clock,
    )?;
    sender.start()?;
    let pulses = sender.pulse_counter();

    let (gateway_config, collector) = match std::env::var("FLOWLINK_COLLECTOR") {
        Ok(url) => {
            let config = GatewayConfig::with_collector(url);
            config.validate()?;
            let transport = HttpTransport::new(&config);
            (config, Collector::Http(transport))
        }
        Err(_) => (
            GatewayConfig::without_delays("http://localhost/collector"),
            Collector::Console(ConsoleCollector),
        ),
    };
    println!("Forwarding to {}\n", gateway_config.collector_url);

    let forwarder = ForwardingClient::with_transport(
        gateway_config,
        SimulatedNetwork::comes_up_after(2),
        collector,
    );
    let mut gateway = ReceiverNode::new(std::mem::take(&mut air.receiver), forwarder);
    gateway.start()?;

    // Five seconds of flow that speeds up, pauses, then resumes
    let pulses_per_tick = |t: u32| match t {
        0..=999 => 1,
        1000..=1999 => 3,
        2000..=3999 => 0,
        _ => 2,
    };

    for tick in 1..=100u32 {
        let tick_start = (tick - 1) * 50;
        for i in 0..pulses_per_tick(tick_start) {
            pulses.on_edge(tick_start + 10 + i * 12);
        }
        clock.set(tick * 50);

        let report = sender.poll();
        if report.epoch.is_some() {
            sender.radio_mut().transfer_to(gateway.radio_mut(), -60 - tick as i16 / 10);
            for received in gateway.drain() {
                println!(
                    "  gateway: {} bytes, RSSI {} -> {:?}",
                    received.length, received.rssi, received.disposition
                );
            }
        }
    }

    // A stray datagram that is not a frame
    gateway.radio_mut().push_incoming(b"hello".to_vec(), -95);
    gateway.drain();

    println!("\n--- Summary ---");
    println!("Sender:  {:?}", sender.stats());
    println!("Volume:  {:.3} units", sender.total_volume());
    println!("Gateway: {:?}", gateway.stats());

    Ok(())
}
