// FlowLink - Pulse flow telemetry over LoRa
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.


//! Debounced pulse counting
//!
//! [`PulseCounter::on_edge`] is the body of the sensor pin's interrupt
//! handler. [`PulseCounter::drain`] runs in the main loop once per sampling
//! tick. The tally and the last accepted edge time are the only state shared
//! between the two contexts; both live behind a `critical_section::Mutex`
//! and are touched nowhere else.

use core::cell::Cell;
use critical_section::Mutex;

/// Shared between the edge handler and the main loop
#[derive(Debug, Clone, Copy)]
struct EdgeState {
    count: u32,
    last_edge_ms: u32,
}

/// Result of draining the pulse tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseDrain {
    /// Edges accepted since the previous drain
    pub count: u32,
    /// Milliseconds between the last accepted edge and the drain
    pub since_last_edge_ms: u32,
}

/// Interrupt-safe debounced edge counter
pub struct PulseCounter {
    state: Mutex<Cell<EdgeState>>,
    debounce_floor_ms: u32,
}

impl core::fmt::Debug for PulseCounter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PulseCounter")
            .field("debounce_floor_ms", &self.debounce_floor_ms)
            .finish_non_exhaustive()
    }
}

impl PulseCounter {
    /// Create a counter whose last accepted edge is `start_ms`
    ///
    /// Seeding with the startup time keeps the first ticks after boot from
    /// reading as a stall against an uninitialised timestamp.
    pub fn new(start_ms: u32, debounce_floor_ms: u32) -> Self {
        Self {
            state: Mutex::new(Cell::new(EdgeState {
                count: 0,
                last_edge_ms: start_ms,
            })),
            debounce_floor_ms,
        }
    }

    /// Configured debounce floor in milliseconds
    pub fn debounce_floor_ms(&self) -> u32 {
        self.debounce_floor_ms
    }

    /// Record an edge seen at `now_ms`
    ///
    /// Returns false when the edge came too soon after the previous accepted
    /// one and was discarded as contact bounce.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            if now_ms.wrapping_sub(state.last_edge_ms) < self.debounce_floor_ms {
                return false;
            }
            state.count = state.count.wrapping_add(1);
            state.last_edge_ms = now_ms;
            cell.set(state);
            true
        })
    }

    /// Read and zero the tally
    ///
    /// The critical section covers the read and the clear only.
    pub fn drain(&self, now_ms: u32) -> PulseDrain {
        let (count, last_edge_ms) = critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let state = cell.get();
            cell.set(EdgeState { count: 0, ..state });
            (state.count, state.last_edge_ms)
        });

        PulseDrain {
            count,
            since_last_edge_ms: now_ms.wrapping_sub(last_edge_ms),
        }
    }
}
