// FlowLink Gateway - LoRa receiver and collector forwarding
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Network association capability
//!
//! Joining the uplink network (Wi-Fi on the reference board) is a platform
//! service. The gateway only needs to ask whether it is associated, drop a
//! stale association and start a new join; [`NetworkAssociation`] is that
//! surface. The bounded polling around it lives here.

use crate::error::{GatewayError, Result};
use flowlink::recovery::{with_retry_counted, RetryStrategy};
use log::{debug, info, warn};
use std::cell::Cell;
use std::time::Duration;

/// Platform network association
pub trait NetworkAssociation {
    /// True while the uplink is usable
    fn is_associated(&self) -> bool;

    /// Tear down the current association
    fn disconnect(&mut self);

    /// Start joining; completion is observed through `is_associated`
    fn join(&mut self);
}

/// How an association check ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    /// It was up already
    Up,
    /// It was down and came back after this many status polls
    Restored { polls: u32 },
}

/// Make sure the uplink is usable, rejoining once if it is not
///
/// A rejoin drops the old association, waits `settle`, starts a join and
/// then polls under `strategy`. Running out of polls yields
/// [`GatewayError::AssociationLost`].
pub fn ensure_associated<N>(
    network: &mut N,
    settle: Duration,
    strategy: &RetryStrategy,
) -> Result<Association>
where
    N: NetworkAssociation + ?Sized,
{
    if network.is_associated() {
        return Ok(Association::Up);
    }

    warn!("Network not associated - attempting reconnection");
    network.disconnect();
    if !settle.is_zero() {
        std::thread::sleep(settle);
    }
    network.join();

    let polls = wait_for_association(&*network, strategy)?;
    info!("Network reassociated after {} poll(s)", polls);
    Ok(Association::Restored { polls })
}

/// Join at startup and wait for the association
pub fn join_network<N>(network: &mut N, strategy: &RetryStrategy) -> Result<u32>
where
    N: NetworkAssociation + ?Sized,
{
    if network.is_associated() {
        return Ok(0);
    }
    network.join();
    let polls = wait_for_association(&*network, strategy)?;
    info!("Network associated after {} poll(s)", polls);
    Ok(polls)
}

fn wait_for_association<N>(network: &N, strategy: &RetryStrategy) -> Result<u32>
where
    N: NetworkAssociation + ?Sized,
{
    with_retry_counted(strategy, || {
        if network.is_associated() {
            Ok(())
        } else {
            debug!("Still waiting for network association");
            Err(())
        }
    })
    .map(|done| done.attempts)
    .map_err(|_| {
        warn!(
            "Failed to associate after {} retries",
            strategy.max_retries()
        );
        GatewayError::AssociationLost {
            retries: strategy.max_retries(),
        }
    })
}

/// Scripted association for simulation and tests
#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    associated: Cell<bool>,
    /// Polls after a join until the association comes up; `None` = never
    up_after_polls: Option<u32>,
    pending_polls: Cell<Option<u32>>,
    polls: Cell<u32>,
    joins: u32,
    disconnects: u32,
}

impl SimulatedNetwork {
    /// Already associated; joins succeed on the first poll
    pub fn up() -> Self {
        Self {
            associated: Cell::new(true),
            up_after_polls: Some(1),
            ..Default::default()
        }
    }

    /// Down, and no join ever succeeds
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Down; a join completes on the `polls`-th status poll
    pub fn comes_up_after(polls: u32) -> Self {
        Self {
            up_after_polls: Some(polls.max(1)),
            ..Default::default()
        }
    }

    /// Lose the association, e.g. access point went away
    pub fn drop_association(&mut self) {
        self.associated.set(false);
        self.pending_polls.set(None);
    }

    /// Status polls observed so far
    pub fn polls(&self) -> u32 {
        self.polls.get()
    }

    pub fn joins(&self) -> u32 {
        self.joins
    }

    pub fn disconnects(&self) -> u32 {
        self.disconnects
    }
}

impl NetworkAssociation for SimulatedNetwork {
    fn is_associated(&self) -> bool {
        self.polls.set(self.polls.get() + 1);
        if let Some(remaining) = self.pending_polls.get() {
            if remaining <= 1 {
                self.associated.set(true);
                self.pending_polls.set(None);
            } else {
                self.pending_polls.set(Some(remaining - 1));
            }
        }
        self.associated.get()
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.associated.set(false);
        self.pending_polls.set(None);
    }

    fn join(&mut self) {
        self.joins += 1;
        self.pending_polls.set(self.up_after_polls);
    }
}
