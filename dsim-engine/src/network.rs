// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The simulated, fully connected network.
//!
//! Every ordered pair of nodes `(from, to)` is joined by its own zero-capacity
//! channel, so a send only completes once the receiver has taken the packet.
//! Nothing is ever buffered in the network.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError, bounded};

use crate::config::Config;
use crate::packet::DataPacket;
use crate::types::{NodeId, SimError, SimResult};

/// Artificial cost of a transmission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DelayModel {
    /// Paid once per send.
    pub connection: Duration,

    /// Paid per value sent.
    pub per_unit: Duration,
}

impl DelayModel {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            connection: config.connection_delay(),
            per_unit: config.transmission_delay_per_unit(),
        }
    }

    /// Total delay for a payload of `len` values.
    #[must_use]
    pub fn delay_for(&self, len: usize) -> Duration {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.connection + self.per_unit.saturating_mul(len)
    }
}

/// Counters of the traffic that has crossed the network.
#[derive(Debug, Default)]
pub struct NetworkStats {
    messages: AtomicU64,
    values: AtomicU64,
}

impl NetworkStats {
    fn record(&self, len: usize) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        self.values.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Number of packets delivered.
    #[must_use]
    pub fn messages(&self) -> u64 {
        self.messages.load(Ordering::Relaxed)
    }

    /// Number of payload values delivered.
    #[must_use]
    pub fn values(&self) -> u64 {
        self.values.load(Ordering::Relaxed)
    }
}

/// Owns the endpoints of a network until they are handed out to nodes.
pub struct Network {
    endpoints: Vec<Endpoint>,
    stats: Arc<NetworkStats>,
}

impl Network {
    /// Build a fully connected network of `size` endpoints.
    pub fn new(size: usize, delays: DelayModel) -> SimResult<Self> {
        if size == 0 {
            return Err(SimError::Config("a network needs at least one node".to_string()));
        }

        let stats = Arc::new(NetworkStats::default());
        let mut endpoints: Vec<Endpoint> = (0..size)
            .map(|id| Endpoint {
                id,
                size,
                delays,
                outbound: (0..size).map(|_| None).collect(),
                inbound: (0..size).map(|_| None).collect(),
                stats: stats.clone(),
            })
            .collect();

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    continue;
                }
                let (tx, rx) = bounded(0);
                endpoints[from].outbound[to] = Some(tx);
                endpoints[to].inbound[from] = Some(rx);
            }
        }

        Ok(Self { endpoints, stats })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn stats(&self) -> Arc<NetworkStats> {
        self.stats.clone()
    }

    /// Hand out the endpoints, indexed by node id.
    #[must_use]
    pub fn into_endpoints(self) -> Vec<Endpoint> {
        self.endpoints
    }
}

/// The communication surface of one node.
pub struct Endpoint {
    id: NodeId,
    size: usize,
    delays: DelayModel,

    /// Indexed by destination.
    outbound: Vec<Option<Sender<DataPacket>>>,

    /// Indexed by source.
    inbound: Vec<Option<Receiver<DataPacket>>>,

    stats: Arc<NetworkStats>,
}

impl Endpoint {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Number of endpoints in the network, including this one.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_peer(&self, peer: NodeId) -> SimResult {
        if peer >= self.size {
            return Err(SimError::InvalidNode {
                id: peer,
                nodes: self.size,
            });
        }
        if peer == self.id {
            return Err(SimError::SelfCommunication(self.id));
        }
        Ok(())
    }

    fn disconnected(&self, peer: Option<NodeId>) -> SimError {
        SimError::Disconnected {
            node: self.id,
            peer,
        }
    }

    /// Deliver `packet` to its destination.
    ///
    /// Sleeps for the configured delay and then blocks until the destination
    /// takes the packet.
    pub fn send(&self, packet: DataPacket) -> SimResult {
        let to = packet.to();
        self.check_peer(to)?;
        let Some(tx) = &self.outbound[to] else {
            return Err(self.disconnected(Some(to)));
        };

        let len = packet.len();
        let delay = self.delays.delay_for(len);
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        tx.send(packet).map_err(|_| self.disconnected(Some(to)))?;
        self.stats.record(len);
        Ok(())
    }

    /// Receive the next packet from any node.
    ///
    /// A sender that is already waiting is preferred, lowest id first.
    /// Otherwise the first sender to arrive is taken.
    pub fn receive(&mut self) -> SimResult<DataPacket> {
        loop {
            for from in 0..self.size {
                let Some(rx) = &self.inbound[from] else {
                    continue;
                };
                match rx.try_recv() {
                    Ok(packet) => return Ok(packet),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => self.inbound[from] = None,
                }
            }

            let (from, outcome) = {
                let mut select = Select::new();
                let mut sources = Vec::with_capacity(self.size);
                for (from, rx) in self.inbound.iter().enumerate() {
                    if let Some(rx) = rx {
                        select.recv(rx);
                        sources.push((from, rx));
                    }
                }
                if sources.is_empty() {
                    return Err(self.disconnected(None));
                }

                let op = select.select();
                let (from, rx) = sources[op.index()];
                (from, op.recv(rx))
            };

            match outcome {
                Ok(packet) => return Ok(packet),
                Err(_) => self.inbound[from] = None,
            }
        }
    }

    /// Receive the next packet sent by `from`.
    pub fn receive_from(&mut self, from: NodeId) -> SimResult<DataPacket> {
        self.check_peer(from)?;
        let Some(rx) = &self.inbound[from] else {
            return Err(self.disconnected(Some(from)));
        };
        match rx.recv() {
            Ok(packet) => Ok(packet),
            Err(_) => {
                self.inbound[from] = None;
                Err(self.disconnected(Some(from)))
            }
        }
    }

    /// Drop all channels so that every peer waiting on this endpoint fails.
    pub fn close(&mut self) {
        self.outbound.iter_mut().for_each(|tx| *tx = None);
        self.inbound.iter_mut().for_each(|rx| *rx = None);
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outbound.iter().all(Option::is_none) && self.inbound.iter().all(Option::is_none)
    }
}
