// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A logical process of the distributed system.
//!
//! A [`Node`] is handed to the program running on its thread. All
//! communication happens through the node: blocking sends and receives over
//! the network, and synchronisation on the system-wide barrier.
//!
//! Communication is logged at `Trace` level against the node's entity
//! (`top::system::node{i}`), so it can be enabled for a single node with a
//! filter such as `.*node3`.

use std::fmt;
use std::sync::Arc;

use dsim_track::entity::Entity;
use dsim_track::{create, create_id, enter, exit, trace};

use crate::barrier::Barrier;
use crate::block::{Block, Slot};
use crate::network::Endpoint;
use crate::packet::DataPacket;
use crate::types::{NodeId, SimError, SimResult};

pub struct Node {
    pub entity: Arc<Entity>,
    id: NodeId,
    data: Vec<f64>,
    slots: [Option<Block>; Slot::COUNT],
    endpoint: Endpoint,
    barrier: Arc<Barrier>,
}

impl Node {
    pub(crate) fn new(
        parent: &Arc<Entity>,
        endpoint: Endpoint,
        barrier: Arc<Barrier>,
        data: Vec<f64>,
    ) -> Self {
        let id = endpoint.id();
        let entity = Entity::indexed(parent, "node", id);
        Self {
            entity,
            id,
            data,
            slots: [None, None, None],
            endpoint,
            barrier,
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Total number of nodes in the system.
    #[must_use]
    pub fn size(&self) -> usize {
        self.endpoint.size()
    }

    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn set_data(&mut self, data: Vec<f64>) {
        self.data = data;
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> Option<&Block> {
        self.slots[slot.index()].as_ref()
    }

    pub fn set_slot(&mut self, slot: Slot, block: Block) {
        self.slots[slot.index()] = Some(block);
    }

    pub fn take_slot(&mut self, slot: Slot) -> Option<Block> {
        self.slots[slot.index()].take()
    }

    /// Send `data` to node `to`, blocking until it has been received.
    pub fn send(&self, to: NodeId, data: Vec<f64>) -> SimResult {
        if data.is_empty() {
            return Err(SimError::NullPayload(self.id));
        }
        if to == self.id {
            return Err(SimError::SelfCommunication(self.id));
        }

        let packet = DataPacket::new(create_id!(self.entity), self.id, to, data);
        create!(self.entity ; packet, packet.num_bytes(), 0);
        trace!(self.entity ; "send {} values to node{}", packet.len(), to);
        let packet_id = packet.id();
        self.endpoint.send(packet)?;
        exit!(self.entity ; packet_id);
        Ok(())
    }

    /// Send a copy of the local data to node `to`.
    pub fn send_data(&self, to: NodeId) -> SimResult {
        self.send(to, self.data.clone())
    }

    /// Re-send the payload of a received packet to node `to`.
    pub fn forward(&self, packet: &DataPacket, to: NodeId) -> SimResult {
        self.send(to, packet.payload().to_vec())
    }

    /// Receive the next packet from any node.
    pub fn receive(&mut self) -> SimResult<DataPacket> {
        trace!(self.entity ; "waiting for any node");
        let packet = self.endpoint.receive()?;
        self.track_arrival(&packet);
        Ok(packet)
    }

    /// Receive the next packet sent by node `from`.
    pub fn receive_from(&mut self, from: NodeId) -> SimResult<DataPacket> {
        trace!(self.entity ; "waiting for node{}", from);
        let packet = self.endpoint.receive_from(from)?;
        self.track_arrival(&packet);
        Ok(packet)
    }

    fn track_arrival(&self, packet: &DataPacket) {
        enter!(self.entity ; packet.id());
        trace!(self.entity ; "received {}", packet);
    }

    /// Receive from any node and replace the local data with the payload.
    ///
    /// Returns the id of the sender.
    pub fn receive_and_set(&mut self) -> SimResult<NodeId> {
        let packet = self.receive()?;
        let from = packet.from();
        self.data = packet.into_payload();
        Ok(from)
    }

    /// Receive from node `from` and replace the local data with the payload.
    pub fn receive_from_and_set(&mut self, from: NodeId) -> SimResult {
        let packet = self.receive_from(from)?;
        self.data = packet.into_payload();
        Ok(())
    }

    /// Wait until every node has reached the system-wide barrier.
    pub fn synchronize(&self) -> SimResult {
        trace!(self.entity ; "synchronize");
        self.barrier.wait(self.id)
    }

    /// Leave the system: peers blocked on this node fail instead of waiting
    /// forever.
    pub(crate) fn close(&mut self) {
        self.barrier.break_barrier();
        self.endpoint.close();
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.data.is_empty() {
            writeln!(f, "Node {} does not have any data.", self.id)
        } else {
            writeln!(f, "Node {} has data: {:?}", self.id, self.data)
        }
    }
}
