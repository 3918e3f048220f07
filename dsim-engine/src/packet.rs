// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! The message envelope passed between nodes.

use std::fmt;

use dsim_track::Id;

use crate::types::NodeId;

/// A payload travelling from one node to another.
///
/// A packet is created by a send and consumed by exactly one receive.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPacket {
    id: Id,
    from: NodeId,
    to: NodeId,
    payload: Vec<f64>,
}

impl DataPacket {
    #[must_use]
    pub fn new(id: Id, from: NodeId, to: NodeId, payload: Vec<f64>) -> Self {
        Self {
            id,
            from,
            to,
            payload,
        }
    }

    /// Tracking ID allocated when the packet was created.
    #[must_use]
    pub fn id(&self) -> Id {
        self.id
    }

    #[must_use]
    pub fn from(&self) -> NodeId {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> NodeId {
        self.to
    }

    #[must_use]
    pub fn payload(&self) -> &[f64] {
        &self.payload
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Number of bytes carried by the payload.
    #[must_use]
    pub fn num_bytes(&self) -> usize {
        self.payload.len() * size_of::<f64>()
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<f64> {
        self.payload
    }
}

impl fmt::Display for DataPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DataPacket{{from: {}, to: {}, data: {:?}}}",
            self.from, self.to, self.payload
        )
    }
}
