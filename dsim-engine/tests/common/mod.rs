// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::time::Duration;

use dsim_engine::network::{DelayModel, Endpoint, Network};

/// Bound on how long any single test system may run.
pub const WATCHDOG: Duration = Duration::from_secs(20);

/// Endpoints of a network without delays.
pub fn endpoints(size: usize) -> Vec<Endpoint> {
    Network::new(size, DelayModel::default())
        .unwrap()
        .into_endpoints()
}

/// Initial data where node `i` holds `[i]`.
pub fn ids_as_data(size: usize) -> Vec<Vec<f64>> {
    (0..size).map(|i| vec![i as f64]).collect()
}
