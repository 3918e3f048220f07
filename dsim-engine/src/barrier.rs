// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! A reusable, breakable barrier shared by all nodes of a system.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::types::{NodeId, SimError, SimResult};

struct BarrierState {
    /// Parties waiting in the current generation.
    count: usize,

    /// Incremented each time the barrier trips.
    generation: u64,

    broken: bool,
}

/// Blocks callers until `parties` of them have arrived, then releases them all
/// and resets for the next cycle.
///
/// Once broken (by a party leaving for good) every current and future waiter
/// fails with [`SimError::BarrierBroken`]. Waiters released by a trip that
/// happened before the break still succeed.
pub struct Barrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl Barrier {
    #[must_use]
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BarrierState {
                count: 0,
                generation: 0,
                broken: false,
            }),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for all parties. `node` is only used to label the error.
    pub fn wait(&self, node: NodeId) -> SimResult {
        let mut state = self.lock();
        if state.broken {
            return Err(SimError::BarrierBroken(node));
        }

        state.count += 1;
        if state.count == self.parties {
            state.count = 0;
            state.generation += 1;
            self.cvar.notify_all();
            return Ok(());
        }

        let arrived_in = state.generation;
        while state.generation == arrived_in && !state.broken {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.generation != arrived_in {
            Ok(())
        } else {
            Err(SimError::BarrierBroken(node))
        }
    }

    /// Release every waiter with an error and fail all future waits.
    pub fn break_barrier(&self) {
        let mut state = self.lock();
        state.broken = true;
        self.cvar.notify_all();
    }

    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.lock().broken
    }
}
