//! Per-mode route cache with generation-stamped writes.
//!
//! Every selection change bumps the generation and empties the cache.
//! A result may only be installed under the generation that was current
//! when its request was issued, so a response that arrives after the
//! selection moved on is dropped instead of overwriting fresher state.

use std::collections::HashMap;

use crate::domain::{RouteResult, Step, TransportMode};

/// Monotonic counter identifying one version of the selection.
pub type Generation = u64;

/// Cache of the last computed route per transport mode.
#[derive(Debug, Default)]
pub struct RouteCache {
    entries: HashMap<TransportMode, RouteResult>,
    generation: Generation,
}

impl RouteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation. Capture this before issuing a request.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn get(&self, mode: TransportMode) -> Option<&RouteResult> {
        self.entries.get(&mode)
    }

    pub fn contains(&self, mode: TransportMode) -> bool {
        self.entries.contains_key(&mode)
    }

    /// Install `result` for `mode` if `requested_at` is still current.
    ///
    /// Returns false, leaving the cache untouched, for stale writes.
    pub fn put(
        &mut self,
        mode: TransportMode,
        result: RouteResult,
        requested_at: Generation,
    ) -> bool {
        if requested_at != self.generation {
            return false;
        }
        self.entries.insert(mode, result);
        true
    }

    /// Drop every entry and advance the generation.
    pub fn invalidate_all(&mut self) -> Generation {
        self.entries.clear();
        self.generation += 1;
        self.generation
    }

    /// Attach steps to the cached route for `mode`, if one is present.
    pub fn attach_steps(&mut self, mode: TransportMode, steps: Vec<Step>) -> bool {
        match self.entries.get_mut(&mode) {
            Some(route) => {
                route.steps = Some(steps);
                true
            }
            None => false,
        }
    }

    /// Cached modes in display order.
    pub fn modes(&self) -> Vec<TransportMode> {
        TransportMode::ALL
            .into_iter()
            .filter(|m| self.entries.contains_key(m))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
