//! Markers
//!
//! A [`Marker`] is a cheap, recyclable boolean tag. A host (e.g. a
//! [`DiGraph`](crate::core::graph::DiGraph)) grants at most [`MAX_MARKERS`]
//! of them at the same time, and every object it owns embeds a [`Marked`]
//! area with one stamp per marker index.
//!
//! A marker is `(index, value)`. An object is marked iff its stamp at `index`
//! equals `value`. Granting a marker bumps the generation of its index, so
//! all stamps left by previously freed markers become stale at once and
//! freeing is O(1). Only when the generation of an index is about to wrap,
//! the host sweeps its objects and scrubs the stamps of the indices that are
//! not in use.

use core::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;
use tracing::{debug, trace, warn};

/// Index of a marker in the stamp area.
pub type MarkerIndex = u8;

/// The generation value of a marker.
pub type MarkerValue = u16;

/// The maximum number of markers in use at the same time.
pub const MAX_MARKERS: usize = 15;

/// The stamp of an object that is not marked.
pub const MARKER_CLEAN: MarkerValue = 0;

/// The last generation value before a sweep is required.
pub const MARKER_LAST: MarkerValue = MarkerValue::MAX;

/// Errors of the marker manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// All marker indices are in use.
    #[error("all {} markers are in use", MAX_MARKERS)]
    OutOfIndexes,
}

static NEXT_OWNER: AtomicU32 = AtomicU32::new(0);

/// Generation bookkeeping shared by markers and numerations.
///
/// Every instance gets a process-unique owner id, which is recorded in the
/// handles it grants, so handles of another manager are never live here.
#[derive(Debug, Clone)]
pub(crate) struct Generations<const N: usize> {
    owner: u32,
    /// The last value granted per index.
    last: [u16; N],
    /// Whether the index is granted.
    live: [bool; N],
}

impl<const N: usize> Default for Generations<N> {
    fn default() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            last: [0; N],
            live: [false; N],
        }
    }
}

impl<const N: usize> Generations<N> {
    pub(crate) fn owner(&self) -> u32 { self.owner }

    /// The lowest index not in use.
    pub(crate) fn free_index(&self) -> Option<usize> { self.live.iter().position(|live| !live) }

    /// Check if the next grant of `index` would wrap the generation.
    pub(crate) fn exhausted(&self, index: usize) -> bool { self.last[index] == u16::MAX }

    pub(crate) fn grant(&mut self, index: usize) -> u16 {
        debug_assert!(!self.live[index]);
        debug_assert!(!self.exhausted(index));
        self.last[index] += 1;
        self.live[index] = true;
        self.last[index]
    }

    /// Release the handle `(index, value)`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not live.
    pub(crate) fn release(&mut self, owner: u32, index: usize, value: u16) {
        assert!(
            self.is_live(owner, index, value),
            "releasing a handle that is not in use: ({}, {})",
            index,
            value
        );
        self.live[index] = false;
    }

    pub(crate) fn is_live(&self, owner: u32, index: usize, value: u16) -> bool {
        owner == self.owner && index < N && self.live[index] && self.last[index] == value
    }

    pub(crate) fn in_use(&self, index: usize) -> bool { self.live[index] }

    pub(crate) fn num_live(&self) -> usize { self.live.iter().filter(|live| **live).count() }

    /// Restart the generations of all indices not in use.
    ///
    /// Only valid after the stamps of those indices are scrubbed in every
    /// object of the host.
    pub(crate) fn restart(&mut self) {
        for (last, live) in self.last.iter_mut().zip(self.live.iter()) {
            if !live {
                *last = 0;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn fast_forward(&mut self, index: usize, value: u16) { self.last[index] = value; }
}

/// A marker handle.
///
/// Markers are only created by [`MarkerHost::new_marker`] and must be given
/// back with [`MarkerHost::free_marker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker {
    owner: u32,
    index: MarkerIndex,
    value: MarkerValue,
}

impl Marker {
    /// The index of the marker.
    pub fn index(self) -> MarkerIndex { self.index }

    /// The generation value of the marker.
    pub fn value(self) -> MarkerValue { self.value }
}

/// The manager of marker handles, owned by a [`MarkerHost`].
#[derive(Debug, Clone, Default)]
pub struct MarkerManager {
    generations: Generations<MAX_MARKERS>,
}

impl MarkerManager {
    /// Create a manager with no marker in use.
    pub fn new() -> Self { Self::default() }

    /// Check if the marker is in use, i.e. granted by this manager and not
    /// freed yet.
    pub fn is_live(&self, marker: Marker) -> bool {
        self.generations
            .is_live(marker.owner, marker.index as usize, marker.value)
    }

    /// Number of markers in use.
    pub fn num_live(&self) -> usize { self.generations.num_live() }

    #[cfg(test)]
    pub(crate) fn generations_mut(&mut self) -> &mut Generations<MAX_MARKERS> {
        &mut self.generations
    }
}

/// The marker stamps of an object.
#[derive(Debug, Clone)]
pub struct Marked {
    stamps: [MarkerValue; MAX_MARKERS],
}

impl Default for Marked {
    fn default() -> Self {
        Self {
            stamps: [MARKER_CLEAN; MAX_MARKERS],
        }
    }
}

impl Marked {
    /// Set the marker.
    ///
    /// # Returns
    ///
    /// `true` if the object was not marked before.
    pub fn mark(&mut self, marker: Marker) -> bool {
        let stamp = &mut self.stamps[marker.index as usize];
        let newly = *stamp != marker.value;
        *stamp = marker.value;
        newly
    }

    /// Clear the marker.
    ///
    /// # Returns
    ///
    /// `true` if the object was marked before.
    pub fn unmark(&mut self, marker: Marker) -> bool {
        let stamp = &mut self.stamps[marker.index as usize];
        if *stamp == marker.value {
            *stamp = MARKER_CLEAN;
            true
        } else {
            false
        }
    }

    /// Check if the marker is set.
    pub fn is_marked(&self, marker: Marker) -> bool {
        self.stamps[marker.index as usize] == marker.value
    }

    /// Scrub the stamps of the indices that are not in use.
    pub fn clear_unused(&mut self, manager: &MarkerManager) {
        for (index, stamp) in self.stamps.iter_mut().enumerate() {
            if !manager.generations.in_use(index) {
                *stamp = MARKER_CLEAN;
            }
        }
    }
}

/// A container that hands out markers for the objects it owns.
pub trait MarkerHost {
    /// The marker manager of the host.
    fn marker_manager(&self) -> &MarkerManager;

    /// The marker manager of the host, mutably.
    fn marker_manager_mut(&mut self) -> &mut MarkerManager;

    /// Call [`Marked::clear_unused`] on every object of the host.
    fn clear_markers_in_objects(&mut self);

    /// Grant a new marker.
    ///
    /// No object of the host is marked by the new marker.
    ///
    /// # Returns
    ///
    /// - `Ok(Marker)`: The new marker.
    /// - `Err(MarkerError::OutOfIndexes)`: All markers are in use.
    fn new_marker(&mut self) -> Result<Marker, MarkerError> {
        let Some(index) = self.marker_manager().generations.free_index() else {
            warn!(max = MAX_MARKERS, "out of marker indices");
            return Err(MarkerError::OutOfIndexes);
        };
        if self.marker_manager().generations.exhausted(index) {
            debug!(index, "marker values exhausted, sweeping objects");
            self.clear_markers_in_objects();
            self.marker_manager_mut().generations.restart();
        }
        let generations = &mut self.marker_manager_mut().generations;
        let value = generations.grant(index);
        trace!(index, value, "new marker");
        Ok(Marker {
            owner: generations.owner(),
            index: index as MarkerIndex,
            value,
        })
    }

    /// Give a marker back to the host.
    ///
    /// # Panics
    ///
    /// Panics if the marker is not in use.
    fn free_marker(&mut self, marker: Marker) {
        trace!(index = marker.index, value = marker.value, "free marker");
        self.marker_manager_mut()
            .generations
            .release(marker.owner, marker.index as usize, marker.value);
    }
}
