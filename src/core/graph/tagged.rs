//! Markers and numerations on graph entities.

use super::{DiGraph, EdgePtr, NodePtr};
use crate::core::marker::{Marked, Marker};
use crate::core::numeration::{GraphNum, NumError, Numbered, Numeration};

/// A handle of a graph entity that carries markers and numerations.
///
/// The handles are granted by the graph through
/// [`MarkerHost`](crate::core::marker::MarkerHost) and
/// [`NumHost`](crate::core::numeration::NumHost). Using a handle that is not
/// in use panics.
pub trait Tagged: Copy {
    /// The marker stamps of the entity.
    fn marked<N, E>(self, g: &DiGraph<N, E>) -> &Marked;

    /// The marker stamps of the entity, mutably.
    fn marked_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Marked;

    /// The numeration stamps of the entity.
    fn numbered<N, E>(self, g: &DiGraph<N, E>) -> &Numbered;

    /// The numeration stamps of the entity, mutably.
    fn numbered_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Numbered;

    /// Set the marker, returns `true` if the entity was not marked.
    fn mark<N, E>(self, g: &mut DiGraph<N, E>, marker: Marker) -> bool {
        check_marker(g, marker);
        self.marked_mut(g).mark(marker)
    }

    /// Clear the marker, returns `true` if the entity was marked.
    fn unmark<N, E>(self, g: &mut DiGraph<N, E>, marker: Marker) -> bool {
        check_marker(g, marker);
        self.marked_mut(g).unmark(marker)
    }

    /// Check if the marker is set.
    fn is_marked<N, E>(self, g: &DiGraph<N, E>, marker: Marker) -> bool {
        check_marker(g, marker);
        self.marked(g).is_marked(marker)
    }

    /// Set the number of the entity in a numeration.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The number is set.
    /// - `Err(NumError::NumberOutOfRange)`: The value is negative, too
    ///   large, or [`NUMBER_NO_NUM`](crate::core::numeration::NUMBER_NO_NUM).
    fn set_number<N, E, V>(
        self,
        g: &mut DiGraph<N, E>,
        num: Numeration,
        value: V,
    ) -> Result<(), NumError>
    where
        V: TryInto<GraphNum>,
    {
        check_num(g, num);
        self.numbered_mut(g).set_number(num, value)
    }

    /// The number of the entity, or
    /// [`NUMBER_NO_NUM`](crate::core::numeration::NUMBER_NO_NUM).
    fn number<N, E>(self, g: &DiGraph<N, E>, num: Numeration) -> GraphNum {
        check_num(g, num);
        self.numbered(g).number(num)
    }

    /// Remove the number, returns `true` if the entity was numbered.
    fn unnumber<N, E>(self, g: &mut DiGraph<N, E>, num: Numeration) -> bool {
        check_num(g, num);
        self.numbered_mut(g).unnumber(num)
    }

    /// Check if the entity is numbered.
    fn is_numbered<N, E>(self, g: &DiGraph<N, E>, num: Numeration) -> bool {
        check_num(g, num);
        self.numbered(g).is_numbered(num)
    }
}

fn check_marker<N, E>(g: &DiGraph<N, E>, marker: Marker) {
    assert!(
        g.markers().is_live(marker),
        "marker {:?} is not in use in graph {}",
        marker,
        g.id()
    );
}

fn check_num<N, E>(g: &DiGraph<N, E>, num: Numeration) {
    assert!(
        g.nums().is_live(num),
        "numeration {:?} is not in use in graph {}",
        num,
        g.id()
    );
}

impl Tagged for NodePtr {
    fn marked<N, E>(self, g: &DiGraph<N, E>) -> &Marked { &g.node_record(self).marked }

    fn marked_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Marked {
        &mut g.node_record_mut(self).marked
    }

    fn numbered<N, E>(self, g: &DiGraph<N, E>) -> &Numbered { &g.node_record(self).numbered }

    fn numbered_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Numbered {
        &mut g.node_record_mut(self).numbered
    }
}

impl Tagged for EdgePtr {
    fn marked<N, E>(self, g: &DiGraph<N, E>) -> &Marked { &g.edge_record(self).marked }

    fn marked_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Marked {
        &mut g.edge_record_mut(self).marked
    }

    fn numbered<N, E>(self, g: &DiGraph<N, E>) -> &Numbered { &g.edge_record(self).numbered }

    fn numbered_mut<N, E>(self, g: &mut DiGraph<N, E>) -> &mut Numbered {
        &mut g.edge_record_mut(self).numbered
    }
}
