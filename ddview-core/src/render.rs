//! The diagram rendering seam.
//!
//! Drawing diagrams is left to an external renderer. The core only decides
//! *which* part of a diagram is shown, through a [`Transform`], and treats
//! the renderer's own state as opaque bytes that it can store in a profile.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::layout::Point;
use crate::mutator::Mutator;
use crate::reactive::{Field, Observer, Watchable};

/// Identifies a node of a rendered diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// The viewport of a drawer: its size, and the part of the diagram it shows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub width: f64,
    pub height: f64,
    pub offset: Point,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            offset: Point { x: 0.0, y: 0.0 },
            scale: 1.0,
        }
    }
}

/// An axis-aligned area in diagram coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Draws one diagram into one render target.
pub trait DiagramDrawer {
    fn set_transform(&mut self, transform: Transform);

    /// The nodes that intersect `area`.
    fn visible_nodes(&self, area: Rect) -> Vec<NodeId>;
}

/// A diagram, as held by the external renderer.
pub trait DiagramBox {
    fn create_drawer(&self, target: &str) -> Box<dyn DiagramDrawer>;

    /// Opaque renderer state, for persistence.
    fn serialize_state(&self) -> Vec<u8>;

    fn deserialize_state(&self, state: &[u8]);
}

/// Connects a diagram drawer to a reactive transform.
///
/// Whenever the transform changes, it is pushed to the drawer.
pub struct VisualizationState {
    diagram: Rc<dyn DiagramBox>,
    drawer: Rc<RefCell<Box<dyn DiagramDrawer>>>,
    transform: Field<Transform>,
    _sync: Observer<Transform>,
}

impl VisualizationState {
    /// Create a drawer for `target` and give it the default transform.
    pub fn new(diagram: Rc<dyn DiagramBox>, target: &str) -> Self {
        let transform = Field::new(Transform::default());
        let mut drawer = diagram.create_drawer(target);
        drawer.set_transform(transform.get());
        let drawer = Rc::new(RefCell::new(drawer));

        let sink = Rc::clone(&drawer);
        let sync = Observer::new(transform.clone()).add(move |transform: &Transform, _| {
            trace!(scale = transform.scale, "pushing transform to drawer");
            sink.borrow_mut().set_transform(*transform);
        });

        Self {
            diagram,
            drawer,
            transform,
            _sync: sync,
        }
    }

    pub fn transform(&self) -> &Field<Transform> {
        &self.transform
    }

    pub fn set_transform(&self, transform: Transform) -> Mutator {
        self.transform.set(transform)
    }

    /// The nodes shown in the given part of the diagram.
    pub fn visible_nodes(&self, area: Rect) -> Vec<NodeId> {
        self.drawer.borrow().visible_nodes(area)
    }

    /// The nodes inside the current viewport.
    pub fn nodes_in_view(&self) -> Vec<NodeId> {
        let transform = self.transform.get();
        let scale = if transform.scale > 0.0 { transform.scale } else { 1.0 };
        self.visible_nodes(Rect {
            x: transform.offset.x,
            y: transform.offset.y,
            width: transform.width / scale,
            height: transform.height / scale,
        })
    }

    pub fn serialize_state(&self) -> Vec<u8> {
        self.diagram.serialize_state()
    }

    pub fn deserialize_state(&self, state: &[u8]) {
        self.diagram.deserialize_state(state)
    }
}

impl fmt::Debug for VisualizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualizationState")
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log {
        transforms: Vec<Transform>,
        state: Vec<u8>,
    }

    struct MockDrawer {
        log: Rc<RefCell<Log>>,
    }

    impl DiagramDrawer for MockDrawer {
        fn set_transform(&mut self, transform: Transform) {
            self.log.borrow_mut().transforms.push(transform);
        }

        fn visible_nodes(&self, area: Rect) -> Vec<NodeId> {
            // One node per unit of width, starting at the area's left edge.
            (0..area.width as u64).map(|i| NodeId(area.x as u64 + i)).collect()
        }
    }

    struct MockBox {
        log: Rc<RefCell<Log>>,
    }

    impl DiagramBox for MockBox {
        fn create_drawer(&self, _target: &str) -> Box<dyn DiagramDrawer> {
            Box::new(MockDrawer {
                log: Rc::clone(&self.log),
            })
        }

        fn serialize_state(&self) -> Vec<u8> {
            self.log.borrow().state.clone()
        }

        fn deserialize_state(&self, state: &[u8]) {
            self.log.borrow_mut().state = state.to_vec();
        }
    }

    fn setup() -> (VisualizationState, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let diagram = Rc::new(MockBox {
            log: Rc::clone(&log),
        });
        (VisualizationState::new(diagram, "canvas"), log)
    }

    #[test]
    fn transform_changes_reach_the_drawer() {
        let (vis, log) = setup();
        assert_eq!(log.borrow().transforms, vec![Transform::default()]);

        let zoomed = Transform {
            width: 4.0,
            height: 2.0,
            offset: Point { x: 10.0, y: 0.0 },
            scale: 2.0,
        };
        vis.set_transform(zoomed).commit();
        vis.set_transform(zoomed).commit();
        assert_eq!(log.borrow().transforms.len(), 2);
        assert_eq!(vis.nodes_in_view(), vec![NodeId(10), NodeId(11)]);
    }

    #[test]
    fn state_bytes_pass_through() {
        let (vis, _) = setup();
        vis.deserialize_state(&[1, 2, 3]);
        assert_eq!(vis.serialize_state(), vec![1, 2, 3]);
    }
}
