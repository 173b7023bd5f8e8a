//! Panel Layout
//!
//! The layout is a tree of panels. Split panels divide their area between
//! weighted children; tabs panels are the leaves and hold tabs, each of which
//! references a view by id.
//!
//! # Structure
//!
//! - [`types`]: the live tree, its serializable form, and drag data.
//! - [`tree`]: pure rewrites of the tree (adding and removing panels, weight
//!   balancing, conversion between the two forms).
//! - [`LayoutState`]: the reactive owner of the current tree. All of its
//!   modifications are [`Mutator`](crate::mutator::Mutator)s.
//!
//! # Weights
//!
//! Sibling weights always sum to 100. Before adding or removing panels, the
//! weights reported by the presentation layer through each split's
//! [`SplitHandle`] are pulled into the tree, so a structural change
//! preserves the sizes the user dragged the panels to.

mod close;
mod config;
mod state;
pub mod tree;
pub mod types;

pub use config::LayoutConfig;
pub use state::LayoutState;
pub use types::{
    CloseListener, DragData, DropSide, PanelData, PanelSide, PanelState, Point, SplitChild,
    SplitChildData, SplitDirection, SplitHandle, SplitPanelState, TabElement, TabSpec, TabState,
    TabsPanelState,
};
