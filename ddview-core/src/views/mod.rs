//! Views and their placement
//!
//! A view is a unit of UI content, such as a diagram or a settings page,
//! shown in a tab of the layout. The [`ViewManager`] keeps the registry of
//! views and decides where a view opens from its [`LocationHint`]s.
//!
//! When a view's tab closes, the layout from just before the close is kept
//! both on the view and per category. Reopening the view turns that layout
//! into [`neighbor_hints`], so the view comes back next to the panels and
//! tabs it was last seen with.
//!
//! Views form a tree through their children. Registering a view makes all of
//! its descendants known to the manager, and [`ViewGroup`]s declared anywhere
//! in that tree decide which views are revealed together on focus.

mod hints;
mod manager;
mod view;

pub use hints::{
    main_location_hints, neighbor_hints, sidebar_location_hints, LocationHint, TabIndexHint,
    TabPosition, TabTarget, TargetType,
};
pub use manager::{CategoryRecovery, CategoryRecoveryEntry, ViewGroups, ViewManager};
pub use view::{BaseViewSerialization, ViewGroup, ViewState};
