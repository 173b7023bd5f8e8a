//! ddview Core
//!
//! State management for the decision-diagram viewer. It provides:
//!
//! - Reactive primitives (fields, derived values, observers)
//! - Mutators: deferred, transactional state changes
//! - A panel layout engine with tabs, splits and drag state
//! - View management with location hints and layout recovery
//! - Profiles persisted as JSON
//!
//! Rendering itself is left to an external renderer behind the traits of
//! [`render`].
//!
//! # Architecture
//!
//! - `reactive`: watchable values and dependency tracking
//! - `mutator`: two-phase (perform, then signal) state changes
//! - `layout`: the panel tree and [`LayoutState`]
//! - `views`: [`ViewState`], [`ViewManager`] and location hints
//! - `profile`: [`ConfigurationState`] and storage
//! - `render`: the diagram rendering seam
//!
//! Everything is single threaded. Handles are `Rc` based and not `Send`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ddview_core::reactive::{Derived, PlainField, Watchable};
//!
//! let count = PlainField::new(2);
//! let doubled = {
//!     let count = count.clone();
//!     Derived::new(move |watch, _| watch.watch(&count) * 2)
//! };
//! assert_eq!(doubled.get(), 4);
//!
//! // Nothing changes until the mutator is committed.
//! let mut set = count.set(5);
//! assert_eq!(doubled.get(), 4);
//! set.commit();
//! assert_eq!(doubled.get(), 10);
//! ```

pub mod error;
pub mod layout;
pub mod mutator;
pub mod profile;
pub mod reactive;
pub mod render;
pub mod views;

pub use error::{MutatorError, ProfileError, ReactiveError};
pub use layout::{LayoutConfig, LayoutState, PanelData, PanelState};
pub use mutator::{all, chain, synchronized, Mutator};
pub use profile::{ConfigurationState, Profile};
pub use reactive::{Derived, Field, Observer, PlainField, Watchable};
pub use views::{LocationHint, ViewManager, ViewState};
