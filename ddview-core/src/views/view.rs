use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::hints::{neighbor_hints, LocationHint};
use crate::layout::{PanelData, PanelState};
use crate::mutator::{chain, Mutator};
use crate::reactive::{Derived, Field, Watchable};

/// The persisted part of every view.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseViewSerialization {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub closable: bool,
    pub category: String,
    #[serde(
        rename = "layoutRecovery",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub layout_recovery: Option<PanelData>,
}

/// Views that should be shown together whenever possible.
///
/// Interacting with one of the `sources` reveals every target. Without
/// sources, each target is a source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewGroup {
    pub sources: Option<Vec<String>>,
    pub targets: Vec<String>,
}

impl ViewGroup {
    pub fn new<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            sources: None,
            targets: targets.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_sources<I, T>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// The ids whose focus reveals this group.
    pub fn sources(&self) -> &[String] {
        self.sources.as_deref().unwrap_or(&self.targets)
    }
}

struct ViewInner {
    id: String,
    name: Field<String>,
    can_close: Field<bool>,
    category: Field<String>,
    layout_recovery: Field<Option<PanelData>>,
    base_hints: RefCell<Vec<LocationHint>>,
    children: Field<Vec<ViewState>>,
    declared_groups: Field<Vec<ViewGroup>>,
    below: Derived<Vec<ViewState>>,
    groups: Derived<Vec<ViewGroup>>,
}

/// The state of a view that can be shown in a tab.
///
/// Views exist independently of the layout; a view is open while a tab with
/// its id is in the layout. Two `ViewState` handles are equal only if they
/// refer to the same view.
#[derive(Clone)]
pub struct ViewState {
    inner: Rc<ViewInner>,
}

impl ViewState {
    pub fn new(id: impl Into<String>) -> Self {
        let children = Field::new(Vec::<ViewState>::new());
        let declared_groups = Field::new(Vec::new());

        // Holds only strict descendants, so a view never caches itself.
        let source = children.clone();
        let below = Derived::new(move |watch, _| {
            let mut views = Vec::new();
            for child in watch.watch(&source) {
                let nested = watch.watch(&child.inner.below);
                views.push(child);
                views.extend(nested);
            }
            views
        });

        let (source, own) = (children.clone(), declared_groups.clone());
        let groups = Derived::new(move |watch, _| {
            let mut groups = watch.watch(&own);
            for child in watch.watch(&source) {
                groups.extend(watch.watch(&child.inner.groups));
            }
            groups
        });

        Self {
            inner: Rc::new(ViewInner {
                id: id.into(),
                name: Field::new(String::new()),
                can_close: Field::new(true),
                category: Field::new("default".to_string()),
                layout_recovery: Field::new(None),
                base_hints: RefCell::new(Vec::new()),
                children,
                declared_groups,
                below,
                groups,
            }),
        }
    }

    /// A view with a random id.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn name(&self) -> &Field<String> {
        &self.inner.name
    }

    /// Whether the user may close this view.
    pub fn can_close(&self) -> &Field<bool> {
        &self.inner.can_close
    }

    /// Views of a category are opened near each other.
    pub fn category(&self) -> &Field<String> {
        &self.inner.category
    }

    /// The layout from just before this view was last closed.
    pub fn layout_recovery(&self) -> &Field<Option<PanelData>> {
        &self.inner.layout_recovery
    }

    /// Views owned by this view. They are not shown nested in the layout,
    /// but a manager knows every descendant of a registered view. Children
    /// must form a tree.
    pub fn children(&self) -> &Field<Vec<ViewState>> {
        &self.inner.children
    }

    /// This view followed by the descendants of each child.
    pub fn descendants(&self) -> Derived<Vec<ViewState>> {
        let (view, below) = (self.clone(), self.inner.below.clone());
        Derived::new(move |watch, _| {
            let mut views = vec![view.clone()];
            views.extend(watch.watch(&below));
            views
        })
    }

    /// Every descendant except this view.
    pub(super) fn strict_descendants(&self) -> &Derived<Vec<ViewState>> {
        &self.inner.below
    }

    /// The groups this view itself declares.
    pub fn declared_groups(&self) -> &Field<Vec<ViewGroup>> {
        &self.inner.declared_groups
    }

    /// The declared groups of this view and of all its descendants.
    pub fn groups(&self) -> Derived<Vec<ViewGroup>> {
        self.inner.groups.clone()
    }

    /// Set the hints used when nothing better is known, such as
    /// [`main_location_hints`](super::main_location_hints).
    pub fn set_base_location_hints(&self, hints: Vec<LocationHint>) {
        *self.inner.base_hints.borrow_mut() = hints;
    }

    pub fn serialize(&self) -> BaseViewSerialization {
        BaseViewSerialization {
            id: self.inner.id.clone(),
            name: self.inner.name.get(),
            closable: self.inner.can_close.get(),
            category: self.inner.category.get(),
            layout_recovery: self.inner.layout_recovery.get(),
        }
    }

    /// Load persisted data into this view. The id is not changed.
    pub fn deserialize(&self, data: &BaseViewSerialization) -> Mutator {
        let view = self.clone();
        let data = data.clone();
        chain(move |tx| {
            tx.push(view.inner.name.set(data.name));
            tx.push(view.inner.can_close.set(data.closable));
            tx.push(view.inner.category.set(data.category));
            tx.push(view.inner.layout_recovery.set(data.layout_recovery));
        })
    }

    /// Called once the last tab of this view closed, with the layout from
    /// before it closed.
    pub fn on_close_ui(&self, _layout: &PanelState, data: &PanelData) -> Mutator {
        self.inner.layout_recovery.set(Some(data.clone()))
    }

    /// Where to open this view, in order of preference.
    ///
    /// Hints recovered from the layout this view was closed in come first,
    /// then the view's category, then `category_recovery` (hints from where
    /// the category was last closed), then the base hints.
    pub fn location_hints(&self, category_recovery: Option<Vec<LocationHint>>) -> Vec<LocationHint> {
        let mut hints = Vec::new();
        if let Some(recovery) = self.inner.layout_recovery.get() {
            hints.extend(neighbor_hints(&self.inner.id, &recovery));
        }
        hints.push(LocationHint::category(self.inner.category.get()));
        hints.extend(category_recovery.into_iter().flatten());
        hints.extend(self.inner.base_hints.borrow().iter().cloned());
        hints
    }
}

impl PartialEq for ViewState {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewState")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}
