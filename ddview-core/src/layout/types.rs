//! Layout tree types.
//!
//! The live tree ([`PanelState`]) carries runtime handles: mount slots for tab
//! contents and the resize handle of every split. The data tree
//! ([`PanelData`]) is its serializable counterpart. The two are converted by
//! the pure functions in [`tree`](super::tree).

use std::any::Any;
use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::mutator::Mutator;

/// A node of the live layout tree.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelState {
    Tabs(TabsPanelState),
    Split(SplitPanelState),
}

impl PanelState {
    /// An empty tabs panel.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::Tabs(TabsPanelState {
            id: id.into(),
            tabs: Vec::new(),
            selected: None,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Tabs(panel) => &panel.id,
            Self::Split(panel) => &panel.id,
        }
    }

    pub fn as_tabs(&self) -> Option<&TabsPanelState> {
        match self {
            Self::Tabs(panel) => Some(panel),
            Self::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&SplitPanelState> {
        match self {
            Self::Split(panel) => Some(panel),
            Self::Tabs(_) => None,
        }
    }
}

/// A leaf holding an ordered list of tabs.
#[derive(Clone, Debug, PartialEq)]
pub struct TabsPanelState {
    pub id: String,
    pub tabs: Vec<TabState>,
    /// The visible tab.
    pub selected: Option<String>,
}

impl TabsPanelState {
    pub fn contains(&self, tab_id: &str) -> bool {
        self.tabs.iter().any(|tab| tab.id == tab_id)
    }
}

/// A tab, referencing a view by id.
#[derive(Clone, Debug, PartialEq)]
pub struct TabState {
    pub id: String,
    pub element: TabElement,
}

impl TabState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element: TabElement::default(),
        }
    }
}

/// The slot a tab's content is mounted into.
///
/// Compares by identity: two tabs are equal only if they share the slot.
#[derive(Clone, Default)]
pub struct TabElement {
    slot: Rc<RefCell<Option<Rc<dyn Any>>>>,
}

impl TabElement {
    pub fn mount(&self, content: Rc<dyn Any>) {
        *self.slot.borrow_mut() = Some(content);
    }

    pub fn unmount(&self) -> Option<Rc<dyn Any>> {
        self.slot.borrow_mut().take()
    }

    pub fn mounted(&self) -> Option<Rc<dyn Any>> {
        self.slot.borrow().clone()
    }
}

impl PartialEq for TabElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Debug for TabElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabElement")
            .field("mounted", &self.slot.borrow().is_some())
            .finish()
    }
}

/// An internal node dividing its area between children.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitPanelState {
    pub id: String,
    pub direction: SplitDirection,
    pub handle: SplitHandle,
    pub panels: Vec<SplitChild>,
}

/// A weighted child of a split. Weights of siblings sum to 100.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitChild {
    pub default_weight: f64,
    pub content: PanelState,
}

/// The resize handle of a split.
///
/// The presentation layer reports the live weights of the children here when
/// the user drags a divider. Compares by identity.
#[derive(Clone, Default)]
pub struct SplitHandle {
    live: Rc<RefCell<Option<Vec<f64>>>>,
}

impl SplitHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_live_weights(&self, weights: Vec<f64>) {
        *self.live.borrow_mut() = Some(weights);
    }

    pub fn clear(&self) {
        self.live.borrow_mut().take();
    }

    /// The reported weights, if the split has been laid out.
    pub fn live_weights(&self) -> Option<Vec<f64>> {
        self.live.borrow().clone()
    }
}

impl PartialEq for SplitHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.live, &other.live)
    }
}

impl Debug for SplitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SplitHandle")
            .field(&*self.live.borrow())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

/// A side of a panel to insert a new panel at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelSide {
    North,
    South,
    East,
    West,
}

impl PanelSide {
    /// The split direction this side inserts along.
    pub fn axis(self) -> SplitDirection {
        match self {
            Self::North | Self::South => SplitDirection::Vertical,
            Self::East | Self::West => SplitDirection::Horizontal,
        }
    }

    /// Whether the new panel goes after its neighbor.
    pub fn is_after(self) -> bool {
        matches!(self, Self::East | Self::South)
    }
}

/// Where a dragged tab is dropped relative to a panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropSide {
    In,
    North,
    South,
    East,
    West,
}

impl DropSide {
    /// The side to split at, or `None` when dropping into the panel.
    pub fn panel_side(self) -> Option<PanelSide> {
        match self {
            Self::In => None,
            Self::North => Some(PanelSide::North),
            Self::South => Some(PanelSide::South),
            Self::East => Some(PanelSide::East),
            Self::West => Some(PanelSide::West),
        }
    }
}

impl From<PanelSide> for DropSide {
    fn from(side: PanelSide) -> Self {
        match side {
            PanelSide::North => Self::North,
            PanelSide::South => Self::South,
            PanelSide::East => Self::East,
            PanelSide::West => Self::West,
        }
    }
}

/// Serializable form of a panel.
///
/// ```json
/// {"type": "split", "id": "s", "direction": "horizontal", "panels": [
///     {"weight": 30, "content": {"type": "tabs", "id": "a", "tabs": ["x"]}},
///     {"weight": 70, "content": {"type": "tabs", "id": "b", "tabs": []}}
/// ]}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PanelData {
    Tabs {
        id: String,
        tabs: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected: Option<String>,
    },
    Split {
        id: String,
        direction: SplitDirection,
        panels: Vec<SplitChildData>,
    },
}

impl PanelData {
    /// An empty tabs panel.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::Tabs {
            id: id.into(),
            tabs: Vec::new(),
            selected: None,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Tabs { id, .. } | Self::Split { id, .. } => id,
        }
    }

    /// This panel and all of its descendants, parents first.
    pub fn panels(&self) -> Vec<&PanelData> {
        let mut out = vec![self];
        if let Self::Split { panels, .. } = self {
            for child in panels {
                out.extend(child.content.panels());
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitChildData {
    pub weight: f64,
    pub content: PanelData,
}

/// A point in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An in-progress drag of a tab.
#[derive(Clone, Debug, PartialEq)]
pub struct DragData {
    pub position: Point,
    pub offset: Point,
    pub target_id: String,
    pub remove_from_panel_id: Option<String>,
    /// Label shown under the cursor.
    pub preview: Option<String>,
    /// The dragged tab, filled in by the layout when the drag starts.
    pub target: Option<TabState>,
}

impl DragData {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            position: Point::default(),
            offset: Point::default(),
            target_id: target_id.into(),
            remove_from_panel_id: None,
            preview: None,
            target: None,
        }
    }

    pub fn from_panel(mut self, panel_id: impl Into<String>) -> Self {
        self.remove_from_panel_id = Some(panel_id.into());
        self
    }
}

/// Invoked once a tab is gone for good, with the layout from just before it
/// was removed. May return a mutator, which is committed together with those
/// of the other listeners.
pub type CloseListener = Rc<dyn Fn(&PanelState, &PanelData) -> Option<Mutator>>;

/// The tab argument of [`LayoutState::open_tab`](super::LayoutState::open_tab).
#[derive(Clone, Debug)]
pub enum TabSpec {
    /// Reuse the tab with this id if it is in the layout, else create one.
    Id(String),
    Tab(TabState),
}

impl TabSpec {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Tab(tab) => &tab.id,
        }
    }
}

impl From<&str> for TabSpec {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for TabSpec {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<TabState> for TabSpec {
    fn from(tab: TabState) -> Self {
        Self::Tab(tab)
    }
}
