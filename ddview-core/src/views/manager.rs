//! The view registry and the placement of views in the layout.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter;
use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::hints::{neighbor_hints, LocationHint, TabPosition, TabTarget, TargetType};
use super::view::ViewState;
use crate::layout::{
    CloseListener, DropSide, LayoutConfig, LayoutState, PanelData, PanelSide, PanelState,
    TabState, TabsPanelState,
};
use crate::mutator::{all, chain, Mutator, Transaction};
use crate::reactive::{Constant, Derived, Field, Observer, PlainField, Subscription, Watchable};

/// Where a category was last seen before its last view closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecoveryEntry {
    /// The layout from just before the close.
    pub layout: PanelData,
    /// The view that closed.
    pub target: String,
}

/// Recovery data per category.
pub type CategoryRecovery = BTreeMap<String, CategoryRecoveryEntry>;

/// The target sets revealed when a view is focused, by source view id.
pub type ViewGroups = IndexMap<String, Vec<IndexSet<String>>>;

struct ManagerInner {
    this: Weak<ManagerInner>,
    layout: LayoutState,
    views: PlainField<Vec<ViewState>>,
    all: Derived<IndexMap<String, ViewState>>,
    groups: Derived<ViewGroups>,
    category_recovery: Field<CategoryRecovery>,
    close_subscriptions: RefCell<HashMap<String, Subscription>>,
    _shown: Observer<Vec<ViewState>>,
    _deleted: Observer<Option<Vec<ViewState>>>,
}

impl ManagerInner {
    fn container(&self, id: &str) -> Option<PanelState> {
        self.layout
            .all_panels()
            .get()
            .into_iter()
            .find(|panel| panel.id() == id)
    }

    fn tab_parent(&self, tab_id: &str) -> Option<TabsPanelState> {
        self.layout
            .all_tab_panels()
            .get()
            .into_iter()
            .find(|panel| panel.contains(tab_id))
    }

    fn tab_category(&self, tab: &TabState) -> String {
        self.all
            .get()
            .get(&tab.id)
            .map_or_else(|| "default".to_string(), |view| view.category().get())
    }

    fn tab_parents_by_category(&self, category: &str) -> Vec<TabsPanelState> {
        self.layout
            .all_tab_panels()
            .get()
            .into_iter()
            .filter(|panel| panel.tabs.iter().any(|tab| self.tab_category(tab) == category))
            .collect()
    }

    /// Resolve the target of a hint to a panel in the current layout.
    fn resolve(&self, hint: LocationHint) -> Option<LocationHint> {
        let Some(target) = hint.target_id.clone() else {
            return Some(hint);
        };
        let target_type = hint.target_type;
        let accepts = |kind| target_type.map_or(true, |t| t == kind);

        if accepts(TargetType::View) {
            if let Some(panel) = self.tab_parent(&target) {
                return Some(LocationHint {
                    target_id: Some(panel.id),
                    target_type: Some(TargetType::Panel),
                    ..hint
                });
            }
        }
        if accepts(TargetType::Category) {
            if let Some(panel) = self.tab_parents_by_category(&target).into_iter().next() {
                return Some(LocationHint {
                    target_id: Some(panel.id),
                    ..hint
                });
            }
        }
        if accepts(TargetType::Panel) && self.container(&target).is_some() {
            return Some(hint);
        }
        None
    }

    fn open_in(&self, tx: &mut Transaction, view: &ViewState, hints: Vec<LocationHint>) {
        let layout = &self.layout;
        let view_id = view.id();

        if let Some(panel) = self.tab_parent(view_id) {
            tx.push(layout.select_tab(&panel.id, view_id));
            return;
        }

        // A hint that would create a panel first checks whether that panel
        // already exists.
        let mut candidates = hints
            .into_iter()
            .chain(iter::once(LocationHint::create("default")))
            .flat_map(|hint| {
                let existing = hint.create_id.clone().map(|id| LocationHint {
                    target_id: Some(id),
                    ..LocationHint::default()
                });
                existing.into_iter().chain(iter::once(hint))
            });
        let Some(location) = candidates.find_map(|hint| self.resolve(hint)) else {
            return;
        };
        debug!(view = view_id, hint = %location, "opening using hint");

        let main_id = layout.layout_state().get().id().to_string();
        let ratio = location.weight_ratio.unwrap_or(1.0);
        let open_id = match location.side.and_then(DropSide::panel_side) {
            None => match location
                .target_id
                .as_deref()
                .filter(|id| self.container(id).is_some())
            {
                Some(id) => Some(id.to_string()),
                None => tx.push(layout.add_panel(
                    &main_id,
                    PanelSide::East,
                    ratio,
                    location
                        .create_id
                        .as_deref()
                        .or(location.target_id.as_deref()),
                )),
            },
            Some(side) => tx.push(layout.add_panel(
                location.target_id.as_deref().unwrap_or(&main_id),
                side,
                ratio,
                location.create_id.as_deref(),
            )),
        };

        let Some(PanelState::Tabs(panel)) = open_id.and_then(|id| self.container(&id)) else {
            trace!(view = view_id, "hinted panel is not a tabs panel");
            return;
        };

        let before = location.tab_index.as_ref().and_then(|hint| {
            let index = match &hint.target {
                TabTarget::Index(index) => Some(*index),
                TabTarget::Id(category) if location.target_type == Some(TargetType::Category) => {
                    panel
                        .tabs
                        .iter()
                        .position(|tab| self.tab_category(tab) == *category)
                }
                TabTarget::Id(id) => panel.tabs.iter().position(|tab| tab.id == *id),
            }?;
            let index = match hint.position {
                TabPosition::Before => index,
                TabPosition::After => index + 1,
            };
            panel.tabs.get(index).map(|tab| tab.id.clone())
        });

        tx.push(layout.open_tab(&panel.id, view_id, None, before.as_deref()));
        tx.push(layout.select_tab(&panel.id, view_id));
    }

    /// Listener recording where `view` was when its tab closed.
    fn close_listener(&self, view: &ViewState) -> CloseListener {
        let manager = self.this.clone();
        let view = view.clone();
        Rc::new(move |state: &PanelState, data: &PanelData| {
            let manager = manager.upgrade()?;
            if manager.tab_parent(view.id()).is_some() {
                return None;
            }
            let recovery = manager.category_recovery.clone();
            let view = view.clone();
            let state = state.clone();
            let data = data.clone();
            Some(chain(move |tx| {
                let category = view.category().get();
                let mut current = recovery.get();
                current.insert(
                    category,
                    CategoryRecoveryEntry {
                        layout: data.clone(),
                        target: view.id().to_string(),
                    },
                );
                tx.push(recovery.set(current));
                tx.push(view.on_close_ui(&state, &data));
            }))
        })
    }

    fn register_close_listener(&self, view: &ViewState) {
        let subscription = self
            .layout
            .add_close_handler(view.id(), self.close_listener(view));
        let previous = self
            .close_subscriptions
            .borrow_mut()
            .insert(view.id().to_string(), subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    /// Select `id` in its panel if it is open but hidden.
    fn reveal(&self, tx: &mut Transaction, id: &str) {
        if let Some(panel) = self.tab_parent(id) {
            if panel.selected.as_deref() != Some(id) {
                tx.push(self.layout.select_tab(&panel.id, id));
            }
        }
    }

    fn close(&self, view: &ViewState) -> Mutator {
        let manager = self.this.clone();
        let view = view.clone();
        chain(move |tx| {
            let Some(manager) = manager.upgrade() else {
                return;
            };
            if !view.can_close().get() {
                return;
            }
            if let Some(panel) = manager.tab_parent(view.id()) {
                tx.push(manager.layout.close_tab(&panel.id, view.id()));
            }
        })
    }
}

/// Keeps track of the views of the application and where they are shown.
///
/// Opening a view places its tab in the layout according to the view's
/// [`LocationHint`]s. When a view's tab closes for good, the manager records
/// the layout at that moment so the view, or another view of its category,
/// reopens in the same place.
#[derive(Clone)]
pub struct ViewManager {
    inner: Rc<ManagerInner>,
}

impl ViewManager {
    /// A manager with the default layout configuration that closes empty
    /// panels and keeps the tabs of removed views.
    pub fn new() -> Self {
        Self::with_config(
            LayoutConfig::default(),
            Rc::new(Constant::new(true)),
            Rc::new(Constant::new(false)),
        )
    }

    /// Create a manager.
    ///
    /// `close_empty_panels` is passed on to the layout. When
    /// `auto_close_deleted` is true, the tabs of views removed from the
    /// registry are closed.
    pub fn with_config(
        config: LayoutConfig,
        close_empty_panels: Rc<dyn Watchable<bool>>,
        auto_close_deleted: Rc<dyn Watchable<bool>>,
    ) -> Self {
        let layout = LayoutState::with_config(config, close_empty_panels);
        let views = PlainField::new(Vec::<ViewState>::new());

        // Registered views and their descendants. The first view seen with
        // an id wins.
        let source = views.clone();
        let by_id = Derived::new(move |watch, _| {
            let mut known = IndexMap::new();
            for root in watch.watch(&source) {
                let below = watch.watch(root.strict_descendants());
                for view in iter::once(root).chain(below) {
                    known.entry(view.id().to_string()).or_insert(view);
                }
            }
            known
        });

        let source = by_id.clone();
        let groups = Derived::new(move |watch, _| {
            let mut groups = ViewGroups::new();
            for view in watch.watch(&source).values() {
                for group in watch.watch(view.declared_groups()) {
                    let targets: IndexSet<String> = group.targets.iter().cloned().collect();
                    for id in group.sources() {
                        groups.entry(id.clone()).or_default().push(targets.clone());
                    }
                }
            }
            groups
        });

        let (source, tabs) = (by_id.clone(), layout.all_tabs());
        let shown = Derived::new(move |watch, _| {
            let tabs = watch.watch(&tabs);
            watch
                .watch(&source)
                .into_values()
                .filter(|view| tabs.iter().any(|tab| tab.id == view.id()))
                .collect::<Vec<_>>()
        });
        let source = by_id.clone();
        let registry = Derived::new(move |watch, _| {
            watch
                .watch(&auto_close_deleted)
                .then(|| watch.watch(&source).into_values().collect::<Vec<_>>())
        });

        let inner = Rc::new_cyclic(|this: &Weak<ManagerInner>| {
            let manager = this.clone();
            let shown = Observer::new(shown).add(move |shown: &Vec<ViewState>, before: &Vec<ViewState>| {
                let Some(manager) = manager.upgrade() else {
                    return;
                };
                for view in shown.iter().filter(|view| !before.contains(view)) {
                    manager.register_close_listener(view);
                }
            });

            let manager = this.clone();
            let deleted = Observer::new(registry).add(
                move |current: &Option<Vec<ViewState>>, previous: &Option<Vec<ViewState>>| {
                    let (Some(manager), Some(current), Some(previous)) =
                        (manager.upgrade(), current, previous)
                    else {
                        return;
                    };
                    let removed: Vec<Mutator> = previous
                        .iter()
                        .filter(|view| !current.contains(view))
                        .map(|view| manager.close(view))
                        .collect();
                    if !removed.is_empty() {
                        debug!(count = removed.len(), "closing removed views");
                        all(removed).commit();
                    }
                },
            );

            ManagerInner {
                this: this.clone(),
                layout,
                views,
                all: by_id,
                groups,
                category_recovery: Field::new(CategoryRecovery::new()),
                close_subscriptions: RefCell::new(HashMap::new()),
                _shown: shown,
                _deleted: deleted,
            }
        });
        Self { inner }
    }

    // Registry

    /// Register a root view. Its descendants become known to the manager
    /// along with it. Adding a registered view does nothing.
    pub fn add_view(&self, view: &ViewState) -> Mutator {
        let view = view.clone();
        self.inner.views.update(move |views| {
            let mut views = views.clone();
            if !views.contains(&view) {
                views.push(view);
            }
            views
        })
    }

    /// Unregister the view with the given id.
    pub fn remove_view(&self, id: &str) -> Mutator {
        let id = id.to_string();
        self.inner.views.update(move |views| {
            views
                .iter()
                .filter(|view| view.id() != id)
                .cloned()
                .collect()
        })
    }

    /// The registered view with the given id.
    pub fn get(&self, id: &str) -> Option<ViewState> {
        self.inner.all.get().get(id).cloned()
    }

    /// Every known view by id: each registered view followed by its
    /// descendants, in registration order.
    pub fn all(&self) -> Derived<IndexMap<String, ViewState>> {
        self.inner.all.clone()
    }

    /// For each source view id, the groups of views its focus reveals.
    pub fn view_groups(&self) -> Derived<ViewGroups> {
        self.inner.groups.clone()
    }

    // Layout

    pub fn layout_state(&self) -> &LayoutState {
        &self.inner.layout
    }

    /// The current layout in serializable form.
    pub fn layout(&self) -> Derived<PanelData> {
        self.inner.layout.layout_data()
    }

    pub fn load_layout(&self, data: &PanelData) -> Mutator {
        self.inner.layout.load_layout(data)
    }

    /// Where each category was last closed.
    pub fn category_recovery(&self) -> &Field<CategoryRecovery> {
        &self.inner.category_recovery
    }

    // Opening and closing

    /// Open a view where its location hints suggest, or select it if it is
    /// already open.
    pub fn open(&self, view: &ViewState) -> Mutator {
        self.open_with(view, |hints| hints)
    }

    /// Like [`open`](Self::open), with a chance to rewrite the hints first.
    pub fn open_with<F>(&self, view: &ViewState, modify_hints: F) -> Mutator
    where
        F: FnOnce(Vec<LocationHint>) -> Vec<LocationHint>,
    {
        let category_hints = self
            .inner
            .category_recovery
            .get()
            .get(&view.category().get())
            .map(|entry| neighbor_hints(&entry.target, &entry.layout));
        let hints = modify_hints(view.location_hints(category_hints));

        let manager = Rc::clone(&self.inner);
        let view = view.clone();
        chain(move |tx| manager.open_in(tx, &view, hints))
    }

    /// Close the tab of a view, if it is open and may be closed.
    pub fn close(&self, view: &ViewState) -> Mutator {
        self.inner.close(view)
    }

    /// Whether a tab of the view is in the layout.
    pub fn is_open(&self, id: &str) -> Derived<bool> {
        let panels = self.inner.layout.all_tab_panels();
        let id = id.to_string();
        Derived::new(move |watch, _| watch.watch(&panels).iter().any(|panel| panel.contains(&id)))
    }

    /// Whether the view is the selected tab of its panel.
    pub fn is_visible(&self, id: &str) -> Derived<bool> {
        let panels = self.inner.layout.all_tab_panels();
        let id = id.to_string();
        Derived::new(move |watch, _| {
            watch
                .watch(&panels)
                .iter()
                .any(|panel| panel.selected.as_deref() == Some(id.as_str()))
        })
    }

    /// Select the view's tab if it is open but hidden, after doing the same
    /// for every member of the groups the view is a source of.
    pub fn focus(&self, id: &str) -> Mutator {
        let manager = Rc::clone(&self.inner);
        let id = id.to_string();
        chain(move |tx| {
            let groups = manager.groups.get().get(&id).cloned().unwrap_or_default();
            for target in groups.iter().flatten() {
                manager.reveal(tx, target);
            }
            manager.reveal(tx, &id);
        })
    }
}

impl Default for ViewManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ViewManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewManager")
            .field("views", &self.inner.all.get().keys().collect::<Vec<_>>())
            .field("layout", &self.inner.layout)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SplitDirection;
    use crate::views::hints::{main_location_hints, sidebar_location_hints};
    use crate::views::ViewGroup;

    fn view(manager: &ViewManager, id: &str, category: &str) -> ViewState {
        let view = ViewState::new(id);
        view.category().set(category.to_string()).commit();
        view.set_base_location_hints(main_location_hints());
        manager.add_view(&view).commit();
        view
    }

    fn panel_of(manager: &ViewManager, id: &str) -> Option<String> {
        manager.inner.tab_parent(id).map(|panel| panel.id)
    }

    #[test]
    fn registry_tracks_views() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        manager.add_view(&a).commit();
        assert_eq!(manager.all().get().len(), 1);
        assert_eq!(manager.get("a"), Some(a));

        manager.remove_view("a").commit();
        assert!(manager.get("a").is_none());
    }

    #[test]
    fn opens_in_the_default_panel() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        let b = view(&manager, "b", "default");
        manager.open(&a).commit();
        manager.open(&b).commit();

        assert_eq!(panel_of(&manager, "a").as_deref(), Some("default"));
        assert_eq!(panel_of(&manager, "b").as_deref(), Some("default"));
        assert!(manager.is_visible("b").get());
        assert!(!manager.is_visible("a").get());
        assert!(manager.is_open("a").get());
    }

    #[test]
    fn sidebar_is_created_west_of_default() {
        let manager = ViewManager::new();
        let main = view(&manager, "main", "default");
        manager.open(&main).commit();

        let side = ViewState::new("side");
        side.category().set("settings".into()).commit();
        side.set_base_location_hints(sidebar_location_hints());
        manager.add_view(&side).commit();
        manager.open(&side).commit();

        assert_eq!(panel_of(&manager, "side").as_deref(), Some("sidebar"));
        let PanelData::Split {
            direction, panels, ..
        } = manager.layout().get()
        else {
            panic!("expected a split");
        };
        assert_eq!(direction, SplitDirection::Horizontal);
        assert_eq!(panels[0].content.id(), "sidebar");
        assert_eq!(panels[1].content.id(), "default");
    }

    #[test]
    fn views_sharing_a_category_ignore_their_own_hints() {
        let manager = ViewManager::new();
        let main = view(&manager, "main", "default");
        manager.open(&main).commit();

        let side = ViewState::new("side");
        side.set_base_location_hints(sidebar_location_hints());
        manager.add_view(&side).commit();
        manager.open(&side).commit();
        assert_eq!(panel_of(&manager, "side").as_deref(), Some("default"));
    }

    #[test]
    fn views_of_a_category_open_together() {
        let manager = ViewManager::new();
        let main = view(&manager, "main", "default");
        manager.open(&main).commit();
        let id = manager
            .layout_state()
            .add_panel("default", PanelSide::South, 1.0, Some("bottom"))
            .commit()
            .unwrap();
        let first = view(&manager, "first", "tools");
        manager
            .open_with(&first, |mut hints| {
                hints.insert(0, LocationHint::panel(id.clone()));
                hints
            })
            .commit();

        let second = view(&manager, "second", "tools");
        manager.open(&second).commit();
        assert_eq!(panel_of(&manager, "second").as_deref(), Some("bottom"));
    }

    #[test]
    fn closed_views_reopen_where_they_were() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        manager.open(&a).commit();
        manager
            .layout_state()
            .add_panel("default", PanelSide::East, 1.0, Some("side"))
            .commit();
        let b = view(&manager, "b", "default");
        manager
            .open_with(&b, |mut hints| {
                hints.insert(0, LocationHint::panel("side"));
                hints
            })
            .commit();
        assert_eq!(panel_of(&manager, "b").as_deref(), Some("side"));

        manager.close(&b).commit();
        assert_eq!(manager.layout_state().all_tab_panels().get().len(), 1);
        manager.layout_state().flush_close_events();
        assert!(b.layout_recovery().get().is_some());
        assert!(manager.category_recovery().get().contains_key("default"));

        manager.open(&b).commit();
        assert_eq!(panel_of(&manager, "b").as_deref(), Some("side"));
        let PanelData::Split { panels, .. } = manager.layout().get() else {
            panic!("expected a split");
        };
        assert_eq!(panels[1].content.id(), "side");
    }

    #[test]
    fn unclosable_views_stay_open() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        a.can_close().set(false).commit();
        manager.open(&a).commit();
        manager.close(&a).commit();
        assert!(manager.is_open("a").get());
    }

    #[test]
    fn focus_selects_hidden_views() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        let b = view(&manager, "b", "default");
        manager.open(&a).commit();
        manager.open(&b).commit();

        manager.focus("a").commit();
        assert!(manager.is_visible("a").get());
    }

    #[test]
    fn descendants_of_registered_views_are_known() {
        let manager = ViewManager::new();
        let root = view(&manager, "root", "default");
        let child = ViewState::new("child");
        let grandchild = ViewState::new("grandchild");
        child.children().set(vec![grandchild.clone()]).commit();
        root.children().set(vec![child.clone()]).commit();

        let all = manager.all().get();
        assert_eq!(all.keys().collect::<Vec<_>>(), ["root", "child", "grandchild"]);
        assert_eq!(manager.get("grandchild"), Some(grandchild));

        root.children().set(Vec::new()).commit();
        assert!(manager.get("child").is_none());
    }

    #[test]
    fn view_groups_map_sources_to_targets() {
        let manager = ViewManager::new();
        let root = view(&manager, "root", "default");
        let child = ViewState::new("child");
        root.children().set(vec![child.clone()]).commit();
        root
            .declared_groups()
            .set(vec![ViewGroup::new(["a", "b"])])
            .commit();
        child
            .declared_groups()
            .set(vec![ViewGroup::new(["c", "d"]).with_sources(["a"])])
            .commit();

        let groups = manager.view_groups().get();
        let targets = |id: &str| -> Vec<Vec<String>> {
            groups[id]
                .iter()
                .map(|set| set.iter().cloned().collect())
                .collect()
        };
        assert_eq!(targets("a"), [vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(targets("b"), [vec!["a", "b"]]);
        assert!(!groups.contains_key("c"));
    }

    #[test]
    fn focus_reveals_group_members() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        let b = view(&manager, "b", "tools");
        let hidden = view(&manager, "hidden", "tools");
        let c = view(&manager, "c", "default");
        manager
            .layout_state()
            .add_panel("default", PanelSide::South, 1.0, Some("bottom"))
            .commit();
        manager.open(&a).commit();
        manager.open(&c).commit();
        for tool in [&b, &hidden] {
            manager
                .open_with(tool, |mut hints| {
                    hints.insert(0, LocationHint::panel("bottom"));
                    hints
                })
                .commit();
        }
        assert!(!manager.is_visible("a").get());
        assert!(!manager.is_visible("b").get());

        a.declared_groups()
            .set(vec![ViewGroup::new(["a", "b"])])
            .commit();
        manager.focus("a").commit();
        assert!(manager.is_visible("a").get());
        assert!(manager.is_visible("b").get());
        assert!(!manager.is_visible("hidden").get());
    }

    #[test]
    fn focus_leaves_closed_group_members_closed() {
        let manager = ViewManager::new();
        let a = view(&manager, "a", "default");
        view(&manager, "b", "default");
        manager.open(&a).commit();
        a.declared_groups()
            .set(vec![ViewGroup::new(["b"]).with_sources(["a"])])
            .commit();

        manager.focus("a").commit();
        assert!(!manager.is_open("b").get());
        assert!(manager.is_visible("a").get());
    }

    #[test]
    fn removed_children_are_closed_when_enabled() {
        let manager = ViewManager::with_config(
            LayoutConfig::default(),
            Rc::new(Constant::new(true)),
            Rc::new(Constant::new(true)),
        );
        let root = view(&manager, "root", "default");
        let child = ViewState::new("child");
        child.set_base_location_hints(main_location_hints());
        root.children().set(vec![child.clone()]).commit();
        manager.open(&root).commit();
        manager.open(&child).commit();
        assert!(manager.is_open("child").get());

        root.children().set(Vec::new()).commit();
        assert!(!manager.is_open("child").get());
        assert!(manager.is_open("root").get());
    }

    #[test]
    fn removed_views_are_closed_when_enabled() {
        let auto_close = PlainField::new(true);
        let manager = ViewManager::with_config(
            LayoutConfig::default(),
            Rc::new(Constant::new(false)),
            Rc::new(auto_close.clone()),
        );
        let a = view(&manager, "a", "default");
        manager.open(&a).commit();

        manager.remove_view("a").commit();
        assert!(!manager.is_open("a").get());

        auto_close.set(false).commit();
        let b = view(&manager, "b", "default");
        manager.open(&b).commit();
        manager.remove_view("b").commit();
        assert!(manager.is_open("b").get());
    }
}
