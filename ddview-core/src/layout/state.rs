//! The layout state: the panel tree, drag state, and tab close listeners.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::close::{CloseQueue, PendingClose};
use super::config::LayoutConfig;
use super::tree::{
    self, modify_tabs, panel_data_to_state, panel_state_to_data, state_panels, state_tab_panels,
    state_tabs, update_default_weights,
};
use super::types::{
    CloseListener, DragData, PanelData, PanelSide, PanelState, TabSpec, TabState, TabsPanelState,
};
use crate::mutator::{all, chain, Mutator};
use crate::reactive::{Constant, Derived, Field, ListenerId, PlainField, Subscription, Watchable};

struct LayoutInner {
    config: LayoutConfig,
    layout: Field<PanelState>,
    dragging: PlainField<Option<DragData>>,
    close_empty_panels: Rc<dyn Watchable<bool>>,
    close_listeners: RefCell<IndexMap<String, Vec<(ListenerId, CloseListener)>>>,
    closes: CloseQueue,

    layout_state: Derived<PanelState>,
    layout_data: Derived<PanelData>,
    all_tabs: Derived<Vec<TabState>>,
    all_tab_panels: Derived<Vec<TabsPanelState>>,
    all_panels: Derived<Vec<PanelState>>,
    dragging_data: Derived<Option<DragData>>,
}

impl LayoutInner {
    fn add_close_handler(self: &Rc<Self>, tab_id: &str, handler: CloseListener) -> Subscription {
        let id = ListenerId::new();
        self.close_listeners
            .borrow_mut()
            .entry(tab_id.to_string())
            .or_default()
            .push((id, handler));

        let this = Rc::downgrade(self);
        let tab_id = tab_id.to_string();
        Subscription::new(move || {
            let Some(this) = this.upgrade() else {
                return;
            };
            let mut listeners = this.close_listeners.borrow_mut();
            if let Some(handlers) = listeners.get_mut(&tab_id) {
                handlers.retain(|(handler_id, _)| *handler_id != id);
                if handlers.is_empty() {
                    listeners.shift_remove(&tab_id);
                }
            }
        })
    }

    /// Queue a check that fires the close listeners of `tab_id` if the tab is
    /// gone by then. `before` is the layout from before the removal.
    fn schedule_potential_close_event(&self, tab_id: &str, before: PanelState) {
        let data = panel_state_to_data(&before);
        let due = Instant::now() + self.config.close_event_delay;
        debug!(tab = tab_id, delay = ?self.config.close_event_delay, "scheduled close check");
        self.closes.push(PendingClose {
            tab_id: tab_id.to_string(),
            state: before,
            data,
            due,
        });
    }

    fn run_close_check(&self, close: PendingClose) {
        let still_exists = self.all_tabs.get().iter().any(|tab| tab.id == close.tab_id);
        if still_exists {
            trace!(tab = %close.tab_id, "tab still open, skipping close listeners");
            return;
        }

        let handlers = self
            .close_listeners
            .borrow_mut()
            .shift_remove(&close.tab_id)
            .unwrap_or_default();
        let mutators: Vec<Mutator> = handlers
            .into_iter()
            .filter_map(|(_, handler)| handler(&close.state, &close.data))
            .collect();
        debug!(tab = %close.tab_id, mutators = mutators.len(), "tab closed");
        if !mutators.is_empty() {
            all(mutators).commit();
        }
    }
}

/// The panel layout of the application.
///
/// Cloning a `LayoutState` produces another handle to the same layout.
///
/// Every modification returns a [`Mutator`] that must be committed. Tree
/// rewrites themselves are the pure functions of [`tree`](super::tree).
///
/// # Example
///
/// ```rust,ignore
/// let layout = LayoutState::new();
/// let id = layout.add_panel("default", PanelSide::East, 1.0, None).commit();
/// layout.open_tab(&id.unwrap(), "info", None, None).commit();
/// ```
#[derive(Clone)]
pub struct LayoutState {
    inner: Rc<LayoutInner>,
}

impl LayoutState {
    /// Create a layout with the default configuration, which closes panels
    /// once their last tab is closed.
    pub fn new() -> Self {
        Self::with_config(LayoutConfig::default(), Rc::new(Constant::new(true)))
    }

    /// Create a layout. `close_empty_panels` decides whether a panel is
    /// removed when its last tab is closed.
    pub fn with_config(config: LayoutConfig, close_empty_panels: Rc<dyn Watchable<bool>>) -> Self {
        let layout = Field::new(PanelState::empty(config.root_panel_id.clone()));
        let dragging = PlainField::new(None);

        let source = layout.clone();
        let layout_data = Derived::new(move |watch, _| panel_state_to_data(&watch.watch(&source)));
        let source = layout.clone();
        let all_tabs = Derived::new(move |watch, _| state_tabs(&watch.watch(&source)));
        let source = layout.clone();
        let all_tab_panels = Derived::new(move |watch, _| state_tab_panels(&watch.watch(&source)));
        let source = layout.clone();
        let all_panels = Derived::new(move |watch, _| state_panels(&watch.watch(&source)));

        Self {
            inner: Rc::new(LayoutInner {
                config,
                layout_state: layout.readonly(),
                dragging_data: dragging.readonly(),
                layout,
                dragging,
                close_empty_panels,
                close_listeners: RefCell::new(IndexMap::new()),
                closes: CloseQueue::default(),
                layout_data,
                all_tabs,
                all_tab_panels,
                all_panels,
            }),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.inner.config
    }

    // Derived views

    /// The current layout tree.
    pub fn layout_state(&self) -> Derived<PanelState> {
        self.inner.layout_state.clone()
    }

    /// The current layout in serializable form.
    pub fn layout_data(&self) -> Derived<PanelData> {
        self.inner.layout_data.clone()
    }

    /// Every tab in the layout.
    pub fn all_tabs(&self) -> Derived<Vec<TabState>> {
        self.inner.all_tabs.clone()
    }

    /// Every tabs panel in the layout.
    pub fn all_tab_panels(&self) -> Derived<Vec<TabsPanelState>> {
        self.inner.all_tab_panels.clone()
    }

    /// Every panel in the layout, splits included.
    pub fn all_panels(&self) -> Derived<Vec<PanelState>> {
        self.inner.all_panels.clone()
    }

    /// The drag in progress, if any.
    pub fn dragging_data(&self) -> Derived<Option<DragData>> {
        self.inner.dragging_data.clone()
    }

    // Layout modification

    /// Replace the layout with the given data.
    pub fn load_layout(&self, data: &PanelData) -> Mutator {
        self.inner.layout.set(panel_data_to_state(data))
    }

    fn update_layout<R, F>(&self, update: F) -> Mutator<R>
    where
        R: 'static,
        F: FnOnce(&Rc<LayoutInner>, &PanelState) -> (PanelState, R) + 'static,
    {
        let inner = Rc::clone(&self.inner);
        chain(move |tx| {
            let current = inner.layout.get();
            let (next, result) = update(&inner, &current);
            tx.push(inner.layout.set(next));
            result
        })
    }

    /// Remove a panel. Removing the root resets the layout to an empty root
    /// panel.
    pub fn remove_panel(&self, panel_id: &str) -> Mutator {
        let panel_id = panel_id.to_string();
        self.update_layout(move |inner, layout| {
            let current = update_default_weights(layout);
            let next = tree::remove_panel(&current, &panel_id)
                .unwrap_or_else(|| PanelState::empty(inner.config.root_panel_id.clone()));
            debug!(panel = %panel_id, "removing panel");
            (next, ())
        })
    }

    /// Add an empty tabs panel on the given side of `next_to_id`.
    ///
    /// `size` is relative to the average size of the panels in the split it
    /// ends up in. The mutator results in the id of the new panel, or `None`
    /// if `next_to_id` does not exist.
    pub fn add_panel(
        &self,
        next_to_id: &str,
        side: PanelSide,
        size: f64,
        id: Option<&str>,
    ) -> Mutator<Option<String>> {
        let next_to_id = next_to_id.to_string();
        let id = id.map(str::to_string);
        self.update_layout(move |_, layout| {
            let current = update_default_weights(layout);
            let (next, new_id) = tree::add_panel(&current, &next_to_id, side, size, id.as_deref());
            match new_id {
                Some(new_id) => {
                    debug!(panel = %new_id, next_to = %next_to_id, ?side, size, "adding panel");
                    (next, Some(new_id))
                }
                None => (layout.clone(), None),
            }
        })
    }

    // Tabs modification

    /// Close a tab. If it was selected, the tab taking its place is
    /// selected. An emptied panel is removed if the close policy allows it.
    ///
    /// The tab's close listeners fire later, once it is clear the tab was not
    /// reopened elsewhere.
    pub fn close_tab(&self, panel_id: &str, tab_id: &str) -> Mutator {
        let panel_id = panel_id.to_string();
        let tab_id = tab_id.to_string();
        self.update_layout(move |inner, layout| {
            let current = update_default_weights(layout);
            let mut now_empty = false;
            let mut next = modify_tabs(&current, &panel_id, &mut |panel: &TabsPanelState| {
                let index = panel.tabs.iter().position(|tab| tab.id == tab_id);
                let tabs: Vec<TabState> = panel
                    .tabs
                    .iter()
                    .filter(|tab| tab.id != tab_id)
                    .cloned()
                    .collect();
                now_empty = tabs.is_empty();

                let selected = if panel.selected.as_deref() == Some(tab_id.as_str()) {
                    let index = index.unwrap_or(0).min(tabs.len().saturating_sub(1));
                    tabs.get(index).map(|tab| tab.id.clone())
                } else {
                    panel.selected.clone()
                };
                TabsPanelState {
                    id: panel.id.clone(),
                    tabs,
                    selected,
                }
            });

            if now_empty && inner.close_empty_panels.get() {
                if let Some(removed) = tree::remove_panel(&next, &panel_id) {
                    next = removed;
                }
            }

            debug!(panel = %panel_id, tab = %tab_id, "closing tab");
            inner.schedule_potential_close_event(&tab_id, layout.clone());
            (next, ())
        })
    }

    /// Open a tab in a tabs panel.
    ///
    /// A tab already in the panel is moved. It is placed before
    /// `before_tab_id` if given and present, and appended otherwise. The tab
    /// is selected only if the panel had no selection.
    pub fn open_tab(
        &self,
        panel_id: &str,
        tab: impl Into<TabSpec>,
        close_handler: Option<CloseListener>,
        before_tab_id: Option<&str>,
    ) -> Mutator {
        let panel_id = panel_id.to_string();
        let tab = tab.into();
        let before_tab_id = before_tab_id.map(str::to_string);
        self.update_layout(move |inner, layout| {
            let tab = match tab {
                TabSpec::Tab(tab) => tab,
                TabSpec::Id(id) => state_tabs(layout)
                    .into_iter()
                    .find(|tab| tab.id == id)
                    .unwrap_or_else(|| TabState::new(id)),
            };

            let next = modify_tabs(layout, &panel_id, &mut |panel: &TabsPanelState| {
                let mut tabs: Vec<TabState> = panel
                    .tabs
                    .iter()
                    .filter(|existing| existing.id != tab.id)
                    .cloned()
                    .collect();
                let target = match before_tab_id.as_deref() {
                    Some(before) if before == tab.id => {
                        panel.tabs.iter().position(|existing| existing.id == before)
                    }
                    Some(before) => tabs.iter().position(|existing| existing.id == before),
                    None => None,
                };
                let index = target.unwrap_or(tabs.len()).min(tabs.len());
                tabs.insert(index, tab.clone());

                TabsPanelState {
                    id: panel.id.clone(),
                    tabs,
                    selected: panel.selected.clone().or_else(|| Some(tab.id.clone())),
                }
            });

            if let Some(handler) = close_handler {
                // Dropping the subscription keeps the handler; it is removed
                // once the tab closes.
                let _subscription = inner.add_close_handler(&tab.id, handler);
            }
            (next, ())
        })
    }

    /// Select a tab, if the panel contains it.
    pub fn select_tab(&self, panel_id: &str, tab_id: &str) -> Mutator {
        let panel_id = panel_id.to_string();
        let tab_id = tab_id.to_string();
        self.update_layout(move |_, layout| {
            let next = modify_tabs(layout, &panel_id, &mut |panel: &TabsPanelState| {
                TabsPanelState {
                    selected: if panel.contains(&tab_id) {
                        Some(tab_id.clone())
                    } else {
                        panel.selected.clone()
                    },
                    ..panel.clone()
                }
            });
            (next, ())
        })
    }

    /// Listen for a tab closing for good. The handler fires at most once.
    pub fn add_close_handler(&self, tab_id: &str, handler: CloseListener) -> Subscription {
        self.inner.add_close_handler(tab_id, handler)
    }

    /// Number of close listeners registered for a tab.
    pub fn close_handler_count(&self, tab_id: &str) -> usize {
        self.inner
            .close_listeners
            .borrow()
            .get(tab_id)
            .map_or(0, Vec::len)
    }

    // Dragging

    /// Start, update, or end a drag.
    ///
    /// The dragged tab is looked up now. Ending a drag schedules a close
    /// check for the tab that was dragged, since dropping it nowhere closes
    /// it.
    pub fn set_dragging_data(&self, drag: Option<DragData>) -> Mutator {
        let drag = drag.map(|mut drag| {
            if let Some(target) = self
                .inner
                .all_tabs
                .get()
                .into_iter()
                .find(|tab| tab.id == drag.target_id)
            {
                drag.target = Some(target);
            }
            drag
        });

        if drag.is_none() {
            if let Some(previous) = self.inner.dragging.get() {
                self.inner
                    .schedule_potential_close_event(&previous.target_id, self.inner.layout.get());
            }
        }

        self.inner.dragging.set(drag)
    }

    // Close checks

    /// Number of close checks waiting to run.
    pub fn pending_close_events(&self) -> usize {
        self.inner.closes.len()
    }

    /// Run the close checks due at `now`.
    pub fn process_due_close_events(&self, now: Instant) -> usize {
        let due = self.inner.closes.take_due(now);
        let count = due.len();
        for close in due {
            self.inner.run_close_check(close);
        }
        count
    }

    /// Run every queued close check, due or not.
    pub fn flush_close_events(&self) -> usize {
        let pending = self.inner.closes.take_all();
        let count = pending.len();
        for close in pending {
            self.inner.run_close_check(close);
        }
        count
    }

    /// Run close checks as they become due. Never returns.
    ///
    /// The layout is not `Send`, so this must be spawned on a
    /// [`tokio::task::LocalSet`].
    pub async fn drive_close_events(&self) {
        loop {
            match self.inner.closes.next_due() {
                Some(due) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(due) => {}
                        _ = self.inner.closes.queued() => {}
                    }
                }
                None => self.inner.closes.queued().await,
            }
            self.process_due_close_events(Instant::now());
        }
    }

    /// Whether two handles refer to the same layout.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for LayoutState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutState")
            .field("config", &self.inner.config)
            .field("layout", &self.inner.layout)
            .field("pending_close_events", &self.inner.closes.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;

    fn tab_ids(panel: &TabsPanelState) -> Vec<&str> {
        panel.tabs.iter().map(|tab| tab.id.as_str()).collect()
    }

    fn panel(layout: &LayoutState, id: &str) -> TabsPanelState {
        layout
            .all_tab_panels()
            .get()
            .into_iter()
            .find(|panel| panel.id == id)
            .unwrap()
    }

    fn counting_listener(count: &Rc<Cell<u32>>) -> CloseListener {
        let count = count.clone();
        Rc::new(move |_, _| {
            count.set(count.get() + 1);
            None
        })
    }

    fn root(layout: &LayoutState) {
        layout.load_layout(&PanelData::empty("root")).commit();
    }

    #[test]
    fn starts_with_an_empty_default_panel() {
        let layout = LayoutState::new();
        assert_eq!(layout.layout_state().get(), PanelState::empty("default"));
    }

    #[test]
    fn open_tab_appends_and_selects_first() {
        let layout = LayoutState::new();
        root(&layout);
        layout.open_tab("root", "a", None, None).commit();
        layout.open_tab("root", "b", None, None).commit();

        let root = panel(&layout, "root");
        assert_eq!(tab_ids(&root), vec!["a", "b"]);
        assert_eq!(root.selected.as_deref(), Some("a"));
    }

    #[test]
    fn open_tab_moves_existing_tabs() {
        let layout = LayoutState::new();
        root(&layout);
        for id in ["a", "b", "c"] {
            layout.open_tab("root", id, None, None).commit();
        }
        layout.open_tab("root", "c", None, Some("a")).commit();
        assert_eq!(tab_ids(&panel(&layout, "root")), vec!["c", "a", "b"]);

        layout.open_tab("root", "c", None, None).commit();
        assert_eq!(tab_ids(&panel(&layout, "root")), vec!["a", "b", "c"]);
    }

    #[test]
    fn reopening_in_place_keeps_the_tree() {
        let layout = LayoutState::new();
        root(&layout);
        for id in ["a", "b", "c"] {
            layout.open_tab("root", id, None, None).commit();
        }
        let before = layout.layout_state().get();

        layout.open_tab("root", "b", None, Some("b")).commit();
        layout.open_tab("root", "b", None, Some("c")).commit();
        assert_eq!(layout.layout_state().get(), before);
    }

    #[test]
    fn select_tab_ignores_missing_tabs() {
        let layout = LayoutState::new();
        root(&layout);
        layout.open_tab("root", "a", None, None).commit();
        layout.open_tab("root", "b", None, None).commit();

        layout.select_tab("root", "b").commit();
        assert_eq!(panel(&layout, "root").selected.as_deref(), Some("b"));
        layout.select_tab("root", "zzz").commit();
        assert_eq!(panel(&layout, "root").selected.as_deref(), Some("b"));
    }

    #[test]
    fn closing_the_selected_tab_selects_its_successor() {
        let layout = LayoutState::new();
        root(&layout);
        for id in ["a", "b", "c"] {
            layout.open_tab("root", id, None, None).commit();
        }
        layout.select_tab("root", "c").commit();

        layout.close_tab("root", "c").commit();
        assert_eq!(panel(&layout, "root").selected.as_deref(), Some("b"));
        layout.close_tab("root", "a").commit();
        assert_eq!(panel(&layout, "root").selected.as_deref(), Some("b"));
    }

    #[test]
    fn empty_panels_stay_when_policy_is_off() {
        let policy = PlainField::new(false);
        let layout = LayoutState::with_config(LayoutConfig::default(), Rc::new(policy.clone()));
        root(&layout);
        let id = layout
            .add_panel("root", PanelSide::East, 1.0, Some("side"))
            .commit()
            .unwrap();
        layout.open_tab(&id, "a", None, None).commit();
        layout.close_tab(&id, "a").commit();
        assert_eq!(layout.all_tab_panels().get().len(), 2);

        policy.set(true).commit();
        layout.open_tab(&id, "a", None, None).commit();
        layout.close_tab(&id, "a").commit();
        assert_eq!(layout.all_tab_panels().get().len(), 1);
    }

    #[test]
    fn removing_the_root_resets_the_layout() {
        let layout = LayoutState::new();
        root(&layout);
        layout.remove_panel("root").commit();
        assert_eq!(layout.layout_state().get(), PanelState::empty("default"));
    }

    #[test]
    fn add_panel_to_missing_target_returns_none() {
        let layout = LayoutState::new();
        let before = layout.layout_state().get();
        let id = layout.add_panel("nope", PanelSide::West, 1.0, None).commit();
        assert_eq!(id, None);
        assert_eq!(layout.layout_state().get(), before);
    }

    #[test]
    fn close_listeners_fire_once_for_removed_tabs() {
        let layout = LayoutState::new();
        root(&layout);
        let count = Rc::new(Cell::new(0));
        layout
            .open_tab("root", "a", Some(counting_listener(&count)), None)
            .commit();
        assert_eq!(layout.close_handler_count("a"), 1);

        layout.close_tab("root", "a").commit();
        assert_eq!(count.get(), 0);
        assert_eq!(layout.flush_close_events(), 1);
        assert_eq!(count.get(), 1);
        assert_eq!(layout.close_handler_count("a"), 0);
    }

    #[test]
    fn close_listeners_receive_the_layout_before_removal() {
        let layout = LayoutState::new();
        root(&layout);
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        let listener: CloseListener = Rc::new(move |_, data| {
            *sink.borrow_mut() = Some(data.clone());
            None
        });
        layout.open_tab("root", "a", Some(listener), None).commit();
        layout.close_tab("root", "a").commit();
        layout.flush_close_events();

        let expected = PanelData::Tabs {
            id: "root".into(),
            tabs: vec!["a".into()],
            selected: Some("a".into()),
        };
        assert_eq!(seen.borrow().as_ref(), Some(&expected));
    }

    #[test]
    fn reopened_tabs_keep_their_listeners() {
        let layout = LayoutState::new();
        root(&layout);
        let count = Rc::new(Cell::new(0));
        layout
            .open_tab("root", "a", Some(counting_listener(&count)), None)
            .commit();
        layout.close_tab("root", "a").commit();
        layout.open_tab("root", "a", None, None).commit();

        layout.flush_close_events();
        assert_eq!(count.get(), 0);
        assert_eq!(layout.close_handler_count("a"), 1);
    }

    #[test]
    fn removed_close_handlers_do_not_fire() {
        let layout = LayoutState::new();
        root(&layout);
        layout.open_tab("root", "a", None, None).commit();
        let count = Rc::new(Cell::new(0));
        let subscription = layout.add_close_handler("a", counting_listener(&count));
        subscription.unsubscribe();

        layout.close_tab("root", "a").commit();
        layout.flush_close_events();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn close_checks_wait_for_their_delay() {
        let layout = LayoutState::new();
        root(&layout);
        layout.open_tab("root", "a", None, None).commit();
        let now = Instant::now();
        layout.close_tab("root", "a").commit();

        assert_eq!(layout.process_due_close_events(now), 0);
        assert_eq!(layout.pending_close_events(), 1);
        let later = Instant::now() + Duration::from_millis(10);
        assert_eq!(layout.process_due_close_events(later), 1);
    }

    #[test]
    fn dragging_resolves_the_target_tab() {
        let layout = LayoutState::new();
        root(&layout);
        layout.open_tab("root", "x", None, None).commit();
        layout
            .set_dragging_data(Some(DragData::new("x").from_panel("root")))
            .commit();

        let drag = layout.dragging_data().get().unwrap();
        assert_eq!(drag.target.map(|tab| tab.id), Some("x".to_string()));
        assert_eq!(layout.pending_close_events(), 0);

        layout.set_dragging_data(None).commit();
        assert_eq!(layout.dragging_data().get(), None);
        assert_eq!(layout.pending_close_events(), 1);
    }
}
