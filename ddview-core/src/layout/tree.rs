//! Pure rewrites of the layout tree.
//!
//! Every function takes a tree and returns a new one; nothing here touches
//! reactive state.

use uuid::Uuid;

use super::types::{
    PanelData, PanelSide, PanelState, SplitChild, SplitChildData, SplitHandle, SplitPanelState,
    TabState, TabsPanelState,
};

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Convert the live tree to its serializable form.
///
/// Split weights are the live weights where the split reported them, and the
/// default weights otherwise.
pub fn panel_state_to_data(state: &PanelState) -> PanelData {
    match state {
        PanelState::Tabs(panel) => PanelData::Tabs {
            id: panel.id.clone(),
            tabs: panel.tabs.iter().map(|tab| tab.id.clone()).collect(),
            selected: panel.selected.clone(),
        },
        PanelState::Split(split) => {
            let live = split.handle.live_weights();
            PanelData::Split {
                id: split.id.clone(),
                direction: split.direction,
                panels: split
                    .panels
                    .iter()
                    .enumerate()
                    .map(|(i, child)| SplitChildData {
                        weight: live
                            .as_ref()
                            .and_then(|weights| weights.get(i).copied())
                            .unwrap_or(child.default_weight),
                        content: panel_state_to_data(&child.content),
                    })
                    .collect(),
            }
        }
    }
}

/// Build a live tree from serialized data, with fresh handles and tabs.
pub fn panel_data_to_state(data: &PanelData) -> PanelState {
    match data {
        PanelData::Tabs { id, tabs, selected } => PanelState::Tabs(TabsPanelState {
            id: id.clone(),
            tabs: tabs.iter().map(TabState::new).collect(),
            selected: selected.clone(),
        }),
        PanelData::Split {
            id,
            direction,
            panels,
        } => PanelState::Split(SplitPanelState {
            id: id.clone(),
            direction: *direction,
            handle: SplitHandle::new(),
            panels: balance_default_weights(
                panels
                    .iter()
                    .map(|child| SplitChild {
                        default_weight: child.weight,
                        content: panel_data_to_state(&child.content),
                    })
                    .collect(),
            ),
        }),
    }
}

/// Every panel of the tree, parents first.
pub fn state_panels(state: &PanelState) -> Vec<PanelState> {
    let mut out = Vec::new();
    visit(state, &mut |panel| out.push(panel.clone()));
    out
}

/// Every tabs panel of the tree, in order.
pub fn state_tab_panels(state: &PanelState) -> Vec<TabsPanelState> {
    let mut out = Vec::new();
    visit(state, &mut |panel| {
        if let PanelState::Tabs(tabs) = panel {
            out.push(tabs.clone());
        }
    });
    out
}

/// Every tab of the tree, in order.
pub fn state_tabs(state: &PanelState) -> Vec<TabState> {
    state_tab_panels(state)
        .into_iter()
        .flat_map(|panel| panel.tabs)
        .collect()
}

fn visit<F: FnMut(&PanelState)>(state: &PanelState, f: &mut F) {
    f(state);
    if let PanelState::Split(split) = state {
        for child in &split.panels {
            visit(&child.content, f);
        }
    }
}

/// Rewrite the tabs panel with the given id.
pub fn modify_tabs<F>(state: &PanelState, panel_id: &str, modify: &mut F) -> PanelState
where
    F: FnMut(&TabsPanelState) -> TabsPanelState,
{
    match state {
        PanelState::Split(split) => PanelState::Split(SplitPanelState {
            panels: split
                .panels
                .iter()
                .map(|child| SplitChild {
                    default_weight: child.default_weight,
                    content: modify_tabs(&child.content, panel_id, modify),
                })
                .collect(),
            ..split.clone()
        }),
        PanelState::Tabs(panel) if panel.id == panel_id => PanelState::Tabs(modify(panel)),
        PanelState::Tabs(_) => state.clone(),
    }
}

/// Pull the live weights reported by split handles into the default weights.
///
/// Missing weights are padded with the average, extra weights are dropped,
/// and the result is rescaled to sum to 100.
pub fn update_default_weights(state: &PanelState) -> PanelState {
    let PanelState::Split(split) = state else {
        return state.clone();
    };

    let children = split.panels.iter().map(|child| update_default_weights(&child.content));
    let live = split
        .handle
        .live_weights()
        .filter(|weights| !weights.is_empty() && weights.iter().sum::<f64>() > 0.0);
    let Some(mut weights) = live else {
        return PanelState::Split(SplitPanelState {
            panels: split
                .panels
                .iter()
                .zip(children)
                .map(|(child, content)| SplitChild {
                    default_weight: child.default_weight,
                    content,
                })
                .collect(),
            ..split.clone()
        });
    };

    let count = split.panels.len();
    weights.truncate(count);
    let average = weights.iter().sum::<f64>() / weights.len() as f64;
    weights.resize(count, average);
    let adjustment = 100.0 / (average * count as f64);

    PanelState::Split(SplitPanelState {
        panels: balance_default_weights(
            weights
                .into_iter()
                .zip(children)
                .map(|(weight, content)| SplitChild {
                    default_weight: weight * adjustment,
                    content,
                })
                .collect(),
        ),
        ..split.clone()
    })
}

/// Make the default weights sum to exactly 100 by adjusting the last one.
///
/// Weights summing to more than 100 are first scaled down to 99.
pub fn balance_default_weights(mut panels: Vec<SplitChild>) -> Vec<SplitChild> {
    let sum: f64 = panels.iter().map(|child| child.default_weight).sum();
    if sum == 100.0 || panels.is_empty() {
        return panels;
    }
    if sum > 100.0 {
        for child in &mut panels {
            child.default_weight = child.default_weight / sum * 99.0;
        }
    }

    let last = panels.len() - 1;
    let first_sum: f64 = panels[..last].iter().map(|child| child.default_weight).sum();
    panels[last].default_weight = 100.0 - first_sum;
    panels
}

/// Remove the panel with the given id.
///
/// Splits left with a single child are replaced by that child, and the
/// remaining siblings are rescaled to sum to 100. Returns `None` if nothing
/// remains.
pub fn remove_panel(state: &PanelState, panel_id: &str) -> Option<PanelState> {
    if state.id() == panel_id {
        return None;
    }
    let PanelState::Split(split) = state else {
        return Some(state.clone());
    };

    let mut panels: Vec<SplitChild> = split
        .panels
        .iter()
        .filter_map(|child| {
            remove_panel(&child.content, panel_id).map(|content| SplitChild {
                default_weight: child.default_weight,
                content,
            })
        })
        .collect();

    match panels.len() {
        0 => None,
        1 => panels.pop().map(|child| child.content),
        _ => {
            let fraction = panels.iter().map(|child| child.default_weight).sum::<f64>() / 100.0;
            for child in &mut panels {
                child.default_weight /= fraction;
            }
            Some(PanelState::Split(SplitPanelState {
                panels: balance_default_weights(panels),
                ..split.clone()
            }))
        }
    }
}

/// Add an empty tabs panel next to `next_to_id`.
///
/// `size` is the new panel's size relative to an evenly distributed sibling.
/// Returns the new tree and the id of the created panel, or `None` if
/// `next_to_id` was not found.
pub fn add_panel(
    state: &PanelState,
    next_to_id: &str,
    side: PanelSide,
    size: f64,
    id: Option<&str>,
) -> (PanelState, Option<String>) {
    let axis = side.axis();

    if state.id() == next_to_id {
        let new_id = id.map_or_else(generate_id, str::to_string);
        let new_weight = 100.0 * size;
        let final_weight = new_weight * 100.0 / (100.0 + new_weight);

        let created = SplitChild {
            default_weight: final_weight,
            content: PanelState::empty(new_id.clone()),
        };
        let existing = SplitChild {
            default_weight: 100.0 - final_weight,
            content: state.clone(),
        };
        let panels = if side.is_after() {
            vec![existing, created]
        } else {
            vec![created, existing]
        };
        let split = PanelState::Split(SplitPanelState {
            id: generate_id(),
            direction: axis,
            handle: SplitHandle::new(),
            panels,
        });
        return (split, Some(new_id));
    }

    let PanelState::Split(split) = state else {
        return (state.clone(), None);
    };

    let neighbor = split
        .panels
        .iter()
        .position(|child| child.content.id() == next_to_id);
    if let Some(neighbor) = neighbor.filter(|_| split.direction == axis) {
        let average = 100.0 / split.panels.len() as f64;
        let new_weight = average * size;
        let adjustment = 100.0 / (100.0 + new_weight);

        let new_id = id.map_or_else(generate_id, str::to_string);
        let mut panels: Vec<SplitChild> = split
            .panels
            .iter()
            .map(|child| SplitChild {
                default_weight: child.default_weight * adjustment,
                content: child.content.clone(),
            })
            .collect();
        let index = neighbor + usize::from(side.is_after());
        panels.insert(
            index,
            SplitChild {
                default_weight: new_weight * adjustment,
                content: PanelState::empty(new_id.clone()),
            },
        );
        return (
            PanelState::Split(SplitPanelState {
                panels: balance_default_weights(panels),
                ..split.clone()
            }),
            Some(new_id),
        );
    }

    let mut created = None;
    let panels = split
        .panels
        .iter()
        .map(|child| {
            let (content, new_id) = add_panel(&child.content, next_to_id, side, size, id);
            if created.is_none() {
                created = new_id;
            }
            SplitChild {
                default_weight: child.default_weight,
                content,
            }
        })
        .collect();
    (
        PanelState::Split(SplitPanelState {
            panels,
            ..split.clone()
        }),
        created,
    )
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::types::SplitDirection;

    fn weights(state: &PanelState) -> Vec<f64> {
        state
            .as_split()
            .map(|split| split.panels.iter().map(|c| c.default_weight).collect())
            .unwrap_or_default()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    #[test]
    fn add_panel_around_a_leaf_splits_evenly() {
        let root = PanelState::empty("root");
        let (state, id) = add_panel(&root, "root", PanelSide::East, 1.0, Some("new"));

        assert_eq!(id.as_deref(), Some("new"));
        let split = state.as_split().unwrap();
        assert_eq!(split.direction, SplitDirection::Horizontal);
        assert_eq!(split.panels[0].content.id(), "root");
        assert_eq!(split.panels[1].content.id(), "new");
        assert_eq!(weights(&state), vec![50.0, 50.0]);
    }

    #[test]
    fn add_panel_before_puts_new_panel_first() {
        let root = PanelState::empty("root");
        let (state, _) = add_panel(&root, "root", PanelSide::North, 0.5, Some("top"));
        let split = state.as_split().unwrap();
        assert_eq!(split.direction, SplitDirection::Vertical);
        assert_eq!(split.panels[0].content.id(), "top");
        assert_close(split.panels[0].default_weight, 100.0 / 3.0);
    }

    #[test]
    fn add_panel_on_same_axis_joins_the_split() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let (state, _) = add_panel(&state, "b", PanelSide::East, 1.0, Some("c"));

        let split = state.as_split().unwrap();
        let ids: Vec<_> = split.panels.iter().map(|c| c.content.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        let w = weights(&state);
        assert_close(w.iter().sum(), 100.0);
        assert_close(w[0], 100.0 / 3.0);
        assert_close(w[2], 100.0 / 3.0);
    }

    #[test]
    fn add_panel_on_other_axis_nests() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let (state, _) = add_panel(&state, "b", PanelSide::South, 1.0, Some("c"));

        let split = state.as_split().unwrap();
        assert_eq!(split.panels.len(), 2);
        let nested = split.panels[1].content.as_split().unwrap();
        assert_eq!(nested.direction, SplitDirection::Vertical);
        assert_eq!(nested.panels[1].content.id(), "c");
    }

    #[test]
    fn add_panel_to_missing_target_is_a_noop() {
        let root = PanelState::empty("a");
        let (state, id) = add_panel(&root, "missing", PanelSide::East, 1.0, None);
        assert_eq!(state, root);
        assert_eq!(id, None);
    }

    #[test]
    fn removing_a_child_collapses_singleton_splits() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let state = remove_panel(&state, "b").unwrap();
        assert_eq!(state, root);
    }

    #[test]
    fn removing_rescales_remaining_siblings() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let (state, _) = add_panel(&state, "b", PanelSide::East, 1.0, Some("c"));
        let state = remove_panel(&state, "b").unwrap();

        let w = weights(&state);
        assert_eq!(w.len(), 2);
        assert_close(w.iter().sum(), 100.0);
        assert_close(w[0], 50.0);
    }

    #[test]
    fn removing_the_root_leaves_nothing() {
        assert_eq!(remove_panel(&PanelState::empty("a"), "a"), None);
    }

    #[test]
    fn live_weights_are_padded_and_rescaled() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let (state, _) = add_panel(&state, "b", PanelSide::East, 1.0, Some("c"));
        state.as_split().unwrap().handle.set_live_weights(vec![20.0, 40.0]);

        let updated = update_default_weights(&state);
        let w = weights(&updated);
        assert_close(w[0], 20.0 * 100.0 / 90.0);
        assert_close(w[2], 30.0 * 100.0 / 90.0);
        assert_close(w.iter().sum(), 100.0);
    }

    #[test]
    fn balance_scales_oversized_weights() {
        let children = vec![
            SplitChild {
                default_weight: 100.0,
                content: PanelState::empty("a"),
            },
            SplitChild {
                default_weight: 100.0,
                content: PanelState::empty("b"),
            },
        ];
        let balanced = balance_default_weights(children);
        assert_close(balanced[0].default_weight, 49.5);
        assert_close(balanced[1].default_weight, 50.5);
    }

    #[test]
    fn data_uses_live_weights_when_reported() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        state.as_split().unwrap().handle.set_live_weights(vec![25.0, 75.0]);

        let PanelData::Split { panels, .. } = panel_state_to_data(&state) else {
            panic!("expected a split");
        };
        assert_eq!(panels[0].weight, 25.0);
        assert_eq!(panels[1].weight, 75.0);
    }

    #[test]
    fn modify_tabs_only_touches_the_target() {
        let root = PanelState::empty("a");
        let (state, _) = add_panel(&root, "a", PanelSide::East, 1.0, Some("b"));
        let state = modify_tabs(&state, "b", &mut |panel| TabsPanelState {
            tabs: vec![TabState::new("x")],
            ..panel.clone()
        });

        let tabs: Vec<_> = state_tabs(&state).into_iter().map(|t| t.id).collect();
        assert_eq!(tabs, vec!["x"]);
        assert_eq!(state_tab_panels(&state).len(), 2);
        assert_eq!(state_panels(&state).len(), 3);
    }
}
