//! Location hints: where to open a view in the layout.
//!
//! A view carries a prioritized list of hints. When the view is opened, the
//! first hint whose target can be found in the current layout wins.

use std::fmt;

use crate::layout::{DropSide, PanelData, SplitDirection};

/// What a hint's `target_id` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetType {
    Panel,
    View,
    Category,
}

/// A tab to position relative to, by index or by id.
#[derive(Clone, Debug, PartialEq)]
pub enum TabTarget {
    Index(usize),
    /// A view id, or a category when the hint targets a category.
    Id(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TabPosition {
    Before,
    After,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TabIndexHint {
    pub target: TabTarget,
    pub position: TabPosition,
}

/// A placement suggestion for a view.
///
/// All fields are optional. A hint without a target always resolves; one
/// without a side opens the view in the target panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationHint {
    /// The panel, view or category to look for.
    pub target_id: Option<String>,
    /// What `target_id` refers to; any kind if unset.
    pub target_type: Option<TargetType>,
    /// Where to insert the tab among the target panel's tabs.
    pub tab_index: Option<TabIndexHint>,
    /// The id of a panel to create, if one must be created.
    pub create_id: Option<String>,
    /// The side of the target to open a new panel at.
    pub side: Option<DropSide>,
    /// Size of a created panel relative to an average sibling.
    pub weight_ratio: Option<f64>,
    /// Free-form label for debugging.
    pub tag: Option<String>,
}

impl LocationHint {
    pub fn panel(id: impl Into<String>) -> Self {
        Self {
            target_id: Some(id.into()),
            target_type: Some(TargetType::Panel),
            ..Self::default()
        }
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            target_id: Some(category.into()),
            target_type: Some(TargetType::Category),
            ..Self::default()
        }
    }

    pub fn create(id: impl Into<String>) -> Self {
        Self {
            create_id: Some(id.into()),
            ..Self::default()
        }
    }
}

impl fmt::Display for LocationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target_id, &self.target_type) {
            (Some(id), Some(kind)) => write!(f, "{kind:?} {id}")?,
            (Some(id), None) => write!(f, "{id}")?,
            (None, _) => write!(f, "root")?,
        }
        if let Some(side) = self.side {
            write!(f, " {side:?}")?;
        }
        if let Some(id) = &self.create_id {
            write!(f, " (create {id})")?;
        }
        Ok(())
    }
}

/// Hints for views that take up the main area.
pub fn main_location_hints() -> Vec<LocationHint> {
    vec![LocationHint::panel("default"), LocationHint::create("default")]
}

/// Hints for views that live in the primary sidebar.
pub fn sidebar_location_hints() -> Vec<LocationHint> {
    vec![
        LocationHint::panel("sidebar"),
        LocationHint {
            create_id: Some("sidebar".into()),
            target_id: Some("default".into()),
            weight_ratio: Some(0.7),
            side: Some(DropSide::West),
            ..LocationHint::default()
        },
        LocationHint {
            create_id: Some("sidebar".into()),
            weight_ratio: Some(0.7),
            side: Some(DropSide::West),
            ..LocationHint::default()
        },
    ]
}

/// Hints to reopen `target_id` where it was in `layout`, based on the panels
/// and tabs that were around it.
///
/// In order: the panel that held the tab; the tabs around it, nearest first;
/// then, for each split containing the tab from the innermost outward, the
/// panels of its sibling branches, nearest first, with a side and size that
/// recreate the former branch.
pub fn neighbor_hints(target_id: &str, layout: &PanelData) -> Vec<LocationHint> {
    let mut hints = Vec::new();
    collect_neighbor_hints(target_id, layout, &mut hints);
    hints
}

fn collect_neighbor_hints(target_id: &str, panel: &PanelData, out: &mut Vec<LocationHint>) -> bool {
    let tag = Some(format!("neighbor of {target_id}"));
    match panel {
        PanelData::Tabs { id, tabs, .. } => {
            let Some(index) = tabs.iter().position(|tab| tab == target_id) else {
                return false;
            };
            out.push(LocationHint {
                target_id: Some(id.clone()),
                tag: tag.clone(),
                ..LocationHint::default()
            });

            for distance in 1..tabs.len() {
                if distance > index && index + distance >= tabs.len() {
                    break;
                }
                if let Some(before) = index.checked_sub(distance).map(|i| &tabs[i]) {
                    out.push(tab_hint(before, TabPosition::After, &tag));
                }
                if let Some(after) = tabs.get(index + distance) {
                    out.push(tab_hint(after, TabPosition::Before, &tag));
                }
            }
            true
        }
        PanelData::Split {
            direction, panels, ..
        } => {
            let mut found = false;
            for (index, child) in panels.iter().enumerate() {
                if !collect_neighbor_hints(target_id, &child.content, out) {
                    continue;
                }
                found = true;

                let others = panels.len().saturating_sub(1).max(1) as f64;
                let average = (100.0 - child.weight) / others;
                let weight_ratio = (average > 0.0).then(|| child.weight / average);
                let (side_before, side_after) = match direction {
                    SplitDirection::Horizontal => (DropSide::East, DropSide::West),
                    SplitDirection::Vertical => (DropSide::South, DropSide::North),
                };
                let create_id = Some(child.content.id().to_string());

                let sibling_hint = |panel: &PanelData, side| LocationHint {
                    target_id: Some(panel.id().to_string()),
                    target_type: Some(TargetType::Panel),
                    create_id: create_id.clone(),
                    side: Some(side),
                    weight_ratio,
                    tag: tag.clone(),
                    ..LocationHint::default()
                };

                for distance in 1..panels.len() {
                    if distance > index && index + distance >= panels.len() {
                        break;
                    }
                    if let Some(before) = index.checked_sub(distance).map(|i| &panels[i]) {
                        for panel in before.content.panels() {
                            out.push(sibling_hint(panel, side_before));
                        }
                    }
                    if let Some(after) = panels.get(index + distance) {
                        for panel in after.content.panels() {
                            out.push(sibling_hint(panel, side_after));
                        }
                    }
                }
            }
            found
        }
    }
}

fn tab_hint(tab: &str, position: TabPosition, tag: &Option<String>) -> LocationHint {
    LocationHint {
        target_id: Some(tab.to_string()),
        target_type: Some(TargetType::View),
        tab_index: Some(TabIndexHint {
            target: TabTarget::Id(tab.to_string()),
            position,
        }),
        tag: tag.clone(),
        ..LocationHint::default()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SplitChildData;

    fn tabs(id: &str, tabs: &[&str]) -> PanelData {
        PanelData::Tabs {
            id: id.into(),
            tabs: tabs.iter().map(|t| t.to_string()).collect(),
            selected: None,
        }
    }

    fn summary(hints: &[LocationHint]) -> Vec<String> {
        hints.iter().map(|hint| hint.to_string()).collect()
    }

    #[test]
    fn tab_neighbors_are_ordered_by_distance() {
        let layout = tabs("p", &["a", "b", "target", "c"]);
        let hints = neighbor_hints("target", &layout);

        assert_eq!(hints[0].target_id.as_deref(), Some("p"));
        assert_eq!(hints[0].target_type, None);
        let neighbors: Vec<_> = hints[1..]
            .iter()
            .map(|h| {
                let index = h.tab_index.as_ref().unwrap();
                (h.target_id.clone().unwrap(), index.position)
            })
            .collect();
        assert_eq!(
            neighbors,
            vec![
                ("b".to_string(), TabPosition::After),
                ("c".to_string(), TabPosition::Before),
                ("a".to_string(), TabPosition::After),
            ]
        );
    }

    #[test]
    fn missing_targets_produce_no_hints() {
        assert!(neighbor_hints("x", &tabs("p", &["a"])).is_empty());
    }

    #[test]
    fn split_siblings_recreate_the_branch() {
        let layout = PanelData::Split {
            id: "s".into(),
            direction: SplitDirection::Horizontal,
            panels: vec![
                SplitChildData {
                    weight: 20.0,
                    content: tabs("left", &["target"]),
                },
                SplitChildData {
                    weight: 40.0,
                    content: tabs("middle", &["m"]),
                },
                SplitChildData {
                    weight: 40.0,
                    content: tabs("right", &[]),
                },
            ],
        };
        let hints = neighbor_hints("target", &layout);

        assert_eq!(
            summary(&hints),
            vec![
                "left",
                "Panel middle West (create left)",
                "Panel right West (create left)",
            ]
        );
        assert_eq!(hints[1].weight_ratio, Some(0.5));
    }

    #[test]
    fn nested_splits_walk_outward() {
        let layout = PanelData::Split {
            id: "outer".into(),
            direction: SplitDirection::Vertical,
            panels: vec![
                SplitChildData {
                    weight: 50.0,
                    content: tabs("top", &[]),
                },
                SplitChildData {
                    weight: 50.0,
                    content: PanelData::Split {
                        id: "inner".into(),
                        direction: SplitDirection::Horizontal,
                        panels: vec![
                            SplitChildData {
                                weight: 50.0,
                                content: tabs("a", &[]),
                            },
                            SplitChildData {
                                weight: 50.0,
                                content: tabs("b", &["target"]),
                            },
                        ],
                    },
                },
            ],
        };

        assert_eq!(
            summary(&neighbor_hints("target", &layout)),
            vec![
                "b",
                "Panel a East (create b)",
                "Panel top South (create inner)",
            ]
        );
    }

    #[test]
    fn base_hints() {
        assert_eq!(main_location_hints()[0], LocationHint::panel("default"));
        let sidebar = sidebar_location_hints();
        assert_eq!(sidebar.len(), 3);
        assert_eq!(sidebar[1].side, Some(DropSide::West));
        assert_eq!(sidebar[2].target_id, None);
    }
}
