use serde::{Deserialize, Serialize};

use crate::layout::PanelData;
use crate::views::{BaseViewSerialization, CategoryRecovery};

/// A named snapshot of the layout and the state of its views.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub layout: PanelData,
    #[serde(default)]
    pub recovery: CategoryRecovery,
    #[serde(default)]
    pub views: Vec<BaseViewSerialization>,
}

/// Everything kept in storage: all profiles, the selected one, and the
/// global settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfilesData<S> {
    pub selected: String,
    pub profiles: Vec<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<S>,
}
