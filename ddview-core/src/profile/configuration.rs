//! Profiles: named layouts that can be switched between and persisted.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::data::{Profile, ProfilesData};
use super::storage::Storage;
use crate::error::ProfileError;
use crate::mutator::{chain, Mutator};
use crate::reactive::{Derived, Field, Watchable};
use crate::views::ViewManager;

struct ConfigurationInner<S, St> {
    views: ViewManager,
    storage: St,
    profiles: Field<IndexMap<String, Profile>>,
    profile_id: Field<String>,
    profile_name: Field<String>,
    settings: Field<S>,
    profile_list: Derived<Vec<Profile>>,
}

impl<S, St> ConfigurationInner<S, St>
where
    S: Serialize + DeserializeOwned + Clone + PartialEq + 'static,
    St: Storage + 'static,
{
    fn profile_data(&self) -> Profile {
        Profile {
            id: self.profile_id.get(),
            name: self.profile_name.get(),
            layout: self.views.layout().get(),
            recovery: self.views.category_recovery().get(),
            views: self
                .views
                .all()
                .get()
                .values()
                .map(|view| view.serialize())
                .collect(),
        }
    }

    fn load_profile(&self, profile: &Profile) -> Mutator {
        let views = self.views.clone();
        let (name, id) = (self.profile_name.clone(), self.profile_id.clone());
        let profile = profile.clone();
        chain(move |tx| {
            debug!(profile = %profile.id, "loading profile");
            tx.push(name.set(profile.name));
            tx.push(id.set(profile.id));
            for data in &profile.views {
                match views.get(&data.id) {
                    Some(view) => tx.push(view.deserialize(data)),
                    None => warn!(view = %data.id, "profile references an unknown view"),
                }
            }
            tx.push(views.load_layout(&profile.layout));
            tx.push(views.category_recovery().set(profile.recovery));
        })
    }

    fn save_profiles_data(&self) -> Result<(), ProfileError> {
        let data = ProfilesData {
            selected: self.profile_id.get(),
            profiles: self.profile_list.get(),
            settings: Some(self.settings.get()),
        };
        self.storage.save(&serde_json::to_string(&data)?);
        Ok(())
    }

    fn read_profiles_data(&self) -> Result<Option<ProfilesData<S>>, ProfileError> {
        match self.storage.load() {
            Some(text) if !text.trim().is_empty() => Ok(Some(serde_json::from_str(&text)?)),
            _ => Ok(None),
        }
    }
}

/// The configuration of the application: global settings plus a set of
/// profiles, each with its own layout and view states.
///
/// Cloning produces another handle to the same configuration.
pub struct ConfigurationState<S, St> {
    inner: Rc<ConfigurationInner<S, St>>,
}

impl<S, St> ConfigurationState<S, St>
where
    S: Serialize + DeserializeOwned + Clone + PartialEq + 'static,
    St: Storage + 'static,
{
    /// Create a configuration that loads profiles into `views` and persists
    /// them in `storage`. Nothing is read from storage until
    /// [`load_profiles_data`](Self::load_profiles_data) is committed.
    pub fn new(views: ViewManager, storage: St, settings: S) -> Self {
        let profiles = Field::new(IndexMap::<String, Profile>::new());
        let source = profiles.clone();
        let profile_list =
            Derived::new(move |watch, _| watch.watch(&source).values().cloned().collect());

        Self {
            inner: Rc::new(ConfigurationInner {
                views,
                storage,
                profiles,
                profile_id: Field::new("default".to_string()),
                profile_name: Field::new("default".to_string()),
                settings: Field::new(settings),
                profile_list,
            }),
        }
    }

    pub fn view_manager(&self) -> &ViewManager {
        &self.inner.views
    }

    pub fn storage(&self) -> &St {
        &self.inner.storage
    }

    /// The global settings.
    pub fn settings(&self) -> &Field<S> {
        &self.inner.settings
    }

    /// The id of the loaded profile.
    pub fn profile_id(&self) -> Derived<String> {
        self.inner.profile_id.readonly()
    }

    /// The name of the loaded profile.
    pub fn profile_name(&self) -> Derived<String> {
        self.inner.profile_name.readonly()
    }

    /// The saved profiles.
    pub fn profiles(&self) -> Derived<Vec<Profile>> {
        self.inner.profile_list.clone()
    }

    /// Rename the loaded profile.
    pub fn set_profile_name(&self, name: &str) -> Mutator {
        let inner = Rc::clone(&self.inner);
        let name = name.to_string();
        chain(move |tx| {
            tx.push(inner.profile_name.set(name.clone()));
            let id = inner.profile_id.get();
            let mut profiles = inner.profiles.get();
            if let Some(profile) = profiles.get_mut(&id) {
                profile.name = name;
            }
            tx.push(inner.profiles.set(profiles));
        })
    }

    /// Delete a profile. Deleting the loaded profile loads another one
    /// first; the only remaining profile cannot be deleted.
    ///
    /// Results in whether the profile was deleted.
    pub fn delete_profile(&self, id: &str) -> Mutator<bool> {
        let inner = Rc::clone(&self.inner);
        let id = id.to_string();
        chain(move |tx| {
            if inner.profile_id.get() == id {
                let next = inner
                    .profile_list
                    .get()
                    .into_iter()
                    .find(|profile| profile.id != id);
                let Some(next) = next else {
                    return false;
                };
                tx.push(inner.load_profile(&next));
            }

            let mut profiles = inner.profiles.get();
            profiles.shift_remove(&id);
            tx.push(inner.profiles.set(profiles));
            true
        })
    }

    /// Make the current layout a new profile, select it, and save it.
    /// A random id is used unless one is given.
    pub fn add_and_select_profile(&self, name: &str, id: Option<&str>) -> Mutator {
        let this = self.clone();
        let name = name.to_string();
        let id = id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
        chain(move |tx| {
            tx.push(this.inner.profile_name.set(name));
            tx.push(this.inner.profile_id.set(id));
            tx.push(this.save_profile());
        })
    }

    /// Load a profile's layout and view states.
    pub fn load_profile(&self, profile: &Profile) -> Mutator {
        self.inner.load_profile(profile)
    }

    /// The current state as a profile.
    pub fn profile_data(&self) -> Profile {
        self.inner.profile_data()
    }

    /// Store the current state under the loaded profile and write all
    /// profiles to storage.
    pub fn save_profile(&self) -> Mutator {
        let inner = Rc::clone(&self.inner);
        chain(move |tx| {
            let profile = inner.profile_data();
            let mut profiles = inner.profiles.get();
            profiles.insert(profile.id.clone(), profile);
            tx.push(inner.profiles.set(profiles));
            if let Err(err) = inner.save_profiles_data() {
                error!(error = %err, "failed to save profiles");
            }
        })
    }

    /// Forget all profiles and clear the storage.
    pub fn clear_profiles(&self) -> Mutator {
        let inner = Rc::clone(&self.inner);
        chain(move |tx| {
            tx.push(inner.profiles.set(IndexMap::new()));
            inner.storage.save("");
        })
    }

    /// Load the profiles and settings from storage, and the selected
    /// profile into the view manager.
    ///
    /// Results in whether stored data was loaded. Malformed data is logged
    /// and the state from before the call is restored.
    pub fn load_profiles_data(&self) -> Mutator<bool> {
        let inner = Rc::clone(&self.inner);
        chain(move |tx| {
            let initial = inner.profile_data();
            let data = match inner.read_profiles_data() {
                Ok(Some(data)) => data,
                Ok(None) => return false,
                Err(err) => {
                    error!(error = %err, "failed to load stored profiles");
                    tx.push(inner.load_profile(&initial));
                    return false;
                }
            };

            if let Some(settings) = data.settings {
                tx.push(inner.settings.set(settings));
            }
            let selected = data
                .profiles
                .iter()
                .find(|profile| profile.id == data.selected)
                .cloned();
            let profiles = data
                .profiles
                .into_iter()
                .map(|profile| (profile.id.clone(), profile))
                .collect();
            tx.push(inner.profiles.set(profiles));

            if let Some(selected) = selected {
                tx.push(inner.load_profile(&selected));
            }
            true
        })
    }
}

impl<S, St> Clone for ConfigurationState<S, St> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, St> fmt::Debug for ConfigurationState<S, St> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationState")
            .field("profile_id", &self.inner.profile_id)
            .field("settings", &self.inner.settings)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
