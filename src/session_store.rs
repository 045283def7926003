// Session-scoped wizard state.
//
// The store owns the VehicleIdentity for one browser session and persists it
// as JSON under a fixed key in whatever SessionStorage backs it. A missing or
// unreadable entry is the Empty state, never an error.

use thiserror::Error;

use crate::models::VehicleIdentity;
use crate::wizard::{self, WizardStep};

pub const VEHICLE_DATA_KEY: &str = "vehicleData";

// Key/value storage scoped to one browser session.
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: String);
    fn remove_item(&mut self, key: &str);
}

// In-process backend; the store's own tests run against it
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    entries: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove_item(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("no persisted vehicle data")]
    Absent,
    #[error("persisted vehicle data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("persisted vehicle data has no VIN")]
    MissingVin,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize vehicle data: {0}")]
    Serialize(#[from] serde_json::Error),
}

// Externally observable condition of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Identified,
}

// Reads the persisted entry without touching the store.
pub fn hydrate<S: SessionStorage>(storage: &S) -> Result<VehicleIdentity, HydrationError> {
    let raw = storage.get_item(VEHICLE_DATA_KEY).ok_or(HydrationError::Absent)?;
    let identity: VehicleIdentity = serde_json::from_str(&raw)?;
    if identity.vin.trim().is_empty() {
        return Err(HydrationError::MissingVin);
    }
    Ok(identity)
}

#[derive(Debug)]
pub struct WizardSessionStore<S: SessionStorage> {
    storage: S,
    identity: Option<VehicleIdentity>,
}

impl<S: SessionStorage> WizardSessionStore<S> {
    // Hydrates from the persisted entry; any hydration failure yields Empty.
    pub fn new(storage: S) -> Self {
        let identity = match hydrate(&storage) {
            Ok(identity) => Some(identity),
            Err(HydrationError::Absent) => None,
            Err(e) => {
                tracing::debug!("Discarding persisted session entry: {}", e);
                None
            }
        };
        Self { storage, identity }
    }

    pub fn get_identity(&self) -> Option<&VehicleIdentity> {
        self.identity.as_ref()
    }

    pub fn state(&self) -> SessionState {
        if self.identity.is_some() {
            SessionState::Identified
        } else {
            SessionState::Empty
        }
    }

    /// Replaces the session identity. `Some` persists it under
    /// [`VEHICLE_DATA_KEY`]; `None` removes the persisted entry.
    ///
    /// Contents are not validated here; the VIN-entry step validates before
    /// calling this.
    pub fn set_identity(&mut self, identity: Option<VehicleIdentity>) -> Result<(), StoreError> {
        match identity {
            Some(identity) => {
                let json = serde_json::to_string(&identity)?;
                self.storage.set_item(VEHICLE_DATA_KEY, json);
                self.identity = Some(identity);
            }
            None => {
                self.storage.remove_item(VEHICLE_DATA_KEY);
                self.identity = None;
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.storage.remove_item(VEHICLE_DATA_KEY);
        self.identity = None;
    }

    pub fn can_render(&self, step: WizardStep) -> bool {
        wizard::can_render(step, self.get_identity())
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}
