//! Persistence for [`CensorshipState`].
//!
//! The snapshot is a JSON document with three keys:
//!
//! ```json
//! {
//!   "MASS": [-1001234],
//!   "FREE": [42],
//!   "SPEC": {"-1005678": [7, 8]}
//! }
//! ```
//!
//! JSON object keys are always strings, so `SPEC` keys are recast to chat ids
//! on load. Ids inside the lists are accepted either as numbers or as numeric
//! strings.
//!
//! # Failure policy
//!
//! Loading never fails from the caller's point of view: a missing snapshot is
//! created empty, and a corrupt one is logged and replaced by an empty state in
//! memory. Writes go to a sibling temp file that is renamed over the snapshot,
//! but there is no fsync, so a crash may still lose the last write.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::state::CensorshipState;
use crate::error::{ModError, Result};
use crate::message::{ChatId, UserId};

/// Where [`CensorshipState`] is loaded from and saved to.
///
/// Both methods are synchronous and [`Moderator`](crate::command::Moderator)
/// calls `save` from async handlers while holding the state lock, so
/// implementations must return quickly: a small local file or memory, not a
/// network round trip.
pub trait StateStore: Send + Sync {
    /// Returns the persisted state, or an empty one if it can't be read.
    fn load(&self) -> CensorshipState;

    /// Persists `state`, replacing the previous snapshot.
    fn save(&self, state: &CensorshipState) -> Result<()>;
}

/// An id as it may appear in a snapshot: a JSON number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Text(String),
}

impl RawId {
    fn coerce<T: From<i64>>(&self) -> std::result::Result<T, String> {
        match self {
            RawId::Num(n) => Ok(T::from(*n)),
            RawId::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(T::from)
                .map_err(|_| format!("'{}' is not an integer id", s)),
        }
    }
}

/// On-disk layout of the censorship snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(rename = "MASS", default)]
    mass: Vec<RawId>,

    #[serde(rename = "FREE", default)]
    free: Vec<RawId>,

    #[serde(rename = "SPEC", default)]
    spec: BTreeMap<String, Vec<RawId>>,
}

impl Snapshot {
    fn from_state(state: &CensorshipState) -> Self {
        Self {
            mass: state.mass().iter().map(|c| RawId::Num(c.0)).collect(),
            free: state.immune().iter().map(|u| RawId::Num(u.0)).collect(),
            spec: state
                .specific()
                .iter()
                .map(|(chat, users)| {
                    (
                        chat.to_string(),
                        users.iter().map(|u| RawId::Num(u.0)).collect(),
                    )
                })
                .collect(),
        }
    }

    fn into_state(self) -> std::result::Result<CensorshipState, String> {
        let mass = self
            .mass
            .iter()
            .map(RawId::coerce::<ChatId>)
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        let immune = self
            .free
            .iter()
            .map(RawId::coerce::<UserId>)
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;

        let mut specific = BTreeMap::new();
        for (key, users) in &self.spec {
            let chat = ChatId::from_str(key)
                .map_err(|_| format!("SPEC key '{}' is not a chat id", key))?;
            let users = users
                .iter()
                .map(RawId::coerce::<UserId>)
                .collect::<std::result::Result<BTreeSet<_>, _>>()?;
            specific.insert(chat, users);
        }

        Ok(CensorshipState::from_parts(specific, mass, immune))
    }
}

/// Serializes a state into the snapshot JSON layout.
pub fn to_json(state: &CensorshipState) -> Result<String> {
    Ok(serde_json::to_string(&Snapshot::from_state(state))?)
}

/// Parses a snapshot JSON document.
pub fn from_json(content: &str) -> Result<CensorshipState> {
    let snapshot: Snapshot = serde_json::from_str(content)?;
    snapshot
        .into_state()
        .map_err(|reason| ModError::load("<memory>", reason))
}

/// JSON file snapshot store.
///
/// # Example
///
/// ```rust
/// use chatmod::core::{CensorshipState, JsonStateStore, StateStore};
/// use chatmod::message::{ChatId, UserId};
///
/// # fn main() -> chatmod::Result<()> {
/// let dir = tempfile::tempdir()?;
/// let store = JsonStateStore::new(dir.path().join("censoring.json"));
///
/// let mut state = store.load(); // creates an empty snapshot
/// state.censor_specific(ChatId(-1), UserId(2));
/// store.save(&state)?;
///
/// assert_eq!(store.load(), state);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the snapshot, surfacing every fault.
    ///
    /// Use [`StateStore::load`] for the recovering variant.
    pub fn try_load(&self) -> Result<CensorshipState> {
        let content = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|e| ModError::load(&self.path, e.to_string()))?;
        snapshot
            .into_state()
            .map_err(|reason| ModError::load(&self.path, reason))
    }

    fn write(&self, state: &CensorshipState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = to_json(state)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> CensorshipState {
        match self.try_load() {
            Ok(state) => {
                debug!(path = %self.path.display(), "loaded censorship state");
                state
            }
            Err(ModError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no censorship state found, creating one");
                let state = CensorshipState::new();
                if let Err(e) = self.write(&state) {
                    error!(path = %self.path.display(), error = %e, "failed to create censorship state");
                }
                state
            }
            Err(e) => {
                error!(error = %e, "failed to load ongoing censor data");
                CensorshipState::new()
            }
        }
    }

    fn save(&self, state: &CensorshipState) -> Result<()> {
        self.write(state)
    }
}

/// Store that keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    snapshot: Mutex<Option<String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store with a snapshot document.
    pub fn with_snapshot(content: impl Into<String>) -> Self {
        Self {
            snapshot: Mutex::new(Some(content.into())),
        }
    }

    /// The last saved document, if any.
    pub fn snapshot(&self) -> Option<String> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> CensorshipState {
        match self.snapshot() {
            Some(content) => from_json(&content).unwrap_or_else(|e| {
                error!(error = %e, "failed to load ongoing censor data");
                CensorshipState::new()
            }),
            None => CensorshipState::new(),
        }
    }

    fn save(&self, state: &CensorshipState) -> Result<()> {
        let content = to_json(state)?;
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = Some(content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_state() -> CensorshipState {
        let mut state = CensorshipState::new();
        state.censor_specific(ChatId(-1001), UserId(7));
        state.censor_specific(ChatId(-1001), UserId(8));
        state.censor_specific(ChatId(55), UserId(9));
        state.enable_mass(ChatId(-2002));
        state.grant_immunity(UserId(42));
        state
    }

    #[test]
    fn test_snapshot_layout() {
        let json = to_json(&sample_state()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["MASS"], serde_json::json!([-2002]));
        assert_eq!(value["FREE"], serde_json::json!([42]));
        assert_eq!(value["SPEC"]["-1001"], serde_json::json!([7, 8]));
        assert_eq!(value["SPEC"]["55"], serde_json::json!([9]));
    }

    #[test]
    fn test_from_json_recasts_string_ids() {
        let state =
            from_json(r#"{"MASS": ["-5"], "FREE": [1, "2"], "SPEC": {"-5": [3, 3]}}"#).unwrap();
        assert!(state.is_mass(ChatId(-5)));
        assert!(state.is_immune(UserId(2)));
        assert_eq!(state.list_specific(ChatId(-5)), BTreeSet::from([UserId(3)]));
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        let err = from_json(r#"{"MASS": [], "FREE": [], "SPEC": {"general": [1]}}"#).unwrap_err();
        assert!(err.to_string().contains("general"));
    }

    #[test]
    fn test_from_json_missing_sections_default_empty() {
        let state = from_json("{}").unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_load_missing_file_creates_empty_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("censoring.json");
        let store = JsonStateStore::new(&path);

        let state = store.load();
        assert!(state.is_empty());
        assert!(path.exists());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"{"MASS":[],"FREE":[],"SPEC":{}}"#
        );
    }

    #[test]
    fn test_load_corrupt_file_yields_empty_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("censoring.json");
        fs::write(&path, "{ not json").unwrap();
        let store = JsonStateStore::new(&path);

        assert!(store.load().is_empty());
        assert!(matches!(store.try_load(), Err(ModError::Load { .. })));
        // corrupt snapshot is left untouched for inspection
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("censoring.json"));
        let state = sample_state();

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
        assert!(!dir.path().join("censoring.json.tmp").exists());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStateStore::new();
        assert!(store.load().is_empty());
        store.save(&sample_state()).unwrap();
        assert_eq!(store.load(), sample_state());
    }

    #[test]
    fn test_memory_store_corrupt_snapshot() {
        let store = MemoryStateStore::with_snapshot("[]");
        assert!(store.load().is_empty());
    }
}
