//! The in-memory censorship model.
//!
//! Three collections decide whether a message is deleted on sight:
//!
//! | Collection | Scope | Meaning |
//! |------------|-------|---------|
//! | `specific` | per chat | users whose messages are always deleted there |
//! | `mass` | global | chats where everyone is censored |
//! | `immune` | global | users exempt from mass censorship |
//!
//! Specific targeting always wins over immunity.
//!
//! # Example
//!
//! ```
//! use chatmod::core::CensorshipState;
//! use chatmod::message::{ChatId, UserId};
//!
//! let mut state = CensorshipState::new();
//! let (chat, user) = (ChatId(-100), UserId(7));
//!
//! assert!(state.enable_mass(chat));
//! assert!(state.is_censored(chat, user));
//!
//! state.grant_immunity(user);
//! assert!(!state.is_censored(chat, user));
//!
//! state.censor_specific(chat, user);
//! assert!(state.is_censored(chat, user));
//! ```
//!
//! Every mutation returns `true` when it changed something, so callers know
//! whether the state needs persisting.

use std::collections::{BTreeMap, BTreeSet};

use crate::message::{ChatId, UserId};

/// Which chats and users are censored, and who is immune.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CensorshipState {
    specific: BTreeMap<ChatId, BTreeSet<UserId>>,
    mass: BTreeSet<ChatId>,
    immune: BTreeSet<UserId>,
}

impl CensorshipState {
    /// Creates an empty state: nothing censored, nobody immune.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from its three collections.
    ///
    /// Empty per-chat sets are dropped; they read the same as absent ones.
    pub fn from_parts(
        specific: BTreeMap<ChatId, BTreeSet<UserId>>,
        mass: BTreeSet<ChatId>,
        immune: BTreeSet<UserId>,
    ) -> Self {
        let specific = specific
            .into_iter()
            .filter(|(_, users)| !users.is_empty())
            .collect();
        Self {
            specific,
            mass,
            immune,
        }
    }

    /// Returns `true` if messages from `user` in `chat` must be deleted.
    pub fn is_censored(&self, chat: ChatId, user: UserId) -> bool {
        (self.mass.contains(&chat) && !self.immune.contains(&user))
            || self
                .specific
                .get(&chat)
                .is_some_and(|users| users.contains(&user))
    }

    // =========================================================================
    // Specific censorship
    // =========================================================================

    /// Starts censoring `user` in `chat`.
    pub fn censor_specific(&mut self, chat: ChatId, user: UserId) -> bool {
        self.specific.entry(chat).or_default().insert(user)
    }

    /// Stops censoring `user` in `chat`. A no-op if either is unknown.
    pub fn free_specific(&mut self, chat: ChatId, user: UserId) -> bool {
        let Some(users) = self.specific.get_mut(&chat) else {
            return false;
        };
        let removed = users.remove(&user);
        if users.is_empty() {
            self.specific.remove(&chat);
        }
        removed
    }

    /// Users individually censored in `chat`.
    pub fn list_specific(&self, chat: ChatId) -> BTreeSet<UserId> {
        self.specific.get(&chat).cloned().unwrap_or_default()
    }

    // =========================================================================
    // Mass censorship
    // =========================================================================

    /// Censors everyone in `chat` except immune users.
    pub fn enable_mass(&mut self, chat: ChatId) -> bool {
        self.mass.insert(chat)
    }

    /// Lifts mass censorship. A no-op if `chat` was not mass-censored.
    pub fn disable_mass(&mut self, chat: ChatId) -> bool {
        self.mass.remove(&chat)
    }

    pub fn is_mass(&self, chat: ChatId) -> bool {
        self.mass.contains(&chat)
    }

    // =========================================================================
    // Immunity
    // =========================================================================

    pub fn grant_immunity(&mut self, user: UserId) -> bool {
        self.immune.insert(user)
    }

    pub fn revoke_immunity(&mut self, user: UserId) -> bool {
        self.immune.remove(&user)
    }

    pub fn is_immune(&self, user: UserId) -> bool {
        self.immune.contains(&user)
    }

    /// Users exempt from mass censorship.
    pub fn list_immune(&self) -> BTreeSet<UserId> {
        self.immune.clone()
    }

    // =========================================================================
    // Raw views (used by the snapshot store)
    // =========================================================================

    pub fn specific(&self) -> &BTreeMap<ChatId, BTreeSet<UserId>> {
        &self.specific
    }

    pub fn mass(&self) -> &BTreeSet<ChatId> {
        &self.mass
    }

    pub fn immune(&self) -> &BTreeSet<UserId> {
        &self.immune
    }

    /// Returns `true` if nothing is censored and nobody is immune.
    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.mass.is_empty() && self.immune.is_empty()
    }
}
