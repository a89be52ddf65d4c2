//! # Profile Directory
//!
//! The profile-lookup collaborator every mention and search operation
//! depends on. Implementations are passed in explicitly; nothing in the
//! core reaches for a shared client.
//!
//! All lookups are batched: one call covers every username or ID the caller
//! needs, so round trips stay constant regardless of mention count.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::mention::is_token_safe_id;
use crate::profile::{Profile, ProfileId, ProfileRef};

/// Batched profile lookups.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Resolve the given usernames. Unknown usernames are simply absent
    /// from the result.
    async fn profiles_by_usernames(&self, usernames: &[String]) -> Result<Vec<ProfileRef>>;

    /// Resolve the given IDs. Unknown IDs are absent from the result.
    async fn profiles_by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Profile>>;

    /// Profiles whose username or full name contains `query`,
    /// case-insensitively.
    async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>>;
}

/// In-memory directory.
///
/// Useful for embedding and tests. `set_unavailable(true)` makes every
/// lookup fail so degraded paths can be exercised.
#[derive(Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<Vec<Profile>>,
    unavailable: RwLock<bool>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory seeded with profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().collect()),
            unavailable: RwLock::new(false),
        }
    }

    /// Insert a profile, rejecting duplicate IDs and usernames and IDs a
    /// mention token cannot carry.
    pub fn insert(&self, profile: Profile) -> Result<()> {
        if !is_token_safe_id(profile.id.as_str()) {
            return Err(Error::InvalidProfileId(profile.id.to_string()));
        }
        let mut profiles = self.profiles.write();
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(Error::Conflict(format!("profile id {} exists", profile.id)));
        }
        if profiles.iter().any(|p| p.username == profile.username) {
            return Err(Error::Conflict(format!(
                "username {} is taken",
                profile.username
            )));
        }
        profiles.push(profile);
        Ok(())
    }

    /// Change a profile's username.
    pub fn rename(&self, id: &ProfileId, new_username: &str) -> Result<()> {
        let mut profiles = self.profiles.write();
        if profiles
            .iter()
            .any(|p| p.username == new_username && &p.id != id)
        {
            return Err(Error::Conflict(format!("username {} is taken", new_username)));
        }
        let profile = profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| Error::ProfileNotFound(id.to_string()))?;
        profile.username = new_username.to_string();
        Ok(())
    }

    /// Remove a profile (account deletion).
    pub fn remove(&self, id: &ProfileId) -> bool {
        let mut profiles = self.profiles.write();
        let before = profiles.len();
        profiles.retain(|p| &p.id != id);
        profiles.len() != before
    }

    /// Simulate an outage of the backing store.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.read() {
            return Err(Error::LookupFailed("profile directory unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryDirectory {
    async fn profiles_by_usernames(&self, usernames: &[String]) -> Result<Vec<ProfileRef>> {
        self.check_available()?;
        let wanted: HashSet<&str> = usernames.iter().map(String::as_str).collect();
        Ok(self
            .profiles
            .read()
            .iter()
            .filter(|p| wanted.contains(p.username.as_str()))
            .map(Profile::to_ref)
            .collect())
    }

    async fn profiles_by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Profile>> {
        self.check_available()?;
        let wanted: HashSet<&ProfileId> = ids.iter().collect();
        Ok(self
            .profiles
            .read()
            .iter()
            .filter(|p| wanted.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>> {
        self.check_available()?;
        Ok(self
            .profiles
            .read()
            .iter()
            .filter(|p| p.matches_text(query))
            .cloned()
            .collect())
    }
}


/// Test doubles shared by unit tests across the crate.
#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Directory that counts calls per lookup kind and accepts any ID.
    pub(crate) struct CountingDirectory {
        profiles: Vec<Profile>,
        username_lookups: AtomicUsize,
        id_lookups: AtomicUsize,
        searches: AtomicUsize,
    }

    impl CountingDirectory {
        pub(crate) fn new(profiles: impl IntoIterator<Item = Profile>) -> Self {
            Self {
                profiles: profiles.into_iter().collect(),
                username_lookups: AtomicUsize::new(0),
                id_lookups: AtomicUsize::new(0),
                searches: AtomicUsize::new(0),
            }
        }

        pub(crate) fn username_lookups(&self) -> usize {
            self.username_lookups.load(Ordering::SeqCst)
        }

        pub(crate) fn id_lookups(&self) -> usize {
            self.id_lookups.load(Ordering::SeqCst)
        }

        pub(crate) fn searches(&self) -> usize {
            self.searches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProfileDirectory for CountingDirectory {
        async fn profiles_by_usernames(&self, usernames: &[String]) -> Result<Vec<ProfileRef>> {
            self.username_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .profiles
                .iter()
                .filter(|p| usernames.contains(&p.username))
                .map(Profile::to_ref)
                .collect())
        }

        async fn profiles_by_ids(&self, ids: &[ProfileId]) -> Result<Vec<Profile>> {
            self.id_lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .profiles
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect())
        }

        async fn search_profiles(&self, query: &str) -> Result<Vec<Profile>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .profiles
                .iter()
                .filter(|p| p.matches_text(query))
                .cloned()
                .collect())
        }
    }
}
