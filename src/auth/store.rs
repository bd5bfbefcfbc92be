//! Persisted session state.
//!
//! Three entries live under the session directory, one file per key:
//! `access_token`, `refresh_token` and `user_data` (the JSON-encoded
//! profile). The trio is written on login, the access token alone is
//! overwritten on refresh, and everything is removed on logout.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::UserProfile;

/// Storage key for the bearer token sent with authenticated requests
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the token exchanged for new access tokens
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the cached JSON-encoded user profile
pub const USER_DATA_KEY: &str = "user_data";

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read session entry {}", key)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        std::fs::write(self.entry_path(key), value)
            .with_context(|| format!("Failed to write session entry {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove session entry {}", key)),
        }
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY)
    }

    /// Parse the cached profile. A present-but-unparsable entry is an error,
    /// which callers treat the same as an invalid token.
    pub fn cached_profile(&self) -> Result<Option<UserProfile>> {
        match self.read(USER_DATA_KEY)? {
            Some(contents) => {
                let profile = serde_json::from_str(&contents)
                    .context("Failed to parse cached user profile")?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    /// Persist the full credential pair plus profile after a login.
    pub fn store_login(
        &self,
        access_token: &str,
        refresh_token: &str,
        profile: &UserProfile,
    ) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, access_token)?;
        self.write(REFRESH_TOKEN_KEY, refresh_token)?;
        let user_data =
            serde_json::to_string(profile).context("Failed to encode user profile")?;
        self.write(USER_DATA_KEY, &user_data)
    }

    /// Overwrite only the access token after a refresh.
    pub fn store_access_token(&self, access_token: &str) -> Result<()> {
        self.write(ACCESS_TOKEN_KEY, access_token)
    }

    /// Remove all three entries. Missing entries are not an error.
    pub fn clear(&self) -> Result<()> {
        self.remove(ACCESS_TOKEN_KEY)?;
        self.remove(REFRESH_TOKEN_KEY)?;
        self.remove(USER_DATA_KEY)
    }
}
