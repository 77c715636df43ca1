use super::Result;
use crate::api::client::TokenProvider;
use serde::{Deserialize, Serialize};

#[cfg(not(test))]
use keyring::Entry;

const KEYRING_SERVICE: &str = "sqlr-cli";

/// Per-profile credential set. The bearer token lives in the OS keyring;
/// this struct is the in-memory view loaded at startup.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Credentials {
    session_token: Option<String>,
    pub profile_name: String,
}

impl Credentials {
    pub fn new(profile_name: String) -> Self {
        Self {
            session_token: None,
            profile_name,
        }
    }

    pub fn load(profile_name: &str) -> Result<Self> {
        let mut credentials = Self::new(profile_name.to_string());
        credentials.session_token = credentials.load_entry("token")?;
        Ok(credentials)
    }

    pub fn get_session_token(&self) -> Option<String> {
        self.session_token.clone()
    }

    pub fn set_session_token(&mut self, token: Option<String>) {
        self.session_token = token;
    }

    pub fn has_session(&self) -> bool {
        self.session_token.is_some()
    }

    // used by auth login
    pub fn save_token_for_profile(profile_name: &str, token: &str) -> Result<()> {
        let mut credentials = Self::new(profile_name.to_string());
        credentials.session_token = Some(token.to_string());
        credentials.save_entry("token", &credentials.session_token)?;
        Ok(())
    }

    // used by auth logout
    pub fn clear_token_for_profile(profile_name: &str) -> Result<()> {
        let credentials = Self::new(profile_name.to_string());
        credentials.delete_entry("token")?;
        Ok(())
    }

    #[cfg(not(test))]
    fn load_entry(&self, key_type: &str) -> Result<Option<String>> {
        let entry = Entry::new(
            KEYRING_SERVICE,
            &format!("{}-{}", key_type, self.profile_name),
        )
        .map_err(|e| crate::error::StorageError::KeyringError(e.to_string()))?;

        match entry.get_password() {
            Ok(v) => Ok(Some(v)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(crate::error::StorageError::KeyringError(e.to_string())),
        }
    }

    #[cfg(not(test))]
    fn save_entry(&self, key_type: &str, value: &Option<String>) -> Result<()> {
        if let Some(v) = value {
            let key_name = format!("{}-{}", key_type, self.profile_name);

            let entry = Entry::new(KEYRING_SERVICE, &key_name)
                .map_err(|e| crate::error::StorageError::KeyringError(e.to_string()))?;

            entry
                .set_password(v)
                .map_err(|e| crate::error::StorageError::KeyringError(e.to_string()))?;
        }

        Ok(())
    }

    #[cfg(not(test))]
    fn delete_entry(&self, key_type: &str) -> Result<()> {
        let key_name = format!("{}-{}", key_type, self.profile_name);

        let entry = Entry::new(KEYRING_SERVICE, &key_name)
            .map_err(|e| crate::error::StorageError::KeyringError(e.to_string()))?;

        match entry.delete_credential() {
            Ok(_) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                // Entry doesn't exist, which is fine for logout
                Ok(())
            }
            Err(e) => Err(crate::error::StorageError::KeyringError(e.to_string())),
        }
    }

    #[cfg(test)]
    fn load_entry(&self, key_type: &str) -> Result<Option<String>> {
        println!(
            "MOCK: Loading {} for profile {}",
            key_type, self.profile_name
        );
        Ok(None)
    }

    #[cfg(test)]
    fn save_entry(&self, key_type: &str, value: &Option<String>) -> Result<()> {
        if let Some(v) = value {
            println!(
                "MOCK: Saving {} = '{}' for profile {}",
                key_type, v, self.profile_name
            );
        }
        Ok(())
    }

    #[cfg(test)]
    fn delete_entry(&self, key_type: &str) -> Result<()> {
        println!(
            "MOCK: Deleting {} for profile {}",
            key_type, self.profile_name
        );
        Ok(())
    }
}

impl TokenProvider for Credentials {
    fn token(&self) -> Option<String> {
        self.session_token.clone()
    }
}
