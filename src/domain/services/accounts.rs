#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;

use std::sync::Arc;

use rand::Rng;
use sha2::Digest;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::identity;
use super::TranscriptMirror;
use crate::domain::models::AccountError;
use crate::domain::models::MirrorError;
use crate::domain::models::Speaker;
use crate::domain::models::UserRecord;

fn create_salt() -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill(&mut buf);

    return hex::encode(buf);
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());

    return hex::encode(hasher.finalize());
}

fn store_error(err: anyhow::Error) -> AccountError {
    return AccountError::Store(format!("{err:#}"));
}

/// Password protected user records, kept in the same users collection the
/// transcript mirror writes to. Passwords are stored as a salted SHA-256 hash.
pub struct Accounts {
    mirror: Arc<TranscriptMirror>,
}

impl Accounts {
    pub fn new(mirror: Arc<TranscriptMirror>) -> Accounts {
        return Accounts { mirror };
    }

    fn identity(display_name: &str) -> Result<String, AccountError> {
        return identity::derive(display_name).map_err(|err| match err {
            MirrorError::InvalidIdentity(name) => return AccountError::InvalidIdentity(name),
            MirrorError::Store(detail) => return AccountError::Store(detail),
        });
    }

    pub async fn register(
        &self,
        display_name: &str,
        password: &str,
    ) -> Result<UserRecord, AccountError> {
        let display_name = display_name.trim();
        if display_name.is_empty() || password.is_empty() {
            return Err(AccountError::EmptyCredentials);
        }

        let identity = Accounts::identity(display_name)?;
        let store = self.mirror.store();
        if store
            .get_user(&identity)
            .await
            .map_err(store_error)?
            .is_some()
        {
            return Err(AccountError::UsernameTaken(display_name.to_string()));
        }

        let salt = create_salt();
        let mut record = UserRecord::new(&identity, display_name, self.mirror.now());
        record.password_hash = Some(hash_password(&salt, password));
        record.password_salt = Some(salt);

        store.put_user(&record).await.map_err(store_error)?;
        tracing::debug!(identity = %identity, "user registered");
        self.mirror
            .record(Speaker::System, "User registered", &record.display_name)
            .await;

        return Ok(record);
    }

    /// Checks the password and refreshes when the user was last seen.
    pub async fn verify(
        &self,
        display_name: &str,
        password: &str,
    ) -> Result<UserRecord, AccountError> {
        let display_name = display_name.trim();
        if display_name.is_empty() || password.is_empty() {
            return Err(AccountError::EmptyCredentials);
        }

        let identity = Accounts::identity(display_name)?;
        let store = self.mirror.store();
        let mut record = match store.get_user(&identity).await.map_err(store_error)? {
            Some(record) => record,
            None => return Err(AccountError::UnknownUser(display_name.to_string())),
        };

        let (hash, salt) = match (&record.password_hash, &record.password_salt) {
            (Some(hash), Some(salt)) => (hash, salt),
            _ => return Err(AccountError::MissingCredential(display_name.to_string())),
        };

        let candidate = hash_password(salt, password);
        let matches: bool = candidate.as_bytes().ct_eq(hash.as_bytes()).into();
        if !matches {
            tracing::debug!(identity = %identity, "wrong password");
            return Err(AccountError::WrongPassword);
        }

        record.last_seen_at = self.mirror.now();
        store.put_user(&record).await.map_err(store_error)?;
        self.mirror
            .record(Speaker::System, "Login succeeded", &record.display_name)
            .await;

        return Ok(record);
    }
}
