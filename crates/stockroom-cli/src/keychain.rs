//! Passwords remembered by `login --remember`, kept in the OS keychain
//! under one entry per username.

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE: &str = "stockroom";

fn entry(username: &str) -> Result<Entry> {
    Entry::new(SERVICE, username).context("Failed to open keychain entry")
}

/// The remembered password, or `None` when there is none or the keychain
/// cannot be read
pub fn remembered_password(username: &str) -> Option<String> {
    entry(username).ok()?.get_password().ok()
}

pub fn remember(username: &str, password: &str) -> Result<()> {
    entry(username)?
        .set_password(password)
        .context("Failed to save password to keychain")
}

/// Drop the remembered password. Nothing stored is not an error.
pub fn forget(username: &str) -> Result<()> {
    match entry(username)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e).context("Failed to remove password from keychain"),
    }
}
