use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Contact;

/// Store file name in the data directory
const CONTACTS_FILE: &str = "contacts.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StoreData {
    #[serde(default)]
    name: String,
    #[serde(default)]
    contacts: Vec<Contact>,
}

/// Persisted user profile: display name plus emergency contacts.
///
/// Contact ids come from the epoch-millisecond clock at creation time and
/// stay unique for the lifetime of the store.
pub struct ContactStore {
    path: PathBuf,
    data: StoreData,
}

impl ContactStore {
    /// Load the store from `dir`, creating an empty one if no file exists
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONTACTS_FILE);
        let data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read contact store")?;
            serde_json::from_str(&contents).context("Failed to parse contact store")?
        } else {
            StoreData::default()
        };

        debug!(contacts = data.contacts.len(), "Contact store loaded");
        Ok(Self { path, data })
    }

    /// Write through a temp file in the same directory and rename over the
    /// live file, so a crash mid-write never leaves a torn `contacts.json`.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).context("Failed to write contact store")?;
        std::fs::rename(&tmp_path, &self.path).context("Failed to replace contact store")?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.data.contacts
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            bail!("Name cannot be empty");
        }
        self.data.name = trimmed.to_string();
        self.save()
    }

    /// Validate and append a new contact, assigning its id.
    pub fn add_contact(&mut self, name: &str, phone_number: &str, email: &str) -> Result<Contact> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Please enter a name");
        }
        let email = email.trim();
        if email.is_empty() {
            bail!("Please enter an email");
        }
        let phone_number = phone_number.trim();
        if !Contact::is_valid_phone(phone_number) {
            bail!("Please enter a valid phone number");
        }

        let contact = Contact {
            id: self.next_id(),
            name: name.to_string(),
            phone_number: phone_number.to_string(),
            email: email.to_string(),
        };
        self.data.contacts.push(contact.clone());
        self.save()?;

        Ok(contact)
    }

    /// Remove a contact by id. Returns whether anything was removed.
    pub fn remove_contact(&mut self, id: &str) -> Result<bool> {
        let before = self.data.contacts.len();
        self.data.contacts.retain(|c| c.id != id);
        let removed = self.data.contacts.len() < before;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Millisecond timestamp, bumped past any existing id so that two
    /// contacts created within the same millisecond stay distinct.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.data.contacts.iter().any(|c| c.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }
}
