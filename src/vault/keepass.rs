use super::{Association, Entry, Vault};
use crate::config::DatabaseSettings;
use crate::error::{KpMenuError, Result};
use keepass::db::NodeRef;
use keepass::{Database, DatabaseKey};
use std::fs::File;
use tracing::info;

/// 자주 쓰는 표준 필드는 목록 앞쪽에 둡니다
const STANDARD_FIELDS: [&str; 5] = ["Title", "UserName", "Password", "URL", "Notes"];

/// `keepass` 크레이트 기반 KDBX 저장소
#[derive(Default)]
pub struct KeepassVault {
    password: Option<String>,
    key_file: Option<Vec<u8>>,
}

impl KeepassVault {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self) -> Result<DatabaseKey> {
        let mut key = DatabaseKey::new();
        if let Some(password) = &self.password {
            key = key.with_password(password);
        }
        if let Some(data) = &self.key_file {
            key = key
                .with_keyfile(&mut data.as_slice())
                .map_err(|e| KpMenuError::Vault(format!("invalid key file: {}", e)))?;
        }
        Ok(key)
    }
}

impl Vault for KeepassVault {
    fn derive_credentials(&mut self, settings: &DatabaseSettings, password: &str) -> Result<()> {
        self.password = (!password.is_empty()).then(|| password.to_string());
        self.key_file = if settings.key_file.is_empty() {
            None
        } else {
            let data = std::fs::read(&settings.key_file)
                .map_err(|e| KpMenuError::Vault(format!("{}: {}", settings.key_file, e)))?;
            Some(data)
        };

        match (&self.password, &self.key_file) {
            (Some(_), Some(_)) => info!("credentials: password + keyfile"),
            (Some(_), None) => info!("credentials: password"),
            (None, Some(_)) => info!("credentials: keyfile"),
            (None, None) => {
                return Err(KpMenuError::Vault(
                    "neither password nor key file given".to_string(),
                ))
            }
        }
        Ok(())
    }

    fn open(&mut self, settings: &DatabaseSettings) -> Result<Vec<Entry>> {
        let mut file = File::open(&settings.database)
            .map_err(|e| KpMenuError::Vault(format!("{}: {}", settings.database, e)))?;
        let db = Database::open(&mut file, self.key()?)
            .map_err(|e| KpMenuError::Vault(e.to_string()))?;

        let mut entries = Vec::new();
        for node in &db.root {
            if let NodeRef::Entry(e) = node {
                entries.push(convert(e));
            }
        }
        Ok(entries)
    }
}

fn convert(e: &keepass::db::Entry) -> Entry {
    let mut custom: Vec<&String> = e
        .fields
        .keys()
        .filter(|k| !STANDARD_FIELDS.contains(&k.as_str()))
        .collect();
    custom.sort();

    let attributes = STANDARD_FIELDS
        .iter()
        .map(|k| k.to_string())
        .chain(custom.into_iter().cloned())
        .filter_map(|k| e.get(&k).map(|v| (k.clone(), v.to_string())))
        .collect();

    let (default_sequence, associations) = match &e.autotype {
        Some(at) => (
            at.sequence.clone().unwrap_or_default(),
            at.associations
                .iter()
                .map(|a| Association {
                    window: a.window.clone().unwrap_or_default(),
                    sequence: a.sequence.clone().unwrap_or_default(),
                })
                .collect(),
        ),
        None => (String::new(), Vec::new()),
    };

    Entry {
        attributes,
        default_sequence,
        associations,
    }
}
