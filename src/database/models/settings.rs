//! Client preferences persisted as a JSON file next to the database.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub currency_symbol: String,
    pub default_payer: Option<String>,
    pub active_trip_id: Option<i64>,
    pub export_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency_symbol: "$".into(),
            default_payer: None,
            active_trip_id: None,
            export_title: "Trip Expense Report".into(),
        }
    }
}

impl Settings {
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let settings = self.clone().validate()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(&settings)?).await?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    pub fn validate(mut self) -> Result<Self> {
        self.currency_symbol = self.currency_symbol.trim().to_string();
        if self.currency_symbol.is_empty() {
            return Err(Error::validation("Currency symbol is required"));
        }
        self.default_payer = self
            .default_payer
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        if self.export_title.trim().is_empty() {
            self.export_title = Settings::default().export_title;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn save_then_load_keeps_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            currency_symbol: "€".into(),
            default_payer: Some(" Ana ".into()),
            active_trip_id: Some(3),
            export_title: "Lisbon".into(),
        };
        settings.save(&path).await.unwrap();

        let loaded = Settings::load(&path).await.unwrap();
        assert_eq!(loaded.currency_symbol, "€");
        assert_eq!(loaded.default_payer.as_deref(), Some("Ana"));
        assert_eq!(loaded.active_trip_id, Some(3));
    }

    #[tokio::test]
    async fn blank_currency_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            currency_symbol: " ".into(),
            ..Settings::default()
        };
        assert!(settings.save(&dir.path().join("s.json")).await.is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"default_payer":"Ben"}"#).unwrap();
        assert_eq!(s.currency_symbol, "$");
        assert_eq!(s.default_payer.as_deref(), Some("Ben"));
    }
}
