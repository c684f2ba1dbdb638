//! Settings record: currency, timezone, and the opening balance anchor.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::{LedgerError, Result},
    ledger::{MinorUnits, OpeningBalance},
    storage::json_backend::ensure_dir,
    utils::Clock,
};

pub const HOME_ENV_VAR: &str = "CASHFLOW_HOME";
const DEFAULT_DIR_NAME: &str = ".cashflow_core";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub currency: String,
    pub timezone: String,
    pub opening_balance_cents: MinorUnits,
    pub opening_balance_date: NaiveDate,
}

impl Settings {
    pub fn defaults(clock: &dyn Clock) -> Self {
        Self {
            currency: "USD".into(),
            timezone: "America/New_York".into(),
            opening_balance_cents: 0,
            opening_balance_date: clock.today(),
        }
    }

    pub fn opening(&self) -> OpeningBalance {
        OpeningBalance::new(self.opening_balance_cents, self.opening_balance_date)
    }

    fn validate(&self) -> Result<()> {
        let code = self.currency.trim();
        if code.len() != 3 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(LedgerError::Storage(format!(
                "currency `{}` is not a three-letter code",
                self.currency
            )));
        }
        Ok(())
    }
}

/// Returns the application data directory, defaulting to `~/.cashflow_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV_VAR) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
            base,
        })
    }

    /// Loads saved settings. The first load writes defaults anchored at the
    /// clock's today, so the opening date stays fixed across later runs.
    pub fn load(&self, clock: &dyn Clock) -> Result<Settings> {
        if !self.path.exists() {
            let settings = Settings::defaults(clock);
            self.save(&settings)?;
            return Ok(settings);
        }
        let data = fs::read_to_string(&self.path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        settings.validate()?;
        let json = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension(format!("json.{TMP_SUFFIX}"));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "settings saved");
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::FixedClock;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    #[test]
    fn defaults_apply_when_no_file_exists() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let settings = manager.load(&FixedClock(today())).unwrap();
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.timezone, "America/New_York");
        assert_eq!(settings.opening(), OpeningBalance::new(0, today()));
        assert!(manager.path().exists());
    }

    #[test]
    fn first_load_pins_the_opening_date() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let first = manager.load(&FixedClock(today())).unwrap();

        let later = FixedClock(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        let second = manager.load(&later).unwrap();
        assert_eq!(second.opening_balance_date, today());
        assert_eq!(second, first);
    }

    #[test]
    fn save_and_reload_roundtrip() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().join("nested")).unwrap();
        let mut settings = Settings::defaults(&FixedClock(today()));
        settings.opening_balance_cents = 100_000;
        manager.save(&settings).unwrap();

        let later = FixedClock(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(manager.load(&later).unwrap(), settings);
    }

    #[test]
    fn invalid_currency_is_rejected() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path().to_path_buf()).unwrap();
        let mut settings = Settings::defaults(&FixedClock(today()));
        settings.currency = "dollars".into();
        assert!(manager.save(&settings).is_err());
        assert!(!manager.path().exists());
    }
}
