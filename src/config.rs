use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::{BoundingBox, SourceTag};
use crate::error::OceanError;
use crate::store::{Layout, write_bytes_atomic};

pub const DEFAULT_MAX_ROWS_PER_FILE: usize = 9000;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub data_sources: DataSources,
    #[serde(default)]
    pub processing: Processing,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub region: BoundingBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataSources {
    #[serde(default = "SourceSettings::noaa")]
    pub noaa: SourceSettings,
    #[serde(default = "SourceSettings::copernicus")]
    pub copernicus: SourceSettings,
    #[serde(default)]
    pub argo: SourceSettings,
    #[serde(default)]
    pub ncei: SourceSettings,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            noaa: SourceSettings::noaa(),
            copernicus: SourceSettings::copernicus(),
            argo: SourceSettings::default(),
            ncei: SourceSettings::default(),
        }
    }
}

impl DataSources {
    pub fn get(&self, source: SourceTag) -> &SourceSettings {
        match source {
            SourceTag::Noaa => &self.noaa,
            SourceTag::Copernicus => &self.copernicus,
            SourceTag::Argo => &self.argo,
            SourceTag::Ncei => &self.ncei,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_back: Option<u32>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            days_back: None,
        }
    }
}

impl SourceSettings {
    fn noaa() -> Self {
        Self {
            enabled: true,
            days_back: Some(2),
        }
    }

    fn copernicus() -> Self {
        Self {
            enabled: true,
            days_back: Some(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Processing {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for Processing {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_MAX_ROWS_PER_FILE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub save_csv: bool,
    #[serde(default = "default_true")]
    pub save_metadata: bool,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
            save_csv: true,
            save_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Endpoints {
    #[serde(default = "default_erddap_base")]
    pub noaa_erddap_base: String,
    #[serde(default = "default_sst_dataset")]
    pub noaa_sst_dataset: String,
    #[serde(default = "default_argo_base")]
    pub argo_gdac_base: String,
    #[serde(default = "default_ghcn_base")]
    pub ncei_ghcn_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            noaa_erddap_base: default_erddap_base(),
            noaa_sst_dataset: default_sst_dataset(),
            argo_gdac_base: default_argo_base(),
            ncei_ghcn_base: default_ghcn_base(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_chunk_size() -> usize {
    DEFAULT_MAX_ROWS_PER_FILE
}

fn default_level() -> String {
    "info".to_string()
}

fn default_erddap_base() -> String {
    "https://coastwatch.pfeg.noaa.gov/erddap".to_string()
}

fn default_sst_dataset() -> String {
    "jplMURSST41".to_string()
}

fn default_argo_base() -> String {
    "https://data-argo.ifremer.fr".to_string()
}

fn default_ghcn_base() -> String {
    "https://www.ncei.noaa.gov/pub/data/ghcn/daily".to_string()
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub sources: BTreeMap<SourceTag, SourceSettings>,
    pub max_rows_per_file: NonZeroUsize,
    pub logging: Logging,
    pub endpoints: Endpoints,
    pub region: BoundingBox,
}

impl ResolvedSettings {
    pub fn enabled_sources(&self) -> Vec<SourceTag> {
        self.sources
            .iter()
            .filter(|(_, settings)| settings.enabled)
            .map(|(source, _)| *source)
            .collect()
    }

    pub fn days_back(&self, source: SourceTag) -> u32 {
        self.sources
            .get(&source)
            .and_then(|settings| settings.days_back)
            .unwrap_or(match source {
                SourceTag::Noaa => 2,
                _ => 1,
            })
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `config/settings.json`, writing the defaults there when it is missing.
    pub fn load(layout: &Layout) -> Result<ResolvedSettings, OceanError> {
        let path = layout.settings_path();
        let settings = if path.as_std_path().exists() {
            Self::read(&path)?
        } else {
            let settings = Settings::default();
            let bytes = serde_json::to_vec_pretty(&settings)
                .map_err(|err| OceanError::ConfigParse(err.to_string()))?;
            write_bytes_atomic(&path, &bytes)?;
            settings
        };
        Self::resolve_settings(settings)
    }

    pub fn read(path: &Utf8Path) -> Result<Settings, OceanError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| OceanError::ConfigRead(path.as_std_path().to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| OceanError::ConfigParse(err.to_string()))
    }

    pub fn resolve_settings(settings: Settings) -> Result<ResolvedSettings, OceanError> {
        let max_rows_per_file = NonZeroUsize::new(settings.processing.chunk_size).ok_or_else(|| {
            OceanError::InvalidSetting("processing.chunk_size must be greater than zero".into())
        })?;
        settings.region.validate()?;

        let sources = SourceTag::ALL
            .iter()
            .map(|source| (*source, settings.data_sources.get(*source).clone()))
            .collect();

        Ok(ResolvedSettings {
            sources,
            max_rows_per_file,
            logging: settings.logging,
            endpoints: settings.endpoints,
            region: settings.region,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    /// Looks up `<SOURCE>_USERNAME` and `<SOURCE>_PASSWORD` in the environment,
    /// then in the project's `.env` file.
    pub fn lookup(source: SourceTag, dotenv: &Utf8Path) -> Self {
        Self::lookup_with(source, dotenv, |key| std::env::var(key).ok())
    }

    pub fn lookup_with<F>(source: SourceTag, dotenv: &Utf8Path, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = source.as_str().to_uppercase();
        let user_key = format!("{prefix}_USERNAME");
        let pass_key = format!("{prefix}_PASSWORD");

        let mut username = env(&user_key).filter(|value| !value.is_empty());
        let mut password = env(&pass_key).filter(|value| !value.is_empty());

        if username.is_none() || password.is_none() {
            if let Ok(entries) = dotenvy::from_path_iter(dotenv.as_std_path()) {
                for (key, value) in entries.flatten() {
                    if key == user_key && username.is_none() {
                        username = Some(value);
                    } else if key == pass_key && password.is_none() {
                        password = Some(value);
                    }
                }
            }
        }

        Self { username, password }
    }

    pub fn basic_auth(&self) -> Option<(String, String)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}
