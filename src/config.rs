use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use url::Url;

use crate::domain::TableName;

pub const DEFAULT_CONFIG_PATH: &str = "settings.yml";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug)]
pub struct Settings {
    pub database_url: Url,
    pub cache_tables: Vec<TableName>,
}

#[derive(Deserialize)]
struct FileConfig {
    db_name: Option<String>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_pass: Option<String>,
    #[serde(default)]
    cache_tables: Vec<TableName>,
}

impl FileConfig {
    fn database_url(&self) -> Result<Url> {
        let (Some(user), Some(pass), Some(host), Some(port), Some(name)) = (
            &self.db_user,
            &self.db_pass,
            &self.db_host,
            self.db_port,
            &self.db_name,
        ) else {
            bail!("{DATABASE_URL_ENV} is not set and the config file has no complete db_* section");
        };

        let url_str = format!("postgres://{user}:{pass}@{host}:{port}/{name}");
        Url::parse(&url_str).context("Failed to build database url from config file")
    }
}

fn read_file_config(config: Config) -> Result<FileConfig> {
    config
        .try_deserialize::<FileConfig>()
        .map_err(|e| anyhow!("Failed to deserialize config file: {e}"))
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &str, f: F) -> Result<Option<T>>
where
    F: FnOnce(String) -> Result<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).map_err(|_| anyhow!("Failed to parse {}", env_var))?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => bail!("Could not read {env_var} from env"),
    }
}

fn settings_from(file: FileConfig, database_url_opt: Option<Url>, path: &Path) -> Result<Settings> {
    let database_url = match database_url_opt {
        Some(url) => url,
        None => {
            tracing::warn!(
                path = %path.display(),
                "{DATABASE_URL_ENV} is not set, using value from config file"
            );
            file.database_url()?
        }
    };

    Ok(Settings {
        database_url,
        cache_tables: file.cache_tables,
    })
}

/// Load configuration from env with fallback to the config file at `path`.
///
/// The file may be missing only when `DATABASE_URL` is set.
pub fn load(path: &Path) -> Result<Settings> {
    let database_url_opt: Option<Url> = try_from_env(DATABASE_URL_ENV, |env_str| {
        Url::parse(&env_str).map_err(|e| e.into())
    })?;

    let config = Config::builder()
        .add_source(File::from(path).required(database_url_opt.is_none()))
        .build()
        .map_err(|e| anyhow!("Failed to read config file {}: {e}", path.display()))?;

    settings_from(read_file_config(config)?, database_url_opt, path)
}

/// Parse settings from YAML text, ignoring the environment
pub fn from_yaml(yaml: &str) -> Result<Settings> {
    let config = Config::builder()
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()
        .map_err(|e| anyhow!("Failed to read config: {e}"))?;

    settings_from(read_file_config(config)?, None, Path::new("<inline>"))
}
