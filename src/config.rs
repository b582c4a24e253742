use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::from_utf8;
use std::{env, fs};
use tracing::{debug, span, Level};

pub const CONFIG_ENV: &str = "LAZYSEEK_CONFIG";

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub root: PathBuf,
    pub chunk_size: Option<usize>,
    pub log_level: Option<String>,
}

trait FromEnv
where
    Self: Sized,
{
    fn from_env(key: &str) -> anyhow::Result<Option<Self>>;
}

macro_rules! impl_FromEnv {
    ($type:ident) => {
        impl FromEnv for $type {
            fn from_env(key: &str) -> anyhow::Result<Option<Self>> {
                if let Ok(v) = env::var(key) {
                    return Ok(Some(
                        v.parse::<Self>()
                            .context(format!("Failed to parse value of key {key}"))?,
                    ));
                }
                Ok(None)
            }
        }
    };
}

impl_FromEnv!(usize);
impl_FromEnv!(String);

impl Config {
    /// Bytes handed out per raw read when unset: 0, no cap.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(0)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn read_from_str(conf_str: &str) -> anyhow::Result<Self> {
        toml::from_str(conf_str).context("Could not parse config file")
    }

    pub fn read_from_file(file: &Path) -> anyhow::Result<Self> {
        let c_span = span!(Level::INFO, "read_from_file");
        let _g = c_span.enter();

        debug!("Reading Config from {:?}", file);
        let raw_data =
            fs::read(file).context(format!("Failed to read data from {}", file.display()))?;

        let conf_str = from_utf8(raw_data.as_slice()).context("Config file is not valid UTF-8")?;

        debug!("Config:\n{}", conf_str);
        Self::read_from_str(conf_str)
    }

    pub fn read_from_env() -> anyhow::Result<Self> {
        let conf = Config {
            root: PathBuf::from(env::var("LAZYSEEK_ROOT").context("LAZYSEEK_ROOT not defined")?),
            chunk_size: usize::from_env("LAZYSEEK_CHUNK_SIZE")?,
            log_level: String::from_env("LAZYSEEK_LOG_LEVEL")?,
        };

        Ok(conf)
    }

    /// Uses the file named by `LAZYSEEK_CONFIG` if set, the environment otherwise.
    pub fn load() -> anyhow::Result<Self> {
        match env::var_os(CONFIG_ENV) {
            Some(file) => Self::read_from_file(Path::new(&file)),
            None => Self::read_from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lazyseek.toml");
        fs::write(
            &path,
            "root = \"/srv/objects\"\nchunk_size = 4096\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let conf = Config::read_from_file(&path).unwrap();
        assert_eq!(conf.root, PathBuf::from("/srv/objects"));
        assert_eq!(conf.chunk_size(), 4096);
        assert_eq!(conf.log_level(), "debug");
    }

    #[test]
    fn optional_keys_have_defaults() {
        let conf = Config::read_from_str("root = \"data\"").unwrap();
        assert_eq!(conf.chunk_size(), 0);
        assert_eq!(conf.log_level(), "info");
    }

    #[test]
    fn root_is_required() {
        assert!(Config::read_from_str("chunk_size = 1").is_err());
    }

    #[test]
    fn bad_chunk_size_is_rejected() {
        assert!(Config::read_from_str("root = \"x\"\nchunk_size = -3").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Config::read_from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
    }
}
