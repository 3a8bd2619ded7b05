use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dns::DomainName;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Host name or address of the primary server.
    pub server: String,
    pub port: u16,

    pub zone: DomainName,

    /// Program that receives the record lines on stdin instead of stdout.
    pub database_builder: Option<PathBuf>,

    /// Socket read timeout in seconds.
    pub read_timeout: Option<u64>,
}

impl Settings {
    /// Layers `/etc/zonexfer/config.toml`, `config/<RUN_MODE>`, `ZONEXFER_*`
    /// environment variables and finally the positional arguments
    /// `<server> <zone> [database-builder]`.
    pub fn load<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = defaults()?
            .add_source(File::with_name("/etc/zonexfer/config.toml").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("zonexfer"));

        with_args(builder, args)?.build()?.try_deserialize()
    }

    /// Like [`Settings::load`] but reads only the given file.
    pub fn load_file<I>(path: &Path, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let builder = defaults()?.add_source(File::from(path));

        with_args(builder, args)?.build()?.try_deserialize()
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout.map(Duration::from_secs)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder().set_default("port", 53_i64)
}

fn with_args<I>(
    builder: ConfigBuilder<DefaultState>,
    args: I,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();

    builder
        .set_override_option("server", args.next())?
        .set_override_option("zone", args.next())?
        .set_override_option("database_builder", args.next())
}
