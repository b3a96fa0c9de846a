//! Configuration management for the pet store server
//!
//! Values are layered: `conf/application.yml` (optional), then `PETSTORE_*`
//! environment variables, then command line flags.

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use petstore_common::PetstoreError;
use petstore_core::DEFAULT_LEASE;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::startup::LoggingConfig;

use super::constants::{
    DB_AUTO_MIGRATE, DB_DEBUG, DB_MAX_IDLE_CONNS, DB_MAX_OPEN_CONNS, DB_URL,
    DEFAULT_CONFIG_FILE, DEFAULT_MAX_IDLE_CONNS, DEFAULT_MAX_OPEN_CONNS, ENV_PREFIX,
    LEASE_INIT_SECONDS, LOG_CONSOLE, LOG_DIR, LOG_FILE, LOG_LEVEL, LOG_ROTATION,
};

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "petstore-server")]
pub struct Cli {
    #[arg(long = "db-url", env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Log SQL statements and raise the log level to debug
    #[arg(long = "debug")]
    debug: bool,
    #[arg(long = "auto-migrate")]
    auto_migrate: Option<bool>,
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_FILE)]
    config_file: String,
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

fn config_error(e: config::ConfigError) -> PetstoreError {
    PetstoreError::ConfigError(e.to_string())
}

impl Configuration {
    /// Build from the process arguments
    pub fn new() -> Result<Self, PetstoreError> {
        Self::from_cli(Cli::parse())
    }

    pub fn try_parse_from<I, T>(args: I) -> Result<Self, PetstoreError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)
            .map_err(|e| PetstoreError::ConfigError(e.to_string()))?;
        Self::from_cli(cli)
    }

    pub fn from_cli(args: Cli) -> Result<Self, PetstoreError> {
        let mut config_builder = Config::builder()
            .add_source(config::File::with_name(&args.config_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(v) = args.database_url {
            config_builder = config_builder
                .set_override(DB_URL, v)
                .map_err(config_error)?;
        }
        if let Some(v) = args.auto_migrate {
            config_builder = config_builder
                .set_override(DB_AUTO_MIGRATE, v)
                .map_err(config_error)?;
        }
        if args.debug {
            config_builder = config_builder
                .set_override(DB_DEBUG, true)
                .and_then(|b| b.set_override(LOG_LEVEL, "debug"))
                .map_err(config_error)?;
        }

        let app_config = config_builder.build().map_err(config_error)?;

        Ok(Configuration { config: app_config })
    }

    // ========================================================================
    // Database Configuration
    // ========================================================================

    pub fn database_url(&self) -> Result<String, PetstoreError> {
        self.config.get_string(DB_URL).map_err(config_error)
    }

    pub fn db_max_open_conns(&self) -> u32 {
        self.config
            .get_int(DB_MAX_OPEN_CONNS)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_OPEN_CONNS)
    }

    pub fn db_max_idle_conns(&self) -> u32 {
        self.config
            .get_int(DB_MAX_IDLE_CONNS)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_MAX_IDLE_CONNS)
    }

    pub fn db_auto_migrate(&self) -> bool {
        self.config.get_bool(DB_AUTO_MIGRATE).unwrap_or(true)
    }

    pub fn db_debug(&self) -> bool {
        self.config.get_bool(DB_DEBUG).unwrap_or(false)
    }

    pub async fn database_connection(&self) -> Result<DatabaseConnection, PetstoreError> {
        let max_connections = self.db_max_open_conns();
        // Idle connections kept open are the pool's floor
        let min_connections = self.db_max_idle_conns().min(max_connections);
        let sqlx_logging = self.db_debug();

        let url = self.database_url()?;

        let mut opt = ConnectOptions::new(url);

        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .sqlx_logging(sqlx_logging);

        tracing::info!(
            max_connections = max_connections,
            min_connections = min_connections,
            sqlx_logging = sqlx_logging,
            "Database connection pool configured"
        );

        let database_connection: DatabaseConnection = Database::connect(opt)
            .await
            .map_err(|e| PetstoreError::DatabaseError(e.to_string()))?;

        Ok(database_connection)
    }

    // ========================================================================
    // Lease Configuration
    // ========================================================================

    /// Lease taken on the init lock while seeding data
    pub fn init_lease(&self) -> Duration {
        self.config
            .get_int(LEASE_INIT_SECONDS)
            .ok()
            .filter(|secs| *secs > 0)
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LEASE)
    }

    // ========================================================================
    // Logging Configuration
    // ========================================================================

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOG_DIR).ok(),
            self.config.get_bool(LOG_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOG_FILE).unwrap_or(false),
            self.config
                .get_string(LOG_LEVEL)
                .unwrap_or_else(|_| "info".to_string()),
            self.config
                .get_string(LOG_ROTATION)
                .unwrap_or_else(|_| "daily".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tracing::Level;

    use super::*;
    use crate::startup::LogRotation;

    const NO_FILE: &str = "/nonexistent/petstore/application.yml";

    #[test]
    fn test_defaults_without_config_file() {
        let configuration =
            Configuration::try_parse_from(["petstore-server", "--config", NO_FILE]).unwrap();

        assert_eq!(configuration.db_max_open_conns(), 20);
        assert_eq!(configuration.db_max_idle_conns(), 10);
        assert!(configuration.db_auto_migrate());
        assert!(!configuration.db_debug());
        assert_eq!(configuration.init_lease(), Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides() {
        let configuration = Configuration::try_parse_from([
            "petstore-server",
            "--config",
            NO_FILE,
            "--db-url",
            "postgres://petstore@localhost/petstore",
            "--auto-migrate",
            "false",
            "--debug",
        ])
        .unwrap();

        assert_eq!(
            configuration.database_url().unwrap(),
            "postgres://petstore@localhost/petstore"
        );
        assert!(!configuration.db_auto_migrate());
        assert!(configuration.db_debug());
        assert_eq!(configuration.logging_config().console_level, Level::DEBUG);
    }

    #[test]
    fn test_values_from_config_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".yml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "db:\n  url: \"mysql://root@127.0.0.1:3306/petstore\"\n  max_open_conns: 5\n  max_idle_conns: 2\n  auto_migrate: false\nlease:\n  init_seconds: 15\nlog:\n  file: true\n  dir: \"/tmp/petstore-logs\"\n  rotation: \"hourly\"\n"
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let configuration =
            Configuration::try_parse_from(["petstore-server", "--config", path.as_str()]).unwrap();

        assert_eq!(
            configuration.database_url().unwrap(),
            "mysql://root@127.0.0.1:3306/petstore"
        );
        assert_eq!(configuration.db_max_open_conns(), 5);
        assert_eq!(configuration.db_max_idle_conns(), 2);
        assert!(!configuration.db_auto_migrate());
        assert_eq!(configuration.init_lease(), Duration::from_secs(15));

        let logging = configuration.logging_config();
        assert!(logging.file_logging);
        assert_eq!(
            logging.log_dir,
            std::path::PathBuf::from("/tmp/petstore-logs")
        );
        assert_eq!(logging.rotation, LogRotation::Hourly);
    }

    #[test]
    fn test_negative_pool_sizes_fall_back_to_defaults() {
        let mut configuration =
            Configuration::try_parse_from(["petstore-server", "--config", NO_FILE]).unwrap();
        configuration.config = Config::builder()
            .set_override(DB_MAX_OPEN_CONNS, -1_i64)
            .unwrap()
            .set_override(DB_MAX_IDLE_CONNS, -5_i64)
            .unwrap()
            .set_override(LEASE_INIT_SECONDS, -30_i64)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(configuration.db_max_open_conns(), DEFAULT_MAX_OPEN_CONNS);
        assert_eq!(configuration.db_max_idle_conns(), DEFAULT_MAX_IDLE_CONNS);
        assert_eq!(configuration.init_lease(), DEFAULT_LEASE);
    }

    #[tokio::test]
    async fn test_unreachable_database_is_database_error() {
        let configuration = Configuration::try_parse_from([
            "petstore-server",
            "--config",
            NO_FILE,
            "--db-url",
            "nosuchdriver://localhost/petstore",
        ])
        .unwrap();

        let err = configuration.database_connection().await.unwrap_err();
        assert!(matches!(err, PetstoreError::DatabaseError(_)), "{err}");
    }

    #[test]
    fn test_non_positive_lease_falls_back_to_default() {
        let mut configuration =
            Configuration::try_parse_from(["petstore-server", "--config", NO_FILE]).unwrap();
        configuration.config = Config::builder()
            .set_override(LEASE_INIT_SECONDS, 0_i64)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(configuration.init_lease(), DEFAULT_LEASE);
    }

    #[test]
    fn test_invalid_flag_is_config_error() {
        let err = Configuration::try_parse_from(["petstore-server", "--auto-migrate", "maybe"])
            .unwrap_err();
        assert!(matches!(err, PetstoreError::ConfigError(_)));
    }
}
