//! Configuration keys and defaults

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "PETSTORE";

pub const DB_URL: &str = "db.url";
pub const DB_MAX_OPEN_CONNS: &str = "db.max_open_conns";
pub const DB_MAX_IDLE_CONNS: &str = "db.max_idle_conns";
pub const DB_AUTO_MIGRATE: &str = "db.auto_migrate";
pub const DB_DEBUG: &str = "db.debug";

pub const LEASE_INIT_SECONDS: &str = "lease.init_seconds";

pub const LOG_DIR: &str = "log.dir";
pub const LOG_LEVEL: &str = "log.level";
pub const LOG_CONSOLE: &str = "log.console";
pub const LOG_FILE: &str = "log.file";
pub const LOG_ROTATION: &str = "log.rotation";

pub const DEFAULT_MAX_OPEN_CONNS: u32 = 20;
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 10;
