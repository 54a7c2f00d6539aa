//! Database handle: engine selection and the closure transaction API
//!
//! ## Transaction API
//!
//! 1. **Closure API** (recommended): `db.view(|txn| ...)` and
//!    `db.update(|txn| ...)`
//!    - `update` commits when the closure returns `Ok`, rolls back otherwise
//!    - `view` always rolls back
//!
//! 2. **Manual API**: `begin(writable)`, then `commit()` or `rollback()` on
//!    the returned transaction

pub mod config;
mod transactions;

pub use transactions::RetryConfig;

use std::path::Path;

use tessera_core::error::Result;
use tessera_storage::{Engine, LogEngine, MemoryEngine, Transaction};
use tracing::{debug, info};

use self::config::{DatabaseConfig, EngineKind, CONFIG_FILE_NAME};

/// An open database
///
/// Owns its engine; dropping the handle closes it (and, for the log
/// engine, releases the directory lock).
pub struct Database {
    engine: Box<dyn Engine>,
    config: DatabaseConfig,
}

impl Database {
    /// Open a database described by `config`
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if a setting is invalid
    /// - any error from opening the engine (`DatabaseLocked`, `Corruption`,
    ///   `Io`)
    pub fn open(config: DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let kind = config.engine_kind()?;
        let engine: Box<dyn Engine> = match (kind, &config.path) {
            (EngineKind::Log, Some(path)) => {
                Box::new(LogEngine::open(path, config.durability_mode()?)?)
            }
            _ => Box::new(MemoryEngine::new()),
        };
        info!(
            target: "tessera::db",
            engine = engine.name(),
            path = ?config.path,
            durability = %config.durability,
            "Database opened"
        );
        Ok(Self { engine, config })
    }

    /// Open a database directory, reading `tessera.toml` inside it
    ///
    /// Writes a default config file on first open. A config without a
    /// `path` gets `dir`.
    pub fn open_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        DatabaseConfig::write_default_if_missing(&config_path)?;

        let mut config = DatabaseConfig::from_file(&config_path)?;
        if config.path.is_none() {
            config.path = Some(dir.to_path_buf());
        }
        Self::open(config)
    }

    /// In-memory database that is gone once dropped
    pub fn ephemeral() -> Self {
        Self {
            engine: Box::new(MemoryEngine::new()),
            config: DatabaseConfig::memory(),
        }
    }

    /// Underlying engine
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Config this database was opened with
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Begin a transaction for manual control
    pub fn begin(&self, writable: bool) -> Result<Box<dyn Transaction + '_>> {
        self.engine.begin(writable)
    }

    /// Run `f` in a read-only transaction
    pub fn view<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Transaction) -> Result<T>,
    {
        let txn = self.begin(false)?;
        let result = f(txn.as_ref());
        txn.rollback()?;
        result
    }

    /// Run `f` in a writable transaction
    ///
    /// Commits if `f` returns `Ok`; rolls back and returns the error
    /// otherwise. A commit that loses a race returns `Conflict`.
    pub fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Transaction) -> Result<T>,
    {
        let mut txn = self.begin(true)?;
        match f(txn.as_mut()) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                txn.rollback()?;
                Err(e)
            }
        }
    }

    /// Like [`update`](Database::update), re-running `f` in a fresh
    /// transaction while the commit conflicts
    ///
    /// `f` may run several times, so it must not have side effects outside
    /// the transaction.
    pub fn update_with_retry<F, T>(&self, policy: RetryConfig, f: F) -> Result<T>
    where
        F: Fn(&mut dyn Transaction) -> Result<T>,
    {
        let mut attempt = 0;
        loop {
            match self.update(&f) {
                Ok(value) => return Ok(value),
                Err(e) if policy.should_retry(&e, attempt) => {
                    debug!(target: "tessera::db", attempt, error = %e, "Retrying transaction");
                    std::thread::sleep(policy.delay(attempt));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .finish()
    }
}
