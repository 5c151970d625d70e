//! Text for [`Message`] variants.
//!
//! Response strings are part of the HTTP contract: clients match on them, so
//! changing a response message is a breaking change. Log lines are free to
//! evolve.

use super::types::Message;
use std::fmt::{Display, Formatter, Result};

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let text = match self {
            // === RESPONSE MESSAGES ===
            Message::ResourceNotFound => "the requested resource could not be found".to_string(),
            Message::MethodNotSupported(method) => format!("the {} method is not supported for this resource", method),
            Message::ServerError => "the server encountered a problem and could not process the request".to_string(),
            Message::EditConflict => "unable to update the record due to an edit conflict, please try again".to_string(),
            Message::TaskDeleted => "task successfully deleted".to_string(),
            Message::HealthAvailable => "available".to_string(),

            // === SERVER MESSAGES ===
            Message::ServerStarting(addr, env) => format!("starting {} server on {}", env, addr),
            Message::ServerStopped => "server stopped".to_string(),
            Message::ShutdownSignal(signal) => format!("received {}, shutting down", signal),
            Message::DatabaseOpened(dsn) => format!("database connection established ({})", dsn),

            // === MIGRATION MESSAGES ===
            Message::MigrationsFound(count) => format!("Found {} pending database migrations", count),
            Message::RunningMigration(version, name) => format!("Running migration v{}: {}", version, name),
            Message::MigrationCompleted(version) => format!("Migration v{} completed", version),
            Message::MigrationFailed(version, error) => format!("Migration v{} failed: {}", version, error),
            Message::AllMigrationsCompleted => "All database migrations completed successfully".to_string(),
            Message::DatabaseVersion(version) => format!("Current database version: {}", version),
            Message::DatabaseUpToDate => "Database schema is up to date".to_string(),
            Message::DatabaseNeedsUpdate => "Database schema needs to be updated".to_string(),
            Message::MigrationHistory => "Migration history:".to_string(),
        };

        write!(f, "{}", text)
    }
}
