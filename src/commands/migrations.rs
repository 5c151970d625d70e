use crate::{
    db::{
        db::Db,
        migrations::{get_db_version, needs_migration, MigrationManager},
    },
    libs::{config::Config, messages::Message},
};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct MigrationsArgs {
    #[command(subcommand)]
    command: MigrationsCommand,

    /// SQLite database path; defaults to the configured one
    #[arg(long, global = true)]
    db: Option<String>,
}

#[derive(Debug, Subcommand)]
enum MigrationsCommand {
    /// Show current database version
    Status,
    /// Show migration history
    History,
}

pub fn cmd(args: MigrationsArgs) -> Result<()> {
    let dsn = match args.db {
        Some(dsn) => dsn,
        None => Config::read()?.apply_env()?.resolve_dsn()?,
    };
    let conn = Db::open_without_migrations(&dsn)?;

    match args.command {
        MigrationsCommand::Status => {
            let version = get_db_version(&conn)?;

            println!("{}", Message::DatabaseVersion(version));
            if needs_migration(&conn)? {
                println!("{}", Message::DatabaseNeedsUpdate);
            } else {
                println!("{}", Message::DatabaseUpToDate);
            }
        }
        MigrationsCommand::History => {
            // A fresh database has no migrations table yet.
            let history = if get_db_version(&conn)? == 0 {
                Vec::new()
            } else {
                MigrationManager::new().get_migration_history(&conn)?
            };

            println!("{}", Message::MigrationHistory);
            for (version, name, applied_at) in history {
                println!("  v{}: {} (applied: {})", version, name, applied_at);
            }
        }
    }

    Ok(())
}
