/// Every user- and operator-facing text in the service.
///
/// Response bodies and log lines are built from these variants so the
/// wording lives in one place (see `display.rs`).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // === RESPONSE MESSAGES ===
    ResourceNotFound,
    MethodNotSupported(String), // method
    ServerError,
    EditConflict,
    TaskDeleted,
    HealthAvailable,

    // === SERVER MESSAGES ===
    ServerStarting(String, String), // address, environment
    ServerStopped,
    ShutdownSignal(&'static str), // signal name
    DatabaseOpened(String),       // dsn

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),
    RunningMigration(u32, String), // version, name
    MigrationCompleted(u32),
    MigrationFailed(u32, String), // version, error
    AllMigrationsCompleted,
    DatabaseVersion(u32),
    DatabaseUpToDate,
    DatabaseNeedsUpdate,
    MigrationHistory,
}
