#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};
    use todo_api::db::db::Db;
    use todo_api::db::migrations::{get_db_version, init_with_migrations, needs_migration, MigrationManager};

    struct MigrationTestContext {
        temp_dir: TempDir,
    }

    impl MigrationTestContext {
        fn connect(&self) -> Connection {
            let path = self.temp_dir.path().join("todo.db");
            Db::open_without_migrations(&path.to_string_lossy()).unwrap()
        }
    }

    impl TestContext for MigrationTestContext {
        fn setup() -> Self {
            MigrationTestContext {
                temp_dir: tempfile::tempdir().unwrap(),
            }
        }
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_fresh_database_needs_migration(ctx: &mut MigrationTestContext) {
        let conn = ctx.connect();

        assert_eq!(get_db_version(&conn).unwrap(), 0);
        assert!(needs_migration(&conn).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migrations_bring_schema_up_to_date(ctx: &mut MigrationTestContext) {
        let mut conn = ctx.connect();
        init_with_migrations(&mut conn).unwrap();

        assert!(get_db_version(&conn).unwrap() >= 2);
        assert!(!needs_migration(&conn).unwrap());

        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE name IN ('task_list', 'task_list_fts')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migration_history(ctx: &mut MigrationTestContext) {
        let mut conn = ctx.connect();
        let manager = MigrationManager::new();
        manager.run_migrations(&mut conn).unwrap();

        let history = manager.get_migration_history(&conn).unwrap();
        assert!(!history.is_empty());
        for (i, (version, _, _)) in history.iter().enumerate() {
            assert_eq!(*version as usize, i + 1);
        }
        assert_eq!(history[0].1, "create_task_list");
        assert!(manager.is_migration_applied(&conn, 1).unwrap());
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_migration_idempotency(ctx: &mut MigrationTestContext) {
        let mut conn = ctx.connect();
        let manager = MigrationManager::new();

        manager.run_migrations(&mut conn).unwrap();
        let version1 = get_db_version(&conn).unwrap();

        manager.run_migrations(&mut conn).unwrap();
        let version2 = get_db_version(&conn).unwrap();

        assert_eq!(version1, version2);
    }

    #[test_context(MigrationTestContext)]
    #[test]
    fn test_fts_index_tracks_task_changes(ctx: &mut MigrationTestContext) {
        let mut conn = ctx.connect();
        init_with_migrations(&mut conn).unwrap();

        conn.execute("INSERT INTO task_list (title, description) VALUES ('buy milk', 'semi skimmed')", []).unwrap();
        let matches = |conn: &Connection, query: &str| -> i64 {
            conn.query_row("SELECT COUNT(*) FROM task_list_fts WHERE task_list_fts MATCH ?1", [query], |row| row.get(0))
                .unwrap()
        };
        assert_eq!(matches(&conn, "title : milk"), 1);

        conn.execute("UPDATE task_list SET title = 'buy bread'", []).unwrap();
        assert_eq!(matches(&conn, "title : milk"), 0);
        assert_eq!(matches(&conn, "title : bread"), 1);

        conn.execute("DELETE FROM task_list", []).unwrap();
        assert_eq!(matches(&conn, "title : bread"), 0);
    }
}
