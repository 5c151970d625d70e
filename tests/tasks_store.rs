#[cfg(test)]
mod tests {
    use std::time::Duration;
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};
    use todo_api::db::db::{Db, StoreError};
    use todo_api::db::tasks::Tasks;
    use todo_api::libs::filters::Filters;
    use todo_api::libs::task::Task;

    /// File-backed store in a temporary directory.
    struct StoreTestContext {
        _temp_dir: TempDir,
        tasks: Tasks,
    }

    impl AsyncTestContext for StoreTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let dsn = temp_dir.path().join("todo.db");
            let db = Db::open(&dsn.to_string_lossy(), Duration::from_secs(3)).unwrap();

            StoreTestContext {
                _temp_dir: temp_dir,
                tasks: Tasks::new(db),
            }
        }
    }

    impl StoreTestContext {
        async fn seed(&self, title: &str, description: &str, completed: bool) -> Task {
            let mut task = Task::new(title, description, completed);
            self.tasks.insert(&mut task).await.unwrap();
            task
        }
    }

    fn filters(page: i64, page_size: i64, sort: &str) -> Filters {
        Filters {
            page,
            page_size,
            sort: sort.to_string(),
            ..Filters::default()
        }
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_insert_and_get(ctx: &mut StoreTestContext) {
        let task = ctx.seed("buy milk", "2%", false).await;

        assert!(task.id > 0);
        assert_eq!(task.version, 1);

        let stored = ctx.tasks.get(task.id).await.unwrap();
        assert_eq!(stored, task);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_get_missing_and_invalid_ids(ctx: &mut StoreTestContext) {
        assert!(matches!(ctx.tasks.get(999).await, Err(StoreError::RecordNotFound)));
        assert!(matches!(ctx.tasks.get(0).await, Err(StoreError::RecordNotFound)));
        assert!(matches!(ctx.tasks.get(-1).await, Err(StoreError::RecordNotFound)));
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_update_increments_version(ctx: &mut StoreTestContext) {
        let mut task = ctx.seed("buy milk", "2%", false).await;

        task.completed = true;
        ctx.tasks.update(&mut task).await.unwrap();
        assert_eq!(task.version, 2);

        let stored = ctx.tasks.get(task.id).await.unwrap();
        assert!(stored.completed);
        assert_eq!(stored.version, 2);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_stale_update_is_rejected(ctx: &mut StoreTestContext) {
        let task = ctx.seed("buy milk", "2%", false).await;

        let mut first = ctx.tasks.get(task.id).await.unwrap();
        let mut second = ctx.tasks.get(task.id).await.unwrap();

        first.title = "buy oat milk".to_string();
        ctx.tasks.update(&mut first).await.unwrap();

        second.title = "buy soy milk".to_string();
        assert!(matches!(ctx.tasks.update(&mut second).await, Err(StoreError::EditConflict)));
        assert_eq!(second.version, 1);

        let stored = ctx.tasks.get(task.id).await.unwrap();
        assert_eq!(stored.title, "buy oat milk");
        assert_eq!(stored.version, 2);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_delete(ctx: &mut StoreTestContext) {
        let task = ctx.seed("buy milk", "2%", false).await;

        ctx.tasks.delete(task.id).await.unwrap();
        assert!(matches!(ctx.tasks.get(task.id).await, Err(StoreError::RecordNotFound)));
        assert!(matches!(ctx.tasks.delete(task.id).await, Err(StoreError::RecordNotFound)));
        assert!(matches!(ctx.tasks.delete(0).await, Err(StoreError::RecordNotFound)));
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_deleted_ids_are_not_reused(ctx: &mut StoreTestContext) {
        let first = ctx.seed("a", "a", false).await;
        ctx.tasks.delete(first.id).await.unwrap();

        let second = ctx.seed("b", "b", false).await;
        assert!(second.id > first.id);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_list_paginates(ctx: &mut StoreTestContext) {
        for i in 1..=25 {
            ctx.seed(&format!("task {i}"), "something", false).await;
        }

        let (tasks, metadata) = ctx.tasks.get_all("", "", None, &Filters::default()).await.unwrap();
        assert_eq!(tasks.len(), 20);
        assert!(tasks.windows(2).all(|pair| pair[0].id < pair[1].id));
        assert_eq!(metadata.current_page, 1);
        assert_eq!(metadata.page_size, 20);
        assert_eq!(metadata.first_page, 1);
        assert_eq!(metadata.last_page, 2);
        assert_eq!(metadata.total_records, 25);

        let (tasks, metadata) = ctx.tasks.get_all("", "", None, &filters(2, 20, "id")).await.unwrap();
        assert_eq!(tasks.len(), 5);
        assert_eq!(metadata.current_page, 2);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_page_past_the_end_is_empty(ctx: &mut StoreTestContext) {
        ctx.seed("buy milk", "2%", false).await;

        let (tasks, metadata) = ctx.tasks.get_all("", "", None, &filters(5, 20, "id")).await.unwrap();
        assert!(tasks.is_empty());
        assert_eq!(metadata.total_records, 0);
        assert_eq!(metadata.last_page, 0);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_title_search_requires_every_word(ctx: &mut StoreTestContext) {
        ctx.seed("buy milk", "corner shop", false).await;
        ctx.seed("buy bread", "bakery", false).await;
        ctx.seed("milk the cow", "farm", false).await;

        let (tasks, metadata) = ctx.tasks.get_all("buy milk", "", None, &Filters::default()).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "buy milk");
        assert_eq!(metadata.total_records, 1);

        let (tasks, _) = ctx.tasks.get_all("MILK", "", None, &Filters::default()).await.unwrap();
        assert_eq!(tasks.len(), 2);

        let (tasks, _) = ctx.tasks.get_all("", "bakery", None, &Filters::default()).await.unwrap();
        assert_eq!(tasks[0].title, "buy bread");
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_search_without_words_matches_nothing(ctx: &mut StoreTestContext) {
        ctx.seed("buy milk", "2%", false).await;

        let (tasks, metadata) = ctx.tasks.get_all("%%", "", None, &Filters::default()).await.unwrap();
        assert!(tasks.is_empty());
        assert_eq!(metadata.total_records, 0);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_completed_filter(ctx: &mut StoreTestContext) {
        ctx.seed("a", "a", true).await;
        ctx.seed("b", "b", false).await;
        ctx.seed("c", "c", true).await;

        let (done, _) = ctx.tasks.get_all("", "", Some(true), &Filters::default()).await.unwrap();
        assert_eq!(done.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), ["a", "c"]);

        let (open, _) = ctx.tasks.get_all("", "", Some(false), &Filters::default()).await.unwrap();
        assert_eq!(open.len(), 1);

        let (all, _) = ctx.tasks.get_all("", "", None, &Filters::default()).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_sort_descending_with_id_tiebreak(ctx: &mut StoreTestContext) {
        let apple = ctx.seed("apple", "x", false).await;
        let pear_one = ctx.seed("pear", "x", false).await;
        let pear_two = ctx.seed("pear", "y", false).await;

        let (tasks, _) = ctx.tasks.get_all("", "", None, &filters(1, 20, "-title")).await.unwrap();
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, [pear_one.id, pear_two.id, apple.id]);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_unsafe_sort_is_refused(ctx: &mut StoreTestContext) {
        let result = ctx.tasks.get_all("", "", None, &filters(1, 20, "id; DROP TABLE task_list")).await;
        assert!(matches!(result, Err(StoreError::UnsafeSort(_))));
    }
}
