//! Integration tests for query execution and history.

use super::seeded_context;
use glance_board::db::Value;
use glance_board::query::DEFAULT_HISTORY_LIMIT;
use glance_board::transform::{SortDirection, TableView};
use tempfile::tempdir;

#[tokio::test]
async fn test_history_keeps_newest_hundred() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;

    for i in 0..105 {
        ctx.executor()
            .execute(&format!("SELECT {i} AS n"))
            .await
            .unwrap();
    }

    let history = ctx.executor().history();
    assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
    let sqls: Vec<&str> = history.iter().map(|h| h.sql.as_str()).collect();
    assert_eq!(sqls.first(), Some(&"SELECT 104 AS n"));
    assert_eq!(sqls.last(), Some(&"SELECT 5 AS n"));
    assert!(history.iter().all(|h| h.success && h.row_count == 1));
}

#[tokio::test]
async fn test_failed_query_keeps_previous_result() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    let executor = ctx.executor();

    let ok = executor
        .execute("SELECT name FROM users ORDER BY id")
        .await
        .unwrap();
    assert_eq!(ok.row_count, 3);

    let err = executor.execute("SELECT * FROM missing").await.unwrap_err();
    assert!(err.message().contains("missing"));

    assert_eq!(executor.current_result(), Some(ok));
    assert_eq!(executor.current_error().as_deref(), Some(err.message()));
    assert!(!executor.is_executing());

    let latest = executor.history().latest().cloned().unwrap();
    assert_eq!(latest.sql, "SELECT * FROM missing");
    assert!(!latest.success);
    assert_eq!(latest.row_count, 0);
    assert_eq!(latest.error.as_deref(), Some(err.message()));

    executor.execute("SELECT 1").await.unwrap();
    assert_eq!(executor.current_error(), None);
}

#[tokio::test]
async fn test_table_preview_skips_history() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;

    let page = ctx
        .executor()
        .get_table_data("users", 2, 1)
        .await
        .unwrap();
    assert_eq!(page.row_count, 2);
    assert_eq!(page.rows[0][1], Value::String("bob".to_string()));
    assert!(ctx.executor().history().is_empty());
}

#[tokio::test]
async fn test_sorted_view_over_real_result() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;

    let result = ctx
        .executor()
        .execute("SELECT name, country FROM users")
        .await
        .unwrap();

    let mut view = TableView::new(2);
    view.sort_by("country", SortDirection::Asc);
    let names: Vec<String> = view
        .apply(&result)
        .iter()
        .map(|row| row[0].to_display_string())
        .collect();
    assert_eq!(names, vec!["bob", "alice"]);

    view.set_page(1);
    let rest: Vec<String> = view
        .apply(&result)
        .iter()
        .map(|row| row[0].to_display_string())
        .collect();
    assert_eq!(rest, vec!["carol"]);
    assert_eq!(view.page_count(result.row_count), 2);
}

#[tokio::test]
async fn test_queries_need_an_open_database() {
    let dir = tempdir().unwrap();
    let ctx = seeded_context(&dir).await;
    ctx.session().close_database().await.unwrap();

    let err = ctx.executor().execute("SELECT 1").await.unwrap_err();
    assert_eq!(err.message(), "No database selected");
}
