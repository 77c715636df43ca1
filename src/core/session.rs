use crate::api::models::{Row, StatementOutcome, TablePreviewResponse};
use crate::core::inspect::CellInspector;
use crate::core::notify::{NotificationChannel, NotificationState, Severity};
use crate::error::ApiError;
use async_trait::async_trait;
use std::time::Instant;

/// Statement preloaded into a fresh session.
pub const DEFAULT_QUERY: &str = "SELECT * FROM customers;";

/// Seam between the session core and the SQL runner service. Implemented by
/// `RunnerClient`; unit tests substitute a scripted stub.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    async fn execute(&self, query: &str) -> Result<StatementOutcome, ApiError>;
    async fn list_tables(&self) -> Result<Vec<String>, ApiError>;
    async fn table_preview(&self, table: &str) -> Result<TablePreviewResponse, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
}

/// The one result variant currently displayed. Exactly one is current at any
/// observable instant.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveView {
    None,
    QueryResult {
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    TablePreview {
        table: String,
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub query_text: String,
    pub status: Status,
    pub active_view: ActiveView,
    pub tables: Vec<String>,
    pub selected_table: Option<String>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            query_text: DEFAULT_QUERY.to_string(),
            status: Status::Idle,
            active_view: ActiveView::None,
            tables: Vec::new(),
            selected_table: None,
        }
    }
}

/// Owns the authoritative interaction state for one query/preview session.
///
/// Each primary operation captures a fresh request generation when issued;
/// on settlement the result is applied only if the captured generation is
/// still current. Responses made stale by a newer operation (or by
/// teardown) are discarded wholesale: no state change, no notification.
/// The view/status pair is always updated in one synchronous step, so no
/// intermediate state is observable where `status` is `Idle` but the view
/// reflects an in-flight request.
pub struct SessionController<S: DatabaseService> {
    service: S,
    state: SessionState,
    notifications: NotificationChannel,
    inspector: CellInspector,
    generation: u64,
}

impl<S: DatabaseService> SessionController<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: SessionState::new(),
            notifications: NotificationChannel::new(),
            inspector: CellInspector::new(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn notifications(&self) -> &NotificationState {
        self.notifications.state()
    }

    pub fn expanded_cell(&self) -> Option<&str> {
        self.inspector.expanded()
    }

    pub fn set_query_text(&mut self, text: impl Into<String>) {
        self.state.query_text = text.into();
    }

    /// Submit the current statement. On success the table list is refreshed
    /// as a dependent follow-up whose failure is reported via notification
    /// only and never overwrites the result view.
    pub async fn execute_query(&mut self) {
        let generation = self.begin_primary();
        let outcome = self.service.execute(&self.state.query_text).await;
        if self.apply_execute_result(generation, outcome) {
            self.list_tables().await;
        }
    }

    /// Read-only table-list refresh: never toggles `status`, never touches
    /// the active view. Failure is downgraded to an error notification.
    pub async fn list_tables(&mut self) {
        let generation = self.generation;
        let outcome = self.service.list_tables().await;
        self.apply_tables_result(generation, outcome);
    }

    /// Fetch column metadata and sample rows for `name`. No-op when the name
    /// is empty.
    pub async fn preview_table(&mut self, name: &str) {
        if name.is_empty() {
            return;
        }
        let generation = self.begin_primary();
        self.state.selected_table = Some(name.to_string());
        let outcome = self.service.table_preview(name).await;
        self.apply_preview_result(generation, name, outcome);
    }

    /// Expand a cell value in the overlay. Values of 20 characters or fewer
    /// are shown in full already and are not taken.
    pub fn expand_cell(&mut self, value: &str) -> bool {
        self.inspector.expand(value)
    }

    pub fn collapse_cell(&mut self) {
        self.inspector.collapse();
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.dismiss();
    }

    /// Drive the notification auto-dismiss timer.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.notifications.tick(now)
    }

    /// End the session. Any request still in flight settles against a stale
    /// generation and is discarded.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.inspector.collapse();
        self.notifications.dismiss();
        self.state = SessionState::new();
    }

    /// Start a primary operation: bump the generation, enter `Loading`, and
    /// clear the result pane. The expanded cell never survives a view change.
    fn begin_primary(&mut self) -> u64 {
        self.generation += 1;
        self.state.status = Status::Loading;
        self.state.active_view = ActiveView::None;
        self.state.selected_table = None;
        self.inspector.collapse();
        self.generation
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.generation
    }

    /// Apply a settled `/execute` response. Returns whether the dependent
    /// table refresh should follow.
    fn apply_execute_result(
        &mut self,
        generation: u64,
        outcome: Result<StatementOutcome, ApiError>,
    ) -> bool {
        if self.is_stale(generation) {
            return false;
        }

        self.inspector.collapse();
        match outcome {
            Ok(StatementOutcome::ResultSet { columns, rows }) => {
                self.state.active_view = ActiveView::QueryResult { columns, rows };
                self.state.status = Status::Idle;
                self.notifications
                    .notify(Severity::Success, "Query executed successfully");
                true
            }
            Ok(StatementOutcome::Mutation {
                message,
                rows_affected,
            }) => {
                self.state.active_view = ActiveView::QueryResult {
                    columns: Vec::new(),
                    rows: Vec::new(),
                };
                self.state.status = Status::Idle;
                self.notifications.notify(
                    Severity::Success,
                    format!("{} ({} rows affected)", message, rows_affected),
                );
                true
            }
            Err(error) => {
                let message = error
                    .server_message()
                    .unwrap_or("Query failed")
                    .to_string();
                self.state.active_view = ActiveView::Error(message.clone());
                self.state.status = Status::Idle;
                self.notifications.notify(Severity::Error, message);
                false
            }
        }
    }

    fn apply_tables_result(&mut self, generation: u64, outcome: Result<Vec<String>, ApiError>) {
        if self.is_stale(generation) {
            return;
        }

        match outcome {
            Ok(tables) => {
                // Wholesale replacement, server order preserved.
                self.state.tables = tables;
            }
            Err(_) => {
                self.notifications
                    .notify(Severity::Error, "Failed to fetch tables");
            }
        }
    }

    fn apply_preview_result(
        &mut self,
        generation: u64,
        name: &str,
        outcome: Result<TablePreviewResponse, ApiError>,
    ) {
        if self.is_stale(generation) {
            return;
        }

        self.inspector.collapse();
        match outcome {
            Ok(preview) => {
                let columns: Vec<String> = preview
                    .columns
                    .iter()
                    .filter_map(|descriptor| descriptor.label())
                    .map(str::to_string)
                    .collect();
                self.state.active_view = ActiveView::TablePreview {
                    table: name.to_string(),
                    columns,
                    rows: preview.sample,
                };
                self.state.status = Status::Idle;
                self.notifications
                    .notify(Severity::Info, format!("Previewing {}", name));
            }
            Err(error) => {
                let message = error
                    .server_message()
                    .map(str::to_string)
                    .or_else(|| error.transport_message())
                    .unwrap_or_else(|| format!("Failed to preview table: {}", name));
                // A selected table only accompanies a live preview.
                self.state.selected_table = None;
                self.state.active_view = ActiveView::Error(message.clone());
                self.state.status = Status::Idle;
                self.notifications.notify(Severity::Error, message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ColumnDescriptor;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted service: each call pops the next queued response.
    #[derive(Default)]
    struct StubService {
        execute: Mutex<VecDeque<Result<StatementOutcome, ApiError>>>,
        tables: Mutex<VecDeque<Result<Vec<String>, ApiError>>>,
        previews: Mutex<VecDeque<Result<TablePreviewResponse, ApiError>>>,
    }

    impl StubService {
        fn on_execute(self, outcome: Result<StatementOutcome, ApiError>) -> Self {
            self.execute.lock().unwrap().push_back(outcome);
            self
        }

        fn on_tables(self, outcome: Result<Vec<String>, ApiError>) -> Self {
            self.tables.lock().unwrap().push_back(outcome);
            self
        }

        fn on_preview(self, outcome: Result<TablePreviewResponse, ApiError>) -> Self {
            self.previews.lock().unwrap().push_back(outcome);
            self
        }
    }

    #[async_trait]
    impl DatabaseService for StubService {
        async fn execute(&self, _query: &str) -> Result<StatementOutcome, ApiError> {
            self.execute
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected execute call")
        }

        async fn list_tables(&self) -> Result<Vec<String>, ApiError> {
            self.tables
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected list_tables call")
        }

        async fn table_preview(&self, _table: &str) -> Result<TablePreviewResponse, ApiError> {
            self.previews
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected table_preview call")
        }
    }

    fn result_set() -> StatementOutcome {
        StatementOutcome::ResultSet {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                serde_json::from_value(json!({"id": 1, "name": "Ann"})).unwrap(),
            ],
        }
    }

    fn service_error(message: &str) -> ApiError {
        ApiError::Service {
            status: 400,
            endpoint: "/execute".to_string(),
            message: message.to_string(),
        }
    }

    fn transport_error(message: &str) -> ApiError {
        ApiError::Transport {
            endpoint: "/execute".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_fresh_session_defaults() {
        let controller = SessionController::new(StubService::default());
        let state = controller.state();
        assert_eq!(state.query_text, DEFAULT_QUERY);
        assert_eq!(state.status, Status::Idle);
        assert_eq!(state.active_view, ActiveView::None);
        assert!(state.tables.is_empty());
        assert!(state.selected_table.is_none());
        assert!(!controller.notifications().visible);
    }

    #[tokio::test]
    async fn test_execute_query_success() {
        let service = StubService::default()
            .on_execute(Ok(result_set()))
            .on_tables(Ok(vec!["customers".to_string(), "orders".to_string()]));
        let mut controller = SessionController::new(service);

        controller.execute_query().await;

        let state = controller.state();
        assert_eq!(state.status, Status::Idle);
        match &state.active_view {
            ActiveView::QueryResult { columns, rows } => {
                assert_eq!(columns, &["id", "name"]);
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0]["name"], json!("Ann"));
            }
            other => panic!("expected query result, got {:?}", other),
        }
        assert_eq!(state.tables, vec!["customers", "orders"]);
        assert!(state.selected_table.is_none());

        let notification = controller.notifications();
        assert!(notification.visible);
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.message, "Query executed successfully");
    }

    #[tokio::test]
    async fn test_execute_query_failure_prefers_server_error() {
        let service =
            StubService::default().on_execute(Err(service_error("syntax error at line 1")));
        let mut controller = SessionController::new(service);

        controller.execute_query().await;

        let state = controller.state();
        assert_eq!(state.status, Status::Idle);
        assert_eq!(
            state.active_view,
            ActiveView::Error("syntax error at line 1".to_string())
        );
        let notification = controller.notifications();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, "syntax error at line 1");
    }

    #[tokio::test]
    async fn test_execute_query_transport_failure_uses_generic_message() {
        let service = StubService::default().on_execute(Err(transport_error("connection reset")));
        let mut controller = SessionController::new(service);

        controller.execute_query().await;

        assert_eq!(
            controller.state().active_view,
            ActiveView::Error("Query failed".to_string())
        );
        assert_eq!(controller.notifications().message, "Query failed");
    }

    #[tokio::test]
    async fn test_dependent_table_refresh_failure_keeps_result_view() {
        // Scenario C: execute succeeds, follow-up table refresh fails.
        let service = StubService::default()
            .on_execute(Ok(result_set()))
            .on_tables(Err(transport_error("connection refused")));
        let mut controller = SessionController::new(service);
        controller.state.tables = vec!["customers".to_string()];

        controller.execute_query().await;

        let state = controller.state();
        assert!(matches!(state.active_view, ActiveView::QueryResult { .. }));
        assert_eq!(state.tables, vec!["customers"]);
        assert_eq!(state.status, Status::Idle);

        let notification = controller.notifications();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, "Failed to fetch tables");
    }

    #[tokio::test]
    async fn test_execute_mutation_outcome() {
        let service = StubService::default()
            .on_execute(Ok(StatementOutcome::Mutation {
                message: "Query executed".to_string(),
                rows_affected: 3,
            }))
            .on_tables(Ok(vec!["customers".to_string()]));
        let mut controller = SessionController::new(service);

        controller.execute_query().await;

        match &controller.state().active_view {
            ActiveView::QueryResult { columns, rows } => {
                assert!(columns.is_empty());
                assert!(rows.is_empty());
            }
            other => panic!("expected empty query result, got {:?}", other),
        }
        let notification = controller.notifications();
        assert_eq!(notification.severity, Severity::Success);
        assert_eq!(notification.message, "Query executed (3 rows affected)");
    }

    #[tokio::test]
    async fn test_list_tables_failure_leaves_state_untouched() {
        let service = StubService::default().on_tables(Err(transport_error("boom")));
        let mut controller = SessionController::new(service);
        controller.state.tables = vec!["customers".to_string()];
        controller.state.active_view = ActiveView::Error("old".to_string());

        controller.list_tables().await;

        let state = controller.state();
        assert_eq!(state.tables, vec!["customers"]);
        assert_eq!(state.active_view, ActiveView::Error("old".to_string()));
        assert_eq!(state.status, Status::Idle);
        assert_eq!(controller.notifications().message, "Failed to fetch tables");
    }

    #[tokio::test]
    async fn test_list_tables_replaces_wholesale_in_server_order() {
        let service =
            StubService::default().on_tables(Ok(vec!["b".to_string(), "a".to_string()]));
        let mut controller = SessionController::new(service);
        controller.state.tables = vec!["stale".to_string(), "entries".to_string()];

        controller.list_tables().await;

        assert_eq!(controller.state().tables, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_preview_table_success() {
        let preview = TablePreviewResponse {
            columns: vec![
                ColumnDescriptor {
                    column_name: Some("id".to_string()),
                    name: None,
                    column: None,
                    data_type: Some("integer".to_string()),
                },
                ColumnDescriptor {
                    column_name: None,
                    name: Some("email".to_string()),
                    column: None,
                    data_type: None,
                },
            ],
            sample: vec![serde_json::from_value(json!({"id": 7, "email": "a@b.c"})).unwrap()],
        };
        let service = StubService::default().on_preview(Ok(preview));
        let mut controller = SessionController::new(service);

        controller.preview_table("orders").await;

        let state = controller.state();
        assert_eq!(state.selected_table.as_deref(), Some("orders"));
        match &state.active_view {
            ActiveView::TablePreview {
                table,
                columns,
                rows,
            } => {
                assert_eq!(table, "orders");
                assert_eq!(columns, &["id", "email"]);
                assert_eq!(rows.len(), 1);
            }
            other => panic!("expected table preview, got {:?}", other),
        }
        let notification = controller.notifications();
        assert_eq!(notification.severity, Severity::Info);
        assert_eq!(notification.message, "Previewing orders");
    }

    #[tokio::test]
    async fn test_preview_table_failure_scenario() {
        // Scenario B: the service reports a structured error.
        let service = StubService::default().on_preview(Err(ApiError::Service {
            status: 500,
            endpoint: "/table/orders".to_string(),
            message: "no such table".to_string(),
        }));
        let mut controller = SessionController::new(service);

        controller.preview_table("orders").await;

        let state = controller.state();
        assert_eq!(state.active_view, ActiveView::Error("no such table".to_string()));
        assert!(state.selected_table.is_none());
        let notification = controller.notifications();
        assert_eq!(notification.severity, Severity::Error);
        assert_eq!(notification.message, "no such table");
    }

    #[tokio::test]
    async fn test_preview_failure_message_precedence() {
        // No server error: fall back to the transport message.
        let service = StubService::default().on_preview(Err(ApiError::Transport {
            endpoint: "/table/orders".to_string(),
            message: "connection refused".to_string(),
        }));
        let mut controller = SessionController::new(service);
        controller.preview_table("orders").await;
        assert_eq!(
            controller.state().active_view,
            ActiveView::Error("connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_preview_empty_name_is_noop() {
        let mut controller = SessionController::new(StubService::default());
        controller.preview_table("").await;

        assert_eq!(controller.state().active_view, ActiveView::None);
        assert_eq!(controller.state().status, Status::Idle);
        assert!(!controller.notifications().visible);
    }

    #[tokio::test]
    async fn test_preview_sample_defaults_to_empty_rows() {
        let preview = TablePreviewResponse {
            columns: vec![ColumnDescriptor {
                column_name: Some("id".to_string()),
                name: None,
                column: None,
                data_type: None,
            }],
            sample: Vec::new(),
        };
        let service = StubService::default().on_preview(Ok(preview));
        let mut controller = SessionController::new(service);

        controller.preview_table("empty_table").await;

        match &controller.state().active_view {
            ActiveView::TablePreview { rows, .. } => assert!(rows.is_empty()),
            other => panic!("expected table preview, got {:?}", other),
        }
    }

    #[test]
    fn test_stale_execute_response_is_discarded() {
        let mut controller = SessionController::new(StubService::default());
        let stale = controller.begin_primary();
        // A newer operation supersedes the first one.
        controller.begin_primary();

        let followed = controller.apply_execute_result(stale, Ok(result_set()));

        assert!(!followed);
        assert_eq!(controller.state().status, Status::Loading);
        assert_eq!(controller.state().active_view, ActiveView::None);
        assert!(!controller.notifications().visible);
    }

    #[test]
    fn test_stale_preview_response_is_discarded() {
        let mut controller = SessionController::new(StubService::default());
        let stale = controller.begin_primary();
        controller.begin_primary();

        controller.apply_preview_result(
            stale,
            "orders",
            Err(service_error("no such table")),
        );

        assert_eq!(controller.state().active_view, ActiveView::None);
        assert!(!controller.notifications().visible);
    }

    #[test]
    fn test_stale_tables_response_is_discarded() {
        let mut controller = SessionController::new(StubService::default());
        let stale = controller.generation;
        controller.begin_primary();

        controller.apply_tables_result(stale, Ok(vec!["late".to_string()]));

        assert!(controller.state().tables.is_empty());
    }

    #[test]
    fn test_teardown_invalidates_in_flight_request() {
        let mut controller = SessionController::new(StubService::default());
        let generation = controller.begin_primary();
        controller.teardown();

        controller.apply_execute_result(generation, Ok(result_set()));

        assert_eq!(controller.state().active_view, ActiveView::None);
        assert_eq!(controller.state().status, Status::Idle);
        assert!(!controller.notifications().visible);
    }

    #[tokio::test]
    async fn test_view_transitions_collapse_expanded_cell() {
        let long_value = "x".repeat(40);

        // New query result collapses.
        let service = StubService::default()
            .on_execute(Ok(result_set()))
            .on_tables(Ok(Vec::new()));
        let mut controller = SessionController::new(service);
        assert!(controller.expand_cell(&long_value));
        controller.execute_query().await;
        assert!(controller.expanded_cell().is_none());

        // Failure transition collapses.
        let service = StubService::default().on_execute(Err(service_error("bad")));
        let mut controller = SessionController::new(service);
        assert!(controller.expand_cell(&long_value));
        controller.execute_query().await;
        assert!(controller.expanded_cell().is_none());

        // New preview collapses.
        let service = StubService::default().on_preview(Ok(TablePreviewResponse {
            columns: Vec::new(),
            sample: Vec::new(),
        }));
        let mut controller = SessionController::new(service);
        assert!(controller.expand_cell(&long_value));
        controller.preview_table("orders").await;
        assert!(controller.expanded_cell().is_none());
    }

    #[test]
    fn test_expand_cell_honors_threshold() {
        let mut controller = SessionController::new(StubService::default());
        assert!(!controller.expand_cell(&"a".repeat(20)));
        assert!(controller.expand_cell(&"a".repeat(21)));
        controller.collapse_cell();
        assert!(controller.expanded_cell().is_none());
    }

    #[tokio::test]
    async fn test_selected_table_never_accompanies_query_result() {
        let preview = TablePreviewResponse {
            columns: Vec::new(),
            sample: Vec::new(),
        };
        let service = StubService::default()
            .on_preview(Ok(preview))
            .on_execute(Ok(result_set()))
            .on_tables(Ok(Vec::new()));
        let mut controller = SessionController::new(service);

        controller.preview_table("orders").await;
        assert!(controller.state().selected_table.is_some());

        controller.execute_query().await;
        assert!(matches!(
            controller.state().active_view,
            ActiveView::QueryResult { .. }
        ));
        assert!(controller.state().selected_table.is_none());
    }

    #[test]
    fn test_teardown_resets_session_state() {
        let mut controller = SessionController::new(StubService::default());
        controller.set_query_text("SELECT 1;");
        controller.state.tables = vec!["customers".to_string()];
        controller.teardown();

        assert_eq!(controller.state(), &SessionState::new());
    }
}
