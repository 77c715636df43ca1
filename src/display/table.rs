use crate::core::inspect::{EXPAND_THRESHOLD, is_expandable};
use crate::core::notify::NotificationState;
use crate::core::session::{ActiveView, SessionState, Status};
use crate::display::display_options::DisplayOptions;
use crate::error::AppError;
use crate::utils::text::{preview_chars, truncate_text_unicode};
use comfy_table::{Attribute, Cell, Color, Table, presets};
use crossterm::terminal;

/// Formatter for session state: result tables, previews, errors, and the
/// notification line.
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
        }
    }

    pub fn from_options(options: &DisplayOptions) -> Self {
        Self {
            max_width: options.max_width.or_else(Self::detect_terminal_width),
            use_colors: options.use_colors(),
        }
    }

    /// Detect terminal width, clamped for stability
    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => {
                let width = cols as usize;
                Some(width.clamp(40, 200))
            }
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Render the current result pane: exactly one of query result, table
    /// preview, error panel, or the idle placeholder.
    pub fn render_active_view(&self, state: &SessionState) -> Result<String, AppError> {
        if state.status == Status::Loading {
            return Ok("Loading...".to_string());
        }

        match &state.active_view {
            ActiveView::None => {
                Ok("Run a query or select a table to preview its data.".to_string())
            }
            ActiveView::QueryResult { columns, rows } => {
                let mut output = String::from("Query Result\n");
                output.push_str(&self.render_row_table(columns, rows)?);
                Ok(output)
            }
            ActiveView::TablePreview {
                table,
                columns,
                rows,
            } => {
                let mut output = format!("Table Preview: {}\n", table);
                output.push_str(&self.render_row_table(columns, rows)?);
                Ok(output)
            }
            ActiveView::Error(message) => Ok(self.render_error_panel(message)),
        }
    }

    /// Render a column/row mapping as a table. Cell values longer than the
    /// expansion threshold are shortened; the full value is reachable through
    /// the expand overlay.
    pub fn render_row_table(
        &self,
        columns: &[String],
        rows: &[crate::api::models::Row],
    ) -> Result<String, AppError> {
        if columns.is_empty() && rows.is_empty() {
            return Ok("Query returned no results.".to_string());
        }

        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
        self.configure_table_width(&mut table);

        let headers: Vec<Cell> = columns
            .iter()
            .map(|col| {
                if self.use_colors {
                    Cell::new(col).add_attribute(Attribute::Bold).fg(Color::Green)
                } else {
                    Cell::new(col).add_attribute(Attribute::Bold)
                }
            })
            .collect();
        table.set_header(headers);

        for row in rows {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|col| {
                    let value = row.get(col).unwrap_or(&serde_json::Value::Null);
                    let formatted = self.format_cell_value(value);
                    if self.use_colors && matches!(value, serde_json::Value::Null) {
                        Cell::new(formatted)
                            .fg(Color::DarkGrey)
                            .add_attribute(Attribute::Italic)
                    } else {
                        Cell::new(formatted)
                    }
                })
                .collect();
            table.add_row(cells);
        }

        let mut output = table.to_string();

        let truncated = rows.iter().any(|row| {
            columns.iter().any(|col| {
                matches!(row.get(col), Some(serde_json::Value::String(s)) if is_expandable(s))
            })
        });
        if truncated {
            output.push_str("\nLong values shortened; use ':expand <row> <col>' to see one in full.");
        }

        Ok(output)
    }

    /// Render the table sidebar list, marking the previewed table.
    pub fn render_tables_list(&self, tables: &[String], selected: Option<&str>) -> String {
        if tables.is_empty() {
            return "No tables found.".to_string();
        }

        let name_width = self.max_width.unwrap_or(80).saturating_sub(2);
        let mut output = String::from("Available Tables:\n");
        for table in tables {
            let marker = if Some(table.as_str()) == selected {
                "*"
            } else {
                " "
            };
            output.push_str(&format!(
                "{} {}\n",
                marker,
                truncate_text_unicode(table, name_width)
            ));
        }
        output
    }

    pub fn render_error_panel(&self, message: &str) -> String {
        format!("⚠️ {}", message)
    }

    /// The one-line rendering of the notification slot, when visible.
    pub fn notification_line(&self, notification: &NotificationState) -> Option<String> {
        if !notification.visible {
            return None;
        }
        Some(format!(
            "{} {}",
            notification.severity.icon(),
            notification.message
        ))
    }

    /// Render the expand overlay for one full cell value.
    pub fn render_expanded_cell(&self, value: &str) -> String {
        format!("Full Value\n----------\n{}", value)
    }

    /// Set table width to match the terminal size
    fn configure_table_width(&self, table: &mut Table) {
        if let Some(terminal_width) = self.max_width {
            let available_width = if terminal_width > 20 {
                terminal_width - 6
            } else {
                terminal_width.max(40)
            };

            table.set_width(available_width as u16);
        } else {
            table.set_width(80);
        }
    }

    /// Format cell value for table display
    pub fn format_cell_value(&self, value: &serde_json::Value) -> String {
        match value {
            serde_json::Value::Null => "-".to_string(),
            serde_json::Value::String(s) => preview_chars(s, EXPAND_THRESHOLD),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Array(arr) => {
                if arr.is_empty() {
                    "[]".to_string()
                } else {
                    format!("[{} items]", arr.len())
                }
            }
            serde_json::Value::Object(obj) => {
                if obj.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{{} items}}", obj.len())
                }
            }
        }
    }
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::Severity;
    use serde_json::json;

    fn display() -> TableDisplay {
        TableDisplay::new().with_max_width(80).with_colors(false)
    }

    fn row(value: serde_json::Value) -> crate::api::models::Row {
        serde_json::from_value(value).unwrap()
    }

    fn state_with_view(active_view: ActiveView) -> SessionState {
        SessionState {
            query_text: String::new(),
            status: Status::Idle,
            active_view,
            tables: Vec::new(),
            selected_table: None,
        }
    }

    #[test]
    fn test_render_result_table() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![
            row(json!({"id": 1, "name": "Alice"})),
            row(json!({"id": 2, "name": "Bob"})),
            row(json!({"id": 3, "name": null})),
        ];

        let rendered = display().render_row_table(&columns, &rows).unwrap();
        assert!(rendered.contains("id"));
        assert!(rendered.contains("Alice"));
        assert!(rendered.contains("Bob"));
        assert!(rendered.contains("-"));
    }

    #[test]
    fn test_long_values_are_shortened_with_hint() {
        let columns = vec!["note".to_string()];
        let long_value = "a".repeat(30);
        let rows = vec![row(json!({"note": long_value}))];

        let rendered = display().render_row_table(&columns, &rows).unwrap();
        assert!(rendered.contains(&format!("{}...", "a".repeat(20))));
        assert!(!rendered.contains(&"a".repeat(30)));
        assert!(rendered.contains(":expand"));
    }

    #[test]
    fn test_exactly_twenty_chars_not_shortened() {
        let columns = vec!["note".to_string()];
        let value = "a".repeat(20);
        let rows = vec![row(json!({"note": value}))];

        let rendered = display().render_row_table(&columns, &rows).unwrap();
        assert!(rendered.contains(&"a".repeat(20)));
        assert!(!rendered.contains(":expand"));
    }

    #[test]
    fn test_missing_column_value_renders_dash() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![row(json!({"id": 1}))];

        let rendered = display().render_row_table(&columns, &rows).unwrap();
        assert!(rendered.contains('-'));
    }

    #[test]
    fn test_render_active_view_variants() {
        let d = display();

        let idle = state_with_view(ActiveView::None);
        assert!(d
            .render_active_view(&idle)
            .unwrap()
            .contains("Run a query"));

        let error = state_with_view(ActiveView::Error("no such table".to_string()));
        assert!(d
            .render_active_view(&error)
            .unwrap()
            .contains("no such table"));

        let preview = state_with_view(ActiveView::TablePreview {
            table: "orders".to_string(),
            columns: vec!["id".to_string()],
            rows: vec![],
        });
        assert!(d
            .render_active_view(&preview)
            .unwrap()
            .contains("Table Preview: orders"));

        let mut loading = state_with_view(ActiveView::None);
        loading.status = Status::Loading;
        assert_eq!(d.render_active_view(&loading).unwrap(), "Loading...");
    }

    #[test]
    fn test_render_tables_list_marks_selected() {
        let tables = vec!["customers".to_string(), "orders".to_string()];
        let rendered = display().render_tables_list(&tables, Some("orders"));
        assert!(rendered.contains("  customers"));
        assert!(rendered.contains("* orders"));

        let rendered = display().render_tables_list(&[], None);
        assert_eq!(rendered, "No tables found.");
    }

    #[test]
    fn test_notification_line() {
        let d = display();

        let hidden = NotificationState {
            visible: false,
            severity: Severity::Info,
            message: "kept".to_string(),
        };
        assert!(d.notification_line(&hidden).is_none());

        let visible = NotificationState {
            visible: true,
            severity: Severity::Success,
            message: "Query executed successfully".to_string(),
        };
        let line = d.notification_line(&visible).unwrap();
        assert!(line.contains("✅"));
        assert!(line.contains("Query executed successfully"));
    }

    #[test]
    fn test_format_cell_value() {
        let d = display();
        assert_eq!(d.format_cell_value(&json!(null)), "-");
        assert_eq!(d.format_cell_value(&json!("text")), "text");
        assert_eq!(d.format_cell_value(&json!(123)), "123");
        assert_eq!(d.format_cell_value(&json!(true)), "true");
        assert_eq!(d.format_cell_value(&json!([])), "[]");
        assert_eq!(d.format_cell_value(&json!([1, 2])), "[2 items]");
        assert_eq!(d.format_cell_value(&json!({"a": 1})), "{1 items}");
    }

    #[test]
    fn test_render_expanded_cell() {
        let rendered = display().render_expanded_cell("the full value");
        assert!(rendered.contains("Full Value"));
        assert!(rendered.contains("the full value"));
    }
}
