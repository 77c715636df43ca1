use crate::core::session::{ActiveView, DatabaseService, SessionController};
use crate::display::TableDisplay;
use crate::error::AppError;
use crate::utils::logging::print_verbose;
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// One console input line, parsed. Anything that is not a `:` command is
/// treated as SQL; no client-side validation is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Sql(String),
    Tables,
    Preview(String),
    Expand { row: usize, column: String },
    Collapse,
    Dismiss,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return ConsoleCommand::Empty;
        }
        if !trimmed.starts_with(':') {
            return ConsoleCommand::Sql(trimmed.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or_default();
        match command {
            ":tables" => ConsoleCommand::Tables,
            ":preview" => {
                ConsoleCommand::Preview(parts.next().unwrap_or_default().to_string())
            }
            ":expand" => {
                let row = parts.next().and_then(|s| s.parse::<usize>().ok());
                let column = parts.next().map(str::to_string);
                match (row, column) {
                    (Some(row), Some(column)) => ConsoleCommand::Expand { row, column },
                    _ => ConsoleCommand::Unknown(
                        "usage: :expand <row> <column>".to_string(),
                    ),
                }
            }
            ":collapse" => ConsoleCommand::Collapse,
            ":dismiss" => ConsoleCommand::Dismiss,
            ":help" => ConsoleCommand::Help,
            ":quit" | ":q" => ConsoleCommand::Quit,
            other => ConsoleCommand::Unknown(format!("unknown command: {}", other)),
        }
    }
}

/// Interactive console: a line-oriented loop over one session. The prompt
/// returns only when the previous operation has settled, so overlapping
/// primary operations cannot be issued from here; the generation guard in
/// the controller still protects a torn-down session's late responses.
pub struct ConsoleSession<S: DatabaseService> {
    controller: SessionController<S>,
    display: TableDisplay,
    verbose: bool,
}

impl<S: DatabaseService> ConsoleSession<S> {
    pub fn new(controller: SessionController<S>, display: TableDisplay, verbose: bool) -> Self {
        Self {
            controller,
            display,
            verbose,
        }
    }

    pub async fn run(&mut self) -> Result<(), AppError> {
        println!("sqlr-cli console. ':help' for commands, ':quit' to exit.");

        // Populate the sidebar once on entry; failure is notification-only.
        self.controller.list_tables().await;
        self.render_tables();
        self.render_notification();

        let stdin = io::stdin();
        loop {
            self.controller.tick(Instant::now());

            print!("sqlr> ");
            io::stdout().flush().ok();

            let mut line = String::new();
            let read = stdin.lock().read_line(&mut line).unwrap_or(0);
            if read == 0 {
                // EOF behaves like :quit
                self.controller.teardown();
                break;
            }

            match ConsoleCommand::parse(&line) {
                ConsoleCommand::Empty => continue,
                ConsoleCommand::Quit => {
                    self.controller.teardown();
                    println!("Session ended.");
                    break;
                }
                ConsoleCommand::Help => self.print_help(),
                ConsoleCommand::Sql(sql) => {
                    print_verbose(self.verbose, &format!("Executing: {}", sql));
                    self.controller.set_query_text(sql);
                    self.controller.execute_query().await;
                    self.render_view();
                    self.render_tables();
                    self.render_notification();
                }
                ConsoleCommand::Tables => {
                    self.controller.list_tables().await;
                    self.render_tables();
                    self.render_notification();
                }
                ConsoleCommand::Preview(table) => {
                    self.controller.preview_table(&table).await;
                    self.render_view();
                    self.render_notification();
                }
                ConsoleCommand::Expand { row, column } => {
                    self.expand_cell(row, &column);
                }
                ConsoleCommand::Collapse => {
                    self.controller.collapse_cell();
                }
                ConsoleCommand::Dismiss => {
                    self.controller.dismiss_notification();
                }
                ConsoleCommand::Unknown(message) => println!("{}", message),
            }
        }

        Ok(())
    }

    /// Look up a displayed cell and open it in the expand overlay. Only
    /// string values beyond the truncation threshold are expandable.
    fn expand_cell(&mut self, row_index: usize, column: &str) {
        let value = match &self.controller.state().active_view {
            ActiveView::QueryResult { rows, .. } | ActiveView::TablePreview { rows, .. } => {
                rows.get(row_index).and_then(|row| row.get(column)).cloned()
            }
            _ => None,
        };

        match value {
            Some(serde_json::Value::String(text)) => {
                if self.controller.expand_cell(&text) {
                    println!(
                        "{}",
                        self.display
                            .render_expanded_cell(self.controller.expanded_cell().unwrap_or(""))
                    );
                } else {
                    println!("Value fits on screen; nothing to expand.");
                }
            }
            Some(_) => println!("Only long text values can be expanded."),
            None => println!("No such cell: row {}, column '{}'", row_index, column),
        }
    }

    fn render_view(&self) {
        match self.display.render_active_view(self.controller.state()) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => crate::utils::logging::log_error(&format!("{}", e)),
        }
    }

    fn render_tables(&self) {
        let state = self.controller.state();
        println!(
            "{}",
            self.display
                .render_tables_list(&state.tables, state.selected_table.as_deref())
        );
    }

    fn render_notification(&self) {
        if let Some(line) = self.display.notification_line(self.controller.notifications()) {
            println!("{}", line);
        }
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  <sql>                 execute a statement");
        println!("  :tables               refresh and list tables");
        println!("  :preview <table>      show column info and sample rows");
        println!("  :expand <row> <col>   show a shortened cell in full");
        println!("  :collapse             close the expanded cell");
        println!("  :dismiss              hide the notification");
        println!("  :quit                 end the session");
    }
}
