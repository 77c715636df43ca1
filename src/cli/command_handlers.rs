use crate::core::session::{ActiveView, DatabaseService, SessionController};
use crate::display::{ProgressSpinner, TableDisplay};
use crate::error::{AppError, CliError};
use crate::utils::logging::print_verbose;

/// One-shot session commands: each drives a single Session Controller
/// operation and renders the settled state.
pub struct SessionCommands {
    display: TableDisplay,
    verbose: bool,
}

impl SessionCommands {
    pub fn new(display: TableDisplay, verbose: bool) -> Self {
        Self { display, verbose }
    }

    pub async fn run_query<S: DatabaseService>(
        &self,
        controller: &mut SessionController<S>,
        sql: Option<String>,
    ) -> Result<(), AppError> {
        if let Some(sql) = sql {
            controller.set_query_text(sql);
        }
        print_verbose(
            self.verbose,
            &format!("Executing statement: {}", controller.state().query_text),
        );

        let mut spinner = ProgressSpinner::new("Executing query...".to_string());
        spinner.start();
        controller.execute_query().await;
        spinner.stop();

        self.render_settled(controller)
    }

    pub async fn run_tables<S: DatabaseService>(
        &self,
        controller: &mut SessionController<S>,
    ) -> Result<(), AppError> {
        print_verbose(self.verbose, "Fetching table list");

        controller.list_tables().await;

        let notification = controller.notifications();
        if notification.visible {
            // The refresh settled with a failure; the list itself is untouched.
            if let Some(line) = self.display.notification_line(notification) {
                println!("{}", line);
            }
            return Err(AppError::Cli(CliError::OperationFailed(
                notification.message.clone(),
            )));
        }

        println!(
            "{}",
            self.display
                .render_tables_list(&controller.state().tables, None)
        );
        Ok(())
    }

    pub async fn run_preview<S: DatabaseService>(
        &self,
        controller: &mut SessionController<S>,
        table: &str,
    ) -> Result<(), AppError> {
        print_verbose(self.verbose, &format!("Previewing table: {}", table));

        let mut spinner = ProgressSpinner::new(format!("Previewing {}...", table));
        spinner.start();
        controller.preview_table(table).await;
        spinner.stop();

        self.render_settled(controller)
    }

    /// Print the active view and notification; a settled error view becomes
    /// a failing exit.
    fn render_settled<S: DatabaseService>(
        &self,
        controller: &SessionController<S>,
    ) -> Result<(), AppError> {
        println!("{}", self.display.render_active_view(controller.state())?);

        if let Some(line) = self.display.notification_line(controller.notifications()) {
            println!("{}", line);
        }

        if let ActiveView::Error(message) = &controller.state().active_view {
            return Err(AppError::Cli(CliError::OperationFailed(message.clone())));
        }
        Ok(())
    }
}
