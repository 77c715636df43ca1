use crate::api::client::RunnerClient;
use crate::cli::command_handlers::SessionCommands;
use crate::cli::console::ConsoleSession;
use crate::cli::main_types::{AuthCommands, Commands, ConfigCommands};
use crate::core::auth::LoginInput;
use crate::core::session::SessionController;
use crate::display::{DisplayOptions, TableDisplay};
use crate::error::{ApiError, AppError, AuthError, CliError};
use crate::storage::config::{Config, Profile};
use crate::storage::credentials::Credentials;
use std::path::PathBuf;
use std::sync::Arc;

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    credentials: Credentials,
    verbose: bool,
    display_options: DisplayOptions,
}

impl Dispatcher {
    // Static helper function for verbose logging (used before self exists)
    fn print_verbose(verbose: bool, msg: &str) {
        if verbose {
            println!("Verbose: {}", msg);
        }
    }

    // Instance method for verbose logging
    fn log_verbose(&self, msg: &str) {
        Self::print_verbose(self.verbose, msg);
    }

    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        mut credentials: Credentials,
        verbose: bool,
        display_options: DisplayOptions,
    ) -> Self {
        // Session auto-restoration from the keyring
        Self::print_verbose(verbose, "Checking for saved session token...");

        match Credentials::load(&credentials.profile_name) {
            Ok(loaded_creds) => {
                credentials = loaded_creds;
                Self::print_verbose(
                    verbose,
                    &format!(
                        "Session credentials loaded for profile: {}",
                        credentials.profile_name
                    ),
                );
            }
            Err(_) => {
                Self::print_verbose(
                    verbose,
                    &format!(
                        "No saved session token found for profile: {}",
                        credentials.profile_name
                    ),
                );
            }
        }

        Self {
            config,
            config_path,
            credentials,
            verbose,
            display_options,
        }
    }

    pub async fn dispatch(&mut self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Auth { command } => self.handle_auth_command(command).await,
            Commands::Config { command } => self.handle_config_command(command).await,
            Commands::Query { sql } => self.handle_query_command(sql).await,
            Commands::Tables => self.handle_tables_command().await,
            Commands::Preview { table } => self.handle_preview_command(&table).await,
            Commands::Console => self.handle_console_command().await,
        }
    }

    fn active_profile(&self) -> Result<&Profile, AppError> {
        self.config
            .get_profile(&self.credentials.profile_name)
            .ok_or_else(|| {
                AppError::Cli(CliError::InvalidArguments(format!(
                    "Profile '{}' not found. Please configure a profile first.",
                    self.credentials.profile_name
                )))
            })
    }

    /// Client carrying the stored bearer token as its injected capability.
    fn build_client(&self) -> Result<RunnerClient, AppError> {
        let profile = self.active_profile()?;
        let client = RunnerClient::with_token_provider(
            profile.service_url.clone(),
            Arc::new(self.credentials.clone()),
        )?;
        Ok(client)
    }

    fn require_session(&self) -> Result<(), AppError> {
        if self.credentials.has_session() {
            Ok(())
        } else {
            Err(AppError::Cli(CliError::AuthRequired {
                message: "No active session for this profile".to_string(),
                hint: "'sqlr-cli auth login' to authenticate".to_string(),
            }))
        }
    }

    fn table_display(&self) -> TableDisplay {
        TableDisplay::from_options(&self.display_options)
    }

    /// New session over the authenticated client, seeded with the profile's
    /// default statement when one is configured.
    fn build_session(&self) -> Result<SessionController<RunnerClient>, AppError> {
        self.require_session()?;
        let client = self.build_client()?;
        let mut controller = SessionController::new(client);
        if let Some(default_query) = self
            .active_profile()?
            .default_query
            .as_deref()
        {
            controller.set_query_text(default_query);
        }
        Ok(controller)
    }

    async fn handle_query_command(&self, sql: Option<String>) -> Result<(), AppError> {
        self.log_verbose("Attempting query command");
        let mut controller = self.build_session()?;
        let commands = SessionCommands::new(self.table_display(), self.verbose);
        commands.run_query(&mut controller, sql).await
    }

    async fn handle_tables_command(&self) -> Result<(), AppError> {
        self.log_verbose("Attempting tables command");
        let mut controller = self.build_session()?;
        let commands = SessionCommands::new(self.table_display(), self.verbose);
        commands.run_tables(&mut controller).await
    }

    async fn handle_preview_command(&self, table: &str) -> Result<(), AppError> {
        self.log_verbose(&format!("Attempting preview command - table: {}", table));
        let mut controller = self.build_session()?;
        let commands = SessionCommands::new(self.table_display(), self.verbose);
        commands.run_preview(&mut controller, table).await
    }

    async fn handle_console_command(&self) -> Result<(), AppError> {
        self.log_verbose("Starting interactive console");
        let controller = self.build_session()?;
        let mut console = ConsoleSession::new(controller, self.table_display(), self.verbose);
        console.run().await
    }

    async fn handle_auth_command(&self, commands: AuthCommands) -> Result<(), AppError> {
        match commands {
            AuthCommands::Login => {
                self.log_verbose("Attempting auth login command");
                let profile = self.active_profile()?;
                let input = LoginInput::collect(profile.username.as_deref())?;
                input.validate()?;

                let client = RunnerClient::new(profile.service_url.clone())?;
                match client.login(&input.username, &input.password).await {
                    Ok(response) => {
                        Credentials::save_token_for_profile(
                            &self.credentials.profile_name,
                            &response.access_token,
                        )?;

                        println!("✅ Successfully logged in as {}", input.username);
                        println!("Connected to: {}", profile.service_url);
                        if let Some(minutes) = response.expires_in_minutes {
                            println!("Session expires in {} minutes", minutes);
                        }
                        Ok(())
                    }
                    Err(e) => {
                        println!("❌ Login failed: {}", e);
                        match e {
                            ApiError::Unauthorized { .. } => {
                                Err(AppError::Auth(AuthError::InvalidCredentials))
                            }
                            other => Err(AppError::Api(other)),
                        }
                    }
                }
            }
            AuthCommands::Register => {
                self.log_verbose("Attempting auth register command");
                let profile = self.active_profile()?;
                let input = LoginInput::collect(None)?;
                input.validate()?;

                let client = RunnerClient::new(profile.service_url.clone())?;
                match client.register(&input.username, &input.password).await {
                    Ok(response) => {
                        println!("✅ {} (user id {})", response.message, response.user_id);
                        println!("'sqlr-cli auth login' to start a session");
                        Ok(())
                    }
                    Err(e) => {
                        println!("❌ Registration failed: {}", e);
                        Err(AppError::Api(e))
                    }
                }
            }
            AuthCommands::Logout => {
                self.log_verbose("Attempting auth logout command");
                // The service has no logout endpoint; discarding the token
                // ends the session.
                Credentials::clear_token_for_profile(&self.credentials.profile_name)?;
                println!(
                    "✅ Successfully logged out from profile: {}",
                    self.credentials.profile_name
                );
                Ok(())
            }
            AuthCommands::Status => {
                self.log_verbose("Attempting auth status command");

                println!("Authentication Status:");
                println!("=====================");

                if self.credentials.has_session() {
                    println!("Session: ✅ Token stored in keychain");
                } else {
                    println!("Session: ❌ No active session (use 'auth login' to authenticate)");
                }

                println!("\nActive Profile: {}", self.credentials.profile_name);

                match self.active_profile() {
                    Ok(profile) => {
                        println!("Service URL: {}", profile.service_url);
                        let client = RunnerClient::new(profile.service_url.clone())?;
                        match client.health().await {
                            Ok(health) => println!("Service: ✅ reachable ({})", health.status),
                            Err(e) => println!("Service: ❌ unreachable ({})", e),
                        }
                    }
                    Err(_) => println!("Service URL: (no profile configured)"),
                }

                Ok(())
            }
        }
    }

    async fn handle_config_command(&mut self, commands: ConfigCommands) -> Result<(), AppError> {
        match commands {
            ConfigCommands::Show => {
                self.log_verbose("Attempting config show command");

                println!("Current Configuration:");
                println!("=====================");

                if let Some(default_profile) = &self.config.default_profile {
                    println!("Default Profile: {}", default_profile);
                } else {
                    println!("Default Profile: (not set)");
                }

                println!("\nProfiles:");
                if self.config.profiles.is_empty() {
                    println!("  No profiles configured");
                } else {
                    for (name, profile) in &self.config.profiles {
                        println!("  [{}]", name);
                        println!("    Service URL: {}", profile.service_url);
                        if let Some(username) = &profile.username {
                            println!("    Username: {}", username);
                        }
                        if let Some(timeout) = profile.timeout_seconds {
                            println!("    Timeout: {} seconds", timeout);
                        }
                        if let Some(default_query) = &profile.default_query {
                            println!("    Default query: {}", default_query);
                        }
                    }
                }

                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                self.log_verbose(&format!(
                    "Attempting config set - key: {}, value: {}",
                    key, value
                ));

                let profile_name = self.credentials.profile_name.clone();
                let mut profile = self
                    .config
                    .get_profile(&profile_name)
                    .cloned()
                    .unwrap_or_else(|| Profile {
                        service_url: "http://localhost:5000".to_string(),
                        username: None,
                        timeout_seconds: None,
                        default_query: None,
                    });

                match key.as_str() {
                    "service_url" => {
                        crate::utils::validation::validate_url(&value)?;
                        profile.service_url = value.clone();
                    }
                    "username" => profile.username = Some(value.clone()),
                    "default_query" => profile.default_query = Some(value.clone()),
                    "timeout_seconds" => {
                        let timeout = value.parse::<u64>().map_err(|_| {
                            AppError::Cli(CliError::InvalidArguments(format!(
                                "Invalid timeout value '{}': expected seconds",
                                value
                            )))
                        })?;
                        profile.timeout_seconds = Some(timeout);
                    }
                    other => {
                        return Err(AppError::Cli(CliError::InvalidArguments(format!(
                            "Invalid field: {}. Use 'service_url', 'username', 'default_query' or 'timeout_seconds'",
                            other
                        ))));
                    }
                }

                self.config.set_profile(profile_name.clone(), profile);
                if self.config.default_profile.is_none() {
                    self.config.default_profile = Some(profile_name.clone());
                }
                self.config.save(self.config_path.clone())?;

                println!("✅ Set profile '{}' {} to: {}", profile_name, key, value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn create_test_dispatcher(verbose: bool) -> Dispatcher {
        let config = Config {
            default_profile: Some("test".to_string()),
            profiles: {
                let mut profiles = HashMap::new();
                profiles.insert(
                    "test".to_string(),
                    Profile {
                        service_url: "http://example.test".to_string(),
                        username: Some("ann".to_string()),
                        timeout_seconds: Some(30),
                        default_query: None,
                    },
                );
                profiles
            },
        };
        let creds = Credentials::new("test".to_string());
        Dispatcher::new(
            config,
            None,
            creds,
            verbose,
            DisplayOptions::new().with_no_color(true),
        )
    }

    #[tokio::test]
    async fn test_dispatcher_creation() {
        let d = create_test_dispatcher(true);
        assert!(d.verbose);
        assert_eq!(d.credentials.profile_name, "test");
    }

    #[tokio::test]
    async fn test_auth_logout_implemented() {
        let d = create_test_dispatcher(true);
        let result = d.handle_auth_command(AuthCommands::Logout).await;
        // Uses the mock keyring in tests
        assert!(
            result.is_ok(),
            "Auth logout should succeed in test environment"
        );
    }

    #[tokio::test]
    async fn test_config_show_implemented() {
        let mut d = create_test_dispatcher(true);
        let result = d.handle_config_command(ConfigCommands::Show).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_config_set_rejects_unknown_key() {
        let mut d = create_test_dispatcher(true);
        let result = d
            .handle_config_command(ConfigCommands::Set {
                key: "bogus".to_string(),
                value: "value".to_string(),
            })
            .await;
        assert!(result.is_err());
        assert!(matches!(
            result,
            Err(AppError::Cli(CliError::InvalidArguments(_)))
        ));
    }

    #[tokio::test]
    async fn test_config_set_rejects_invalid_url() {
        let mut d = create_test_dispatcher(true);
        let result = d
            .handle_config_command(ConfigCommands::Set {
                key: "service_url".to_string(),
                value: "not-a-url".to_string(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_set_saves_service_url() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.toml");
        let mut d = create_test_dispatcher(false);
        d.config_path = Some(config_path.clone());

        let result = d
            .handle_config_command(ConfigCommands::Set {
                key: "service_url".to_string(),
                value: "http://runner.example.test".to_string(),
            })
            .await;
        assert!(result.is_ok());

        let saved = Config::load(Some(config_path)).expect("config should reload");
        assert_eq!(
            saved.get_profile("test").expect("profile saved").service_url,
            "http://runner.example.test"
        );
    }

    #[tokio::test]
    async fn test_session_commands_require_login() {
        let mut d = create_test_dispatcher(false);
        let result = d.dispatch(Commands::Tables).await;
        assert!(matches!(
            result,
            Err(AppError::Cli(CliError::AuthRequired { .. }))
        ));

        let result = d
            .dispatch(Commands::Query {
                sql: Some("SELECT 1;".to_string()),
            })
            .await;
        assert!(matches!(
            result,
            Err(AppError::Cli(CliError::AuthRequired { .. }))
        ));
    }

    #[tokio::test]
    async fn test_unknown_profile_is_reported() {
        let config = Config::default();
        let creds = Credentials::new("missing".to_string());
        let d = Dispatcher::new(config, None, creds, false, DisplayOptions::new());
        let result = d.active_profile();
        assert!(matches!(
            result,
            Err(AppError::Cli(CliError::InvalidArguments(_)))
        ));
    }
}
