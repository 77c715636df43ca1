use clap::Parser;
use sqlr_cli::cli::dispatcher::Dispatcher;
use sqlr_cli::cli::main_types::Cli;
use sqlr_cli::display::DisplayOptions;
use sqlr_cli::storage::config::Config;
use sqlr_cli::storage::credentials::Credentials;
use sqlr_cli::utils::logging::{log_error, log_warning};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load Config
    let config_path = cli
        .config_dir
        .as_ref()
        .map(|dir| PathBuf::from(dir).join("config.toml"));

    let mut config = match Config::load(config_path.clone()) {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("loading config: {}", err));
            std::process::exit(1);
        }
    };

    // Determine the profile to use
    let profile_name = cli
        .profile
        .or(config.default_profile.clone())
        .unwrap_or_else(|| "default".to_string());

    // Create a default profile if it doesn't exist
    if config.get_profile(&profile_name).is_none() {
        if cli.verbose {
            println!("Creating default profile: {}", profile_name);
        }

        use sqlr_cli::storage::config::Profile;
        let default_profile = Profile {
            service_url: "http://localhost:5000".to_string(),
            username: None,
            timeout_seconds: None,
            default_query: None,
        };

        config.set_profile(profile_name.clone(), default_profile);

        // Set as default if no default is set
        if config.default_profile.is_none() {
            config.default_profile = Some(profile_name.clone());
        }

        // Save the updated config
        if let Err(err) = config.save(config_path.clone()) {
            if cli.verbose {
                log_warning(&format!("Failed to save config: {}", err));
            }
        }
    }

    if cli.verbose {
        println!("Verbose mode is enabled");
        println!("Using profile: {}", profile_name);

        if let Some(config_dir) = &cli.config_dir {
            println!("Using config directory: {}", config_dir);
        }
    }

    // Load Credentials
    let credentials = match Credentials::load(&profile_name) {
        Ok(creds) => creds,
        Err(err) => {
            log_error(&format!("loading credentials: {}", err));
            Credentials::new(profile_name.clone())
        }
    };

    let mut display_options = DisplayOptions::from_env();
    if cli.no_color {
        display_options.no_color = true;
    }

    // Create dispatcher
    let mut dispatcher = Dispatcher::new(
        config,
        config_path,
        credentials,
        cli.verbose,
        display_options,
    );

    // Execute the command
    if let Err(e) = dispatcher.dispatch(cli.command).await {
        log_error(&e.display_friendly());
        if let Some(hint) = e.troubleshooting_hint() {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }

    Ok(())
}
