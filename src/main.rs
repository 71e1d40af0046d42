use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::debug;
use std::io::IsTerminal;
use std::path::PathBuf;

use ws::config::{self, Config, Settings};
use ws::output::{DeviceReport, DevicesReport, Feedback, LocationsReport, OutputFormat, RoomsReport};

#[derive(Parser)]
#[command(name = "ws")]
#[command(about = "A CLI for the Wavin Sentio floor heating cloud")]
#[command(version)]
struct Cli {
    /// Config file (default is $HOME/.ws/config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// The username to use for authentication
    #[arg(short, long, env = "WS_USERNAME", global = true)]
    username: Option<String>,

    /// The password to use for authentication
    #[arg(short, long, env = "WS_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// The web API key of the identity provider
    #[arg(long, env = "WS_WEB_API_KEY", global = true, hide_env_values = true)]
    web_api_key: Option<String>,

    /// The API endpoint to use
    #[arg(short = 'e', long, env = "WS_API_ENDPOINT", global = true)]
    api_endpoint: Option<String>,

    /// The API version used for locations and rooms
    #[arg(long, env = "WS_API_VERSION", global = true)]
    api_version: Option<String>,

    #[arg(long, env = "WS_IDENTITY_ENDPOINT", global = true, hide = true)]
    identity_endpoint: Option<String>,

    #[arg(long, env = "WS_TOKEN_ENDPOINT", global = true, hide = true)]
    token_endpoint: Option<String>,

    /// The format to use for output
    #[arg(short, long, value_enum, env = "WS_OUTPUT", global = true)]
    output: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login to the Wavin API and cache the token
    Login,
    /// Manage devices
    Devices {
        #[command(subcommand)]
        command: DeviceCommands,
    },
    /// Manage locations
    Locations {
        #[command(subcommand)]
        command: LocationCommands,
    },
    /// Manage rooms
    Rooms {
        #[command(subcommand)]
        command: RoomCommands,
    },
}

#[derive(Subcommand)]
enum DeviceCommands {
    /// List the devices in your account
    List,
    /// Show a single device and its rooms
    Get {
        /// Resource name of the device, e.g. devices/12345
        name: String,
    },
}

#[derive(Subcommand)]
enum LocationCommands {
    /// List the locations in your account
    List,
}

#[derive(Subcommand)]
enum RoomCommands {
    /// List the rooms of a location
    List {
        /// Location ID (ulc)
        #[arg(short = 'l', long = "location-id")]
        location_id: String,
    },
}

impl Cli {
    fn overrides(&self) -> Config {
        Config {
            username: self.username.clone(),
            password: self.password.clone(),
            web_api_key: self.web_api_key.clone(),
            api_endpoint: self.api_endpoint.clone(),
            api_version: self.api_version.clone(),
            identity_endpoint: self.identity_endpoint.clone(),
            token_endpoint: self.token_endpoint.clone(),
            output: self.output,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,ws=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = config::load_config(cli.config.as_deref())?;
    let mut settings = Settings::resolve(cli.overrides().or(file_config));
    debug!("Using API endpoint {}", settings.api_endpoint);

    let http = reqwest::Client::new();
    let mut feedback = Feedback::stdout(settings.output);

    match cli.command {
        Commands::Login => {
            if settings.password.is_none() && std::io::stdin().is_terminal() {
                settings.password = Some(rpassword::prompt_password("Password: ")?);
            }

            feedback.println("Login to the Wavin API")?;
            let mut identity = settings.identity_manager(&http)?;
            let token = identity.get_token().await.context("Failed to get token")?;

            feedback.println(format!(
                "Login successful, expires at {}",
                token
                    .expires_at()
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S %z")
            ))?;
        }
        Commands::Devices { command } => {
            let mut client = settings.api_client(&http)?;
            match command {
                DeviceCommands::List => {
                    let devices = client
                        .list_devices()
                        .await
                        .context("Failed to list devices")?;
                    feedback.print_result(&DevicesReport { devices })?;
                }
                DeviceCommands::Get { name } => {
                    let device = client
                        .get_device(&name)
                        .await
                        .with_context(|| format!("Failed to get device {}", name))?;
                    feedback.print_result(&DeviceReport { device })?;
                }
            }
        }
        Commands::Locations {
            command: LocationCommands::List,
        } => {
            let mut client = settings.api_client(&http)?;
            let locations = client
                .list_locations()
                .await
                .context("Failed to list locations")?;
            feedback.print_result(&LocationsReport { locations })?;
        }
        Commands::Rooms {
            command: RoomCommands::List { location_id },
        } => {
            let mut client = settings.api_client(&http)?;
            let rooms = client
                .list_rooms(&location_id)
                .await
                .context("Failed to list rooms")?;
            feedback.print_result(&RoomsReport { rooms })?;
        }
    }

    Ok(())
}
