use clap::{Parser, Subcommand};
use tiffin_app::{config::AppConfig, context::AppContext};

mod addresses;
mod checkout;
mod login;

#[derive(Debug, Parser)]
#[command(name = "tiffin-app", about = "Tiffin checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in and print a bearer token
    Login(login::LoginArgs),

    /// Manage saved delivery addresses
    Addresses(addresses::AddressesCommand),

    /// Price and place an order for dishes in the cart
    Checkout(checkout::CheckoutArgs),
}

impl Cli {
    /// Parse flags and environment, loading `.env` first if present.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        let context = AppContext::from_config(&self.config).map_err(|error| error.to_string())?;

        match self.command {
            Commands::Login(args) => login::run(&context, &args).await,
            Commands::Addresses(command) => addresses::run(&context, command).await,
            Commands::Checkout(args) => checkout::run(&context, args).await,
        }
    }
}
