use clap::{Parser, Subcommand};
use storefront_app::config::LoggingConfig;

mod db;
mod orders;

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Storefront checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Orders(orders::OrdersCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Orders(command) => orders::run(command).await,
        }
    }
}
