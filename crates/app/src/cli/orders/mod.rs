use clap::{Args, Subcommand};
use serde::Serialize;
use storefront_app::{config::CheckoutConfig, context::AppContext};

mod list;
mod pay;
mod place;
mod show;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Check out the owner's active cart
    Place(place::PlaceOrderArgs),
    /// Settle payment for a pending order
    Pay(pay::PayOrderArgs),
    /// List the owner's orders, newest first
    List(list::ListOrdersArgs),
    /// Show one of the owner's orders
    Show(show::ShowOrderArgs),
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::Place(args) => place::run(args).await,
        OrdersSubcommand::Pay(args) => pay::run(args).await,
        OrdersSubcommand::List(args) => list::run(args).await,
        OrdersSubcommand::Show(args) => show::run(args).await,
    }
}

async fn connect(config: &CheckoutConfig) -> Result<AppContext, String> {
    AppContext::from_config(config).await.map_err(|error| {
        match std::error::Error::source(&error) {
            Some(source) => format!("{error}: {source}"),
            None => error.to_string(),
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|error| format!("failed to serialize output: {error}"))?;

    println!("{json}");

    Ok(())
}
