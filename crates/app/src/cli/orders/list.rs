use clap::Args;
use storefront_app::{config::CheckoutConfig, domain::owners::OwnerUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ListOrdersArgs {
    #[command(flatten)]
    config: CheckoutConfig,

    /// Owner whose orders should be listed
    #[arg(long)]
    owner_uuid: Uuid,
}

pub(crate) async fn run(args: ListOrdersArgs) -> Result<(), String> {
    let ctx = super::connect(&args.config).await?;

    let orders = ctx
        .orders
        .list_orders(OwnerUuid::from_uuid(args.owner_uuid))
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    super::print_json(&orders)
}
