use clap::Args;
use storefront_app::{
    config::CheckoutConfig,
    domain::{orders::records::OrderUuid, owners::OwnerUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct ShowOrderArgs {
    #[command(flatten)]
    config: CheckoutConfig,

    /// Owner of the order
    #[arg(long)]
    owner_uuid: Uuid,

    /// Order to show
    #[arg(long)]
    order_uuid: Uuid,
}

pub(crate) async fn run(args: ShowOrderArgs) -> Result<(), String> {
    let ctx = super::connect(&args.config).await?;

    let order = ctx
        .orders
        .get_order(
            OrderUuid::from_uuid(args.order_uuid),
            OwnerUuid::from_uuid(args.owner_uuid),
        )
        .await
        .map_err(|error| format!("failed to load order: {error}"))?;

    super::print_json(&order)
}
