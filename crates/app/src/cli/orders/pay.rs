use clap::Args;
use storefront_app::{
    config::CheckoutConfig,
    domain::{orders::records::OrderUuid, owners::OwnerUuid},
};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct PayOrderArgs {
    #[command(flatten)]
    config: CheckoutConfig,

    /// Owner of the order
    #[arg(long)]
    owner_uuid: Uuid,

    /// Order to settle
    #[arg(long)]
    order_uuid: Uuid,
}

pub(crate) async fn run(args: PayOrderArgs) -> Result<(), String> {
    let ctx = super::connect(&args.config).await?;

    let order = ctx
        .payments
        .settle_payment(
            OrderUuid::from_uuid(args.order_uuid),
            OwnerUuid::from_uuid(args.owner_uuid),
        )
        .await
        .map_err(|error| {
            if error.is_transient() {
                format!("payment failed, try again: {error}")
            } else {
                format!("payment failed: {error}")
            }
        })?;

    super::print_json(&order)
}
