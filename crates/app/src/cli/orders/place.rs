use clap::Args;
use storefront_app::{config::CheckoutConfig, domain::owners::OwnerUuid};
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct PlaceOrderArgs {
    #[command(flatten)]
    config: CheckoutConfig,

    /// Owner whose active cart is checked out
    #[arg(long)]
    owner_uuid: Uuid,
}

pub(crate) async fn run(args: PlaceOrderArgs) -> Result<(), String> {
    let ctx = super::connect(&args.config).await?;

    let order = ctx
        .checkout
        .place_order(OwnerUuid::from_uuid(args.owner_uuid))
        .await
        .map_err(|error| {
            if error.is_transient() {
                format!("checkout failed, try again: {error}")
            } else {
                format!("checkout failed: {error}")
            }
        })?;

    super::print_json(&order)
}
