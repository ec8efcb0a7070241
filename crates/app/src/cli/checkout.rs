use std::sync::Arc;

use clap::Args;
use tiffin::{
    checkout::CheckoutSnapshot,
    ids::{AddressId, DishId},
    orders::{OrderDraft, PaymentMethod},
    shipping::ShippingOutcome,
};
use tiffin_app::{
    checkout::{AlwaysConfirm, CheckoutError, CheckoutSession, Confirm, StdinConfirm},
    context::AppContext,
};

#[derive(Debug, Args)]
pub(crate) struct CheckoutArgs {
    /// Dish ids to check out, all from the same merchant
    #[arg(long = "dish", required = true, num_args = 1..)]
    dishes: Vec<u64>,

    /// Deliver to this saved address instead of the default
    #[arg(long)]
    address: Option<u64>,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,

    /// Payment method (cod, wallet, vnpay)
    #[arg(long)]
    payment: Option<PaymentMethod>,

    /// Note for the merchant or courier
    #[arg(long, default_value = "")]
    notes: String,

    /// Place the order without asking for confirmation
    #[arg(long)]
    yes: bool,
}

pub(crate) async fn run(context: &AppContext, args: CheckoutArgs) -> Result<(), String> {
    let dishes: Vec<DishId> = args.dishes.into_iter().map(DishId::new).collect();

    let (session, outcome) = CheckoutSession::load(context.checkout_api(), &dishes, context.settings)
        .await
        .map_err(|error| describe(&error))?;

    if let Some(merchant) = session.with_state(|state| state.merchant().cloned()).await {
        println!("merchant: {} ({})", merchant.name, merchant.id);
    }

    if let Some(outcome) = outcome {
        report_shipping(&outcome);
    }

    if let Some(address) = args.address {
        let outcome = session
            .select_address(AddressId::new(address))
            .await
            .map_err(|error| describe(&error))?;

        report_shipping(&outcome);
    }

    for offer in session.coupon_previews().await {
        match offer.discount {
            Ok(discount) => println!("coupon {}: saves {discount}", offer.coupon.code()),
            Err(reason) => println!("coupon {}: unavailable, {reason}", offer.coupon.code()),
        }
    }

    if let Some(code) = args.coupon {
        match session.apply_coupon(&code).await {
            Ok(applied) => println!("applied coupon {}: -{}", applied.code, applied.discount),
            Err(CheckoutError::CouponRejected { message }) => {
                println!("coupon {code} was not applied: {message}");
            }
            Err(error) => return Err(describe(&error)),
        }
    }

    let snapshot = session.snapshot().await.map_err(|error| describe(&error))?;

    print_summary(&snapshot);

    let draft = OrderDraft {
        payment_method: args.payment,
        notes: args.notes,
    };

    let confirm: Arc<dyn Confirm> = if args.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(StdinConfirm)
    };

    match session.place_order(&draft, confirm).await {
        Ok(order) => {
            println!("order_id: {}", order.id);
            println!("order_status: {}", order.status);

            if let Some(total) = order.total {
                println!("order_total: {total}");
            }

            if let Some(created_at) = order.created_at {
                println!("order_created_at: {created_at}");
            }

            Ok(())
        }
        Err(CheckoutError::Cancelled) => {
            println!("order was not placed");

            Ok(())
        }
        Err(error) => Err(describe(&error)),
    }
}

fn describe(error: &CheckoutError) -> String {
    if error.redirects_to_cart() {
        format!("{error}; return to your cart and choose dishes again")
    } else {
        error.to_string()
    }
}

fn report_shipping(outcome: &ShippingOutcome) {
    match outcome {
        ShippingOutcome::Resolved(fee) => println!("shipping: {fee}"),
        ShippingOutcome::Fallback { fee, reason } => {
            println!("shipping: {fee} (estimated, {reason})");
        }
        ShippingOutcome::Superseded => {}
    }
}

fn print_summary(snapshot: &CheckoutSnapshot) {
    let fees = &snapshot.fees;

    println!("items: {}", fees.items_total);
    println!("service fee: {}", fees.service_fee);
    println!("shipping: {}", fees.shipping_fee);

    if let Some(code) = &snapshot.applied_coupon {
        println!("discount ({code}): -{}", fees.discount_amount);
    }

    println!("total: {}", snapshot.total);
}
