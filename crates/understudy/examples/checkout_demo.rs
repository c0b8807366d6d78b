//! Checkout Demo
//!
//! Builds a checkout service with mocked dependencies, arranges them
//! and prints the call journal.
//!
//! Run with: `UNDERSTUDY_LOG=debug cargo run --example checkout_demo`

use std::sync::Arc;
use understudy::prelude::*;

#[double(name = "IPrices")]
pub trait Prices: Send + Sync {
    fn price_of(&self, sku: &str) -> Option<u64>;
}

#[double(name = "IPayments")]
pub trait Payments: Send + Sync {
    fn charge(&self, cents: u64, #[understudy(out)] receipt: &mut String) -> bool;

    fn settle(&self) -> BoxFuture<'_, ()>;
}

pub struct Checkout {
    prices: Arc<dyn Prices>,
    payments: Arc<dyn Payments>,
}

#[subject]
impl Checkout {
    pub fn new(prices: Arc<dyn Prices>, payments: Arc<dyn Payments>) -> Self {
        Self { prices, payments }
    }

    pub fn buy(&self, skus: &[&str]) -> Result<String, String> {
        let mut total = 0;
        for sku in skus {
            total += self
                .prices
                .price_of(sku)
                .ok_or_else(|| format!("unknown item {sku}"))?;
        }
        let mut receipt = String::new();
        if !self.payments.charge(total, &mut receipt) {
            return Err(format!("charge of {total} declined"));
        }
        futures::executor::block_on(self.payments.settle());
        Ok(receipt)
    }
}

fn main() -> MockResult<()> {
    understudy::logging::init();

    let checkout = Mocked::<Checkout>::new(Behavior::Strict)?;
    let prices = checkout.arrange_for::<dyn Prices>()?;
    prices
        .method("price_of")?
        .with_arg("sku", "apple".to_string())
        .returns(Some(120u64));
    prices
        .method("price_of")?
        .with_arg("sku", "pear".to_string())
        .returns(Some(80u64));
    prices.method("price_of")?.returns(None::<u64>);

    let payments = checkout.arrange_for::<dyn Payments>()?;
    payments
        .method("charge")?
        .with_arg("cents", 200u64)
        .sets_out("receipt", "R-0001".to_string())
        .returns(true);
    payments.method("charge")?.returns(false);
    payments.method("settle")?.completes();

    println!("apple + pear -> {:?}", checkout.buy(&["apple", "pear"]));
    println!("apple        -> {:?}", checkout.buy(&["apple"]));
    println!("kiwi         -> {:?}", checkout.buy(&["kiwi"]));

    println!("\nPayments journal:");
    println!("{}", checkout.journal_for::<dyn Payments>()?.to_json()?);
    Ok(())
}
