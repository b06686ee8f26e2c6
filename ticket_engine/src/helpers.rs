use rand::Rng;
use tix_common::Naira;

use crate::db_types::OrderId;

/// Amounts reported by the provider may differ from the stored total by up to this much (₦1) before the webhook is
/// treated as an amount mismatch. Mismatches are never auto-corrected; they always raise an operator alert.
pub const AMOUNT_TOLERANCE: Naira = Naira::from_kobo_const(100);

/// Mint a new order reference. The reference is shared with the payment provider as the idempotent `tx_ref`, so it
/// must be unique and opaque.
pub fn new_order_id() -> OrderId {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..12).map(|_| format!("{:x}", rng.gen_range(0..16u8))).collect();
    OrderId(format!("TIX-{suffix}"))
}

/// The QR payload for seat `n` of an order. Deterministic and gapless: seat numbers run `1..=quantity`.
pub fn qr_payload(order_id: &OrderId, n: i64) -> String {
    format!("{}-{n}", order_id.as_str())
}

/// The amount credited to the event organizer after the platform fee is deducted. The fee is expressed in basis
/// points and rounded down, so the organizer never loses a kobo to rounding.
pub fn organizer_credit(amount: Naira, fee_bps: u32) -> Naira {
    let fee = amount.value() * i64::from(fee_bps) / 10_000;
    Naira::from(amount.value() - fee)
}
