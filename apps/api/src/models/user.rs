use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// The slice of a user the balance paths need. Balances are monotonic
/// except for payouts: earnings add, a completed payout zeroes
/// `available_balance`, and the column check keeps it non-negative.
#[derive(Debug, Clone, FromRow)]
pub struct BalanceRow {
    pub id: Uuid,
    pub username: String,
    pub available_balance: Decimal,
    pub stripe_account_id: Option<String>,
}
