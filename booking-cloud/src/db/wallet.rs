//! Wallet credits and the wallet ledger

use rust_decimal::Decimal;
use shared::models::{CreditSource, CreditStatus, WalletCredit, WalletTransactionKind};
use sqlx::{PgConnection, PgPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletCreditRow {
    pub id: i64,
    pub parent_id: i64,
    pub amount: Decimal,
    pub used_amount: Decimal,
    pub expires_at: i64,
    pub status: String,
    pub source: String,
    pub source_booking_id: Option<i64>,
    pub created_at: i64,
}

impl WalletCreditRow {
    /// Convert to the domain model; rows with unknown enums are skipped
    pub fn into_model(self) -> Option<WalletCredit> {
        Some(WalletCredit {
            status: CreditStatus::from_db(&self.status)?,
            source: CreditSource::from_db(&self.source)?,
            id: self.id,
            parent_id: self.parent_id,
            amount: self.amount,
            used_amount: self.used_amount,
            expires_at: self.expires_at,
            source_booking_id: self.source_booking_id,
            created_at: self.created_at,
        })
    }
}

pub fn into_models(rows: Vec<WalletCreditRow>) -> Vec<WalletCredit> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            let credit = row.into_model();
            if credit.is_none() {
                tracing::warn!(credit_id = id, "Skipping wallet credit with unknown status/source");
            }
            credit
        })
        .collect()
}

const CREDIT_COLUMNS: &str =
    "id, parent_id, amount, used_amount, expires_at, status, source, source_booking_id, created_at";

/// Active credits of a parent (read-only view)
pub async fn list_active(pool: &PgPool, parent_id: i64) -> Result<Vec<WalletCreditRow>, sqlx::Error> {
    sqlx::query_as::<_, WalletCreditRow>(&format!(
        "SELECT {CREDIT_COLUMNS} FROM wallet_credits
         WHERE parent_id = $1 AND status = 'active'
         ORDER BY expires_at, created_at, id"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await
}

/// Active credits of a parent, row-locked for allocation
pub async fn lock_active(
    conn: &mut PgConnection,
    parent_id: i64,
) -> Result<Vec<WalletCreditRow>, sqlx::Error> {
    sqlx::query_as::<_, WalletCreditRow>(&format!(
        "SELECT {CREDIT_COLUMNS} FROM wallet_credits
         WHERE parent_id = $1 AND status = 'active'
         ORDER BY expires_at, created_at, id
         FOR UPDATE"
    ))
    .bind(parent_id)
    .fetch_all(conn)
    .await
}

pub struct IssueCredit {
    pub id: i64,
    pub parent_id: i64,
    pub amount: Decimal,
    pub expires_at: i64,
    pub source: CreditSource,
    pub source_booking_id: Option<i64>,
    pub now: i64,
}

pub async fn insert_credit(conn: &mut PgConnection, credit: &IssueCredit) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO wallet_credits
            (id, parent_id, amount, used_amount, expires_at, status, source, source_booking_id, created_at)
         VALUES ($1, $2, $3, 0, $4, 'active', $5, $6, $7)",
    )
    .bind(credit.id)
    .bind(credit.parent_id)
    .bind(credit.amount)
    .bind(credit.expires_at)
    .bind(credit.source.as_db())
    .bind(credit.source_booking_id)
    .bind(credit.now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Add usage to a credit; false if it would exceed the credit amount
pub async fn add_usage(
    conn: &mut PgConnection,
    credit_id: i64,
    amount: Decimal,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE wallet_credits SET used_amount = used_amount + $1
         WHERE id = $2 AND status = 'active' AND used_amount + $1 <= amount",
    )
    .bind(amount)
    .bind(credit_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Active credits at or past expiry
pub async fn find_expired(
    pool: &PgPool,
    now: i64,
    limit: i64,
) -> Result<Vec<WalletCreditRow>, sqlx::Error> {
    sqlx::query_as::<_, WalletCreditRow>(&format!(
        "SELECT {CREDIT_COLUMNS} FROM wallet_credits
         WHERE status = 'active' AND expires_at <= $1
         ORDER BY expires_at
         LIMIT $2"
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Flip a credit to `expired`; false if it was already flipped
pub async fn mark_expired(
    conn: &mut PgConnection,
    credit_id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE wallet_credits SET status = 'expired'
         WHERE id = $1 AND status = 'active' AND expires_at <= $2",
    )
    .bind(credit_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub struct LedgerEntry {
    pub parent_id: i64,
    pub credit_id: i64,
    pub kind: WalletTransactionKind,
    pub amount: Decimal,
    pub booking_id: Option<i64>,
    pub related_parent_id: Option<i64>,
    pub now: i64,
}

pub async fn record_transaction(
    conn: &mut PgConnection,
    entry: &LedgerEntry,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO wallet_transactions
            (id, parent_id, credit_id, kind, amount, booking_id, related_parent_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(shared::util::snowflake_id())
    .bind(entry.parent_id)
    .bind(entry.credit_id)
    .bind(entry.kind.as_db())
    .bind(entry.amount)
    .bind(entry.booking_id)
    .bind(entry.related_parent_id)
    .bind(entry.now)
    .execute(conn)
    .await?;
    Ok(())
}

#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct WalletTransactionRow {
    pub id: i64,
    pub credit_id: i64,
    pub kind: String,
    pub amount: Decimal,
    pub booking_id: Option<i64>,
    pub related_parent_id: Option<i64>,
    pub created_at: i64,
}

/// Most recent ledger entries for a parent
pub async fn list_transactions(
    pool: &PgPool,
    parent_id: i64,
    limit: i64,
) -> Result<Vec<WalletTransactionRow>, sqlx::Error> {
    sqlx::query_as::<_, WalletTransactionRow>(
        "SELECT id, credit_id, kind, amount, booking_id, related_parent_id, created_at
         FROM wallet_transactions
         WHERE parent_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2",
    )
    .bind(parent_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
