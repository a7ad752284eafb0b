//! Service tests against a real PostgreSQL database
//!
//! `#[sqlx::test]` creates a fresh database per test from `DATABASE_URL`
//! and applies `./migrations` before handing over the pool.

use axum::body::Body;
use booking_cloud::api;
use booking_cloud::auth::{Identity, create_token};
use booking_cloud::config::Config;
use booking_cloud::db::notifications;
use booking_cloud::error::ServiceError;
use booking_cloud::services::{cancellation, tfc, wallet};
use booking_cloud::state::AppState;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{BookingStatus, CreditSource, Role, TfcStatus};
use sqlx::PgPool;
use tower::ServiceExt;

const HOUR: i64 = 3_600_000;
const DAY: i64 = 24 * HOUR;
/// 2026-03-14T00:00:00Z
const NOW: i64 = 1_773_446_400_000;

const PARENT: i64 = 1;
const OTHER_PARENT: i64 = 2;
const VENUE: i64 = 1;

fn state(pool: PgPool) -> AppState {
    AppState::with_pool(pool, &Config::development("postgres://unused"))
}

fn parent() -> Identity {
    Identity {
        user_id: PARENT,
        role: Role::Parent,
    }
}

fn admin() -> Identity {
    Identity {
        user_id: 99,
        role: Role::Admin,
    }
}

fn gbp(value: &str) -> Decimal {
    value.parse().unwrap()
}

fn code(err: ServiceError) -> ErrorCode {
    AppError::from(err).code
}

struct Seed<'a> {
    id: i64,
    status: BookingStatus,
    amount: &'a str,
    paid_card: &'a str,
    paid_wallet: &'a str,
    sessions: &'a [i64],
}

async fn seed_booking(pool: &PgPool, seed: Seed<'_>) {
    sqlx::query(
        "INSERT INTO venues (id, name, created_at) VALUES ($1, 'Riverside Club', $2) ON CONFLICT DO NOTHING",
    )
    .bind(VENUE)
    .bind(NOW)
    .execute(pool)
    .await
    .unwrap();

    sqlx::query(
        "INSERT INTO bookings (id, parent_id, venue_id, status, amount, paid_card, paid_wallet, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)",
    )
    .bind(seed.id)
    .bind(PARENT)
    .bind(VENUE)
    .bind(seed.status.as_db())
    .bind(gbp(seed.amount))
    .bind(gbp(seed.paid_card))
    .bind(gbp(seed.paid_wallet))
    .bind(NOW - DAY)
    .execute(pool)
    .await
    .unwrap();

    for (i, starts_at) in seed.sessions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO booking_sessions (id, booking_id, starts_at, ends_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(seed.id * 100 + i as i64)
        .bind(seed.id)
        .bind(starts_at)
        .bind(starts_at + 3 * HOUR)
        .execute(pool)
        .await
        .unwrap();
    }
}

struct BookingState {
    status: String,
    paid_tfc: Decimal,
    paid_wallet: Decimal,
    cancel_reason: Option<String>,
}

async fn booking_state(pool: &PgPool, id: i64) -> BookingState {
    let (status, paid_tfc, paid_wallet, cancel_reason): (String, Decimal, Decimal, Option<String>) =
        sqlx::query_as(
            "SELECT status, paid_tfc, paid_wallet, cancel_reason FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    BookingState {
        status,
        paid_tfc,
        paid_wallet,
        cancel_reason,
    }
}

async fn count(pool: &PgPool, sql: &str, bind: i64) -> i64 {
    sqlx::query_scalar(sql).bind(bind).fetch_one(pool).await.unwrap()
}

#[sqlx::test(migrations = "./migrations")]
async fn cancel_refunds_card_payment_once(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 10,
            status: BookingStatus::Confirmed,
            amount: "30.00",
            paid_card: "30.00",
            paid_wallet: "0",
            sessions: &[NOW + 72 * HOUR],
        },
    )
    .await;
    let state = state(pool.clone());

    let outcome = cancellation::cancel(&state, &parent(), 10, None, Some("moving house"), NOW)
        .await
        .unwrap();
    assert_eq!(outcome.status, BookingStatus::Cancelled);
    assert_eq!(outcome.refund.tier, "full_notice");
    assert_eq!(outcome.refund.cash_refund, gbp("28.00"));
    assert_eq!(outcome.refund.admin_fee, gbp("2.00"));
    assert_eq!(outcome.refund.created_by, Some(PARENT));
    assert!(outcome.credit_id.is_none());

    let again = cancellation::cancel(&state, &parent(), 10, None, None, NOW + HOUR).await;
    assert_eq!(code(again.unwrap_err()), ErrorCode::BookingAlreadyCancelled);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM refunds WHERE booking_id = $1", 10).await, 1);
    assert_eq!(
        count(
            &pool,
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND kind = 'booking_cancelled'",
            PARENT,
        )
        .await,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn cancel_rejects_another_parents_booking(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 11,
            status: BookingStatus::Confirmed,
            amount: "30.00",
            paid_card: "30.00",
            paid_wallet: "0",
            sessions: &[NOW + 72 * HOUR],
        },
    )
    .await;
    let state = state(pool.clone());
    let stranger = Identity {
        user_id: OTHER_PARENT,
        role: Role::Parent,
    };

    let result = cancellation::cancel(&state, &stranger, 11, None, None, NOW).await;
    assert_eq!(code(result.unwrap_err()), ErrorCode::PermissionDenied);
    assert_eq!(booking_state(&pool, 11).await.status, "confirmed");
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_cancel_body_uses_parent_defaults(pool: PgPool) {
    let now = shared::util::now_millis();
    sqlx::query("INSERT INTO venues (id, name, created_at) VALUES ($1, 'Riverside Club', $2)")
        .bind(VENUE)
        .bind(now)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO bookings (id, parent_id, venue_id, status, amount, paid_card, created_at, updated_at) \
         VALUES (12, $1, $2, 'confirmed', 30.00, 30.00, $3, $3)",
    )
    .bind(PARENT)
    .bind(VENUE)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO booking_sessions (id, booking_id, starts_at, ends_at) VALUES (1200, 12, $1, $2)",
    )
    .bind(now + 72 * HOUR)
    .bind(now + 75 * HOUR)
    .execute(&pool)
    .await
    .unwrap();

    let config = Config::development("postgres://unused");
    let app = api::create_router(AppState::with_pool(pool, &config));
    let token = create_token(PARENT, Role::Parent, &config.jwt_secret).unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings/12/cancel")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["refund"]["kind"], "parent");
    assert_eq!(body["refund"]["cash_refund"].as_f64(), Some(28.0));
}

#[sqlx::test(migrations = "./migrations")]
async fn spend_is_refused_while_tfc_reference_pending(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 20,
            status: BookingStatus::PendingPayment,
            amount: "40.00",
            paid_card: "0",
            paid_wallet: "0",
            sessions: &[NOW + 30 * DAY],
        },
    )
    .await;
    let state = state(pool.clone());

    wallet::grant(&state, &admin(), PARENT, gbp("10.00"), CreditSource::Goodwill, None, None, NOW)
        .await
        .unwrap();
    let payment = tfc::create_for_booking(&state, &parent(), 20, NOW).await.unwrap();
    assert_eq!(payment.amount, gbp("40.00"));

    let spend = wallet::spend(&state, &parent(), 20, gbp("10.00"), false, NOW + HOUR).await;
    assert_eq!(code(spend.unwrap_err()), ErrorCode::TfcReferenceExists);
    assert_eq!(
        wallet::summary(&state, PARENT, NOW + HOUR).await.unwrap().balance,
        gbp("10.00")
    );

    let confirmed = tfc::confirm(&state, &admin(), &payment.reference, gbp("40.00"), NOW + DAY)
        .await
        .unwrap();
    assert_eq!(confirmed.payment.status, TfcStatus::Paid);
    assert!(!confirmed.late);

    let booking = booking_state(&pool, 20).await;
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.paid_tfc, gbp("40.00"));
    assert_eq!(booking.paid_wallet, Decimal::ZERO);

    // Paid total still matches the booking, so a refund can be quoted
    let quote = cancellation::quote(&state, &parent(), 20, None, NOW + DAY).await.unwrap();
    assert_eq!(quote.refund.credit_amount, gbp("38.00"));
}

#[sqlx::test(migrations = "./migrations")]
async fn tfc_confirmation_is_capped_at_amount_owed(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 21,
            status: BookingStatus::PendingPayment,
            amount: "40.00",
            paid_card: "0",
            paid_wallet: "0",
            sessions: &[NOW + 30 * DAY],
        },
    )
    .await;
    let state = state(pool.clone());
    let payment = tfc::create_for_booking(&state, &parent(), 21, NOW).await.unwrap();

    // A voucher lands after the reference was issued
    sqlx::query("UPDATE bookings SET paid_voucher = 10.00 WHERE id = 21")
        .execute(&pool)
        .await
        .unwrap();

    tfc::confirm(&state, &admin(), &payment.reference, gbp("40.00"), NOW + DAY)
        .await
        .unwrap();

    let booking = booking_state(&pool, 21).await;
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.paid_tfc, gbp("30.00"));
    assert!(cancellation::quote(&state, &parent(), 21, None, NOW + DAY).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn cancelling_tfc_reference_refunds_card_part(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 30,
            status: BookingStatus::PendingPayment,
            amount: "40.00",
            paid_card: "15.00",
            paid_wallet: "0",
            sessions: &[NOW + 72 * HOUR],
        },
    )
    .await;
    let state = state(pool.clone());
    let payment = tfc::create_for_booking(&state, &parent(), 30, NOW).await.unwrap();
    assert_eq!(payment.amount, gbp("25.00"));

    let outcome = tfc::cancel(&state, &parent(), &payment.reference, NOW + HOUR).await.unwrap();
    assert_eq!(outcome.payment.status, TfcStatus::Cancelled);
    let refund = outcome.refund.expect("booking released with a refund");
    assert_eq!(refund.kind, "parent");
    assert_eq!(refund.cash_refund, gbp("13.00"));
    assert_eq!(refund.credit_amount, Decimal::ZERO);
    assert_eq!(refund.admin_fee, gbp("2.00"));
    assert!(outcome.credit_id.is_none());

    let booking = booking_state(&pool, 30).await;
    assert_eq!(booking.status, "cancelled");
    assert_eq!(booking.cancel_reason.as_deref(), Some("tfc_cancelled"));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM refunds WHERE booking_id = $1", 30).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn overdue_sweep_releases_booking_once(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 40,
            status: BookingStatus::PendingPayment,
            amount: "40.00",
            paid_card: "0",
            paid_wallet: "10.00",
            sessions: &[NOW + 30 * DAY],
        },
    )
    .await;
    let state = state(pool.clone());
    let payment = tfc::create_for_booking(&state, &parent(), 40, NOW).await.unwrap();
    assert_eq!(payment.deadline_at, NOW + 5 * DAY);

    assert_eq!(tfc::auto_cancel_overdue(&state, NOW + 4 * DAY, 50).await.unwrap(), 0);

    let sweep_at = NOW + 6 * DAY;
    assert_eq!(tfc::auto_cancel_overdue(&state, sweep_at, 50).await.unwrap(), 1);
    assert_eq!(tfc::auto_cancel_overdue(&state, sweep_at + HOUR, 50).await.unwrap(), 0);

    let booking = booking_state(&pool, 40).await;
    assert_eq!(booking.status, "cancelled");
    assert_eq!(booking.cancel_reason.as_deref(), Some("tfc_unpaid"));

    let (kind, credit, fee, created_by): (String, Decimal, Decimal, Option<i64>) = sqlx::query_as(
        "SELECT kind, credit_amount, admin_fee, created_by FROM refunds WHERE booking_id = 40",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(kind, "provider");
    assert_eq!(credit, gbp("10.00"));
    assert_eq!(fee, Decimal::ZERO);
    assert!(created_by.is_none());

    let wallet = wallet::summary(&state, PARENT, sweep_at).await.unwrap();
    assert_eq!(wallet.balance, gbp("10.00"));
    assert_eq!(
        count(
            &pool,
            &format!(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND kind = '{}'",
                notifications::TFC_AUTO_CANCELLED
            ),
            PARENT,
        )
        .await,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn reminder_is_sent_once(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 41,
            status: BookingStatus::PendingPayment,
            amount: "40.00",
            paid_card: "0",
            paid_wallet: "0",
            sessions: &[NOW + 30 * DAY],
        },
    )
    .await;
    let state = state(pool.clone());
    let payment = tfc::create_for_booking(&state, &parent(), 41, NOW).await.unwrap();
    assert_eq!(payment.reminder_at, NOW + 3 * DAY);

    assert_eq!(tfc::send_reminders(&state, NOW + 2 * DAY, 50).await.unwrap(), 0);
    assert_eq!(tfc::send_reminders(&state, NOW + 4 * DAY, 50).await.unwrap(), 1);
    assert_eq!(tfc::send_reminders(&state, NOW + 4 * DAY + HOUR, 50).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn spend_draws_soonest_expiring_credit_first(pool: PgPool) {
    seed_booking(
        &pool,
        Seed {
            id: 50,
            status: BookingStatus::PendingPayment,
            amount: "15.00",
            paid_card: "0",
            paid_wallet: "0",
            sessions: &[NOW + 30 * DAY],
        },
    )
    .await;
    let state = state(pool.clone());

    let late = wallet::grant(&state, &admin(), PARENT, gbp("10.00"), CreditSource::Goodwill, Some(30), None, NOW)
        .await
        .unwrap();
    let soon = wallet::grant(&state, &admin(), PARENT, gbp("10.00"), CreditSource::Goodwill, Some(5), None, NOW)
        .await
        .unwrap();

    let outcome = wallet::spend(&state, &parent(), 50, gbp("15.00"), false, NOW + HOUR)
        .await
        .unwrap();
    assert!(outcome.booking_confirmed);
    assert_eq!(outcome.balance, gbp("5.00"));
    let drawn: Vec<(i64, Decimal)> = outcome
        .plan
        .allocations
        .iter()
        .map(|a| (a.credit_id, a.amount))
        .collect();
    assert_eq!(drawn, vec![(soon.credit_id, gbp("10.00")), (late.credit_id, gbp("5.00"))]);

    let booking = booking_state(&pool, 50).await;
    assert_eq!(booking.status, "confirmed");
    assert_eq!(booking.paid_wallet, gbp("15.00"));
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM wallet_transactions WHERE booking_id = $1 AND kind = 'spend'", 50).await,
        2
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn transfer_moves_balance_and_writes_ledger(pool: PgPool) {
    let state = state(pool.clone());
    wallet::grant(&state, &admin(), PARENT, gbp("30.00"), CreditSource::Goodwill, None, None, NOW)
        .await
        .unwrap();

    let outcome = wallet::transfer(&state, &admin(), PARENT, OTHER_PARENT, gbp("20.00"), NOW + HOUR)
        .await
        .unwrap();
    assert_eq!(outcome.amount, gbp("20.00"));
    assert_eq!(outcome.issued_credit_ids.len(), 1);

    assert_eq!(wallet::summary(&state, PARENT, NOW + HOUR).await.unwrap().balance, gbp("10.00"));
    assert_eq!(
        wallet::summary(&state, OTHER_PARENT, NOW + HOUR).await.unwrap().balance,
        gbp("20.00")
    );

    let out: Vec<(String, Decimal)> = sqlx::query_as(
        "SELECT kind, amount FROM wallet_transactions WHERE parent_id = $1 ORDER BY created_at, kind",
    )
    .bind(PARENT)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(out.contains(&("transfer_out".to_string(), gbp("20.00"))));
    assert_eq!(
        count(
            &pool,
            "SELECT COUNT(*) FROM wallet_transactions WHERE parent_id = $1 AND kind = 'transfer_in'",
            OTHER_PARENT,
        )
        .await,
        1
    );

    let overdraw = wallet::transfer(&state, &admin(), PARENT, OTHER_PARENT, gbp("10.01"), NOW + 2 * HOUR).await;
    assert_eq!(code(overdraw.unwrap_err()), ErrorCode::WalletInsufficientBalance);
}

#[sqlx::test(migrations = "./migrations")]
async fn expiry_sweep_is_idempotent(pool: PgPool) {
    let state = state(pool.clone());
    let granted = wallet::grant(&state, &admin(), PARENT, gbp("15.00"), CreditSource::Goodwill, Some(1), None, NOW)
        .await
        .unwrap();
    assert_eq!(granted.expires_at, NOW + DAY);

    assert_eq!(wallet::expire_credits(&state, NOW + HOUR, 100).await.unwrap(), 0);
    assert_eq!(wallet::expire_credits(&state, NOW + 2 * DAY, 100).await.unwrap(), 1);
    assert_eq!(wallet::expire_credits(&state, NOW + 2 * DAY, 100).await.unwrap(), 0);

    let status: String = sqlx::query_scalar("SELECT status FROM wallet_credits WHERE id = $1")
        .bind(granted.credit_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "expired");
    let expired: Decimal = sqlx::query_scalar(
        "SELECT amount FROM wallet_transactions WHERE credit_id = $1 AND kind = 'expire'",
    )
    .bind(granted.credit_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(expired, gbp("15.00"));
    assert_eq!(wallet::summary(&state, PARENT, NOW + 2 * DAY).await.unwrap().balance, Decimal::ZERO);
}
