//! Payment routes.
//!
//! Every stored ledger entry is listed twice: once from the payer's side
//! (`outgoing`, with `to_account`) and once from the recipient's side
//! (`incoming`, with `from_account`).

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::{LedgerEntry, Storage, TransferRequest};
use tally_shared::AppError;
use tally_shared::types::{from_minor_units, to_minor_units};

use crate::AppState;
use crate::error::{error_response, rejection_response};

/// Creates the payment routes.
pub fn routes<S: Storage + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route("/accounts/payments", get(list_payments::<S>))
        .route("/accounts/{uid}/payments", post(create_payment::<S>))
}

/// Request body for a payment from the account in the path.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentBody {
    /// Account receiving the amount.
    pub recipient: String,
    /// Amount, e.g. `25.00`.
    pub amount: Decimal,
}

/// Which side of a ledger entry a payment view is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The account paid.
    Outgoing,
    /// The account was paid.
    Incoming,
}

/// One side of a ledger entry.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// The account this view belongs to.
    pub account: String,
    /// Payer, on incoming views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_account: Option<String>,
    /// Recipient, on outgoing views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_account: Option<String>,
    /// Side of the entry.
    pub direction: Direction,
    /// Signed amount as a decimal string.
    pub amount: String,
    /// When the transfer was executed.
    pub created_at: DateTime<Utc>,
}

impl PaymentResponse {
    /// The payer's view of `entry`.
    #[must_use]
    pub fn outgoing(entry: &LedgerEntry) -> Self {
        Self {
            account: entry.payer_uid.clone(),
            from_account: None,
            to_account: Some(entry.recipient_uid.clone()),
            direction: Direction::Outgoing,
            amount: from_minor_units(entry.amount).to_string(),
            created_at: entry.created_at,
        }
    }

    /// The recipient's view of `entry`.
    #[must_use]
    pub fn incoming(entry: &LedgerEntry) -> Self {
        Self {
            account: entry.recipient_uid.clone(),
            from_account: Some(entry.payer_uid.clone()),
            to_account: None,
            direction: Direction::Incoming,
            amount: from_minor_units(entry.amount).to_string(),
            created_at: entry.created_at,
        }
    }
}

/// GET `/accounts/payments` - List every payment, from both sides.
async fn list_payments<S: Storage + 'static>(State(state): State<AppState<S>>) -> Response {
    match state.accounts.all_payments().await {
        Ok(entries) => {
            let response: Vec<PaymentResponse> = entries
                .iter()
                .flat_map(|e| [PaymentResponse::outgoing(e), PaymentResponse::incoming(e)])
                .collect();
            (StatusCode::OK, Json(json!({ "payments": response }))).into_response()
        }
        Err(e) => error_response(&e.into(), "list payments"),
    }
}

/// Whether `uid` may appear as the payer segment of a payment path.
fn is_routable_uid(uid: &str) -> bool {
    !uid.is_empty() && uid.chars().all(|c| c.is_ascii_alphanumeric())
}

/// POST `/accounts/{uid}/payments` - Transfer from `uid` to the recipient.
///
/// Only ASCII alphanumeric payer uids are routed; anything else is 404.
async fn create_payment<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Path(payer): Path<String>,
    payload: Result<Json<CreatePaymentBody>, JsonRejection>,
) -> Response {
    if !is_routable_uid(&payer) {
        return error_response(
            &AppError::NotFound(format!("no payment route for account {payer}")),
            "create payment",
        );
    }
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection, "create payment"),
    };

    let amount = match to_minor_units(payload.amount) {
        Ok(amount) => amount,
        Err(e) => {
            return error_response(
                &AppError::Validation(format!("field amount: {e}")),
                "create payment",
            );
        }
    };

    let request = TransferRequest::new(payer, payload.recipient, amount);

    match state.transfers.execute(&request).await {
        Ok(entry) => {
            (StatusCode::CREATED, Json(PaymentResponse::outgoing(&entry))).into_response()
        }
        Err(e) => error_response(&e.into(), "create payment"),
    }
}
