//! Account routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tally_core::{Account, CreateAccountRequest, Storage};
use tally_shared::AppError;
use tally_shared::types::{from_minor_units, to_minor_units};

use crate::AppState;
use crate::error::{error_response, rejection_response};

/// Creates the account routes.
pub fn routes<S: Storage + 'static>() -> Router<AppState<S>> {
    Router::new().route(
        "/accounts",
        get(list_accounts::<S>).post(create_account::<S>),
    )
}

/// Request body for opening an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountBody {
    /// Caller-assigned unique identifier.
    pub uid: String,
    /// Currency code, any case.
    pub currency: String,
    /// Opening balance, e.g. `100.00`.
    pub balance: Decimal,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account identifier.
    pub uid: String,
    /// Currency code.
    pub currency: String,
    /// Current balance as a decimal string.
    pub balance: String,
    /// When the account was opened.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            uid: account.uid,
            currency: account.currency,
            balance: from_minor_units(account.balance).to_string(),
            created_at: account.created_at,
        }
    }
}

/// GET `/accounts` - List every account.
async fn list_accounts<S: Storage + 'static>(State(state): State<AppState<S>>) -> Response {
    match state.accounts.all_accounts().await {
        Ok(accounts) => {
            let response: Vec<AccountResponse> =
                accounts.into_iter().map(AccountResponse::from).collect();
            (StatusCode::OK, Json(json!({ "accounts": response }))).into_response()
        }
        Err(e) => error_response(&e.into(), "list accounts"),
    }
}

/// POST `/accounts` - Open an account.
async fn create_account<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateAccountBody>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(&rejection, "create account"),
    };

    let balance = match to_minor_units(payload.balance) {
        Ok(balance) => balance,
        Err(e) => {
            return error_response(
                &AppError::Validation(format!("field balance: {e}")),
                "create account",
            );
        }
    };

    let request = CreateAccountRequest {
        uid: payload.uid,
        currency: payload.currency,
        balance,
    };

    match state.accounts.create_account(request).await {
        Ok(account) => (StatusCode::CREATED, Json(AccountResponse::from(account))).into_response(),
        Err(e) => error_response(&e.into(), "create account"),
    }
}
