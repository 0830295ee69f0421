//! Request/response shapes for the external gateway
//!
//! The gateway (HTTP collaborator, out of scope here) deserializes caller
//! JSON into these types and hands them to the engine. All `f64` -> fixed
//! point conversion and direction parsing happens at this boundary, so the
//! engine only ever sees validated typed input.

use crate::engine::SwapEngine;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use services_common::{Qty, Side, Token, UserId};

/// Swap request as submitted by the trading UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Trusted user identifier (verified by the identity collaborator)
    pub user_id: String,
    /// "buy" or "sell"
    pub direction: String,
    /// Input amount in token units
    pub amount: f64,
}

/// Successful swap response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable confirmation
    pub message: String,
    /// Amount debited
    pub amount_in: f64,
    /// Amount credited
    pub amount_out: f64,
}

/// Rejected operation, carrying a stable error kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Stable machine-readable kind (see [`EngineError::kind`])
    pub kind: String,
    /// Human-readable message
    pub error: String,
}

impl From<EngineError> for ErrorResponse {
    fn from(err: EngineError) -> Self {
        Self {
            success: false,
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}

/// Pool initialization request (admin)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPoolRequest {
    /// Initial base-token reserve
    pub reserve_base: f64,
    /// Initial quote-token reserve
    pub reserve_quote: f64,
    /// Shared admin secret
    pub secret: String,
}

/// Pool initialization response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPoolResponse {
    /// Always `true`
    pub success: bool,
    /// Base reserve as stored
    pub reserve_base: f64,
    /// Quote reserve as stored
    pub reserve_quote: f64,
}

/// Deposit credit request from the deposit-detection collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    /// Credited user
    pub user_id: String,
    /// Credited token symbol
    pub token: String,
    /// Observed amount in token units
    pub amount: f64,
}

/// Deposit credit response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponse {
    /// Always `true`
    pub success: bool,
    /// Balance after the credit, in token units
    pub balance: f64,
}

fn positive_amount(value: f64, what: &str) -> Result<Qty, EngineError> {
    Qty::checked_from_f64(value)
        .filter(Qty::is_positive)
        .ok_or_else(|| EngineError::InvalidAmount(format!("{what} must be a positive number")))
}

/// Validate and execute a swap request
pub async fn handle_swap(
    engine: &SwapEngine,
    request: SwapRequest,
) -> Result<SwapResponse, ErrorResponse> {
    let side: Side = request
        .direction
        .parse()
        .map_err(|_| EngineError::InvalidDirection(request.direction.clone()))?;
    let amount = positive_amount(request.amount, "amount")?;
    let user = UserId::new(request.user_id);

    let receipt = engine.execute_swap(&user, side, amount).await?;
    Ok(SwapResponse {
        success: true,
        message: "Swap successful".to_string(),
        amount_in: receipt.amount_in.as_f64(),
        amount_out: receipt.amount_out.as_f64(),
    })
}

/// Validate and apply a pool initialization request
pub fn handle_init_pool(
    engine: &SwapEngine,
    request: InitPoolRequest,
) -> Result<InitPoolResponse, ErrorResponse> {
    let reserve_base = positive_amount(request.reserve_base, "reserveBase")?;
    let reserve_quote = positive_amount(request.reserve_quote, "reserveQuote")?;
    let pool = engine.init_pool(&request.secret, reserve_base, reserve_quote)?;
    Ok(InitPoolResponse {
        success: true,
        reserve_base: pool.reserve_base.as_f64(),
        reserve_quote: pool.reserve_quote.as_f64(),
    })
}

/// Validate and apply a deposit credit
pub fn handle_deposit(
    engine: &SwapEngine,
    request: DepositRequest,
) -> Result<DepositResponse, ErrorResponse> {
    let amount = positive_amount(request.amount, "amount")?;
    let user = UserId::new(request.user_id);
    let token = Token::new(request.token);
    let balance = engine.credit(&user, &token, amount)?;
    Ok(DepositResponse {
        success: true,
        balance: balance.as_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use services_common::Qty;

    fn engine_with_funds() -> SwapEngine {
        let engine = SwapEngine::new(EngineConfig::default());
        engine
            .init_pool(
                "MY_SECRET",
                Qty::from_units(88),
                Qty::from_units(17_000_000),
            )
            .expect("init");
        engine
            .credit(
                &UserId::new("alice"),
                &Token::new("SOL"),
                Qty::from_units(10),
            )
            .expect("credit");
        engine
    }

    #[tokio::test]
    async fn test_swap_request_roundtrip() {
        let engine = engine_with_funds();
        let request: SwapRequest = serde_json::from_str(
            r#"{"userId":"alice","direction":"buy","amount":1.0}"#,
        )
        .expect("json");

        let response = handle_swap(&engine, request).await.expect("swap");
        assert!(response.success);
        assert!((response.amount_in - 1.0).abs() < f64::EPSILON);
        assert!(response.amount_out > 0.0);
    }

    #[tokio::test]
    async fn test_unknown_direction_is_stable_kind() {
        let engine = engine_with_funds();
        let request = SwapRequest {
            user_id: "alice".to_string(),
            direction: "hodl".to_string(),
            amount: 1.0,
        };
        let err = handle_swap(&engine, request).await.unwrap_err();
        assert_eq!(err.kind, "invalid_direction");
        assert!(!err.success);
    }

    #[tokio::test]
    async fn test_non_finite_amount_rejected() {
        let engine = engine_with_funds();
        let request = SwapRequest {
            user_id: "alice".to_string(),
            direction: "buy".to_string(),
            amount: f64::NAN,
        };
        let err = handle_swap(&engine, request).await.unwrap_err();
        assert_eq!(err.kind, "invalid_amount");
    }

    #[test]
    fn test_deposit_credits_balance() {
        let engine = engine_with_funds();
        let response = handle_deposit(
            &engine,
            DepositRequest {
                user_id: "carol".to_string(),
                token: "PSNG".to_string(),
                amount: 250.0,
            },
        )
        .expect("deposit");
        assert!((response.balance - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_init_pool_bad_secret_maps_to_unauthorized() {
        let engine = SwapEngine::new(EngineConfig::default());
        let err = handle_init_pool(
            &engine,
            InitPoolRequest {
                reserve_base: 88.0,
                reserve_quote: 17_000_000.0,
                secret: "guess".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.kind, "unauthorized");
    }
}
