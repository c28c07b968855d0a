// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token endpoints: issuance, lookup, transfer, verification, cleanup.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    coordinator::{IssueOutcome, TransferOutcome, VerifyOutcome},
    error::ApiError,
    models::{IssueTokenRequest, TokenResponse, TransferTokenRequest, VerifyResponse},
    state::AppState,
};

/// Issue a new soulbound token.
///
/// Records the token, mints it on-chain, and waits for confirmation. A
/// confirmation timeout is reported as `202 Accepted` with the record still
/// pending; the background reconciler settles it once the receipt appears.
#[utoipa::path(
    post,
    path = "/token/issue",
    tag = "Tokens",
    request_body = IssueTokenRequest,
    responses(
        (status = 201, description = "Token minted and confirmed", body = TokenResponse),
        (status = 202, description = "Submitted; confirmation pending", body = TokenResponse),
        (status = 400, description = "Invalid token value or owner address"),
        (status = 409, description = "Token value already issued"),
        (status = 502, description = "Chain submission or confirmation failed")
    )
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<IssueTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let outcome = state
        .coordinator
        .issue(&request.token, &request.owner_id.0)
        .await?;

    match outcome {
        IssueOutcome::Confirmed(record) => {
            Ok((StatusCode::CREATED, Json(TokenResponse::from(record))))
        }
        IssueOutcome::PendingConfirmation(record) => {
            Ok((StatusCode::ACCEPTED, Json(TokenResponse::from(record))))
        }
    }
}

/// Get a token record by id.
#[utoipa::path(
    get,
    path = "/token/{id}",
    tag = "Tokens",
    params(
        ("id" = u64, Path, description = "Token identifier")
    ),
    responses(
        (status = 200, body = TokenResponse),
        (status = 404, description = "Token not found")
    )
)]
pub async fn get_token(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TokenResponse>, ApiError> {
    let record = state.store.get(id)?;
    Ok(Json(TokenResponse::from(record)))
}

/// Transfer a confirmed token to a new owner.
///
/// The caller must be the current owner; the contract's non-transferable
/// flag is checked before any transaction is submitted.
#[utoipa::path(
    put,
    path = "/token/{id}",
    tag = "Tokens",
    params(
        ("id" = u64, Path, description = "Token identifier")
    ),
    request_body = TransferTokenRequest,
    responses(
        (status = 200, description = "Ownership transferred", body = TokenResponse),
        (status = 202, description = "Submitted; confirmation pending", body = TokenResponse),
        (status = 403, description = "Caller is not the current owner"),
        (status = 404, description = "Token not found"),
        (status = 409, description = "Token not confirmed or non-transferable"),
        (status = 502, description = "Chain submission or confirmation failed")
    )
)]
pub async fn transfer_token(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<TransferTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let outcome = state
        .coordinator
        .transfer(id, &request.caller_id.0, &request.owner_id.0)
        .await?;

    match outcome {
        TransferOutcome::Completed(record) => {
            Ok((StatusCode::OK, Json(TokenResponse::from(record))))
        }
        TransferOutcome::PendingConfirmation(record) => {
            Ok((StatusCode::ACCEPTED, Json(TokenResponse::from(record))))
        }
    }
}

/// Remove a failed token record.
///
/// Confirmed records mirror an immutable on-chain mint and cannot be
/// removed; pending records are still owed a reconciliation outcome.
#[utoipa::path(
    delete,
    path = "/token/{id}",
    tag = "Tokens",
    params(
        ("id" = u64, Path, description = "Token identifier")
    ),
    responses(
        (status = 204, description = "Failed record removed"),
        (status = 404, description = "Token not found"),
        (status = 409, description = "Record is not in failed status")
    )
)]
pub async fn remove_token(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Verify an owner's holdings against the chain.
///
/// Returns the owner's confirmed tokens only when the store and the
/// contract's `ownerOf` agree on every one of them. A disagreement is a
/// `409` — a reconciliation signal, never silently resolved.
#[utoipa::path(
    get,
    path = "/token/verify/{owner_id}",
    tag = "Tokens",
    params(
        ("owner_id" = String, Path, description = "Owner address")
    ),
    responses(
        (status = 200, description = "Store and chain agree", body = VerifyResponse),
        (status = 404, description = "No tokens found for the owner"),
        (status = 409, description = "Off-chain and on-chain ownership disagree"),
        (status = 503, description = "Chain unavailable")
    )
)]
pub async fn verify_owner(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    match state.coordinator.verify(&owner_id).await? {
        VerifyOutcome::Verified(tokens) => Ok(Json(VerifyResponse {
            tokens: tokens.into_iter().map(TokenResponse::from).collect(),
        })),
        VerifyOutcome::Mismatch {
            token_id,
            recorded,
            on_chain,
        } => Err(ApiError::conflict(format!(
            "ownership mismatch for token {token_id}: store has {recorded}, chain has {on_chain}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::chain::mock::{ConfirmationMode, MockChainClient};
    use crate::coordinator::IssuanceCoordinator;
    use crate::models::OwnerAddress;
    use crate::store::{TokenDatabase, TokenStatus};

    const OWNER: &str = "0x1111111111111111111111111111111111111111";
    const OTHER: &str = "0x2222222222222222222222222222222222222222";

    fn test_state() -> (AppState, Arc<MockChainClient>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TokenDatabase::open(&dir.path().join("test.redb")).unwrap());
        let chain = Arc::new(MockChainClient::new());
        let coordinator = Arc::new(IssuanceCoordinator::new(
            store.clone(),
            chain.clone(),
            Duration::from_secs(5),
        ));
        (AppState::new(coordinator, store), chain, dir)
    }

    fn issue_request(value: &str, owner: &str) -> Json<IssueTokenRequest> {
        Json(IssueTokenRequest {
            token: value.to_string(),
            owner_id: OwnerAddress::from(owner),
        })
    }

    #[tokio::test]
    async fn issue_then_get_round_trip() {
        let (state, _chain, _dir) = test_state();

        let (status, Json(token)) =
            issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
                .await
                .expect("issue succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(token.status, TokenStatus::Confirmed);
        assert_eq!(token.owner_id.0, OWNER);

        let Json(fetched) = get_token(State(state), Path(token.id))
            .await
            .expect("lookup succeeds");
        assert_eq!(fetched.token_value, "credential-abc");
        assert_eq!(fetched.status, TokenStatus::Confirmed);
    }

    #[tokio::test]
    async fn reissuing_same_value_conflicts() {
        let (state, _chain, _dir) = test_state();
        issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
            .await
            .unwrap();

        let err = issue_token(State(state), issue_request("credential-abc", OTHER))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn issue_timeout_is_accepted_not_failed() {
        let (state, chain, _dir) = test_state();
        chain.set_confirmation(ConfirmationMode::Timeout);

        let (status, Json(token)) =
            issue_token(State(state), issue_request("credential-abc", OWNER))
                .await
                .expect("timeout is not an error");

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(token.status, TokenStatus::Pending);
    }

    #[tokio::test]
    async fn issue_with_missing_fields_is_bad_request() {
        let (state, _chain, _dir) = test_state();

        let err = issue_token(State(state), issue_request("", OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_missing_token_is_not_found() {
        let (state, _chain, _dir) = test_state();
        let err = get_token(State(state), Path(42)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn transfer_by_non_owner_is_forbidden() {
        let (state, _chain, _dir) = test_state();
        let (_, Json(token)) =
            issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
                .await
                .unwrap();

        let err = transfer_token(
            State(state),
            Path(token.id),
            Json(TransferTokenRequest {
                owner_id: OwnerAddress::from(OTHER),
                caller_id: OwnerAddress::from(OTHER),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn transfer_of_soulbound_token_conflicts() {
        let (state, chain, _dir) = test_state();
        let (_, Json(token)) =
            issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
                .await
                .unwrap();
        chain.mark_non_transferable(token.id);

        let err = transfer_token(
            State(state),
            Path(token.id),
            Json(TransferTokenRequest {
                owner_id: OwnerAddress::from(OTHER),
                caller_id: OwnerAddress::from(OWNER),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn transfer_by_owner_updates_record() {
        let (state, _chain, _dir) = test_state();
        let (_, Json(token)) =
            issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
                .await
                .unwrap();

        let (status, Json(updated)) = transfer_token(
            State(state),
            Path(token.id),
            Json(TransferTokenRequest {
                owner_id: OwnerAddress::from(OTHER),
                caller_id: OwnerAddress::from(OWNER),
            }),
        )
        .await
        .expect("transfer succeeds");

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated.owner_id.0, OTHER);
    }

    #[tokio::test]
    async fn verify_lists_confirmed_tokens() {
        let (state, _chain, _dir) = test_state();
        issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
            .await
            .unwrap();

        let Json(response) = verify_owner(State(state), Path(OWNER.to_string()))
            .await
            .expect("verification succeeds");
        assert_eq!(response.tokens.len(), 1);
    }

    #[tokio::test]
    async fn verify_mismatch_conflicts() {
        let (state, chain, _dir) = test_state();
        let (_, Json(token)) =
            issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
                .await
                .unwrap();
        chain.set_owner(token.id, OTHER);

        let err = verify_owner(State(state), Path(OWNER.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn verify_unknown_owner_is_not_found() {
        let (state, _chain, _dir) = test_state();
        let err = verify_owner(State(state), Path(OWNER.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn remove_only_deletes_failed_records() {
        let (state, chain, _dir) = test_state();
        chain.fail_submissions(crate::chain::ChainClientError::Unavailable("down".into()));

        let err = issue_token(State(state.clone()), issue_request("credential-abc", OWNER))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        // The record was marked failed, so it can be cleaned up.
        let status = remove_token(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = remove_token(State(state), Path(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
