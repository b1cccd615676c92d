//! Asset API handlers.
//!
//! Each handler validates its input, makes exactly one gateway call and maps
//! the result. Reads go through `evaluate`, writes through `submit`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::assets::{
    AssetPayload, TransferRequest, ASSET_HISTORY, CREATE_ASSET, GET_ALL_ASSETS, INIT_LEDGER,
    READ_ASSET, TRANSFER_ASSET, UPDATE_ASSET,
};
use crate::fabric::{decode_json, decode_text};
use crate::http::response::ApiError;
use crate::http::server::AppState;

type ApiResult = Result<Json<Value>, ApiError>;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let gateway = &state.gateway;
    Json(json!({
        "status": "ok",
        "channel": gateway.channel_name(),
        "contract": gateway.contract_name(),
        "mspId": gateway.msp_id(),
    }))
}

pub async fn init_ledger(State(state): State<AppState>) -> ApiResult {
    state
        .gateway
        .submit(INIT_LEDGER, &[])
        .await
        .map_err(ApiError::ledger("initialize ledger"))?;
    Ok(Json(json!({ "message": "Ledger has initialized successfully" })))
}

pub async fn list_assets(State(state): State<AppState>) -> ApiResult {
    let bytes = state
        .gateway
        .evaluate(GET_ALL_ASSETS, &[])
        .await
        .map_err(ApiError::ledger("retrieve assets"))?;
    let assets: Value = decode_json(&bytes).map_err(ApiError::ledger("retrieve assets"))?;
    Ok(Json(assets))
}

pub async fn create_asset(
    State(state): State<AppState>,
    body: Result<Json<AssetPayload>, JsonRejection>,
) -> ApiResult {
    let Json(payload) = body?;
    let args = payload.to_args()?;
    state
        .gateway
        .submit(CREATE_ASSET, &args)
        .await
        .map_err(ApiError::ledger("create asset"))?;
    Ok(Json(json!({
        "message": format!("Asset {} created successfully", payload.asset_id())
    })))
}

pub async fn update_asset(
    State(state): State<AppState>,
    body: Result<Json<AssetPayload>, JsonRejection>,
) -> ApiResult {
    let Json(payload) = body?;
    let args = payload.to_args()?;
    state
        .gateway
        .submit(UPDATE_ASSET, &args)
        .await
        .map_err(ApiError::ledger("update asset"))?;
    Ok(Json(json!({
        "message": format!("Asset {} updated successfully", payload.asset_id())
    })))
}

pub async fn transfer_asset(
    State(state): State<AppState>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    let args = request.to_args()?;
    let bytes = state
        .gateway
        .submit(TRANSFER_ASSET, &args)
        .await
        .map_err(ApiError::ledger("transfer asset"))?;
    let old_owner = decode_text(&bytes).map_err(ApiError::ledger("transfer asset"))?;
    let (id, new_owner) = (&args[0], &args[1]);
    Ok(Json(json!({
        "message": format!(
            "Successfully transferred the asset {} from {} to {}",
            id, old_owner, new_owner
        ),
        "id": id,
        "oldOwner": old_owner,
        "newOwner": new_owner,
    })))
}

pub async fn read_asset(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let bytes = state
        .gateway
        .evaluate(READ_ASSET, std::slice::from_ref(&id))
        .await
        .map_err(ApiError::ledger("read asset"))?;
    let asset: Value = decode_json(&bytes).map_err(ApiError::ledger("read asset"))?;
    Ok(Json(asset))
}

pub async fn asset_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let bytes = state
        .gateway
        .evaluate(ASSET_HISTORY, std::slice::from_ref(&id))
        .await
        .map_err(ApiError::ledger("retrieve transaction history"))?;
    let history: Value =
        decode_json(&bytes).map_err(ApiError::ledger("retrieve transaction history"))?;
    Ok(Json(history))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
