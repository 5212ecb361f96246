use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;

use super::protocol::{ENDPOINT_INFO, ENDPOINT_KV, MessageBody, PutBody, ValueBody};
use crate::coordinator::Coordinator;
use crate::error::{KvError, MSG_SUCCESS};
use crate::protocol::{Request, Response};

type ErrorReply = (StatusCode, Json<MessageBody>);

/// Builds the gateway router around a shared coordinator.
pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route(
            ENDPOINT_KV,
            get(handle_get).put(handle_put).delete(handle_delete),
        )
        .route(ENDPOINT_INFO, get(handle_info))
        .layer(Extension(coordinator))
}

pub async fn handle_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<ValueBody>), ErrorReply> {
    match coordinator.handle_get(&key).await {
        Response::GetResp { key, value } => Ok((StatusCode::OK, Json(ValueBody { key, value }))),
        other => {
            tracing::debug!("GET {} over HTTP failed: {:?}", key, other);
            Err(message_reply(&other))
        }
    }
}

pub async fn handle_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    Json(body): Json<PutBody>,
) -> (StatusCode, Json<MessageBody>) {
    let resp = coordinator.handle_tpc(Request::put(key, body.into_stored())).await;
    message_reply(&resp)
}

pub async fn handle_delete(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> (StatusCode, Json<MessageBody>) {
    let resp = coordinator.handle_tpc(Request::del(key)).await;
    message_reply(&resp)
}

pub async fn handle_info(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> (StatusCode, Json<MessageBody>) {
    message_reply(&coordinator.info().await)
}

fn message_reply(resp: &Response) -> (StatusCode, Json<MessageBody>) {
    match resp.message() {
        Some(message) => (
            status_for(message),
            Json(MessageBody {
                message: message.to_string(),
            }),
        ),
        None => {
            tracing::error!("Coordinator answered with {:?}", resp);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageBody {
                    message: KvError::Generic.to_string(),
                }),
            )
        }
    }
}

fn status_for(message: &str) -> StatusCode {
    let is = |err: KvError| message == err.to_string();

    if message == MSG_SUCCESS || !message.starts_with("ERROR") {
        StatusCode::OK
    } else if is(KvError::NoSuchKey) {
        StatusCode::NOT_FOUND
    } else if is(KvError::KeyTooLong) || is(KvError::ValueTooLong) || is(KvError::InvalidRequest) {
        StatusCode::BAD_REQUEST
    } else if is(KvError::Generic) {
        StatusCode::CONFLICT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
