// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket upgrade handling for the live quiz transport adapter.
//!
//! Upgrade URL: `/ws?interactive_id=<i64>&user_id=<external id>&role=<leader|participant>`.
//!
//! Every rejection rule from spec.md §6.1 is checked *before* the connection
//! is upgraded, matching the teacher's `auth_middleware` fail-closed posture:
//! a rejected request gets a plain HTTP error response, never a 101
//! Switching Protocols followed by an immediate close.

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use livequiz_core::wire::{LeaderCommand, OutboundFrame, ParticipantSubmission, UpgradeRejection};
use livequiz_core::{InteractiveId, Role, UserId};

use crate::server::GatewayState;

/// Query parameters accompanying a `GET /ws` upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsUpgradeQuery {
    pub interactive_id: i64,
    pub user_id: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
struct RejectionBody {
    error: &'static str,
}

/// WebSocket upgrade handler: resolves and authorizes the connection before
/// calling `ws.on_upgrade`, per spec.md §6.1.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsUpgradeQuery>,
    State(state): State<GatewayState>,
) -> Response {
    let interactive_id = InteractiveId(query.interactive_id);
    let role = match query.role.as_str() {
        "leader" => Role::Leader,
        "participant" => Role::Participant,
        _ => {
            return (StatusCode::BAD_REQUEST, Json(RejectionBody { error: "invalid role" }))
                .into_response();
        }
    };

    match authorize_upgrade(&state, interactive_id, &query.user_id, role).await {
        Ok(user_id) => {
            let session = match state.manager.get_or_create(interactive_id).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(?interactive_id, error = %e, "session creation failed at upgrade");
                    return (
                        StatusCode::NOT_FOUND,
                        Json(RejectionBody { error: UpgradeRejection::InteractiveConducted.code() }),
                    )
                        .into_response();
                }
            };

            let (tx, rx) = mpsc::channel::<OutboundFrame>(32);
            if let Err(e) = session.attach(user_id, role, tx).await {
                tracing::warn!(?interactive_id, ?user_id, ?role, error = %e, "attach rejected at upgrade");
                return (
                    StatusCode::FORBIDDEN,
                    Json(RejectionBody { error: UpgradeRejection::ParticipantNotRegistered.code() }),
                )
                    .into_response();
            }

            ws.on_upgrade(move |socket| handle_socket(socket, state, session, user_id, role, rx))
        }
        Err(rejection) => {
            tracing::info!(?interactive_id, role = %query.role, code = rejection.code(), "upgrade rejected");
            (StatusCode::FORBIDDEN, Json(RejectionBody { error: rejection.code() })).into_response()
        }
    }
}

/// Applies spec.md §6.1's four upgrade-rejection rules, in order.
async fn authorize_upgrade(
    state: &GatewayState,
    interactive_id: InteractiveId,
    external_user_id: &str,
    role: Role,
) -> Result<UserId, UpgradeRejection> {
    let storage = &state.storage;

    if !storage
        .exists_interactive(interactive_id)
        .await
        .map_err(|_| UpgradeRejection::InteractiveNotFound)?
    {
        return Err(UpgradeRejection::InteractiveNotFound);
    }

    if storage
        .is_conducted(interactive_id)
        .await
        .map_err(|_| UpgradeRejection::InteractiveConducted)?
    {
        return Err(UpgradeRejection::InteractiveConducted);
    }

    let user_id = storage
        .user_id_by_external(external_user_id)
        .await
        .map_err(|_| UpgradeRejection::UserNotFound)?
        .ok_or(UpgradeRejection::UserNotFound)?;

    if role == Role::Leader {
        let is_creator = storage
            .is_creator(interactive_id, user_id)
            .await
            .map_err(|_| UpgradeRejection::NotCreator)?;
        if !is_creator {
            return Err(UpgradeRejection::NotCreator);
        }
    }

    Ok(user_id)
}

/// Drives one upgraded WebSocket connection until it closes: forwards
/// outbound frames from the Session to the socket, and inbound frames from
/// the socket to the Session, then detaches on exit.
async fn handle_socket(
    socket: axum::extract::ws::WebSocket,
    state: GatewayState,
    session: std::sync::Arc<livequiz_engine::Session>,
    user_id: UserId,
    role: Role,
    mut outbound_rx: mpsc::Receiver<OutboundFrame>,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else { continue };
            if ws_sender.send(axum::extract::ws::Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            axum::extract::ws::Message::Text(text) => {
                if role == Role::Leader {
                    match serde_json::from_str::<LeaderCommand>(&text) {
                        Ok(command) => {
                            if let Err(e) = session.handle_leader_command(user_id, command).await {
                                tracing::warn!(error = %e, "leader command rejected");
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "invalid leader command frame"),
                    }
                } else {
                    match serde_json::from_str::<ParticipantSubmission>(&text) {
                        Ok(submission) => {
                            if let Err(e) =
                                session.handle_participant_submission(user_id, submission).await
                            {
                                tracing::debug!(error = %e, "participant submission rejected");
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "invalid participant submission frame"),
                    }
                }
            }
            axum::extract::ws::Message::Close(_) => break,
            _ => {}
        }
    }

    session.detach(user_id, role).await;
    sender_task.abort();
}
