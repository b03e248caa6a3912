//! Lead status message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, warn};

use super::{authorize_or_reject, parse_request, respond, AppState};
use crate::services::lead_status;
use crate::types::{CreateStatusRequest, DeleteStatusRequest, EmptyPayload, RenameStatusRequest};

/// Handle status.list messages
pub async fn handle_list(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received status.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<EmptyPayload>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead_status::list_statuses(state.store.as_ref(), &ctx).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle status.create messages
pub async fn handle_create(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received status.create message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<CreateStatusRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            lead_status::create_status(state.store.as_ref(), &state.status_cache, &ctx, &request.payload.name).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle status.rename messages
pub async fn handle_rename(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received status.rename message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<RenameStatusRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead_status::rename_status(
            state.store.as_ref(),
            &state.status_cache,
            &ctx,
            request.payload.id,
            &request.payload.name,
        )
        .await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle status.delete messages
pub async fn handle_delete(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received status.delete message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<DeleteStatusRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            lead_status::delete_status(state.store.as_ref(), &state.status_cache, &ctx, request.payload.id).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}
