//! Lead message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, warn};

use super::{authorize_or_reject, parse_request, respond, AppState};
use crate::services::{activity, bulk_upsert, lead, lead_status};
use crate::types::{
    AssignLeadRequest, ChangeLeadStatusRequest, LeadActivitiesRequest, LeadIdRequest, ListRequest,
    UpsertLeadsPayload,
};

/// Handle lead.upsert messages (one lead or an array)
pub async fn handle_upsert(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.upsert message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<UpsertLeadsPayload>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let leads = request.payload.into_vec();
        let result = bulk_upsert::upsert_leads(state.store.as_ref(), &ctx, leads).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle lead.list messages
pub async fn handle_list(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ListRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead::list_leads(state.store.as_ref(), &ctx, &request.payload).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle lead.get messages
pub async fn handle_get(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.get message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<LeadIdRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead::get_lead(state.store.as_ref(), &ctx, request.payload.id).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle lead.status messages
pub async fn handle_change_status(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.status message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ChangeLeadStatusRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead_status::change_lead_status(
            state.store.as_ref(),
            &state.status_cache,
            &ctx,
            request.payload.id,
            &request.payload.status,
        )
        .await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle lead.activities messages
pub async fn handle_activities(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.activities message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<LeadActivitiesRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            activity::list_lead_activities(state.store.as_ref(), &ctx, request.payload.id, &request.payload.list).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle lead.assign messages
pub async fn handle_assign(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.assign message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<AssignLeadRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            lead::assign_lead(state.store.as_ref(), &ctx, request.payload.id, request.payload.assigned_to).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteResponse {
    deleted: bool,
}

/// Handle lead.delete messages
pub async fn handle_delete(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received lead.delete message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<LeadIdRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = lead::delete_lead(state.store.as_ref(), &ctx, request.payload.id)
            .await
            .map(|()| DeleteResponse { deleted: true });
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}
