//! Reminder message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, warn};

use super::{authorize_or_reject, parse_request, respond, AppState};
use crate::services::reminder;
use crate::types::{
    CreateReminderRequest, ListRemindersRequest, ReminderIdRequest, SnoozeReminderRequest, UpdateReminderRequest,
};

/// Handle reminder.create messages
pub async fn handle_create(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.create message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<CreateReminderRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = reminder::create_reminder(state.store.as_ref(), &ctx, &request.payload).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle reminder.list messages
pub async fn handle_list(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.list message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ListRemindersRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = reminder::list_reminders(state.store.as_ref(), &ctx, &request.payload).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle reminder.update messages
pub async fn handle_update(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.update message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<UpdateReminderRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            reminder::update_reminder(state.store.as_ref(), &ctx, request.payload.id, &request.payload.edit).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle reminder.complete messages
pub async fn handle_complete(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.complete message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ReminderIdRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = reminder::complete_reminder(state.store.as_ref(), &ctx, request.payload.id).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle reminder.snooze messages
pub async fn handle_snooze(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.snooze message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<SnoozeReminderRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result =
            reminder::snooze_reminder(state.store.as_ref(), &ctx, request.payload.id, request.payload.until).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle reminder.dismiss messages
pub async fn handle_dismiss(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received reminder.dismiss message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ReminderIdRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = reminder::dismiss_reminder(state.store.as_ref(), &ctx, request.payload.id).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}
