//! Import batch message handlers

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, warn};

use super::{authorize_or_reject, parse_request, respond, AppState};
use crate::services::{import_pipeline, import_tracker};
use crate::types::{
    CreateImportBatchRequest, CreateImportBatchResponse, DeleteImportRequest, ImportFileRequest, ListRequest,
};

/// Handle import.list messages
pub async fn handle_list(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.list message");

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

        let result = import_tracker::list_import_batches(state.store.as_ref(), &ctx, &request.payload).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle import.create messages
pub async fn handle_create(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.create message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<CreateImportBatchRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = import_tracker::create_import_batch(state.store.as_ref(), &ctx, &request.payload)
            .await
            .map(|batch| CreateImportBatchResponse {
                message: format!("Import {} created", batch.file_name),
                data: batch,
            });
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle import.delete messages. Without an id every batch of the tenant goes.
pub async fn handle_delete(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.delete message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<DeleteImportRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = import_tracker::delete_import_batches(state.store.as_ref(), &ctx, request.payload.id).await;
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}

/// Handle import.file messages: a whole spreadsheet in one request
pub async fn handle_file(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received import.file message");

        let reply = match msg.reply {
            Some(ref reply) => reply.clone(),
            None => {
                warn!("Message without reply subject");
                continue;
            }
        };

        let Some(request) = parse_request::<ImportFileRequest>(&client, &reply, &msg.payload).await? else {
            continue;
        };
        let Some(ctx) = authorize_or_reject(&client, &reply, &request, &state).await? else {
            continue;
        };

        let result = match import_pipeline::decode_content(&request.payload.content) {
            Ok(bytes) => {
                import_pipeline::import_file(state.store.as_ref(), &ctx, &request.payload.file_name, &bytes).await
            }
            Err(e) => Err(e),
        };
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}
