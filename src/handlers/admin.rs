//! Platform admin handlers
//!
//! Not tenant-scoped: the caller must hold the SUPER_ADMIN role.

use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use tracing::{debug, info, warn};

use super::{parse_request, respond, AppState};
use crate::auth;
use crate::error::CrmError;
use crate::services::overview;
use crate::types::EmptyPayload;

/// Handle admin.overview messages
pub async fn handle_overview(client: Client, mut subscriber: Subscriber, state: AppState) -> Result<()> {
    while let Some(msg) = subscriber.next().await {
        debug!("Received admin.overview message");

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

        let result = match auth::extract_session(&request, &state.jwt_secret) {
            Ok(session) => {
                let result = overview::platform_overview(state.store.as_ref(), &session).await;
                if result.is_ok() {
                    info!("Platform overview served to {}", session.user_id);
                }
                result
            }
            Err(e) => {
                debug!("Rejected session: {}", e);
                Err(CrmError::Unauthorized)
            }
        };
        respond(&client, reply, request.id, result).await?;
    }

    Ok(())
}
