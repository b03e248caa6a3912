//! NATS message handlers

pub mod admin;
pub mod import;
pub mod lead;
pub mod ping;
pub mod reminder;
pub mod status;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_nats::{Client, Subject, Subscriber};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth;
use crate::db::Store;
use crate::error::{CrmError, StoreError};
use crate::services::status_cache::StatusNameCache;
use crate::tenancy::TenantContext;
use crate::types::{Request, SuccessResponse};

/// Shared by every handler task
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub status_cache: Arc<StatusNameCache>,
    pub jwt_secret: Arc<String>,
}

fn extract_request_id(payload: &[u8]) -> Uuid {
    if let Ok(v) = serde_json::from_slice::<serde_json::Value>(payload) {
        if let Some(id_str) = v.get("id").and_then(|id| id.as_str()) {
            if let Ok(uuid) = Uuid::parse_str(id_str) {
                return uuid;
            }
        }
    }
    Uuid::new_v4()
}

/// Parse a request envelope. A malformed one is answered with
/// `INVALID_REQUEST` and `None` is returned.
pub(crate) async fn parse_request<T: DeserializeOwned>(
    client: &Client,
    reply: &Subject,
    payload: &[u8],
) -> Result<Option<Request<T>>> {
    match serde_json::from_slice(payload) {
        Ok(request) => Ok(Some(request)),
        Err(e) => {
            warn!("Failed to parse request: {}", e);
            let error = CrmError::InvalidRequest(e.to_string()).to_response(extract_request_id(payload));
            let _ = client.publish(reply.clone(), serde_json::to_vec(&error)?.into()).await;
            Ok(None)
        }
    }
}

/// Resolve the caller's tenant, answering the request on failure
pub(crate) async fn authorize_or_reject<T>(
    client: &Client,
    reply: &Subject,
    request: &Request<T>,
    state: &AppState,
) -> Result<Option<TenantContext>> {
    match auth::authorize(request, &state.jwt_secret) {
        Ok(ctx) => Ok(Some(ctx)),
        Err(e) => {
            debug!("Request {} rejected: {}", request.id, e);
            let error = e.to_response(request.id);
            let _ = client.publish(reply.clone(), serde_json::to_vec(&error)?.into()).await;
            Ok(None)
        }
    }
}

/// Publish the outcome of an operation
pub(crate) async fn respond<T: Serialize>(
    client: &Client,
    reply: Subject,
    request_id: Uuid,
    result: Result<T, CrmError>,
) -> Result<()> {
    let bytes = match result {
        Ok(payload) => serde_json::to_vec(&SuccessResponse::new(request_id, payload))?,
        Err(e) => {
            match e {
                CrmError::Store(StoreError::Unavailable(_)) | CrmError::Store(StoreError::Query(_)) => {
                    error!("Request {} failed: {}", request_id, e)
                }
                _ => debug!("Request {} refused: {}", request_id, e),
            }
            serde_json::to_vec(&e.to_response(request_id))?
        }
    };
    let _ = client.publish(reply, bytes.into()).await;
    Ok(())
}

type HandlerTask = (&'static str, JoinHandle<Result<()>>);

fn spawn_handler<F, Fut>(
    name: &'static str,
    client: &Client,
    subscriber: Subscriber,
    state: &AppState,
    handler: F,
) -> HandlerTask
where
    F: FnOnce(Client, Subscriber, AppState) -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    (name, tokio::spawn(handler(client.clone(), subscriber, state.clone())))
}

/// Start all message handlers. Returns when any of them stops.
pub async fn start_handlers(client: Client, state: AppState) -> Result<()> {
    info!("Starting message handlers...");

    let ping_sub = client.subscribe("leadhub.ping").await?;

    // Import subjects
    let import_list_sub = client.subscribe("leadhub.import.list").await?;
    let import_create_sub = client.subscribe("leadhub.import.create").await?;
    let import_delete_sub = client.subscribe("leadhub.import.delete").await?;
    let import_file_sub = client.subscribe("leadhub.import.file").await?;

    // Lead subjects
    let lead_upsert_sub = client.subscribe("leadhub.lead.upsert").await?;
    let lead_list_sub = client.subscribe("leadhub.lead.list").await?;
    let lead_get_sub = client.subscribe("leadhub.lead.get").await?;
    let lead_status_sub = client.subscribe("leadhub.lead.status").await?;
    let lead_activities_sub = client.subscribe("leadhub.lead.activities").await?;
    let lead_assign_sub = client.subscribe("leadhub.lead.assign").await?;
    let lead_delete_sub = client.subscribe("leadhub.lead.delete").await?;

    // Status subjects
    let status_list_sub = client.subscribe("leadhub.status.list").await?;
    let status_create_sub = client.subscribe("leadhub.status.create").await?;
    let status_rename_sub = client.subscribe("leadhub.status.rename").await?;
    let status_delete_sub = client.subscribe("leadhub.status.delete").await?;

    // Reminder subjects
    let reminder_create_sub = client.subscribe("leadhub.reminder.create").await?;
    let reminder_list_sub = client.subscribe("leadhub.reminder.list").await?;
    let reminder_update_sub = client.subscribe("leadhub.reminder.update").await?;
    let reminder_complete_sub = client.subscribe("leadhub.reminder.complete").await?;
    let reminder_snooze_sub = client.subscribe("leadhub.reminder.snooze").await?;
    let reminder_dismiss_sub = client.subscribe("leadhub.reminder.dismiss").await?;

    let admin_overview_sub = client.subscribe("leadhub.admin.overview").await?;

    info!("Subscribed to NATS subjects");

    let ping_client = client.clone();
    let mut tasks: Vec<HandlerTask> = vec![(
        "Ping",
        tokio::spawn(async move { ping::handle_ping(ping_client, ping_sub).await }),
    )];

    tasks.extend([
        spawn_handler("Import list", &client, import_list_sub, &state, import::handle_list),
        spawn_handler("Import create", &client, import_create_sub, &state, import::handle_create),
        spawn_handler("Import delete", &client, import_delete_sub, &state, import::handle_delete),
        spawn_handler("Import file", &client, import_file_sub, &state, import::handle_file),
        spawn_handler("Lead upsert", &client, lead_upsert_sub, &state, lead::handle_upsert),
        spawn_handler("Lead list", &client, lead_list_sub, &state, lead::handle_list),
        spawn_handler("Lead get", &client, lead_get_sub, &state, lead::handle_get),
        spawn_handler("Lead status", &client, lead_status_sub, &state, lead::handle_change_status),
        spawn_handler("Lead activities", &client, lead_activities_sub, &state, lead::handle_activities),
        spawn_handler("Lead assign", &client, lead_assign_sub, &state, lead::handle_assign),
        spawn_handler("Lead delete", &client, lead_delete_sub, &state, lead::handle_delete),
        spawn_handler("Status list", &client, status_list_sub, &state, status::handle_list),
        spawn_handler("Status create", &client, status_create_sub, &state, status::handle_create),
        spawn_handler("Status rename", &client, status_rename_sub, &state, status::handle_rename),
        spawn_handler("Status delete", &client, status_delete_sub, &state, status::handle_delete),
        spawn_handler("Reminder create", &client, reminder_create_sub, &state, reminder::handle_create),
        spawn_handler("Reminder list", &client, reminder_list_sub, &state, reminder::handle_list),
        spawn_handler("Reminder update", &client, reminder_update_sub, &state, reminder::handle_update),
        spawn_handler("Reminder complete", &client, reminder_complete_sub, &state, reminder::handle_complete),
        spawn_handler("Reminder snooze", &client, reminder_snooze_sub, &state, reminder::handle_snooze),
        spawn_handler("Reminder dismiss", &client, reminder_dismiss_sub, &state, reminder::handle_dismiss),
        spawn_handler("Admin overview", &client, admin_overview_sub, &state, admin::handle_overview),
    ]);

    info!("{} handlers running", tasks.len());

    let (names, handles): (Vec<&'static str>, Vec<JoinHandle<Result<()>>>) = tasks.into_iter().unzip();
    let (result, index, _remaining) = futures::future::select_all(handles).await;
    error!("{} handler finished: {:?}", names[index], result);

    Ok(())
}
