//! End-to-end file import: read, map, extract, track, upsert

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{info, warn};

use crate::db::{ImportBatchFilter, ImportBatchStore, Store};
use crate::error::CrmError;
use crate::services::bulk_upsert::upsert_leads;
use crate::services::header_mapper::map_headers;
use crate::services::import_tracker::create_import_batch;
use crate::services::row_extractor::extract_leads;
use crate::services::spreadsheet::read_spreadsheet;
use crate::tenancy::TenantContext;
use crate::types::{CreateImportBatchRequest, ImportFileResponse, LeadInput};

/// Decode the base64 body of an `import.file` request
pub fn decode_content(content: &str) -> Result<Vec<u8>, CrmError> {
    let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| CrmError::InvalidRequest(format!("content is not valid base64: {}", e)))
}

/// Import one file into the caller's tenant.
///
/// File-level problems (format, missing columns, nothing usable) fail before
/// anything is written. Once the batch exists, row failures only show up in
/// the report and the batch counts.
pub async fn import_file(
    store: &dyn Store,
    ctx: &TenantContext,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImportFileResponse, CrmError> {
    let sheet = read_spreadsheet(file_name, bytes)?;
    let mapping = map_headers(&sheet.headers);
    mapping.validate()?;
    let extraction = extract_leads(&sheet.rows, &mapping)?;

    if extraction.skipped > 0 {
        info!(
            "{}: skipped {} of {} rows without a name or a valid email",
            file_name, extraction.skipped, extraction.total_rows
        );
    }

    let record_count = i32::try_from(sheet.rows.len())
        .map_err(|_| CrmError::Validation("File has too many rows".to_string()))?;
    let batch = create_import_batch(store, ctx, &CreateImportBatchRequest::new(file_name, record_count)).await?;

    let leads: Vec<LeadInput> = extraction
        .leads
        .into_iter()
        .map(|lead| LeadInput {
            import_id: Some(batch.id),
            ..lead
        })
        .collect();
    let report = upsert_leads(store, ctx, leads).await?;

    let batch = match store
        .find_import_batch(&ImportBatchFilter::by_id_for_tenant(ctx.tenant_id, batch.id))
        .await
    {
        Ok(Some(reloaded)) => reloaded,
        Ok(None) => batch,
        Err(e) => {
            warn!("Could not reload import batch {}: {}", batch.id, e);
            batch
        }
    };

    Ok(ImportFileResponse {
        batch,
        skipped_rows: extraction.skipped as i32,
        report,
    })
}
