//! Reminder database queries

use sqlx::PgPool;

use crate::db::filters::ReminderFilter;
use crate::error::StoreResult;
use crate::types::{Page, Reminder};

pub async fn insert_reminder(pool: &PgPool, reminder: &Reminder) -> StoreResult<Reminder> {
    let reminder = sqlx::query_as::<_, Reminder>(
        r#"
        INSERT INTO reminders (
            id, tenant_id, lead_id, user_id, title, notes,
            reminder_date, reminder_time, status,
            completed_at, snoozed_until, notification_sent,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING
            id, tenant_id, lead_id, user_id, title, notes,
            reminder_date, reminder_time, status,
            completed_at, snoozed_until, notification_sent,
            created_at, updated_at
        "#,
    )
    .bind(reminder.id)
    .bind(reminder.tenant_id)
    .bind(reminder.lead_id)
    .bind(reminder.user_id)
    .bind(&reminder.title)
    .bind(&reminder.notes)
    .bind(reminder.reminder_date)
    .bind(reminder.reminder_time)
    .bind(reminder.status)
    .bind(reminder.completed_at)
    .bind(reminder.snoozed_until)
    .bind(reminder.notification_sent)
    .bind(reminder.created_at)
    .bind(reminder.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(reminder)
}

pub async fn find_reminder(pool: &PgPool, filter: &ReminderFilter) -> StoreResult<Option<Reminder>> {
    let reminder = sqlx::query_as::<_, Reminder>(
        r#"
        SELECT
            id, tenant_id, lead_id, user_id, title, notes,
            reminder_date, reminder_time, status,
            completed_at, snoozed_until, notification_sent,
            created_at, updated_at
        FROM reminders
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR lead_id = $3)
          AND ($4::reminder_status IS NULL OR status = $4)
        LIMIT 1
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.lead_id())
    .bind(filter.status())
    .fetch_optional(pool)
    .await?;

    Ok(reminder)
}

/// List reminders by due date
pub async fn list_reminders(
    pool: &PgPool,
    filter: &ReminderFilter,
    page: Page,
) -> StoreResult<(Vec<Reminder>, i64)> {
    let reminders = sqlx::query_as::<_, Reminder>(
        r#"
        SELECT
            id, tenant_id, lead_id, user_id, title, notes,
            reminder_date, reminder_time, status,
            completed_at, snoozed_until, notification_sent,
            created_at, updated_at
        FROM reminders
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR lead_id = $3)
          AND ($4::reminder_status IS NULL OR status = $4)
        ORDER BY reminder_date, reminder_time NULLS FIRST, id
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.lead_id())
    .bind(filter.status())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM reminders
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR lead_id = $3)
          AND ($4::reminder_status IS NULL OR status = $4)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.lead_id())
    .bind(filter.status())
    .fetch_one(pool)
    .await?;

    Ok((reminders, total.0))
}

/// Write back the mutable fields of a reminder
pub async fn update_reminder(pool: &PgPool, filter: &ReminderFilter, reminder: &Reminder) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reminders SET
            lead_id = $5,
            title = $6,
            notes = $7,
            reminder_date = $8,
            reminder_time = $9,
            status = $10,
            completed_at = $11,
            snoozed_until = $12,
            notification_sent = $13,
            updated_at = NOW()
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR lead_id = $3)
          AND ($4::reminder_status IS NULL OR status = $4)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.lead_id())
    .bind(filter.status())
    .bind(reminder.lead_id)
    .bind(&reminder.title)
    .bind(&reminder.notes)
    .bind(reminder.reminder_date)
    .bind(reminder.reminder_time)
    .bind(reminder.status)
    .bind(reminder.completed_at)
    .bind(reminder.snoozed_until)
    .bind(reminder.notification_sent)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
