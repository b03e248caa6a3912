//! Reminder types and their state machine

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ReminderError;
use crate::tenancy::TenantId;
use super::messages::ListRequest;

/// Reminder status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "reminder_status", rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Completed,
    Snoozed,
    Dismissed,
}

impl ReminderStatus {
    /// Completed and dismissed reminders only come back through a date/time edit.
    pub fn is_open(&self) -> bool {
        matches!(self, ReminderStatus::Pending | ReminderStatus::Snoozed)
    }
}

/// Follow-up reminder
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub lead_id: Option<Uuid>,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub reminder_date: NaiveDate,
    pub reminder_time: Option<NaiveTime>,
    pub status: ReminderStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reminder {
    fn ensure_open(&self, action: &'static str) -> Result<(), ReminderError> {
        if self.status.is_open() {
            Ok(())
        } else {
            Err(ReminderError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), ReminderError> {
        self.ensure_open("complete")?;
        self.status = ReminderStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn snooze(&mut self, until: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), ReminderError> {
        self.ensure_open("snooze")?;
        self.status = ReminderStatus::Snoozed;
        self.snoozed_until = Some(until);
        self.notification_sent = false;
        self.updated_at = now;
        Ok(())
    }

    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Result<(), ReminderError> {
        self.ensure_open("dismiss")?;
        self.status = ReminderStatus::Dismissed;
        self.updated_at = now;
        Ok(())
    }

    /// Apply an edit. Setting the date or time reopens the reminder from any
    /// state, even when the value is unchanged. Returns true when that happened.
    pub fn apply_edit(&mut self, edit: &ReminderEdit, now: DateTime<Utc>) -> bool {
        if let Some(ref title) = edit.title {
            self.title = title.clone();
        }
        if let Some(ref notes) = edit.notes {
            self.notes = Some(notes.clone());
        }

        if let Some(date) = edit.reminder_date {
            self.reminder_date = date;
        }
        if let Some(time) = edit.reminder_time {
            self.reminder_time = Some(time);
        }

        let reopened = edit.reminder_date.is_some() || edit.reminder_time.is_some();
        if reopened {
            self.status = ReminderStatus::Pending;
            self.notification_sent = false;
            self.completed_at = None;
            self.snoozed_until = None;
        }
        self.updated_at = now;
        reopened
    }
}

/// Editable reminder fields. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEdit {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub reminder_date: Option<NaiveDate>,
    pub reminder_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReminderRequest {
    pub lead_id: Option<Uuid>,
    pub title: String,
    pub notes: Option<String>,
    pub reminder_date: NaiveDate,
    pub reminder_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReminderRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub edit: ReminderEdit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderIdRequest {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnoozeReminderRequest {
    pub id: Uuid,
    pub until: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRemindersRequest {
    pub status: Option<ReminderStatus>,
    pub lead_id: Option<Uuid>,
    #[serde(flatten)]
    pub list: ListRequest,
}
