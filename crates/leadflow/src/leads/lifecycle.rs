//! Lead lifecycle bookkeeping.
//!
//! Operators may move a lead to any of the five statuses at any time;
//! there is no forced sequential order. What the state machine does
//! guarantee is the contact bookkeeping: entering any non-`NEW` status
//! sets the first-contact pair exactly once and refreshes the
//! last-contacted timestamp on every such transition.

use chrono::{DateTime, Utc};

use super::domain::{ActivityNote, LeadPatch, LeadRecord, LeadStatus};

/// Apply a status transition with contact bookkeeping.
pub fn transition_status(
    record: &mut LeadRecord,
    target: LeadStatus,
    actor: &str,
    now: DateTime<Utc>,
) {
    record.status = target;
    if target != LeadStatus::New {
        touch_contact(record, actor, now);
    }
}

/// Convenience transition used by the console's "contacted" action:
/// a `NEW` lead advances to `IN_PROGRESS`, anything else keeps its
/// status; contact bookkeeping is refreshed either way.
pub fn mark_contacted(record: &mut LeadRecord, actor: &str, now: DateTime<Utc>) {
    if record.status == LeadStatus::New {
        record.status = LeadStatus::InProgress;
    }
    touch_contact(record, actor, now);
}

/// Prepend an activity note. Notes count as contact but never change
/// status on their own.
pub fn append_note(record: &mut LeadRecord, author: &str, body: &str, now: DateTime<Utc>) {
    record.activity.insert(
        0,
        ActivityNote {
            author: author.to_string(),
            body: body.to_string(),
            at: now,
        },
    );
    record.last_contacted_at = Some(now);
}

/// Apply a full operator patch. Must only be called from inside the
/// store's serialization point so concurrent patches cannot interleave.
pub fn apply_patch(record: &mut LeadRecord, patch: &LeadPatch, actor: &str, now: DateTime<Utc>) {
    if let Some(status) = patch.status {
        transition_status(record, status, actor, now);
    }
    if let Some(priority) = patch.priority {
        // Manual override wins; the score is deliberately not recomputed.
        record.priority = priority;
    }
    if let Some(score) = patch.score {
        record.score = score.min(100);
    }
    if let Some(assignee) = &patch.assigned_to {
        record.assigned_to = Some(assignee.clone());
    }
    if let Some(follow_up) = patch.next_follow_up_at {
        record.next_follow_up_at = Some(follow_up);
    }
    if patch.mark_contacted {
        mark_contacted(record, actor, now);
    }
    if let Some(body) = patch.note.as_deref() {
        if !body.trim().is_empty() {
            append_note(record, actor, body, now);
        }
    }
    record.updated_at = now;
}

fn touch_contact(record: &mut LeadRecord, actor: &str, now: DateTime<Utc>) {
    if record.first_contact_at.is_none() {
        record.first_contact_at = Some(now);
        record.first_contact_by = Some(actor.to_string());
    }
    record.last_contacted_at = Some(now);
}
