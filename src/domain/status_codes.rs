//! Classification of gateway status codes.
//!
//! Every predicate on responses and push notifications goes through this table.
//! Outcome category and permanence are two independent axes.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Successful,
    Pending,
    Failed,
    Cancelled,
    Rejected,
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCategory::Successful => "successful",
            StatusCategory::Pending => "pending",
            StatusCategory::Failed => "failed",
            StatusCategory::Cancelled => "cancelled",
            StatusCategory::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permanence {
    Permanent,
    Temporary,
}

struct StatusEntry {
    code: u16,
    category: StatusCategory,
    permanence: Permanence,
    description: &'static str,
}

const fn entry(
    code: u16,
    category: StatusCategory,
    permanence: Permanence,
    description: &'static str,
) -> StatusEntry {
    StatusEntry {
        code,
        category,
        permanence,
        description,
    }
}

use Permanence::{Permanent, Temporary};
use StatusCategory::{Cancelled, Failed, Pending, Rejected, Successful};

static STATUS_TABLE: &[StatusEntry] = &[
    entry(190, Successful, Permanent, "Success"),
    entry(490, Failed, Permanent, "Failed"),
    entry(491, Failed, Permanent, "Validation failure"),
    entry(492, Failed, Permanent, "Technical failure"),
    entry(690, Rejected, Permanent, "Rejected"),
    entry(790, Pending, Temporary, "Pending input"),
    entry(791, Pending, Temporary, "Pending processing"),
    entry(792, Pending, Temporary, "Awaiting consumer"),
    entry(793, Pending, Temporary, "On hold"),
    entry(890, Cancelled, Permanent, "Cancelled by consumer"),
    entry(891, Cancelled, Permanent, "Cancelled by merchant"),
];

fn lookup(code: u16) -> Option<&'static StatusEntry> {
    STATUS_TABLE.iter().find(|entry| entry.code == code)
}

/// Unknown codes are never treated as anything but a failure.
pub fn classify(code: u16) -> StatusCategory {
    lookup(code).map(|entry| entry.category).unwrap_or(Failed)
}

/// `None` for codes outside the table: they are neither permanent nor temporary.
pub fn permanence(code: u16) -> Option<Permanence> {
    lookup(code).map(|entry| entry.permanence)
}

pub fn describe(code: u16) -> Option<&'static str> {
    lookup(code).map(|entry| entry.description)
}

pub fn is_known(code: u16) -> bool {
    lookup(code).is_some()
}

pub fn is_successful(code: u16) -> bool {
    classify(code) == Successful
}

pub fn is_pending(code: u16) -> bool {
    classify(code) == Pending
}

pub fn is_failed(code: u16) -> bool {
    classify(code) == Failed
}

pub fn is_cancelled(code: u16) -> bool {
    classify(code) == Cancelled
}

pub fn is_rejected(code: u16) -> bool {
    classify(code) == Rejected
}

pub fn is_permanent_status(code: u16) -> bool {
    permanence(code) == Some(Permanent)
}

pub fn is_temporary_status(code: u16) -> bool {
    permanence(code) == Some(Temporary)
}
