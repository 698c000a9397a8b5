//! Immutable mask version snapshots and parent provenance references.

use super::types::{QcMaskCategory, QcMaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wqc_common::{CreationInfoId, MaskId, SegmentId};

/// Value reference from a merged mask back to one version of a mask it
/// subsumed. Stored as (id, version number), never as a live handle, so the
/// aggregate graph stays cycle-free while the audit trail stays complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QcMaskVersionReference {
    pub mask_id: MaskId,
    pub version: u32,
}

impl QcMaskVersionReference {
    pub fn from(mask_id: MaskId, version: u32) -> Self {
        QcMaskVersionReference { mask_id, version }
    }
}

/// One immutable snapshot in a mask's history.
///
/// A non-rejected version always carries a type and both endpoints; a
/// rejected version carries neither (rejection is a terminal state, not an
/// annotation over a time span). Construction is restricted to the aggregate
/// in the parent module, which is what upholds those pairings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMaskVersion {
    /// Version number within the owning mask; starts at 1, increments by 1.
    pub version: u32,
    pub category: QcMaskCategory,
    /// Absent only on rejected versions.
    pub qc_type: Option<QcMaskType>,
    pub rationale: String,
    /// Absent only on rejected versions.
    pub start: Option<DateTime<Utc>>,
    /// Absent only on rejected versions.
    pub end: Option<DateTime<Utc>>,
    pub rejected: bool,
    /// Prior masks subsumed into this version; non-empty only when the merge
    /// engine collapsed two or more existing masks.
    pub parents: Vec<QcMaskVersionReference>,
    /// Channel segments contributing to this version.
    pub segment_ids: Vec<SegmentId>,
    pub creation_info_id: CreationInfoId,
}

impl QcMaskVersion {
    pub(super) fn active(
        version: u32,
        category: QcMaskCategory,
        qc_type: QcMaskType,
        rationale: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        parents: Vec<QcMaskVersionReference>,
        segment_ids: Vec<SegmentId>,
        creation_info_id: CreationInfoId,
    ) -> Self {
        QcMaskVersion {
            version,
            category,
            qc_type: Some(qc_type),
            rationale,
            start: Some(start),
            end: Some(end),
            rejected: false,
            parents,
            segment_ids,
            creation_info_id,
        }
    }

    pub(super) fn rejected(
        version: u32,
        rationale: String,
        segment_ids: Vec<SegmentId>,
        creation_info_id: CreationInfoId,
    ) -> Self {
        QcMaskVersion {
            version,
            category: QcMaskCategory::Rejected,
            qc_type: None,
            rationale,
            start: None,
            end: None,
            rejected: true,
            parents: Vec::new(),
            segment_ids,
            creation_info_id,
        }
    }

    /// Span as a (start, end) pair; `None` for rejected versions.
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
