//! The QcMask aggregate: an append-only, versioned QC annotation.
//!
//! A mask owns its version history exclusively. Mutation is always a log
//! append — a new [`QcMaskVersion`] at the tail — never an in-place edit,
//! and the current version is simply the last element. Masks are never
//! physically deleted; rejection appends a terminal version instead.

mod types;
mod version;

pub use types::{QcMaskCategory, QcMaskType};
pub use version::{QcMaskVersion, QcMaskVersionReference};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wqc_common::{ChannelId, CreationInfoId, Error, MaskId, Result, SegmentId};

/// A quality-control annotation over a time span of one channel's waveform,
/// with full version history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMask {
    id: MaskId,
    channel_id: ChannelId,
    /// Invariant: non-empty; version numbers are 1..=len in order.
    versions: Vec<QcMaskVersion>,
}

impl QcMask {
    /// Create a new mask with a single non-rejected version 1.
    ///
    /// `parents` is non-empty only when the merge engine collapses two or
    /// more existing masks into this one. Fails if `end` precedes `start`
    /// or the type is not legal for the category.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        channel_id: ChannelId,
        parents: Vec<QcMaskVersionReference>,
        segment_ids: Vec<SegmentId>,
        category: QcMaskCategory,
        qc_type: QcMaskType,
        rationale: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        creation_info_id: CreationInfoId,
    ) -> Result<QcMask> {
        check_interval(start, end)?;
        check_category_type(category, qc_type)?;
        Ok(QcMask {
            id: MaskId::new(),
            channel_id,
            versions: vec![QcMaskVersion::active(
                1,
                category,
                qc_type,
                rationale.into(),
                start,
                end,
                parents,
                segment_ids,
                creation_info_id,
            )],
        })
    }

    /// Append the next version as the new current version.
    ///
    /// Fails if the mask is already rejected (rejection is terminal), if
    /// `end` precedes `start`, or if the type is not legal for the category.
    #[allow(clippy::too_many_arguments)]
    pub fn add_version(
        &mut self,
        segment_ids: Vec<SegmentId>,
        category: QcMaskCategory,
        qc_type: QcMaskType,
        rationale: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        creation_info_id: CreationInfoId,
    ) -> Result<()> {
        self.check_not_rejected()?;
        check_interval(start, end)?;
        check_category_type(category, qc_type)?;
        self.versions.push(QcMaskVersion::active(
            self.current_version().version + 1,
            category,
            qc_type,
            rationale.into(),
            start,
            end,
            Vec::new(),
            segment_ids,
            creation_info_id,
        ));
        Ok(())
    }

    /// Append a terminal rejected version. Fails if already rejected.
    pub fn reject(
        &mut self,
        rationale: impl Into<String>,
        segment_ids: Vec<SegmentId>,
        creation_info_id: CreationInfoId,
    ) -> Result<()> {
        self.check_not_rejected()?;
        self.versions.push(QcMaskVersion::rejected(
            self.current_version().version + 1,
            rationale.into(),
            segment_ids,
            creation_info_id,
        ));
        Ok(())
    }

    pub fn id(&self) -> MaskId {
        self.id
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// The highest-numbered version. Total order is by version number, not
    /// by time span.
    pub fn current_version(&self) -> &QcMaskVersion {
        self.versions
            .last()
            .expect("QcMask invariant violated: empty version history")
    }

    /// Full append-only history, oldest first.
    pub fn versions(&self) -> &[QcMaskVersion] {
        &self.versions
    }

    /// Whether the current version is the terminal rejected state.
    pub fn is_rejected(&self) -> bool {
        self.current_version().rejected
    }

    fn check_not_rejected(&self) -> Result<()> {
        if self.is_rejected() {
            return Err(Error::RejectedMask {
                mask_id: self.id.to_string(),
            });
        }
        Ok(())
    }
}

fn check_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end < start {
        return Err(Error::InvalidInterval {
            start: start.to_rfc3339(),
            end: end.to_rfc3339(),
        });
    }
    Ok(())
}

fn check_category_type(category: QcMaskCategory, qc_type: QcMaskType) -> Result<()> {
    if !category.allows(qc_type) {
        return Err(Error::CategoryTypeMismatch {
            category: category.to_string(),
            qc_type: qc_type.to_string(),
        });
    }
    Ok(())
}
