//! Merge engine: reconciles candidate masks against stored masks.
//!
//! Given the candidate masks a detector produced and the previously stored
//! masks for the same (channel, category, type, rationale) key, `merge`
//! groups them by time overlap and returns exactly the set of masks the
//! caller must persist. Masks untouched by any group are omitted and remain
//! as-is in storage, so a consumer diffing storage before and after sees no
//! spurious version bumps.
//!
//! The caller partitions masks by key before invoking merge and serializes
//! concurrent merges per key; both are contract, not runtime conditions.

use crate::mask::{QcMask, QcMaskVersionReference};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use tracing::debug;
use wqc_common::{CreationInfoId, Error, MaskId, Result};

/// Merge `new_masks` with `existing_masks` on one channel/category key.
///
/// `threshold` is the maximum gap between two masks' spans for them to be
/// treated as one contiguous quality issue. It is **non-inclusive**: with a
/// threshold of 1s, masks separated by exactly 1s do not merge.
///
/// Grouping is a single sweep over the masks sorted by (start, end); two or
/// more overlapping masks collapse as follows:
///
/// - no existing mask in the group: one brand-new mask spanning the group
/// - exactly one existing mask: a new version of it with the extended span
///   (skipped when the span is unchanged)
/// - two or more existing masks: one brand-new mask carrying them as parent
///   references, and a terminal rejected version appended to each of them
///
/// Groups containing only existing masks are left untouched. Returns the
/// masks created, updated, or rejected by this operation.
///
/// # Errors
///
/// [`Error::EmptyNewMasks`] when `new_masks` is empty;
/// [`Error::RejectedMask`] when any input mask is already rejected;
/// [`Error::Validation`] when the inputs disagree on category, type,
/// rationale, or channel.
pub fn merge(
    new_masks: Vec<QcMask>,
    existing_masks: Vec<QcMask>,
    threshold: Duration,
    creation_info_id: CreationInfoId,
) -> Result<Vec<QcMask>> {
    if new_masks.is_empty() {
        return Err(Error::EmptyNewMasks);
    }

    let new_ids: HashSet<MaskId> = new_masks.iter().map(QcMask::id).collect();
    let new_count = new_masks.len();
    let existing_count = existing_masks.len();

    let mut all: Vec<QcMask> = new_masks;
    all.extend(existing_masks);
    verify_masks(&all)?;

    // Safe after verification: every non-rejected version carries a span.
    let mut keyed: Vec<(SortKey, QcMask)> = all
        .into_iter()
        .map(|mask| {
            let span = mask.current_version().span().ok_or_else(|| {
                Error::IncompleteSpan(format!("mask {} has no span", mask.id()))
            })?;
            Ok((span, mask))
        })
        .collect::<Result<_>>()?;
    keyed.sort_by_key(|(span, _)| *span);

    let groups = group_by_overlap(keyed, threshold);
    debug!(
        new = new_count,
        existing = existing_count,
        groups = groups.len(),
        "grouped masks by time overlap"
    );

    let mut persist = Vec::new();
    for group in groups {
        // Groups of only pre-existing masks stay untouched in storage.
        if !group.iter().any(|m| new_ids.contains(&m.id())) {
            continue;
        }
        persist.extend(merge_group(group, &new_ids, creation_info_id)?);
    }
    debug!(persist = persist.len(), "merge complete");
    Ok(persist)
}

type SortKey = (DateTime<Utc>, DateTime<Utc>);

/// All masks must agree on category, type, and rationale, apply to the same
/// channel, and none may already be rejected.
fn verify_masks(masks: &[QcMask]) -> Result<()> {
    let Some(first) = masks.first() else {
        return Ok(());
    };

    for mask in masks {
        if mask.is_rejected() {
            return Err(Error::RejectedMask {
                mask_id: mask.id().to_string(),
            });
        }
    }

    let head = first.current_version();
    let qc_type = head
        .qc_type
        .ok_or_else(|| Error::Validation("cannot merge masks with no type".to_string()))?;

    for mask in masks {
        let v = mask.current_version();
        if v.category != head.category || v.qc_type != Some(qc_type) || v.rationale != head.rationale
        {
            return Err(Error::Validation(
                "merge requires all masks to have the same category, type and rationale"
                    .to_string(),
            ));
        }
        if mask.channel_id() != first.channel_id() {
            return Err(Error::Validation(
                "merge requires all masks to apply to the same channel".to_string(),
            ));
        }
    }
    Ok(())
}

/// Sweep the time-sorted masks once, cutting a group boundary wherever a
/// mask does not overlap its predecessor within the threshold.
fn group_by_overlap(keyed: Vec<(SortKey, QcMask)>, threshold: Duration) -> Vec<Vec<QcMask>> {
    let mut groups: Vec<Vec<QcMask>> = Vec::new();
    let mut current: Vec<QcMask> = Vec::new();
    let mut previous_end: Option<DateTime<Utc>> = None;

    for ((start, end), mask) in keyed {
        // Non-inclusive: a gap of exactly `threshold` starts a new group.
        let overlaps = previous_end.is_some_and(|prev_end| start < prev_end + threshold);
        if !overlaps && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        current.push(mask);
        previous_end = Some(end);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Collapse one overlap group. Assumes the group holds at least one new mask.
fn merge_group(
    group: Vec<QcMask>,
    new_ids: &HashSet<MaskId>,
    creation_info_id: CreationInfoId,
) -> Result<Vec<QcMask>> {
    // A lone member is necessarily new: pass it through unchanged.
    if group.len() == 1 {
        return Ok(group);
    }

    let start = group
        .iter()
        .filter_map(|m| m.current_version().start)
        .min()
        .ok_or_else(|| Error::IncompleteSpan("no valid start time in merge group".to_string()))?;
    let end = group
        .iter()
        .filter_map(|m| m.current_version().end)
        .max()
        .ok_or_else(|| Error::IncompleteSpan("no valid end time in merge group".to_string()))?;

    let head = group[0].current_version();
    let category = head.category;
    let qc_type = head
        .qc_type
        .ok_or_else(|| Error::Validation("merge group has no valid type".to_string()))?;
    let rationale = head.rationale.clone();
    let channel_id = group[0].channel_id();

    let (mut existing, _new): (Vec<QcMask>, Vec<QcMask>) =
        group.into_iter().partition(|m| !new_ids.contains(&m.id()));

    match existing.len() {
        // Only new masks: collapse to a single brand-new mask over the span.
        0 => Ok(vec![QcMask::create(
            channel_id,
            Vec::new(),
            Vec::new(),
            category,
            qc_type,
            rationale,
            start,
            end,
            creation_info_id,
        )?]),

        // One existing mask: extend it in place with a new version, unless
        // the span is unchanged (no redundant version churn).
        1 => {
            let mut mask = existing.remove(0);
            if mask.current_version().span() != Some((start, end)) {
                mask.add_version(
                    Vec::new(),
                    category,
                    qc_type,
                    rationale,
                    start,
                    end,
                    creation_info_id,
                )?;
            }
            Ok(vec![mask])
        }

        // Multiple existing masks: subsume them under one brand-new mask and
        // reject each of them terminally, citing the new mask.
        _ => {
            let parents = existing
                .iter()
                .map(|m| QcMaskVersionReference::from(m.id(), m.current_version().version))
                .collect();
            let merged = QcMask::create(
                channel_id,
                parents,
                Vec::new(),
                category,
                qc_type,
                rationale,
                start,
                end,
                creation_info_id,
            )?;

            let rejection = format!("Merged to form QcMask with ID: {}", merged.id());
            let mut out = vec![merged];
            for mask in &mut existing {
                mask.reject(rejection.clone(), Vec::new(), creation_info_id)?;
            }
            out.extend(existing);
            Ok(out)
        }
    }
}
