//! Operation paginator
//!
//! Pages through the merged sequence of correlated and inferred operation
//! groups. On the fast path the correlated side is ranked with a cheap
//! aggregate and only the groups inside the requested page window are
//! resolved to member rows. A free-text term forces the degraded search
//! path, which groups a capped fetch entirely in memory.

use tracing::debug;

use super::grouping::{self, OperationGroup};
use super::models::{AuditFilter, SEARCH_FETCH_CAP, UNCORRELATED_FETCH_CAP};
use super::store::{AuditStore, StoreResult};
use super::summary::{self, OperationSummary};

/// One page of operation summaries with explicit paging metadata
#[derive(Debug, Clone, serde::Serialize)]
pub struct OperationPage {
    pub items: Vec<OperationSummary>,
    pub page: i64,
    pub size: i64,
    /// Total group count. On the fast path this is correlated-group count
    /// plus inferred groups within the uncorrelated fetch cap, a documented
    /// approximation.
    pub total_elements: i64,
    pub total_pages: i64,
    pub first: bool,
    pub last: bool,
}

impl OperationPage {
    fn assemble(mut groups: Vec<OperationGroup>, page: i64, size: i64, total: i64) -> Self {
        // Merge order from the two sources is reconciled here: the returned
        // page is always stable-sorted by representative timestamp.
        groups.sort_by(|a, b| {
            b.representative()
                .created_at
                .cmp(&a.representative().created_at)
        });

        let total_pages = if total == 0 { 0 } else { (total + size - 1) / size };

        Self {
            items: groups.into_iter().map(summary::summarize).collect(),
            page,
            size,
            total_elements: total,
            total_pages,
            first: page <= 1,
            last: page >= total_pages,
        }
    }
}

/// List one page of operations.
///
/// `page` is 1-indexed; both `page` and `size` are clamped to at least 1.
pub async fn list_operations(
    store: &dyn AuditStore,
    filter: &AuditFilter,
    page: i64,
    size: i64,
) -> StoreResult<OperationPage> {
    let page = page.max(1);
    let size = size.max(1);

    if filter.free_text.is_some() {
        search_page(store, filter, page, size).await
    } else {
        fast_page(store, filter, page, size).await
    }
}

/// Fast path: cheap correlated ranking plus capped uncorrelated grouping.
///
/// Correlated groups occupy global indices `[0, C)`, inferred groups
/// `[C, C + U)`. Member rows are fetched only for correlation ids whose rank
/// overlaps the requested window.
async fn fast_page(
    store: &dyn AuditStore,
    filter: &AuditFilter,
    page: i64,
    size: i64,
) -> StoreResult<OperationPage> {
    let correlated_count = store.count_correlation_groups(filter).await?;

    let uncorrelated = store
        .fetch_uncorrelated(filter, UNCORRELATED_FETCH_CAP)
        .await?;
    let inferred_groups = grouping::group_uncorrelated(uncorrelated);
    let inferred_count = inferred_groups.len() as i64;

    let total = correlated_count + inferred_count;
    let offset = (page - 1) * size;
    let end = offset + size;

    let mut groups: Vec<OperationGroup> = Vec::new();

    // The ranking itself is only needed when the window overlaps the
    // correlated region; a count suffices otherwise.
    let corr_start = offset.min(correlated_count) as usize;
    let corr_end = end.min(correlated_count) as usize;
    if corr_start < corr_end {
        let ranked = store.ranked_correlation_groups(filter).await?;
        let keys: Vec<String> = ranked
            .iter()
            .skip(corr_start)
            .take(corr_end - corr_start)
            .map(|g| g.correlation_id.clone())
            .collect();
        let members = store.fetch_by_correlation_ids(&keys).await?;

        for key in keys {
            let records: Vec<_> = members
                .iter()
                .filter(|r| r.correlation_id.as_deref() == Some(key.as_str()))
                .cloned()
                .collect();
            // An id can vanish between the ranking and the fan-out only if a
            // purge raced us; skip rather than build an empty group.
            if !records.is_empty() {
                groups.push(OperationGroup::correlated(key, records));
            }
        }
    }

    // Window overlap with the inferred groups, which start at index C.
    let inf_start = (offset - correlated_count).clamp(0, inferred_count) as usize;
    let inf_end = (end - correlated_count).clamp(0, inferred_count) as usize;
    groups.extend(inferred_groups.into_iter().skip(inf_start).take(inf_end - inf_start));

    debug!(
        page,
        size,
        correlated = correlated_count,
        inferred = inferred_count,
        returned = groups.len(),
        "Listed operations (fast path)"
    );

    Ok(OperationPage::assemble(groups, page, size, total))
}

/// Search path: group the whole capped fetch in memory and slice it.
///
/// The filter is applied to member records before grouping here, while the
/// fast path selects whole groups and keeps all their members. A group
/// spanning several entity types can therefore report different counts and
/// entity type sets depending on which path served it.
async fn search_page(
    store: &dyn AuditStore,
    filter: &AuditFilter,
    page: i64,
    size: i64,
) -> StoreResult<OperationPage> {
    let records = store.fetch_matching(filter, SEARCH_FETCH_CAP).await?;
    let all_groups = grouping::group_mixed(records);
    let total = all_groups.len() as i64;

    let offset = ((page - 1) * size) as usize;
    let groups: Vec<OperationGroup> = all_groups
        .into_iter()
        .skip(offset)
        .take(size as usize)
        .collect();

    debug!(
        page,
        size,
        total,
        returned = groups.len(),
        "Listed operations (search path)"
    );

    Ok(OperationPage::assemble(groups, page, size, total))
}
