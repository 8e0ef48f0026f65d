//! Retention policy for sub-threshold groups

use contracts::BufferedItem;

/// Items split by the retention policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Older than the disposal age; to be deleted
    pub stale: Vec<BufferedItem>,
    /// Kept for the next cycle
    pub retained: Vec<BufferedItem>,
}

/// An item is stale iff its age is strictly greater than `disposal_age_days`
#[inline]
pub fn is_stale(item: &BufferedItem, current_day_index: u32, disposal_age_days: u32) -> bool {
    item.age_days(current_day_index) > disposal_age_days
}

/// Partition `items` into stale and retained, preserving order within each side
pub fn classify(
    items: Vec<BufferedItem>,
    current_day_index: u32,
    disposal_age_days: u32,
) -> Classified {
    let (stale, retained) = items
        .into_iter()
        .partition(|item| is_stale(item, current_day_index, disposal_age_days));
    Classified { stale, retained }
}
