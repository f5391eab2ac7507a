//! Pagination primitives shared by every `list`/`get*` command (spec
//! 4.7's page-size bounds, enforced here against `ForumConfig`).

use forum_core::SortOrder;
use serde::Serialize;

#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: u32,
    pub sort: SortOrder,
}

impl PageRequest {
    /// Clamp the requested page size against the configured bounds for
    /// `entity_kind`, falling back to the default size when unset.
    pub fn clamped(self, config: &forum_core::ForumConfig, entity_kind: &str) -> Self {
        let Some(limit) = config.page_size(entity_kind) else { return self };
        let page_size = if self.page_size == 0 {
            limit.default_size
        } else {
            self.page_size.min(limit.max_size)
        };
        Self { page_size, ..self }
    }

    pub fn offset(self) -> usize {
        self.page * self.page_size as usize
    }

    pub fn limit(self) -> usize {
        self.page_size as usize
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: u32,
    pub total_count: usize,
}
