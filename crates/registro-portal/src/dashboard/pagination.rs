use serde::Serialize;

use super::filter::{filter_records, FilterCriteria};
use crate::records::CandidateRecord;

/// Zero-based slice `[page * size, page * size + size)`; empty when out of range.
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    let Some(start) = page_index.checked_mul(page_size) else {
        return &[];
    };
    if page_size == 0 || start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// One rendered page plus the totals a table footer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_index: usize,
    pub page_size: usize,
    pub total: usize,
    pub page_count: usize,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_index: self.page_index,
            page_size: self.page_size,
            total: self.total,
            page_count: self.page_count,
        }
    }
}

/// Filter and paging state of the records table.
///
/// Any change to the criteria or the page size returns to the first page, so a shrinking
/// result set can never leave the table parked past its end.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    criteria: FilterCriteria,
    page_index: usize,
    page_size: usize,
}

impl DashboardView {
    pub fn new(page_size: usize) -> Self {
        Self {
            criteria: FilterCriteria::default(),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria != self.criteria {
            self.criteria = criteria;
            self.page_index = 0;
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page_index = 0;
    }

    pub fn go_to_page(&mut self, page_index: usize) {
        self.page_index = page_index;
    }

    pub fn render<'a>(&self, records: &'a [CandidateRecord]) -> Page<&'a CandidateRecord> {
        let matching = filter_records(records, &self.criteria);
        let total = matching.len();
        let items = paginate(&matching, self.page_index, self.page_size).to_vec();

        Page {
            items,
            page_index: self.page_index,
            page_size: self.page_size,
            total,
            page_count: total.div_ceil(self.page_size),
        }
    }
}
