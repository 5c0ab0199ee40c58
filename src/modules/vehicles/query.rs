//! List query engine shared by every record source.
//!
//! Rows go through filter, then sort, then paginate. Sources only hand over raw
//! joined rows, so the in-memory and SQLite adapters cannot drift apart.

use std::cmp::Ordering;

use super::models::{
    ListParams, MakeId, ModelWithMake, PaginatedResponse, SortDirection, SortField, SortSpec,
};

/// Normalized model filter.
///
/// The search is trimmed and a blank one is dropped; matching is a Unicode
/// case-insensitive substring test against the model name or the joined make name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    needle: Option<String>,
    make_id: Option<MakeId>,
}

impl ModelFilter {
    pub fn new(search: Option<&str>, make_id: Option<MakeId>) -> Self {
        let needle = search
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase);
        Self { needle, make_id }
    }

    pub fn make_id(&self) -> Option<MakeId> {
        self.make_id
    }

    pub fn matches(&self, row: &ModelWithMake) -> bool {
        if let Some(make_id) = self.make_id {
            if row.make_id != make_id {
                return false;
            }
        }
        match &self.needle {
            Some(needle) => {
                row.name.to_lowercase().contains(needle.as_str())
                    || row.make.name.to_lowercase().contains(needle.as_str())
            }
            None => true,
        }
    }
}

/// A validated list request, ready to run over rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelQuery {
    pub filter: ModelFilter,
    pub sort: Option<SortSpec>,
    pub page: u32,
    pub limit: u32,
}

impl ModelQuery {
    /// Callers validate `params` first; `limit` must be non-zero.
    pub fn from_params(params: &ListParams) -> Self {
        let filter = params
            .filter
            .as_ref()
            .map(|f| ModelFilter::new(f.search.as_deref(), f.make_id))
            .unwrap_or_default();

        Self {
            filter,
            sort: params.sort,
            page: params.page.max(1),
            limit: params.limit.max(1),
        }
    }

    pub fn run(&self, rows: Vec<ModelWithMake>) -> PaginatedResponse<ModelWithMake> {
        let mut matched: Vec<ModelWithMake> =
            rows.into_iter().filter(|row| self.filter.matches(row)).collect();

        sort_models(&mut matched, self.sort);

        paginate(matched, self.page, self.limit)
    }
}

/// Stable sort; without a spec rows are ordered by ascending id.
pub fn sort_models(rows: &mut [ModelWithMake], sort: Option<SortSpec>) {
    let spec = sort.unwrap_or(SortSpec::new(SortField::Id, SortDirection::Asc));

    rows.sort_by(|a, b| {
        let ordering = match spec.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => collate(&a.name, &b.name),
            SortField::Abrv => collate(&a.abrv, &b.abrv),
            SortField::MakeName => collate(&a.make.name, &b.make.name),
        };
        match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Human ordering for display strings: case-insensitive first, exact text breaks ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Slice the 1-based page `[(page-1)*limit, page*limit)`; `total` counts every row.
pub fn paginate<T>(rows: Vec<T>, page: u32, limit: u32) -> PaginatedResponse<T> {
    let limit = limit.max(1);
    let page = page.max(1);
    let total = rows.len() as u64;
    let start = (page as usize - 1).saturating_mul(limit as usize);

    let data: Vec<T> = rows.into_iter().skip(start).take(limit as usize).collect();

    PaginatedResponse {
        data,
        total,
        page,
        limit,
        total_pages: total_pages(total, limit),
    }
}

pub fn total_pages(total: u64, limit: u32) -> u32 {
    total.div_ceil(u64::from(limit.max(1))) as u32
}
