//! Paging and sorting for product listings.
//!
//! [`Page`] serializes with the field names used by Spring Data pages so
//! existing clients keep working.

use std::str::FromStr;

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRequestError {
    #[error("size must be between 1 and {max}, got {0}", max = PageRequest::MAX_SIZE)]
    InvalidSize(u64),

    #[error("page {0} is out of range for size {1}")]
    InvalidPage(u64, u64),

    #[error("unknown sort field '{0}', expected one of id, name, price, date")]
    UnknownSortField(String),

    #[error("unknown sort direction '{0}', expected asc or desc")]
    UnknownDirection(String),
}

/// Product attributes a listing can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub direction: Direction,
}

impl Sort {
    pub fn new(field: SortField, direction: Direction) -> Self {
        Self { field, direction }
    }
}

/// Parses `field` or `field,direction`.
impl FromStr for Sort {
    type Err = PageRequestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match raw.split_once(',') {
            Some((field, direction)) => (field.trim(), Some(direction.trim())),
            None => (raw.trim(), None),
        };

        let field = field
            .parse::<SortField>()
            .map_err(|_| PageRequestError::UnknownSortField(field.to_string()))?;
        let direction = match direction {
            Some(direction) => direction
                .parse::<Direction>()
                .map_err(|_| PageRequestError::UnknownDirection(direction.to_string()))?,
            None => Direction::Asc,
        };

        Ok(Self { field, direction })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub const DEFAULT_SIZE: u64 = 20;
    pub const MAX_SIZE: u64 = 100;

    /// Largest row offset a request may reach; OFFSET is a signed bigint.
    const MAX_OFFSET: u64 = i64::MAX as u64;

    pub fn new(page: u64, size: u64) -> Result<Self, PageRequestError> {
        if size == 0 || size > Self::MAX_SIZE {
            return Err(PageRequestError::InvalidSize(size));
        }
        match page.checked_mul(size) {
            Some(offset) if offset <= Self::MAX_OFFSET => {}
            _ => return Err(PageRequestError::InvalidPage(page, size)),
        }
        Ok(Self {
            page,
            size,
            sort: Sort::default(),
        })
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: Self::DEFAULT_SIZE,
            sort: Sort::default(),
        }
    }
}

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    /// Zero-based index of this page
    pub number: u64,
    pub size: u64,
    pub number_of_elements: u64,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let total_pages = total_elements.div_ceil(request.size.max(1));
        Self {
            total_elements,
            total_pages,
            number: request.page,
            size: request.size,
            number_of_elements: u64::try_from(content.len()).unwrap_or(u64::MAX),
            first: request.page == 0,
            last: request.page.saturating_add(1) >= total_pages,
            empty: content.is_empty(),
            content,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
