//! Offset-based paging: the validated request and the result envelope.

use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::validate::ValidationErrors;

pub const MAX_PAGE_SIZE: u32 = 100;

// ─── PageRequest ─────────────────────────────────────────────────────────────

/// A 1-based page number and a page size in `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  page:      u32,
  page_size: u32,
}

impl PageRequest {
  /// Validate raw paging parameters as they arrive from a query string.
  pub fn new(page: i64, page_size: i64) -> Result<Self, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let page = u32::try_from(page).ok().filter(|p| *p >= 1);
    if page.is_none() {
      errors.add("page", "Page must be greater than or equal to 1");
    }
    let page_size = u32::try_from(page_size)
      .ok()
      .filter(|s| (1..=MAX_PAGE_SIZE).contains(s));
    if page_size.is_none() {
      errors.add(
        "pageSize",
        format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
      );
    }
    match (page, page_size) {
      (Some(page), Some(page_size)) => Ok(Self { page, page_size }),
      _ => Err(errors),
    }
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn page_size(&self) -> u32 { self.page_size }

  /// Number of matching rows to skip before this page starts.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }
}

impl Default for PageRequest {
  fn default() -> Self { Self { page: 1, page_size: 10 } }
}

// ─── PagedResult ─────────────────────────────────────────────────────────────

/// One page of an ordered result set.
///
/// `total_count` is the size of the whole filtered set, not of this page.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
  pub items:       Vec<T>,
  pub total_count: u64,
  pub page:        u32,
  pub page_size:   u32,
}

impl<T> PagedResult<T> {
  pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
    Self {
      items,
      total_count,
      page: request.page(),
      page_size: request.page_size(),
    }
  }

  pub fn total_pages(&self) -> u64 {
    self.total_count.div_ceil(u64::from(self.page_size.max(1)))
  }

  pub fn has_next_page(&self) -> bool {
    u64::from(self.page) < self.total_pages()
  }

  pub fn has_previous_page(&self) -> bool { self.page > 1 }

  /// Convert the items while keeping the paging metadata.
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
    PagedResult {
      items:       self.items.into_iter().map(f).collect(),
      total_count: self.total_count,
      page:        self.page,
      page_size:   self.page_size,
    }
  }
}

// The derived fields are part of the wire format, so serialisation is manual.
impl<T: Serialize> Serialize for PagedResult<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("PagedResult", 7)?;
    s.serialize_field("items", &self.items)?;
    s.serialize_field("totalCount", &self.total_count)?;
    s.serialize_field("page", &self.page)?;
    s.serialize_field("pageSize", &self.page_size)?;
    s.serialize_field("totalPages", &self.total_pages())?;
    s.serialize_field("hasNextPage", &self.has_next_page())?;
    s.serialize_field("hasPreviousPage", &self.has_previous_page())?;
    s.end()
  }
}
