//! State behind a list screen: the last fetched list, the search box, the
//! current page, and any notice to show.

use sics_core::Record;

use crate::Error;

pub const DEFAULT_PAGE_SIZE: usize = 10;

// ─── Notice ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
  Info,
  Error,
}

/// A one-line message for the user, e.g. after a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Info, message: message.into() }
  }
}

// ─── ListPage ─────────────────────────────────────────────────────────────────

/// Client-side list state for one collection.
///
/// The list is replaced wholesale on every load, so the last completed fetch
/// wins. Filtering and pagination run over the cached list without touching
/// the network.
#[derive(Debug, Clone)]
pub struct ListPage<R> {
  items:     Vec<R>,
  query:     String,
  page_size: usize,
  notice:    Option<Notice>,
}

impl<R: Record> ListPage<R> {
  pub fn new(page_size: usize) -> Self {
    Self {
      items:     Vec::new(),
      query:     String::new(),
      page_size: page_size.max(1),
      notice:    None,
    }
  }

  /// Replace the list with a fetch result. A failure empties the list and
  /// leaves a notice instead.
  pub fn load(&mut self, result: Result<Vec<R>, Error>) {
    match result {
      Ok(items) => {
        tracing::debug!(kind = R::KIND.module(), count = items.len(), "list loaded");
        self.items = items;
        self.notice = None;
      }
      Err(e) => {
        tracing::warn!(kind = R::KIND.module(), error = %e, "list load failed");
        self.items.clear();
        self.notice = Some(Notice::error(e.user_message()));
      }
    }
  }

  pub fn items(&self) -> &[R] { &self.items }

  pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }

  pub fn set_notice(&mut self, notice: Notice) { self.notice = Some(notice); }

  pub fn query(&self) -> &str { &self.query }

  pub fn set_query(&mut self, query: impl Into<String>) {
    self.query = query.into();
  }

  /// Records whose searchable text contains the query, ignoring case.
  pub fn filtered(&self) -> Vec<&R> {
    let needle = self.query.trim().to_lowercase();
    if needle.is_empty() {
      return self.items.iter().collect();
    }
    self
      .items
      .iter()
      .filter(|r| r.haystack().iter().any(|h| h.to_lowercase().contains(&needle)))
      .collect()
  }

  /// Number of pages in the filtered view; an empty view still has one page.
  pub fn page_count(&self) -> usize {
    self.filtered().len().div_ceil(self.page_size).max(1)
  }

  /// Zero-based page of the filtered view. Past the end is empty.
  pub fn page(&self, index: usize) -> Vec<&R> {
    self
      .filtered()
      .into_iter()
      .skip(index.saturating_mul(self.page_size))
      .take(self.page_size)
      .collect()
  }
}

impl<R: Record> Default for ListPage<R> {
  fn default() -> Self { Self::new(DEFAULT_PAGE_SIZE) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use sics_core::records::Workplace;

  use super::*;

  fn workplaces(n: usize) -> Vec<Workplace> {
    (0..n)
      .map(|i| {
        Workplace::from_raw(&json!({ "id": i, "nombre": format!("Local {i}"), "giro": "Bar" }))
      })
      .collect()
  }

  #[test]
  fn load_replaces_previous_list() {
    let mut page = ListPage::new(10);
    page.load(Ok(workplaces(5)));
    page.load(Ok(workplaces(2)));
    assert_eq!(page.items().len(), 2);
    assert!(page.notice().is_none());
  }

  #[test]
  fn failed_load_empties_list_and_leaves_notice() {
    let mut page = ListPage::new(10);
    page.load(Ok(workplaces(3)));
    page.load(Err(Error::Status { status: 500, message: "Error interno".into() }));
    assert!(page.items().is_empty());
    assert_eq!(page.notice(), Some(&Notice::error("Error interno")));
  }

  #[test]
  fn query_filters_case_insensitively() {
    let mut page = ListPage::new(10);
    let mut items = workplaces(3);
    items[1].nombre = "Cantina El FARO".into();
    page.load(Ok(items));

    page.set_query("faro");
    let hits = page.filtered();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id(), "1");

    page.set_query("   ");
    assert_eq!(page.filtered().len(), 3);
  }

  #[test]
  fn pagination_over_filtered_view() {
    let mut page = ListPage::new(4);
    page.load(Ok(workplaces(10)));
    assert_eq!(page.page_count(), 3);
    assert_eq!(page.page(0).len(), 4);
    assert_eq!(page.page(2).len(), 2);
    assert_eq!(page.page(2)[0].id(), "8");
    assert!(page.page(3).is_empty());

    page.set_query("Local 1");
    assert_eq!(page.page_count(), 1);
  }

  #[test]
  fn empty_list_has_one_page() {
    let page: ListPage<Workplace> = ListPage::default();
    assert_eq!(page.page_count(), 1);
    assert!(page.page(0).is_empty());
  }

  #[test]
  fn zero_page_size_is_clamped() {
    let mut page = ListPage::new(0);
    page.load(Ok(workplaces(2)));
    assert_eq!(page.page_count(), 2);
  }
}
