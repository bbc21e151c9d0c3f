//! Page-number pagination.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// `?page=N` query parameters; pages are 1-based and `last` names the final
/// page. The value is kept raw so that garbage is a 404 like any other page
/// that does not exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A resolved slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageQuery {
    /// Resolve the requested page against `total_items`.
    ///
    /// The first page always exists, even for an empty result set; any other
    /// page outside the result set is a 404.
    pub fn window(&self, total_items: u64, page_size: u32) -> Result<PageWindow, AppError> {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(u64::from(page_size)).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some("last") => total_pages,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                AppError::not_found(format!(
                    "Invalid page ({raw}): That page number is not an integer"
                ))
            })?,
        };

        if page == 0 {
            return Err(AppError::not_found(
                "Invalid page (0): That page number is less than 1",
            ));
        }
        if page > total_pages {
            return Err(AppError::not_found(format!(
                "Invalid page ({page}): That page contains no results"
            )));
        }

        Ok(PageWindow {
            page,
            page_size,
            total_items,
            total_pages,
        })
    }
}

impl PageWindow {
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.page > 1,
            has_next: self.page < self.total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}
