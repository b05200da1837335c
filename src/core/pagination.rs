//! Splitting ordered results into fixed-size pages.

use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    #[error("That page number is not an integer")]
    NotAnInteger(String),

    #[error("That page number is less than 1")]
    LessThanOne,

    #[error("That page contains no results")]
    OutOfRange { requested: usize, last: usize },
}

/// Which page the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(usize),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::Number(1)
    }
}

impl FromStr for PageRequest {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("last") {
            return Ok(PageRequest::Last);
        }
        let number: i64 = s
            .parse()
            .map_err(|_| PageError::NotAnInteger(s.to_string()))?;
        if number < 1 {
            return Err(PageError::LessThanOne);
        }
        Ok(PageRequest::Number(number as usize))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    /// 1-based index of the first item on this page, 0 when there are none.
    pub fn start_index(&self) -> usize {
        if self.total_items == 0 {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    /// 1-based index of the last item on this page.
    pub fn end_index(&self) -> usize {
        self.start_index() + self.items.len().saturating_sub(1)
    }
}

/// Returns the requested page of `items`, which must already be ordered.
///
/// An empty input still has one (empty) page.
pub fn paginate<T>(items: Vec<T>, request: PageRequest, page_size: usize) -> Result<Page<T>, PageError> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);

    let number = match request {
        PageRequest::Last => total_pages,
        PageRequest::Number(0) => return Err(PageError::LessThanOne),
        PageRequest::Number(n) if n > total_pages => {
            return Err(PageError::OutOfRange {
                requested: n,
                last: total_pages,
            });
        }
        PageRequest::Number(n) => n,
    };

    let items = items
        .into_iter()
        .skip((number - 1) * page_size)
        .take(page_size)
        .collect();

    Ok(Page {
        items,
        number,
        page_size,
        total_items,
        total_pages,
    })
}
