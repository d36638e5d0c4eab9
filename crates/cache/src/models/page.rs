const DEFAULT_PAGE_SIZE: u32 = 20;

/// Which slice of a listing to fetch. Pages are numbered from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable {
    pub page: u32,
    pub size: u32,
}

impl Default for Pageable {
    fn default() -> Self {
        Self { page: 0, size: DEFAULT_PAGE_SIZE }
    }
}

impl Pageable {
    /// A page size of zero is treated as one.
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size: size.max(1) }
    }

    pub fn first(size: u32) -> Self {
        Self::new(0, size)
    }

    pub(crate) fn limit(&self) -> i64 {
        i64::from(self.size.max(1))
    }

    pub(crate) fn offset(&self) -> i64 {
        i64::from(self.page) * self.limit()
    }
}

/// One slice of a listing, plus the size of the whole listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    /// Number of elements across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub(crate) fn new(content: Vec<T>, pageable: Pageable, total: u64) -> Self {
        Self { content, page: pageable.page, size: pageable.size.max(1), total }
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.size.max(1)))
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total: self.total,
        }
    }
}
