mod action;
mod book;
mod hash;
mod page;

pub use self::action::Action;
pub use self::book::{Book, BookPage};
pub(crate) use self::book::{BookPageRow, BookRow};
pub use self::hash::{PageHash, PageHashMatch, PageHashUnknown, UnknownHash};
pub(crate) use self::hash::{MatchRow, PageHashRow, UnknownRow};
pub use self::page::{Page, Pageable};
pub(crate) use self::hash::from_size;
