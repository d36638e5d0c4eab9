use crate::error::{Error, ErrorKind};
use crate::models::Action;
use exn::ResultExt;
use time::UtcDateTime;

/// A page hash with a recorded decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHash {
    pub hash: String,
    pub media_type: String,
    pub size: Option<u64>,
    pub action: Action,
    /// How many pages have been removed because of this hash.
    pub delete_count: u64,
    pub created_at: UtcDateTime,
    pub modified_at: UtcDateTime,
}

impl PageHash {
    pub fn new(hash: impl Into<String>, media_type: impl Into<String>, size: Option<u64>, action: Action) -> Self {
        let now = UtcDateTime::now();
        Self {
            hash: hash.into(),
            media_type: media_type.into(),
            size,
            action,
            delete_count: 0,
            created_at: now,
            modified_at: now,
        }
    }
}

/// A hash observed on book pages that nobody has made a decision about yet.
///
/// Without a size, any page size matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageHashUnknown {
    pub hash: String,
    pub media_type: String,
    pub size: Option<u64>,
}

impl PageHashUnknown {
    pub fn new(hash: impl Into<String>, media_type: impl Into<String>, size: Option<u64>) -> Self {
        Self { hash: hash.into(), media_type: media_type.into(), size }
    }
}

/// An unknown hash and the number of pages that carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHash {
    pub unknown: PageHashUnknown,
    pub match_count: u64,
}

/// A book page whose hash equals some [`PageHashUnknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHashMatch {
    pub book_id: String,
    /// Starts at 1.
    pub page_number: u32,
    pub file_name: String,
    pub file_size: Option<u64>,
    pub media_type: String,
}

fn to_size(size: Option<i64>) -> Result<Option<u64>, Error> {
    size.map(|size| u64::try_from(size).or_raise(|| ErrorKind::InvalidData("size"))).transpose()
}

pub(crate) fn from_size(size: Option<u64>) -> Result<Option<i64>, Error> {
    size.map(|size| i64::try_from(size).or_raise(|| ErrorKind::InvalidData("size"))).transpose()
}

#[derive(sqlx::FromRow)]
pub(crate) struct PageHashRow {
    pub(crate) hash: String,
    pub(crate) media_type: String,
    pub(crate) size: Option<i64>,
    pub(crate) action: String,
    pub(crate) delete_count: i64,
    pub(crate) created_at: i64,
    pub(crate) modified_at: i64,
}
impl TryFrom<&PageHash> for PageHashRow {
    type Error = Error;
    fn try_from(known: &PageHash) -> Result<Self, Self::Error> {
        Ok(Self {
            hash: known.hash.clone(),
            media_type: known.media_type.clone(),
            size: from_size(known.size)?,
            action: known.action.as_str().to_string(),
            delete_count: i64::try_from(known.delete_count).or_raise(|| ErrorKind::InvalidData("delete count"))?,
            created_at: known.created_at.unix_timestamp(),
            modified_at: known.modified_at.unix_timestamp(),
        })
    }
}
impl TryFrom<PageHashRow> for PageHash {
    type Error = Error;
    fn try_from(row: PageHashRow) -> Result<Self, Self::Error> {
        Ok(Self {
            action: row.action.parse()?,
            size: to_size(row.size)?,
            delete_count: u64::try_from(row.delete_count).or_raise(|| ErrorKind::InvalidData("delete count"))?,
            created_at: UtcDateTime::from_unix_timestamp(row.created_at)
                .or_raise(|| ErrorKind::InvalidData("creation date"))?,
            modified_at: UtcDateTime::from_unix_timestamp(row.modified_at)
                .or_raise(|| ErrorKind::InvalidData("modification date"))?,
            hash: row.hash,
            media_type: row.media_type,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UnknownRow {
    pub(crate) hash: String,
    pub(crate) media_type: String,
    pub(crate) size: Option<i64>,
    pub(crate) match_count: i64,
}
impl TryFrom<UnknownRow> for UnknownHash {
    type Error = Error;
    fn try_from(row: UnknownRow) -> Result<Self, Self::Error> {
        Ok(Self {
            unknown: PageHashUnknown { hash: row.hash, media_type: row.media_type, size: to_size(row.size)? },
            match_count: u64::try_from(row.match_count).or_raise(|| ErrorKind::InvalidData("match count"))?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct MatchRow {
    pub(crate) book_id: String,
    pub(crate) number: i64,
    pub(crate) file_name: String,
    pub(crate) file_size: Option<i64>,
    pub(crate) media_type: String,
}
impl TryFrom<MatchRow> for PageHashMatch {
    type Error = Error;
    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            book_id: row.book_id,
            page_number: u32::try_from(row.number).or_raise(|| ErrorKind::InvalidData("page number"))?,
            file_name: row.file_name,
            file_size: to_size(row.file_size)?,
            media_type: row.media_type,
        })
    }
}
