use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("database error")]
    Database,
    #[display("archive error")]
    Archive,
    #[display("library error")]
    Library,
    #[display("no page carries hash {_0}")]
    NoMatch(#[error(not(source))] String),
    #[display("no thumbnail stored for hash {_0}")]
    NoThumbnail(#[error(not(source))] String),
    #[display("could not write output")]
    Output,
}
