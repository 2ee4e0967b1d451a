use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not open the catalogue")]
    Database,
    #[display("could not set up device storage")]
    Storage,
    #[display("scan failed")]
    Scan,
    #[display("catalogue query failed")]
    Query,
    #[display("no book with id {_0}")]
    NotFound(#[error(not(source))] i64),
}
