#[cfg(test)]
#[macro_use]
extern crate assert_matches;
extern crate byteorder;
extern crate crossbeam_channel;
#[macro_use]
extern crate log;

pub mod core;

use std::fmt::{
    Display,
    Formatter,
    Result as FmtResult,
};

#[derive(Debug)]
pub enum Error {
    /// Indicates an error where a buffer, header space, etc. is exhausted.
    Exhausted,
    /// Indicates an error where a packet or frame is malformed.
    Malformed,
    /// Indicates an error where a packet or frame was not meant for us.
    Ignored,
    /// Indicates an error where an endpoint does not support an operation.
    NotSupported,
    /// Indicates an error where a link address was not resolved in time.
    Timeout,
    /// Indicates an error where a NIC or local address could not be found.
    Address,
    /// Indicates an error where a NIC or protocol is already registered.
    Duplicate,
    /// Indicates an error where the other end of a link has gone away.
    Link,
    /// Indicates a generic IO error.
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match *self {
            Error::Exhausted => write!(f, "buffer exhausted"),
            Error::Malformed => write!(f, "malformed frame"),
            Error::Ignored => write!(f, "frame ignored"),
            Error::NotSupported => write!(f, "operation not supported"),
            Error::Timeout => write!(f, "timed out"),
            Error::Address => write!(f, "unknown address"),
            Error::Duplicate => write!(f, "already registered"),
            Error::Link => write!(f, "link disconnected"),
            Error::IO(ref err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
