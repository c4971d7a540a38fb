use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Timeout,
    MalformedEnvelope(String),
    MissingPack,
    MalformedPack(String),
    Encryption(String),
    Decryption(String),
    BindTimeout,
    BindProtocol(String),
    NotConnected,
    DeviceNotFound(String),
}

impl Error {
    /// True for the "no answer in time" family, which callers may retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout | Error::BindTimeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Timeout => write!(f, "timed out waiting for a response"),
            Error::MalformedEnvelope(msg) => write!(f, "malformed envelope: {msg}"),
            Error::MissingPack => write!(f, "envelope has no pack"),
            Error::MalformedPack(msg) => write!(f, "malformed pack: {msg}"),
            Error::Encryption(msg) => write!(f, "encryption failed: {msg}"),
            Error::Decryption(msg) => write!(f, "decryption failed: {msg}"),
            Error::BindTimeout => write!(f, "timed out waiting for bind response"),
            Error::BindProtocol(msg) => write!(f, "bind failed: {msg}"),
            Error::NotConnected => write!(f, "not connected"),
            Error::DeviceNotFound(ip) => write!(f, "no device answered the scan at {ip}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
