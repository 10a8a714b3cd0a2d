use std::convert::From;
use std::error;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ErrorKind {
    MissingCredential,
    ServiceFailure,
    ConfigParse,
    IOError(io::Error),
}

impl Error {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        Error {
            kind,
            message: Some(msg.to_owned()),
        }
    }

    pub fn with_msg(mut self, message: &str) -> Self {
        self.message = Some(message.to_owned());
        self
    }

    pub fn is_missing_credential(&self) -> bool {
        matches!(self.kind, ErrorKind::MissingCredential)
    }

    /// Collapse every kind except `MissingCredential` into `ServiceFailure`,
    /// keeping the original text as message.
    pub fn into_fetch_failure(self) -> Self {
        match self.kind {
            ErrorKind::MissingCredential | ErrorKind::ServiceFailure => self,
            _ => Error::new(ErrorKind::ServiceFailure, &self.to_string()),
        }
    }

    /// Text shown to the user in place of the almanac.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            ErrorKind::MissingCredential => "需要 API 密钥：输入 :key <API-KEY> 后重试。",
            _ => "星象模糊，请稍后再试。",
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            kind,
            message: None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(io_error: io::Error) -> Error {
        Error::from(ErrorKind::IOError(io_error))
    }
}

impl From<toml::de::Error> for Error {
    fn from(toml_error: toml::de::Error) -> Error {
        Error::new(
            ErrorKind::ConfigParse,
            &format!("Could not parse configuration: {}", toml_error),
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(json_error: serde_json::Error) -> Error {
        Error::new(
            ErrorKind::ServiceFailure,
            &format!("Malformed response: {}", json_error),
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(http_error: reqwest::Error) -> Error {
        let msg = if http_error.is_timeout() {
            format!("Request timed out: {}", http_error)
        } else if let Some(status) = http_error.status() {
            format!("Service responded with {}", status)
        } else {
            format!("Request failed: {}", http_error)
        };
        Error::new(ErrorKind::ServiceFailure, &msg)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        if let ErrorKind::IOError(err) = err.kind {
            err
        } else {
            io::Error::new(
                io::ErrorKind::Other,
                err.message.unwrap_or_else(|| err.kind.as_str()),
            )
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", self.kind.as_str(), msg),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

impl error::Error for Error {}

impl ErrorKind {
    pub fn as_str(&self) -> String {
        match self {
            ErrorKind::MissingCredential => "no API key configured".to_owned(),
            ErrorKind::ServiceFailure => "almanac service failure".to_owned(),
            ErrorKind::ConfigParse => "invalid configuration".to_owned(),
            ErrorKind::IOError(err) => err.to_string(),
        }
    }
}
