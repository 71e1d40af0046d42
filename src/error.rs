use std::fmt;

#[derive(Debug)]
pub enum Error {
    Config(String),
    /// The identity provider rejected a sign-in or refresh request.
    Auth {
        status: u16,
        body: String,
    },
    /// A resource endpoint answered with a non-success status.
    UnexpectedStatus {
        status: u16,
        body: String,
    },
    InvalidResponse(String),
    Http(reqwest::Error),
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Auth { status, body } => {
                write!(f, "Authentication failed with status {}: {}", status, body)
            }
            Error::UnexpectedStatus { status, body } => {
                write!(f, "Unexpected status code: {}", status)?;
                if !body.is_empty() {
                    write!(f, "\n{}", body)?;
                }
                Ok(())
            }
            Error::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Error::Http(err) => write!(f, "HTTP error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Yaml(err) => write!(f, "YAML parsing error: {}", err),
            Error::Json(err) => write!(f, "JSON parsing error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Yaml(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Yaml(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
