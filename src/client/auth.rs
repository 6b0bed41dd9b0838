use base64::Engine;

/// Credentials sent with every search request
#[derive(Clone)]
pub enum Auth {
    /// Use an API key authentication via headers
    Apikey(String),
    /// Use username and password authentication via Basic Auth headers
    Basic(String, String),
    /// Don't use any authentication
    None,
}

impl Auth {
    /// Read credentials from the environment.
    ///
    /// `ARCHIVE_APIKEY` wins over `ARCHIVE_USERNAME`/`ARCHIVE_PASSWORD`;
    /// with neither set the requests go out unauthenticated.
    pub fn from_env() -> Self {
        if let Ok(apikey) = std::env::var("ARCHIVE_APIKEY") {
            Self::Apikey(apikey)
        } else if let (Ok(username), Ok(password)) = (
            std::env::var("ARCHIVE_USERNAME"),
            std::env::var("ARCHIVE_PASSWORD"),
        ) {
            Self::Basic(username, password)
        } else {
            Self::None
        }
    }

    /// Value for the `Authorization` header, if any
    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::Apikey(apikey) => Some(format!("ApiKey {}", apikey)),
            Self::Basic(username, password) => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", credentials))
            }
            Self::None => None,
        }
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apikey(_) => write!(f, "Apikey"),
            Self::Basic(_, _) => write!(f, "Basic"),
            Self::None => write!(f, "None"),
        }
    }
}

// Keep secrets out of debug logs
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Auth::{}", self)
    }
}
