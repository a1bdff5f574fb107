/// Errors from the weather resolution pipeline. Only two of these are meant
/// for the user's eyes; everything else is logged by the call site and the
/// request chain ends there.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("no address matched the requested location")]
    LocationNotFound,
    #[error("unknown forecast category: {0}")]
    UnknownCategory(String),
    #[error("weather api request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected weather api payload: {0}")]
    UnexpectedPayload(String),
}

impl WeatherError {
    /// Plain-language sentence for the user-facing kinds, `None` for the
    /// rest. The caller decides between relaying and silent drop.
    pub fn user_sentence(&self) -> Option<String> {
        match self {
            Self::LocationNotFound => Some(
                "I'm having a problem finding the location you mentioned, \
                 can you try again please?"
                    .to_string(),
            ),
            Self::UnknownCategory(what) => {
                Some(format!("Looks like I don't know what {what} is."))
            }
            _ => None,
        }
    }
}
