/// Outcome of a single lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The value was found.
    Found(T),
    /// The content was available but held no match, or the input was unusable.
    NotFound,
    /// The page could not be retrieved; carries the fetch error message.
    FetchFailed(String),
}

impl<T> Lookup<T> {
    /// Collapse into an `Option`, treating a failed fetch as not found.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound | Self::FetchFailed(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_fetch_failed(&self) -> bool {
        matches!(self, Self::FetchFailed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
            Self::FetchFailed(reason) => Lookup::FetchFailed(reason),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}
