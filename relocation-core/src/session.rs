use crate::models::Record;

/// Authentication state as seen by the profile views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Loading,
    LoggedOut,
    LoggedIn(Record),
}

impl Session {
    /// A pending auth lookup wins over any cached profile.
    pub fn from_parts(
        profile: Option<Record>,
        loading: bool,
    ) -> Self {
        match (loading, profile) {
            (true, _) => Self::Loading,
            (false, None) => Self::LoggedOut,
            (false, Some(profile)) => Self::LoggedIn(profile),
        }
    }

    pub fn profile(&self) -> Option<&Record> {
        match self {
            Self::LoggedIn(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn greeting(&self) -> String {
        match self {
            Self::Loading => "Loading...".to_string(),
            Self::LoggedOut => "Please log in".to_string(),
            Self::LoggedIn(profile) => {
                format!("Hello, {}", profile.text("full_name").unwrap_or_default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn loading_wins() {
        let profile = Record::new().with("full_name", "Ana");
        assert_eq!(Session::from_parts(Some(profile), true), Session::Loading);
        assert_eq!(Session::Loading.greeting(), "Loading...");
    }

    #[test]
    fn greeting_per_state() {
        assert_eq!(Session::from_parts(None, false).greeting(), "Please log in");

        let session = Session::from_parts(Some(Record::new().with("full_name", "Ana")), false);
        assert_eq!(session.greeting(), "Hello, Ana");
        assert!(session.profile().is_some());
    }
}
