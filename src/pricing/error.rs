//! Error taxonomy for price detection and annotation.
//!
//! None of these are fatal. Every variant is handled at the node (or
//! expression) where it originates; a failure on one element never stops
//! the rest of the page from being processed.

/// Errors raised while recognizing, converting, or placing a unit price
#[derive(Debug, Clone, PartialEq)]
pub enum PriceError {
    /// A unit-looking token has no entry in the unit table
    UnknownUnit(String),
    /// No recognizer matched the text
    NoMatch,
    /// The node, a descendant, or an ancestor already carries the marker
    AlreadyAnnotated,
    /// The marker count reached the safety ceiling
    CeilingExceeded { count: usize, ceiling: usize },
    /// The node was removed from the document before its task ran
    Detached,
    /// The tree host failed to perform a mutation
    Host(String),
    /// A recognizer pattern failed to compile
    Pattern(String),
}

impl PriceError {
    /// Expected outcomes that are not worth a log line above debug
    pub fn is_silent(&self) -> bool {
        matches!(self, PriceError::NoMatch | PriceError::AlreadyAnnotated)
    }
}

impl std::fmt::Display for PriceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceError::UnknownUnit(token) => write!(f, "No conversion factor for unit {}", token),
            PriceError::NoMatch => write!(f, "No price expression found"),
            PriceError::AlreadyAnnotated => write!(f, "Already has price tag"),
            PriceError::CeilingExceeded { count, ceiling } => {
                write!(f, "Too many price tags: {} (ceiling {})", count, ceiling)
            }
            PriceError::Detached => write!(f, "Node is no longer attached to the document"),
            PriceError::Host(msg) => write!(f, "Document host error: {}", msg),
            PriceError::Pattern(msg) => write!(f, "Invalid recognizer pattern: {}", msg),
        }
    }
}

impl std::error::Error for PriceError {}

impl From<regex::Error> for PriceError {
    fn from(err: regex::Error) -> Self {
        PriceError::Pattern(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_errors() {
        assert!(PriceError::NoMatch.is_silent());
        assert!(PriceError::AlreadyAnnotated.is_silent());
        assert!(!PriceError::UnknownUnit("pit".into()).is_silent());
        assert!(!PriceError::CeilingExceeded { count: 1, ceiling: 1 }.is_silent());
    }

    #[test]
    fn test_display_names_unit() {
        let err = PriceError::UnknownUnit("week".to_string());
        assert_eq!(err.to_string(), "No conversion factor for unit week");
    }
}
