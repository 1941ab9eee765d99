//! Error types for the aggregation tree
//!
//! - [`ShapeError`]: a document is not shaped like a configuration mapping
//! - [`LookupError`]: a chart id does not resolve to a node
//! - [`BuildError`]: the build procedure was violated

use crate::path::PathError;
use crate::source::SourceId;

/// A configuration document has the wrong shape
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    /// Top-level value is not a mapping
    #[error("expected a configuration mapping, found {found}")]
    NotAMapping {
        /// Kind of the value found instead
        found: &'static str,
    },

    /// Document text is not valid JSON
    #[error("invalid JSON document: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Document text is not valid YAML
    #[error("invalid YAML document: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Nested mappings exceed the supported depth
    #[error("document nests deeper than {limit} levels")]
    TooDeep {
        /// Maximum accepted nesting
        limit: usize,
    },
}

/// A chart id could not be resolved
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// A segment has no matching child; `path` is the first unresolved prefix
    #[error("no node at '{path}'")]
    NotFound {
        /// First prefix with no node
        path: String,
    },

    /// The id is not a well-formed node path
    #[error("invalid node id: {0}")]
    InvalidPath(#[from] PathError),
}

/// The build procedure was violated
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The group document may only be inserted once per build
    #[error("group configuration already inserted")]
    GroupAlreadyAdded,

    /// A source supplied a malformed document
    #[error("malformed document from {origin}: {error}")]
    Shape {
        /// Source that supplied the document
        origin: SourceId,
        /// What is wrong with it
        #[source]
        error: ShapeError,
    },
}

impl BuildError {
    /// Attach the offending source to a shape error
    pub fn shape(origin: SourceId, error: ShapeError) -> Self {
        Self::Shape { origin, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_error_display() {
        let err = ShapeError::NotAMapping { found: "string" };
        assert_eq!(
            err.to_string(),
            "expected a configuration mapping, found string"
        );
    }

    #[test]
    fn build_error_names_origin() {
        let err = BuildError::shape(SourceId::device("12"), ShapeError::TooDeep { limit: 4 });
        assert!(err.to_string().contains("from 12"));
    }

    #[test]
    fn lookup_error_display() {
        let err = LookupError::NotFound {
            path: "ROOT.wifi".into(),
        };
        assert_eq!(err.to_string(), "no node at 'ROOT.wifi'");
    }
}
