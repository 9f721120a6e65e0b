//! Parser configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options controlling how strictly documents are read.
///
/// The defaults accept every form described in the crate docs and report
/// skipped elements at `debug` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// Accept seven-value poses (`x y z qw qx qy qz`) in addition to the
    /// six-value roll-pitch-yaw form (default: true).
    pub allow_quaternion_pose: bool,
    /// Report unrecognized child elements with `tracing::warn!` instead of
    /// `tracing::debug!` (default: false).
    pub warn_unknown_elements: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_quaternion_pose: true,
            warn_unknown_elements: false,
        }
    }
}

impl ParseOptions {
    /// Create options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether quaternion poses are accepted.
    #[must_use]
    pub fn with_quaternion_pose(mut self, allow: bool) -> Self {
        self.allow_quaternion_pose = allow;
        self
    }

    /// Set whether unknown elements are reported as warnings.
    #[must_use]
    pub fn with_unknown_element_warnings(mut self, warn: bool) -> Self {
        self.warn_unknown_elements = warn;
        self
    }

    /// Report a child element that the parser does not recognize.
    pub(crate) fn report_unknown(&self, element: &str, parent: &str) {
        if self.warn_unknown_elements {
            tracing::warn!("ignoring unknown element <{}> in {}", element, parent);
        } else {
            tracing::debug!("ignoring unknown element <{}> in {}", element, parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ParseOptions::default();
        assert!(options.allow_quaternion_pose);
        assert!(!options.warn_unknown_elements);
        assert_eq!(options, ParseOptions::new());
    }

    #[test]
    fn test_builder() {
        let options = ParseOptions::new()
            .with_quaternion_pose(false)
            .with_unknown_element_warnings(true);
        assert!(!options.allow_quaternion_pose);
        assert!(options.warn_unknown_elements);
    }
}
