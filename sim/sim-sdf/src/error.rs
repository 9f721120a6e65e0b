//! Error types for SDF parsing and loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during SDF parsing and loading.
///
/// Every variant that refers to a location inside a document carries a
/// `context` string naming the element and its enclosing scopes, e.g.
/// `collision 'wheel_collision' in link 'wheel' in model 'robot1'`.
#[derive(Debug, Error)]
pub enum SdfError {
    /// The file to load does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    FileUnreadable {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input is not well-formed XML.
    #[error("malformed XML: {0}")]
    MalformedXml(String),

    /// No `<model>` or `<world>` element found where one was expected.
    #[error("missing root element: expected <{expected}>")]
    MissingRootElement {
        /// The expected root tag.
        expected: &'static str,
    },

    /// The document root is a different kind than requested.
    #[error("root element mismatch: expected <{expected}>, found <{found}>")]
    RootNameMismatch {
        /// The expected root tag.
        expected: &'static str,
        /// The tag that was found instead.
        found: String,
    },

    /// A required attribute or sub-element is absent.
    #[error("missing required field `{field}` in {context}")]
    MissingRequiredField {
        /// The missing attribute or element name.
        field: &'static str,
        /// Where the field was expected.
        context: String,
    },

    /// A field is present but its content cannot be parsed.
    #[error("malformed value {value:?} for `{field}` in {context}: {message}")]
    MalformedField {
        /// The attribute or element name.
        field: &'static str,
        /// The raw content.
        value: String,
        /// Why the content was rejected.
        message: String,
        /// Where the field was found.
        context: String,
    },

    /// A pose string has the wrong shape or unparsable numbers.
    #[error("malformed pose {value:?} in {context}: {message}")]
    MalformedPose {
        /// The raw pose text.
        value: String,
        /// Why the pose was rejected.
        message: String,
        /// Where the pose was found.
        context: String,
    },

    /// A geometry element has zero or several shapes.
    #[error("invalid geometry in {context}: {message}")]
    InvalidGeometry {
        /// Why the geometry was rejected.
        message: String,
        /// Where the geometry was found.
        context: String,
    },

    /// Unknown sensor `type` attribute.
    #[error("unknown sensor type {sensor_type:?} in {context}")]
    UnknownSensorType {
        /// The unrecognized type.
        sensor_type: String,
        /// The sensor that declared it.
        context: String,
    },

    /// Unknown joint `type` attribute.
    #[error("unknown joint type {joint_type:?} in {context}")]
    UnknownJointType {
        /// The unrecognized type.
        joint_type: String,
        /// The joint that declared it.
        context: String,
    },

    /// Two siblings of the same kind share a name.
    #[error("duplicate {kind} name {name:?} in {context}")]
    DuplicateName {
        /// Element kind (`link`, `joint`, `plugin`, ...).
        kind: &'static str,
        /// The repeated name.
        name: String,
        /// The scope in which names must be unique.
        context: String,
    },

    /// A sub-element that may appear at most once appears several times.
    #[error("duplicate <{element}> element in {context}")]
    DuplicateElement {
        /// The repeated element tag.
        element: &'static str,
        /// The parent element.
        context: String,
    },

    /// A joint references a link that does not exist in its model.
    #[error("joint {joint:?} references undefined link {link:?} in {context}")]
    UnresolvedLinkReference {
        /// The link name that was referenced.
        link: String,
        /// The joint that referenced it.
        joint: String,
        /// The model the joint belongs to.
        context: String,
    },
}

/// Fieldless discriminant of [`SdfError`], convenient for matching and
/// comparing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`SdfError::FileNotFound`].
    FileNotFound,
    /// See [`SdfError::FileUnreadable`].
    FileUnreadable,
    /// See [`SdfError::MalformedXml`].
    MalformedXml,
    /// See [`SdfError::MissingRootElement`].
    MissingRootElement,
    /// See [`SdfError::RootNameMismatch`].
    RootNameMismatch,
    /// See [`SdfError::MissingRequiredField`].
    MissingRequiredField,
    /// See [`SdfError::MalformedField`].
    MalformedField,
    /// See [`SdfError::MalformedPose`].
    MalformedPose,
    /// See [`SdfError::InvalidGeometry`].
    InvalidGeometry,
    /// See [`SdfError::UnknownSensorType`].
    UnknownSensorType,
    /// See [`SdfError::UnknownJointType`].
    UnknownJointType,
    /// See [`SdfError::DuplicateName`].
    DuplicateName,
    /// See [`SdfError::DuplicateElement`].
    DuplicateElement,
    /// See [`SdfError::UnresolvedLinkReference`].
    UnresolvedLinkReference,
}

impl SdfError {
    /// Create a missing required field error.
    pub fn missing_field(field: &'static str, context: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field,
            context: context.into(),
        }
    }

    /// Create a malformed field error.
    pub fn malformed_field(
        field: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::MalformedField {
            field,
            value: value.into(),
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a malformed pose error.
    pub fn malformed_pose(
        value: impl Into<String>,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::MalformedPose {
            value: value.into(),
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an invalid geometry error.
    pub fn invalid_geometry(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a duplicate name error.
    pub fn duplicate_name(
        kind: &'static str,
        name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
            context: context.into(),
        }
    }

    /// Create a duplicate element error.
    pub fn duplicate_element(element: &'static str, context: impl Into<String>) -> Self {
        Self::DuplicateElement {
            element,
            context: context.into(),
        }
    }

    /// Create an unresolved link reference error.
    pub fn unresolved_link(
        link: impl Into<String>,
        joint: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::UnresolvedLinkReference {
            link: link.into(),
            joint: joint.into(),
            context: context.into(),
        }
    }

    /// Append an enclosing scope to the error's context.
    ///
    /// The variant is left untouched; only the diagnostic grows, so a failure
    /// deep inside a link reads `... in link 'base' in model 'robot1'`.
    #[must_use]
    pub fn within(mut self, scope: &str) -> Self {
        if let Self::MissingRequiredField { context, .. }
        | Self::MalformedField { context, .. }
        | Self::MalformedPose { context, .. }
        | Self::InvalidGeometry { context, .. }
        | Self::UnknownSensorType { context, .. }
        | Self::UnknownJointType { context, .. }
        | Self::DuplicateName { context, .. }
        | Self::DuplicateElement { context, .. }
        | Self::UnresolvedLinkReference { context, .. } = &mut self
        {
            if context.is_empty() {
                context.push_str(scope);
            } else {
                context.push_str(" in ");
                context.push_str(scope);
            }
        }
        self
    }

    /// The fieldless kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::FileNotFound,
            Self::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            Self::MalformedXml(_) => ErrorKind::MalformedXml,
            Self::MissingRootElement { .. } => ErrorKind::MissingRootElement,
            Self::RootNameMismatch { .. } => ErrorKind::RootNameMismatch,
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::MalformedField { .. } => ErrorKind::MalformedField,
            Self::MalformedPose { .. } => ErrorKind::MalformedPose,
            Self::InvalidGeometry { .. } => ErrorKind::InvalidGeometry,
            Self::UnknownSensorType { .. } => ErrorKind::UnknownSensorType,
            Self::UnknownJointType { .. } => ErrorKind::UnknownJointType,
            Self::DuplicateName { .. } => ErrorKind::DuplicateName,
            Self::DuplicateElement { .. } => ErrorKind::DuplicateElement,
            Self::UnresolvedLinkReference { .. } => ErrorKind::UnresolvedLinkReference,
        }
    }
}

/// Result type for SDF operations.
pub type Result<T> = std::result::Result<T, SdfError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = SdfError::missing_field("geometry", "collision 'body'");
        let msg = err.to_string();
        assert!(msg.contains("geometry"));
        assert!(msg.contains("collision 'body'"));
    }

    #[test]
    fn test_malformed_field_display() {
        let err = SdfError::malformed_field("radius", "abc", "expected a number", "sphere");
        let msg = err.to_string();
        assert!(msg.contains("radius"));
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("expected a number"));
    }

    #[test]
    fn test_within_appends_scopes() {
        let err = SdfError::missing_field("geometry", "collision 'c'")
            .within("link 'base'")
            .within("model 'robot1'");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
        assert!(
            err.to_string()
                .ends_with("in collision 'c' in link 'base' in model 'robot1'")
        );
    }

    #[test]
    fn test_within_empty_context() {
        let err = SdfError::invalid_geometry("no shape", "").within("geometry");
        match err {
            SdfError::InvalidGeometry { context, .. } => assert_eq!(context, "geometry"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_within_ignores_document_level_errors() {
        let err = SdfError::MalformedXml("eof".into()).within("model 'm'");
        assert_eq!(err.to_string(), "malformed XML: eof");
    }

    #[test]
    fn test_unresolved_link_display() {
        let err = SdfError::unresolved_link("ghost", "j1", "model 'robot'");
        let msg = err.to_string();
        assert!(msg.contains("ghost"));
        assert!(msg.contains("j1"));
        assert!(msg.contains("robot"));
    }

    #[test]
    fn test_io_error_includes_path() {
        let err = SdfError::FileUnreadable {
            path: PathBuf::from("/tmp/world.sdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/world.sdf"));
        assert!(msg.contains("denied"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_error_is_send_sync() {
        assert_send_sync::<SdfError>();
    }
}
