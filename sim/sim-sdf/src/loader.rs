//! Document parsers and entry points.
//!
//! A document can be loaded from a file, a string, an already parsed
//! [`XmlDocument`], or a single [`XmlElement`]. Each source exists for both
//! [`Model`] and [`World`] roots.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::ParseOptions;
use crate::error::{Result, SdfError};
use crate::parser::{get_plugins, parse_joint, parse_link};
use crate::physics::{parse_physics, parse_scene};
use crate::pose::pose_child;
use crate::scalar::{attr_bool, attr_name};
use crate::types::{Model, World};
use crate::validation::{check_unique, index_links, resolve_joints};
use crate::xml::{XmlDocument, XmlElement};

/// Wrapper elements whose direct children are searched for the root.
const WRAPPERS: [&str; 2] = ["sdf", "gazebo"];

/// SDF loader with configuration options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SdfLoader {
    /// Parser options.
    pub options: ParseOptions,
}

impl SdfLoader {
    /// Create a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with the given options.
    #[must_use]
    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Set whether seven-value quaternion poses are accepted.
    #[must_use]
    pub fn with_quaternion_pose(mut self, allow: bool) -> Self {
        self.options.allow_quaternion_pose = allow;
        self
    }

    /// Set whether unknown elements are reported as warnings.
    #[must_use]
    pub fn with_unknown_element_warnings(mut self, warn: bool) -> Self {
        self.options.warn_unknown_elements = warn;
        self
    }

    // ------------------------------------------------------------------------
    // Model
    // ------------------------------------------------------------------------

    /// Load a model from a file.
    ///
    /// # Errors
    ///
    /// [`SdfError::FileNotFound`] or [`SdfError::FileUnreadable`] if the file
    /// cannot be read, otherwise see [`SdfLoader::model_from_str`].
    pub fn model_from_file(&self, path: impl AsRef<Path>) -> Result<Model> {
        let path = path.as_ref();
        tracing::debug!("loading model from {}", path.display());
        let content = read_file(path)?;
        self.model_from_str(&content)
    }

    /// Load a model from XML text.
    ///
    /// # Errors
    ///
    /// [`SdfError::MalformedXml`] if the text is not well-formed, otherwise see
    /// [`SdfLoader::model_from_document`].
    pub fn model_from_str(&self, xml: &str) -> Result<Model> {
        let doc = XmlDocument::parse_str(xml)?;
        self.model_from_document(&doc)
    }

    /// Load the model of a parsed document. The root may be `<model>` itself
    /// or an `<sdf>`/`<gazebo>` wrapper containing exactly one `<model>`.
    ///
    /// # Errors
    ///
    /// [`SdfError::RootNameMismatch`] if the document holds a world instead,
    /// [`SdfError::MissingRootElement`] if it holds neither, otherwise see
    /// [`SdfLoader::model_from_element`].
    pub fn model_from_document(&self, doc: &XmlDocument) -> Result<Model> {
        let root = select_root(doc, "model", "world")?;
        self.model_from_element(root)
    }

    /// Load a model from a `<model>` element.
    ///
    /// # Errors
    ///
    /// [`SdfError::RootNameMismatch`] for any other element, or the first
    /// error found inside the model.
    pub fn model_from_element(&self, e: &XmlElement) -> Result<Model> {
        parse_model(e, &self.options)
    }

    // ------------------------------------------------------------------------
    // World
    // ------------------------------------------------------------------------

    /// Load a world from a file.
    ///
    /// # Errors
    ///
    /// [`SdfError::FileNotFound`] or [`SdfError::FileUnreadable`] if the file
    /// cannot be read, otherwise see [`SdfLoader::world_from_str`].
    pub fn world_from_file(&self, path: impl AsRef<Path>) -> Result<World> {
        let path = path.as_ref();
        tracing::debug!("loading world from {}", path.display());
        let content = read_file(path)?;
        self.world_from_str(&content)
    }

    /// Load a world from XML text.
    ///
    /// # Errors
    ///
    /// [`SdfError::MalformedXml`] if the text is not well-formed, otherwise see
    /// [`SdfLoader::world_from_document`].
    pub fn world_from_str(&self, xml: &str) -> Result<World> {
        let doc = XmlDocument::parse_str(xml)?;
        self.world_from_document(&doc)
    }

    /// Load the world of a parsed document. The root may be `<world>` itself
    /// or an `<sdf>`/`<gazebo>` wrapper containing exactly one `<world>`.
    ///
    /// # Errors
    ///
    /// [`SdfError::RootNameMismatch`] if the document holds a model instead,
    /// [`SdfError::MissingRootElement`] if it holds neither, otherwise see
    /// [`SdfLoader::world_from_element`].
    pub fn world_from_document(&self, doc: &XmlDocument) -> Result<World> {
        let root = select_root(doc, "world", "model")?;
        self.world_from_element(root)
    }

    /// Load a world from a `<world>` element.
    ///
    /// # Errors
    ///
    /// [`SdfError::RootNameMismatch`] for any other element, or the first
    /// error found inside the world.
    pub fn world_from_element(&self, e: &XmlElement) -> Result<World> {
        parse_world(e, &self.options)
    }
}

/// Load a model from a file with default options.
///
/// # Errors
///
/// See [`SdfLoader::model_from_file`].
pub fn load_model_file(path: impl AsRef<Path>) -> Result<Model> {
    SdfLoader::new().model_from_file(path)
}

/// Load a model from XML text with default options.
///
/// # Errors
///
/// See [`SdfLoader::model_from_str`].
pub fn load_model_str(xml: &str) -> Result<Model> {
    SdfLoader::new().model_from_str(xml)
}

/// Load a world from a file with default options.
///
/// # Errors
///
/// See [`SdfLoader::world_from_file`].
pub fn load_world_file(path: impl AsRef<Path>) -> Result<World> {
    SdfLoader::new().world_from_file(path)
}

/// Load a world from XML text with default options.
///
/// # Errors
///
/// See [`SdfLoader::world_from_str`].
pub fn load_world_str(xml: &str) -> Result<World> {
    SdfLoader::new().world_from_str(xml)
}

// ============================================================================
// Document parsers
// ============================================================================

/// Parse a `<model>` element: links and joints, then joint resolution.
///
/// # Errors
///
/// The first error found, scoped to the model.
pub fn parse_model(e: &XmlElement, options: &ParseOptions) -> Result<Model> {
    expect_tag(e, "model")?;

    let name = attr_name(e)?;
    let scope = e.describe();
    let scoped = |err: SdfError| err.within(&scope);

    let is_static = attr_bool(e, "static", false)?;
    let pose = pose_child(e, options)?;

    let mut links = Vec::new();
    let mut joints = Vec::new();
    for child in &e.children {
        match child.name.as_str() {
            "link" => links.push(parse_link(child, options).map_err(scoped)?),
            "joint" => joints.push(parse_joint(child, options).map_err(scoped)?),
            "pose" | "plugin" => {}
            other => options.report_unknown(other, &scope),
        }
    }
    let plugins = get_plugins(e)?;

    let link_index = index_links(&links).map_err(scoped)?;
    let joints = resolve_joints(joints, &link_index).map_err(scoped)?;

    tracing::debug!(
        "parsed {}: {} links, {} joints, {} plugins",
        scope,
        links.len(),
        joints.len(),
        plugins.len()
    );

    Ok(Model::from_parts(
        name, pose, is_static, links, joints, plugins, link_index,
    ))
}

/// Parse a `<world>` element with its models, physics and scene.
///
/// # Errors
///
/// The first error found, scoped to the world.
pub fn parse_world(e: &XmlElement, options: &ParseOptions) -> Result<World> {
    expect_tag(e, "world")?;

    let name = attr_name(e)?;
    let scope = e.describe();
    let scoped = |err: SdfError| err.within(&scope);

    let mut models = Vec::new();
    for child in &e.children {
        match child.name.as_str() {
            "model" => models.push(parse_model(child, options).map_err(scoped)?),
            "physics" | "scene" | "plugin" => {}
            other => options.report_unknown(other, &scope),
        }
    }
    check_unique("model", models.iter().map(Model::name)).map_err(scoped)?;

    let physics = e
        .unique_child("physics")?
        .map(|p| parse_physics(p, options))
        .transpose()
        .map_err(scoped)?
        .unwrap_or_default();
    let scene = e
        .unique_child("scene")?
        .map(|s| parse_scene(s, options))
        .transpose()
        .map_err(scoped)?
        .unwrap_or_default();
    let plugins = get_plugins(e)?;

    tracing::debug!(
        "parsed {}: {} models, {} plugins, physics engine '{}'",
        scope,
        models.len(),
        plugins.len(),
        physics.engine
    );

    Ok(World::from_parts(name, models, physics, scene, plugins))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Read a whole file as UTF-8 text.
fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => SdfError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => SdfError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;

    String::from_utf8(bytes).map_err(|e| SdfError::FileUnreadable {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })
}

/// Locate the `expected` element of a document, looking through a wrapper
/// root if there is one.
fn select_root<'a>(
    doc: &'a XmlDocument,
    expected: &'static str,
    other: &'static str,
) -> Result<&'a XmlElement> {
    let root = doc.root();
    if root.name == expected {
        return Ok(root);
    }
    if root.name == other {
        return Err(SdfError::RootNameMismatch {
            expected,
            found: root.name.clone(),
        });
    }
    if !WRAPPERS.contains(&root.name.as_str()) {
        return Err(SdfError::MissingRootElement { expected });
    }

    let mut candidates = root.children_named(expected);
    match (candidates.next(), candidates.next()) {
        (Some(found), None) => Ok(found),
        (Some(_), Some(_)) => Err(SdfError::duplicate_element(expected, root.describe())),
        (None, _) if root.has_child(other) => Err(SdfError::RootNameMismatch {
            expected,
            found: other.to_string(),
        }),
        (None, _) => Err(SdfError::MissingRootElement { expected }),
    }
}

fn expect_tag(e: &XmlElement, expected: &'static str) -> Result<()> {
    if e.name == expected {
        Ok(())
    } else {
        Err(SdfError::RootNameMismatch {
            expected,
            found: e.name.clone(),
        })
    }
}
