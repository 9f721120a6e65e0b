//! Scoped name uniqueness and joint resolution.
//!
//! Links and joints are parsed in document order. Once every link of a model
//! is known, joints are resolved against them in a second pass, so a joint
//! may appear before the links it connects.
//!
//! Errors produced here carry an empty context; the caller appends the scope
//! (`model 'robot1'`) with [`SdfError::within`].

use std::collections::{HashMap, HashSet};

use crate::error::{Result, SdfError};
use crate::parser::UnresolvedJoint;
use crate::types::{Joint, Link, LinkId, LinkRef};

/// Check that no name occurs twice among siblings of one kind.
///
/// # Errors
///
/// Returns [`SdfError::DuplicateName`] for the first repeated name.
pub fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SdfError::duplicate_name(kind, name, String::new()));
        }
    }
    Ok(())
}

/// Check that the collisions, visuals and sensors of a link are uniquely
/// named within their kind.
pub(crate) fn check_link_children(link: &Link) -> Result<()> {
    check_unique("collision", link.collisions.iter().map(|c| c.name.as_str()))?;
    check_unique("visual", link.visuals.iter().map(|v| v.name.as_str()))?;
    check_unique("sensor", link.sensors.iter().map(|s| s.name.as_str()))
}

/// Map link names to their position in `links`.
///
/// # Errors
///
/// Returns [`SdfError::DuplicateName`] if two links share a name.
pub fn index_links(links: &[Link]) -> Result<HashMap<String, LinkId>> {
    let mut index = HashMap::with_capacity(links.len());
    for (i, link) in links.iter().enumerate() {
        if index.insert(link.name.clone(), LinkId(i)).is_some() {
            return Err(SdfError::duplicate_name("link", &link.name, String::new()));
        }
    }
    Ok(index)
}

/// Resolve the link names of every joint against `index`.
///
/// # Errors
///
/// Returns [`SdfError::DuplicateName`] if two joints share a name, or
/// [`SdfError::UnresolvedLinkReference`] for the first joint naming a link
/// that is not in `index`.
pub fn resolve_joints(
    joints: Vec<UnresolvedJoint>,
    index: &HashMap<String, LinkId>,
) -> Result<Vec<Joint>> {
    check_unique("joint", joints.iter().map(|j| j.name.as_str()))?;

    joints
        .into_iter()
        .map(|joint| {
            let parent = resolve_link(&joint.parent, &joint.name, index)?;
            let child = resolve_link(&joint.child, &joint.name, index)?;
            Ok(Joint {
                name: joint.name,
                joint_type: joint.joint_type,
                parent,
                child,
                pose: joint.pose,
                axis: joint.axis,
                axis2: joint.axis2,
            })
        })
        .collect()
}

fn resolve_link(link: &str, joint: &str, index: &HashMap<String, LinkId>) -> Result<LinkRef> {
    index
        .get(link)
        .map(|&id| LinkRef {
            name: link.to_string(),
            id,
        })
        .ok_or_else(|| SdfError::unresolved_link(link, joint, String::new()))
}
