//! Element parsers.
//!
//! Each parser takes one element of the XML tree and returns the matching
//! document type. Parsers are composed bottom-up: geometry and leaf elements
//! first, then links and joints. Errors are returned as soon as they occur,
//! with the enclosing element appended to their context.

use std::collections::BTreeMap;

use nalgebra::Vector3;

use crate::config::ParseOptions;
use crate::error::{Result, SdfError};
use crate::pose::{Pose, pose_child};
use crate::scalar::{
    attr_bool, attr_double, attr_name, attr_non_negative, attr_string, attr_uint,
    attr_vector3, child_string, require_color, require_double, require_non_negative,
    require_string, require_uint, require_vector3,
};
use crate::types::{
    Bounce, Camera, Collision, Color, Contact, Friction, Geometry, GenericSensorKind, Inertia,
    Inertial, JointAxis, JointDynamics, JointLimits, JointType, Link, Material, Plugin, Ray,
    RayRange, RayScan, Sensor, SensorType, Surface, SurfaceContact, Visual,
};
use crate::validation::check_link_children;
use crate::xml::XmlElement;

/// Report every child of `e` whose tag is not in `known`.
pub(crate) fn report_unknown_children(e: &XmlElement, known: &[&str], options: &ParseOptions) {
    for child in &e.children {
        if !known.contains(&child.name.as_str()) {
            options.report_unknown(&child.name, &e.describe());
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

const SHAPES: [&str; 4] = ["sphere", "box", "cylinder", "mesh"];

/// Parse a `<geometry>` element.
///
/// # Errors
///
/// [`SdfError::InvalidGeometry`] unless exactly one shape child is present;
/// [`SdfError::MalformedField`] for negative or unparsable dimensions.
pub fn parse_geometry(e: &XmlElement, options: &ParseOptions) -> Result<Geometry> {
    report_unknown_children(e, &SHAPES, options);

    let shapes: Vec<&XmlElement> = e
        .children
        .iter()
        .filter(|c| SHAPES.contains(&c.name.as_str()))
        .collect();

    let shape = match shapes.as_slice() {
        [shape] => *shape,
        [] => return Err(SdfError::invalid_geometry("no shape specified", e.describe())),
        several => {
            let names: Vec<&str> = several.iter().map(|s| s.name.as_str()).collect();
            return Err(SdfError::invalid_geometry(
                format!("expected exactly one shape, found {}", names.join(", ")),
                e.describe(),
            ));
        }
    };

    parse_shape(shape).map_err(|err| err.within(&e.describe()))
}

fn parse_shape(shape: &XmlElement) -> Result<Geometry> {
    let geometry = match shape.name.as_str() {
        "sphere" => Geometry::Sphere {
            radius: require_non_negative(shape, "radius")?,
        },
        "box" => {
            let size = require_vector3(shape, "size")?;
            if size.iter().any(|v| *v < 0.0) {
                return Err(SdfError::malformed_field(
                    "size",
                    format!("{} {} {}", size.x, size.y, size.z),
                    "box dimensions must not be negative",
                    shape.describe(),
                ));
            }
            Geometry::Box { size }
        }
        "cylinder" => Geometry::Cylinder {
            radius: require_non_negative(shape, "radius")?,
            length: require_non_negative(shape, "length")?,
        },
        _ => Geometry::Mesh {
            filename: require_string(shape, "filename")?,
            scale: attr_vector3(shape, "scale", Vector3::new(1.0, 1.0, 1.0))?,
        },
    };
    Ok(geometry)
}

/// Parse the single `<geometry>` child of a collision or visual.
fn geometry_child(e: &XmlElement, options: &ParseOptions) -> Result<Geometry> {
    match e.unique_child("geometry")? {
        Some(geometry) => {
            parse_geometry(geometry, options).map_err(|err| err.within(&e.describe()))
        }
        None => Err(SdfError::missing_field("geometry", e.describe())),
    }
}

// ============================================================================
// Leaf elements
// ============================================================================

/// Parse a `<material>` element.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for unparsable colors;
/// [`SdfError::DuplicateElement`] for a repeated color or shader element.
pub fn parse_material(e: &XmlElement, options: &ParseOptions) -> Result<Material> {
    report_unknown_children(
        e,
        &["shader", "ambient", "diffuse", "specular", "emissive"],
        options,
    );

    let color = |tag: &'static str| -> Result<Option<Color>> {
        e.unique_child(tag)?
            .map(|c| require_color(c, "rgba").map_err(|err| err.within(&e.describe())))
            .transpose()
    };

    Ok(Material {
        script: attr_string(e, "script"),
        shader: e
            .unique_child("shader")?
            .map(|s| require_string(s, "type"))
            .transpose()
            .map_err(|err| err.within(&e.describe()))?,
        ambient: color("ambient")?,
        diffuse: color("diffuse")?,
        specular: color("specular")?,
        emissive: color("emissive")?,
    })
}

/// Parse an `<inertial>` element.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for a non-positive mass or bad inertia values.
pub fn parse_inertial(e: &XmlElement, options: &ParseOptions) -> Result<Inertial> {
    report_unknown_children(e, &["pose", "inertia"], options);

    let mass = attr_double(e, "mass", 1.0)?;
    if mass <= 0.0 {
        return Err(SdfError::malformed_field(
            "mass",
            mass.to_string(),
            "mass must be positive",
            e.describe(),
        ));
    }

    let inertia = match e.unique_child("inertia")? {
        Some(i) => parse_inertia(i).map_err(|err| err.within(&e.describe()))?,
        None => Inertia::default(),
    };

    Ok(Inertial {
        pose: pose_child(e, options)?,
        mass,
        inertia,
    })
}

fn parse_inertia(e: &XmlElement) -> Result<Inertia> {
    Ok(Inertia {
        ixx: attr_double(e, "ixx", 1.0)?,
        ixy: attr_double(e, "ixy", 0.0)?,
        ixz: attr_double(e, "ixz", 0.0)?,
        iyy: attr_double(e, "iyy", 1.0)?,
        iyz: attr_double(e, "iyz", 0.0)?,
        izz: attr_double(e, "izz", 1.0)?,
    })
}

/// Parse a `<surface>` element.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for unparsable coefficients.
pub fn parse_surface(e: &XmlElement, options: &ParseOptions) -> Result<Surface> {
    report_unknown_children(e, &["friction", "bounce", "contact"], options);

    let scoped = |err: SdfError| err.within(&e.describe());
    let mut surface = Surface::default();

    if let Some(f) = e.unique_child("friction")? {
        surface.friction = parse_friction(f).map_err(scoped)?;
    }
    if let Some(b) = e.unique_child("bounce")? {
        surface.bounce = parse_bounce(b).map_err(scoped)?;
    }
    if let Some(c) = e.unique_child("contact")? {
        surface.contact = parse_surface_contact(c).map_err(scoped)?;
    }

    Ok(surface)
}

fn parse_friction(e: &XmlElement) -> Result<Friction> {
    let d = Friction::default();
    Ok(Friction {
        mu: attr_non_negative(e, "mu", d.mu)?,
        mu2: attr_non_negative(e, "mu2", d.mu2)?,
        slip1: attr_double(e, "slip1", d.slip1)?,
        slip2: attr_double(e, "slip2", d.slip2)?,
    })
}

fn parse_bounce(e: &XmlElement) -> Result<Bounce> {
    let d = Bounce::default();
    Ok(Bounce {
        restitution_coefficient: attr_double(
            e,
            "restitution_coefficient",
            d.restitution_coefficient,
        )?,
        threshold: attr_double(e, "threshold", d.threshold)?,
    })
}

fn parse_surface_contact(e: &XmlElement) -> Result<SurfaceContact> {
    let d = SurfaceContact::default();
    Ok(SurfaceContact {
        soft_cfm: attr_double(e, "soft_cfm", d.soft_cfm)?,
        soft_erp: attr_double(e, "soft_erp", d.soft_erp)?,
        kp: attr_double(e, "kp", d.kp)?,
        kd: attr_double(e, "kd", d.kd)?,
        max_vel: attr_double(e, "max_vel", d.max_vel)?,
        min_depth: attr_double(e, "min_depth", d.min_depth)?,
    })
}

/// Parse a `<collision>` element.
///
/// # Errors
///
/// [`SdfError::MissingRequiredField`] naming `geometry` when the shape is
/// absent, plus any error of the nested parsers.
pub fn parse_collision(e: &XmlElement, options: &ParseOptions) -> Result<Collision> {
    report_unknown_children(e, &["pose", "geometry", "surface"], options);

    let name = attr_name(e)?;
    let surface = e
        .unique_child("surface")?
        .map(|s| parse_surface(s, options))
        .transpose()
        .map_err(|err| err.within(&e.describe()))?;

    Ok(Collision {
        pose: pose_child(e, options)?,
        laser_retro: attr_double(e, "laser_retro", 0.0)?,
        max_contacts: attr_uint(e, "max_contacts", 10)?,
        geometry: geometry_child(e, options)?,
        surface,
        name,
    })
}

/// Parse a `<visual>` element.
///
/// # Errors
///
/// [`SdfError::MissingRequiredField`] naming `geometry` when the shape is
/// absent, plus any error of the nested parsers.
pub fn parse_visual(e: &XmlElement, options: &ParseOptions) -> Result<Visual> {
    report_unknown_children(e, &["pose", "geometry", "material"], options);

    let name = attr_name(e)?;
    let transparency = attr_double(e, "transparency", 0.0)?;
    if !(0.0..=1.0).contains(&transparency) {
        return Err(SdfError::malformed_field(
            "transparency",
            transparency.to_string(),
            "must be in [0, 1]",
            e.describe(),
        ));
    }
    let material = e
        .unique_child("material")?
        .map(|m| parse_material(m, options))
        .transpose()
        .map_err(|err| err.within(&e.describe()))?;

    Ok(Visual {
        pose: pose_child(e, options)?,
        cast_shadows: attr_bool(e, "cast_shadows", true)?,
        laser_retro: attr_double(e, "laser_retro", 0.0)?,
        transparency,
        geometry: geometry_child(e, options)?,
        material,
        name,
    })
}

// ============================================================================
// Sensors
// ============================================================================

/// Parse a `<sensor>` element.
///
/// # Errors
///
/// [`SdfError::UnknownSensorType`] for an unsupported `type`;
/// [`SdfError::MissingRequiredField`] when the camera, ray or contact block is
/// absent.
pub fn parse_sensor(e: &XmlElement, options: &ParseOptions) -> Result<Sensor> {
    let name = attr_name(e)?;
    let kind = require_string(e, "type")?;
    let scoped = |err: SdfError| err.within(&e.describe());

    let sensor_type = match kind.as_str() {
        "camera" => {
            let block = sensor_block(e, "camera")?;
            SensorType::Camera(parse_camera(block, options).map_err(scoped)?)
        }
        "ray" => {
            let block = sensor_block(e, "ray")?;
            SensorType::Ray(parse_ray(block, options).map_err(scoped)?)
        }
        "contact" => {
            let block = sensor_block(e, "contact")?;
            SensorType::Contact(parse_contact(block, options).map_err(scoped)?)
        }
        other => match GenericSensorKind::from_str(other) {
            Some(generic) => SensorType::Generic(generic),
            None => {
                return Err(SdfError::UnknownSensorType {
                    sensor_type: kind,
                    context: e.describe(),
                });
            }
        },
    };

    let mut known = vec!["pose", "topic"];
    if !matches!(sensor_type, SensorType::Generic(_)) {
        known.push(sensor_type.as_str());
    }
    report_unknown_children(e, &known, options);

    Ok(Sensor {
        pose: pose_child(e, options)?,
        always_on: attr_bool(e, "always_on", false)?,
        update_rate: attr_non_negative(e, "update_rate", 0.0)?,
        visualize: attr_bool(e, "visualize", false)?,
        topic: child_string(e, "topic")?,
        sensor_type,
        name,
    })
}

/// The kind-specific block of a sensor, which must be present.
fn sensor_block<'a>(e: &'a XmlElement, tag: &'static str) -> Result<&'a XmlElement> {
    e.unique_child(tag)?
        .ok_or_else(|| SdfError::missing_field(tag, e.describe()))
}

fn parse_camera(e: &XmlElement, options: &ParseOptions) -> Result<Camera> {
    report_unknown_children(e, &["horizontal_fov", "image", "clip", "save"], options);
    let scoped = |err: SdfError| err.within(&e.name);

    let horizontal_fov = match e.unique_child("horizontal_fov")? {
        Some(fov) => require_double(fov, "angle").map_err(scoped)?,
        None => 1.047,
    };

    let image = e
        .unique_child("image")?
        .ok_or_else(|| SdfError::missing_field("image", e.name.clone()))?;
    let image_width = require_uint(image, "width").map_err(scoped)?;
    let image_height = require_uint(image, "height").map_err(scoped)?;
    let image_format = attr_string(image, "format").unwrap_or_else(|| "R8G8B8".to_string());

    let (clip_near, clip_far) = match e.unique_child("clip")? {
        Some(clip) => {
            let near = attr_non_negative(clip, "near", 0.1).map_err(scoped)?;
            let far = attr_non_negative(clip, "far", 100.0).map_err(scoped)?;
            if near >= far {
                return Err(SdfError::malformed_field(
                    "near",
                    near.to_string(),
                    format!("must be less than the far clip distance ({far})"),
                    clip.describe(),
                )
                .within(&e.name));
            }
            (near, far)
        }
        None => (0.1, 100.0),
    };

    let mut save_path = None;
    if let Some(save) = e.unique_child("save")? {
        if attr_bool(save, "enabled", false).map_err(scoped)? {
            save_path = Some(require_string(save, "path").map_err(scoped)?);
        }
    }

    Ok(Camera {
        horizontal_fov,
        image_width,
        image_height,
        image_format,
        clip_near,
        clip_far,
        save_path,
    })
}

fn parse_ray(e: &XmlElement, options: &ParseOptions) -> Result<Ray> {
    report_unknown_children(e, &["scan", "range"], options);
    let scoped = |err: SdfError| err.within(&e.name);

    let scan = e
        .unique_child("scan")?
        .ok_or_else(|| SdfError::missing_field("scan", e.name.clone()))?;
    let (horizontal, vertical) = parse_scan(scan, options).map_err(scoped)?;

    let range = e
        .unique_child("range")?
        .ok_or_else(|| SdfError::missing_field("range", e.name.clone()))?;
    let range = parse_range(range).map_err(scoped)?;

    Ok(Ray {
        horizontal,
        vertical,
        range,
    })
}

fn parse_scan(e: &XmlElement, options: &ParseOptions) -> Result<(RayScan, Option<RayScan>)> {
    report_unknown_children(e, &["horizontal", "vertical"], options);
    let scoped = |err: SdfError| err.within(&e.name);

    let horizontal = e
        .unique_child("horizontal")?
        .ok_or_else(|| SdfError::missing_field("horizontal", e.name.clone()))?;
    let horizontal = RayScan {
        samples: require_uint(horizontal, "samples").map_err(scoped)?,
        resolution: attr_double(horizontal, "resolution", 1.0).map_err(scoped)?,
        min_angle: require_double(horizontal, "min_angle").map_err(scoped)?,
        max_angle: require_double(horizontal, "max_angle").map_err(scoped)?,
    };
    check_angles(&horizontal, "horizontal").map_err(scoped)?;

    let vertical = match e.unique_child("vertical")? {
        Some(v) => {
            let d = RayScan::default();
            let vertical = RayScan {
                samples: attr_uint(v, "samples", d.samples).map_err(scoped)?,
                resolution: attr_double(v, "resolution", d.resolution).map_err(scoped)?,
                min_angle: attr_double(v, "min_angle", d.min_angle).map_err(scoped)?,
                max_angle: attr_double(v, "max_angle", d.max_angle).map_err(scoped)?,
            };
            check_angles(&vertical, "vertical").map_err(scoped)?;
            Some(vertical)
        }
        None => None,
    };

    Ok((horizontal, vertical))
}

fn check_angles(scan: &RayScan, context: &str) -> Result<()> {
    if scan.min_angle > scan.max_angle {
        return Err(SdfError::malformed_field(
            "min_angle",
            scan.min_angle.to_string(),
            format!("greater than max_angle ({})", scan.max_angle),
            context,
        ));
    }
    Ok(())
}

fn parse_range(e: &XmlElement) -> Result<RayRange> {
    let range = RayRange {
        min: require_non_negative(e, "min")?,
        max: require_non_negative(e, "max")?,
        resolution: attr_non_negative(e, "resolution", 0.0)?,
    };
    if range.min > range.max {
        return Err(SdfError::malformed_field(
            "min",
            range.min.to_string(),
            format!("greater than max ({})", range.max),
            e.describe(),
        ));
    }
    Ok(range)
}

fn parse_contact(e: &XmlElement, options: &ParseOptions) -> Result<Contact> {
    report_unknown_children(e, &["collision", "topic"], options);

    let collisions: Vec<String> = e
        .children_named("collision")
        .map(|c| c.text().trim().to_string())
        .collect();
    if collisions.is_empty() {
        return Err(SdfError::missing_field("collision", e.name.clone()));
    }
    if let Some(empty) = collisions.iter().position(String::is_empty) {
        return Err(SdfError::malformed_field(
            "collision",
            "",
            format!("collision reference {} is empty", empty + 1),
            e.name.clone(),
        ));
    }

    Ok(Contact {
        collisions,
        topic: child_string(e, "topic")?,
    })
}

// ============================================================================
// Joint parts
// ============================================================================

/// Parse a `<dynamics>` element.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for unparsable values.
pub fn parse_joint_dynamics(e: &XmlElement) -> Result<JointDynamics> {
    Ok(JointDynamics {
        damping: attr_double(e, "damping", 0.0)?,
        friction: attr_double(e, "friction", 0.0)?,
    })
}

/// Parse a `<limit>` element.
///
/// # Errors
///
/// [`SdfError::MissingRequiredField`] without `lower` or `upper`;
/// [`SdfError::MalformedField`] when `lower > upper`.
pub fn parse_joint_limits(e: &XmlElement) -> Result<JointLimits> {
    let lower = require_double(e, "lower")?;
    let upper = require_double(e, "upper")?;
    if lower > upper {
        return Err(SdfError::malformed_field(
            "lower",
            lower.to_string(),
            format!("greater than upper limit ({upper})"),
            e.describe(),
        ));
    }
    Ok(JointLimits {
        lower,
        upper,
        effort: attr_double(e, "effort", -1.0)?,
        velocity: attr_double(e, "velocity", -1.0)?,
    })
}

/// Parse an `<axis>` or `<axis2>` element.
fn parse_axis(e: &XmlElement, options: &ParseOptions) -> Result<JointAxis> {
    report_unknown_children(e, &["dynamics", "limit"], options);

    let xyz = attr_vector3(e, "xyz", Vector3::z())?;
    let norm = xyz.norm();
    if norm < 1e-12 {
        return Err(SdfError::malformed_field(
            "xyz",
            format!("{} {} {}", xyz.x, xyz.y, xyz.z),
            "axis must not be the zero vector",
            e.describe(),
        ));
    }

    let scoped = |err: SdfError| err.within(&e.describe());
    Ok(JointAxis {
        xyz: xyz / norm,
        dynamics: e
            .unique_child("dynamics")?
            .map(parse_joint_dynamics)
            .transpose()
            .map_err(scoped)?,
        limits: e
            .unique_child("limit")?
            .map(parse_joint_limits)
            .transpose()
            .map_err(scoped)?,
    })
}

// ============================================================================
// Composite elements
// ============================================================================

/// Parse a `<link>` element with its collisions, visuals, sensors and
/// inertial.
///
/// # Errors
///
/// The first error of any child, scoped to the link;
/// [`SdfError::DuplicateName`] for repeated child names;
/// [`SdfError::DuplicateElement`] for a second `<inertial>`.
pub fn parse_link(e: &XmlElement, options: &ParseOptions) -> Result<Link> {
    let mut link = Link::new(attr_name(e)?);
    let scope = e.describe();
    let scoped = |err: SdfError| err.within(&scope);

    link.gravity = attr_bool(e, "gravity", true)?;
    link.self_collide = attr_bool(e, "self_collide", false)?;
    link.kinematic = attr_bool(e, "kinematic", false)?;
    link.pose = pose_child(e, options)?;
    link.inertial = e
        .unique_child("inertial")?
        .map(|i| parse_inertial(i, options))
        .transpose()
        .map_err(scoped)?;

    for child in &e.children {
        match child.name.as_str() {
            "collision" => link
                .collisions
                .push(parse_collision(child, options).map_err(scoped)?),
            "visual" => link.visuals.push(parse_visual(child, options).map_err(scoped)?),
            "sensor" => link.sensors.push(parse_sensor(child, options).map_err(scoped)?),
            "pose" | "inertial" => {}
            other => options.report_unknown(other, &scope),
        }
    }

    check_link_children(&link).map_err(scoped)?;

    Ok(link)
}

/// A joint as written in the document, before its link names are resolved
/// against the enclosing model.
#[derive(Debug, Clone, PartialEq)]
pub struct UnresolvedJoint {
    /// Joint name.
    pub name: String,
    /// Joint type.
    pub joint_type: JointType,
    /// Parent link name.
    pub parent: String,
    /// Child link name.
    pub child: String,
    /// Joint frame relative to the child link.
    pub pose: Pose,
    /// First axis.
    pub axis: JointAxis,
    /// Second axis.
    pub axis2: Option<JointAxis>,
}

/// Parse a `<joint>` element. Link names are recorded but not resolved.
///
/// # Errors
///
/// [`SdfError::UnknownJointType`] for an unsupported `type`;
/// [`SdfError::MissingRequiredField`] without `<parent>` or `<child>`;
/// [`SdfError::MalformedField`] when parent and child are the same link.
pub fn parse_joint(e: &XmlElement, options: &ParseOptions) -> Result<UnresolvedJoint> {
    report_unknown_children(e, &["parent", "child", "pose", "axis", "axis2"], options);

    let name = attr_name(e)?;
    let scoped = |err: SdfError| err.within(&e.describe());

    let kind = require_string(e, "type")?;
    let joint_type = JointType::from_str(&kind).ok_or_else(|| SdfError::UnknownJointType {
        joint_type: kind.clone(),
        context: e.describe(),
    })?;

    let link_of = |tag: &'static str| -> Result<String> {
        let element = e
            .unique_child(tag)?
            .ok_or_else(|| SdfError::missing_field(tag, e.describe()))?;
        require_string(element, "link").map_err(scoped)
    };
    let parent = link_of("parent")?;
    let child = link_of("child")?;
    if parent == child {
        return Err(SdfError::malformed_field(
            "child",
            child,
            "a joint cannot connect a link to itself",
            e.describe(),
        ));
    }

    let axis = match e.unique_child("axis")? {
        Some(axis) => parse_axis(axis, options).map_err(scoped)?,
        None => JointAxis::default(),
    };
    let axis2 = e
        .unique_child("axis2")?
        .map(|a| parse_axis(a, options))
        .transpose()
        .map_err(scoped)?;

    Ok(UnresolvedJoint {
        name,
        joint_type,
        parent,
        child,
        pose: pose_child(e, options)?,
        axis,
        axis2,
    })
}

// ============================================================================
// Plugins
// ============================================================================

/// Parse a `<plugin>` element. The element is kept verbatim.
///
/// # Errors
///
/// [`SdfError::MissingRequiredField`] without `name` or `filename`.
pub fn parse_plugin(e: &XmlElement) -> Result<Plugin> {
    Ok(Plugin {
        name: attr_name(e)?,
        filename: require_string(e, "filename")?,
        element: e.clone(),
    })
}

/// Collect all direct `<plugin>` children of `e`, keyed by name.
///
/// # Errors
///
/// [`SdfError::DuplicateName`] when two plugins share a name, plus any
/// [`parse_plugin`] error.
pub fn get_plugins(e: &XmlElement) -> Result<BTreeMap<String, Plugin>> {
    let mut plugins = BTreeMap::new();
    for element in e.children_named("plugin") {
        let plugin = parse_plugin(element).map_err(|err| err.within(&e.describe()))?;
        if plugins.contains_key(&plugin.name) {
            return Err(SdfError::duplicate_name("plugin", plugin.name, e.describe()));
        }
        plugins.insert(plugin.name.clone(), plugin);
    }
    Ok(plugins)
}
