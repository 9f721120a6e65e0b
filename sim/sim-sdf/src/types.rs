//! Document types produced by the parser.
//!
//! Leaf and composite types expose their fields directly. The two document
//! roots, [`Model`] and [`World`], keep their fields private: their
//! invariants (unique names, resolved joint references) are established by
//! the parser and cannot be broken afterwards.

use std::collections::{BTreeMap, HashMap};

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::pose::Pose;
use crate::xml::XmlElement;

// ============================================================================
// Color and Material
// ============================================================================

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Create a color from components.
    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
}

/// Surface appearance from `<material>`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Rendering script name (e.g. `Gazebo/Grey`).
    pub script: Option<String>,
    /// Shader type from `<shader type="...">`.
    pub shader: Option<String>,
    /// Ambient color.
    pub ambient: Option<Color>,
    /// Diffuse color.
    pub diffuse: Option<Color>,
    /// Specular color.
    pub specular: Option<Color>,
    /// Emissive color.
    pub emissive: Option<Color>,
}

// ============================================================================
// Geometry
// ============================================================================

/// Shape from a `<geometry>` element. Exactly one variant is always active.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Geometry {
    /// Sphere.
    Sphere {
        /// Radius in meters.
        radius: f64,
    },
    /// Axis-aligned box.
    Box {
        /// Edge lengths along x, y, z in meters.
        size: Vector3<f64>,
    },
    /// Cylinder along the local z axis.
    Cylinder {
        /// Radius in meters.
        radius: f64,
        /// Length in meters.
        length: f64,
    },
    /// Mesh file reference.
    Mesh {
        /// Mesh resource URI or path, as written in the document.
        filename: String,
        /// Per-axis scale factor.
        scale: Vector3<f64>,
    },
}

impl Geometry {
    /// Tag name of the active variant.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Box { .. } => "box",
            Self::Cylinder { .. } => "cylinder",
            Self::Mesh { .. } => "mesh",
        }
    }
}

// ============================================================================
// Inertial
// ============================================================================

/// Inertia tensor (upper triangle of the symmetric 3x3 matrix).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inertia {
    /// Moment of inertia about x.
    pub ixx: f64,
    /// Product of inertia xy.
    pub ixy: f64,
    /// Product of inertia xz.
    pub ixz: f64,
    /// Moment of inertia about y.
    pub iyy: f64,
    /// Product of inertia yz.
    pub iyz: f64,
    /// Moment of inertia about z.
    pub izz: f64,
}

impl Default for Inertia {
    fn default() -> Self {
        Self {
            ixx: 1.0,
            ixy: 0.0,
            ixz: 0.0,
            iyy: 1.0,
            iyz: 0.0,
            izz: 1.0,
        }
    }
}

impl Inertia {
    /// Full symmetric matrix.
    #[must_use]
    pub fn to_matrix(&self) -> nalgebra::Matrix3<f64> {
        nalgebra::Matrix3::new(
            self.ixx, self.ixy, self.ixz, self.ixy, self.iyy, self.iyz, self.ixz, self.iyz,
            self.izz,
        )
    }
}

/// Mass properties from `<inertial>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Inertial {
    /// Center of mass frame relative to the link frame.
    pub pose: Pose,
    /// Mass in kg.
    pub mass: f64,
    /// Inertia tensor about the center of mass.
    pub inertia: Inertia,
}

impl Default for Inertial {
    fn default() -> Self {
        Self {
            pose: Pose::identity(),
            mass: 1.0,
            inertia: Inertia::default(),
        }
    }
}

// ============================================================================
// Collision surface
// ============================================================================

/// Friction parameters from `<surface><friction>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Friction {
    /// Coefficient along the first friction direction.
    pub mu: f64,
    /// Coefficient along the second friction direction.
    pub mu2: f64,
    /// Force-dependent slip along the first direction.
    pub slip1: f64,
    /// Force-dependent slip along the second direction.
    pub slip2: f64,
}

impl Default for Friction {
    fn default() -> Self {
        Self {
            mu: 1.0,
            mu2: 1.0,
            slip1: 0.0,
            slip2: 0.0,
        }
    }
}

/// Restitution parameters from `<surface><bounce>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounce {
    /// Restitution coefficient in `[0, 1]`.
    pub restitution_coefficient: f64,
    /// Minimum impact velocity for bouncing, in m/s.
    pub threshold: f64,
}

impl Default for Bounce {
    fn default() -> Self {
        Self {
            restitution_coefficient: 0.0,
            threshold: 100_000.0,
        }
    }
}

/// Contact softness from `<surface><contact>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceContact {
    /// Constraint force mixing.
    pub soft_cfm: f64,
    /// Error reduction parameter.
    pub soft_erp: f64,
    /// Contact stiffness.
    pub kp: f64,
    /// Contact damping.
    pub kd: f64,
    /// Maximum correction velocity.
    pub max_vel: f64,
    /// Penetration allowed before contact forces apply.
    pub min_depth: f64,
}

impl Default for SurfaceContact {
    fn default() -> Self {
        Self {
            soft_cfm: 0.0,
            soft_erp: 0.2,
            kp: 1e12,
            kd: 1.0,
            max_vel: 0.01,
            min_depth: 0.0,
        }
    }
}

/// Contact surface parameters from `<surface>`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Surface {
    /// Friction.
    pub friction: Friction,
    /// Restitution.
    pub bounce: Bounce,
    /// Contact softness.
    pub contact: SurfaceContact,
}

// ============================================================================
// Visual and Collision
// ============================================================================

/// Collision shape attached to a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Collision {
    /// Name, unique among the link's collisions.
    pub name: String,
    /// Pose relative to the link frame.
    pub pose: Pose,
    /// Laser retro-reflectance.
    pub laser_retro: f64,
    /// Maximum number of contacts generated by this shape.
    pub max_contacts: u32,
    /// Shape.
    pub geometry: Geometry,
    /// Surface parameters, when specified.
    pub surface: Option<Surface>,
}

/// Visual shape attached to a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Visual {
    /// Name, unique among the link's visuals.
    pub name: String,
    /// Pose relative to the link frame.
    pub pose: Pose,
    /// Whether the visual casts shadows.
    pub cast_shadows: bool,
    /// Laser retro-reflectance.
    pub laser_retro: f64,
    /// Transparency in `[0, 1]`.
    pub transparency: f64,
    /// Shape.
    pub geometry: Geometry,
    /// Appearance, when specified.
    pub material: Option<Material>,
}

// ============================================================================
// Sensors
// ============================================================================

/// Camera parameters from `<camera>`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Camera {
    /// Horizontal field of view in radians.
    pub horizontal_fov: f64,
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Pixel format name.
    pub image_format: String,
    /// Near clip distance.
    pub clip_near: f64,
    /// Far clip distance.
    pub clip_far: f64,
    /// Frame saving, if enabled: the target directory.
    pub save_path: Option<String>,
}

/// One scan axis of a ray sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RayScan {
    /// Number of rays.
    pub samples: u32,
    /// Resolution multiplier.
    pub resolution: f64,
    /// Minimum angle in radians.
    pub min_angle: f64,
    /// Maximum angle in radians.
    pub max_angle: f64,
}

impl Default for RayScan {
    fn default() -> Self {
        Self {
            samples: 1,
            resolution: 1.0,
            min_angle: 0.0,
            max_angle: 0.0,
        }
    }
}

/// Range limits of a ray sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RayRange {
    /// Minimum range in meters.
    pub min: f64,
    /// Maximum range in meters.
    pub max: f64,
    /// Range resolution in meters.
    pub resolution: f64,
}

/// Ray (laser) sensor parameters from `<ray>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ray {
    /// Horizontal scan.
    pub horizontal: RayScan,
    /// Vertical scan, when specified.
    pub vertical: Option<RayScan>,
    /// Range limits.
    pub range: RayRange,
}

/// Contact sensor parameters from `<contact>`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Contact {
    /// Names of the monitored collisions, in document order.
    pub collisions: Vec<String>,
    /// Output topic.
    pub topic: Option<String>,
}

/// Sensor kinds without a dedicated parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GenericSensorKind {
    /// Inertial measurement unit.
    Imu,
    /// Satellite positioning.
    Gps,
    /// Force/torque at a joint.
    ForceTorque,
    /// RFID reader.
    Rfid,
    /// RFID tag.
    RfidTag,
}

impl GenericSensorKind {
    /// Parse from the sensor `type` attribute.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "imu" => Some(Self::Imu),
            "gps" => Some(Self::Gps),
            "force_torque" => Some(Self::ForceTorque),
            "rfid" => Some(Self::Rfid),
            "rfidtag" => Some(Self::RfidTag),
            _ => None,
        }
    }

    /// The `type` attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imu => "imu",
            Self::Gps => "gps",
            Self::ForceTorque => "force_torque",
            Self::Rfid => "rfid",
            Self::RfidTag => "rfidtag",
        }
    }
}

/// Sensor-specific parameters, selected by the sensor `type` attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SensorType {
    /// `type="camera"`.
    Camera(Camera),
    /// `type="ray"`.
    Ray(Ray),
    /// `type="contact"`.
    Contact(Contact),
    /// Sensors configured only through the common fields.
    Generic(GenericSensorKind),
}

impl SensorType {
    /// The `type` attribute value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Camera(_) => "camera",
            Self::Ray(_) => "ray",
            Self::Contact(_) => "contact",
            Self::Generic(kind) => kind.as_str(),
        }
    }
}

/// Sensor attached to a link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sensor {
    /// Name, unique among the link's sensors.
    pub name: String,
    /// Pose relative to the link frame.
    pub pose: Pose,
    /// Whether the sensor updates without subscribers.
    pub always_on: bool,
    /// Update rate in Hz (0 means as fast as possible).
    pub update_rate: f64,
    /// Whether the sensor output is visualized.
    pub visualize: bool,
    /// Output topic.
    pub topic: Option<String>,
    /// Kind-specific parameters.
    pub sensor_type: SensorType,
}

// ============================================================================
// Link
// ============================================================================

/// A rigid body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Link {
    /// Name, unique within the model.
    pub name: String,
    /// Pose relative to the model frame.
    pub pose: Pose,
    /// Whether gravity acts on the link.
    pub gravity: bool,
    /// Whether the link collides with other links of the same model.
    pub self_collide: bool,
    /// Whether the link is kinematic (not affected by forces).
    pub kinematic: bool,
    /// Mass properties, when specified.
    pub inertial: Option<Inertial>,
    /// Collision shapes in document order.
    pub collisions: Vec<Collision>,
    /// Visual shapes in document order.
    pub visuals: Vec<Visual>,
    /// Sensors in document order.
    pub sensors: Vec<Sensor>,
}

impl Link {
    /// Create a link with default properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pose: Pose::identity(),
            gravity: true,
            self_collide: false,
            kinematic: false,
            inertial: None,
            collisions: Vec::new(),
            visuals: Vec::new(),
            sensors: Vec::new(),
        }
    }

    /// Get a collision by name.
    #[must_use]
    pub fn collision(&self, name: &str) -> Option<&Collision> {
        self.collisions.iter().find(|c| c.name == name)
    }

    /// Get a visual by name.
    #[must_use]
    pub fn visual(&self, name: &str) -> Option<&Visual> {
        self.visuals.iter().find(|v| v.name == name)
    }

    /// Get a sensor by name.
    #[must_use]
    pub fn sensor(&self, name: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// Joint
// ============================================================================

/// Joint type from the `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum JointType {
    /// Hinge with one rotational degree of freedom.
    Revolute,
    /// Two hinges with independent axes.
    Revolute2,
    /// Slider with one translational degree of freedom.
    Prismatic,
    /// Rigid attachment.
    Fixed,
    /// Ball and socket.
    Ball,
    /// Coupled rotation and translation.
    Screw,
    /// Universal (Cardan) joint.
    Universal,
    /// Unlimited hinge.
    Continuous,
}

impl JointType {
    /// Parse joint type from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "revolute" => Some(Self::Revolute),
            "revolute2" => Some(Self::Revolute2),
            "prismatic" => Some(Self::Prismatic),
            "fixed" => Some(Self::Fixed),
            "ball" => Some(Self::Ball),
            "screw" => Some(Self::Screw),
            "universal" => Some(Self::Universal),
            "continuous" => Some(Self::Continuous),
            _ => None,
        }
    }

    /// Degrees of freedom.
    #[must_use]
    pub fn dof(&self) -> usize {
        match self {
            Self::Fixed => 0,
            Self::Revolute | Self::Prismatic | Self::Screw | Self::Continuous => 1,
            Self::Revolute2 | Self::Universal => 2,
            Self::Ball => 3,
        }
    }
}

/// Joint dynamics from `<dynamics>`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointDynamics {
    /// Viscous damping coefficient.
    pub damping: f64,
    /// Coulomb friction.
    pub friction: f64,
}

/// Joint limits from `<limit>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointLimits {
    /// Lower position limit (rad or m).
    pub lower: f64,
    /// Upper position limit (rad or m).
    pub upper: f64,
    /// Maximum effort; negative means unlimited.
    pub effort: f64,
    /// Maximum velocity; negative means unlimited.
    pub velocity: f64,
}

impl JointLimits {
    /// Whether an effort limit is set.
    #[must_use]
    pub fn has_effort_limit(&self) -> bool {
        self.effort >= 0.0
    }

    /// Whether a velocity limit is set.
    #[must_use]
    pub fn has_velocity_limit(&self) -> bool {
        self.velocity >= 0.0
    }
}

/// Joint axis from `<axis>` / `<axis2>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JointAxis {
    /// Unit axis direction in the joint frame.
    pub xyz: Vector3<f64>,
    /// Dynamics along this axis.
    pub dynamics: Option<JointDynamics>,
    /// Limits along this axis.
    pub limits: Option<JointLimits>,
}

impl Default for JointAxis {
    fn default() -> Self {
        Self {
            xyz: Vector3::z(),
            dynamics: None,
            limits: None,
        }
    }
}

/// Index of a link inside its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    /// Position of the link in [`Model::links`].
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Non-owning reference from a joint to a link of the same model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkRef {
    /// Link name as written in the document.
    pub name: String,
    /// Resolved index into the owning model's links.
    pub id: LinkId,
}

/// A joint connecting two links of the same model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Joint {
    /// Name, unique within the model.
    pub name: String,
    /// Joint type.
    pub joint_type: JointType,
    /// Parent link.
    pub parent: LinkRef,
    /// Child link.
    pub child: LinkRef,
    /// Joint frame relative to the child link frame.
    pub pose: Pose,
    /// First axis.
    pub axis: JointAxis,
    /// Second axis (revolute2, universal).
    pub axis2: Option<JointAxis>,
}

// ============================================================================
// Plugin
// ============================================================================

/// Reference to an externally loaded extension.
///
/// The element is kept verbatim; its parameters are interpreted only by the
/// plugin itself.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plugin {
    /// Name, unique within the enclosing model or world.
    pub name: String,
    /// Shared library file name.
    pub filename: String,
    /// The complete `<plugin>` element.
    pub element: XmlElement,
}

impl Plugin {
    /// Text of the first parameter element with the given tag.
    #[must_use]
    pub fn param(&self, tag: &str) -> Option<&str> {
        self.element.child(tag).map(XmlElement::text)
    }

    /// Text of every parameter element with the given tag, in document order.
    pub fn params<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a str> {
        self.element.children_named(tag).map(XmlElement::text)
    }
}

// ============================================================================
// Physics and Scene
// ============================================================================

/// ODE step algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OdeSolverType {
    /// Iterative `quick` step.
    #[default]
    Quick,
    /// Direct `world` step.
    World,
}

impl OdeSolverType {
    /// Parse solver type from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "quick" => Some(Self::Quick),
            "world" => Some(Self::World),
            _ => None,
        }
    }
}

/// Open Dynamics Engine tuning from `<ode>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpenDynamicsEngine {
    /// Step algorithm.
    pub solver_type: OdeSolverType,
    /// Time step in seconds.
    pub dt: f64,
    /// Solver iterations.
    pub iters: u32,
    /// Preconditioner iterations.
    pub precon_iters: u32,
    /// Successive over-relaxation parameter.
    pub sor: f64,
    /// Global constraint force mixing.
    pub cfm: f64,
    /// Global error reduction parameter.
    pub erp: f64,
    /// Maximum contact correction velocity.
    pub contact_max_correcting_vel: f64,
    /// Contact surface layer depth.
    pub contact_surface_layer: f64,
}

impl Default for OpenDynamicsEngine {
    fn default() -> Self {
        Self {
            solver_type: OdeSolverType::Quick,
            dt: 0.001,
            iters: 10,
            precon_iters: 0,
            sor: 1.3,
            cfm: 0.0,
            erp: 0.2,
            contact_max_correcting_vel: 100.0,
            contact_surface_layer: 0.0,
        }
    }
}

/// Physics settings from `<physics>`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Physics {
    /// Engine name from the `type` attribute.
    pub engine: String,
    /// Gravity vector in m/s².
    pub gravity: Vector3<f64>,
    /// Target update rate in Hz (0 means as fast as possible).
    pub update_rate: f64,
    /// Maximum contacts between two bodies.
    pub max_contacts: u32,
    /// ODE tuning, when specified.
    pub ode: Option<OpenDynamicsEngine>,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            engine: "ode".to_string(),
            gravity: Vector3::new(0.0, 0.0, -9.8),
            update_rate: 0.0,
            max_contacts: 20,
            ode: None,
        }
    }
}

/// Scene settings from `<scene>`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scene {
    /// Ambient light color.
    pub ambient: Color,
    /// Background color.
    pub background: Color,
    /// Whether shadows are rendered.
    pub shadows: bool,
    /// Whether the ground grid is shown.
    pub grid: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            ambient: Color::BLACK,
            background: Color::new(0.7, 0.7, 0.7, 1.0),
            shadows: true,
            grid: true,
        }
    }
}

// ============================================================================
// Model
// ============================================================================

/// A robot or object: links connected by joints.
///
/// With the `serde` feature the link index is not serialized. Deserializing
/// rebuilds it and re-resolves every joint by link name, so a deserialized
/// model upholds the same invariants as a parsed one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "document::ModelDocument", into = "document::ModelDocument")
)]
pub struct Model {
    name: String,
    pose: Pose,
    is_static: bool,
    links: Vec<Link>,
    joints: Vec<Joint>,
    plugins: BTreeMap<String, Plugin>,
    link_index: HashMap<String, LinkId>,
}

impl Model {
    /// Assemble a model whose joints were resolved against `link_index`.
    pub(crate) fn from_parts(
        name: String,
        pose: Pose,
        is_static: bool,
        links: Vec<Link>,
        joints: Vec<Joint>,
        plugins: BTreeMap<String, Plugin>,
        link_index: HashMap<String, LinkId>,
    ) -> Self {
        Self {
            name,
            pose,
            is_static,
            links,
            joints,
            plugins,
            link_index,
        }
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pose of the model frame in its parent frame.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Whether the model is immovable.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Links in document order.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Joints in document order.
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Plugins keyed by name.
    #[must_use]
    pub fn plugins(&self) -> &BTreeMap<String, Plugin> {
        &self.plugins
    }

    /// Get a link by name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&Link> {
        self.link_id(name).and_then(|id| self.link_by_id(id))
    }

    /// Get the id of a link by name.
    #[must_use]
    pub fn link_id(&self, name: &str) -> Option<LinkId> {
        self.link_index.get(name).copied()
    }

    /// Get a link by id.
    #[must_use]
    pub fn link_by_id(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.0)
    }

    /// Get a joint by name.
    #[must_use]
    pub fn joint(&self, name: &str) -> Option<&Joint> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// Get a plugin by name.
    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }

    /// Parent link of a joint of this model.
    #[must_use]
    pub fn parent_link(&self, joint: &Joint) -> Option<&Link> {
        self.resolve(&joint.parent)
    }

    /// Child link of a joint of this model.
    #[must_use]
    pub fn child_link(&self, joint: &Joint) -> Option<&Link> {
        self.resolve(&joint.child)
    }

    /// Look up a link reference. Returns `None` for references that belong
    /// to another model.
    #[must_use]
    pub fn resolve(&self, link: &LinkRef) -> Option<&Link> {
        self.link_by_id(link.id).filter(|l| l.name == link.name)
    }

    /// Links that are not the child of any joint, in document order.
    pub fn root_links(&self) -> impl Iterator<Item = &Link> {
        self.links
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.joints.iter().any(|j| j.child.id.0 == *i))
            .map(|(_, l)| l)
    }

    /// All link names in document order.
    pub fn link_names(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(|l| l.name.as_str())
    }

    /// All joint names in document order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.iter().map(|j| j.name.as_str())
    }
}

// ============================================================================
// World
// ============================================================================

/// A simulation scenario: models plus global physics and scene settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "document::WorldDocument"))]
pub struct World {
    name: String,
    models: Vec<Model>,
    physics: Physics,
    scene: Scene,
    plugins: BTreeMap<String, Plugin>,
}

impl World {
    pub(crate) fn from_parts(
        name: String,
        models: Vec<Model>,
        physics: Physics,
        scene: Scene,
        plugins: BTreeMap<String, Plugin>,
    ) -> Self {
        Self {
            name,
            models,
            physics,
            scene,
            plugins,
        }
    }

    /// World name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Models in document order.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    /// Get a model by name.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Physics settings.
    #[must_use]
    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    /// Gravity vector in m/s².
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.physics.gravity
    }

    /// Scene settings.
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// World-level plugins keyed by name.
    #[must_use]
    pub fn plugins(&self) -> &BTreeMap<String, Plugin> {
        &self.plugins
    }

    /// Get a world-level plugin by name.
    #[must_use]
    pub fn plugin(&self, name: &str) -> Option<&Plugin> {
        self.plugins.get(name)
    }
}

// ============================================================================
// Serialized documents
// ============================================================================

#[cfg(feature = "serde")]
mod document {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Serialize};

    use super::{Joint, Link, Model, Physics, Plugin, Scene, World};
    use crate::error::{Result, SdfError};
    use crate::parser::UnresolvedJoint;
    use crate::pose::Pose;
    use crate::validation::{check_link_children, check_unique, index_links, resolve_joints};

    /// Serialized form of a [`Model`], without the derived link index.
    #[derive(Serialize, Deserialize)]
    pub(super) struct ModelDocument {
        name: String,
        pose: Pose,
        is_static: bool,
        links: Vec<Link>,
        joints: Vec<Joint>,
        plugins: BTreeMap<String, Plugin>,
    }

    impl From<Model> for ModelDocument {
        fn from(model: Model) -> Self {
            Self {
                name: model.name,
                pose: model.pose,
                is_static: model.is_static,
                links: model.links,
                joints: model.joints,
                plugins: model.plugins,
            }
        }
    }

    impl TryFrom<ModelDocument> for Model {
        type Error = SdfError;

        fn try_from(doc: ModelDocument) -> Result<Self> {
            let scope = format!("model '{}'", doc.name);
            let scoped = |err: SdfError| err.within(&scope);

            for link in &doc.links {
                check_link_children(link)
                    .map_err(|err| err.within(&format!("link '{}'", link.name)))
                    .map_err(scoped)?;
            }
            let link_index = index_links(&doc.links).map_err(scoped)?;

            let mut unresolved = Vec::with_capacity(doc.joints.len());
            for joint in doc.joints {
                if joint.parent.name == joint.child.name {
                    return Err(SdfError::malformed_field(
                        "child",
                        joint.child.name,
                        "a joint cannot connect a link to itself",
                        format!("joint '{}'", joint.name),
                    )
                    .within(&scope));
                }
                unresolved.push(UnresolvedJoint {
                    name: joint.name,
                    joint_type: joint.joint_type,
                    parent: joint.parent.name,
                    child: joint.child.name,
                    pose: joint.pose,
                    axis: joint.axis,
                    axis2: joint.axis2,
                });
            }
            let joints = resolve_joints(unresolved, &link_index).map_err(scoped)?;
            check_plugin_keys(&doc.plugins).map_err(scoped)?;

            Ok(Model::from_parts(
                doc.name,
                doc.pose,
                doc.is_static,
                doc.links,
                joints,
                doc.plugins,
                link_index,
            ))
        }
    }

    /// Serialized form of a [`World`].
    #[derive(Deserialize)]
    pub(super) struct WorldDocument {
        name: String,
        models: Vec<Model>,
        physics: Physics,
        scene: Scene,
        plugins: BTreeMap<String, Plugin>,
    }

    impl TryFrom<WorldDocument> for World {
        type Error = SdfError;

        fn try_from(doc: WorldDocument) -> Result<Self> {
            let scope = format!("world '{}'", doc.name);
            check_unique("model", doc.models.iter().map(Model::name))
                .and_then(|()| check_plugin_keys(&doc.plugins))
                .map_err(|err| err.within(&scope))?;
            Ok(World::from_parts(
                doc.name,
                doc.models,
                doc.physics,
                doc.scene,
                doc.plugins,
            ))
        }
    }

    fn check_plugin_keys(plugins: &BTreeMap<String, Plugin>) -> Result<()> {
        match plugins.iter().find(|(key, plugin)| **key != plugin.name) {
            Some((key, plugin)) => Err(SdfError::malformed_field(
                "name",
                plugin.name.clone(),
                format!("plugin stored under key '{key}'"),
                String::new(),
            )),
            None => Ok(()),
        }
    }
}
