//! SDF world and robot description parser for physics simulation.
//!
//! This crate reads SDF (Simulation Description Format) XML documents into a
//! validated, strongly typed tree rooted at a [`World`] or a [`Model`]. Once
//! parsed, the tree needs no further checking: names are unique in their
//! scope, every joint refers to links of its own model, and every geometry
//! has exactly one shape.
//!
//! # Features
//!
//! - Load worlds and models from files, strings, parsed documents or single
//!   elements
//! - Links with collisions, visuals, sensors and inertial properties
//! - Joints resolved against the links of their model, in any document order
//! - Camera, ray, contact and generic sensors
//! - Physics (including ODE solver tuning) and scene settings
//! - Plugins kept as opaque XML for the code that loads them
//! - Errors that name the offending field and its enclosing elements
//!
//! # Layer 0
//!
//! This crate has no rendering or engine dependencies. Loading plugins,
//! resolving resource paths and stepping the simulation are left to callers.
//!
//! # Example
//!
//! ```
//! use sim_sdf::{Geometry, load_world_str};
//!
//! let sdf = r#"
//!     <sdf version="1.0">
//!         <world name="default">
//!             <physics type="ode">
//!                 <gravity xyz="0 0 -9.81"/>
//!             </physics>
//!             <model name="robot1">
//!                 <pose>0 0 1 0 0 0</pose>
//!                 <link name="body">
//!                     <collision name="body_collision">
//!                         <geometry><box size="1 1 0.5"/></geometry>
//!                     </collision>
//!                 </link>
//!                 <link name="wheel"/>
//!                 <joint name="axle" type="revolute">
//!                     <parent link="body"/>
//!                     <child link="wheel"/>
//!                 </joint>
//!             </model>
//!         </world>
//!     </sdf>
//! "#;
//!
//! let world = load_world_str(sdf).expect("should parse");
//! let robot = world.model("robot1").expect("robot1");
//! let axle = robot.joint("axle").expect("axle");
//! assert_eq!(robot.child_link(axle).map(|l| l.name.as_str()), Some("wheel"));
//!
//! let body = robot.link("body").expect("body");
//! assert!(matches!(body.collisions[0].geometry, Geometry::Box { .. }));
//! ```
//!
//! # Supported Elements
//!
//! ## World
//!
//! - `<world name="...">` - Models, physics, scene and plugins
//! - `<physics type="...">` - Gravity, update rate, contact limit, `<ode>` tuning
//! - `<scene>` - Ambient and background colors, shadows, grid
//!
//! ## Model
//!
//! - `<model name="..." static="...">` - Links, joints and plugins
//! - `<link>` - `<inertial>`, `<collision>`, `<visual>`, `<sensor>`
//! - `<joint type="...">` - `revolute`, `revolute2`, `prismatic`, `fixed`,
//!   `ball`, `screw`, `universal`, `continuous`
//!
//! ## Geometry
//!
//! - `<sphere radius="r"/>`
//! - `<box size="x y z"/>`
//! - `<cylinder radius="r" length="l"/>`
//! - `<mesh filename="..." scale="x y z"/>` - The file is not loaded
//!
//! ## Poses
//!
//! `<pose>x y z roll pitch yaw</pose>` with fixed-axis XYZ angles in radians,
//! or `<pose>x y z qw qx qy qz</pose>` unless disabled in [`ParseOptions`].
//!
//! # Logging
//!
//! Progress and skipped elements are reported through `tracing`. The crate
//! installs no subscriber.

#![doc(html_root_url = "https://docs.rs/sim-sdf/0.7.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::redundant_closure_for_method_calls,
    clippy::should_implement_trait,
    clippy::needless_pass_by_value,
    clippy::option_if_let_else,
    clippy::too_many_arguments
)]

mod config;
mod error;
mod loader;
mod parser;
mod physics;
mod pose;
mod scalar;
mod types;
mod validation;
mod xml;

// Re-export main types
pub use config::ParseOptions;
pub use error::{ErrorKind, Result, SdfError};
pub use loader::{
    SdfLoader, load_model_file, load_model_str, load_world_file, load_world_str, parse_model,
    parse_world,
};
pub use parser::{
    UnresolvedJoint, get_plugins, parse_collision, parse_geometry, parse_inertial, parse_joint,
    parse_joint_dynamics, parse_joint_limits, parse_link, parse_material, parse_plugin,
    parse_sensor, parse_surface, parse_visual,
};
pub use physics::{parse_ode, parse_physics, parse_scene};
pub use pose::{Pose, parse_pose, pose_child};
pub use scalar::{
    parse_bool, parse_color, parse_double, parse_int, parse_string, parse_uint, parse_vector3,
};
pub use types::{
    Bounce, Camera, Collision, Color, Contact, Friction, GenericSensorKind, Geometry, Inertia,
    Inertial, Joint, JointAxis, JointDynamics, JointLimits, JointType, Link, LinkId, LinkRef,
    Material, Model, OdeSolverType, OpenDynamicsEngine, Physics, Plugin, Ray, RayRange, RayScan,
    Scene, Sensor, SensorType, Surface, SurfaceContact, Visual, World,
};
pub use validation::{check_unique, index_links, resolve_joints};
pub use xml::{XmlDocument, XmlElement};

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_output_types_are_send_sync() {
        assert_send_sync::<World>();
        assert_send_sync::<Model>();
        assert_send_sync::<SdfError>();
    }

    #[test]
    fn test_model_and_world_from_same_document() {
        let doc = XmlDocument::parse_str(
            r#"<gazebo version="1.0">
                <world name="default">
                    <model name="box"><link name="body"/></model>
                </world>
            </gazebo>"#,
        )
        .unwrap();

        let loader = SdfLoader::new();
        let world = loader.world_from_document(&doc).unwrap();
        assert_eq!(world.models()[0].name(), "box");

        let err = loader.model_from_document(&doc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RootNameMismatch);

        let world_element = doc.root().child("world").unwrap();
        let again = loader.world_from_element(world_element).unwrap();
        assert_eq!(again, world);
    }
}
