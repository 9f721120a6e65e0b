//! End-to-end loading of complete SDF documents.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use approx::assert_relative_eq;
use nalgebra::Vector3;
use sim_sdf::{
    ErrorKind, Geometry, GenericSensorKind, JointType, OdeSolverType, ParseOptions, SdfError,
    SdfLoader, SensorType, load_model_file, load_model_str, load_world_file, load_world_str,
};

const ROBOT_WORLD: &str = r#"<?xml version="1.0"?>
<gazebo version="1.0">
  <world name="default">
    <scene>
      <ambient rgba="0.5 0.5 0.5 1"/>
      <background rgba="0.1 0.1 0.1 1"/>
      <shadows enabled="false"/>
    </scene>

    <physics type="ode">
      <gravity xyz="0 0 -9.8"/>
      <ode>
        <solver type="quick" dt="0.001" iters="10" sor="1.3"/>
        <constraints cfm="0.0" erp="0.2" contact_max_correcting_vel="100.0" contact_surface_layer="0.0"/>
      </ode>
    </physics>

    <model name="ground" static="true">
      <link name="plane">
        <collision name="plane_collision">
          <geometry><box size="100 100 0.01"/></geometry>
          <surface><friction mu="50" mu2="50"/></surface>
        </collision>
        <visual name="plane_visual" cast_shadows="false">
          <geometry><box size="100 100 0.01"/></geometry>
          <material script="Gazebo/Grey"/>
        </visual>
      </link>
    </model>

    <model name="robot1">
      <pose>0 0 1 0 0 0</pose>

      <joint name="left_wheel_hinge" type="revolute">
        <parent link="chassis"/>
        <child link="left_wheel"/>
        <axis xyz="0 1 0"/>
      </joint>
      <joint name="right_wheel_hinge" type="revolute">
        <parent link="chassis"/>
        <child link="right_wheel"/>
        <axis xyz="0 1 0"/>
      </joint>

      <link name="chassis">
        <inertial mass="10">
          <inertia ixx="0.5" iyy="0.5" izz="0.5"/>
        </inertial>
        <collision name="chassis_collision">
          <geometry><box size="1 0.5 0.25"/></geometry>
        </collision>
        <visual name="chassis_visual">
          <geometry><box size="1 0.5 0.25"/></geometry>
          <material>
            <diffuse rgba="0.2 0.2 0.8 1"/>
          </material>
        </visual>
        <sensor name="front_laser" type="ray" update_rate="10">
          <pose>0.5 0 0.2 0 0 0</pose>
          <ray>
            <scan><horizontal samples="180" min_angle="-1.57" max_angle="1.57"/></scan>
            <range min="0.1" max="8"/>
          </ray>
        </sensor>
        <sensor name="imu" type="imu" always_on="true"/>
      </link>

      <link name="left_wheel">
        <pose>0 0.3 0 1.5707963267948966 0 0</pose>
        <collision name="left_wheel_collision">
          <geometry><cylinder radius="0.2" length="0.05"/></geometry>
        </collision>
      </link>
      <link name="right_wheel">
        <pose>0 -0.3 0 1.5707963267948966 0 0</pose>
        <collision name="right_wheel_collision">
          <geometry><cylinder radius="0.2" length="0.05"/></geometry>
        </collision>
      </link>

      <plugin name="diff_drive" filename="libdiffdrive_plugin.so">
        <left_joint>left_wheel_hinge</left_joint>
        <right_joint>right_wheel_hinge</right_joint>
        <torque>5</torque>
      </plugin>
    </model>
  </world>
</gazebo>
"#;

#[test]
fn test_robot_world() {
    let world = load_world_str(ROBOT_WORLD).expect("should load");
    assert_eq!(world.name(), "default");
    assert_eq!(world.models().len(), 2);
    assert_relative_eq!(world.gravity(), Vector3::new(0.0, 0.0, -9.8));

    let scene = world.scene();
    assert_relative_eq!(scene.ambient.r, 0.5);
    assert!(!scene.shadows);

    let ode = world.physics().ode.expect("ode block");
    assert_eq!(ode.solver_type, OdeSolverType::Quick);
    assert_eq!(ode.iters, 10);

    let ground = world.model("ground").expect("ground");
    assert!(ground.is_static());
    let plane = ground.link("plane").expect("plane");
    let surface = plane.collisions[0].surface.expect("surface");
    assert_relative_eq!(surface.friction.mu, 50.0);

    let robot = world.model("robot1").expect("robot1");
    assert_relative_eq!(robot.pose().translation, Vector3::new(0.0, 0.0, 1.0));
    assert_eq!(robot.links().len(), 3);
    assert_eq!(robot.joints().len(), 2);

    for joint in robot.joints() {
        assert_eq!(joint.joint_type, JointType::Revolute);
        assert_eq!(robot.parent_link(joint).map(|l| l.name.as_str()), Some("chassis"));
        assert!(robot.child_link(joint).is_some());
        assert_relative_eq!(joint.axis.xyz, Vector3::y());
    }

    let roots: Vec<_> = robot.root_links().map(|l| l.name.as_str()).collect();
    assert_eq!(roots, ["chassis"]);

    let chassis = robot.link("chassis").expect("chassis");
    assert_relative_eq!(chassis.inertial.expect("inertial").mass, 10.0);
    assert_eq!(chassis.sensors.len(), 2);
    match &chassis.sensor("front_laser").expect("laser").sensor_type {
        SensorType::Ray(ray) => assert_eq!(ray.horizontal.samples, 180),
        other => panic!("expected ray sensor, got {other:?}"),
    }
    assert_eq!(
        chassis.sensor("imu").map(|s| &s.sensor_type),
        Some(&SensorType::Generic(GenericSensorKind::Imu))
    );

    let wheel = robot.link("left_wheel").expect("left_wheel");
    assert!(matches!(
        wheel.collisions[0].geometry,
        Geometry::Cylinder { radius, .. } if (radius - 0.2).abs() < 1e-12
    ));
    let (roll, _, _) = wheel.pose.rpy();
    assert_relative_eq!(roll, std::f64::consts::FRAC_PI_2, epsilon = 1e-12);

    let drive = robot.plugin("diff_drive").expect("plugin");
    assert_eq!(drive.filename, "libdiffdrive_plugin.so");
    assert_eq!(drive.param("left_joint"), Some("left_wheel_hinge"));
    assert_eq!(drive.param("torque"), Some("5"));
}

#[test]
fn test_parsing_is_idempotent() {
    let first = load_world_str(ROBOT_WORLD).expect("first load");
    let second = load_world_str(ROBOT_WORLD).expect("second load");
    assert_eq!(first, second);
}

#[test]
fn test_collision_without_geometry_fails_link() {
    let err = load_model_str(
        r#"<model name="robot1">
            <link name="chassis">
                <collision name="chassis_collision"/>
            </link>
        </model>"#,
    )
    .unwrap_err();

    match &err {
        SdfError::MissingRequiredField { field, context } => {
            assert_eq!(*field, "geometry");
            assert_eq!(
                context,
                "collision 'chassis_collision' in link 'chassis' in model 'robot1'"
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("geometry"));
}

#[test]
fn test_bad_pose_in_document() {
    let err = load_model_str(r#"<model name="m"><pose>1 2</pose></model>"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedPose);
    assert!(err.to_string().contains("\"1 2\""));
}

#[test]
fn test_joint_resolution_is_order_independent() {
    let joints_first = r#"<model name="m">
        <joint name="j" type="prismatic"><parent link="a"/><child link="b"/></joint>
        <link name="a"/>
        <link name="b"/>
    </model>"#;
    let links_first = r#"<model name="m">
        <link name="a"/>
        <link name="b"/>
        <joint name="j" type="prismatic"><parent link="a"/><child link="b"/></joint>
    </model>"#;

    let one = load_model_str(joints_first).expect("joints first");
    let two = load_model_str(links_first).expect("links first");
    assert_eq!(one, two);
}

#[test]
fn test_joint_to_link_of_other_model_is_unresolved() {
    let err = load_world_str(
        r#"<world name="w">
            <model name="a"><link name="base"/></model>
            <model name="b">
                <link name="arm"/>
                <joint name="j" type="fixed"><parent link="base"/><child link="arm"/></joint>
            </model>
        </world>"#,
    )
    .unwrap_err();
    match err {
        SdfError::UnresolvedLinkReference {
            link,
            joint,
            context,
        } => {
            assert_eq!(link, "base");
            assert_eq!(joint, "j");
            assert_eq!(context, "model 'b' in world 'w'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_duplicate_names_per_scope() {
    let cases = [
        (
            r#"<world name="w"><model name="m"/><model name="m"/></world>"#,
            "model",
        ),
        (
            r#"<world name="w"><model name="m">
                <link name="a"/><link name="b"/>
                <joint name="j" type="fixed"><parent link="a"/><child link="b"/></joint>
                <joint name="j" type="fixed"><parent link="b"/><child link="a"/></joint>
            </model></world>"#,
            "joint",
        ),
        (
            r#"<world name="w">
                <plugin name="p" filename="a.so"/><plugin name="p" filename="b.so"/>
            </world>"#,
            "plugin",
        ),
    ];
    for (xml, expected) in cases {
        match load_world_str(xml).unwrap_err() {
            SdfError::DuplicateName { kind, .. } => assert_eq!(kind, expected),
            other => panic!("unexpected error for {expected}: {other:?}"),
        }
    }
}

#[test]
fn test_unknown_types() {
    let err = load_model_str(
        r#"<model name="m">
            <link name="a"><sensor name="s" type="sonar"/></link>
        </model>"#,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownSensorType);
    assert!(err.to_string().contains("in link 'a' in model 'm'"));

    let err = load_model_str(
        r#"<model name="m">
            <link name="a"/><link name="b"/>
            <joint name="j" type="piston"><parent link="a"/><child link="b"/></joint>
        </model>"#,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownJointType);
}

#[test]
fn test_unknown_elements_are_skipped() {
    let xml = r#"<world name="w">
        <light name="sun" type="directional"/>
        <gui fullscreen="false"/>
        <model name="m">
            <link name="l"><velocity_decay/></link>
        </model>
    </world>"#;

    let quiet = load_world_str(xml).expect("default options");
    let loud = SdfLoader::with_options(ParseOptions::new().with_unknown_element_warnings(true))
        .world_from_str(xml)
        .expect("warning options");
    assert_eq!(quiet, loud);
}

#[test]
fn test_root_selection() {
    let err = load_model_str(r#"<world name="w"/>"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootNameMismatch);

    let err = load_world_str(r#"<sdf version="1.0"><model name="m"/></sdf>"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RootNameMismatch);

    let err = load_world_str(r#"<sdf version="1.0"/>"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRootElement);

    let model = load_model_str(r#"<sdf version="1.0"><model name="m"/></sdf>"#).unwrap();
    assert_eq!(model.name(), "m");

    let err = load_world_str("<world name='w'>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedXml);
}

#[test]
fn test_file_entry_points() {
    let dir = tempfile::tempdir().expect("tempdir");

    let world_path = dir.path().join("robot.world");
    std::fs::write(&world_path, ROBOT_WORLD).expect("write world");
    let from_file = load_world_file(&world_path).expect("world file");
    let from_str = load_world_str(ROBOT_WORLD).expect("world string");
    assert_eq!(from_file, from_str);

    let model_path = dir.path().join("box.sdf");
    std::fs::write(
        &model_path,
        r#"<sdf><model name="box"><link name="body"/></model></sdf>"#,
    )
    .expect("write model");
    let model = load_model_file(&model_path).expect("model file");
    assert_eq!(model.link_names().collect::<Vec<_>>(), ["body"]);

    let err = load_world_file(dir.path().join("absent.world")).unwrap_err();
    assert!(matches!(err, SdfError::FileNotFound { .. }));
    assert!(err.to_string().contains("absent.world"));
}
