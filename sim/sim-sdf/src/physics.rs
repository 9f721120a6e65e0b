//! World-level `<physics>` and `<scene>` parsers.

use crate::config::ParseOptions;
use crate::error::{Result, SdfError};
use crate::parser::report_unknown_children;
use crate::scalar::{
    attr_bool, attr_color, attr_double, attr_non_negative, attr_uint, attr_vector3, child_double,
    child_uint, require_string,
};
use crate::types::{Color, OdeSolverType, OpenDynamicsEngine, Physics, Scene};
use crate::xml::XmlElement;

/// Parse a `<physics>` element.
///
/// # Errors
///
/// [`SdfError::MissingRequiredField`] without a `type` attribute, or any
/// error of the nested `<ode>` block.
pub fn parse_physics(e: &XmlElement, options: &ParseOptions) -> Result<Physics> {
    report_unknown_children(
        e,
        &["gravity", "update_rate", "max_contacts", "ode"],
        options,
    );

    let defaults = Physics::default();
    let engine = require_string(e, "type")?;
    let scoped = |err: SdfError| err.within(&e.describe());

    let gravity = match e.unique_child("gravity")? {
        Some(g) => attr_vector3(g, "xyz", defaults.gravity).map_err(scoped)?,
        None => defaults.gravity,
    };

    let update_rate = child_double(e, "update_rate", defaults.update_rate)?;
    if update_rate < 0.0 {
        return Err(SdfError::malformed_field(
            "update_rate",
            update_rate.to_string(),
            "must not be negative",
            e.describe(),
        ));
    }

    let ode = e
        .unique_child("ode")?
        .map(|o| parse_ode(o, options))
        .transpose()
        .map_err(scoped)?;
    if ode.is_some() && engine != "ode" {
        tracing::debug!("physics engine '{}' has an <ode> block", engine);
    }

    Ok(Physics {
        engine,
        gravity,
        update_rate,
        max_contacts: child_uint(e, "max_contacts", defaults.max_contacts)?,
        ode,
    })
}

/// Parse an `<ode>` block.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for an unknown solver type or a non-positive
/// time step.
pub fn parse_ode(e: &XmlElement, options: &ParseOptions) -> Result<OpenDynamicsEngine> {
    report_unknown_children(e, &["solver", "constraints"], options);

    let mut ode = OpenDynamicsEngine::default();
    let scoped = |err: SdfError| err.within(&e.name);

    if let Some(solver) = e.unique_child("solver")? {
        parse_solver(solver, &mut ode).map_err(scoped)?;
    }

    if let Some(constraints) = e.unique_child("constraints")? {
        parse_constraints(constraints, &mut ode).map_err(scoped)?;
    }

    Ok(ode)
}

fn parse_solver(e: &XmlElement, ode: &mut OpenDynamicsEngine) -> Result<()> {
    if let Some(kind) = e.attribute("type") {
        ode.solver_type = OdeSolverType::from_str(kind.trim()).ok_or_else(|| {
            SdfError::malformed_field("type", kind, "expected quick or world", e.describe())
        })?;
    }

    ode.dt = attr_double(e, "dt", ode.dt)?;
    if ode.dt <= 0.0 {
        return Err(SdfError::malformed_field(
            "dt",
            ode.dt.to_string(),
            "time step must be positive",
            e.describe(),
        ));
    }
    ode.iters = attr_uint(e, "iters", ode.iters)?;
    ode.precon_iters = attr_uint(e, "precon_iters", ode.precon_iters)?;
    ode.sor = attr_double(e, "sor", ode.sor)?;
    Ok(())
}

fn parse_constraints(e: &XmlElement, ode: &mut OpenDynamicsEngine) -> Result<()> {
    ode.cfm = attr_non_negative(e, "cfm", ode.cfm)?;
    ode.erp = attr_double(e, "erp", ode.erp)?;
    ode.contact_max_correcting_vel = attr_non_negative(
        e,
        "contact_max_correcting_vel",
        ode.contact_max_correcting_vel,
    )?;
    ode.contact_surface_layer =
        attr_non_negative(e, "contact_surface_layer", ode.contact_surface_layer)?;
    Ok(())
}

/// Parse a `<scene>` element.
///
/// # Errors
///
/// [`SdfError::MalformedField`] for unparsable colors or flags.
pub fn parse_scene(e: &XmlElement, options: &ParseOptions) -> Result<Scene> {
    report_unknown_children(e, &["ambient", "background", "shadows", "grid"], options);

    let defaults = Scene::default();
    let scoped = |err: SdfError| err.within(&e.name);

    let color = |tag: &'static str, default: Color| -> Result<Color> {
        match e.unique_child(tag)? {
            Some(c) => attr_color(c, "rgba", default).map_err(scoped),
            None => Ok(default),
        }
    };
    let flag = |tag: &'static str, default: bool| -> Result<bool> {
        match e.unique_child(tag)? {
            Some(f) => attr_bool(f, "enabled", default).map_err(scoped),
            None => Ok(default),
        }
    };

    Ok(Scene {
        ambient: color("ambient", defaults.ambient)?,
        background: color("background", defaults.background)?,
        shadows: flag("shadows", defaults.shadows)?,
        grid: flag("grid", defaults.grid)?,
    })
}
