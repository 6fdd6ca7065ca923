//! Horizontal Mover
//!
//! Advances an entity in the XY plane in substeps no longer than its radius,
//! so it can never skip over a wall thinner than itself. A blocked substep
//! either slides along the obstruction or stops the entity.
//!
//! ```text
//! move_entity
//!   ├── xy_move     substeps, validity test, slide
//!   ├── friction    ground friction unless the slide already applied it
//!   └── move_z      gravity and clamping (vertical.rs)
//! ```

use std::collections::BTreeSet;

use tracing::trace;

use crate::config::{PhysicsConfig, MIN_ENTITY_RADIUS};
use crate::core::geometry::Seg2;
use crate::core::vec::Vec2;
use crate::partition::blockmap::IterationStatus;
use crate::world::entity::{Blocker, Entity};
use crate::world::line::LineId;
use crate::world::World;

use super::events::{EventQueue, PhysicsEvent};
use super::linker::{entities_in_box, lines_in_box, link_to_world, unlink_from_world};
use super::opening::{line_blocks, LineOpening};
use super::vertical::move_z;

// =============================================================================
// POSITION TEST
// =============================================================================

/// Result of testing a candidate position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TryMoveData {
    /// The entity fits at the position
    pub success: bool,
    /// Highest floor under the box at the position
    pub highest_floor_z: f64,
    /// Lowest ceiling over the box at the position
    pub lowest_ceiling_z: f64,
    /// First obstruction found
    pub blocking: Option<Blocker>,
}

impl TryMoveData {
    fn blocked(mut self, blocker: Blocker) -> Self {
        self.success = false;
        self.blocking = Some(blocker);
        self
    }
}

/// Test whether the entity's box fits with its center at `position`.
///
/// The entity keeps its current Z. Lines are checked through the opening
/// predicate, then the sector fit, then solid entities.
pub fn is_position_valid(world: &World, entity: &Entity, position: Vec2) -> TryMoveData {
    let footprint = entity.box2_at(position);
    let center = world.sector(world.subsector(world.bsp.find_subsector(position)).sector);

    let mut data = TryMoveData {
        success: true,
        highest_floor_z: center.floor.z,
        lowest_ceiling_z: center.ceiling.z,
        blocking: None,
    };

    for line_id in lines_in_box(world, &footprint) {
        let line = world.line(line_id);
        if !line.segment.intersects_box(&footprint) {
            continue;
        }
        if line_blocks(world, line, entity) {
            return data.blocked(Blocker::Line(line_id));
        }
        if let Some(opening) = LineOpening::of_line(world, line) {
            data.highest_floor_z = data.highest_floor_z.max(opening.floor_z);
            data.lowest_ceiling_z = data.lowest_ceiling_z.min(opening.ceiling_z);
        }
    }

    if data.lowest_ceiling_z - data.highest_floor_z < entity.height() {
        data.success = false;
        return data;
    }

    if !entity.flags.solid && !entity.flags.missile {
        return data;
    }

    let step = entity.max_step_height();
    for other_id in entities_in_box(world, &footprint) {
        let Some(other) = world.entity(other_id) else {
            continue;
        };
        if other_id == entity.id || !other.flags.solid || !other.box2().overlaps(&footprint) {
            continue;
        }
        if other.bottom() >= entity.top() || other.top() <= entity.bottom() {
            continue;
        }
        let too_tall = other.top() - entity.bottom() > step;
        let no_headroom = data.lowest_ceiling_z - other.top() < entity.height();
        if too_tall || no_headroom {
            return data.blocked(Blocker::Entity(other_id));
        }
    }

    data
}

// =============================================================================
// MOVE
// =============================================================================

/// Per-tick entity move: XY, friction, Z.
pub fn move_entity(world: &mut World, entity: &mut Entity, config: &PhysicsConfig, events: &mut EventQueue) {
    entity.prev_position = entity.position;
    entity.move_start_floor = entity.highest_floor;
    entity.z_smoothing = false;
    entity.blocking = None;

    let mut slid = false;
    if !entity.velocity.xy().is_zero() {
        slid = xy_move(world, entity, config, events);
    }

    if !slid {
        apply_friction(entity, config);
    }
    clamp_min_movement(entity, config);

    move_z(world, entity, config);
}

/// Upper limit on substeps in one tick. Velocities past
/// `MAX_SUBSTEPS * (radius - 0.5)` take longer steps instead of more of them.
pub const MAX_SUBSTEPS: u32 = 1024;

/// Number of substeps for a velocity, each no longer than `radius - 0.5`
/// while the count stays under [`MAX_SUBSTEPS`].
pub fn substep_count(velocity: Vec2, radius: f64) -> u32 {
    debug_assert!(radius > MIN_ENTITY_RADIUS, "radius {radius} too small");
    debug_assert!(velocity.x.is_finite() && velocity.y.is_finite(), "non-finite velocity {velocity:?}");
    let mut bound = radius - MIN_ENTITY_RADIUS;
    if bound <= 0.0 {
        bound = MIN_ENTITY_RADIUS;
    }
    let count = (velocity.max_abs_component() / bound).ceil();
    if count.is_nan() {
        return 1;
    }
    count.clamp(1.0, MAX_SUBSTEPS as f64) as u32
}

/// Move in substeps. Returns true if a slide reoriented the velocity.
fn xy_move(world: &mut World, entity: &mut Entity, config: &PhysicsConfig, events: &mut EventQueue) -> bool {
    let velocity = entity.velocity.xy();
    let mut moves_left = substep_count(velocity, entity.radius());
    let mut step = velocity / moves_left as f64;
    let mut slides = 0;
    let mut reoriented = false;

    while moves_left > 0 {
        let target = entity.position.xy() + step;

        if entity.flags.no_clip {
            relink_at(world, entity, target);
            moves_left -= 1;
            continue;
        }

        let data = is_position_valid(world, entity, target);
        if data.success {
            commit_move(world, entity, target, events);
            moves_left -= 1;
            continue;
        }

        entity.blocking = data.blocking;

        if !entity.flags.slides_on_walls || slides >= config.max_slides {
            entity.velocity.set_xy(Vec2::ZERO);
            break;
        }
        slides += 1;

        match slide(world, entity, step, moves_left, config, events) {
            SlideOutcome::Reoriented(new_step) => {
                step = new_step;
                reoriented = true;
            }
            SlideOutcome::AxisMoved(axis_step) => {
                step = axis_step;
                moves_left -= 1;
            }
            SlideOutcome::Stuck => break,
        }
    }

    reoriented
}

/// Unlink, set XY, link. No activation checks.
fn relink_at(world: &mut World, entity: &mut Entity, position: Vec2) {
    unlink_from_world(world, entity);
    entity.position.set_xy(position);
    link_to_world(world, entity, true);
}

/// Move to a validated position and raise cross activations for every
/// special line the center path went over.
fn commit_move(world: &mut World, entity: &mut Entity, target: Vec2, events: &mut EventQueue) {
    let from = entity.position.xy();
    let mut candidates: BTreeSet<LineId> = entity.intersect_special_lines.clone();

    relink_at(world, entity, target);
    candidates.extend(entity.intersect_special_lines.iter().copied());

    let path = Seg2::new(from, target);
    for line_id in candidates {
        let line = world.line(line_id);
        let Some(special) = line.special else {
            continue;
        };
        if !special.activation.is_cross()
            || !special.activation.crossed_by(entity.is_player(), entity.flags.missile)
            || !line.special_available()
        {
            continue;
        }
        if !path.intersects(&line.segment) || !line.segment.different_sides(from, target) {
            continue;
        }

        let from_front = line.segment.on_right(from);
        trace!(entity = entity.id.0, line = line_id.0, from_front, "Line crossed");
        events.push(PhysicsEvent::cross(entity.id, line_id, from_front));
        world.lines[line_id.0 as usize].mark_activated();
    }
}

// =============================================================================
// SLIDE
// =============================================================================

enum SlideOutcome {
    /// New per-substep delta along the wall; the current substep is retried
    Reoriented(Vec2),
    /// An axis-aligned substep was taken
    AxisMoved(Vec2),
    /// Nothing worked, velocity zeroed
    Stuck,
}

/// Nearest blocking line hit by the leading-corner tracers.
fn find_slide_line(world: &World, entity: &Entity, step: Vec2) -> Option<(f64, LineId)> {
    let b = entity.box2();
    let corners = match (step.x >= 0.0, step.y >= 0.0) {
        (true, true) => [b.top_left(), b.top_right(), b.bottom_right()],
        (true, false) => [b.top_right(), b.bottom_right(), b.bottom_left()],
        (false, true) => [b.top_right(), b.top_left(), b.bottom_left()],
        (false, false) => [b.top_left(), b.bottom_left(), b.bottom_right()],
    };

    let mut best: Option<(f64, LineId)> = None;
    for corner in corners {
        let tracer = Seg2::new(corner, corner + step);
        world.blockmap.iterate_segment(&tracer, |block| {
            for &line_id in &block.lines {
                let line = world.line(line_id);
                if !line_blocks(world, line, entity) {
                    continue;
                }
                let Some(t) = tracer.intersection_time(&line.segment) else {
                    continue;
                };
                let closer = match best {
                    None => true,
                    Some((best_t, best_id)) => t < best_t || (t == best_t && line_id < best_id),
                };
                if closer {
                    best = Some((t, line_id));
                }
            }
            IterationStatus::Continue
        });
    }
    best
}

fn slide(
    world: &mut World,
    entity: &mut Entity,
    step: Vec2,
    moves_left: u32,
    config: &PhysicsConfig,
    events: &mut EventQueue,
) -> SlideOutcome {
    let Some((t, line_id)) = find_slide_line(world, entity, step) else {
        return axis_fallback(world, entity, step, events);
    };

    let t_adjusted = t - config.slide_step_back;
    let residual = if t_adjusted > 0.0 {
        let approach = entity.position.xy() + step * t_adjusted;
        if !is_position_valid(world, entity, approach).success {
            return axis_fallback(world, entity, step, events);
        }
        commit_move(world, entity, approach, events);
        step * (1.0 - t_adjusted)
    } else {
        step
    };

    let mut along = world.line(line_id).segment.delta().normalize();
    if along.dot(step) < 0.0 {
        along = -along;
    }

    let remaining = step.project_onto(along) * (moves_left - 1) as f64 + residual.project_onto(along);
    let velocity = entity.velocity.xy();
    entity.velocity.set_xy(along * velocity.dot(along) * config.friction);

    trace!(entity = entity.id.0, line = line_id.0, t, "Slide");
    SlideOutcome::Reoriented(remaining / moves_left as f64)
}

/// Try pure X, then pure Y.
fn axis_fallback(world: &mut World, entity: &mut Entity, step: Vec2, events: &mut EventQueue) -> SlideOutcome {
    let position = entity.position.xy();

    let x_only = Vec2::new(step.x, 0.0);
    if step.x != 0.0 && is_position_valid(world, entity, position + x_only).success {
        commit_move(world, entity, position + x_only, events);
        entity.velocity.y = 0.0;
        return SlideOutcome::AxisMoved(x_only);
    }

    let y_only = Vec2::new(0.0, step.y);
    if step.y != 0.0 && is_position_valid(world, entity, position + y_only).success {
        commit_move(world, entity, position + y_only, events);
        entity.velocity.x = 0.0;
        return SlideOutcome::AxisMoved(y_only);
    }

    entity.velocity.set_xy(Vec2::ZERO);
    SlideOutcome::Stuck
}

// =============================================================================
// FRICTION
// =============================================================================

fn apply_friction(entity: &mut Entity, config: &PhysicsConfig) {
    if (entity.on_ground || entity.flags.no_gravity) && !entity.flags.missile {
        let velocity = entity.velocity.xy();
        entity.velocity.set_xy(velocity * config.friction);
    }
}

fn clamp_min_movement(entity: &mut Entity, config: &PhysicsConfig) {
    if entity.velocity.x.abs() < config.min_movement {
        entity.velocity.x = 0.0;
    }
    if entity.velocity.y.abs() < config.min_movement {
        entity.velocity.y = 0.0;
    }
}

// =============================================================================
// TESTS
// =============================================================================
