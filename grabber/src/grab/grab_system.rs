use serde::{Deserialize, Serialize};
use shipyard::{EntityId, World};

use super::capabilities::{GrabPhysics, PhysicsHandoff};
use crate::{
    grab_log, hierarchy,
    hud::HudSink,
    pose::{Pose, Rotator},
    properties::Grabbed,
    time::Time,
};
use rapier3d::prelude::RigidBodyHandle;

pub const HOLD_DISTANCE_MIN: f32 = 50.0;
pub const HOLD_DISTANCE_MAX: f32 = 250.0;
/// World units of carry distance per unit of scroll input
pub const HOLD_DISTANCE_STEP: f32 = 10.0;

/// Configuration for the grab system
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabConfig {
    /// How far ahead of the view point the reach sweep travels
    pub max_grab_distance: f32,
    /// Radius of the swept sphere
    pub grab_radius: f32,
    /// Distance at which a held object is carried; always within
    /// [`HOLD_DISTANCE_MIN`, `HOLD_DISTANCE_MAX`]
    pub hold_distance: f32,
}

impl Default for GrabConfig {
    fn default() -> Self {
        GrabConfig {
            max_grab_distance: 400.0,
            grab_radius: 100.0,
            hold_distance: 200.0,
        }
    }
}

/// The object currently being carried
#[derive(Clone, Copy, Debug)]
pub struct HeldObject {
    pub entity: EntityId,
    pub body: RigidBodyHandle,
    /// Target orientation driven into the handoff each tick; mutated by
    /// rotation adjustments while carrying
    pub target_orientation: Rotator,
}

/// Grab interaction controller: detects reachable grabbables, publishes the
/// crosshair signal, and runs the grab/hold/release state machine.
///
/// All operations run synchronously inside the externally driven frame
/// callback; no operation may abort the frame loop. Failures degrade to
/// no-ops plus, at most, a diagnostic log.
pub struct GrabSystem {
    config: GrabConfig,
    held: Option<HeldObject>,
    handoff_warned: bool,
}

impl GrabSystem {
    pub fn new(mut config: GrabConfig) -> Self {
        // Externally supplied configs (deserialized files included) must not
        // bypass the carry-distance bounds.
        config.hold_distance = config
            .hold_distance
            .clamp(HOLD_DISTANCE_MIN, HOLD_DISTANCE_MAX);
        GrabSystem {
            config,
            held: None,
            handoff_warned: false,
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(GrabConfig::default())
    }

    /// Per-frame update. Runs the reach sweep, publishes the crosshair
    /// signal for the same sweep result, and drives the held object's
    /// target pose.
    pub fn update(
        &mut self,
        _time: &Time,
        pose: &Pose,
        world: &mut World,
        physics: &mut dyn GrabPhysics,
        hud: Option<&mut dyn HudSink>,
    ) {
        let reach = physics.sweep_grabbable(
            pose,
            self.config.max_grab_distance,
            self.config.grab_radius,
        );
        if let Some(hud) = hud {
            hud.show_crosshair(reach.is_some());
        }

        let Some(held) = self.held else {
            return;
        };

        let target_position = pose.position + pose.forward * self.config.hold_distance;
        let Some(handoff) = self.resolve_handoff(physics) else {
            return;
        };

        if handoff.grabbed_body().is_none() {
            // Binding invalidated externally (body destroyed, scene unload):
            // tear down our side so no dangling state survives.
            handoff.release();
            self.held = None;
            remove_grabbed_marker(world, held.entity);
            grab_log!(
                debug,
                "grab binding invalidated externally, releasing entity {:?}",
                held.entity
            );
            return;
        }

        handoff.set_target(target_position, held.target_orientation);
    }

    /// Try to grab whatever the reach sweep currently hits. No-op while
    /// already holding, when the handoff capability is unresolved, or when
    /// nothing grabbable is in reach.
    pub fn grab(&mut self, pose: &Pose, world: &mut World, physics: &mut dyn GrabPhysics) {
        if self.held.is_some() {
            return;
        }
        if self.resolve_handoff(physics).is_none() {
            return;
        }

        // Recomputed at call time; the last tick's result is never trusted.
        let Some(hit) = physics.sweep_grabbable(
            pose,
            self.config.max_grab_distance,
            self.config.grab_radius,
        ) else {
            grab_log!(debug, "grab requested with nothing in reach");
            return;
        };

        physics.activate_body(hit.body);

        // World-side bookkeeping happens only once the binding exists, so a
        // handoff that vanishes between lookups cannot strand a marker or a
        // detached entity while we stay idle.
        let orientation = Rotator::from(pose.rotation);
        let Some(handoff) = physics.handoff() else {
            return;
        };
        handoff.grab_at(hit.body, hit.impact_point, orientation);

        world.add_component(hit.entity, (Grabbed,));
        hierarchy::detach_preserving_world(world, hit.entity);
        self.held = Some(HeldObject {
            entity: hit.entity,
            body: hit.body,
            target_orientation: orientation,
        });
        grab_log!(
            info,
            "grabbed entity {:?} at ({:.2}, {:.2}, {:.2})",
            hit.entity,
            hit.impact_point.x,
            hit.impact_point.y,
            hit.impact_point.z
        );
    }

    /// Release the held object. Silent no-op while idle.
    pub fn release(&mut self, world: &mut World, physics: &mut dyn GrabPhysics) {
        let Some(held) = self.held else {
            return;
        };
        let Some(handoff) = self.resolve_handoff(physics) else {
            return;
        };

        handoff.release();
        self.held = None;
        remove_grabbed_marker(world, held.entity);
        grab_log!(info, "released entity {:?}", held.entity);
    }

    /// Add the deltas to the held object's target pitch and yaw. Free
    /// rotation is intended: no clamping. Silent no-op while idle.
    pub fn rotate_held(&mut self, pitch_delta: f32, yaw_delta: f32, physics: &mut dyn GrabPhysics) {
        let Some(mut held) = self.held else {
            return;
        };
        let Some(handoff) = self.resolve_handoff(physics) else {
            return;
        };
        let (Some(position), Some(mut orientation)) =
            (handoff.target_position(), handoff.target_orientation())
        else {
            return;
        };

        orientation.pitch += pitch_delta;
        orientation.yaw += yaw_delta;
        handoff.set_target(position, orientation);

        held.target_orientation = orientation;
        self.held = Some(held);
    }

    /// Adjust the carry distance. Valid in any state; takes effect on the
    /// next tick's target computation.
    pub fn adjust_hold_distance(&mut self, scroll_amount: f32) {
        self.config.hold_distance = (self.config.hold_distance
            + scroll_amount * HOLD_DISTANCE_STEP)
            .clamp(HOLD_DISTANCE_MIN, HOLD_DISTANCE_MAX);
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn held_entity(&self) -> Option<EntityId> {
        self.held.map(|held| held.entity)
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    /// Look up the handoff capability, logging a configuration warning once
    /// per occurrence of it going missing.
    fn resolve_handoff<'a>(
        &mut self,
        physics: &'a mut dyn GrabPhysics,
    ) -> Option<&'a mut dyn PhysicsHandoff> {
        match physics.handoff() {
            Some(handoff) => {
                self.handoff_warned = false;
                Some(handoff)
            }
            None => {
                if !self.handoff_warned {
                    grab_log!(
                        warn,
                        "physics handoff capability is unresolved, grab operations disabled"
                    );
                    self.handoff_warned = true;
                }
                None
            }
        }
    }
}

fn remove_grabbed_marker(world: &mut World, entity: EntityId) {
    world.remove::<(Grabbed,)>(entity);
}
