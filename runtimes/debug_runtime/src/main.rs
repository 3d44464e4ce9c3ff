// Debug Runtime - headless scripted driver for the grab controller
//
// Runs a fixed-timestep loop against a small physics scene and exercises the
// full grab lifecycle (reach, grab, rotate, carry-distance, release) without
// requiring a rendering surface or human interaction.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use cgmath::{vec3, InnerSpace, Quaternion};
use rapier3d::prelude::{Isometry, SharedShape};
use shipyard::World;
use tracing::info;

use grabber::{
    hud::CrosshairHud,
    physics::{CollisionGroup, PhysicsWorld},
    properties::{AttachedTo, Position, Rotation},
    GrabConfig, GrabSystem, Pose, Time,
};

const TICK_RATE: f32 = 60.0;

#[derive(Parser)]
#[command(name = "debug_runtime")]
#[command(about = "Headless scripted driver for the grab controller")]
struct Args {
    /// Number of fixed-timestep ticks to simulate
    #[arg(short, long, default_value = "240")]
    ticks: u32,

    /// Grab configuration as JSON (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GrabConfig> {
    let Some(path) = path else {
        return Ok(GrabConfig::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    grabber::logging::init_logging("GRABBER_LOG");

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    info!(
        "starting debug runtime: {} ticks, reach {:.0}, hold {:.0}",
        args.ticks, config.max_grab_distance, config.hold_distance
    );

    let mut world = World::new();
    let mut physics = PhysicsWorld::new(vec3(0.0, -981.0, 0.0));

    // Floor and a shelf ledge, both plain scenery.
    let floor = physics.create_fixed_body(Isometry::translation(0.0, -10.0, 0.0), None);
    physics.attach_collider(
        floor,
        SharedShape::cuboid(1000.0, 10.0, 1000.0),
        1.0,
        CollisionGroup::world(),
    );
    let ledge = physics.create_fixed_body(Isometry::translation(0.0, 90.0, -250.0), None);
    physics.attach_collider(
        ledge,
        SharedShape::cuboid(60.0, 10.0, 60.0),
        1.0,
        CollisionGroup::world(),
    );

    // The shelf is a scene-graph parent; the crate starts attached to it and
    // is detached (world transform kept) the moment it is grabbed.
    let shelf = world.add_entity((
        Position(vec3(0.0, 100.0, -250.0)),
        Rotation(Quaternion::new(1.0, 0.0, 0.0, 0.0)),
    ));
    let crate_entity = world.add_entity((AttachedTo {
        parent: shelf,
        local_position: vec3(0.0, 20.0, 0.0),
        local_rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
    },));

    let crate_body =
        physics.create_dynamic_body(Isometry::translation(0.0, 120.0, -250.0), Some(crate_entity));
    physics.attach_collider(
        crate_body,
        SharedShape::ball(20.0),
        1.0,
        CollisionGroup::grabbable(),
    );
    physics.refresh_queries();

    let mut controller = GrabSystem::new(config);
    let mut hud = CrosshairHud::new();

    // Fixed view point at standing eye height, aiming at the shelf.
    let pose = Pose::from_rotation(vec3(0.0, 170.0, 0.0), Quaternion::new(1.0, 0.0, 0.0, 0.0));

    let dt = 1.0 / TICK_RATE;
    for tick in 0..args.ticks {
        let time = Time {
            elapsed: std::time::Duration::from_secs_f32(dt),
            total: std::time::Duration::from_secs_f32(tick as f32 * dt),
        };

        controller.update(&time, &pose, &mut world, &mut physics, Some(&mut hud));

        match tick {
            30 => {
                info!("tick {}: grab", tick);
                controller.grab(&pose, &mut world, &mut physics);
            }
            60..=120 => controller.rotate_held(0.5, 1.0, &mut physics),
            140 => {
                info!("tick {}: pulling the held object closer", tick);
                controller.adjust_hold_distance(-5.0);
            }
            180 => {
                info!("tick {}: release", tick);
                controller.release(&mut world, &mut physics);
            }
            _ => {}
        }

        physics.update(&time);

        if tick % 30 == 0 {
            if let Some(position) = physics.body_position(crate_body) {
                info!(
                    "tick {:3}: crate at ({:6.1}, {:6.1}, {:6.1}) holding={} crosshair={} dist_from_view={:.1}",
                    tick,
                    position.x,
                    position.y,
                    position.z,
                    controller.is_holding(),
                    hud.visible(),
                    (position - pose.position).magnitude()
                );
            }
        }
    }

    info!("debug runtime finished after {} ticks", args.ticks);
    Ok(())
}
