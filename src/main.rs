//! Ghostline - record a clone's run at the terminal, replay it as a ghost
//!
//! Main entry point: window, camera, debug drawing and HUD on top of the
//! simulation plugin.

use bevy::{camera::ScalingMode, diagnostic::FrameTimeDiagnosticsPlugin, prelude::*};
use ghostline::{
    Ghost, GhostlinePlugin, HumanControlled, LevelGeometry, LevelManager, PhysicsControl,
    SessionState, TerminalKiosk, TerminalSession, constants::*, tuning,
};

/// Visible world height in units
const VIEW_HEIGHT: f32 = 20.0;

const BACKGROUND_COLOR: Color = Color::srgb(0.08, 0.08, 0.1);
const SOLID_COLOR: Color = Color::srgb(0.6, 0.6, 0.65);
const HAZARD_COLOR: Color = Color::srgb(0.9, 0.25, 0.2);
const GATE_COLOR: Color = Color::srgb(0.95, 0.75, 0.2);
const PLATE_COLOR: Color = Color::srgb(0.3, 0.8, 0.4);
const KIOSK_COLOR: Color = Color::srgb(0.3, 0.6, 1.0);
const HERO_COLOR: Color = Color::srgb(0.95, 0.95, 0.95);
const GHOST_COLOR: Color = Color::srgba(0.5, 0.8, 1.0, 0.6);
const TEXT_PRIMARY: Color = Color::srgb(0.9, 0.9, 0.9);

/// HUD line with session state, slots and notices
#[derive(Component)]
struct SessionHud;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // --level <name> starts somewhere other than the default scene
    let level = args
        .iter()
        .position(|a| a == "--level")
        .and_then(|i| args.get(i + 1).cloned())
        .unwrap_or_else(|| DEFAULT_SCENE.to_string());

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    resolution: bevy::window::WindowResolution::new(1280, 720)
                        .with_scale_factor_override(1.0),
                    title: "Ghostline".into(),
                    resizable: false,
                    ..default()
                }),
                ..default()
            }),
            FrameTimeDiagnosticsPlugin::default(),
        ))
        .insert_resource(ClearColor(BACKGROUND_COLOR))
        .insert_resource(tuning::load_global_tuning())
        .insert_resource(LevelManager::starting_at(&level))
        .add_plugins(GhostlinePlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, (follow_hero, draw_world, update_hud).chain())
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Transform::from_xyz(0.0, 0.0, 0.0),
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: VIEW_HEIGHT * PIXELS_PER_UNIT,
            },
            ..OrthographicProjection::default_2d()
        }),
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(TEXT_PRIMARY),
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        },
        SessionHud,
    ));
}

fn follow_hero(
    heroes: Query<&Transform, (With<HumanControlled>, Without<Camera2d>)>,
    mut cameras: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(hero) = heroes.single() else {
        return;
    };
    for mut camera in &mut cameras {
        camera.translation.x = hero.translation.x;
        camera.translation.y = hero.translation.y + 2.0 * PIXELS_PER_UNIT;
    }
}

fn rect(gizmos: &mut Gizmos, bounds: &ghostline::Aabb, color: Color) {
    gizmos.rect_2d(
        Isometry2d::from_translation(bounds.center() * PIXELS_PER_UNIT),
        bounds.half_extents() * 2.0 * PIXELS_PER_UNIT,
        color,
    );
}

/// Outline the level and every character with gizmos
fn draw_world(
    mut gizmos: Gizmos,
    geometry: Res<LevelGeometry>,
    kiosks: Query<&TerminalKiosk>,
    characters: Query<(&PhysicsControl, Has<Ghost>)>,
) {
    for solid in &geometry.solids {
        rect(&mut gizmos, solid, SOLID_COLOR);
    }
    for hazard in &geometry.hazards {
        rect(&mut gizmos, hazard, HAZARD_COLOR);
    }
    for gate in geometry.gates.iter().filter(|g| !g.is_open()) {
        rect(&mut gizmos, &gate.bounds, GATE_COLOR);
    }
    for plate in &geometry.plates {
        rect(&mut gizmos, &plate.bounds, PLATE_COLOR);
    }
    for kiosk in &kiosks {
        rect(&mut gizmos, &kiosk.zone, KIOSK_COLOR);
    }
    for (physics, is_ghost) in &characters {
        let color = if is_ghost { GHOST_COLOR } else { HERO_COLOR };
        rect(&mut gizmos, &physics.bounds(), color);
    }
}

fn update_hud(session: Res<TerminalSession>, mut hud: Query<&mut Text, With<SessionHud>>) {
    let Ok(mut text) = hud.single_mut() else {
        return;
    };

    let slots: Vec<String> = session
        .slot_profiles()
        .iter()
        .enumerate()
        .map(|(i, profile)| {
            let marker = if i == session.selected_slot() { ">" } else { " " };
            format!("{}{}: {}", marker, i + 1, profile.unwrap_or("empty"))
        })
        .collect();

    let help = match session.state() {
        SessionState::TerminalPaused => "1-9 record a clone, C play, Tab next slot, Esc leave",
        SessionState::Recording => "X stop recording",
        _ => "A/D move, Space jump, Shift dash, E interact, 1-9 switch clone",
    };

    text.0 = format!(
        "{:?}  [{}]\n{}\n{}",
        session.state(),
        slots.join("  "),
        help,
        session.current_notice().unwrap_or("")
    );
}
