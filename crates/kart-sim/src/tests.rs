//! Tests for the race engine, kart physics, laps, items and remote mirroring.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use kart_core::commands::PlayerCommand;
use kart_core::components::Kart;
use kart_core::constants::*;
use kart_core::enums::*;
use kart_core::events::{PresenceEvent, RaceEvent, RemoteKartState};
use kart_core::input::InputState;
use kart_core::state::{KartView, RaceSnapshot};
use kart_core::types::{KartId, Position};
use kart_track::{estimate_full, PathCurve, ProgressTracker};

use crate::engine::{SimConfig, SimulationEngine};
use crate::items::RespawnQueue;
use crate::laps::{crosses_seam, LapTracker};
use crate::physics::{self, KartTuning};

fn idle() -> InputState {
    InputState::new()
}

fn started_engine(seed: u64) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        seed,
        ..Default::default()
    });
    engine.queue_command(PlayerCommand::StartRace {
        name: "Tester".into(),
        color: 0xff0000,
    });
    engine.tick(&idle());
    engine
}

/// Ground-level point on the centre line.
fn on_track(curve: &PathCurve, t: f64) -> Position {
    let p = curve.point_at(t);
    Position::new(p.x, KART_GROUND_OFFSET, p.z)
}

/// Heading that points along the direction of travel at `t`.
fn heading_along(curve: &PathCurve, t: f64) -> f64 {
    let tangent = curve.tangent_at(t);
    tangent.x.atan2(tangent.z)
}

/// Heading perpendicular to the track at `t`, plus that unit direction.
fn heading_across(curve: &PathCurve, t: f64) -> (f64, f64, f64) {
    let tangent = curve.tangent_at(t);
    let (nx, nz) = (tangent.z, -tangent.x);
    let len = (nx * nx + nz * nz).sqrt();
    let (nx, nz) = (nx / len, nz / len);
    (nx.atan2(nz), nx, nz)
}

fn local_view(snapshot: &RaceSnapshot) -> &KartView {
    snapshot
        .karts
        .iter()
        .find(|k| k.origin == KartOrigin::Local)
        .expect("local kart in snapshot")
}

fn test_kart(speed: f64, heading: f64) -> Kart {
    Kart {
        id: KartId::local(),
        name: "Tester".into(),
        color: 0,
        heading,
        speed,
        progress: 0.0,
        origin: KartOrigin::Local,
    }
}

fn remote_state(id: &str, x: f64, z: f64) -> RemoteKartState {
    RemoteKartState {
        id: KartId::new(id),
        name: id.to_uppercase(),
        color: 0x00ff00,
        x,
        z,
        angle: 0.25,
        speed: 0.75,
    }
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut engine_a = started_engine(12345);
    let mut engine_b = started_engine(12345);

    let mut input = InputState::new().with(Action::Accelerate);
    for tick in 0..600 {
        input.set(Action::SteerLeft, (tick / 40) % 2 == 0);
        input.set(Action::UseItem, tick % 30 == 0);

        let json_a = serde_json::to_string(&engine_a.tick(&input)).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick(&input)).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
}

#[test]
fn test_snapshot_serializes_round_trip() {
    let mut engine = started_engine(1);
    engine.apply_presence(&PresenceEvent::Joined(remote_state("player_b", 5.0, 5.0)));
    let snapshot = engine.tick(&InputState::new().with(Action::Accelerate));

    let json = serde_json::to_string(&snapshot).unwrap();
    let back: RaceSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.phase, snapshot.phase);
    assert_eq!(back.time.tick, snapshot.time.tick);
    assert_eq!(back.karts.len(), 2);
    assert_eq!(back.karts[1].id, KartId::new("player_b"));
    assert_eq!(back.item_boxes.len(), ITEM_BOX_LOCATIONS.len());
    assert_eq!(back.local.map(|l| l.id), Some(KartId::local()));
}

// ---- Phases and commands ----

#[test]
fn test_lobby_has_boxes_but_no_local_kart() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let snapshot = engine.tick(&InputState::new().with(Action::Accelerate));

    assert_eq!(snapshot.phase, GamePhase::Lobby);
    assert!(snapshot.karts.is_empty());
    assert!(snapshot.local.is_none());
    assert_eq!(snapshot.time.tick, 0, "Lobby does not advance time");
    assert!(engine.local_motion().is_none());

    let indices: Vec<usize> = snapshot.item_boxes.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    for item_box in &snapshot.item_boxes {
        assert!(item_box.active);
        assert_eq!(item_box.t, ITEM_BOX_LOCATIONS[item_box.index]);
        assert!((item_box.position.y - ITEM_BOX_HEIGHT).abs() < 1e-12);
    }
}

#[test]
fn test_start_race_spawns_local_kart_at_start_line() {
    let mut engine = started_engine(1);
    let snapshot = engine.tick(&idle());

    assert_eq!(snapshot.phase, GamePhase::Racing);
    let kart = local_view(&snapshot);
    assert_eq!(kart.name, "Tester");
    assert_eq!(kart.color, 0xff0000);
    assert!(kart.position.x.abs() < 1e-9 && kart.position.z.abs() < 1e-9);
    assert!((kart.position.y - KART_GROUND_OFFSET).abs() < 1e-12);

    let local = snapshot.local.unwrap();
    assert_eq!(local.laps_completed, 0);
    assert_eq!(local.current_lap, 1);
    assert_eq!(local.total_laps, DEFAULT_TOTAL_LAPS);
    assert_eq!(local.held_item, None);

    let motion = engine.local_motion().unwrap();
    assert!(motion.x.abs() < 1e-9 && motion.z.abs() < 1e-9);
    assert_eq!(motion.speed, 0.0);
}

#[test]
fn test_local_tracker_resyncs_at_twice_tuned_half_width() {
    let mut engine = SimulationEngine::new(SimConfig {
        tuning: KartTuning {
            track_half_width: 5.0,
            ..Default::default()
        },
        ..Default::default()
    });
    engine.queue_command(PlayerCommand::StartRace {
        name: "Tester".into(),
        color: 0,
    });
    engine.tick(&idle());
    assert_eq!(engine.local_tracker().unwrap().resync_distance(), 10.0);
}

#[test]
fn test_start_race_ignored_while_racing() {
    let mut engine = started_engine(1);
    engine.queue_command(PlayerCommand::StartRace {
        name: "Again".into(),
        color: 1,
    });
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.karts.len(), 1);
    assert_eq!(local_view(&snapshot).name, "Tester");
}

#[test]
fn test_pause_stops_simulation() {
    let mut engine = started_engine(1);
    let accelerate = InputState::new().with(Action::Accelerate);
    for _ in 0..10 {
        engine.tick(&accelerate);
    }
    let before = engine.tick(&accelerate);

    engine.queue_command(PlayerCommand::Pause);
    for _ in 0..20 {
        let snapshot = engine.tick(&accelerate);
        assert_eq!(snapshot.phase, GamePhase::Paused);
        assert_eq!(snapshot.time.tick, before.time.tick);
        assert_eq!(local_view(&snapshot).position, local_view(&before).position);
    }

    engine.queue_command(PlayerCommand::Resume);
    let after = engine.tick(&accelerate);
    assert_eq!(after.phase, GamePhase::Racing);
    assert_eq!(after.time.tick, before.time.tick + 1);
}

#[test]
fn test_time_advances_one_tick_per_frame() {
    let mut engine = started_engine(1);
    for _ in 0..TICK_RATE - 1 {
        engine.tick(&idle());
    }
    let time = engine.time();
    assert_eq!(time.tick, TICK_RATE as u64);
    assert!((time.elapsed_secs - 1.0).abs() < 1e-9);
}

// ---- Physics ----

#[test]
fn test_step_accepts_move_inside_track() {
    let curve = PathCurve::default_circuit();
    let t = 0.3;
    let mut kart = test_kart(1.0, heading_along(&curve, t));
    let mut position = on_track(&curve, t);
    let start = position;
    let mut tracker = ProgressTracker::starting_at(t);

    let outcome = physics::step(
        &mut kart,
        &mut position,
        &mut tracker,
        &idle(),
        &curve,
        &KartTuning::default(),
    );

    assert!(outcome.accepted);
    assert!((kart.speed - KART_FRICTION).abs() < 1e-12);
    assert!((start.planar_distance_to(&position) - KART_FRICTION).abs() < 1e-9);
    assert!(kart.progress > t, "Driving forward increases progress");
    assert_eq!(kart.progress, tracker.t());
}

#[test]
fn test_step_rejects_move_past_track_edge() {
    // Kart 11.9 units off the centre line heading straight out: the
    // candidate lands ~14.8 out, past the half width of 12.
    let curve = PathCurve::default_circuit();
    let t = 0.3;
    let (heading, nx, nz) = heading_across(&curve, t);
    let center = on_track(&curve, t);
    let mut position = Position::new(center.x + nx * 11.9, center.y, center.z + nz * 11.9);
    let start = position;
    let mut kart = test_kart(3.0, heading);
    let mut tracker = ProgressTracker::starting_at(t);

    let outcome = physics::step(
        &mut kart,
        &mut position,
        &mut tracker,
        &idle(),
        &curve,
        &KartTuning::default(),
    );

    assert!(!outcome.accepted);
    assert!(outcome.track.lateral_distance > TRACK_HALF_WIDTH);
    assert_eq!(position, start, "Rejected move leaves the kart in place");
    let prior = 3.0 * KART_FRICTION;
    assert!((outcome.attempted_speed - prior).abs() < 1e-12);
    assert!((kart.speed + KART_BOUNCE * prior).abs() < 1e-12);
    assert_eq!(kart.heading, heading);
}

#[test]
fn test_step_rejection_restores_heading() {
    let curve = PathCurve::default_circuit();
    let t = 0.3;
    let (heading, nx, nz) = heading_across(&curve, t);
    let center = on_track(&curve, t);
    let mut position = Position::new(center.x + nx * 11.9, center.y, center.z + nz * 11.9);
    let mut kart = test_kart(3.0, heading);
    let mut tracker = ProgressTracker::starting_at(t);

    // A small steer still points the candidate off the track.
    let outcome = physics::step(
        &mut kart,
        &mut position,
        &mut tracker,
        &InputState::new().with(Action::SteerLeft),
        &curve,
        &KartTuning::default(),
    );
    assert!(!outcome.accepted);
    assert_eq!(kart.heading, heading);
}

#[test]
fn test_step_never_accepts_position_outside_track() {
    let curve = PathCurve::default_circuit();
    let tuning = KartTuning::default();
    let mut rng = ChaCha8Rng::seed_from_u64(99);

    let mut kart = test_kart(0.0, heading_along(&curve, 0.0));
    let mut position = on_track(&curve, 0.0);
    let mut tracker = ProgressTracker::starting_at(0.0);
    let mut input = InputState::new();
    let mut rejections = 0;

    for _ in 0..3000 {
        input.set(Action::Accelerate, rng.gen_bool(0.8));
        input.set(Action::Brake, rng.gen_bool(0.1));
        input.set(Action::SteerLeft, rng.gen_bool(0.3));
        input.set(Action::SteerRight, rng.gen_bool(0.3));

        let before = position;
        let outcome = physics::step(&mut kart, &mut position, &mut tracker, &input, &curve, &tuning);
        if outcome.accepted {
            assert!(outcome.track.lateral_distance < TRACK_HALF_WIDTH);
        } else {
            rejections += 1;
            assert_eq!(position, before);
            assert!((kart.speed + tuning.bounce * outcome.attempted_speed).abs() < 1e-12);
        }
        let lateral = estimate_full(&curve, &position, PROGRESS_RESYNC_SAMPLES).lateral_distance;
        assert!(lateral < TRACK_HALF_WIDTH + 0.1, "kart escaped: lateral {lateral}");
    }
    assert!(rejections > 0, "Random driving should hit the wall at least once");
}

#[test]
fn test_steering_needs_minimum_speed() {
    let curve = PathCurve::default_circuit();
    let mut kart = test_kart(0.0, 1.0);
    let mut position = on_track(&curve, 0.5);
    let mut tracker = ProgressTracker::starting_at(0.5);
    physics::step(
        &mut kart,
        &mut position,
        &mut tracker,
        &InputState::new().with(Action::SteerLeft),
        &curve,
        &KartTuning::default(),
    );
    assert_eq!(kart.heading, 1.0);
}

#[test]
fn test_steering_reverses_when_backing_up() {
    let curve = PathCurve::default_circuit();
    let t = 0.5;
    let heading = heading_along(&curve, t);
    let left = InputState::new().with(Action::SteerLeft);
    let tuning = KartTuning::default();

    let mut forward = test_kart(1.0, heading);
    let mut position = on_track(&curve, t);
    let mut tracker = ProgressTracker::starting_at(t);
    physics::step(&mut forward, &mut position, &mut tracker, &left, &curve, &tuning);
    assert!((forward.heading - (heading + KART_TURN_SPEED)).abs() < 1e-12);

    let mut reverse = test_kart(-1.0, heading);
    let mut position = on_track(&curve, t);
    let mut tracker = ProgressTracker::starting_at(t);
    physics::step(&mut reverse, &mut position, &mut tracker, &left, &curve, &tuning);
    assert!((reverse.heading - (heading - KART_TURN_SPEED)).abs() < 1e-12);
}

#[test]
fn test_max_speed_clamp_is_optional() {
    let curve = PathCurve::default_circuit();
    let t = 0.3;
    let accelerate = InputState::new().with(Action::Accelerate);

    let clamped = KartTuning {
        max_speed: Some(KART_MAX_SPEED),
        ..Default::default()
    };
    let mut kart = test_kart(5.0, heading_along(&curve, t));
    let mut position = on_track(&curve, t);
    let mut tracker = ProgressTracker::starting_at(t);
    physics::step(&mut kart, &mut position, &mut tracker, &accelerate, &curve, &clamped);
    assert!(kart.speed.abs() <= KART_MAX_SPEED + 1e-12);

    let mut kart = test_kart(2.0, heading_along(&curve, t));
    let mut position = on_track(&curve, t);
    let mut tracker = ProgressTracker::starting_at(t);
    physics::step(
        &mut kart,
        &mut position,
        &mut tracker,
        &accelerate,
        &curve,
        &KartTuning::default(),
    );
    assert!((kart.speed - (2.0 + KART_ACCELERATION) * KART_FRICTION).abs() < 1e-12);
}

#[test]
fn test_negative_or_nan_max_speed_does_not_panic() {
    let config: SimConfig =
        serde_json::from_str(r#"{"tuning":{"max_speed":-1.0}}"#).expect("config parses");
    let mut engine = SimulationEngine::new(config);
    engine.queue_command(PlayerCommand::StartRace {
        name: "Tester".into(),
        color: 0,
    });
    engine.tick(&idle());
    let accelerate = InputState::new().with(Action::Accelerate);
    for _ in 0..200 {
        engine.tick(&accelerate);
    }
    let speed = engine.local_motion().unwrap().speed;
    assert!(speed.abs() <= 1.0 + 1e-12, "negative max clamps by magnitude, speed = {speed}");

    let curve = PathCurve::default_circuit();
    let t = 0.3;
    let unbounded = KartTuning {
        max_speed: Some(f64::NAN),
        ..Default::default()
    };
    let mut kart = test_kart(2.0, heading_along(&curve, t));
    let mut position = on_track(&curve, t);
    let mut tracker = ProgressTracker::starting_at(t);
    physics::step(&mut kart, &mut position, &mut tracker, &accelerate, &curve, &unbounded);
    assert!((kart.speed - (2.0 + KART_ACCELERATION) * KART_FRICTION).abs() < 1e-12);
}

#[test]
fn test_driving_off_the_start_line_bounces() {
    // The kart spawns facing +z, across the track.
    let mut engine = started_engine(1);
    let accelerate = InputState::new().with(Action::Accelerate);

    let mut bounced = false;
    for _ in 0..400 {
        let snapshot = engine.tick(&accelerate);
        if snapshot
            .events
            .iter()
            .any(|e| matches!(e, RaceEvent::WallBounce { .. }))
        {
            bounced = true;
            break;
        }
    }
    assert!(bounced);
    assert_eq!(engine.local_laps().unwrap().laps_completed(), 0);
}

// ---- Laps ----

#[test]
fn test_crosses_seam_edge() {
    assert!(crosses_seam(0.95, 0.05));
    assert!(crosses_seam(0.91, 0.0));
    assert!(!crosses_seam(0.9, 0.05), "Bounds are strict");
    assert!(!crosses_seam(0.95, 0.1));
    assert!(!crosses_seam(0.05, 0.95));
    assert!(!crosses_seam(0.5, 0.6));
}

#[test]
fn test_lap_counted_on_seam_crossing() {
    let mut laps = LapTracker::new(3);
    assert!(laps.observe(0.95, 0.05));
    assert_eq!(laps.laps_completed(), 1);
    assert_eq!(laps.current_lap(), 2);
}

#[test]
fn test_lap_jitter_at_seam_counts_once() {
    let mut laps = LapTracker::new(3);
    assert!(laps.observe(0.95, 0.05));
    // Jitter back and forth across the line.
    assert!(!laps.observe(0.05, 0.97));
    assert!(!laps.observe(0.97, 0.02));
    assert_eq!(laps.laps_completed(), 1);

    // Driving through mid-lap re-arms.
    laps.observe(0.3, 0.5);
    assert!(laps.is_armed());
    assert!(laps.observe(0.96, 0.03));
    assert_eq!(laps.laps_completed(), 2);
}

#[test]
fn test_reversing_over_seam_does_not_count() {
    let mut laps = LapTracker::new(3);
    assert!(!laps.observe(0.02, 0.98));
    assert!(!laps.is_armed());
    assert!(!laps.observe(0.98, 0.02));
    assert_eq!(laps.laps_completed(), 0);
}

#[test]
fn test_lap_tracker_finishes_at_total() {
    let mut laps = LapTracker::new(2);
    laps.observe(0.95, 0.05);
    laps.observe(0.4, 0.5);
    laps.observe(0.95, 0.05);
    assert!(laps.is_finished());
    assert_eq!(laps.current_lap(), 2, "Current lap caps at the total");
}

#[test]
fn test_full_race_finishes_after_three_laps() {
    let mut engine = started_engine(3);
    let curve = engine.curve().clone();

    let mut laps_seen = 0;
    let mut finishes = 0;
    let mut last = None;
    for step in 1..=320 {
        let t = (step as f64 * 0.01).fract();
        engine.place_local_kart(on_track(&curve, t), heading_along(&curve, t), 0.0);
        let snapshot = engine.tick(&idle());
        for event in &snapshot.events {
            match event {
                RaceEvent::LapCompleted { .. } => laps_seen += 1,
                RaceEvent::RaceFinished { .. } => finishes += 1,
                _ => {}
            }
        }
        last = Some(snapshot);
    }

    let snapshot = last.unwrap();
    assert_eq!(laps_seen, 3);
    assert_eq!(finishes, 1);
    assert_eq!(snapshot.phase, GamePhase::Finished);
    let local = snapshot.local.unwrap();
    assert!(local.finished);
    assert_eq!(local.laps_completed, 3);
    assert_eq!(local.current_lap, 3);
}

// ---- Items ----

#[test]
fn test_pickup_deactivates_box_until_respawn() {
    let mut engine = started_engine(7);
    let curve = engine.curve().clone();
    let box_t = ITEM_BOX_LOCATIONS[0];

    engine.place_local_kart(on_track(&curve, box_t), 0.0, 0.0);
    let snapshot = engine.tick(&idle());
    assert!(!snapshot.item_boxes[0].active);
    assert!(snapshot.local.as_ref().unwrap().held_item.is_some());
    assert!(snapshot
        .events
        .iter()
        .any(|e| matches!(e, RaceEvent::ItemPickedUp { box_index: 0, item: Some(_) })));

    // Park away from every box.
    engine.place_local_kart(on_track(&curve, 0.65), 0.0, 0.0);
    for _ in 0..ITEM_RESPAWN_TICKS - 1 {
        let snapshot = engine.tick(&idle());
        assert!(!snapshot.item_boxes[0].active, "Box came back early");
    }

    let snapshot = engine.tick(&idle());
    assert!(snapshot.item_boxes[0].active);
    assert!(snapshot
        .events
        .contains(&RaceEvent::BoxRespawned { box_index: 0 }));
}

#[test]
fn test_inactive_box_cannot_be_collected() {
    let mut engine = started_engine(7);
    let curve = engine.curve().clone();
    let box_position = on_track(&curve, ITEM_BOX_LOCATIONS[1]);

    engine.place_local_kart(box_position, 0.0, 0.0);
    engine.tick(&idle());
    let held = engine.local_inventory().unwrap().held;
    assert!(held.is_some());

    // Use the item elsewhere, then come back while the box is down.
    engine.place_local_kart(on_track(&curve, 0.65), 0.0, 0.0);
    engine.queue_command(PlayerCommand::UseItem);
    engine.tick(&idle());
    assert!(engine.local_inventory().unwrap().is_empty());

    engine.place_local_kart(box_position, 0.0, 0.0);
    let snapshot = engine.tick(&idle());
    assert!(!snapshot
        .events
        .iter()
        .any(|e| matches!(e, RaceEvent::ItemPickedUp { .. })));
    assert!(engine.local_inventory().unwrap().is_empty());
}

#[test]
fn test_pickup_while_holding_keeps_item() {
    let mut engine = started_engine(7);
    let curve = engine.curve().clone();
    engine.give_local_item(ItemKind::Hazard);

    engine.place_local_kart(on_track(&curve, ITEM_BOX_LOCATIONS[2]), 0.0, 0.0);
    let snapshot = engine.tick(&idle());

    assert!(!snapshot.item_boxes[2].active, "Box is still consumed");
    assert!(snapshot
        .events
        .contains(&RaceEvent::ItemPickedUp { box_index: 2, item: None }));
    assert_eq!(snapshot.local.unwrap().held_item, Some(ItemKind::Hazard));
}

#[test]
fn test_respawn_queue_drains_in_due_order() {
    let mut queue = RespawnQueue::default();
    queue.schedule(2, 50);
    queue.schedule(0, 10);
    queue.schedule(1, 30);

    assert!(queue.drain_due(9).is_empty());
    let due: Vec<usize> = queue.drain_due(30).iter().map(|d| d.box_index).collect();
    assert_eq!(due, vec![0, 1]);
    let rest: Vec<usize> = queue.drain_due(u64::MAX).iter().map(|d| d.box_index).collect();
    assert_eq!(rest, vec![2]);
}

#[test]
fn test_boost_adds_speed() {
    let mut engine = started_engine(1);
    engine.give_local_item(ItemKind::Boost);
    engine.queue_command(PlayerCommand::UseItem);
    let snapshot = engine.tick(&idle());

    let speed = local_view(&snapshot).speed;
    assert!((speed - BOOST_SPEED * KART_FRICTION).abs() < 1e-12, "speed = {speed}");
    assert!(snapshot.local.unwrap().held_item.is_none());
    assert!(snapshot.events.contains(&RaceEvent::ItemUsed {
        kart: KartId::local(),
        item: ItemKind::Boost,
    }));
}

#[test]
fn test_use_item_fires_on_press_not_hold() {
    let mut engine = started_engine(1);
    let hold = InputState::new().with(Action::UseItem);

    engine.give_local_item(ItemKind::Boost);
    engine.tick(&hold);
    assert!(engine.local_inventory().unwrap().is_empty());

    engine.give_local_item(ItemKind::Boost);
    engine.tick(&hold);
    engine.tick(&hold);
    assert_eq!(engine.local_inventory().unwrap().held, Some(ItemKind::Boost));

    engine.tick(&idle());
    engine.tick(&hold);
    assert!(engine.local_inventory().unwrap().is_empty());
}

#[test]
fn test_use_with_empty_slot_does_nothing() {
    let mut engine = started_engine(1);
    engine.queue_command(PlayerCommand::UseItem);
    let snapshot = engine.tick(&idle());
    assert!(snapshot.events.is_empty());
    assert!(snapshot.projectiles.is_empty());
}

#[test]
fn test_own_shell_never_hits_owner() {
    let mut engine = started_engine(1);
    let curve = engine.curve().clone();
    let t = 0.3;
    engine.place_local_kart(on_track(&curve, t), heading_along(&curve, t), 1.0);
    engine.give_local_item(ItemKind::Shell);
    engine.queue_command(PlayerCommand::UseItem);

    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.projectiles.len(), 1);
    let shell = &snapshot.projectiles[0];
    assert_eq!(shell.kind, ProjectileKind::Shell);
    assert_eq!(shell.owner, KartId::local());
    assert!((shell.position.y - PROJECTILE_HEIGHT).abs() < 1e-12);
    assert!((local_view(&snapshot).speed - KART_FRICTION).abs() < 1e-12);
    assert!(!snapshot
        .events
        .iter()
        .any(|e| matches!(e, RaceEvent::SpunOut { .. })));
}

#[test]
fn test_other_shell_spins_out_kart() {
    let mut engine = started_engine(1);
    let curve = engine.curve().clone();
    let t = 0.3;
    let position = on_track(&curve, t);
    engine.place_local_kart(position, heading_along(&curve, t), 1.0);
    engine.spawn_test_projectile(ProjectileKind::Shell, position, 0.0, KartId::new("player_b"));

    let snapshot = engine.tick(&idle());
    assert_eq!(local_view(&snapshot).speed, 0.0);
    assert!(snapshot.projectiles.is_empty(), "Shell is consumed by the hit");
    assert!(snapshot.events.contains(&RaceEvent::SpunOut {
        kart: KartId::local(),
        kind: ProjectileKind::Shell,
        owner: KartId::new("player_b"),
    }));
}

#[test]
fn test_hazard_drops_behind_and_stays() {
    let mut engine = started_engine(1);
    let curve = engine.curve().clone();
    let t = 0.3;
    let heading = heading_along(&curve, t);
    let position = on_track(&curve, t);
    engine.place_local_kart(position, heading, 0.0);
    engine.give_local_item(ItemKind::Hazard);
    engine.queue_command(PlayerCommand::UseItem);
    engine.tick(&idle());

    for _ in 0..120 {
        engine.tick(&idle());
    }
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.projectiles.len(), 1);
    let hazard = &snapshot.projectiles[0];
    assert_eq!(hazard.kind, ProjectileKind::Hazard);
    let expected = position.offset_along(heading, -HAZARD_DROP_OFFSET);
    assert!(hazard.position.planar_distance_to(&expected) < 1e-9);
}

#[test]
fn test_someone_elses_hazard_spins_out_kart() {
    let mut engine = started_engine(1);
    let curve = engine.curve().clone();
    let t = 0.4;
    let heading = heading_along(&curve, t);
    let position = on_track(&curve, t);
    engine.place_local_kart(position, heading, 0.0);
    // Dropped from 2 units ahead, so it lands on the kart.
    engine.spawn_test_projectile(
        ProjectileKind::Hazard,
        position.offset_along(heading, HAZARD_DROP_OFFSET),
        heading,
        KartId::new("player_b"),
    );

    let snapshot = engine.tick(&idle());
    assert!(snapshot.projectiles.is_empty());
    assert_eq!(local_view(&snapshot).speed, 0.0);
}

#[test]
fn test_shell_cleaned_up_far_from_origin() {
    let mut engine = started_engine(1);
    engine.spawn_test_projectile(
        ProjectileKind::Shell,
        Position::new(490.0, PROJECTILE_HEIGHT, 0.0),
        std::f64::consts::FRAC_PI_2,
        KartId::new("player_b"),
    );

    for _ in 0..10 {
        assert_eq!(engine.tick(&idle()).projectiles.len(), 1);
    }
    for _ in 0..20 {
        engine.tick(&idle());
    }
    assert!(engine.tick(&idle()).projectiles.is_empty());
}

// ---- Remote karts ----

#[test]
fn test_remote_join_update_leave() {
    let mut engine = started_engine(1);

    engine.apply_presence(&PresenceEvent::Joined(remote_state("player_b", 10.0, 20.0)));
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.karts.len(), 2);
    let remote = &snapshot.karts[1];
    assert_eq!(remote.origin, KartOrigin::Remote);
    assert_eq!(remote.id, KartId::new("player_b"));
    assert_eq!(remote.position, Position::new(10.0, KART_GROUND_OFFSET, 20.0));
    assert_eq!(remote.heading, 0.25);

    let mut moved = remote_state("player_b", -4.0, 8.0);
    moved.angle = 1.5;
    moved.speed = 1.1;
    engine.apply_presence(&PresenceEvent::Updated(moved));
    let snapshot = engine.tick(&idle());
    let remote = &snapshot.karts[1];
    assert_eq!(remote.position, Position::new(-4.0, KART_GROUND_OFFSET, 8.0));
    assert_eq!(remote.heading, 1.5);
    assert_eq!(remote.speed, 1.1);

    engine.apply_presence(&PresenceEvent::Left {
        id: KartId::new("player_b"),
    });
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.karts.len(), 1);
}

#[test]
fn test_remote_state_is_not_simulated() {
    let mut engine = started_engine(1);
    engine.apply_presence(&PresenceEvent::Joined(remote_state("player_b", 10.0, 20.0)));
    for _ in 0..30 {
        engine.tick(&idle());
    }
    let snapshot = engine.tick(&idle());
    assert_eq!(
        snapshot.karts[1].position,
        Position::new(10.0, KART_GROUND_OFFSET, 20.0),
        "Remote karts only move when updated"
    );
}

#[test]
fn test_update_for_unknown_remote_spawns_it() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    engine.apply_presence(&PresenceEvent::Updated(remote_state("player_c", 1.0, 2.0)));
    engine.apply_presence(&PresenceEvent::Joined(remote_state("player_c", 1.0, 2.0)));
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.karts.len(), 1, "Duplicate join is ignored");
    assert_eq!(snapshot.karts[0].id, KartId::new("player_c"));
}

#[test]
fn test_presence_for_local_identity_is_ignored() {
    let mut engine = started_engine(1);
    engine.queue_command(PlayerCommand::SetLocalIdentity {
        id: KartId::new("player_me"),
    });
    engine.tick(&idle());

    engine.apply_presence(&PresenceEvent::Updated(remote_state("player_me", 99.0, 99.0)));
    engine.apply_presence(&PresenceEvent::Left {
        id: KartId::new("player_me"),
    });
    let snapshot = engine.tick(&idle());
    assert_eq!(snapshot.karts.len(), 1);
    let local = local_view(&snapshot);
    assert!(local.position.x.abs() < 1e-9 && local.position.z.abs() < 1e-9);
}

#[test]
fn test_set_local_identity_retags_kart_and_projectiles() {
    let mut engine = started_engine(1);
    engine.give_local_item(ItemKind::Hazard);
    engine.queue_command(PlayerCommand::UseItem);
    engine.tick(&idle());

    engine.queue_command(PlayerCommand::SetLocalIdentity {
        id: KartId::new("player_abc123xyz"),
    });
    let snapshot = engine.tick(&idle());

    assert_eq!(engine.local_id(), &KartId::new("player_abc123xyz"));
    assert_eq!(local_view(&snapshot).id, KartId::new("player_abc123xyz"));
    assert_eq!(snapshot.local.unwrap().id, KartId::new("player_abc123xyz"));
    assert_eq!(snapshot.projectiles[0].owner, KartId::new("player_abc123xyz"));
}
