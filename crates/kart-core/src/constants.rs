//! Simulation constants and tuning parameters.
//!
//! Physics values are per tick, not per second: the simulation is
//! frame-driven and every tick applies the same increments.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Identity of the local kart before a network id is assigned.
pub const LOCAL_KART_ID: &str = "local";

// --- Track ---

/// Radius of the road tube around the curve centre line.
pub const TRACK_TUBE_RADIUS: f64 = 10.0;

/// Lateral distance at which a move is rejected. Wider than the
/// tube radius to leave some wiggle room at the edge of the road.
pub const TRACK_HALF_WIDTH: f64 = 12.0;

/// Number of samples in a windowed progress search.
pub const PROGRESS_SAMPLES: usize = 100;

/// Width of the progress search window, as a fraction of the loop.
pub const PROGRESS_WINDOW: f64 = 0.1;

/// Number of samples in a full-loop resynchronization search.
pub const PROGRESS_RESYNC_SAMPLES: usize = 400;

/// In-window distance beyond which the tracker resynchronizes over the full loop.
pub const PROGRESS_RESYNC_DISTANCE: f64 = TRACK_HALF_WIDTH * 2.0;

/// Divisions used to build the arc-length table of a curve.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

// --- Kart physics ---

/// Speed gained (or lost when braking) per tick while the pedal is held.
pub const KART_ACCELERATION: f64 = 0.02;

/// Multiplicative friction applied to speed every tick.
pub const KART_FRICTION: f64 = 0.96;

/// Heading change per tick while steering (radians).
pub const KART_TURN_SPEED: f64 = 0.05;

/// Minimum |speed| for steering input to take effect.
pub const KART_STEER_MIN_SPEED: f64 = 0.01;

/// Fraction of speed kept (and reversed) after hitting the track edge.
pub const KART_BOUNCE: f64 = 0.5;

/// Nominal top speed. Only enforced when tuning opts into clamping.
pub const KART_MAX_SPEED: f64 = 1.5;

/// Height of a kart body above the ground.
pub const KART_GROUND_OFFSET: f64 = 0.5;

/// Height of spawn points above the curve.
pub const SPAWN_HEIGHT: f64 = 1.0;

// --- Race ---

/// Laps needed to finish a race.
pub const DEFAULT_TOTAL_LAPS: u32 = 3;

/// Progress above which a kart is approaching the seam.
pub const LAP_SEAM_HIGH: f64 = 0.9;

/// Progress below which a kart has just passed the seam.
pub const LAP_SEAM_LOW: f64 = 0.1;

/// Band around mid-lap that re-arms lap counting after a seam crossing.
pub const LAP_REARM_BAND: (f64, f64) = (0.4, 0.6);

// --- Items ---

/// Progress values at which item boxes are placed.
pub const ITEM_BOX_LOCATIONS: [f64; 3] = [0.2, 0.5, 0.8];

/// Height item boxes hover at.
pub const ITEM_BOX_HEIGHT: f64 = 1.0;

/// Distance from a box at which a kart picks it up (3D).
pub const ITEM_PICKUP_RADIUS: f64 = 2.0;

/// Seconds until a collected box becomes active again.
pub const ITEM_RESPAWN_SECS: f64 = 5.0;

/// Respawn delay in ticks.
pub const ITEM_RESPAWN_TICKS: u64 = (ITEM_RESPAWN_SECS * TICK_RATE as f64) as u64;

/// Speed added by a boost.
pub const BOOST_SPEED: f64 = 0.5;

/// Shell travel speed per tick.
pub const SHELL_SPEED: f64 = 0.5;

/// Distance behind the kart at which a hazard is dropped.
pub const HAZARD_DROP_OFFSET: f64 = 2.0;

/// Height projectiles travel at.
pub const PROJECTILE_HEIGHT: f64 = 0.5;

/// Distance from a projectile at which a kart is hit (3D).
pub const PROJECTILE_HIT_RADIUS: f64 = 2.0;

/// Shells are removed once further than this from the world origin.
pub const SHELL_DESPAWN_RADIUS: f64 = 500.0;
