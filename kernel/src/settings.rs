/*!
Simulation settings and tolerances.

These constants centralize the parameters used by the broad phase, the contact generator, the
constraint solver and the auto-sleep pass. They are the defaults behind `KernelConfig`; keep them
together so tuning stays in one place and stepping stays deterministic across platforms.

Notes
- Distances are in meters, time in seconds.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
*/

/// Maximum number of contact points generated for a single shape pair.
pub const MAX_CONTACTS: usize = 4;

/// Maximum number of collision tags a world can declare.
pub const MAX_TAGS: usize = 16;

/// Smallest cell level of the hashed broad phase (cell size `2^level`).
pub const HASH_MIN_LEVEL: i32 = -4;

/// Largest cell level of the hashed broad phase. Boxes larger than `2^HASH_MAX_LEVEL` are tested
/// against everything.
pub const HASH_MAX_LEVEL: i32 = 8;

/// Default gravity along -Y (m/s^2).
pub const DEFAULT_GRAVITY_Y: f32 = -9.81;

/// Projected Gauss-Seidel iterations per step.
pub const SOLVER_ITERATIONS: u32 = 20;

/// Successive over-relaxation factor applied to every row update.
pub const SOLVER_SOR: f32 = 1.0;

/// Error reduction parameter: fraction of positional error corrected per step.
pub const DEFAULT_ERP: f32 = 0.2;

/// Constraint force mixing: softens rows and keeps the system well conditioned.
pub const DEFAULT_CFM: f32 = 1.0e-5;

/// Penetration depth tolerated before contacts push back (meters).
pub const CONTACT_SLOP: f32 = 0.001;

/// Approach speed below which restitution is ignored (m/s).
pub const BOUNCE_VELOCITY: f32 = 0.1;

/// Linear speed below which a body counts as idle (m/s).
pub const SLEEP_LINEAR_THRESHOLD: f32 = 0.01;

/// Angular speed below which a body counts as idle (rad/s).
pub const SLEEP_ANGULAR_THRESHOLD: f32 = 0.01;

/// Consecutive idle steps before a body is put to sleep.
pub const SLEEP_STEPS: u32 = 10;

/// Speed above which damping is applied, when a threshold is not configured.
pub const DEFAULT_DAMPING_THRESHOLD: f32 = 0.01;
