//! Projected Gauss-Seidel velocity solver.
//!
//! Every constraint is reduced to scalar rows `J v = rhs` over two bodies, with the row impulse
//! `lambda` clamped to `[lo, hi]`. Friction rows take their bounds from the current impulse of the
//! normal row they belong to, which gives a box-approximated Coulomb cone. Rows are solved in
//! insertion order with the regularized diagonal `J M^-1 J^T + cfm`.

use crate::types::{Mat3, Vec3};

/// Velocity state of one body during a solve.
#[derive(Clone, Debug)]
pub struct SolverBody {
    pub linear: Vec3,
    pub angular: Vec3,
    pub inv_mass: f32,
    pub inv_inertia: Mat3,
}

impl SolverBody {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0 && self.inv_inertia == Mat3::zeros()
    }
}

/// Where a row takes its impulse bounds from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Bounds {
    Fixed { lo: f32, hi: f32 },
    /// `|lambda| <= mu * lambda[normal]`; an infinite `mu` leaves the row unbounded.
    Friction { normal: usize, mu: f32 },
}

/// One scalar constraint row between bodies `b1` and `b2`.
#[derive(Clone, Debug)]
pub struct Row {
    pub b1: usize,
    pub b2: usize,
    pub lin1: Vec3,
    pub ang1: Vec3,
    pub lin2: Vec3,
    pub ang2: Vec3,
    pub rhs: f32,
    pub cfm: f32,
    pub bounds: Bounds,
    pub lambda: f32,
}

impl Row {
    pub fn new(b1: usize, b2: usize, lin1: Vec3, ang1: Vec3, lin2: Vec3, ang2: Vec3) -> Self {
        Self {
            b1,
            b2,
            lin1,
            ang1,
            lin2,
            ang2,
            rhs: 0.0,
            cfm: 0.0,
            bounds: Bounds::Fixed {
                lo: f32::NEG_INFINITY,
                hi: f32::INFINITY,
            },
            lambda: 0.0,
        }
    }

    pub fn with_rhs(mut self, rhs: f32, cfm: f32) -> Self {
        self.rhs = rhs;
        self.cfm = cfm;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[inline]
    fn velocity(&self, bodies: &[SolverBody]) -> f32 {
        let (a, b) = (&bodies[self.b1], &bodies[self.b2]);
        self.lin1.dot(&a.linear)
            + self.ang1.dot(&a.angular)
            + self.lin2.dot(&b.linear)
            + self.ang2.dot(&b.angular)
    }
}

/// Precomputed `M^-1 J^T` and diagonal for a row.
struct Prepared {
    m_lin1: Vec3,
    m_ang1: Vec3,
    m_lin2: Vec3,
    m_ang2: Vec3,
    inv_k: f32,
}

/// Solve `rows` in place, updating body velocities. Returns the final impulses in `rows`.
pub fn solve(bodies: &mut [SolverBody], rows: &mut [Row], iterations: u32, sor: f32) {
    let prepared: Vec<Option<Prepared>> = rows
        .iter()
        .map(|row| {
            let (a, b) = (&bodies[row.b1], &bodies[row.b2]);
            if a.is_static() && b.is_static() {
                return None;
            }
            let p = Prepared {
                m_lin1: row.lin1 * a.inv_mass,
                m_ang1: a.inv_inertia * row.ang1,
                m_lin2: row.lin2 * b.inv_mass,
                m_ang2: b.inv_inertia * row.ang2,
                inv_k: 0.0,
            };
            let k = row.lin1.dot(&p.m_lin1)
                + row.ang1.dot(&p.m_ang1)
                + row.lin2.dot(&p.m_lin2)
                + row.ang2.dot(&p.m_ang2)
                + row.cfm;
            (k > f32::EPSILON).then(|| Prepared { inv_k: 1.0 / k, ..p })
        })
        .collect();

    for _ in 0..iterations {
        for i in 0..rows.len() {
            let Some(p) = &prepared[i] else { continue };
            let (lo, hi) = match rows[i].bounds {
                Bounds::Fixed { lo, hi } => (lo, hi),
                Bounds::Friction { normal, mu } => {
                    if mu.is_infinite() {
                        (f32::NEG_INFINITY, f32::INFINITY)
                    } else {
                        let limit = mu * rows[normal].lambda.max(0.0);
                        (-limit, limit)
                    }
                }
            };
            let row = &rows[i];
            let jv = row.velocity(bodies);
            let delta = (row.rhs - jv - row.cfm * row.lambda) * p.inv_k * sor;
            let old = row.lambda;
            let new = (old + delta).clamp(lo, hi);
            let applied = new - old;
            rows[i].lambda = new;
            if applied == 0.0 {
                continue;
            }
            let (b1, b2) = (rows[i].b1, rows[i].b2);
            bodies[b1].linear += p.m_lin1 * applied;
            bodies[b1].angular += p.m_ang1 * applied;
            bodies[b2].linear += p.m_lin2 * applied;
            bodies[b2].angular += p.m_ang2 * applied;
        }
    }
}
