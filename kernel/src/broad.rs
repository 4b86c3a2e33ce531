/*!
Hashed broad phase.

A multi-resolution spatial hash in the style of a hierarchical grid: every object is filed at the
level whose cell size (`2^level`) is the smallest power of two not below its largest AABB extent,
so it touches at most eight cells. Candidate pairs come from scanning an object's own level and
every coarser level; objects too large for the coarsest level are tested against everything.

The space stores caller payloads in a slot map, so identifiers stay valid (and detectably stale)
across removals. AABBs are supplied by the caller at query time; the space never caches poses.
*/

use hashbrown::{HashMap, HashSet};
use slotmap::{SlotMap, new_key_type};

use crate::types::{Aabb, Point3, Vec3, aabb_intersects};

new_key_type! {
    /// Handle of an object registered in a [`Space`].
    pub struct GeomId;
}

/// Cell coordinate: (level, x, y, z).
type CellKey = (i32, i64, i64, i64);

pub struct Space<T> {
    entries: SlotMap<GeomId, T>,
    min_level: i32,
    max_level: i32,
}

impl<T> Space<T> {
    /// Create a space with cell levels `min_level..=max_level`.
    pub fn new(min_level: i32, max_level: i32) -> Self {
        Self {
            entries: SlotMap::with_key(),
            min_level: min_level.min(max_level),
            max_level: max_level.max(min_level),
        }
    }

    pub fn insert(&mut self, value: T) -> GeomId {
        self.entries.insert(value)
    }

    pub fn remove(&mut self, id: GeomId) -> Option<T> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: GeomId) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Level an AABB is filed at, or `None` when it exceeds the coarsest level.
    fn level_of(&self, aabb: &Aabb) -> Option<i32> {
        let extent = aabb.maxs - aabb.mins;
        let size = extent.x.max(extent.y).max(extent.z);
        if size <= 0.0 {
            return Some(self.min_level);
        }
        let level = (size.log2().ceil() as i32).max(self.min_level);
        (level <= self.max_level).then_some(level)
    }

    /// Every pair of objects whose AABBs overlap, each reported once.
    ///
    /// `aabb_of` returns the current world box of an object, or `None` to leave it out of this
    /// pass (disabled geometry). Pairs are ordered by registration order of their first member,
    /// which keeps repeated calls over an unchanged space deterministic.
    pub fn collide(
        &self,
        mut aabb_of: impl FnMut(GeomId, &T) -> Option<Aabb>,
    ) -> Vec<(GeomId, GeomId)> {
        let mut ids = Vec::with_capacity(self.entries.len());
        let mut boxes = Vec::with_capacity(self.entries.len());
        for (id, value) in self.entries.iter() {
            if let Some(aabb) = aabb_of(id, value).filter(is_finite) {
                ids.push(id);
                boxes.push(aabb);
            }
        }

        let mut grid: HashMap<CellKey, Vec<usize>> = HashMap::new();
        let mut levels = Vec::with_capacity(boxes.len());
        let mut big = Vec::new();
        for (i, aabb) in boxes.iter().enumerate() {
            let level = self.level_of(aabb);
            levels.push(level);
            match level {
                Some(level) => {
                    for key in cells(aabb, level) {
                        grid.entry(key).or_default().push(i);
                    }
                }
                None => big.push(i),
            }
        }

        let mut candidates: HashSet<(usize, usize)> = HashSet::new();
        let mut push = |a: usize, b: usize| {
            if a != b {
                candidates.insert((a.min(b), a.max(b)));
            }
        };

        for (i, aabb) in boxes.iter().enumerate() {
            let Some(own) = levels[i] else { continue };
            for level in own..=self.max_level {
                for key in cells(aabb, level) {
                    if let Some(others) = grid.get(&key) {
                        for &j in others {
                            push(i, j);
                        }
                    }
                }
            }
        }
        for &i in &big {
            for j in 0..boxes.len() {
                push(i, j);
            }
        }

        let mut pairs: Vec<(usize, usize)> = candidates
            .into_iter()
            .filter(|&(a, b)| aabb_intersects(&boxes[a], &boxes[b]))
            .collect();
        pairs.sort_unstable();
        pairs.into_iter().map(|(a, b)| (ids[a], ids[b])).collect()
    }

    /// Objects whose AABB is crossed by the segment `start..end`, in registration order.
    pub fn query_segment(
        &self,
        start: &Point3,
        end: &Point3,
        mut aabb_of: impl FnMut(GeomId, &T) -> Option<Aabb>,
    ) -> Vec<GeomId> {
        self.entries
            .iter()
            .filter(|&(id, value)| {
                aabb_of(id, value)
                    .filter(is_finite)
                    .is_some_and(|aabb| segment_hits_aabb(start, end, &aabb))
            })
            .map(|(id, _)| id)
            .collect()
    }
}

fn is_finite(aabb: &Aabb) -> bool {
    aabb.mins.iter().chain(aabb.maxs.iter()).all(|c| c.is_finite())
}

/// Grid cells covered by `aabb` at `level`.
fn cells(aabb: &Aabb, level: i32) -> impl Iterator<Item = CellKey> {
    let size = 2f32.powi(level);
    let lo = aabb.mins.coords / size;
    let hi = aabb.maxs.coords / size;
    let (x0, y0, z0) = (lo.x.floor() as i64, lo.y.floor() as i64, lo.z.floor() as i64);
    let (x1, y1, z1) = (hi.x.floor() as i64, hi.y.floor() as i64, hi.z.floor() as i64);
    (x0..=x1).flat_map(move |x| {
        (y0..=y1).flat_map(move |y| (z0..=z1).map(move |z| (level, x, y, z)))
    })
}

/// Slab test of a finite segment against a box.
fn segment_hits_aabb(start: &Point3, end: &Point3, aabb: &Aabb) -> bool {
    let dir: Vec3 = end - start;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for axis in 0..3 {
        let (s, d) = (start[axis], dir[axis]);
        let (lo, hi) = (aabb.mins[axis], aabb.maxs[axis]);
        if d.abs() < f32::EPSILON {
            if s < lo || s > hi {
                return false;
            }
            continue;
        }
        let (mut a, mut b) = ((lo - s) / d, (hi - s) / d);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }
        t0 = t0.max(a);
        t1 = t1.min(b);
        if t0 > t1 {
            return false;
        }
    }
    true
}
