//! Collaborators consumed by contouring and clipping.
//!
//! The kernel never owns mesh storage. New points go through a [`PointLocator`]
//! (which merges duplicates to a stable id), attribute transfer goes through
//! [`PointDataSink`] / [`CellDataSink`], and produced primitives are appended to
//! a [`CellArray`]. [`CutContext`] bundles these for a single cell call.

use std::collections::HashMap;

use crate::cell::CellKind;

/// Deduplicates world coordinates to unique point ids.
pub trait PointLocator {
    /// Returns the id of a point at `x`, inserting it if no existing point matches.
    /// The flag is `true` when a new point was created.
    fn insert_unique_point(&mut self, x: [f64; 3]) -> (usize, bool);

    /// Coordinates of a previously inserted point.
    fn point(&self, id: usize) -> [f64; 3];

    /// Number of unique points held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receives attribute transfers for newly created points.
pub trait PointDataSink {
    /// New point `target` sits exactly on input point `source` (a global id).
    fn copy_point(&mut self, source: i64, target: usize);

    /// New point `target` was cut at parameter `t` from `a` (low scalar) to `b`.
    fn interpolate_edge(&mut self, target: usize, a: i64, b: i64, t: f64);
}

/// Receives per-primitive attribute copies.
pub trait CellDataSink {
    fn copy_cell(&mut self, source: usize, target: usize);
}

/// Append-only list of output primitives with their kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellArray {
    kinds: Vec<CellKind>,
    offsets: Vec<usize>,
    connectivity: Vec<usize>,
}

impl CellArray {
    pub fn new() -> Self {
        Self {
            kinds: Vec::new(),
            offsets: vec![0],
            connectivity: Vec::new(),
        }
    }

    /// Appends a primitive and returns its index.
    pub fn push(&mut self, kind: CellKind, ids: &[usize]) -> usize {
        if self.offsets.is_empty() {
            self.offsets.push(0);
        }
        self.kinds.push(kind);
        self.connectivity.extend_from_slice(ids);
        self.offsets.push(self.connectivity.len());
        self.kinds.len() - 1
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(CellKind, &[usize])> {
        let kind = *self.kinds.get(index)?;
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        Some((kind, &self.connectivity[start..end]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellKind, &[usize])> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Number of primitives of the given kind.
    pub fn count_kind(&self, kind: CellKind) -> usize {
        self.kinds.iter().filter(|&&k| k == kind).count()
    }

    pub fn clear(&mut self) {
        self.kinds.clear();
        self.connectivity.clear();
        self.offsets.clear();
        self.offsets.push(0);
    }
}

/// Hash-grid point merger.
///
/// With a zero tolerance only bit-identical coordinates are merged; otherwise
/// any point within `tolerance` of an existing point maps onto it.
#[derive(Debug, Clone)]
pub struct MergePoints {
    points: Vec<[f64; 3]>,
    bins: HashMap<(i64, i64, i64), Vec<usize>>,
    bin_size: f64,
    tolerance: f64,
}

impl MergePoints {
    /// Exact merging.
    pub fn new() -> Self {
        Self::with_tolerance(0.0)
    }

    pub fn with_tolerance(tolerance: f64) -> Self {
        let tolerance = tolerance.max(0.0);
        // Bins twice the tolerance keep every match inside the 3x3x3 neighbourhood.
        let bin_size = if tolerance > 0.0 { 2.0 * tolerance } else { 1.0 };
        Self {
            points: Vec::new(),
            bins: HashMap::new(),
            bin_size,
            tolerance,
        }
    }

    #[inline]
    fn bin_of(&self, x: &[f64; 3]) -> (i64, i64, i64) {
        let discretize = |v: f64| (v / self.bin_size).floor() as i64;
        (discretize(x[0]), discretize(x[1]), discretize(x[2]))
    }

    /// Id of an existing point matching `x`, if any.
    pub fn find(&self, x: &[f64; 3]) -> Option<usize> {
        let (bx, by, bz) = self.bin_of(x);
        if self.tolerance == 0.0 {
            return self
                .bins
                .get(&(bx, by, bz))?
                .iter()
                .copied()
                .find(|&id| self.points[id] == *x);
        }

        let tol2 = self.tolerance * self.tolerance;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(ids) = self.bins.get(&(bx + dx, by + dy, bz + dz)) {
                        for &id in ids {
                            let p = &self.points[id];
                            let d2 = (p[0] - x[0]).powi(2) + (p[1] - x[1]).powi(2) + (p[2] - x[2]).powi(2);
                            if d2 <= tol2 {
                                return Some(id);
                            }
                        }
                    }
                }
            }
        }
        None
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn into_points(self) -> Vec<[f64; 3]> {
        self.points
    }
}

impl Default for MergePoints {
    fn default() -> Self {
        Self::new()
    }
}

impl PointLocator for MergePoints {
    fn insert_unique_point(&mut self, x: [f64; 3]) -> (usize, bool) {
        if let Some(id) = self.find(&x) {
            return (id, false);
        }
        let id = self.points.len();
        let bin = self.bin_of(&x);
        self.points.push(x);
        self.bins.entry(bin).or_default().push(id);
        (id, true)
    }

    fn point(&self, id: usize) -> [f64; 3] {
        self.points[id]
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Interpolates one scalar per point onto newly created points.
///
/// `input` is indexed by global point id, `output` by locator id.
#[derive(Debug, Clone, Default)]
pub struct InterpolatedScalars {
    pub input: Vec<f64>,
    pub output: Vec<f64>,
}

impl InterpolatedScalars {
    pub fn new(input: Vec<f64>) -> Self {
        Self { input, output: Vec::new() }
    }

    fn set(&mut self, target: usize, value: f64) {
        if self.output.len() <= target {
            self.output.resize(target + 1, 0.0);
        }
        self.output[target] = value;
    }
}

impl PointDataSink for InterpolatedScalars {
    fn copy_point(&mut self, source: i64, target: usize) {
        let value = self.input[source as usize];
        self.set(target, value);
    }

    fn interpolate_edge(&mut self, target: usize, a: i64, b: i64, t: f64) {
        let va = self.input[a as usize];
        let vb = self.input[b as usize];
        self.set(target, va + t * (vb - va));
    }
}

/// Everything a contour or clip call writes through, besides its output array.
pub struct CutContext<'a> {
    pub locator: &'a mut dyn PointLocator,
    pub point_data: Option<&'a mut dyn PointDataSink>,
    pub cell_data: Option<&'a mut dyn CellDataSink>,
    /// Id of the input cell, forwarded to `CellDataSink::copy_cell`.
    pub cell_id: usize,
}

impl<'a> CutContext<'a> {
    pub fn new(locator: &'a mut dyn PointLocator) -> Self {
        Self {
            locator,
            point_data: None,
            cell_data: None,
            cell_id: 0,
        }
    }

    pub fn with_point_data(mut self, sink: &'a mut dyn PointDataSink) -> Self {
        self.point_data = Some(sink);
        self
    }

    pub fn with_cell_data(mut self, sink: &'a mut dyn CellDataSink) -> Self {
        self.cell_data = Some(sink);
        self
    }

    pub fn with_cell_id(mut self, cell_id: usize) -> Self {
        self.cell_id = cell_id;
        self
    }

    /// Inserts an original cell vertex.
    pub(crate) fn insert_vertex(&mut self, x: [f64; 3], source: i64) -> usize {
        let (id, inserted) = self.locator.insert_unique_point(x);
        if inserted {
            if let Some(pd) = self.point_data.as_deref_mut() {
                pd.copy_point(source, id);
            }
        }
        id
    }

    /// Inserts a point cut on the edge `a -> b` at parameter `t`.
    pub(crate) fn insert_edge_point(&mut self, x: [f64; 3], a: i64, b: i64, t: f64) -> usize {
        let (id, inserted) = self.locator.insert_unique_point(x);
        if inserted {
            if let Some(pd) = self.point_data.as_deref_mut() {
                pd.interpolate_edge(id, a, b, t);
            }
        }
        id
    }

    /// Appends a primitive and copies the input cell's attributes onto it.
    pub(crate) fn emit(&mut self, out: &mut CellArray, kind: CellKind, ids: &[usize]) -> usize {
        let index = out.push(kind, ids);
        if let Some(cd) = self.cell_data.as_deref_mut() {
            cd.copy_cell(self.cell_id, index);
        }
        index
    }
}
