//! Case-table driven contouring and clipping.
//!
//! A cell's vertices are classified against an iso-value into a bitmask
//! (bit `i` set when `scalar[i] >= value`). The mask indexes a [`CaseTable`]
//! whose entries list output primitives; each primitive is a list of
//! references that are either a cell edge (`< 100`, a new point interpolated
//! on that edge) or an existing vertex (`>= 100`, vertex `ref - 100`).

pub mod tables;

use crate::cell::CellKind;
use crate::locator::{CellArray, CutContext};
use crate::math::lerp;

/// References at or above this value name an existing cell vertex.
pub const VERTEX_REF: u8 = 100;

/// Decoded primitive reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableRef {
    Edge(usize),
    Vertex(usize),
}

impl TableRef {
    #[inline]
    pub fn decode(r: u8) -> Self {
        if r >= VERTEX_REF {
            TableRef::Vertex((r - VERTEX_REF) as usize)
        } else {
            TableRef::Edge(r as usize)
        }
    }
}

/// Flattened lookup table: for each mask, a list of primitives.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseTable {
    /// `case_offsets[m]..case_offsets[m + 1]` indexes `primitives`.
    case_offsets: Vec<usize>,
    /// `(start, len)` into `refs`.
    primitives: Vec<(usize, usize)>,
    refs: Vec<u8>,
}

impl CaseTable {
    pub fn from_cases(cases: &[&[&[u8]]]) -> Self {
        Self::from_generated(cases.iter().map(|case| case.iter().map(|p| p.to_vec()).collect()))
    }

    pub(crate) fn from_generated<I>(cases: I) -> Self
    where
        I: IntoIterator<Item = Vec<Vec<u8>>>,
    {
        let mut table = CaseTable {
            case_offsets: vec![0],
            primitives: Vec::new(),
            refs: Vec::new(),
        };
        for case in cases {
            for prim in case {
                table.primitives.push((table.refs.len(), prim.len()));
                table.refs.extend_from_slice(&prim);
            }
            table.case_offsets.push(table.primitives.len());
        }
        table
    }

    /// Number of masks covered.
    pub fn len(&self) -> usize {
        self.case_offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Primitives for `mask`.
    pub fn case(&self, mask: usize) -> impl Iterator<Item = &[u8]> + '_ {
        let range = self.case_offsets[mask]..self.case_offsets[mask + 1];
        self.primitives[range].iter().map(|&(start, len)| &self.refs[start..start + len])
    }
}

/// A cell (or one simplex of a cell's decomposition) seen by the engine.
pub(crate) struct CutCell<'c> {
    pub points: &'c [[f64; 3]],
    pub ids: &'c [i64],
    pub scalars: &'c [f64],
    pub edges: &'c [[usize; 2]],
}

/// Bitmask of vertices with `scalar >= value`.
pub fn case_mask(scalars: &[f64], value: f64) -> usize {
    scalars
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s >= value)
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

/// Kind of an output primitive with `n` distinct points in dimension `dim`.
fn primitive_kind(dim: usize, n: usize) -> Option<CellKind> {
    match (dim, n) {
        (1, 2) => Some(CellKind::Line),
        (2, 3) => Some(CellKind::Triangle),
        (2, 4) => Some(CellKind::Quad),
        (3, 4) => Some(CellKind::Tetra),
        (3, 6) => Some(CellKind::Wedge),
        _ => None,
    }
}

struct Emitter<'c, 'a, 'b> {
    cell: &'c CutCell<'c>,
    value: f64,
    ctx: &'b mut CutContext<'a>,
    edge_points: Vec<Option<usize>>,
    vertex_points: Vec<Option<usize>>,
}

impl<'c, 'a, 'b> Emitter<'c, 'a, 'b> {
    fn new(cell: &'c CutCell<'c>, value: f64, ctx: &'b mut CutContext<'a>) -> Self {
        Self {
            cell,
            value,
            ctx,
            edge_points: vec![None; cell.edges.len()],
            vertex_points: vec![None; cell.points.len()],
        }
    }

    fn resolve(&mut self, r: u8) -> usize {
        match TableRef::decode(r) {
            TableRef::Vertex(v) => {
                if let Some(id) = self.vertex_points[v] {
                    return id;
                }
                let id = self.ctx.insert_vertex(self.cell.points[v], self.cell.ids[v]);
                self.vertex_points[v] = Some(id);
                id
            }
            TableRef::Edge(e) => {
                if let Some(id) = self.edge_points[e] {
                    return id;
                }
                // Interpolate from the low-scalar end so shared edges agree across cells.
                let [mut a, mut b] = self.cell.edges[e];
                if self.cell.scalars[a] > self.cell.scalars[b] {
                    std::mem::swap(&mut a, &mut b);
                }
                let (sa, sb) = (self.cell.scalars[a], self.cell.scalars[b]);
                let t = if sb == sa { 0.0 } else { (self.value - sa) / (sb - sa) };
                let x = lerp(&self.cell.points[a], &self.cell.points[b], t);
                let id = self.ctx.insert_edge_point(x, self.cell.ids[a], self.cell.ids[b], t);
                self.edge_points[e] = Some(id);
                id
            }
        }
    }

    fn emit(&mut self, out: &mut CellArray, dim: usize, ids: &[usize]) {
        let distinct = ids.iter().enumerate().all(|(i, id)| !ids[..i].contains(id));
        if distinct {
            if let Some(kind) = primitive_kind(dim, ids.len()) {
                self.ctx.emit(out, kind, ids);
            }
            return;
        }

        // Collapsed quads and wedges are re-split so no area or volume is lost.
        match (dim, ids.len()) {
            (2, 4) => {
                for tri in [[ids[0], ids[1], ids[2]], [ids[0], ids[2], ids[3]]] {
                    self.emit_if_distinct(out, CellKind::Triangle, &tri);
                }
            }
            (3, 6) => {
                for tet in tables::WEDGE_TETRAS {
                    let tet = tet.map(|k| ids[k]);
                    self.emit_if_distinct(out, CellKind::Tetra, &tet);
                }
            }
            _ => {}
        }
    }

    fn emit_if_distinct(&mut self, out: &mut CellArray, kind: CellKind, ids: &[usize]) {
        if ids.iter().enumerate().all(|(i, id)| !ids[..i].contains(id)) {
            self.ctx.emit(out, kind, ids);
        }
    }
}

/// Emits the primitives of one case, with output dimension `dim`.
fn run_case(cell: &CutCell, table: &CaseTable, mask: usize, value: f64, dim: usize, ctx: &mut CutContext, out: &mut CellArray) {
    let mut emitter = Emitter::new(cell, value, ctx);
    let mut ids = Vec::with_capacity(6);
    for prim in table.case(mask) {
        ids.clear();
        for &r in prim {
            let id = emitter.resolve(r);
            ids.push(id);
        }
        emitter.emit(out, dim, &ids);
    }
}

/// Contours one cell against `value`; `dim` is the dimension of the produced primitives.
pub(crate) fn contour_cell(cell: &CutCell, table: &CaseTable, value: f64, dim: usize, ctx: &mut CutContext, out: &mut CellArray) {
    let mask = case_mask(cell.scalars, value);
    run_case(cell, table, mask, value, dim, ctx, out);
}

/// Clips one cell against `value`; `dim` is the cell's own dimension.
pub(crate) fn clip_cell(
    cell: &CutCell,
    table: &CaseTable,
    value: f64,
    inside_out: bool,
    dim: usize,
    ctx: &mut CutContext,
    out: &mut CellArray,
) {
    let full = (1usize << cell.points.len()) - 1;
    let mut mask = case_mask(cell.scalars, value);
    if inside_out {
        mask = !mask & full;
    }
    run_case(cell, table, mask, value, dim, ctx, out);
}

/// Clips a 3D cell through its tetrahedral decomposition `tets` (local indices, 4 per tet).
pub(crate) fn clip_tetrahedra(
    points: &[[f64; 3]],
    ids: &[i64],
    scalars: &[f64],
    tets: &[usize],
    value: f64,
    inside_out: bool,
    ctx: &mut CutContext,
    out: &mut CellArray,
) {
    for tet in tets.chunks_exact(4) {
        let pts = [points[tet[0]], points[tet[1]], points[tet[2]], points[tet[3]]];
        let tet_ids = [ids[tet[0]], ids[tet[1]], ids[tet[2]], ids[tet[3]]];
        let s = [scalars[tet[0]], scalars[tet[1]], scalars[tet[2]], scalars[tet[3]]];
        let sub = CutCell {
            points: &pts,
            ids: &tet_ids,
            scalars: &s,
            edges: &tables::TETRA_EDGES,
        };
        clip_cell(&sub, &tables::TETRA_CLIP, value, inside_out, 3, ctx, out);
    }
}

/// Contours or clips a 2D cell through its triangle decomposition `tris` (3 per triangle).
pub(crate) fn cut_triangles(
    points: &[[f64; 3]],
    ids: &[i64],
    scalars: &[f64],
    tris: &[usize],
    value: f64,
    clip: Option<bool>,
    ctx: &mut CutContext,
    out: &mut CellArray,
) {
    for tri in tris.chunks_exact(3) {
        let pts = [points[tri[0]], points[tri[1]], points[tri[2]]];
        let tri_ids = [ids[tri[0]], ids[tri[1]], ids[tri[2]]];
        let s = [scalars[tri[0]], scalars[tri[1]], scalars[tri[2]]];
        let sub = CutCell {
            points: &pts,
            ids: &tri_ids,
            scalars: &s,
            edges: &tables::TRIANGLE_EDGES,
        };
        match clip {
            None => contour_cell(&sub, &tables::TRIANGLE_CONTOUR, value, 1, ctx, out),
            Some(inside_out) => clip_cell(&sub, &tables::TRIANGLE_CLIP, value, inside_out, 2, ctx, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::MergePoints;

    #[test]
    fn test_case_mask() {
        assert_eq!(case_mask(&[0.0, 1.0, 2.0, 0.5], 1.0), 0b0110);
        assert_eq!(case_mask(&[1.0, 1.0], 1.0), 0b11);
    }

    #[test]
    fn test_table_ref_decode() {
        assert_eq!(TableRef::decode(3), TableRef::Edge(3));
        assert_eq!(TableRef::decode(102), TableRef::Vertex(2));
    }

    #[test]
    fn test_equal_scalars_give_zero_parameter() {
        let points = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let cell = CutCell {
            points: &points,
            ids: &[0, 1],
            scalars: &[2.0, 2.0],
            edges: &[[0, 1]],
        };
        let mut locator = MergePoints::new();
        let mut ctx = CutContext::new(&mut locator);
        let mut emitter = Emitter::new(&cell, 2.0, &mut ctx);
        let id = emitter.resolve(0);
        assert_eq!(locator.points()[id], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_collapsed_quad_resplits() {
        let points = [[0.0; 3]; 3];
        let cell = CutCell {
            points: &points,
            ids: &[0, 1, 2],
            scalars: &[0.0; 3],
            edges: &[],
        };
        let mut locator = MergePoints::new();
        let mut ctx = CutContext::new(&mut locator);
        let mut out = CellArray::new();
        let mut emitter = Emitter::new(&cell, 0.0, &mut ctx);
        emitter.emit(&mut out, 2, &[4, 4, 5, 6]);
        assert_eq!(out.len(), 1);
        assert_eq!(out.get(0), Some((CellKind::Triangle, &[4usize, 5, 6][..])));
    }
}
