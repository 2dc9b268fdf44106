//! Edge, face and case tables for every cell kind.
//!
//! Triangle, quad and tetra cases are written out by hand. Pyramid and
//! pentagonal prism contour cases are generated from face topology the first
//! time they are used.

use std::sync::LazyLock;

use super::CaseTable;

// =============================================================================
// TRIANGLE
// =============================================================================

pub const TRIANGLE_EDGES: [[usize; 2]; 3] = [
    [0, 1], // edge 0
    [1, 2], // edge 1
    [2, 0], // edge 2
];

/// Segments oriented so the `>= value` side lies to the left (counterclockwise cell).
const TRIANGLE_CONTOUR_CASES: [&[&[u8]]; 8] = [
    &[],
    &[&[0, 2]],
    &[&[1, 0]],
    &[&[1, 2]],
    &[&[2, 1]],
    &[&[0, 1]],
    &[&[2, 0]],
    &[],
];

const TRIANGLE_CLIP_CASES: [&[&[u8]]; 8] = [
    &[],
    &[&[100, 0, 2]],
    &[&[101, 1, 0]],
    &[&[100, 101, 1, 2]],
    &[&[102, 2, 1]],
    &[&[100, 0, 1, 102]],
    &[&[101, 102, 2, 0]],
    &[&[100, 101, 102]],
];

// =============================================================================
// QUAD
// =============================================================================

pub const QUAD_EDGES: [[usize; 2]; 4] = [
    [0, 1], // edge 0
    [1, 2], // edge 1
    [2, 3], // edge 2
    [3, 0], // edge 3
];

/// Ambiguous case 5 (vertices 0 and 2 kept) joins the kept corners through the centre.
const QUAD_CONTOUR_CASES: [&[&[u8]]; 16] = [
    &[],
    &[&[0, 3]],
    &[&[1, 0]],
    &[&[1, 3]],
    &[&[2, 1]],
    &[&[0, 1], &[2, 3]],
    &[&[2, 0]],
    &[&[2, 3]],
    &[&[3, 2]],
    &[&[0, 2]],
    &[&[1, 0], &[3, 2]],
    &[&[1, 2]],
    &[&[3, 1]],
    &[&[0, 1]],
    &[&[3, 0]],
    &[],
];

const QUAD_CLIP_CASES: [&[&[u8]]; 16] = [
    &[],
    &[&[100, 0, 3]],
    &[&[101, 1, 0]],
    &[&[100, 101, 1, 3]],
    &[&[102, 2, 1]],
    &[&[100, 0, 1, 102], &[102, 2, 3, 100]],
    &[&[101, 102, 2, 0]],
    &[&[100, 101, 102, 2], &[100, 2, 3]],
    &[&[103, 3, 2]],
    &[&[100, 0, 2, 103]],
    &[&[101, 1, 0], &[103, 3, 2]],
    &[&[100, 101, 1, 2], &[100, 2, 103]],
    &[&[102, 103, 3, 1]],
    &[&[100, 0, 1, 102], &[100, 102, 103]],
    &[&[101, 102, 103, 3], &[101, 3, 0]],
    &[&[100, 101, 102, 103]],
];

// =============================================================================
// TETRA
// =============================================================================

pub const TETRA_EDGES: [[usize; 2]; 6] = [
    [0, 1], // edge 0
    [1, 2], // edge 1
    [0, 2], // edge 2
    [0, 3], // edge 3
    [1, 3], // edge 4
    [2, 3], // edge 5
];

pub const TETRA_FACES: [&[usize]; 4] = [&[0, 1, 3], &[1, 2, 3], &[2, 0, 3], &[0, 2, 1]];

/// One kept vertex gives a tetra, two or three give a wedge `(a, b, c, d, e, f)`
/// with triangles `abc`/`def` and lateral edges `ad`, `be`, `cf`.
const TETRA_CLIP_CASES: [&[&[u8]]; 16] = [
    &[],
    &[&[100, 0, 2, 3]],
    &[&[101, 0, 1, 4]],
    &[&[100, 2, 3, 101, 1, 4]],
    &[&[102, 2, 1, 5]],
    &[&[100, 0, 3, 102, 1, 5]],
    &[&[101, 0, 4, 102, 2, 5]],
    &[&[100, 101, 102, 3, 4, 5]],
    &[&[103, 3, 4, 5]],
    &[&[100, 0, 2, 103, 4, 5]],
    &[&[101, 0, 1, 103, 3, 5]],
    &[&[100, 101, 103, 2, 1, 5]],
    &[&[102, 2, 1, 103, 3, 4]],
    &[&[100, 102, 103, 0, 1, 4]],
    &[&[101, 102, 103, 0, 2, 3]],
    &[&[100, 101, 102, 103]],
];

/// Wedge `(0..6)` split into three tetrahedra.
pub const WEDGE_TETRAS: [[usize; 4]; 3] = [[0, 1, 2, 5], [0, 1, 5, 4], [0, 4, 5, 3]];

// =============================================================================
// PYRAMID
// =============================================================================

pub const PYRAMID_EDGES: [[usize; 2]; 8] = [
    [0, 1], // edge 0
    [1, 2], // edge 1
    [2, 3], // edge 2
    [3, 0], // edge 3
    [0, 4], // edge 4
    [1, 4], // edge 5
    [2, 4], // edge 6
    [3, 4], // edge 7
];

/// Outward-oriented faces.
pub const PYRAMID_FACES: [&[usize]; 5] = [&[0, 3, 2, 1], &[0, 1, 4], &[1, 2, 4], &[2, 3, 4], &[3, 0, 4]];

// =============================================================================
// PENTAGONAL PRISM
// =============================================================================

pub const PENTAGONAL_PRISM_EDGES: [[usize; 2]; 15] = [
    // bottom
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 4],
    [4, 0],
    // top
    [5, 6],
    [6, 7],
    [7, 8],
    [8, 9],
    [9, 5],
    // vertical
    [0, 5],
    [1, 6],
    [2, 7],
    [3, 8],
    [4, 9],
];

/// Outward-oriented faces.
pub const PENTAGONAL_PRISM_FACES: [&[usize]; 7] = [
    &[0, 4, 3, 2, 1],
    &[5, 6, 7, 8, 9],
    &[0, 1, 6, 5],
    &[1, 2, 7, 6],
    &[2, 3, 8, 7],
    &[3, 4, 9, 8],
    &[4, 0, 5, 9],
];

// =============================================================================
// TABLES
// =============================================================================

pub static TRIANGLE_CONTOUR: LazyLock<CaseTable> = LazyLock::new(|| CaseTable::from_cases(&TRIANGLE_CONTOUR_CASES));
pub static TRIANGLE_CLIP: LazyLock<CaseTable> = LazyLock::new(|| CaseTable::from_cases(&TRIANGLE_CLIP_CASES));
pub static QUAD_CONTOUR: LazyLock<CaseTable> = LazyLock::new(|| CaseTable::from_cases(&QUAD_CONTOUR_CASES));
pub static QUAD_CLIP: LazyLock<CaseTable> = LazyLock::new(|| CaseTable::from_cases(&QUAD_CLIP_CASES));
pub static TETRA_CLIP: LazyLock<CaseTable> = LazyLock::new(|| CaseTable::from_cases(&TETRA_CLIP_CASES));
pub static TETRA_CONTOUR: LazyLock<CaseTable> =
    LazyLock::new(|| polyhedron_contour_table(4, &TETRA_EDGES, &TETRA_FACES));
pub static PYRAMID_CONTOUR: LazyLock<CaseTable> =
    LazyLock::new(|| polyhedron_contour_table(5, &PYRAMID_EDGES, &PYRAMID_FACES));
pub static PENTAGONAL_PRISM_CONTOUR: LazyLock<CaseTable> =
    LazyLock::new(|| polyhedron_contour_table(10, &PENTAGONAL_PRISM_EDGES, &PENTAGONAL_PRISM_FACES));

fn edge_index(edges: &[[usize; 2]], a: usize, b: usize) -> Option<usize> {
    edges.iter().position(|&[u, v]| (u == a && v == b) || (u == b && v == a))
}

/// Builds the contour table of a convex polyhedron with outward faces.
///
/// On each face, every run of kept vertices (`>= value`) contributes one
/// segment from the cut where the boundary walk enters the kept run to the cut
/// where it leaves. Each cut edge starts exactly one segment, so segments chain
/// into closed loops. Loops are reversed (normals toward the kept side) and
/// fanned into triangles.
pub(crate) fn polyhedron_contour_table(vertex_count: usize, edges: &[[usize; 2]], faces: &[&[usize]]) -> CaseTable {
    let cases = (0..1usize << vertex_count).map(|mask| {
        let kept = |v: usize| mask & (1 << v) != 0;
        let mut next_of: Vec<Option<usize>> = vec![None; edges.len()];

        for face in faces {
            let m = face.len();
            let mut cuts: Vec<(usize, bool)> = Vec::new();
            for k in 0..m {
                let (a, b) = (face[k], face[(k + 1) % m]);
                if kept(a) != kept(b) {
                    if let Some(e) = edge_index(edges, a, b) {
                        cuts.push((e, kept(b)));
                    }
                }
            }
            for (i, &(e, entering)) in cuts.iter().enumerate() {
                if entering {
                    next_of[e] = Some(cuts[(i + 1) % cuts.len()].0);
                }
            }
        }

        let mut used = vec![false; edges.len()];
        let mut triangles = Vec::new();
        for start in 0..edges.len() {
            if used[start] || next_of[start].is_none() {
                continue;
            }
            let mut cycle = Vec::new();
            let mut e = start;
            while !used[e] {
                used[e] = true;
                cycle.push(e as u8);
                match next_of[e] {
                    Some(n) => e = n,
                    None => break,
                }
            }
            cycle.reverse();
            for k in 1..cycle.len().saturating_sub(1) {
                triangles.push(vec![cycle[0], cycle[k], cycle[k + 1]]);
            }
        }
        triangles
    });
    CaseTable::from_generated(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::VERTEX_REF;

    fn refs_valid(table: &CaseTable, edge_count: usize, vertex_count: usize) -> bool {
        (0..table.len()).all(|m| {
            table.case(m).flatten().all(|&r| {
                if r >= VERTEX_REF {
                    ((r - VERTEX_REF) as usize) < vertex_count
                } else {
                    (r as usize) < edge_count
                }
            })
        })
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(TRIANGLE_CONTOUR.len(), 8);
        assert_eq!(QUAD_CLIP.len(), 16);
        assert_eq!(TETRA_CLIP.len(), 16);
        assert_eq!(PYRAMID_CONTOUR.len(), 32);
        assert_eq!(PENTAGONAL_PRISM_CONTOUR.len(), 1024);
    }

    #[test]
    fn test_refs_in_range() {
        assert!(refs_valid(&TRIANGLE_CLIP, 3, 3));
        assert!(refs_valid(&QUAD_CLIP, 4, 4));
        assert!(refs_valid(&QUAD_CONTOUR, 4, 0));
        assert!(refs_valid(&TETRA_CLIP, 6, 4));
        assert!(refs_valid(&PYRAMID_CONTOUR, 8, 0));
        assert!(refs_valid(&PENTAGONAL_PRISM_CONTOUR, 15, 0));
    }

    #[test]
    fn test_quad_contour_complement_reverses() {
        for mask in 1..15 {
            let a: Vec<Vec<u8>> = QUAD_CONTOUR.case(mask).map(|p| p.to_vec()).collect();
            let b: Vec<Vec<u8>> = QUAD_CONTOUR.case(15 - mask).map(|p| vec![p[1], p[0]]).collect();
            for seg in &a {
                assert!(b.contains(seg), "mask {} segment {:?} not mirrored", mask, seg);
            }
        }
    }

    #[test]
    fn test_generated_tetra_matches_single_cut() {
        // One vertex kept: a single triangle across its three edges.
        let tris: Vec<&[u8]> = TETRA_CONTOUR.case(0b0001).collect();
        assert_eq!(tris.len(), 1);
        let mut edges = tris[0].to_vec();
        edges.sort();
        assert_eq!(edges, vec![0, 2, 3]);
    }

    #[test]
    fn test_generated_cases_use_only_cut_edges() {
        for mask in 0..PENTAGONAL_PRISM_CONTOUR.len() {
            for tri in PENTAGONAL_PRISM_CONTOUR.case(mask) {
                assert_eq!(tri.len(), 3);
                for &e in tri {
                    let [a, b] = PENTAGONAL_PRISM_EDGES[e as usize];
                    let (ka, kb) = (mask & (1 << a) != 0, mask & (1 << b) != 0);
                    assert_ne!(ka, kb, "mask {} uses uncut edge {}", mask, e);
                }
            }
        }
    }

    #[test]
    fn test_pyramid_two_kept_is_quad_section() {
        // Vertices 0 and 1 kept: cut edges 1, 3, 4, 5 form one quad (two triangles).
        let tris: Vec<&[u8]> = PYRAMID_CONTOUR.case(0b00011).collect();
        assert_eq!(tris.len(), 2);
    }
}
