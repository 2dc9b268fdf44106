use cellkern::cell::tetra::tetra_volume;
use cellkern::cell::triangle::triangle_area;
use cellkern::contour::tables::WEDGE_TETRAS;
use cellkern::locator::{CellDataSink, InterpolatedScalars};
use cellkern::math::{cross, norm, sub};
use cellkern::{
    AnyCell, Cell, CellArray, CellKind, CutContext, MergePoints, PentagonalPrism, Pixel, Polygon, Pyramid, Quad, Tetra,
    Triangle,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn pentagon_point(k: usize, z: f64) -> [f64; 3] {
    let angle = (72.0 * (k + 1) as f64).to_radians();
    [angle.cos(), angle.sin(), z]
}

fn unit_pyramid() -> Pyramid {
    Pyramid::from_points([
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.5, 0.5, 1.0],
    ])
}

fn prism() -> PentagonalPrism {
    PentagonalPrism::from_points(std::array::from_fn(|i| {
        if i < 5 { pentagon_point(i, 0.0) } else { pentagon_point(i - 5, 1.0) }
    }))
}

fn pentagon_area() -> f64 {
    2.5 * 72f64.to_radians().sin()
}

fn run(cell: &AnyCell, scalars: &[f64], value: f64, clip: Option<bool>) -> (Vec<[f64; 3]>, CellArray) {
    let mut locator = MergePoints::new();
    let mut out = CellArray::new();
    {
        let mut ctx = CutContext::new(&mut locator);
        match clip {
            None => cell.contour(value, scalars, &mut ctx, &mut out),
            Some(inside_out) => cell.clip(value, scalars, inside_out, &mut ctx, &mut out),
        }
    }
    (locator.into_points(), out)
}

/// Length, area or volume of every primitive in `out`.
fn measure(points: &[[f64; 3]], out: &CellArray) -> f64 {
    out.iter()
        .map(|(kind, ids)| {
            let p = |i: usize| &points[ids[i]];
            match kind {
                CellKind::Line => norm(&sub(p(1), p(0))),
                CellKind::Triangle => triangle_area(p(0), p(1), p(2)),
                CellKind::Quad => triangle_area(p(0), p(1), p(2)) + triangle_area(p(0), p(2), p(3)),
                CellKind::Tetra => tetra_volume(p(0), p(1), p(2), p(3)).abs(),
                CellKind::Wedge => WEDGE_TETRAS
                    .iter()
                    .map(|t| tetra_volume(p(t[0]), p(t[1]), p(t[2]), p(t[3])).abs())
                    .sum(),
                other => panic!("unexpected primitive {:?}", other),
            }
        })
        .sum()
}

fn assert_no_repeated_ids(out: &CellArray) {
    for (kind, ids) in out.iter() {
        for (i, id) in ids.iter().enumerate() {
            assert!(!ids[..i].contains(id), "{:?} repeats point {}: {:?}", kind, id, ids);
        }
    }
}

#[test]
fn test_contour_is_linear_along_edges() {
    let quad: AnyCell = Quad::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]]).into();
    let scalars = [0.0, 1.0, 1.0, 0.0];

    let mut locator = MergePoints::new();
    let mut point_data = InterpolatedScalars::new(scalars.to_vec());
    let mut out = CellArray::new();
    {
        let mut ctx = CutContext::new(&mut locator).with_point_data(&mut point_data);
        quad.contour(0.3, &scalars, &mut ctx, &mut out);
    }

    assert_eq!(out.len(), 1);
    let (kind, ids) = out.get(0).unwrap();
    assert_eq!(kind, CellKind::Line);
    for &id in ids {
        assert_eq!(locator.points()[id][0], 0.3);
        assert!((point_data.output[id] - 0.3).abs() < 1e-15);
    }
}

#[test]
fn test_contour_crossing_fraction_on_skewed_scalars() {
    let tri: AnyCell = Triangle::from_points([[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 4.0, 0.0]]).into();
    // Edge 0-1 goes from 2 to 6: the crossing at 3 sits a quarter of the way along.
    let (points, out) = run(&tri, &[2.0, 6.0, 1.0], 3.0, None);
    assert_eq!(out.len(), 1);
    let (_, ids) = out.get(0).unwrap();
    let on_base = ids.iter().map(|&i| points[i]).find(|p| p[1] == 0.0).unwrap();
    assert_eq!(on_base[0], 1.0);
}

#[test]
fn test_contour_without_crossing_is_empty() {
    let tri: AnyCell = Triangle::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).into();
    assert!(run(&tri, &[0.0, 0.1, 0.2], 0.5, None).1.is_empty());
    assert!(run(&tri, &[0.6, 0.7, 0.8], 0.5, None).1.is_empty());
}

#[test]
fn test_pyramid_contour_faces_the_kept_side() {
    let pyramid: AnyCell = unit_pyramid().into();
    let scalars: Vec<f64> = pyramid.points().iter().map(|p| p[2]).collect();
    let (points, out) = run(&pyramid, &scalars, 0.5, None);

    assert!(!out.is_empty());
    assert_eq!(out.count_kind(CellKind::Triangle), out.len());
    for (_, ids) in out.iter() {
        let n = cross(&sub(&points[ids[1]], &points[ids[0]]), &sub(&points[ids[2]], &points[ids[0]]));
        assert!(n[2] > 0.0, "triangle {:?} faces {:?}", ids, n);
    }
    assert!((measure(&points, &out) - 0.25).abs() < 1e-12);
}

#[test]
fn test_prism_contour_is_a_pentagon() {
    let prism: AnyCell = prism().into();
    let scalars: Vec<f64> = prism.points().iter().map(|p| p[2]).collect();
    let (points, out) = run(&prism, &scalars, 0.5, None);
    assert_eq!(points.len(), 5);
    for (_, ids) in out.iter() {
        let n = cross(&sub(&points[ids[1]], &points[ids[0]]), &sub(&points[ids[2]], &points[ids[0]]));
        assert!(n[2] > 0.0);
    }
    assert!((measure(&points, &out) - pentagon_area()).abs() < 1e-12);
}

#[test]
fn test_tetra_contour_single_vertex_above() {
    let tetra: AnyCell = Tetra::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).into();
    let (points, out) = run(&tetra, &[0.0, 0.0, 0.0, 1.0], 0.5, None);
    assert_eq!(out.len(), 1);
    assert!((measure(&points, &out) - 0.125).abs() < 1e-12);
}

macro_rules! test_clip_completeness {
    ($test_name:ident, $cell:expr, $expected:expr) => {
        #[test]
        fn $test_name() {
            let cell: AnyCell = $cell;
            let expected: f64 = $expected;
            let mut rng = StdRng::seed_from_u64(17);
            for trial in 0..20 {
                let scalars: Vec<f64> = (0..cell.point_count()).map(|_| rng.r#gen::<f64>()).collect();

                let (kept_points, kept) = run(&cell, &scalars, 0.5, Some(false));
                let (rest_points, rest) = run(&cell, &scalars, 0.5, Some(true));
                assert_no_repeated_ids(&kept);
                assert_no_repeated_ids(&rest);

                let total = measure(&kept_points, &kept) + measure(&rest_points, &rest);
                let error = (total - expected).abs() / expected;
                assert!(error < 1e-9, "trial {}: Got {:.9}, Expected {:.9}", trial, total, expected);
            }
        }
    };
}

test_clip_completeness!(
    test_clip_triangle,
    Triangle::from_points([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 3.0, 0.0]]).into(),
    3.0
);
test_clip_completeness!(
    test_clip_quad,
    Quad::from_points([[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0], [0.0, 1.0, 0.0]]).into(),
    2.0
);
test_clip_completeness!(
    test_clip_pixel,
    Pixel::from_points([[0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 1.0, 0.0], [3.0, 1.0, 0.0]]).into(),
    3.0
);
test_clip_completeness!(
    test_clip_polygon,
    Polygon::from_points(vec![
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 2.0, 0.0],
        [0.0, 2.0, 0.0],
    ])
    .unwrap()
    .into(),
    3.0
);
test_clip_completeness!(
    test_clip_tetra,
    Tetra::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).into(),
    1.0 / 6.0
);
test_clip_completeness!(test_clip_pyramid, unit_pyramid().into(), 1.0 / 3.0);
test_clip_completeness!(test_clip_pentagonal_prism, prism().into(), pentagon_area());

#[derive(Default)]
struct CopiedCells(Vec<(usize, usize)>);

impl CellDataSink for CopiedCells {
    fn copy_cell(&mut self, source: usize, target: usize) {
        self.0.push((source, target));
    }
}

#[test]
fn test_clip_copies_cell_data_and_interpolates_points() {
    let tetra: AnyCell = Tetra::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]).into();
    let scalars = [0.0, 1.0, 1.0, 0.2];

    let mut locator = MergePoints::new();
    let mut point_data = InterpolatedScalars::new(scalars.to_vec());
    let mut cell_data = CopiedCells::default();
    let mut out = CellArray::new();
    {
        let mut ctx = CutContext::new(&mut locator)
            .with_point_data(&mut point_data)
            .with_cell_data(&mut cell_data)
            .with_cell_id(42);
        tetra.clip(0.5, &scalars, false, &mut ctx, &mut out);
    }

    assert!(!out.is_empty());
    assert_eq!(cell_data.0.len(), out.len());
    assert!(cell_data.0.iter().all(|&(source, _)| source == 42));
    // Every output point is either a kept vertex or on the iso-surface.
    for value in &point_data.output {
        assert!(*value >= 0.5 - 1e-12, "value {}", value);
    }
}
