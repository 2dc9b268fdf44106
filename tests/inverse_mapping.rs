use cellkern::{evaluate_positions, AnyCell, Cell, Location, NewtonSettings, Pixel, Polygon, Pyramid, Quad};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn unit_square() -> Quad {
    Quad::from_points([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]])
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

#[test]
fn test_unit_square_center() {
    let eval = unit_square().evaluate_position(&[0.5, 0.5, 0.0]);
    assert_eq!(eval.location, Location::Inside);
    assert_eq!(eval.location.code(), 1);
    for k in 0..2 {
        assert!((eval.pcoords[k] - 0.5).abs() < 1e-12);
    }
    assert_eq!(eval.pcoords[2], 0.0);
    for w in &eval.weights {
        assert!((w - 0.25).abs() < 1e-12);
    }
    assert_eq!(eval.dist2, 0.0);
}

#[test]
fn test_quad_point_above_plane() {
    let eval = unit_square().evaluate_position(&[0.25, 0.75, 2.0]);
    assert_eq!(eval.location, Location::Inside);
    assert!((eval.dist2 - 4.0).abs() < 1e-9);
    assert!((eval.closest[2]).abs() < 1e-12);
}

#[test]
fn test_quad_failure_is_distinct_from_outside() {
    let quad = unit_square().with_newton(NewtonSettings { max_iterations: 0, ..Quad::NEWTON });
    let eval = quad.evaluate_position(&[5.0, 5.0, 0.0]);
    assert_eq!(eval.location, Location::Failed);
    assert_eq!(eval.location.code(), -1);

    let outside = unit_square().evaluate_position(&[5.0, 5.0, 0.0]);
    assert_eq!(outside.location.code(), 0);
}

#[test]
fn test_pyramid_apex() {
    let pyramid = unit_pyramid();
    let eval = pyramid.evaluate_position(&[0.5, 0.5, 1.0]);
    assert_eq!(eval.location, Location::Inside);
    assert_eq!(eval.pcoords, [0.5, 0.5, 1.0]);
    assert!((eval.weights[4] - 1.0).abs() < 1e-15);
    for w in &eval.weights[..4] {
        assert!(w.abs() < 1e-15);
    }
}

#[test]
fn test_pyramid_failure_without_iterations() {
    let pyramid = unit_pyramid().with_newton(NewtonSettings { max_iterations: 0, ..Pyramid::NEWTON });
    assert_eq!(pyramid.evaluate_position(&[0.5, 0.5, 0.3]).location, Location::Failed);
}

#[test]
fn test_pixel_is_closed_form() {
    let pixel = Pixel::from_points([[1.0, 1.0, 0.0], [3.0, 1.0, 0.0], [1.0, 2.0, 0.0], [3.0, 2.0, 0.0]]);
    let eval = pixel.evaluate_position(&[2.5, 1.25, 0.0]);
    assert_eq!(eval.location, Location::Inside);
    assert!((eval.pcoords[0] - 0.75).abs() < 1e-15);
    assert!((eval.pcoords[1] - 0.25).abs() < 1e-15);
}

#[test]
fn test_polygon_notch_is_outside() {
    // L-shape: the frame covers the notch, but the point is outside the polygon.
    let polygon = Polygon::from_points(vec![
        [0.0, 0.0, 0.0],
        [2.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 2.0, 0.0],
        [0.0, 2.0, 0.0],
    ])
    .unwrap();
    let eval = polygon.evaluate_position(&[1.5, 1.5, 0.0]);
    assert_eq!(eval.location, Location::Outside);
    assert!((eval.dist2 - 0.25).abs() < 1e-12);
}

#[test]
fn test_random_round_trips_in_parallel() {
    let quad: AnyCell = Quad::from_points([[0.0, 0.0, 0.0], [3.0, 0.2, 0.0], [2.8, 2.0, 0.0], [0.3, 1.7, 0.0]]).into();
    let mut rng = StdRng::seed_from_u64(7);
    let pcoords: Vec<[f64; 3]> = (0..200)
        .map(|_| [rng.gen_range(0.05..0.95), rng.gen_range(0.05..0.95), 0.0])
        .collect();
    let points: Vec<[f64; 3]> = pcoords.iter().map(|pc| quad.evaluate_location(pc).0).collect();

    let evals = evaluate_positions(&quad, &points);
    for (eval, pc) in evals.iter().zip(&pcoords) {
        assert!(eval.is_inside());
        assert!((eval.pcoords[0] - pc[0]).abs() < 1e-6, "{:?} vs {:?}", eval.pcoords, pc);
        assert!((eval.pcoords[1] - pc[1]).abs() < 1e-6, "{:?} vs {:?}", eval.pcoords, pc);
    }
}
