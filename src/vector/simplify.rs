//! Polyline smoothing and simplification.

use super::Point;

/// Perpendicular distance from `p` to the chord `a`-`b`. Falls back to the
/// point distance when the chord is degenerate.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= 1e-12 {
        return p.distance(a);
    }
    ((dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs()) / len_sq.sqrt()
}

/// Douglas-Peucker simplification of an open polyline.
///
/// `epsilon <= 0` is the identity. Endpoints are always kept.
pub fn douglas_peucker(points: &[Point], epsilon: f64) -> Vec<Point> {
    if epsilon <= 0.0 || points.len() < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = stack.pop() {
        if last <= first + 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_idx = first;
        for i in first + 1..last {
            let d = perpendicular_distance(points[i], points[first], points[last]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((first, max_idx));
            stack.push((max_idx, last));
        }
    }

    points
        .iter()
        .zip(keep.iter())
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Douglas-Peucker for a closed ring (no duplicated end point).
///
/// The ring is split at the vertex farthest from the first point so both
/// chains have meaningful anchors, then each chain is simplified.
pub fn simplify_closed(points: &[Point], epsilon: f64) -> Vec<Point> {
    if epsilon <= 0.0 || points.len() < 4 {
        return points.to_vec();
    }

    let anchor = points[0];
    let mut split = points.len() / 2;
    let mut max_dist = 0.0;
    for (i, p) in points.iter().enumerate().skip(1) {
        let d = p.distance(anchor);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }

    let first_half = douglas_peucker(&points[..=split], epsilon);
    let mut second: Vec<Point> = points[split..].to_vec();
    second.push(anchor);
    let second_half = douglas_peucker(&second, epsilon);

    let mut out = first_half;
    // Both halves carry the split vertex, and the second half closes back on
    // the anchor which is already first.
    out.extend_from_slice(&second_half[1..second_half.len() - 1]);
    out
}

/// Chaikin corner cutting. Each iteration replaces every vertex with two
/// points at 1/4 and 3/4 along its adjacent edges. Open polylines keep their
/// endpoints fixed.
pub fn chaikin(points: &[Point], iterations: u32, closed: bool) -> Vec<Point> {
    let mut current = points.to_vec();
    for _ in 0..iterations {
        if current.len() < 3 {
            break;
        }
        let mut next = Vec::with_capacity(current.len() * 2);
        if closed {
            for i in 0..current.len() {
                let a = current[i];
                let b = current[(i + 1) % current.len()];
                next.push(lerp(a, b, 0.25));
                next.push(lerp(a, b, 0.75));
            }
        } else {
            next.push(current[0]);
            for w in current.windows(2) {
                next.push(lerp(w[0], w[1], 0.25));
                next.push(lerp(w[0], w[1], 0.75));
            }
            next.push(*current.last().unwrap());
        }
        current = next;
    }
    current
}

/// Moving-average smoothing over `window` neighbors on each side.
/// Endpoints are preserved so strokes keep their termini.
pub fn moving_average(points: &[Point], window: usize) -> Vec<Point> {
    if window == 0 || points.len() < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for i in 1..points.len() - 1 {
        let lo = i.saturating_sub(window);
        let hi = (i + window).min(points.len() - 1);
        let mut sx = 0.0;
        let mut sy = 0.0;
        for p in &points[lo..=hi] {
            sx += p.x;
            sy += p.y;
        }
        let n = (hi - lo + 1) as f64;
        out.push(Point::new(sx / n, sy / n));
    }
    out.push(points[points.len() - 1]);
    out
}

fn lerp(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.05),
            Point::new(2.0, -0.02),
            Point::new(3.0, 4.0),
            Point::new(4.0, 4.1),
            Point::new(5.0, 4.0),
        ]
    }

    #[test]
    fn dp_zero_epsilon_is_identity() {
        let points = zigzag();
        assert_eq!(douglas_peucker(&points, 0.0), points);
    }

    #[test]
    fn dp_removes_near_collinear_points() {
        let simplified = douglas_peucker(&zigzag(), 0.2);
        assert!(simplified.len() < zigzag().len());
        assert_eq!(simplified[0], zigzag()[0]);
        assert_eq!(*simplified.last().unwrap(), *zigzag().last().unwrap());
    }

    #[test]
    fn dp_is_idempotent() {
        let once = douglas_peucker(&zigzag(), 0.2);
        let twice = douglas_peucker(&once, 0.2);
        assert_eq!(once, twice);
    }

    #[test]
    fn dp_keeps_sharp_corner() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
        ];
        let simplified = douglas_peucker(&points, 0.5);
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn closed_simplification_preserves_square() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let simplified = simplify_closed(&square, 0.5);
        // The collinear midpoint on the top edge goes away, corners stay.
        assert_eq!(simplified.len(), 4);
    }

    #[test]
    fn chaikin_rounds_corners() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let smoothed = chaikin(&points, 1, false);
        assert_eq!(smoothed.len(), 6);
        assert_eq!(smoothed[0], points[0]);
        assert_eq!(*smoothed.last().unwrap(), points[2]);
        // The corner vertex itself is gone.
        assert!(!smoothed.contains(&Point::new(10.0, 0.0)));
    }

    #[test]
    fn moving_average_preserves_endpoints() {
        let smoothed = moving_average(&zigzag(), 2);
        assert_eq!(smoothed[0], zigzag()[0]);
        assert_eq!(*smoothed.last().unwrap(), *zigzag().last().unwrap());
        assert_eq!(smoothed.len(), zigzag().len());
    }
}
