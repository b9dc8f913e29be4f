//! SVG path sub-dialect emission.
//!
//! Commands are a strict subset {M, L, Q, C, Z}, absolute, whitespace
//! separated, one command letter per segment. Multi-contour paths
//! concatenate segments; every closed contour ends with Z.

use crate::vector::{Contour, Point, Stroke};

/// Format a coordinate with one decimal of precision, trimming `.0`.
fn fmt_num(v: f64) -> String {
    let rounded = (v * 10.0).round() / 10.0;
    if (rounded - rounded.round()).abs() < 1e-9 {
        format!("{}", rounded.round() as i64)
    } else {
        format!("{rounded:.1}")
    }
}

fn push_point(out: &mut String, p: Point) {
    out.push_str(&fmt_num(p.x));
    out.push(' ');
    out.push_str(&fmt_num(p.y));
}

/// Filled glyph path: outlines first, then holes, non-zero winding doing the
/// subtraction. With `emit_curves`, each contour becomes a chain of
/// quadratic segments through edge midpoints, the traced vertices acting as
/// control points; otherwise contours are emitted as polylines.
pub fn fill_path(outlines: &[Contour], holes: &[Contour], emit_curves: bool) -> String {
    let mut out = String::new();
    for contour in outlines.iter().chain(holes.iter()) {
        if contour.points.len() < 3 {
            continue;
        }
        if emit_curves {
            quadratic_ring(&mut out, &contour.points);
        } else {
            polyline_ring(&mut out, &contour.points);
        }
    }
    out.trim_end().to_string()
}

/// Monoline stroke path: open polylines, no Z, no fill semantics.
pub fn stroke_path(strokes: &[Stroke]) -> String {
    let mut out = String::new();
    for stroke in strokes {
        if stroke.points.len() < 2 {
            continue;
        }
        out.push_str("M ");
        push_point(&mut out, stroke.points[0]);
        for &p in &stroke.points[1..] {
            out.push_str(" L ");
            push_point(&mut out, p);
        }
        out.push(' ');
    }
    out.trim_end().to_string()
}

fn polyline_ring(out: &mut String, points: &[Point]) {
    out.push_str("M ");
    push_point(out, points[0]);
    for &p in &points[1..] {
        out.push_str(" L ");
        push_point(out, p);
    }
    out.push_str(" Z ");
}

fn quadratic_ring(out: &mut String, points: &[Point]) {
    let n = points.len();
    let mid = |i: usize| {
        let a = points[i % n];
        let b = points[(i + 1) % n];
        Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    };

    out.push_str("M ");
    push_point(out, mid(0));
    for i in 1..=n {
        out.push_str(" Q ");
        push_point(out, points[i % n]);
        out.push(' ');
        push_point(out, mid(i));
    }
    out.push_str(" Z ");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Contour {
        Contour::new(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ])
    }

    #[test]
    fn polyline_path_shape() {
        let path = fill_path(&[square()], &[], false);
        assert_eq!(path, "M 0 0 L 100 0 L 100 100 L 0 100 Z");
    }

    #[test]
    fn quadratic_path_uses_midpoints() {
        let path = fill_path(&[square()], &[], true);
        assert!(path.starts_with("M 50 0"));
        assert_eq!(path.matches('Q').count(), 4);
        assert!(path.ends_with('Z'));
    }

    #[test]
    fn holes_concatenate_after_outlines() {
        let hole = Contour::new(vec![
            Point::new(25.0, 25.0),
            Point::new(25.0, 75.0),
            Point::new(75.0, 75.0),
            Point::new(75.0, 25.0),
        ]);
        let path = fill_path(&[square()], &[hole], false);
        assert_eq!(path.matches('M').count(), 2);
        assert_eq!(path.matches('Z').count(), 2);
    }

    #[test]
    fn stroke_path_has_no_close_command() {
        let stroke = Stroke::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.5, 2.25),
            Point::new(20.0, 0.0),
        ]);
        let path = stroke_path(&[stroke]);
        assert_eq!(path, "M 0 0 L 10.5 2.3 L 20 0");
    }

    #[test]
    fn command_alphabet_is_restricted() {
        let path = fill_path(&[square()], &[], true);
        for token in path.split_whitespace() {
            if token.parse::<f64>().is_ok() {
                continue;
            }
            assert!(
                matches!(token, "M" | "L" | "Q" | "C" | "Z"),
                "unexpected token {token}"
            );
        }
    }

    #[test]
    fn numbers_are_trimmed() {
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(12.34), "12.3");
        assert_eq!(fmt_num(-0.05), "-0.1");
    }
}
