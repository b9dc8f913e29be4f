//! Stroke extraction from a one-pixel skeleton.
//!
//! The skeleton is a graph with cycles, kept as flat pixel arrays and index
//! lookups rather than pointer chains. Endpoint walks capture open strokes,
//! a second pass over unvisited pixels captures loops, then strokes are
//! joined, pruned, smoothed and their endpoints welded.

use image::GrayImage;

use super::zhang_suen;
use super::{Point, Stroke, chaikin, douglas_peucker, moving_average, simplify_closed};

#[derive(Clone, Copy, Debug)]
pub struct MonolineOptions {
    /// Maximum endpoint-join passes.
    pub join_passes: u32,
    /// Chaikin corner-cutting iterations.
    pub chaikin_iterations: u32,
    /// Endpoint weld radius, pixels.
    pub weld_radius: f64,
}

impl Default for MonolineOptions {
    fn default() -> Self {
        Self {
            join_passes: 10,
            chaikin_iterations: 2,
            weld_radius: 3.0,
        }
    }
}

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

struct SkeletonGraph {
    width: i64,
    height: i64,
    on: Vec<bool>,
    degree: Vec<u8>,
}

impl SkeletonGraph {
    fn new(skeleton: &GrayImage) -> Self {
        let width = skeleton.width() as i64;
        let height = skeleton.height() as i64;
        let on: Vec<bool> = skeleton.pixels().map(|p| p.0[0] == 255).collect();
        let mut degree = vec![0u8; on.len()];
        for y in 0..height {
            for x in 0..width {
                let idx = (y * width + x) as usize;
                if !on[idx] {
                    continue;
                }
                let mut d = 0u8;
                for (dx, dy) in NEIGHBOR_OFFSETS {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx >= 0
                        && ny >= 0
                        && nx < width
                        && ny < height
                        && on[(ny * width + nx) as usize]
                    {
                        d += 1;
                    }
                }
                degree[idx] = d;
            }
        }
        Self {
            width,
            height,
            on,
            degree,
        }
    }

    fn point(&self, idx: usize) -> Point {
        Point::new((idx as i64 % self.width) as f64, (idx as i64 / self.width) as f64)
    }

    fn neighbors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let x = idx as i64 % self.width;
        let y = idx as i64 / self.width;
        NEIGHBOR_OFFSETS.iter().filter_map(move |&(dx, dy)| {
            let nx = x + dx;
            let ny = y + dy;
            if nx >= 0 && ny >= 0 && nx < self.width && ny < self.height {
                let n = (ny * self.width + nx) as usize;
                self.on[n].then_some(n)
            } else {
                None
            }
        })
    }

    fn is_junction(&self, idx: usize) -> bool {
        self.degree[idx] > 2
    }
}

/// Walk the skeleton into polyline strokes, pixel coordinates.
///
/// Endpoints (one neighbor) seed open walks that consume pixels until a
/// junction or dead-end; remaining untouched path pixels are walked as
/// loops, closed by duplicating the start point.
pub fn extract_strokes(skeleton: &GrayImage) -> Vec<Stroke> {
    let graph = SkeletonGraph::new(skeleton);
    let mut visited = vec![false; graph.on.len()];
    let mut strokes = Vec::new();

    // Pass 1: walks seeded at endpoints.
    for idx in 0..graph.on.len() {
        if !graph.on[idx] || graph.degree[idx] != 1 || visited[idx] {
            continue;
        }
        let mut path = vec![graph.point(idx)];
        visited[idx] = true;
        let mut current = idx;
        loop {
            let Some(next) = graph
                .neighbors(current)
                .find(|&n| !visited[n] || (graph.is_junction(n) && n != current))
            else {
                break;
            };
            if visited[next] {
                // A junction we've already passed through; record and stop.
                path.push(graph.point(next));
                break;
            }
            path.push(graph.point(next));
            if graph.is_junction(next) {
                // Leave junctions unconsumed so sibling branches also reach
                // them, but remember we touched this one.
                visited[next] = true;
                break;
            }
            visited[next] = true;
            current = next;
        }
        if path.len() >= 2 {
            strokes.push(Stroke::new(path));
        }
    }

    // Pass 2: anything left on a degree-2 pixel is part of a loop.
    for idx in 0..graph.on.len() {
        if !graph.on[idx] || visited[idx] || graph.degree[idx] != 2 {
            continue;
        }
        let start = idx;
        let mut path = vec![graph.point(start)];
        visited[start] = true;
        let mut current = start;
        loop {
            let Some(next) = graph.neighbors(current).find(|&n| !visited[n]) else {
                break;
            };
            path.push(graph.point(next));
            visited[next] = true;
            current = next;
        }
        // Close the cycle explicitly when the walk wrapped around.
        if path.len() >= 3 && graph.neighbors(current).any(|n| n == start) {
            path.push(graph.point(start));
        }
        if path.len() >= 2 {
            strokes.push(Stroke::new(path));
        }
    }

    strokes
}

/// Join strokes whose termini lie within `gap`, best (closest) pair first,
/// for up to `passes` passes. A stroke whose own endpoints fall within the
/// gap is closed on itself. Joining runs before pruning so short branches
/// are absorbed rather than discarded.
pub fn join_strokes(mut strokes: Vec<Stroke>, gap: f64, passes: u32) -> Vec<Stroke> {
    for _ in 0..passes {
        let mut changed = false;

        // Cross-stroke merges, closest pair first.
        loop {
            let Some((i, j, end_i, end_j, _)) = closest_joinable_pair(&strokes, gap) else {
                break;
            };
            let b = strokes.swap_remove(j.max(i));
            let a = strokes.swap_remove(j.min(i));
            let (first, first_end, second, second_end) =
                if i < j { (a, end_i, b, end_j) } else { (b, end_j, a, end_i) };
            strokes.push(concatenate(first, first_end, second, second_end));
            changed = true;
        }

        // Self-closure for near-closed loops.
        for stroke in strokes.iter_mut() {
            if stroke.points.len() >= 4 && !stroke.is_closed() {
                let first = stroke.points[0];
                let last = *stroke.points.last().unwrap();
                if first.distance(last) <= gap {
                    stroke.points.push(first);
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }
    strokes
}

/// Find the closest pair of open-stroke termini within `gap`.
/// Returns (stroke a, stroke b, a's end is tail?, b's end is tail?, dist).
fn closest_joinable_pair(strokes: &[Stroke], gap: f64) -> Option<(usize, usize, bool, bool, f64)> {
    let mut best: Option<(usize, usize, bool, bool, f64)> = None;
    for i in 0..strokes.len() {
        if strokes[i].is_closed() {
            continue;
        }
        for j in i + 1..strokes.len() {
            if strokes[j].is_closed() {
                continue;
            }
            for (end_i, pi) in endpoint_pair(&strokes[i]) {
                for (end_j, pj) in endpoint_pair(&strokes[j]) {
                    let d = pi.distance(pj);
                    if d <= gap && best.map_or(true, |b| d < b.4) {
                        best = Some((i, j, end_i, end_j, d));
                    }
                }
            }
        }
    }
    best
}

fn endpoint_pair(stroke: &Stroke) -> [(bool, Point); 2] {
    [
        (false, stroke.points[0]),
        (true, *stroke.points.last().unwrap()),
    ]
}

/// Concatenate `b` onto `a`, reorienting both so the matched termini meet.
fn concatenate(mut a: Stroke, a_tail: bool, mut b: Stroke, b_tail: bool) -> Stroke {
    if !a_tail {
        a.points.reverse();
    }
    if b_tail {
        b.points.reverse();
    }
    a.points.extend(b.points);
    a
}

/// Drop strokes shorter than `min_length`.
pub fn prune_strokes(strokes: Vec<Stroke>, min_length: f64) -> Vec<Stroke> {
    strokes
        .into_iter()
        .filter(|s| s.length() >= min_length)
        .collect()
}

/// Cluster all stroke endpoints within `radius` (union-find) and snap each
/// cluster to its centroid, so strokes that should meet share exact
/// coordinates.
pub fn weld_endpoints(strokes: &mut [Stroke], radius: f64) {
    let mut endpoints: Vec<(usize, bool, Point)> = Vec::new();
    for (i, stroke) in strokes.iter().enumerate() {
        if stroke.points.is_empty() {
            continue;
        }
        endpoints.push((i, false, stroke.points[0]));
        endpoints.push((i, true, *stroke.points.last().unwrap()));
    }

    let mut parent: Vec<usize> = (0..endpoints.len()).collect();
    fn find(parent: &mut Vec<usize>, i: usize) -> usize {
        if parent[i] != i {
            let root = find(parent, parent[i]);
            parent[i] = root;
        }
        parent[i]
    }

    for i in 0..endpoints.len() {
        for j in i + 1..endpoints.len() {
            if endpoints[i].2.distance(endpoints[j].2) <= radius {
                let ri = find(&mut parent, i);
                let rj = find(&mut parent, j);
                if ri != rj {
                    parent[ri] = rj;
                }
            }
        }
    }

    let mut sums: std::collections::HashMap<usize, (f64, f64, usize)> =
        std::collections::HashMap::new();
    for i in 0..endpoints.len() {
        let root = find(&mut parent, i);
        let entry = sums.entry(root).or_insert((0.0, 0.0, 0));
        entry.0 += endpoints[i].2.x;
        entry.1 += endpoints[i].2.y;
        entry.2 += 1;
    }

    for i in 0..endpoints.len() {
        let root = find(&mut parent, i);
        let (sx, sy, n) = sums[&root];
        if n < 2 {
            continue;
        }
        let centroid = Point::new(sx / n as f64, sy / n as f64);
        let (stroke_idx, tail, _) = endpoints[i];
        let points = &mut strokes[stroke_idx].points;
        if tail {
            *points.last_mut().unwrap() = centroid;
        } else {
            points[0] = centroid;
        }
    }
}

/// Endpoint pairs that are close but not coincident. Zero after welding.
pub fn count_nearby_endpoints(strokes: &[Stroke], radius: f64) -> usize {
    let mut endpoints: Vec<Point> = Vec::new();
    for stroke in strokes {
        if stroke.points.is_empty() {
            continue;
        }
        endpoints.push(stroke.points[0]);
        endpoints.push(*stroke.points.last().unwrap());
    }
    let mut count = 0;
    for i in 0..endpoints.len() {
        for j in i + 1..endpoints.len() {
            let d = endpoints[i].distance(endpoints[j]);
            if d > 0.0 && d <= radius {
                count += 1;
            }
        }
    }
    count
}

/// Full monoline pipeline for one cell mask: thin, walk, join, prune,
/// smooth, weld. Coordinates stay in mask pixels.
pub fn monoline_from_mask(mask: &GrayImage, opts: &MonolineOptions) -> Vec<Stroke> {
    let skeleton = zhang_suen(mask);
    let strokes = extract_strokes(&skeleton);
    if strokes.is_empty() {
        return strokes;
    }

    let bounds = strokes
        .iter()
        .map(Stroke::bounds)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    let min_side = bounds.width.min(bounds.height).max(1.0);

    let gap = (0.3 * min_side).max(5.0);
    let strokes = join_strokes(strokes, gap, opts.join_passes);

    let min_length = (0.05 * min_side).max(3.0);
    let strokes = prune_strokes(strokes, min_length);

    let epsilon = (0.005 * min_side).max(0.5);
    let mut smoothed: Vec<Stroke> = strokes
        .iter()
        .map(|s| smooth_stroke(s, opts.chaikin_iterations, epsilon))
        .collect();

    weld_endpoints(&mut smoothed, opts.weld_radius);
    tracing::trace!(
        strokes = smoothed.len(),
        gap,
        min_length,
        "monoline strokes extracted"
    );
    smoothed
}

fn smooth_stroke(stroke: &Stroke, chaikin_iterations: u32, epsilon: f64) -> Stroke {
    if stroke.is_closed() {
        // Treat as a ring: strip the duplicate, smooth cyclically, re-close.
        let ring = &stroke.points[..stroke.points.len() - 1];
        let averaged = moving_average(ring, 2);
        let cut = chaikin(&averaged, chaikin_iterations, true);
        let mut simplified = simplify_closed(&cut, epsilon);
        if let Some(&first) = simplified.first() {
            simplified.push(first);
        }
        Stroke::new(simplified)
    } else {
        let averaged = moving_average(&stroke.points, 2);
        let cut = chaikin(&averaged, chaikin_iterations, false);
        Stroke::new(douglas_peucker(&cut, epsilon))
    }
}
