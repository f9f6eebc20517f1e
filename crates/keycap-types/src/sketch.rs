use serde::{Deserialize, Serialize};

use crate::geometry::Point2;

/// Points closer than this are treated as the same sketch point.
pub const SKETCH_TOLERANCE: f64 = 1e-9;

/// A single curve of a planar profile, in sketch coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve2d {
    Segment { start: Point2, end: Point2 },
    /// Circular arc through three points.
    Arc { start: Point2, mid: Point2, end: Point2 },
}

impl Curve2d {
    pub fn start(&self) -> Point2 {
        match self {
            Curve2d::Segment { start, .. } | Curve2d::Arc { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point2 {
        match self {
            Curve2d::Segment { end, .. } | Curve2d::Arc { end, .. } => *end,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Curve2d::Arc { .. })
    }

    /// Center and radius of an arc's circle. `None` for segments and for
    /// collinear arc points.
    pub fn circle(&self) -> Option<(Point2, f64)> {
        let Curve2d::Arc { start, mid, end } = *self else {
            return None;
        };
        circumcircle(start, mid, end)
    }
}

/// Errors raised while drafting a profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SketchError {
    #[error("profile needs at least {required} curves, got {provided}")]
    TooFewCurves { required: usize, provided: usize },

    #[error("zero-length curve at ({x}, {y})")]
    DegenerateCurve { x: f64, y: f64 },

    #[error("arc points are collinear at ({x}, {y})")]
    CollinearArc { x: f64, y: f64 },

    #[error("corner radius {radius} does not fit between neighbouring edges")]
    RadiusTooLarge { radius: f64 },
}

/// A closed planar profile: curves joined end to start, the last ending at
/// the first one's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire2d {
    curves: Vec<Curve2d>,
}

impl Wire2d {
    /// Closed polygon through `points`.
    pub fn polygon(points: &[Point2]) -> Result<Self, SketchError> {
        let Some((&first, rest)) = points.split_first() else {
            return Err(SketchError::TooFewCurves {
                required: 3,
                provided: 0,
            });
        };
        let mut builder = WireBuilder::start_at(first);
        for &p in rest {
            builder = builder.line_to(p);
        }
        builder.close()
    }

    /// Axis-aligned rectangle centred on `center`.
    pub fn rectangle(center: Point2, width: f64, height: f64) -> Result<Self, SketchError> {
        Self::polygon(&rectangle_corners(center, width, height))
    }

    /// Rectangle with every corner rounded by `radius`.
    pub fn rounded_rectangle(
        center: Point2,
        width: f64,
        height: f64,
        radius: f64,
    ) -> Result<Self, SketchError> {
        let corners = rectangle_corners(center, width, height);
        let all: Vec<usize> = (0..corners.len()).collect();
        rounded_polygon(&corners, &all, radius)
    }

    /// Full circle, as two half arcs.
    pub fn circle(center: Point2, radius: f64) -> Result<Self, SketchError> {
        let [cx, cy] = center;
        WireBuilder::start_at([cx + radius, cy])
            .arc_through([cx, cy + radius], [cx - radius, cy])
            .arc_close_through([cx, cy - radius])
            .close()
    }

    pub fn curves(&self) -> &[Curve2d] {
        &self.curves
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Start point of every curve, in order.
    pub fn vertices(&self) -> Vec<Point2> {
        self.curves.iter().map(Curve2d::start).collect()
    }

    /// Vertices plus arc midpoints; a polygonal stand-in for area and extent
    /// estimates.
    pub fn sample_points(&self) -> Vec<Point2> {
        let mut out = Vec::with_capacity(self.curves.len() * 2);
        for curve in &self.curves {
            match *curve {
                Curve2d::Segment { start, .. } => out.push(start),
                Curve2d::Arc { start, mid, .. } => {
                    out.push(start);
                    out.push(mid);
                }
            }
        }
        out
    }

    /// Signed enclosed area (positive for counter-clockwise). Arcs
    /// contribute their exact circular segment.
    pub fn signed_area(&self) -> f64 {
        let mut area = shoelace_area(&self.vertices());
        for curve in &self.curves {
            if let Curve2d::Arc { start, mid, end } = *curve {
                area += arc_segment_area(start, mid, end);
            }
        }
        area
    }
}

/// Construct-commit builder for [`Wire2d`]. Curves are appended from the
/// current pen position; [`WireBuilder::close`] validates and returns the wire.
#[derive(Debug, Clone)]
pub struct WireBuilder {
    first: Point2,
    pen: Point2,
    curves: Vec<Curve2d>,
    closing_mid: Option<Point2>,
}

impl WireBuilder {
    pub fn start_at(p: Point2) -> Self {
        Self {
            first: p,
            pen: p,
            curves: Vec::new(),
            closing_mid: None,
        }
    }

    pub fn line_to(mut self, p: Point2) -> Self {
        self.curves.push(Curve2d::Segment {
            start: self.pen,
            end: p,
        });
        self.pen = p;
        self
    }

    pub fn arc_through(mut self, mid: Point2, end: Point2) -> Self {
        self.curves.push(Curve2d::Arc {
            start: self.pen,
            mid,
            end,
        });
        self.pen = end;
        self
    }

    /// Close the wire with an arc through `mid` instead of a straight segment.
    pub fn arc_close_through(mut self, mid: Point2) -> Self {
        self.closing_mid = Some(mid);
        self
    }

    /// Commit the wire. A closing curve back to the start point is added
    /// unless the pen is already there.
    pub fn close(mut self) -> Result<Wire2d, SketchError> {
        if !same_point(self.pen, self.first) {
            let closing = match self.closing_mid {
                Some(mid) => Curve2d::Arc {
                    start: self.pen,
                    mid,
                    end: self.first,
                },
                None => Curve2d::Segment {
                    start: self.pen,
                    end: self.first,
                },
            };
            self.curves.push(closing);
        }

        let has_arc = self.curves.iter().any(Curve2d::is_arc);
        if self.curves.len() < 2 || (self.curves.len() == 2 && !has_arc) {
            return Err(SketchError::TooFewCurves {
                required: 3,
                provided: self.curves.len(),
            });
        }

        for curve in &self.curves {
            let (s, e) = (curve.start(), curve.end());
            if same_point(s, e) {
                return Err(SketchError::DegenerateCurve { x: s[0], y: s[1] });
            }
            if let Curve2d::Arc { mid, .. } = curve {
                if curve.circle().is_none() {
                    return Err(SketchError::CollinearArc {
                        x: mid[0],
                        y: mid[1],
                    });
                }
            }
        }

        Ok(Wire2d {
            curves: self.curves,
        })
    }
}

/// Corners of an axis-aligned rectangle, counter-clockwise from bottom-left.
pub fn rectangle_corners(center: Point2, width: f64, height: f64) -> [Point2; 4] {
    let (hw, hh) = (width / 2.0, height / 2.0);
    let [cx, cy] = center;
    [
        [cx - hw, cy - hh],
        [cx + hw, cy - hh],
        [cx + hw, cy + hh],
        [cx - hw, cy + hh],
    ]
}

/// Closed polygon through `points` with the corners at `round` indices
/// replaced by tangent arcs of `radius`. Works for convex and reflex corners.
pub fn rounded_polygon(
    points: &[Point2],
    round: &[usize],
    radius: f64,
) -> Result<Wire2d, SketchError> {
    let n = points.len();
    if n < 3 {
        return Err(SketchError::TooFewCurves {
            required: 3,
            provided: n,
        });
    }
    if radius <= 0.0 || round.is_empty() {
        return Wire2d::polygon(points);
    }

    // Each corner becomes (entry, Some(mid), exit) or (corner, None, corner).
    let mut corners = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let here = points[i];
        let next = points[(i + 1) % n];
        if round.contains(&i) {
            let (entry, mid, exit) = corner_arc(prev, here, next, radius)?;
            corners.push((entry, Some(mid), exit));
        } else {
            corners.push((here, None, here));
        }
    }

    let (first_entry, first_mid, first_exit) = corners[0];
    let mut builder = WireBuilder::start_at(first_entry);
    if let Some(mid) = first_mid {
        builder = builder.arc_through(mid, first_exit);
    }
    let mut pen = first_exit;
    for &(entry, mid, exit) in &corners[1..] {
        // Arcs that each take exactly half an edge meet without a segment.
        if !same_point(pen, entry) {
            builder = builder.line_to(entry);
        }
        if let Some(mid) = mid {
            builder = builder.arc_through(mid, exit);
        }
        pen = exit;
    }
    builder.close()
}

/// Tangent points and arc midpoint for rounding the corner `here`.
fn corner_arc(
    prev: Point2,
    here: Point2,
    next: Point2,
    radius: f64,
) -> Result<(Point2, Point2, Point2), SketchError> {
    let to_prev = sub2(prev, here);
    let to_next = sub2(next, here);
    let (len_prev, len_next) = (norm2(to_prev), norm2(to_next));
    if len_prev < SKETCH_TOLERANCE || len_next < SKETCH_TOLERANCE {
        return Err(SketchError::DegenerateCurve {
            x: here[0],
            y: here[1],
        });
    }
    let u1 = [to_prev[0] / len_prev, to_prev[1] / len_prev];
    let u2 = [to_next[0] / len_next, to_next[1] / len_next];

    let cos_theta = (u1[0] * u2[0] + u1[1] * u2[1]).clamp(-1.0, 1.0);
    let half = cos_theta.acos() / 2.0;
    if half.sin().abs() < 1e-9 || half.tan().abs() < 1e-9 {
        return Err(SketchError::DegenerateCurve {
            x: here[0],
            y: here[1],
        });
    }

    let tangent = radius / half.tan();
    // Two neighbouring corners may each take up to half of a shared edge.
    if tangent > len_prev / 2.0 + SKETCH_TOLERANCE || tangent > len_next / 2.0 + SKETCH_TOLERANCE
    {
        return Err(SketchError::RadiusTooLarge { radius });
    }

    let bisector = {
        let b = [u1[0] + u2[0], u1[1] + u2[1]];
        let len = norm2(b);
        [b[0] / len, b[1] / len]
    };
    let center_dist = radius / half.sin();
    let center = [
        here[0] + bisector[0] * center_dist,
        here[1] + bisector[1] * center_dist,
    ];

    let entry = [here[0] + u1[0] * tangent, here[1] + u1[1] * tangent];
    let exit = [here[0] + u2[0] * tangent, here[1] + u2[1] * tangent];
    let mid = [center[0] - bisector[0] * radius, center[1] - bisector[1] * radius];
    Ok((entry, mid, exit))
}

/// Closed outline from a quarter polyline that starts on the -u axis and ends
/// on the +v axis, mirrored across both sketch axes for four-fold symmetry.
/// Points lying on the mirror axes are dropped, since they would only split a
/// straight edge in two.
pub fn mirrored_quarter(quarter: &[Point2]) -> Result<Wire2d, SketchError> {
    // Upper-left quarter as given, upper-right mirrored in u, then the lower
    // half mirrored in v and walked backwards.
    let mut upper: Vec<Point2> = quarter.to_vec();
    upper.extend(quarter.iter().rev().map(|p| [-p[0], p[1]]));
    let mut outline = upper.clone();
    outline.extend(upper.iter().rev().map(|p| [p[0], -p[1]]));

    let mut points: Vec<Point2> = Vec::with_capacity(outline.len());
    for p in outline {
        if points.last().is_some_and(|&last| same_point(last, p)) {
            continue;
        }
        points.push(p);
    }
    while points.len() > 1 && same_point(points[0], points[points.len() - 1]) {
        points.pop();
    }
    Wire2d::polygon(&drop_collinear(&points))
}

/// Remove vertices that sit on the straight line between their neighbours.
pub fn drop_collinear(points: &[Point2]) -> Vec<Point2> {
    let n = points.len();
    if n < 4 {
        return points.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let a = points[(i + n - 1) % n];
            let b = points[i];
            let c = points[(i + 1) % n];
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            cross.abs() > SKETCH_TOLERANCE
        })
        .map(|i| points[i])
        .collect()
}

/// Indices of the `count` points closest to `origin`, nearest first.
pub fn nearest_vertices(points: &[Point2], origin: Point2, count: usize) -> Vec<usize> {
    let mut order: Vec<(usize, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, norm2(sub2(*p, origin))))
        .collect();
    order.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    order.into_iter().take(count).map(|(i, _)| i).collect()
}

/// Circle through three points.
pub fn circumcircle(a: Point2, b: Point2, c: Point2) -> Option<(Point2, f64)> {
    let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
    if d.abs() < 1e-12 {
        return None;
    }
    let a2 = a[0] * a[0] + a[1] * a[1];
    let b2 = b[0] * b[0] + b[1] * b[1];
    let c2 = c[0] * c[0] + c[1] * c[1];
    let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
    let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
    let center = [ux, uy];
    Some((center, norm2(sub2(a, center))))
}

/// Signed polygon area via the shoelace formula.
pub fn shoelace_area(pts: &[Point2]) -> f64 {
    let n = pts.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += pts[i][0] * pts[j][1];
        area -= pts[j][0] * pts[i][1];
    }
    area / 2.0
}

/// Signed area between an arc and its chord. Positive when the arc
/// bulges to the right of `start -> end`, which is outward for a
/// counter-clockwise outline.
fn arc_segment_area(start: Point2, mid: Point2, end: Point2) -> f64 {
    let Some((center, r)) = circumcircle(start, mid, end) else {
        return 0.0;
    };
    let chord = sub2(end, start);
    let side = chord[0] * (mid[1] - start[1]) - chord[1] * (mid[0] - start[0]);
    let center_side = chord[0] * (center[1] - start[1]) - chord[1] * (center[0] - start[0]);
    let half = (norm2(chord) / (2.0 * r)).clamp(-1.0, 1.0).asin();
    // Minor arc when the midpoint and the center lie on opposite sides.
    let sweep = if side * center_side <= 0.0 {
        2.0 * half
    } else {
        2.0 * std::f64::consts::PI - 2.0 * half
    };
    let segment = 0.5 * r * r * (sweep - sweep.sin());
    if side < 0.0 {
        segment
    } else {
        -segment
    }
}

fn same_point(a: Point2, b: Point2) -> bool {
    norm2(sub2(a, b)) < SKETCH_TOLERANCE
}

fn sub2(a: Point2, b: Point2) -> Point2 {
    [a[0] - b[0], a[1] - b[1]]
}

fn norm2(a: Point2) -> f64 {
    (a[0] * a[0] + a[1] * a[1]).sqrt()
}
