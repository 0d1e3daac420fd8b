use crate::canvas::FillType;
use crate::error::{Result, VectorError};
use glam::Mat3;
use kurbo::{
    Affine, BezPath, CubicBez, Line, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point,
    QuadBez, SvgArc, Vec2,
};
use std::fmt;
use svgtypes::{PathParser, PathSegment};

const ARCLEN_ACCURACY: f64 = 1e-4;
const ARC_TOLERANCE: f64 = 1e-3;

/// One command of a path string together with its numeric parameters.
///
/// The command letter keeps its case, so relative commands stay relative
/// and two paths written the same way can be morphed parameter by parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDataNode {
    pub command: char,
    pub params: Vec<f32>,
}

impl PathDataNode {
    pub fn new(command: char, params: Vec<f32>) -> Self {
        Self { command, params }
    }

    /// Parameters consumed by one repetition of `command`.
    fn arity(command: char) -> Option<usize> {
        match command.to_ascii_uppercase() {
            'Z' => Some(0),
            'M' | 'L' | 'T' => Some(2),
            'H' | 'V' => Some(1),
            'S' | 'Q' => Some(4),
            'C' => Some(6),
            'A' => Some(7),
            _ => None,
        }
    }
}

impl fmt::Display for PathDataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", p)?;
        }
        Ok(())
    }
}

pub fn nodes_to_string(nodes: &[PathDataNode]) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a path string into command nodes.
pub fn parse_path_data(data: &str) -> Result<Vec<PathDataNode>> {
    let mut nodes = Vec::new();
    for segment in PathParser::from(data) {
        let segment = segment.map_err(|e| VectorError::MalformedPathData(e.to_string()))?;
        let cmd = |abs: bool, c: char| if abs { c } else { c.to_ascii_lowercase() };
        let node = match segment {
            PathSegment::MoveTo { abs, x, y } => {
                PathDataNode::new(cmd(abs, 'M'), vec![x as f32, y as f32])
            }
            PathSegment::LineTo { abs, x, y } => {
                PathDataNode::new(cmd(abs, 'L'), vec![x as f32, y as f32])
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                PathDataNode::new(cmd(abs, 'H'), vec![x as f32])
            }
            PathSegment::VerticalLineTo { abs, y } => {
                PathDataNode::new(cmd(abs, 'V'), vec![y as f32])
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => PathDataNode::new(
                cmd(abs, 'C'),
                vec![x1 as f32, y1 as f32, x2 as f32, y2 as f32, x as f32, y as f32],
            ),
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => PathDataNode::new(
                cmd(abs, 'S'),
                vec![x2 as f32, y2 as f32, x as f32, y as f32],
            ),
            PathSegment::Quadratic { abs, x1, y1, x, y } => PathDataNode::new(
                cmd(abs, 'Q'),
                vec![x1 as f32, y1 as f32, x as f32, y as f32],
            ),
            PathSegment::SmoothQuadratic { abs, x, y } => {
                PathDataNode::new(cmd(abs, 'T'), vec![x as f32, y as f32])
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => PathDataNode::new(
                cmd(abs, 'A'),
                vec![
                    rx as f32,
                    ry as f32,
                    x_axis_rotation as f32,
                    if large_arc { 1.0 } else { 0.0 },
                    if sweep { 1.0 } else { 0.0 },
                    x as f32,
                    y as f32,
                ],
            ),
            PathSegment::ClosePath { abs } => PathDataNode::new(cmd(abs, 'Z'), Vec::new()),
        };
        nodes.push(node);
    }
    Ok(nodes)
}

/// Whether two node lists can be interpolated: same length, and each
/// pair shares its command and parameter count.
pub fn can_morph(from: &[PathDataNode], to: &[PathDataNode]) -> bool {
    from.len() == to.len()
        && from
            .iter()
            .zip(to)
            .all(|(a, b)| a.command == b.command && a.params.len() == b.params.len())
}

pub fn interpolate(
    from: &[PathDataNode],
    to: &[PathDataNode],
    fraction: f32,
) -> Result<Vec<PathDataNode>> {
    if !can_morph(from, to) {
        return Err(VectorError::IncompatiblePathMorph {
            from: nodes_to_string(from),
            to: nodes_to_string(to),
        });
    }
    Ok(from
        .iter()
        .zip(to)
        .map(|(a, b)| PathDataNode {
            command: a.command,
            params: a
                .params
                .iter()
                .zip(&b.params)
                .map(|(x, y)| x + (y - x) * fraction)
                .collect(),
        })
        .collect())
}

fn reflect(point: Point, against: Point) -> Point {
    Point::new(against.x * 2.0 - point.x, against.y * 2.0 - point.y)
}

/// Builds drawable geometry from command nodes.
pub fn build_path(nodes: &[PathDataNode]) -> Result<BezPath> {
    let mut path = BezPath::new();
    let mut current = Point::ZERO;
    let mut start = Point::ZERO;
    let mut cubic_ctrl: Option<Point> = None;
    let mut quad_ctrl: Option<Point> = None;
    let mut needs_move = true;

    for node in nodes {
        let arity = PathDataNode::arity(node.command).ok_or_else(|| {
            VectorError::MalformedPathData(format!("unknown command '{}'", node.command))
        })?;
        if arity == 0 {
            if !needs_move {
                path.close_path();
            }
            current = start;
            needs_move = true;
            cubic_ctrl = None;
            quad_ctrl = None;
            continue;
        }
        if node.params.is_empty() || node.params.len() % arity != 0 {
            return Err(VectorError::MalformedPathData(format!(
                "'{}' expects a multiple of {} parameters, got {}",
                node.command,
                arity,
                node.params.len()
            )));
        }

        let relative = node.command.is_ascii_lowercase();
        let upper = node.command.to_ascii_uppercase();
        for (i, p) in node.params.chunks(arity).enumerate() {
            let p: Vec<f64> = p.iter().map(|v| *v as f64).collect();
            let base = if relative { current.to_vec2() } else { Vec2::ZERO };
            let pt = |x: f64, y: f64| Point::new(x, y) + base;

            if upper != 'M' && needs_move {
                path.move_to(current);
                start = current;
                needs_move = false;
            }

            match upper {
                'M' if i == 0 => {
                    current = pt(p[0], p[1]);
                    path.move_to(current);
                    start = current;
                    needs_move = false;
                    cubic_ctrl = None;
                    quad_ctrl = None;
                }
                'M' | 'L' => {
                    current = pt(p[0], p[1]);
                    path.line_to(current);
                    cubic_ctrl = None;
                    quad_ctrl = None;
                }
                'H' => {
                    current = Point::new(if relative { current.x + p[0] } else { p[0] }, current.y);
                    path.line_to(current);
                    cubic_ctrl = None;
                    quad_ctrl = None;
                }
                'V' => {
                    current = Point::new(current.x, if relative { current.y + p[0] } else { p[0] });
                    path.line_to(current);
                    cubic_ctrl = None;
                    quad_ctrl = None;
                }
                'C' => {
                    let c1 = pt(p[0], p[1]);
                    let c2 = pt(p[2], p[3]);
                    current = pt(p[4], p[5]);
                    path.curve_to(c1, c2, current);
                    cubic_ctrl = Some(c2);
                    quad_ctrl = None;
                }
                'S' => {
                    let c1 = cubic_ctrl.map_or(current, |c| reflect(c, current));
                    let c2 = pt(p[0], p[1]);
                    current = pt(p[2], p[3]);
                    path.curve_to(c1, c2, current);
                    cubic_ctrl = Some(c2);
                    quad_ctrl = None;
                }
                'Q' => {
                    let c = pt(p[0], p[1]);
                    current = pt(p[2], p[3]);
                    path.quad_to(c, current);
                    quad_ctrl = Some(c);
                    cubic_ctrl = None;
                }
                'T' => {
                    let c = quad_ctrl.map_or(current, |q| reflect(q, current));
                    current = pt(p[0], p[1]);
                    path.quad_to(c, current);
                    quad_ctrl = Some(c);
                    cubic_ctrl = None;
                }
                'A' => {
                    let to = pt(p[5], p[6]);
                    let arc = SvgArc {
                        from: current,
                        to,
                        radii: Vec2::new(p[0].abs(), p[1].abs()),
                        x_rotation: p[2].to_radians(),
                        large_arc: p[3] != 0.0,
                        sweep: p[4] != 0.0,
                    };
                    match kurbo::Arc::from_svg_arc(&arc) {
                        Some(arc) => arc.append_iter(ARC_TOLERANCE).for_each(|el| path.push(el)),
                        None => path.line_to(to),
                    }
                    current = to;
                    cubic_ctrl = None;
                    quad_ctrl = None;
                }
                _ => unreachable!("arity covers every command"),
            }
        }
    }
    Ok(path)
}

pub fn mat3_to_affine(m: &Mat3) -> Affine {
    let m = m.to_cols_array();
    Affine::new([
        m[0] as f64,
        m[1] as f64,
        m[3] as f64,
        m[4] as f64,
        m[6] as f64,
        m[7] as f64,
    ])
}

/// Outline geometry built from path data, with its winding rule.
#[derive(Debug, Clone, Default)]
pub struct GeometryPath {
    nodes: Vec<PathDataNode>,
    path: BezPath,
    fill_type: FillType,
}

impl GeometryPath {
    pub fn parse(data: &str) -> Result<Self> {
        Self::from_nodes(parse_path_data(data)?)
    }

    pub fn from_nodes(nodes: Vec<PathDataNode>) -> Result<Self> {
        let path = build_path(&nodes)?;
        Ok(Self {
            nodes,
            path,
            fill_type: FillType::default(),
        })
    }

    pub fn nodes(&self) -> &[PathDataNode] {
        &self.nodes
    }

    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn fill_type(&self) -> FillType {
        self.fill_type
    }

    pub fn set_fill_type(&mut self, fill_type: FillType) {
        self.fill_type = fill_type;
    }

    pub fn is_empty(&self) -> bool {
        self.path.elements().is_empty()
    }

    pub fn length(&self) -> f64 {
        PathMeasure::new(&self.path).length()
    }

    /// The outline between two distances along the concatenated contours.
    pub fn segment(&self, start: f64, end: f64) -> BezPath {
        PathMeasure::new(&self.path).segment(start, end)
    }

    /// Trimmed copy of the outline. Fractions are shifted by `offset` and
    /// scaled by the total length; the result is empty when the window
    /// collapses.
    pub fn trimmed(&self, start: f32, end: f32, offset: f32) -> BezPath {
        if start == 0.0 && end == 1.0 && offset == 0.0 {
            return self.path.clone();
        }
        let measure = PathMeasure::new(&self.path);
        let len = measure.length();
        measure.segment(
            (start + offset) as f64 * len,
            (end + offset) as f64 * len,
        )
    }

    pub fn transformed(&self, affine: Affine) -> BezPath {
        let mut path = self.path.clone();
        path.apply_affine(affine);
        path
    }
}

struct Contour {
    segments: Vec<(PathSeg, f64)>,
    length: f64,
}

/// Arc-length queries over the contours of a path. Contours of zero length
/// are skipped.
pub struct PathMeasure {
    contours: Vec<Contour>,
}

impl PathMeasure {
    pub fn new(path: &BezPath) -> Self {
        let mut contours = Vec::new();
        let mut segments: Vec<(PathSeg, f64)> = Vec::new();
        let mut start = Point::ZERO;
        let mut current = Point::ZERO;

        let mut flush = |segments: &mut Vec<(PathSeg, f64)>| {
            let length: f64 = segments.iter().map(|(_, l)| l).sum();
            if length > 0.0 {
                contours.push(Contour {
                    segments: std::mem::take(segments),
                    length,
                });
            } else {
                segments.clear();
            }
        };

        for el in path.elements() {
            let seg = match *el {
                PathEl::MoveTo(p) => {
                    flush(&mut segments);
                    start = p;
                    current = p;
                    continue;
                }
                PathEl::LineTo(p) => PathSeg::Line(Line::new(current, p)),
                PathEl::QuadTo(p1, p2) => PathSeg::Quad(QuadBez::new(current, p1, p2)),
                PathEl::CurveTo(p1, p2, p3) => PathSeg::Cubic(CubicBez::new(current, p1, p2, p3)),
                PathEl::ClosePath => {
                    let seg = PathSeg::Line(Line::new(current, start));
                    current = start;
                    let len = seg.arclen(ARCLEN_ACCURACY);
                    if len > 0.0 {
                        segments.push((seg, len));
                    }
                    flush(&mut segments);
                    continue;
                }
            };
            current = seg.end();
            let len = seg.arclen(ARCLEN_ACCURACY);
            if len > 0.0 {
                segments.push((seg, len));
            }
        }
        flush(&mut segments);
        Self { contours }
    }

    pub fn length(&self) -> f64 {
        self.contours.iter().map(|c| c.length).sum()
    }

    pub fn contour_count(&self) -> usize {
        self.contours.len()
    }

    pub fn contour_length(&self, contour: usize) -> f64 {
        self.contours.get(contour).map_or(0.0, |c| c.length)
    }

    /// Position at `distance` along one contour, clamped to its ends.
    pub fn point_at(&self, contour: usize, distance: f64) -> Option<Point> {
        let contour = self.contours.get(contour)?;
        let distance = distance.clamp(0.0, contour.length);
        let mut acc = 0.0;
        for (seg, len) in &contour.segments {
            if distance <= acc + len {
                let t = seg.inv_arclen(distance - acc, ARCLEN_ACCURACY).clamp(0.0, 1.0);
                return Some(seg.eval(t));
            }
            acc += len;
        }
        contour.segments.last().map(|(seg, _)| seg.end())
    }

    /// Extracts `[start, end]` measured along the concatenated contours.
    /// Distances are clamped to the total length; each contour touched by
    /// the window begins with a move.
    pub fn segment(&self, start: f64, end: f64) -> BezPath {
        let mut out = BezPath::new();
        let start = start.max(0.0);
        let end = end.min(self.length());
        if start >= end {
            return out;
        }

        let mut base = 0.0;
        for contour in &self.contours {
            let from = start.max(base) - base;
            let to = end.min(base + contour.length) - base;
            base += contour.length;
            if from >= to {
                continue;
            }

            let mut acc = 0.0;
            let mut moved = false;
            for (seg, len) in &contour.segments {
                let seg_from = from.max(acc) - acc;
                let seg_to = to.min(acc + len) - acc;
                acc += len;
                if seg_from >= seg_to {
                    continue;
                }
                let t0 = seg.inv_arclen(seg_from, ARCLEN_ACCURACY).clamp(0.0, 1.0);
                let t1 = seg.inv_arclen(seg_to, ARCLEN_ACCURACY).clamp(0.0, 1.0);
                let sub = seg.subsegment(t0..t1);
                if !moved {
                    out.move_to(sub.start());
                    moved = true;
                }
                out.push(seg_to_el(sub));
            }
        }
        out
    }
}

fn seg_to_el(seg: PathSeg) -> PathEl {
    match seg {
        PathSeg::Line(l) => PathEl::LineTo(l.p1),
        PathSeg::Quad(q) => PathEl::QuadTo(q.p1, q.p2),
        PathSeg::Cubic(c) => PathEl::CurveTo(c.p1, c.p2, c.p3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeometryPath {
        GeometryPath::parse("M0,0 L10,0 L10,10 L0,10 Z").unwrap()
    }

    #[test]
    fn test_parse_keeps_command_case() {
        let nodes = parse_path_data("M1,2 l3,4 h5 V6 z").unwrap();
        let commands: Vec<char> = nodes.iter().map(|n| n.command).collect();
        assert_eq!(commands, vec!['M', 'l', 'h', 'V', 'z']);
        assert_eq!(nodes[1].params, vec![3.0, 4.0]);
        assert!(nodes[4].params.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_path_data("M0,0 L"),
            Err(VectorError::MalformedPathData(_))
        ));
    }

    #[test]
    fn test_relative_commands_resolve_against_current_point() {
        let path = build_path(&parse_path_data("M10,10 l5,0 v5 h-5 z").unwrap()).unwrap();
        let els = path.elements();
        assert_eq!(els[0], PathEl::MoveTo(Point::new(10.0, 10.0)));
        assert_eq!(els[1], PathEl::LineTo(Point::new(15.0, 10.0)));
        assert_eq!(els[2], PathEl::LineTo(Point::new(15.0, 15.0)));
        assert_eq!(els[3], PathEl::LineTo(Point::new(10.0, 15.0)));
        assert_eq!(els[4], PathEl::ClosePath);
    }

    #[test]
    fn test_smooth_cubic_reflects_control_point() {
        let nodes = parse_path_data("M0,0 C0,10 10,10 10,0 S20,-10 20,0").unwrap();
        let path = build_path(&nodes).unwrap();
        match path.elements()[2] {
            PathEl::CurveTo(c1, _, _) => assert_eq!(c1, Point::new(10.0, -10.0)),
            ref other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_nodes_checks_parameter_count() {
        let bad = vec![PathDataNode::new('L', vec![1.0, 2.0, 3.0])];
        assert!(matches!(build_path(&bad), Err(VectorError::MalformedPathData(_))));
        let unknown = vec![PathDataNode::new('X', vec![1.0])];
        assert!(matches!(build_path(&unknown), Err(VectorError::MalformedPathData(_))));
        // Repeated groups in one node are implicit repeats of the command.
        let multi = vec![
            PathDataNode::new('M', vec![0.0, 0.0, 5.0, 0.0]),
            PathDataNode::new('l', vec![0.0, 5.0, -5.0, 0.0]),
        ];
        let path = build_path(&multi).unwrap();
        assert_eq!(path.elements().len(), 4);
        assert_eq!(path.elements()[3], PathEl::LineTo(Point::new(0.0, 5.0)));
    }

    #[test]
    fn test_can_morph() {
        let a = parse_path_data("M0,0 L10,10 Z").unwrap();
        let b = parse_path_data("M5,5 L20,0 Z").unwrap();
        let c = parse_path_data("M0,0 C1,1 2,2 3,3 Z").unwrap();
        let d = parse_path_data("M0,0 l10,10 Z").unwrap();
        assert!(can_morph(&a, &a));
        assert!(can_morph(&a, &b));
        assert!(!can_morph(&a, &c));
        assert!(!can_morph(&a, &d));
        assert!(!can_morph(&a, &a[..2]));
    }

    #[test]
    fn test_interpolate_midpoint() {
        let a = parse_path_data("M0,0 L10,10").unwrap();
        let b = parse_path_data("M10,0 L20,30").unwrap();
        let mid = interpolate(&a, &b, 0.5).unwrap();
        assert_eq!(mid[0].params, vec![5.0, 0.0]);
        assert_eq!(mid[1].params, vec![15.0, 20.0]);

        let c = parse_path_data("M0,0").unwrap();
        assert!(matches!(
            interpolate(&a, &c, 0.5),
            Err(VectorError::IncompatiblePathMorph { .. })
        ));
    }

    #[test]
    fn test_measure_square() {
        let sq = square();
        assert!((sq.length() - 40.0).abs() < 1e-6);
        let measure = PathMeasure::new(sq.bez_path());
        assert_eq!(measure.contour_count(), 1);
        let p = measure.point_at(0, 15.0).unwrap();
        assert!((p.x - 10.0).abs() < 1e-6 && (p.y - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_trim_window() {
        let sq = square();
        // Untrimmed keeps the original outline, close included.
        assert_eq!(sq.trimmed(0.0, 1.0, 0.0), sq.bez_path().clone());

        let half = sq.trimmed(0.0, 0.5, 0.0);
        assert!((PathMeasure::new(&half).length() - 20.0).abs() < 1e-6);

        let shifted = sq.trimmed(0.0, 0.25, 0.25);
        assert_eq!(shifted.elements()[0], PathEl::MoveTo(Point::new(10.0, 0.0)));

        assert!(sq.trimmed(0.5, 0.5, 0.0).elements().is_empty());
        assert!(sq.trimmed(0.8, 0.2, 0.0).elements().is_empty());
    }

    #[test]
    fn test_segment_spans_contours() {
        let two = GeometryPath::parse("M0,0 L10,0 M0,5 L10,5").unwrap();
        let seg = two.segment(5.0, 15.0);
        let moves = seg
            .elements()
            .iter()
            .filter(|e| matches!(e, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
        assert!((PathMeasure::new(&seg).length() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_arc_builds_curves() {
        let path = GeometryPath::parse("M0,10 A10,10 0 0 1 20,10").unwrap();
        assert!(path
            .bez_path()
            .elements()
            .iter()
            .any(|e| matches!(e, PathEl::CurveTo(..))));
        // Half circle of radius 10.
        assert!((path.length() - std::f64::consts::PI * 10.0).abs() < 0.05);
    }

    #[test]
    fn test_mat3_to_affine() {
        let m = Mat3::from_translation(glam::Vec2::new(3.0, 4.0))
            * Mat3::from_scale(glam::Vec2::splat(2.0));
        let a = mat3_to_affine(&m);
        assert_eq!(a * Point::new(1.0, 1.0), Point::new(5.0, 6.0));
    }
}
