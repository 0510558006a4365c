//! SWC neuron morphology text format.
//!
//! One row per vertex: `index type x y z radius parent`, 1-based, with a
//! parent of `-1` marking a root. Lines starting with `#` are comments.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{FormatError, Result};
use crate::math::Point3;
use crate::operations::decompose::{Adjacency, Components};
use crate::skeleton::Skeleton;

/// Radius written for vertices without one, and read for unparseable radii.
const MISSING_RADIUS: f32 = -1.0;
/// SWC type written for vertices without one ("undefined").
const UNDEFINED_TYPE: u8 = 0;

/// Writes skeletons as SWC text.
#[derive(Debug, Clone, Default)]
pub struct SwcWriter {
    contributors: String,
    soma_threshold: Option<f32>,
}

impl SwcWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text for the `# CONTRIBUTOR` header line.
    #[must_use]
    pub fn with_contributors(mut self, contributors: impl Into<String>) -> Self {
        self.contributors = contributors.into();
        self
    }

    /// Roots each component at its widest vertex when some radius in the
    /// component reaches `threshold`.
    #[must_use]
    pub fn with_soma_threshold(mut self, threshold: f32) -> Self {
        self.soma_threshold = Some(threshold);
        self
    }

    /// Renders `skel`; components are written one after another with a
    /// single contiguous numbering.
    #[must_use]
    pub fn write(&self, skel: &Skeleton) -> String {
        let mut out = self.header(skel);
        out.push('\n');

        let mut rows = Vec::with_capacity(skel.vertex_count());
        let mut next = 1_usize;
        for component in Components::new().execute(skel) {
            self.write_component(&component, &mut next, &mut rows);
        }
        out.push_str(&rows.join("\n"));

        debug!(rows = rows.len(), "encoded swc");
        out
    }

    fn header(&self, skel: &Skeleton) -> String {
        let version = env!("CARGO_PKG_VERSION");
        let transform = skel.transform();
        let (sx, sy, sz) = (transform[(0, 0)], transform[(1, 1)], transform[(2, 2)]);
        [
            format!("# ORIGINAL_SOURCE skeletal {version}"),
            "# CREATURE".into(),
            "# REGION".into(),
            "# FIELD/LAYER".into(),
            "# TYPE".into(),
            format!("# CONTRIBUTOR {}", self.contributors),
            "# REFERENCE".into(),
            "# RAW".into(),
            "# EXTRAS".into(),
            "# SOMA_AREA".into(),
            "# SHINKAGE_CORRECTION".into(),
            format!("# VERSION_NUMBER {version}"),
            format!("# VERSION_DATE {}", chrono::Utc::now().to_rfc3339()),
            format!("# SCALE {sx:.6} {sy:.6} {sz:.6}"),
            String::new(),
        ]
        .join("\n")
    }

    fn write_component(&self, skel: &Skeleton, next: &mut usize, rows: &mut Vec<String>) {
        let Some(&[first, _]) = skel.edges().first() else {
            return;
        };
        let radii = skel.radii();
        let types = skel.vertex_types();

        let mut root = first;
        if let (Some(threshold), Some(radii)) = (self.soma_threshold, radii) {
            if radii.iter().any(|&r| r >= threshold) {
                root = widest(radii);
            }
        }

        let adjacency = Adjacency::new(skel.vertex_count(), skel.edges());
        let mut number = vec![0_usize; skel.vertex_count()];
        let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
        while let Some((v, parent)) = stack.pop() {
            if number[v] != 0 {
                continue;
            }
            number[v] = *next;
            *next += 1;

            let p: Point3 = skel.vertices()[v];
            let radius = radii.map_or(MISSING_RADIUS, |r| r[v]);
            let kind = types.map_or(UNDEFINED_TYPE, |t| t[v]);
            let parent = parent.map_or_else(|| "-1".to_owned(), |u| number[u].to_string());
            rows.push(format!(
                "{} {kind} {:.6} {:.6} {:.6} {radius:.6} {parent}",
                number[v], p.x, p.y, p.z
            ));

            for &w in adjacency.neighbors(v) {
                if number[w] == 0 {
                    stack.push((w, Some(v)));
                }
            }
        }
    }
}

fn widest(radii: &[f32]) -> usize {
    let mut best = 0;
    for (i, r) in radii.iter().enumerate() {
        if *r > radii[best] {
            best = i;
        }
    }
    best
}

/// Renders with default settings.
#[must_use]
pub fn to_swc(skel: &Skeleton) -> String {
    SwcWriter::new().write(skel)
}

/// Parses SWC text into a skeleton carrying `radius` and `vertex_types`.
///
/// Comment and blank lines are skipped and fields may be separated by any
/// whitespace. Unparseable radii (e.g. `NA`) become `-1`.
///
/// # Errors
///
/// Returns [`FormatError::Malformed`] for rows without exactly seven fields,
/// unparseable numbers, repeated indices, or parents that never appear.
pub fn from_swc(text: &str) -> Result<Skeleton> {
    let mut vertices = Vec::new();
    let mut radii = Vec::new();
    let mut types = Vec::new();
    let mut links: Vec<(i64, i64, usize)> = Vec::new();
    let mut label: FxHashMap<i64, usize> = FxHashMap::default();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line_no + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [id, kind, x, y, z, radius, parent] = fields.as_slice() else {
            return Err(malformed(row, format!("expected 7 fields, found {}", fields.len())));
        };

        let id: i64 = parse(row, "index", id)?;
        let kind: u8 = parse(row, "type", kind)?;
        let point = Point3::new(parse(row, "x", x)?, parse(row, "y", y)?, parse(row, "z", z)?);
        let radius = radius.parse::<f32>().unwrap_or(MISSING_RADIUS);
        let parent: i64 = parse(row, "parent", parent)?;

        if label.insert(id, vertices.len()).is_some() {
            return Err(malformed(row, format!("index {id} appears more than once")));
        }
        if parent >= 0 {
            links.push((id, parent, row));
        }
        vertices.push(point);
        radii.push(radius);
        types.push(kind);
    }

    if vertices.is_empty() {
        return Ok(Skeleton::empty());
    }

    let mut edges = Vec::with_capacity(links.len());
    for (id, parent, row) in links {
        let Some(&p) = label.get(&parent) else {
            return Err(malformed(row, format!("parent {parent} of {id} is not defined")));
        };
        edges.push([p, label[&id]]);
    }

    let skel = Skeleton::new(vertices, edges)?
        .with_radii(radii)?
        .with_vertex_types(types)?;
    debug!(
        vertices = skel.vertex_count(),
        edges = skel.edge_count(),
        "decoded swc"
    );
    Ok(skel)
}

fn malformed(row: usize, message: String) -> crate::error::SkeletalError {
    FormatError::Malformed(format!("swc line {row}: {message}")).into()
}

fn parse<T: std::str::FromStr>(row: usize, field: &str, text: &str) -> Result<T> {
    text.parse()
        .map_err(|_| malformed(row, format!("cannot parse {field} from {text:?}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SkeletalError;
    use approx::assert_abs_diff_eq;

    fn data_rows(text: &str) -> Vec<Vec<String>> {
        text.lines()
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| l.split(' ').map(str::to_owned).collect())
            .collect()
    }

    fn forked() -> Skeleton {
        Skeleton::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(2.0, -1.0, 0.0),
            ],
            vec![[0, 1], [1, 2], [1, 3]],
        )
        .unwrap()
        .with_radii(vec![0.5, 1.25, 0.75, 3.5])
        .unwrap()
        .with_vertex_types(vec![1, 3, 3, 3])
        .unwrap()
    }

    #[test]
    fn header_records_contributor_and_scale() {
        let text = SwcWriter::new().with_contributors("lab").write(&forked());
        assert!(text.starts_with("# ORIGINAL_SOURCE skeletal"));
        assert!(text.contains("# CONTRIBUTOR lab\n"));
        assert!(text.contains("# SCALE 1.000000 1.000000 1.000000\n"));
        assert!(text.contains("# VERSION_DATE "));
    }

    #[test]
    fn rows_are_numbered_from_one_with_root_parent() {
        let rows = data_rows(&to_swc(&forked()));
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0][0], "1");
        assert_eq!(rows[0][6], "-1");
        assert_eq!(rows[0][2], "0.000000");
        assert_eq!(rows[0][5], "0.500000");
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), 7);
            assert_eq!(row[0], (i + 1).to_string());
        }
    }

    #[test]
    fn soma_threshold_moves_the_root() {
        let rows = data_rows(&SwcWriter::new().with_soma_threshold(3.0).write(&forked()));
        assert_eq!(rows[0][5], "3.500000");
        assert_eq!(rows[0][6], "-1");

        let rows = data_rows(&SwcWriter::new().with_soma_threshold(10.0).write(&forked()));
        assert_eq!(rows[0][5], "0.500000");
    }

    #[test]
    fn components_get_contiguous_numbers() {
        let skel = Skeleton::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(9.0, 0.0, 0.0),
                Point3::new(10.0, 0.0, 0.0),
            ],
            vec![[0, 1], [2, 3]],
        )
        .unwrap();
        let rows = data_rows(&to_swc(&skel));
        let numbers: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        let parents: Vec<&str> = rows.iter().map(|r| r[6].as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3", "4"]);
        assert_eq!(parents, vec!["-1", "1", "-1", "3"]);
        assert_eq!(rows[0][1], "0");
        assert_eq!(rows[0][5], "-1.000000");
    }

    #[test]
    fn round_trip_preserves_counts_and_radii() {
        let skel = forked();
        let decoded = from_swc(&to_swc(&skel)).unwrap();
        assert_eq!(decoded.vertex_count(), skel.vertex_count());
        assert_eq!(decoded.edge_count(), skel.edge_count());

        let mut before = skel.radii().unwrap().to_vec();
        let mut after = decoded.radii().unwrap().to_vec();
        before.sort_by(f32::total_cmp);
        after.sort_by(f32::total_cmp);
        for (a, b) in before.iter().zip(&after) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn parser_accepts_loose_whitespace_and_na_radius() {
        let text = "# comment\n\n1 1 0 0 0 NA -1\n2\t3  1.5 0 0 0.25   1\n";
        let skel = from_swc(text).unwrap();
        assert_eq!(skel.vertex_count(), 2);
        assert_eq!(skel.edges(), &[[0, 1]]);
        assert_eq!(skel.radii().unwrap(), &[-1.0, 0.25]);
        assert_eq!(skel.vertex_types().unwrap(), &[1, 3]);
    }

    #[test]
    fn parent_may_follow_its_child() {
        let skel = from_swc("5 0 1 0 0 1 7\n7 0 0 0 0 1 -1\n").unwrap();
        assert_eq!(skel.edges(), &[[1, 0]]);
    }

    #[test]
    fn bad_rows_are_malformed() {
        for text in ["1 1 0 0 0 1\n", "1 1 0 0 0 1 4\n", "1 1 x 0 0 1 -1\n", "1 1 0 0 0 1 -1\n1 1 0 0 0 1 -1\n"] {
            let err = from_swc(text).unwrap_err();
            assert!(
                matches!(err, SkeletalError::Format(FormatError::Malformed(_))),
                "{text:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn comment_only_text_is_empty() {
        assert!(from_swc("# nothing here\n").unwrap().is_empty());
    }
}
