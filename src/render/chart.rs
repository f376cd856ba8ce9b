//! Faceted line chart rendered as inline SVG.
//!
//! One facet per ticker, wrapped `wrap` facets per row, shared axes, no
//! legend. Facet titles are the bare ticker name. A ticker's line breaks at
//! every table row where it has no value.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::normalize::LongRow;

const MARGIN_LEFT: f64 = 44.0;
const MARGIN_TOP: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 22.0;
const MARGIN_RIGHT: f64 = 10.0;
const LINE_COLOR: &str = "#636efa";

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub facet_width: u32,
    pub facet_height: u32,
    pub wrap: usize,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            facet_width: 320,
            facet_height: 200,
            wrap: 3,
        }
    }
}

/// Shared axis ranges. `half_span` is `(y_max - y_min) / 2`, computed from
/// halved bounds so it stays finite for any finite scores.
struct Bounds {
    t_min: i64,
    t_max: i64,
    y_min: f64,
    y_max: f64,
    half_span: f64,
}

impl Bounds {
    fn of(rows: &[LongRow]) -> Option<Self> {
        let mut finite = rows.iter().filter(|r| r.score.is_finite());
        let first = finite.next()?;
        let (mut t_min, mut t_max) = (first.timestamp.timestamp(), first.timestamp.timestamp());
        let (mut y_min, mut y_max) = (first.score, first.score);
        for r in finite {
            let t = r.timestamp.timestamp();
            t_min = t_min.min(t);
            t_max = t_max.max(t);
            y_min = y_min.min(r.score);
            y_max = y_max.max(r.score);
        }

        // flat series still get a visible band
        let pad = (y_max * 0.5 - y_min * 0.5) * 0.1;
        let pad = pad.max(0.05);
        let y_min = (y_min - pad).max(f64::MIN);
        let y_max = (y_max + pad).min(f64::MAX);

        Some(Bounds {
            t_min,
            t_max,
            y_min,
            y_max,
            half_span: y_max * 0.5 - y_min * 0.5,
        })
    }

    fn x_frac(&self, t: i64) -> f64 {
        if self.t_max == self.t_min {
            0.5
        } else {
            (t - self.t_min) as f64 / (self.t_max - self.t_min) as f64
        }
    }

    fn y_frac(&self, y: f64) -> f64 {
        ((y * 0.5 - self.y_min * 0.5) / self.half_span).clamp(0.0, 1.0)
    }
}

/// Group long-form rows by ticker (sorted), each series keyed by time.
/// Non-finite scores are left out.
pub fn facets(rows: &[LongRow]) -> BTreeMap<&str, BTreeMap<DateTime<Utc>, f64>> {
    let mut out: BTreeMap<&str, BTreeMap<DateTime<Utc>, f64>> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.score.is_finite()) {
        out.entry(r.ticker.as_str())
            .or_default()
            .insert(r.timestamp, r.score);
    }
    out
}

/// Split one ticker's series into contiguous runs along `timeline`. A
/// timeline instant without a value for this ticker ends the current run.
pub fn segments(
    series: &BTreeMap<DateTime<Utc>, f64>,
    timeline: &BTreeSet<DateTime<Utc>>,
) -> Vec<Vec<(DateTime<Utc>, f64)>> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for t in timeline {
        match series.get(t) {
            Some(y) => run.push((*t, *y)),
            None if !run.is_empty() => out.push(std::mem::take(&mut run)),
            None => {}
        }
    }
    if !run.is_empty() {
        out.push(run);
    }
    out
}

fn axis_label(v: f64) -> String {
    if v.abs() < 1e6 {
        format!("{v:.2}")
    } else {
        format!("{v:.2e}")
    }
}

/// Render the long-form series as one SVG document.
///
/// `timeline` is every row instant of the source table; rows where a ticker
/// is absent break that ticker's line. Instants present in `rows` are always
/// on the timeline. Empty input renders an empty chart with a "no data" note.
pub fn render_facets(
    rows: &[LongRow],
    timeline: &[DateTime<Utc>],
    opts: &ChartOptions,
) -> String {
    let w = f64::from(opts.facet_width);
    let h = f64::from(opts.facet_height);
    let wrap = opts.wrap.max(1);

    let Some(bounds) = Bounds::of(rows) else {
        return format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart" width="{w}" height="{h}"><text x="{}" y="{}" text-anchor="middle">no data</text></svg>"#,
            w / 2.0,
            h / 2.0
        );
    };

    let timeline: BTreeSet<DateTime<Utc>> = timeline
        .iter()
        .copied()
        .chain(rows.iter().map(|r| r.timestamp))
        .collect();

    let groups = facets(rows);
    let n_rows = groups.len().div_ceil(wrap);
    let cols = groups.len().min(wrap);
    let total_w = w * cols as f64;
    let total_h = h * n_rows as f64;

    let plot_w = w - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = h - MARGIN_TOP - MARGIN_BOTTOM;

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart" width="{total_w}" height="{total_h}" viewBox="0 0 {total_w} {total_h}" font-family="sans-serif" font-size="11">"#
    );

    for (i, (ticker, series)) in groups.iter().enumerate() {
        let ox = (i % wrap) as f64 * w + MARGIN_LEFT;
        let oy = (i / wrap) as f64 * h + MARGIN_TOP;
        let title = html_escape::encode_text(ticker);

        let _ = write!(
            svg,
            r##"<g class="facet"><text x="{:.1}" y="{:.1}" text-anchor="middle" font-weight="bold">{title}</text><rect x="{ox:.1}" y="{oy:.1}" width="{plot_w:.1}" height="{plot_h:.1}" fill="#e5ecf6"/>"##,
            ox + plot_w / 2.0,
            oy - 8.0,
        );

        // zero line when it falls inside the range
        if bounds.y_min < 0.0 && bounds.y_max > 0.0 {
            let zy = oy + plot_h * (1.0 - bounds.y_frac(0.0));
            let _ = write!(
                svg,
                r##"<line x1="{ox:.1}" y1="{zy:.1}" x2="{:.1}" y2="{zy:.1}" stroke="#ffffff" stroke-width="2"/>"##,
                ox + plot_w
            );
        }

        // y labels: max at top, min at bottom
        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text><text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            ox - 4.0,
            oy + 10.0,
            axis_label(bounds.y_max),
            ox - 4.0,
            oy + plot_h,
            axis_label(bounds.y_min),
        );

        for run in segments(series, &timeline) {
            let points: Vec<(f64, f64)> = run
                .iter()
                .map(|(t, y)| {
                    (
                        ox + plot_w * bounds.x_frac(t.timestamp()),
                        oy + plot_h * (1.0 - bounds.y_frac(*y)),
                    )
                })
                .collect();

            if let [(px, py)] = points.as_slice() {
                let _ = write!(
                    svg,
                    r#"<circle cx="{px:.1}" cy="{py:.1}" r="3" fill="{LINE_COLOR}"/>"#
                );
            } else {
                let coords: Vec<String> = points
                    .iter()
                    .map(|(px, py)| format!("{px:.1},{py:.1}"))
                    .collect();
                let _ = write!(
                    svg,
                    r#"<polyline fill="none" stroke="{LINE_COLOR}" stroke-width="2" points="{}"/>"#,
                    coords.join(" ")
                );
            }
        }

        // x labels: first and last date of the shared range
        let _ = write!(
            svg,
            r#"<text x="{ox:.1}" y="{:.1}">{}</text><text x="{:.1}" y="{:.1}" text-anchor="end">{}</text></g>"#,
            oy + plot_h + 14.0,
            short_date(bounds.t_min),
            ox + plot_w,
            oy + plot_h + 14.0,
            short_date(bounds.t_max),
        );
    }

    svg.push_str("</svg>");
    svg
}

fn short_date(unix: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix, 0)
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn row(d: u32, ticker: &str, score: f64) -> LongRow {
        LongRow {
            timestamp: day(d),
            ticker: ticker.into(),
            score,
        }
    }

    #[test]
    fn one_facet_per_ticker_with_bare_titles() {
        let rows = vec![
            row(1, "AAA", 0.5),
            row(2, "AAA", 0.2),
            row(2, "BBB", -0.3),
        ];
        let svg = render_facets(&rows, &[], &ChartOptions::default());
        assert_eq!(svg.matches(r#"class="facet""#).count(), 2);
        assert!(svg.contains(">AAA</text>"));
        assert!(svg.contains(">BBB</text>"));
        assert!(!svg.contains("ticker="));
        assert!(!svg.contains("legend"));
    }

    #[test]
    fn facets_wrap_three_per_row() {
        let rows: Vec<LongRow> = ["A", "B", "C", "D"]
            .iter()
            .map(|t| row(1, t, 0.0))
            .collect();
        let svg = render_facets(&rows, &[], &ChartOptions::default());
        // 3 columns x 2 rows of 320x200
        assert!(svg.contains(r#"width="960" height="400""#), "{svg}");
    }

    #[test]
    fn ticker_names_are_escaped() {
        let svg = render_facets(&[row(1, "<X&Y>", 0.1)], &[], &ChartOptions::default());
        assert!(svg.contains("&lt;X&amp;Y&gt;"));
    }

    #[test]
    fn empty_input_renders_placeholder() {
        let svg = render_facets(&[], &[], &ChartOptions::default());
        assert!(svg.contains("no data"));
    }

    #[test]
    fn extreme_scores_keep_coordinates_finite() {
        let rows = vec![
            row(1, "AAA", 1.7e308),
            row(2, "AAA", -1.7e308),
            row(3, "AAA", f64::MAX),
            row(3, "BBB", f64::MIN),
        ];
        let svg = render_facets(&rows, &[], &ChartOptions::default());
        assert!(!svg.contains("NaN"), "{svg}");
        assert!(!svg.contains("inf"), "{svg}");
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn line_breaks_at_missing_cell() {
        // AAA has no value on day 2, which is a table row because BBB has one
        let rows = vec![
            row(1, "AAA", 0.1),
            row(3, "AAA", 0.3),
            row(4, "AAA", 0.4),
            row(2, "BBB", 0.2),
        ];
        let timeline = [day(1), day(2), day(3), day(4)];
        let svg = render_facets(&rows, &timeline, &ChartOptions::default());
        // AAA: a lone point for day 1, a two-point line for days 3-4; BBB: a lone point
        assert_eq!(svg.matches("<polyline").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 2);
    }

    #[test]
    fn segments_split_on_gaps_only() {
        let series: BTreeMap<_, _> = [(day(1), 0.1), (day(2), 0.2), (day(4), 0.4)].into();
        let timeline: BTreeSet<_> = [day(1), day(2), day(3), day(4)].into();
        let runs = segments(&series, &timeline);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(runs[1], vec![(day(4), 0.4)]);
    }
}
