use std::time::Duration;

use super::DashboardView;

const TITLE: &str = "Sentiment Scores";

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; color: #2a3f5f; }
h1 { margin-bottom: 12px; }
.meta { color: #7f7f7f; font-size: 0.85em; margin-bottom: 16px; }
#graph { overflow-x: auto; margin-bottom: 24px; }
table.latest { border-collapse: collapse; min-width: 240px; }
table.latest th, table.latest td { padding: 4px 12px; text-align: left; border-bottom: 1px solid #ddd; }
"#;

/// Full HTML document for the dashboard. `view == None` means no cycle has
/// succeeded yet; a placeholder is served and the page keeps refreshing.
pub fn render_page(view: Option<&DashboardView>, refresh: Duration) -> String {
    let body = match view {
        Some(v) => {
            let latest = v
                .latest_timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            format!(
                r#"<div class="meta">latest data: {latest} &middot; refreshed: {} &middot; {} tickers</div>
<div id="graph">{}</div>
<div id="latest-table">{}</div>"#,
                v.refreshed_at.format("%Y-%m-%d %H:%M:%S UTC"),
                v.tickers.len(),
                v.chart_svg,
                v.table_html
            )
        }
        None => r#"<div class="meta">waiting for first refresh&hellip;</div>
<div id="graph"></div>
<div id="latest-table"></div>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta http-equiv="refresh" content="{}">
<title>{TITLE}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{TITLE}</h1>
{body}
</body>
</html>
"#,
        refresh.as_secs().max(1)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_page_still_refreshes() {
        let html = render_page(None, Duration::from_secs(300));
        assert!(html.contains(r#"<meta http-equiv="refresh" content="300">"#));
        assert!(html.contains("<h1>Sentiment Scores</h1>"));
        assert!(html.contains(r#"id="latest-table""#));
    }
}
