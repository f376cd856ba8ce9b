use std::fmt::Write as _;

use crate::color::score_to_style;

/// Two-column (Ticker, Score) HTML table, each row colored by its score.
pub fn render_snapshot_table(snapshot: &[(String, f64)]) -> String {
    let mut html = String::from(
        r#"<table class="latest"><tr><th>Ticker</th><th>Score</th></tr>"#,
    );
    for (ticker, score) in snapshot {
        let style = score_to_style(*score);
        let _ = write!(
            html,
            r#"<tr style="background-color: {}"><td>{}</td><td>{:.3}</td></tr>"#,
            style.css(),
            html_escape::encode_text(ticker),
            score
        );
    }
    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_snapshot_order_with_three_decimals() {
        let snap = vec![("AAA".to_string(), 0.2), ("BBB".to_string(), -0.25)];
        let html = render_snapshot_table(&snap);
        let a = html.find("<td>AAA</td><td>0.200</td>").unwrap();
        let b = html.find("<td>BBB</td><td>-0.250</td>").unwrap();
        assert!(a < b);
        assert!(html.contains("background-color: rgb(204, 255, 150)"));
        assert!(html.contains("background-color: rgb(255, 191, 150)"));
    }

    #[test]
    fn header_only_when_empty() {
        let html = render_snapshot_table(&[]);
        assert_eq!(html.matches("<tr").count(), 1);
    }
}
