// tests/color_map.rs
use sentiment_dashboard::{score_to_style, StyleDescriptor};

fn rgb(s: StyleDescriptor) -> (u8, u8, u8) {
    (s.red, s.green, s.blue)
}

#[test]
fn neutral_is_yellow() {
    assert_eq!(rgb(score_to_style(0.0)), (255, 255, 150));
}

#[test]
fn extremes() {
    assert_eq!(rgb(score_to_style(1.0)), (0, 255, 150));
    assert_eq!(rgb(score_to_style(-1.0)), (255, 0, 150));
}

#[test]
fn out_of_range_is_clamped() {
    assert_eq!(score_to_style(2.0), score_to_style(1.0));
    assert_eq!(score_to_style(-2.0), score_to_style(-1.0));
    assert_eq!(score_to_style(1e9), score_to_style(1.0));
}

#[test]
fn blue_is_constant() {
    for s in [-3.0, -0.7, -0.1, 0.0, 0.25, 0.9, 7.0, f64::NAN] {
        assert_eq!(score_to_style(s).blue, 150, "score {s}");
    }
}

#[test]
fn channels_move_monotonically() {
    let a = score_to_style(0.25);
    let b = score_to_style(0.75);
    assert!(a.red > b.red);
    assert_eq!(a.green, 255);

    let c = score_to_style(-0.25);
    let d = score_to_style(-0.75);
    assert!(c.green > d.green);
    assert_eq!(c.red, 255);
}
