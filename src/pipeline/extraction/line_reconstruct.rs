// Line reconstruction for digital PDF text.
// Glyph runs are grouped per page by rounded baseline, each group is read
// left to right, and groups are emitted top to bottom (PDF y grows upwards).

use std::cmp::Reverse;
use std::collections::BTreeMap;

use super::sanitize::sanitize_cell_text;
use super::types::GlyphRun;

/// Turn positioned glyph runs into ordered text lines.
///
/// Vertical jitter below one point is absorbed by rounding `y`. Lines that
/// are empty after sanitizing are dropped.
pub fn reconstruct_lines(runs: &[GlyphRun]) -> Vec<String> {
    let mut groups: BTreeMap<(u32, Reverse<i64>), Vec<&GlyphRun>> = BTreeMap::new();

    for run in runs {
        if !run.y.is_finite() || !run.x.is_finite() {
            continue;
        }
        let key = (run.page, Reverse(run.y.round() as i64));
        groups.entry(key).or_default().push(run);
    }

    groups
        .into_values()
        .filter_map(|mut line_runs| {
            line_runs.sort_by(|a, b| a.x.total_cmp(&b.x));
            let joined = line_runs
                .iter()
                .map(|r| r.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let clean = sanitize_cell_text(&joined);
            (!clean.is_empty()).then_some(clean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(page: u32, x: f32, y: f32, text: &str) -> GlyphRun {
        GlyphRun {
            page,
            x,
            y,
            text: text.to_string(),
        }
    }

    #[test]
    fn runs_on_same_baseline_join_left_to_right() {
        let runs = vec![
            run(1, 300.0, 680.0, "250,00"),
            run(1, 50.0, 680.0, "1.2 Pintura de tecto"),
            run(1, 200.0, 680.0, "vg 1"),
        ];
        assert_eq!(reconstruct_lines(&runs), vec!["1.2 Pintura de tecto vg 1 250,00"]);
    }

    #[test]
    fn lines_emitted_top_to_bottom() {
        let runs = vec![
            run(1, 50.0, 600.0, "bottom"),
            run(1, 50.0, 700.0, "top"),
            run(1, 50.0, 650.0, "middle"),
        ];
        assert_eq!(reconstruct_lines(&runs), vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn small_vertical_jitter_is_absorbed() {
        let runs = vec![run(1, 50.0, 700.2, "3"), run(1, 60.0, 699.9, "PINTURAS")];
        assert_eq!(reconstruct_lines(&runs), vec!["3 PINTURAS"]);
    }

    #[test]
    fn pages_keep_their_order() {
        let runs = vec![
            run(2, 50.0, 800.0, "page two"),
            run(1, 50.0, 100.0, "page one footer"),
            run(1, 50.0, 800.0, "page one header"),
        ];
        assert_eq!(
            reconstruct_lines(&runs),
            vec!["page one header", "page one footer", "page two"]
        );
    }

    #[test]
    fn whitespace_only_lines_dropped() {
        let runs = vec![run(1, 50.0, 700.0, "   "), run(1, 50.0, 690.0, "text")];
        assert_eq!(reconstruct_lines(&runs), vec!["text"]);
    }

    #[test]
    fn no_runs_no_lines() {
        assert!(reconstruct_lines(&[]).is_empty());
    }

    #[test]
    fn mojibake_repaired_in_lines() {
        let runs = vec![run(1, 50.0, 700.0, "250,00 â‚¬")];
        assert_eq!(reconstruct_lines(&runs), vec!["250,00 €"]);
    }
}
