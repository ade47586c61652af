//! Read-only views derived from a match document.

use serde::Serialize;

use crate::db::models::{BatsmanStat, BowlerStat, ExtraType, Match, MatchResult, MatchStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsLine {
    pub innings: u8,
    pub team: String,
    pub score: u32,
    pub wickets: u32,
    pub overs: String,
    pub run_rate: f64,
    pub extras: u32,
    pub target: Option<u32>,
    /// "Strikers 150/6 (20.0)"
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Four,
    Six,
    Wicket,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub innings: u8,
    pub over: String,
    pub kind: HighlightKind,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub match_id: String,
    pub status: MatchStatus,
    pub innings: Vec<InningsLine>,
    pub top_batters: Vec<BatsmanStat>,
    pub top_bowlers: Vec<BowlerStat>,
    pub highlights: Vec<Highlight>,
    pub result: Option<MatchResult>,
}

/// Summary lines for every innings that has started.
pub fn innings_lines(m: &Match) -> Vec<InningsLine> {
    m.innings
        .iter()
        .enumerate()
        .filter(|(i, inn)| {
            inn.batting_team.is_some()
                && (*i == 0 || m.current_innings >= 2 || inn.score > 0 || inn.completed)
        })
        .map(|(i, inn)| {
            let team = m.team_name(inn.batting_team).to_string();
            let overs = inn.overs_display();
            InningsLine {
                innings: i as u8 + 1,
                summary: format!("{} {}/{} ({})", team, inn.score, inn.wickets, overs),
                team,
                score: inn.score,
                wickets: inn.wickets,
                overs,
                run_rate: inn.run_rate,
                extras: inn.extras.total,
                target: inn.target,
            }
        })
        .collect()
}

/// Highest run scorers; fewer balls faced breaks ties.
pub fn top_batters(m: &Match, limit: usize) -> Vec<BatsmanStat> {
    let mut rows = m.batting.clone();
    rows.sort_by(|a, b| b.runs.cmp(&a.runs).then(a.balls.cmp(&b.balls)));
    rows.truncate(limit);
    rows
}

/// Most wickets; fewer runs conceded breaks ties.
pub fn top_bowlers(m: &Match, limit: usize) -> Vec<BowlerStat> {
    let mut rows = m.bowling.clone();
    rows.sort_by(|a, b| b.wickets.cmp(&a.wickets).then(a.runs.cmp(&b.runs)));
    rows.truncate(limit);
    rows
}

/// Boundaries and wickets in delivery order.
pub fn highlights(m: &Match) -> Vec<Highlight> {
    let mut out = Vec::new();
    for e in &m.ball_events {
        let over = e.over_label();
        if let Some(w) = &e.wicket {
            let text = match (&w.fielder, w.kind.credits_bowler()) {
                (Some(fielder), true) => format!(
                    "{} {} ({}, b {})",
                    w.player.name,
                    w.kind.label(),
                    fielder,
                    e.bowler.name
                ),
                (None, true) => format!("{} {} b {}", w.player.name, w.kind.label(), e.bowler.name),
                (Some(fielder), false) => format!("{} {} ({})", w.player.name, w.kind.label(), fielder),
                (None, false) => format!("{} {}", w.player.name, w.kind.label()),
            };
            out.push(Highlight {
                innings: e.innings,
                over: over.clone(),
                kind: HighlightKind::Wicket,
                text,
            });
        }
        if e.extra_type != ExtraType::None && e.extra_type != ExtraType::NoBall {
            continue;
        }
        let kind = match e.batter_runs {
            4 => HighlightKind::Four,
            6 => HighlightKind::Six,
            _ => continue,
        };
        out.push(Highlight {
            innings: e.innings,
            over,
            kind,
            text: format!("{} hits {} off {}", e.striker.name, e.batter_runs, e.bowler.name),
        });
    }
    out
}

pub fn build_report(m: &Match, limit: usize) -> MatchReport {
    MatchReport {
        match_id: m.id.clone(),
        status: m.status,
        innings: innings_lines(m),
        top_batters: top_batters(m, limit),
        top_bowlers: top_bowlers(m, limit),
        highlights: highlights(m),
        result: m.result.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{MatchFormat, NewMatch, PlayerRef, Team};
    use crate::scoring::{RawBall, ScoringRequest, ScoringRules, TossRequest};
    use chrono::Utc;

    fn scored_match() -> Match {
        let mut m = Match::new(
            NewMatch {
                id: "r1".into(),
                format: MatchFormat::t20(),
                team_a: Team::named("Strikers"),
                team_b: Team::named("Thunder"),
            },
            Utc::now(),
        )
        .unwrap();
        m.set_toss(
            &TossRequest {
                toss_winner_team: "teamB".into(),
                decision: "field".into(),
            },
            Utc::now(),
        )
        .unwrap();
        let rules = ScoringRules::default();
        for ball in [
            RawBall::new(6).striker("Ana").non_striker("Bea").bowler("Xu"),
            RawBall::new(4),
            RawBall::new(1),
            RawBall::new(4).extra("nb"),
            RawBall::new(4).extra("lb"),
            RawBall::new(0).wicket("caught").fielder("Yan"),
        ] {
            m.score(&ScoringRequest::Delivery(ball), &rules, Utc::now()).unwrap();
        }
        m
    }

    #[test]
    fn test_innings_summary_line() {
        let m = scored_match();
        let lines = innings_lines(&m);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].summary, "Strikers 19/1 (0.5)");
        assert_eq!(lines[0].extras, 5);
    }

    #[test]
    fn test_leaders_ordering() {
        let m = scored_match();
        let batters = top_batters(&m, 5);
        assert_eq!(batters[0].player.name, "Ana");
        assert_eq!(batters[0].runs, 11);
        assert_eq!(batters[1].player.name, "Bea");
        assert_eq!(batters[1].runs, 3);
        assert_eq!(top_batters(&m, 1).len(), 1);

        let bowlers = top_bowlers(&m, 5);
        assert_eq!(bowlers[0].wickets, 1);
    }

    #[test]
    fn test_highlights_skip_leg_bye_boundaries() {
        let m = scored_match();
        let kinds: Vec<_> = highlights(&m).iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                HighlightKind::Six,
                HighlightKind::Four,
                HighlightKind::Wicket
            ]
        );
        let wicket = highlights(&m).pop().unwrap();
        assert_eq!(wicket.text, "Ana caught (Yan, b Xu)");
        assert_eq!(wicket.over, "0.5");
    }

    #[test]
    fn test_no_ball_boundary_counts_in_both_views() {
        let mut m = scored_match();
        let ball = RawBall::new(5).extra("nb").striker("Cat");
        m.score(&ScoringRequest::Delivery(ball), &ScoringRules::default(), Utc::now())
            .unwrap();

        let last = highlights(&m).pop().unwrap();
        assert_eq!(last.kind, HighlightKind::Four);
        assert_eq!(last.text, "Cat hits 4 off Xu");
        let cat = m.batter(1, &PlayerRef::new("Cat")).unwrap();
        assert_eq!((cat.runs, cat.balls, cat.fours), (4, 0, 1));
    }

    #[test]
    fn test_report_assembles_views() {
        let report = build_report(&scored_match(), 3);
        assert_eq!(report.match_id, "r1");
        assert_eq!(report.status, MatchStatus::Live);
        assert!(report.result.is_none());
        assert_eq!(report.highlights.len(), 3);
    }
}
