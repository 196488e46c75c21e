use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::models::{Competition, Match, MatchStatus, Score, ScoreLine, Team};

/// Kick-off `days` from `now`, at 20:00 UTC.
fn kickoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    let date = (now + Duration::days(days)).date_naive();
    let eight_pm = NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default();
    date.and_time(eight_pm).and_utc()
}

fn team(id: u64, name: &str) -> Team {
    Team {
        id: Some(id),
        name: name.to_string(),
        crest: Some(format!("https://crests.football-data.org/{}.png", id)),
    }
}

fn fixture(id: u64, home: Team, away: Team, competition: &str, utc_date: DateTime<Utc>) -> Match {
    Match {
        id,
        status: MatchStatus::Scheduled,
        utc_date,
        competition: Competition { name: competition.to_string() },
        home_team: home,
        away_team: away,
        score: None,
    }
}

fn result(mut m: Match, home: u32, away: u32) -> Match {
    m.status = MatchStatus::Finished;
    m.score = Some(Score {
        full_time: Some(ScoreLine { home: Some(home), away: Some(away) }),
        current: None,
    });
    m
}

/// Pre-baked fixtures shown when the sports-data API is unavailable.
pub fn mock_matches(now: DateTime<Utc>) -> Vec<Match> {
    vec![
        fixture(1, team(65, "Manchester City"), team(64, "Liverpool"), "Premier League", kickoff(now, 1)),
        fixture(2, team(86, "Real Madrid"), team(81, "Barcelona"), "La Liga", kickoff(now, 2)),
        fixture(3, team(5, "Bayern Munich"), team(4, "Dortmund"), "Bundesliga", kickoff(now, 3)),
        result(
            fixture(4, team(57, "Arsenal"), team(61, "Chelsea"), "Premier League", kickoff(now, -2)),
            2, 1,
        ),
        result(
            fixture(5, team(66, "Man United"), team(73, "Tottenham"), "Premier League", kickoff(now, -3)),
            0, 3,
        ),
    ]
}
