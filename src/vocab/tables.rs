//! Hand-curated pseudonym entries for the club's closed statistics vocabulary.
//!
//! Canonical keys are the exact spellings used by the graph schema and the
//! metric resolution table. Variants are the phrasings observed in real
//! questions; matching is case-insensitive so variants are written lowercase.

/// One canonical key and its surface phrasings.
#[derive(Debug, Clone, Copy)]
pub struct TableEntry {
    pub canonical: &'static str,
    pub variants: &'static [&'static str],
}

macro_rules! entry {
    ($canonical:literal, [$($variant:literal),+ $(,)?]) => {
        TableEntry {
            canonical: $canonical,
            variants: &[$($variant),+],
        }
    };
}

/// Canonical stat keys. "Goal Involvements" also raises the derived
/// goal-involvements flag on extraction.
pub static STAT_TYPES: &[TableEntry] = &[
    entry!("Goals", ["goals", "goal", "scored", "scorer", "scorers", "goalscorer", "net"]),
    entry!("Open Play Goals", ["open play goals", "goals from open play"]),
    entry!("Assists", ["assists", "assist", "assisted", "set up", "created"]),
    entry!(
        "Goal Involvements",
        ["goal involvements", "goals and assists", "goal contributions", "involvements"]
    ),
    entry!(
        "Appearances",
        ["appearances", "appearance", "apps", "games played", "matches played", "caps", "featured"]
    ),
    entry!("Minutes", ["minutes", "minutes played", "mins"]),
    entry!(
        "Clean Sheets",
        ["clean sheets", "clean sheet", "shutouts", "shut outs"]
    ),
    entry!("Goals Conceded", ["goals conceded", "conceded", "goals against", "let in"]),
    entry!(
        "Yellow Cards",
        ["yellow cards", "yellow card", "yellows", "bookings", "booked", "cautions"]
    ),
    entry!(
        "Red Cards",
        ["red cards", "red card", "reds", "sent off", "sendings off", "dismissals"]
    ),
    entry!("Own Goals", ["own goals", "own goal", "ogs"]),
    entry!(
        "Penalties",
        ["penalties", "penalty", "pens", "spot kicks", "from the spot"]
    ),
    entry!(
        "Hat-tricks",
        ["hat-tricks", "hat-trick", "hat tricks", "hat trick", "hatricks", "trebles"]
    ),
    entry!(
        "Man of the Match",
        ["man of the match", "motm", "player of the match", "motm awards"]
    ),
    entry!(
        "Goals per Appearance",
        ["goals per appearance", "goals per game", "goals per match", "scoring rate", "goal ratio"]
    ),
    entry!(
        "Minutes per Goal",
        ["minutes per goal", "mins per goal"]
    ),
    entry!(
        "Clean Sheets per Appearance",
        ["clean sheets per appearance", "clean sheets per game", "clean sheet ratio"]
    ),
    entry!("Wins", ["wins", "games won", "matches won", "victories"]),
    entry!("Draws", ["draws", "games drawn", "matches drawn"]),
    entry!("Losses", ["losses", "defeats", "games lost", "matches lost"]),
    entry!("Points", ["points", "league points", "pts"]),
    entry!("Win Rate", ["win rate", "win percentage", "win ratio"]),
];

/// Superlative / aggregation indicators.
pub static STAT_INDICATORS: &[TableEntry] = &[
    entry!("Most", ["most", "top", "leading", "record for"]),
    entry!("Least", ["least", "fewest", "bottom"]),
    entry!("Highest", ["highest", "biggest", "largest", "best"]),
    entry!("Lowest", ["lowest", "smallest", "worst"]),
    entry!("Average", ["average", "avg", "mean", "typically"]),
    entry!("Total", ["total", "overall", "combined", "in total", "altogether"]),
];

/// Question-framing words. These classify intent, not content.
pub static QUESTION_WORDS: &[TableEntry] = &[
    entry!("Count", ["how many", "how often", "number of", "count of"]),
    entry!("Who", ["who", "which player", "which of our players"]),
    entry!("When", ["when", "what date", "which season was"]),
    entry!("Which", ["which", "what team", "which team"]),
    entry!("Did", ["did", "has", "have", "was", "were"]),
    entry!("Show", ["show", "show me", "list", "give me", "tell me"]),
    entry!("Compare", ["compare", "versus", "vs", "or more than", "better record"]),
];

/// The club's own sides plus the whole-club aggregate. Canonical keys are the
/// short side names the graph schema stores on Fixture.team.
pub static TEAM_ENTITIES: &[TableEntry] = &[
    entry!("1s", ["1s", "1st team", "first team", "firsts", "first xi", "1st xi"]),
    entry!("2s", ["2s", "2nd team", "second team", "seconds", "2nd xi"]),
    entry!("3s", ["3s", "3rd team", "third team", "thirds", "3rd xi"]),
    entry!("4s", ["4s", "4th team", "fourth team", "fourths", "4th xi"]),
    entry!("5s", ["5s", "5th team", "fifth team", "fifths", "5th xi"]),
    entry!(
        "Club",
        ["the club", "whole club", "all teams", "across the club", "club wide"]
    ),
];

/// Exclusion phrasings. A team/opposition mentioned after one of these becomes
/// an exclusion filter instead of an inclusion filter.
pub static NEGATIONS: &[TableEntry] = &[
    entry!(
        "Excluding",
        [
            "without",
            "excluding",
            "not including",
            "except",
            "apart from",
            "other than",
            "not against",
            "outside of"
        ]
    ),
];

/// Home/away phrasings.
pub static LOCATIONS: &[TableEntry] = &[
    entry!("Home", ["at home", "home games", "home matches", "home form", "home"]),
    entry!(
        "Away",
        ["away from home", "away games", "away matches", "on the road", "away form", "away"]
    ),
];

/// Relative time frames. Absolute seasons/dates/ranges are matched by the
/// dedicated patterns in `extract::timeframe`, not by this table.
pub static TIME_FRAMES: &[TableEntry] = &[
    entry!("Last Season", ["last season", "previous season", "the season before"]),
    entry!("This Season", ["this season", "current season", "so far this year"]),
    entry!("All Time", ["all time", "ever", "in the club's history", "all-time"]),
];

/// Competition names and types as stored on Fixture.competition /
/// Fixture.competitionType.
pub static COMPETITIONS: &[TableEntry] = &[
    entry!("League", ["league", "division", "league games", "league matches"]),
    entry!("Cup", ["cup", "cup games", "cup matches", "cup runs", "knockout"]),
    entry!("Friendly", ["friendly", "friendlies", "pre-season"]),
];

/// Match result phrasings as stored on Fixture.result (W/D/L).
pub static RESULTS: &[TableEntry] = &[
    entry!("W", ["won", "wins", "win", "victory", "victories", "beat"]),
    entry!("D", ["drew", "draws", "draw", "drawn", "tied"]),
    entry!("L", ["lost", "losses", "loss", "defeat", "defeats", "beaten by"]),
];

/// Capitalized tokens that can never start or continue a player/opposition
/// name. Compared case-insensitively against proper-noun candidates.
pub static PROPER_NOUN_STOP_WORDS: &[&str] = &[
    "i", "a", "an", "the", "what", "how", "who", "whom", "when", "which", "where", "why",
    "did", "does", "do", "has", "have", "had", "is", "was", "were", "are", "will",
    "show", "give", "list", "tell", "many", "much", "most", "least", "best", "worst",
    "top", "bottom", "against", "for", "in", "on", "at", "and", "or", "but", "since",
    "before", "after", "between", "during", "versus", "team", "club", "season",
    "seasons", "game", "games", "match", "matches", "fixture", "fixtures", "player",
    "players", "league", "cup", "home", "away", "goals", "assists", "appearances",
    "captain", "award", "awards", "streak", "run", "week", "compare", "compared",
];
