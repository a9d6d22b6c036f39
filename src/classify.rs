use crate::model::ColorTriple;

pub const DEFAULT_CALENDAR: &str = "Schedule";

struct Rule {
    calendar: &'static str,
    keywords: &'static [&'static str],
}

// Tested in order, first match wins.
const RULES: &[Rule] = &[
    Rule {
        calendar: "Aquatics",
        keywords: &["aqua", "water", "swim", "pool"],
    },
    Rule {
        calendar: "Court Sports",
        keywords: &["pickleball", "basketball", "volleyball", "court"],
    },
    Rule {
        calendar: "Community",
        keywords: &["yoga", "coffee", "teen", "community", "wellness"],
    },
];

const BLUE: ColorTriple = ColorTriple {
    background: "#dbeafe",
    text: "#1e3a8a",
    border: "#3b82f6",
};

const ORANGE: ColorTriple = ColorTriple {
    background: "#ffedd5",
    text: "#7c2d12",
    border: "#f97316",
};

const PINK: ColorTriple = ColorTriple {
    background: "#fce7f3",
    text: "#831843",
    border: "#ec4899",
};

const GRAY: ColorTriple = ColorTriple {
    background: "#f3f4f6",
    text: "#1f2937",
    border: "#9ca3af",
};

const PALETTE: &[(&str, ColorTriple)] = &[
    ("Aquatics", BLUE),
    ("Court Sports", ORANGE),
    ("Community", PINK),
];

/// Picks the calendar for an event from keywords in its title and location.
pub fn classify(title: &str, location: Option<&str>) -> &'static str {
    let haystack = format!("{} {}", title, location.unwrap_or_default()).to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| haystack.contains(keyword)))
        .map_or(DEFAULT_CALENDAR, |rule| rule.calendar)
}

pub fn color_for(calendar: &str) -> ColorTriple {
    PALETTE
        .iter()
        .find(|(name, _)| *name == calendar)
        .map_or(GRAY, |(_, color)| *color)
}
