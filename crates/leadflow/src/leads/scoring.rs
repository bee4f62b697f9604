use super::domain::Priority;

/// Inputs the scoring rubric consumes. Everything is borrowed so callers
/// can score a submission before it is persisted.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub brand: &'a str,
    pub quantity: u32,
    pub timeline: Option<&'a str>,
    pub source: Option<&'a str>,
    pub category: &'a str,
    pub city: Option<&'a str>,
}

const BASE_SCORE: u16 = 15;

/// Deterministic lead score in `[0, 100]`.
///
/// The rubric is monotone in the two signals sales care about most:
/// a larger requirement never scores below a smaller one, and a more
/// urgent timeline never scores below a laxer one.
pub fn score(input: ScoreInput<'_>) -> u8 {
    let mut total = BASE_SCORE;

    total += quantity_points(input.quantity);
    total += timeline_points(input.timeline);
    total += source_points(input.source);
    total += brand_points(input.brand, input.category);
    total += city_points(input.city);

    total.min(100) as u8
}

fn quantity_points(quantity: u32) -> u16 {
    match quantity {
        0..=4 => 0,
        5..=9 => 6,
        10..=24 => 12,
        25..=49 => 20,
        50..=99 => 28,
        _ => 35,
    }
}

fn timeline_points(timeline: Option<&str>) -> u16 {
    let Some(raw) = timeline else { return 0 };
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.contains("today") || lowered.contains("immediate") || lowered.contains("urgent") {
        30
    } else if lowered.contains("week") {
        24
    } else if lowered.contains("month") {
        12
    } else {
        0
    }
}

fn source_points(source: Option<&str>) -> u16 {
    let Some(raw) = source else { return 0 };
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.contains("referral") {
        8
    } else if lowered.contains("ads") || lowered.contains("campaign") {
        5
    } else {
        0
    }
}

fn brand_points(brand: &str, category: &str) -> u16 {
    const ENTERPRISE_LINES: [&str; 6] = [
        "microsoft",
        "google",
        "acronis",
        "sophos",
        "seqrite",
        "zoho",
    ];
    let brand = brand.trim().to_ascii_lowercase();
    let category = category.trim().to_ascii_lowercase();
    if ENTERPRISE_LINES
        .iter()
        .any(|line| brand.contains(line) || category.contains(line))
    {
        5
    } else {
        0
    }
}

fn city_points(city: Option<&str>) -> u16 {
    const FOCUS_CITIES: [&str; 8] = [
        "chandigarh",
        "mohali",
        "panchkula",
        "delhi",
        "gurugram",
        "noida",
        "mumbai",
        "bengaluru",
    ];
    let Some(raw) = city else { return 0 };
    let lowered = raw.trim().to_ascii_lowercase();
    if FOCUS_CITIES.iter().any(|focus| lowered.contains(focus)) {
        4
    } else {
        0
    }
}

/// The single canonical score-to-tier table. Manual and AI-assisted score
/// overrides are interpreted through this same mapping everywhere a tier
/// is displayed or derived.
pub fn priority_from_score(score: u8) -> Priority {
    match score {
        80..=u8::MAX => Priority::Hot,
        45..=79 => Priority::Warm,
        _ => Priority::Cold,
    }
}
