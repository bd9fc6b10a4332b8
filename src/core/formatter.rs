use crate::domain::model::{Persona, RecommendationResult};

pub const DEFAULT_FEELING: &str = "concerned";
pub const DEFAULT_CHALLENGE: &str = "your workload";
pub const DEFAULT_TITLE: &str = "Course";
pub const DEFAULT_REASON: &str = "N/A";

pub const NO_RECOMMENDATIONS_MESSAGE: &str =
    "I could not generate recommendations. Please share more details about how you feel and what you are struggling with.";

const HEADER: &str = "Here are your recommended courses:";
const RULE: &str = "---";

/// Renders a parsed reply as a chat message. Pure; missing or blank fields
/// fall back to the `DEFAULT_*` values and recommendation order is kept as
/// received.
pub fn format_message(result: &RecommendationResult) -> String {
    let recommendations = result.recommendations();
    if recommendations.is_empty() {
        return NO_RECOMMENDATIONS_MESSAGE.to_string();
    }

    let persona = result.persona();
    let feeling = persona
        .and_then(Persona::first_feeling)
        .unwrap_or(DEFAULT_FEELING);
    let challenge = persona
        .and_then(Persona::first_challenge)
        .unwrap_or(DEFAULT_CHALLENGE);

    let mut lines = vec![
        format!(
            "You seem to be feeling **{}** and struggling with **{}**.",
            feeling, challenge
        ),
        String::new(),
        HEADER.to_string(),
        String::new(),
        RULE.to_string(),
    ];

    for (index, rec) in recommendations.iter().enumerate() {
        let title = non_blank(rec.title.as_deref()).unwrap_or(DEFAULT_TITLE);
        let reason = non_blank(rec.reason.as_deref()).unwrap_or(DEFAULT_REASON);

        lines.push(format!("**{}. {}**", index + 1, title));
        lines.push(format!("- **Why:** {}", reason));
        lines.push(String::new());
        lines.push(RULE.to_string());
    }

    lines.join("\n")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
