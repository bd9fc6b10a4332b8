use crate::domain::model::CourseEntry;
use crate::utils::error::Result;

const SYSTEM_PROMPT: &str = r#"You are an expert student advisor and psychological analyst.
Your job is to perform two tasks:
1. Analyze a user's raw chat history to generate a structured `persona`.
2. Use that generated persona to rank a provided `course_list` and select the top 3 recommendations.

You MUST respond with ONLY a valid JSON object following this exact schema:
{
  "generated_persona": {
    "summary": "A brief summary...",
    "expressed_feelings": ["feeling1", "feeling2"],
    "reported_challenges": ["challenge1", "challenge2"],
    "expressed_goals": ["goal1", "goal2"]
  },
  "recommendations": [
    {"id": "...", "title": "...", "reason": "..."},
    {"id": "...", "title": "...", "reason": "..."},
    {"id": "...", "title": "...", "reason": "..."}
  ]
}
"#;

/// Fixed instruction block sent in the `system` role.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// `user` role block: the chat history verbatim, then the whole catalog as
/// compact JSON in catalog order.
pub fn user_prompt(user_chat_history: &str, catalog: &[CourseEntry]) -> Result<String> {
    let course_list = serde_json::to_string(catalog)?;
    Ok(format!(
        "<user_chat>\n{}\n</user_chat>\n\n<course_list>\n{}\n</course_list>\n",
        user_chat_history, course_list
    ))
}
