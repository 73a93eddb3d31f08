pub const STRUCTURED_SYSTEM: &str = include_str!("../data/prompts/structured_system.txt");
pub const FREE_TEXT_SYSTEM: &str = include_str!("../data/prompts/free_text_system.txt");

pub const DETAIL_BRIEF: &str = "Keep every field short: one sentence or a few words.";
pub const DETAIL_STANDARD: &str = "Use a moderate level of detail.";
pub const DETAIL_DETAILED: &str =
    "Be thorough: give concrete, specific detail in every field within the limits above.";

pub const EXTRAS_STRUCTURED: &str =
    "Fill \"extras\" with stretch goals, related resources or presentation tips.";
pub const EXTRAS_STRUCTURED_NONE: &str = "Leave \"extras\" as an empty array.";
pub const EXTRAS_FREE_TEXT: &str =
    "After Timeline, add an \"### Extras\" heading with stretch goals and useful resources.";

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}
