// Shared prompt fragments. Each stage keeps its own templates in
// evaluation::prompts; this file holds the cross-cutting system messages.

/// System message for stages that expect a single JSON value back.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences or backticks. \
    Do NOT include explanations or apologies.";

/// System message for single-value extractions (a name, a label, a number).
pub const BARE_VALUE_SYSTEM: &str = "You are a resume screening assistant. \
    Answer with the requested value only, with no punctuation, quotes, or commentary. \
    When the value cannot be found, answer exactly: null";
