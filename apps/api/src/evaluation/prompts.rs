// All classifier prompt templates for the evaluation pipeline.
// Placeholders are `{name}`-style and filled by `fill_template` before sending.

pub const FULL_NAME_PROMPT: &str = "Return the candidate's full name from the following resume text. \
Return only the name or null if not found.\n\nResume:\n{resume_text}";

pub const EMPLOYMENT_STATUS_PROMPT: &str = "Is the candidate currently employed? \
If the most recent position's end date is \"present\" (e.g. 2022-Present), the person is \"Employed\". \
Otherwise, \"Unemployed\". Return only \"Employed\", \"Unemployed\", or null.\n\nResume:\n{resume_text}";

pub const EDUCATION_PROMPT: &str = "Return the highest education level (None, Associate, Bachelor, Master, PhD) \
from the following resume text. Return only the value or null.\n\nResume:\n{resume_text}";

pub const JOB_TITLE_PROMPT: &str = "Return the most recent job title from the following resume text. \
Return only the title or null.\n\nResume:\n{resume_text}";

pub const YEARS_OF_EXPERIENCE_PROMPT: &str = "What is the candidate's total years of professional experience? \
If possible, extract it directly from the resume summary. Otherwise, calculate it as the number of years \
between the earliest listed job's start date and the most recent job's end date or \"present\". \
Return only a number or null.\n\nResume:\n{resume_text}";

pub const CURRENT_COMPANY_PROMPT: &str = "Return the name of the most recent company from the resume. \
Return only the name or null.\n\nResume:\n{resume_text}";

pub const PREVIOUS_COMPANIES_PROMPT: &str = "Return the list of all companies (excluding the most recent company) \
that this person worked at. Return a JSON array of strings (company names) or [] if no previous companies \
are found.\n\nResume:\n{resume_text}";

pub const CURRENT_LOCATION_PROMPT: &str = "Return the candidate's current city/region from the resume. \
Return only the location or null.\n\nResume:\n{resume_text}";

/// Job-title tier classification. Answer is a bare label.
pub const JOB_TITLE_TIER_PROMPT: &str = r#"You are an expert HR classifier. Given a job title, classify it as HIGH, MID, or LOW based on these rules:

HIGH =
- Customer Success Manager / Account Manager
- Analytics
- Product Manager
- Software Engineer
- Account Executive
- Sales Development Representative
- Business Development Representative
- Sales Engineer
- Solutions Engineer
- Product Design
- Data Science
- Product Marketing

MID =
- Project Manager
- Program Manager
- Business Operations
- Strategy
- IT
- Sales Manager
- Sales Enablement
- Sales or Rev Ops
- UX Design or any other design
- Finance
- Security
- Customer Support
- Accounting
- People Operations
- Product Ops
- Business Analyst
- HR
- Partnerships
- Professional Services
- Any other Marketing aside from Product Marketing

LOW =
- Director and above (Director, VP, Chief etc.)

Classify the following job title. If you are unsure, use your best judgment based on the above lists. Return only one of: HIGH, MID, or LOW.

Job Title: {title}"#;

pub const COMPANY_RATING_PROMPT: &str = "Rate the company \"{name}\" from {min}-{max} based on size, fame, \
and recruiter reputation. Return only a JSON object: {\"name\": \"{name}\", \"rating\": <integer>}";

pub const LOCATION_RATING_PROMPT: &str = "Rate the city/region \"{name}\" from {min}-{max} for job opportunity \
({max}=best, {min}=worst). Only give {max} to New York or San Francisco. \
Return only a JSON object: {\"name\": \"{name}\", \"rating\": <integer>}";

pub const SUMMARY_PROMPT: &str = r#"Given the following extracted fields and scores for a candidate, return a JSON object with four keys:
"pros" (array of strings, at most {max_points}), "cons" (array of strings, at most {max_points}),
"recommendation" (string: "Accept" or "Reject"), and "explanation" (string, 2 sentences).
The candidate is accepted at {threshold} points or more out of {max_score}.

Extracted: {extracted_json}
Scores: {scoring_json}
Total Score: {total_score}
Missing Fields: {missing_json}"#;

/// Substitutes `{key}` placeholders in one left-to-right pass. Inserted values
/// are never rescanned, and braces that do not name a known key stay literal.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_keeps_json_braces() {
        let filled = fill_template(COMPANY_RATING_PROMPT, &[("name", "Acme"), ("min", "0"), ("max", "6")]);
        assert!(filled.starts_with("Rate the company \"Acme\" from 0-6"));
        assert!(filled.ends_with("{\"name\": \"Acme\", \"rating\": <integer>}"));
    }

    #[test]
    fn test_fill_template_does_not_rescan_inserted_values() {
        let filled = fill_template("{a} and {b}", &[("a", "{b}"), ("b", "two")]);
        assert_eq!(filled, "{b} and two");
    }

    #[test]
    fn test_fill_template_leaves_unknown_and_unclosed_braces() {
        assert_eq!(fill_template("{x} {y", &[("y", "1")]), "{x} {y");
        assert_eq!(fill_template("{{y}}", &[("y", "1")]), "{1}");
    }
}
