use crate::error::{CaseReviewError, Result};
use crate::prompts::{
    CAPABILITIES_PLACEHOLDER, CASE_DESCRIPTION_PLACEHOLDER, JUSTIFICATION_INSTRUCTION,
};

pub const MAX_SELECTED_CAPABILITIES: usize = 3;

/// Reject selections the generation step cannot work with. Runs before any
/// network call.
pub fn validate_selection<S: AsRef<str>>(case_description: &str, capabilities: &[S]) -> Result<()> {
    if capabilities.is_empty() {
        return Err(CaseReviewError::InvalidSelection(
            "Please select at least one capability".to_string(),
        ));
    }
    if capabilities.len() > MAX_SELECTED_CAPABILITIES {
        return Err(CaseReviewError::InvalidSelection(format!(
            "Please select no more than {} capabilities ({} selected)",
            MAX_SELECTED_CAPABILITIES,
            capabilities.len()
        )));
    }
    if case_description.trim().is_empty() {
        return Err(CaseReviewError::InvalidSelection(
            "Please enter a case description".to_string(),
        ));
    }
    Ok(())
}

/// One `Capability:` heading plus an empty justification slot per selected
/// capability, in selection order.
pub fn format_capabilities<S: AsRef<str>>(capabilities: &[S]) -> String {
    let mut formatted = String::new();
    for capability in capabilities {
        formatted.push_str("Capability: ");
        formatted.push_str(capability.as_ref());
        formatted.push('\n');
        formatted.push_str(JUSTIFICATION_INSTRUCTION);
        formatted.push_str("\n\n");
    }
    formatted
}

/// Fill `template` with the case description and the formatted capability
/// blocks.
pub fn assemble_prompt<S: AsRef<str>>(
    template: &str,
    case_description: &str,
    capabilities: &[S],
) -> Result<String> {
    validate_selection(case_description, capabilities)?;

    let formatted = format_capabilities(capabilities);
    render_template(
        template,
        &[
            (CAPABILITIES_PLACEHOLDER, formatted.as_str()),
            (CASE_DESCRIPTION_PLACEHOLDER, case_description),
        ],
    )
}

/// Substitute `{name}` placeholders. `{{` and `}}` are literal braces.
///
/// Every supplied placeholder must occur in the template at least once, and
/// the template may not reference a name that was not supplied.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut used = vec![false; values.len()];
    let mut chars = template.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    output.push('{');
                    continue;
                }
                let rest = &template[idx + 1..];
                let end = rest.find('}').ok_or_else(|| {
                    CaseReviewError::Template(format!("unclosed '{{' at byte {}", idx))
                })?;
                let name = &rest[..end];
                let position = values
                    .iter()
                    .position(|(key, _)| *key == name)
                    .ok_or_else(|| {
                        CaseReviewError::Template(format!("unknown placeholder '{{{}}}'", name))
                    })?;
                output.push_str(values[position].1);
                used[position] = true;
                // skip the name and the closing brace
                for _ in 0..=name.chars().count() {
                    chars.next();
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    output.push('}');
                } else {
                    return Err(CaseReviewError::Template(format!(
                        "single '}}' at byte {} (use '}}}}' for a literal brace)",
                        idx
                    )));
                }
            }
            _ => output.push(c),
        }
    }

    if let Some(missing) = values
        .iter()
        .zip(&used)
        .find(|(_, used)| !**used)
        .map(|((key, _), _)| key)
    {
        return Err(CaseReviewError::Template(format!(
            "template is missing the '{{{}}}' placeholder",
            missing
        )));
    }

    Ok(output)
}
