// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Pre-flight template validation (§4.2 step 1): scan a template for the
//! variable families the renderer recognizes and confirm each one can be
//! resolved from at least one contact in a sample before the campaign is
//! allowed to start. Random-choice groups are always resolvable (they carry
//! no contact dependency); unrecognized tokens are not "variables" at all —
//! the renderer passes them through verbatim, so they are not validated.

use crate::error::CoreError;
use crate::model::Contact;
use crate::template::ContactNameResolution;

/// The canonical name of a recognized variable family, independent of which
/// brace style or synonym referenced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableFamily {
    Name,
    FirstName,
    ArabicName,
    EnglishName,
    Phone,
}

impl VariableFamily {
    fn label(self) -> &'static str {
        match self {
            VariableFamily::Name => "name",
            VariableFamily::FirstName => "firstName",
            VariableFamily::ArabicName => "arabic_name",
            VariableFamily::EnglishName => "english_name",
            VariableFamily::Phone => "phone",
        }
    }

    fn classify(token: &str) -> Option<Self> {
        match token.to_lowercase().as_str() {
            "name" => Some(VariableFamily::Name),
            "firstname" => Some(VariableFamily::FirstName),
            "phone" => Some(VariableFamily::Phone),
            "arabic_name" | "arabicname" => Some(VariableFamily::ArabicName),
            "english_name" | "englishname" => Some(VariableFamily::EnglishName),
            t if is_arabic_synonym(t) => Some(VariableFamily::ArabicName),
            t if is_english_synonym(t) => Some(VariableFamily::EnglishName),
            _ => None,
        }
    }

    fn resolvable_for(self, contact: &Contact) -> bool {
        match self {
            VariableFamily::Name => true,
            VariableFamily::FirstName => !contact.first_name_token().is_empty(),
            VariableFamily::Phone => !contact.formatted_phone.is_empty(),
            VariableFamily::ArabicName => contact.resolved_arabic_name().is_some(),
            VariableFamily::EnglishName => contact.resolved_english_name().is_some(),
        }
    }
}

fn is_arabic_synonym(tok: &str) -> bool {
    matches!(tok, "الاسم_بالعربي" | "الاسم_العربي" | "اسم_عربي")
}

fn is_english_synonym(tok: &str) -> bool {
    matches!(tok, "الاسم_انجليزي" | "الاسم_بالانجليزي" | "اسم_انجليزي")
}

/// Scan `template` for brace-delimited tokens (single or double brace) and
/// return the recognized variable families referenced. Random-choice groups
/// and unrecognized tokens are skipped — they carry no sample dependency.
pub fn find_referenced_variables(template: &str) -> Vec<VariableFamily> {
    let chars: Vec<char> = template.chars().collect();
    let mut found = Vec::new();
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '{' {
            i += 1;
            continue;
        }
        let double = i + 1 < chars.len() && chars[i + 1] == '{';
        let content_start = if double { i + 2 } else { i + 1 };
        let mut j = content_start;
        while j < chars.len() && chars[j] != '{' && chars[j] != '}' {
            j += 1;
        }
        if j >= chars.len() || chars[j] != '}' {
            i += 1;
            continue;
        }
        let token: String = chars[content_start..j].iter().collect();
        let token = token.trim();
        if !token.contains('-') {
            if let Some(fam) = VariableFamily::classify(token) {
                if !found.contains(&fam) {
                    found.push(fam);
                }
            }
        }
        i = if double { j + 2 } else { j + 1 };
    }
    found
}

/// Validate that every variable family referenced by `template` can be
/// resolved from at least one contact in `sample`. Returns the list of
/// referenced variable labels on success (for the caller to log/report), or
/// `CoreError::TemplateInvalid` listing what could not be resolved.
pub fn validate(template: &str, sample: &[Contact]) -> Result<Vec<String>, CoreError> {
    let referenced = find_referenced_variables(template);
    let mut errors = Vec::new();
    for fam in &referenced {
        if sample.is_empty() || !sample.iter().any(|c| fam.resolvable_for(c)) {
            errors.push(format!("{} could not be resolved from any sampled contact", fam.label()));
        }
    }
    if errors.is_empty() {
        Ok(referenced.into_iter().map(|f| f.label().to_string()).collect())
    } else {
        Err(CoreError::TemplateInvalid {
            variables_found: referenced.into_iter().map(|f| f.label().to_string()).collect(),
            validation_errors: errors,
        })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, WorkflowStatus};
    use uuid::Uuid;

    fn contact(first: &str, arabic: Option<&str>, english: Option<&str>) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            first_name: first.to_string(),
            arabic_name: arabic.map(String::from),
            english_name: english.map(String::from),
            formatted_phone: "201001".to_string(),
            gender: Gender::Unknown,
            is_selected: true,
            status: WorkflowStatus::New,
        }
    }

    #[test]
    fn finds_single_and_double_brace_variables() {
        let found = find_referenced_variables("Hi {firstName}, {{phone}}");
        assert!(found.contains(&VariableFamily::FirstName));
        assert!(found.contains(&VariableFamily::Phone));
    }

    #[test]
    fn random_choice_group_is_not_a_variable() {
        let found = find_referenced_variables("{a-b-c}");
        assert!(found.is_empty());
    }

    #[test]
    fn unrecognized_token_is_not_a_variable() {
        let found = find_referenced_variables("{some_unknown_thing}");
        assert!(found.is_empty());
    }

    #[test]
    fn validate_passes_when_sample_can_resolve_arabic_name() {
        let sample = vec![contact("Ali", Some("علي"), None)];
        assert!(validate("{arabic_name}", &sample).is_ok());
    }

    #[test]
    fn validate_fails_when_no_contact_has_arabic_name() {
        let sample = vec![contact("Ali", None, Some("Ali"))];
        let err = validate("{arabic_name}", &sample).unwrap_err();
        match err {
            CoreError::TemplateInvalid { variables_found, validation_errors } => {
                assert_eq!(variables_found, vec!["arabic_name".to_string()]);
                assert_eq!(validation_errors.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validate_fails_on_empty_sample_referencing_any_variable() {
        let err = validate("{phone}", &[]).unwrap_err();
        assert!(matches!(err, CoreError::TemplateInvalid { .. }));
    }
}
