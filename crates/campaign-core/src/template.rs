// Copyright (c) 2024-2026 Campaign Systems Contributors
//
// SPDX-License-Identifier: Apache-2.0
//!
//! The template renderer: a pure function `(template, contact) -> text`.
//!
//! Expansion runs in five ordered passes (see [`render`] for why the order
//! matters — getting it wrong lets a random-choice group eat a
//! not-yet-expanded `{{double}}` placeholder, or lets a bare-word fallback
//! clobber text a variable substitution already produced):
//!
//! 1. Known double-brace placeholders (`{{name}}`, `{{firstName}}`, `{{phone}}`).
//! 2. Arabic-named variables (`{arabic_name}`, `{english_name}` and synonyms).
//! 3. Random-choice groups (`{opt1-opt2-...}`).
//! 4. Remaining known single-brace variables (`{name}`, `{firstName}`, `{phone}`).
//! 5. Bare-word fallbacks (literal `arabic_name` / `english_name` outside braces).
//!
//! Unrecognized tokens are left verbatim.

use rand::Rng;
use regex::Regex;
use std::sync::OnceLock;

use crate::model::Contact;

/// Unicode ranges used to classify a name as Arabic. A name containing any
/// character in these ranges is routed to the Arabic variable family,
/// otherwise to the English one.
const ARABIC_RANGES: &[(u32, u32)] = &[
    (0x0600, 0x06FF),
    (0x0750, 0x077F),
    (0x08A0, 0x08FF),
    (0xFB50, 0xFDFF),
    (0xFE70, 0xFEFF),
];

pub fn contains_arabic(s: &str) -> bool {
    s.chars()
        .any(|c| ARABIC_RANGES.iter().any(|&(lo, hi)| (c as u32) >= lo && (c as u32) <= hi))
}

/// Extension methods used by the renderer (and by the executor's pre-flight
/// template validation, which samples these same resolvers across contacts).
pub trait ContactNameResolution {
    fn resolved_arabic_name(&self) -> Option<String>;
    fn resolved_english_name(&self) -> Option<String>;
    fn full_name(&self) -> String;
    fn first_name_token(&self) -> String;
}

impl ContactNameResolution for Contact {
    fn resolved_arabic_name(&self) -> Option<String> {
        self.arabic_name.clone().or_else(|| {
            if contains_arabic(&self.first_name) {
                Some(self.first_name.clone())
            } else {
                None
            }
        })
    }

    fn resolved_english_name(&self) -> Option<String> {
        self.english_name.clone().or_else(|| {
            if !contains_arabic(&self.first_name) {
                Some(self.first_name.clone())
            } else {
                None
            }
        })
    }

    fn full_name(&self) -> String {
        self.resolved_english_name()
            .or_else(|| self.resolved_arabic_name())
            .unwrap_or_else(|| self.first_name.clone())
    }

    fn first_name_token(&self) -> String {
        self.full_name()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string()
    }
}

fn double_brace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{\{\s*(name|firstname|phone)\s*\}\}").unwrap())
}

fn arabic_named_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Arabic synonyms are matched as literal alternatives since they contain
    // no ASCII word characters for `\w` to anchor on.
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\{\s*(arabic_name|arabicname|english_name|englishname|الاسم_بالعربي|الاسم_العربي|اسم_عربي|الاسم_انجليزي|الاسم_بالانجليزي|اسم_انجليزي)\s*\}",
        )
        .unwrap()
    })
}

fn single_brace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\{\s*(name|firstname|phone)\s*\}").unwrap())
}

fn bare_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(arabic_name|english_name)\b").unwrap())
}

fn expand_double_brace(text: &str, contact: &Contact) -> String {
    double_brace_re()
        .replace_all(text, |caps: &regex::Captures| resolve_token(&caps[1], contact))
        .into_owned()
}

fn expand_arabic_named(text: &str, contact: &Contact) -> String {
    arabic_named_re()
        .replace_all(text, |caps: &regex::Captures| {
            let tok = caps[1].to_lowercase();
            if tok == "arabic_name" || tok == "arabicname" || is_arabic_synonym(&tok, true) {
                contact.resolved_arabic_name().unwrap_or_default()
            } else {
                contact.resolved_english_name().unwrap_or_default()
            }
        })
        .into_owned()
}

fn is_arabic_synonym(tok: &str, arabic_family: bool) -> bool {
    const ARABIC_SYNS: &[&str] = &["الاسم_بالعربي", "الاسم_العربي", "اسم_عربي"];
    const ENGLISH_SYNS: &[&str] = &["الاسم_انجليزي", "الاسم_بالانجليزي", "اسم_انجليزي"];
    if arabic_family {
        ARABIC_SYNS.contains(&tok)
    } else {
        ENGLISH_SYNS.contains(&tok)
    }
}

fn expand_single_brace(text: &str, contact: &Contact) -> String {
    single_brace_re()
        .replace_all(text, |caps: &regex::Captures| resolve_token(&caps[1], contact))
        .into_owned()
}

fn expand_bare_words(text: &str, contact: &Contact) -> String {
    bare_word_re()
        .replace_all(text, |caps: &regex::Captures| {
            if caps[1].eq_ignore_ascii_case("arabic_name") {
                contact.resolved_arabic_name().unwrap_or_default()
            } else {
                contact.resolved_english_name().unwrap_or_default()
            }
        })
        .into_owned()
}

fn resolve_token(tok: &str, contact: &Contact) -> String {
    match tok.to_lowercase().as_str() {
        "name" => contact.full_name(),
        "firstname" => contact.first_name_token(),
        "phone" => contact.formatted_phone.clone(),
        _ => format!("{{{tok}}}"),
    }
}

/// Expand `{opt1-opt2-...-optN}` random-choice groups. Manual scan (rather
/// than a single regex) so a `{{double-brace}}` construct that happens to
/// contain a dash is never mistaken for a group — the scan only considers a
/// `{...}` span a candidate when it is not immediately wrapped by another
/// brace on either side.
fn expand_random_choice(text: &str, rng: &mut impl Rng) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0usize;
    while i < chars.len() {
        if chars[i] != '{' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        // Double-brace: copy the whole `{{...}}` span verbatim untouched.
        if i + 1 < chars.len() && chars[i + 1] == '{' {
            if let Some(close) = find_close(&chars, i + 1, '{', '}') {
                if close + 1 < chars.len() && chars[close + 1] == '}' {
                    out.extend(&chars[i..=close + 1]);
                    i = close + 2;
                    continue;
                }
            }
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match find_close(&chars, i, '{', '}') {
            Some(close) => {
                let inner: String = chars[i + 1..close].iter().collect();
                if inner.contains('-') {
                    let options: Vec<&str> = inner.split('-').filter(|o| !o.is_empty()).collect();
                    if options.is_empty() {
                        out.extend(&chars[i..=close]);
                    } else {
                        let pick = options[rng.gen_range(0..options.len())];
                        out.push_str(pick);
                    }
                } else {
                    // Not a random-choice group (no dash) — leave for the
                    // single-brace variable pass.
                    out.extend(&chars[i..=close]);
                }
                i = close + 1;
            }
            None => {
                out.push(chars[i]);
                i += 1;
            }
        }
    }
    out
}

/// Find the index of the matching `close` char for the `open` char at `start`,
/// with no nested `open`/`close` pairs in between (single-level braces only).
fn find_close(chars: &[char], start: usize, open: char, close: char) -> Option<usize> {
    let mut j = start + 1;
    while j < chars.len() {
        if chars[j] == open {
            return None;
        }
        if chars[j] == close {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Render `template` for `contact`, expanding all recognized tokens and one
/// random-choice group draw per call. Idempotent when `template` contains no
/// random-choice group (testable property 4): re-rendering the output of a
/// render that contained no `{a-b}` groups yields the same text again, since
/// every token this function recognizes is consumed on the first pass.
pub fn render(template: &str, contact: &Contact, rng: &mut impl Rng) -> String {
    let t = expand_double_brace(template, contact);
    let t = expand_arabic_named(&t, contact);
    let t = expand_random_choice(&t, rng);
    let t = expand_single_brace(&t, contact);
    expand_bare_words(&t, contact)
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;
    use uuid::Uuid;

    fn contact(first: &str, arabic: Option<&str>, english: Option<&str>, phone: &str) -> Contact {
        Contact {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            first_name: first.to_string(),
            arabic_name: arabic.map(|s| s.to_string()),
            english_name: english.map(|s| s.to_string()),
            formatted_phone: phone.to_string(),
            gender: Gender::Unknown,
            is_selected: true,
            status: crate::model::WorkflowStatus::New,
        }
    }

    fn rng() -> rand::rngs::StdRng {
        use rand::SeedableRng;
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn simple_first_name_substitution() {
        let c = contact("Ali", None, None, "201001");
        assert_eq!(render("Hi {firstName}!", &c, &mut rng()), "Hi Ali!");
    }

    #[test]
    fn double_brace_variant_works() {
        let c = contact("Ali", None, None, "201001");
        assert_eq!(render("Hi {{firstName}}!", &c, &mut rng()), "Hi Ali!");
    }

    #[test]
    fn phone_token_substitution() {
        let c = contact("Ali", None, None, "201001");
        assert_eq!(render("Call {phone}", &c, &mut rng()), "Call 201001");
    }

    #[test]
    fn arabic_name_field_used_when_present() {
        let c = contact("Ali", Some("علي"), Some("Ali"), "1");
        assert_eq!(render("{arabic_name}", &c, &mut rng()), "علي");
    }

    #[test]
    fn arabic_synonym_token_resolves() {
        let c = contact("Ali", Some("علي"), Some("Ali"), "1");
        assert_eq!(render("{الاسم_بالعربي}", &c, &mut rng()), "علي");
    }

    #[test]
    fn arabic_detection_routes_unlabeled_first_name() {
        // first_name itself is Arabic script and no explicit arabic_name set.
        let c = contact("سارة", None, None, "1");
        assert_eq!(render("{arabic_name}", &c, &mut rng()), "سارة");
        assert_eq!(render("{english_name}", &c, &mut rng()), "");
    }

    #[test]
    fn unrecognized_token_left_verbatim() {
        let c = contact("Ali", None, None, "1");
        assert_eq!(render("{unknown_token}", &c, &mut rng()), "{unknown_token}");
    }

    #[test]
    fn random_choice_group_yields_one_option() {
        let c = contact("Ali", None, None, "1");
        for seed in 0..20u64 {
            use rand::SeedableRng;
            let mut r = rand::rngs::StdRng::seed_from_u64(seed);
            let out = render("{hi-hello-salam} there", &c, &mut r);
            assert!(["hi there", "hello there", "salam there"].contains(&out.as_str()));
        }
    }

    #[test]
    fn random_choice_frequency_converges_across_many_draws() {
        use rand::SeedableRng;
        let c = contact("Ali", None, None, "1");
        let mut r = rand::rngs::StdRng::seed_from_u64(7);
        let mut counts = [0u32; 3];
        for _ in 0..3000 {
            match render("{hi-hello-salam}", &c, &mut r).as_str() {
                "hi" => counts[0] += 1,
                "hello" => counts[1] += 1,
                "salam" => counts[2] += 1,
                other => panic!("unexpected option: {other}"),
            }
        }
        for count in counts {
            assert!(count > 800 && count < 1200, "frequency out of range: {count}");
        }
    }

    #[test]
    fn double_brace_placeholder_not_eaten_by_random_choice_pass() {
        let c = contact("Ali", None, None, "1");
        // Not a recognized double-brace token, so it must survive verbatim —
        // in particular the random-choice pass must not treat the inner
        // `foo-bar` as a group and strip the outer braces.
        assert_eq!(render("{{foo-bar}}", &c, &mut rng()), "{{foo-bar}}");
    }

    #[test]
    fn single_option_group_with_trailing_dash_yields_that_option() {
        let c = contact("Ali", None, None, "1");
        assert_eq!(render("{onlyoption-}", &c, &mut rng()), "onlyoption");
    }

    #[test]
    fn render_is_idempotent_when_no_random_choice_group() {
        let c = contact("Ali", Some("علي"), None, "201001");
        let template = "Hi {firstName}, {arabic_name}, {phone}";
        let once = render(template, &c, &mut rng());
        let twice = render(&once, &c, &mut rng());
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_word_fallback_substitutes_outside_braces() {
        let c = contact("Ali", Some("علي"), Some("Ali"), "1");
        assert_eq!(render("note: arabic_name on file", &c, &mut rng()), "note: علي on file");
    }

    #[test]
    fn case_insensitive_token_matching() {
        let c = contact("Ali", None, None, "1");
        assert_eq!(render("{FIRSTNAME}", &c, &mut rng()), "Ali");
        assert_eq!(render("{FirstName}", &c, &mut rng()), "Ali");
    }
}
