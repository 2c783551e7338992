use crate::error::PathError;
use crate::namespace::Namespace;
use serde::{Deserialize, Serialize};

type Folder = fn(&str) -> String;

/// Casing policy a namespace declares for the first letter of its page names.
///
/// Serialized as the token MediaWiki uses in `<namespace case="...">`. Tokens
/// this crate cannot fold are kept verbatim so they survive a save/load cycle
/// and still fail loudly when a title is folded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CaseRule {
    FirstLetter,
    Unsupported(String),
}

impl CaseRule {
    pub fn as_str(&self) -> &str {
        match self {
            CaseRule::FirstLetter => "first-letter",
            CaseRule::Unsupported(token) => token,
        }
    }

    fn folder(&self) -> Option<Folder> {
        match self {
            CaseRule::FirstLetter => Some(upper_first),
            CaseRule::Unsupported(_) => None,
        }
    }
}

impl From<&str> for CaseRule {
    fn from(token: &str) -> Self {
        match token {
            "first-letter" => CaseRule::FirstLetter,
            other => CaseRule::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for CaseRule {
    fn from(token: String) -> Self {
        match token.as_str() {
            "first-letter" => CaseRule::FirstLetter,
            _ => CaseRule::Unsupported(token),
        }
    }
}

impl From<CaseRule> for String {
    fn from(rule: CaseRule) -> Self {
        match rule {
            CaseRule::FirstLetter => "first-letter".to_string(),
            CaseRule::Unsupported(token) => token,
        }
    }
}

/// Applies the namespace's casing rule to a bare (unprefixed) page name.
pub fn fold(namespace: &Namespace, local_name: &str) -> Result<String, PathError> {
    let folder = namespace
        .case_rule
        .folder()
        .ok_or_else(|| PathError::UnsupportedCaseRule(namespace.case_rule.as_str().to_string()))?;

    if local_name.is_empty() {
        return Err(PathError::EmptyName {
            namespace: namespace.name.clone(),
        });
    }

    Ok(folder(local_name))
}

/// Uppercases the first code point. Characters whose uppercase form is more
/// than one code point ("ß" -> "SS") are left alone so the name keeps its
/// length in characters.
fn upper_first(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    let folded = match (upper.next(), upper.next()) {
        (Some(single), None) => single,
        _ => simple_upper(first),
    };

    let rest = chars.as_str();
    let mut result = String::with_capacity(folded.len_utf8() + rest.len());
    result.push(folded);
    result.push_str(rest);
    result
}

/// Single code point uppercase for characters whose full uppercase form
/// expands (Greek letters with iota subscript); everything else, like `ß`,
/// keeps its own spelling.
fn simple_upper(c: char) -> char {
    let mapped = match c as u32 {
        cp @ (0x1F80..=0x1F87 | 0x1F90..=0x1F97 | 0x1FA0..=0x1FA7) => cp + 8,
        0x1FB3 => 0x1FBC,
        0x1FC3 => 0x1FCC,
        0x1FF3 => 0x1FFC,
        _ => return c,
    };
    char::from_u32(mapped).unwrap_or(c)
}
