//! Best-effort segmentation of generated portfolio prose into labeled
//! sections. Headings are recognised by keyword; anything that does not fit
//! lands in the current bucket, or in `other` before the first heading.
//! Never fails.

use serde::Serialize;

/// Longest line still considered a shouted (ALL CAPS) heading.
const MAX_HEADING_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    CharacterProfile,
    Abilities,
    Backstory,
    Stats,
    SignatureMoves,
    Quotes,
    SchoolLife,
    UltimateGoal,
    Other,
}

/// First match wins, so more specific headings come first:
/// "CHARACTER STATS" must not be taken for the character profile.
const HEADING_RULES: &[(SectionKind, &[&str])] = &[
    (SectionKind::Stats, &["stats", "statistics"]),
    (SectionKind::Backstory, &["backstory", "background", "origin"]),
    (SectionKind::Abilities, &["abilities", "powers"]),
    (SectionKind::SignatureMoves, &["signature move", "techniques"]),
    (SectionKind::Quotes, &["quotes", "catchphrase"]),
    (SectionKind::SchoolLife, &["school", "academic"]),
    (SectionKind::UltimateGoal, &["goal", "dream"]),
    (
        SectionKind::CharacterProfile,
        &["character profile", "character description", "anime character"],
    ),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSections {
    pub character_profile: String,
    pub abilities: String,
    pub backstory: String,
    pub stats: String,
    pub signature_moves: String,
    pub quotes: String,
    pub school_life: String,
    pub ultimate_goal: String,
    /// Text before the first recognised heading.
    pub other: String,
}

impl PortfolioSections {
    fn bucket_mut(&mut self, kind: SectionKind) -> &mut String {
        match kind {
            SectionKind::CharacterProfile => &mut self.character_profile,
            SectionKind::Abilities => &mut self.abilities,
            SectionKind::Backstory => &mut self.backstory,
            SectionKind::Stats => &mut self.stats,
            SectionKind::SignatureMoves => &mut self.signature_moves,
            SectionKind::Quotes => &mut self.quotes,
            SectionKind::SchoolLife => &mut self.school_life,
            SectionKind::UltimateGoal => &mut self.ultimate_goal,
            SectionKind::Other => &mut self.other,
        }
    }

    fn trim_all(&mut self) {
        for kind in [
            SectionKind::CharacterProfile,
            SectionKind::Abilities,
            SectionKind::Backstory,
            SectionKind::Stats,
            SectionKind::SignatureMoves,
            SectionKind::Quotes,
            SectionKind::SchoolLife,
            SectionKind::UltimateGoal,
            SectionKind::Other,
        ] {
            let bucket = self.bucket_mut(kind);
            *bucket = bucket.trim().to_string();
        }
    }
}

/// Opening characters that mark a line as a quote rather than a heading.
const QUOTE_MARKS: &[char] = &['"', '\'', '\u{201c}', '\u{2018}', '\u{300c}'];

/// A recognised heading line: the title to match, plus any trailing text
/// that belongs to the section body.
#[derive(Debug, PartialEq, Eq)]
struct Heading<'a> {
    title: &'a str,
    trailing: &'a str,
}

/// Returns the heading if `line` looks like one:
/// a markdown `#` header, a `**bold**` run (after any leading emoji) followed
/// by nothing but punctuation or a parenthetical, or a short ALL CAPS line.
/// List items and quotes are body text whatever their formatting.
fn heading_text(line: &str) -> Option<Heading<'_>> {
    if let Some(rest) = line.strip_prefix('#') {
        return Some(Heading {
            title: rest.trim_start_matches('#').trim(),
            trailing: "",
        });
    }

    if is_list_item_or_quote(line) {
        return None;
    }

    let core = line.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '*');

    if let Some(rest) = core.strip_prefix("**") {
        let end = rest.find("**")?;
        let trailing = rest[end + 2..].trim();
        let parenthetical = trailing.starts_with('(') && trailing.ends_with(')');
        let bare = trailing.chars().all(|c| !c.is_alphanumeric());
        return (parenthetical || bare).then(|| Heading {
            title: rest[..end].trim(),
            trailing,
        });
    }

    let letters = core.chars().filter(|c| c.is_alphabetic()).count();
    let shouted = letters >= 3
        && core.chars().count() <= MAX_HEADING_CHARS
        && !core.ends_with('!')
        && core
            .chars()
            .filter(|c| c.is_alphabetic())
            .all(|c| !c.is_lowercase());
    shouted.then_some(Heading {
        title: core,
        trailing: "",
    })
}

fn is_list_item_or_quote(line: &str) -> bool {
    let bulleted = ["- ", "* ", "+ ", "\u{2022}", ">"]
        .iter()
        .any(|marker| line.starts_with(marker));
    let quoted = line
        .chars()
        .take_while(|c| !c.is_alphanumeric())
        .any(|c| QUOTE_MARKS.contains(&c));
    bulleted || quoted
}

/// Heading trailer worth keeping as body text, e.g. "(Rate 1-10)".
fn trailing_body(trailing: &str) -> Option<&str> {
    let body = trailing.trim_start_matches(|c: char| !c.is_alphanumeric() && c != '(');
    body.chars().any(char::is_alphanumeric).then_some(body.trim())
}

fn match_heading(heading: &str) -> Option<SectionKind> {
    let lower = heading.to_lowercase();
    HEADING_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(kind, _)| *kind)
}

/// Splits generated portfolio text into sections.
pub fn parse_sections(text: &str) -> PortfolioSections {
    let mut sections = PortfolioSections::default();
    let mut current = SectionKind::Other;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let heading = heading_text(trimmed);
        if let Some(h) = &heading {
            if let Some(kind) = match_heading(h.title) {
                current = kind;
                if let Some(body) = trailing_body(h.trailing) {
                    push_line(&mut sections, current, body);
                }
                continue;
            }
        }

        let content = if heading.is_some() {
            trimmed.trim_start_matches('#').replace("**", "")
        } else {
            trimmed.to_string()
        };
        if content.trim().is_empty() {
            continue;
        }
        push_line(&mut sections, current, content.trim());
    }

    sections.trim_all();
    sections
}

fn push_line(sections: &mut PortfolioSections, kind: SectionKind, line: &str) {
    let bucket = sections.bucket_mut(kind);
    bucket.push_str(line);
    bucket.push('\n');
}
