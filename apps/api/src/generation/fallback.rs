//! Fallback artifacts: produced locally when the upstream model is
//! unavailable. Everything here is pure: same input, same bytes out.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::models::profile::UserProfile;

/// Characters of the subject name shown on the avatar before truncation.
pub const LABEL_BUDGET: usize = 12;
pub const ELLIPSIS: &str = "...";
pub const DEFAULT_STYLE: &str = "shonen";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub secondary: &'static str,
    pub accent: &'static str,
}

const fn palette(primary: &'static str, secondary: &'static str, accent: &'static str) -> Palette {
    Palette {
        primary,
        secondary,
        accent,
    }
}

/// Keyed by exact character name.
const CHARACTER_PALETTES: &[(&str, Palette)] = &[
    // Pokemon
    ("Pikachu", palette("#ffeb3b", "#ff5722", "#2196f3")),
    ("Ash Ketchum", palette("#2196f3", "#ff5722", "#4caf50")),
    ("Charizard", palette("#ff5722", "#ff9800", "#795548")),
    ("Bulbasaur", palette("#4caf50", "#8bc34a", "#ff5722")),
    // Naruto
    ("Naruto", palette("#ff9800", "#2196f3", "#ffeb3b")),
    ("Sasuke", palette("#3f51b5", "#9c27b0", "#607d8b")),
    ("Sakura", palette("#e91e63", "#4caf50", "#ffeb3b")),
    ("Kakashi", palette("#607d8b", "#9e9e9e", "#2196f3")),
    // Dragon Ball
    ("Goku", palette("#ff9800", "#2196f3", "#ffeb3b")),
    ("Vegeta", palette("#3f51b5", "#ffeb3b", "#9c27b0")),
    ("Gohan", palette("#ff9800", "#4caf50", "#2196f3")),
    // One Piece
    ("Luffy", palette("#f44336", "#ffeb3b", "#2196f3")),
    ("Zoro", palette("#4caf50", "#795548", "#607d8b")),
    ("Nami", palette("#ff9800", "#2196f3", "#ffeb3b")),
    ("Sanji", palette("#ffeb3b", "#795548", "#2196f3")),
    // My Hero Academia
    ("Deku", palette("#4caf50", "#f44336", "#ffeb3b")),
    ("Bakugo", palette("#ff9800", "#f44336", "#795548")),
    ("Katsuki Bakugo", palette("#ff9800", "#f44336", "#795548")),
    ("Todoroki", palette("#2196f3", "#f44336", "#9e9e9e")),
    // Attack on Titan
    ("Eren", palette("#795548", "#4caf50", "#f44336")),
    ("Mikasa", palette("#f44336", "#9e9e9e", "#795548")),
    ("Armin", palette("#ffeb3b", "#2196f3", "#9e9e9e")),
    // Demon Slayer
    ("Tanjiro", palette("#4caf50", "#f44336", "#795548")),
    ("Nezuko", palette("#e91e63", "#ff9800", "#4caf50")),
    ("Zenitsu", palette("#ffeb3b", "#ff9800", "#2196f3")),
    ("Inosuke", palette("#795548", "#4caf50", "#ff9800")),
];

/// Keyed by style tag. The first entry is the default.
const STYLE_PALETTES: &[(&str, Palette)] = &[
    (DEFAULT_STYLE, palette("#ff5722", "#2196f3", "#ffeb3b")),
    ("shoujo", palette("#e91e63", "#9c27b0", "#ffeb3b")),
    ("seinen", palette("#607d8b", "#795548", "#ff9800")),
    ("josei", palette("#9c27b0", "#e91e63", "#4caf50")),
    ("mecha", palette("#607d8b", "#2196f3", "#ff9800")),
    ("slice-of-life", palette("#4caf50", "#ffeb3b", "#2196f3")),
    ("fantasy", palette("#9c27b0", "#4caf50", "#ff9800")),
    ("sci-fi", palette("#2196f3", "#607d8b", "#ffeb3b")),
];

fn lookup(table: &[(&str, Palette)], key: &str) -> Option<Palette> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, palette)| *palette)
}

/// Character name first, then style tag, then the default style.
pub fn resolve_palette(subject: &str, style: &str) -> Palette {
    lookup(CHARACTER_PALETTES, subject)
        .or_else(|| lookup(STYLE_PALETTES, style))
        .unwrap_or(STYLE_PALETTES[0].1)
}

/// The subject name as printed on the avatar, truncated by characters.
pub fn avatar_label(subject: &str) -> String {
    if subject.chars().count() > LABEL_BUDGET {
        let mut label: String = subject.chars().take(LABEL_BUDGET).collect();
        label.push_str(ELLIPSIS);
        label
    } else {
        subject.to_string()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// 120x120 SVG: gradient disc, accent face, name label.
pub fn render_avatar_svg(subject: &str, style: &str) -> String {
    let colors = resolve_palette(subject, style);
    let label = escape_xml(&avatar_label(subject));

    format!(
        r##"<svg width="120" height="120" viewBox="0 0 120 120" xmlns="http://www.w3.org/2000/svg">
  <defs>
    <linearGradient id="bg" x1="0%" y1="0%" x2="100%" y2="100%">
      <stop offset="0%" style="stop-color:{primary};stop-opacity:0.8" />
      <stop offset="100%" style="stop-color:{secondary};stop-opacity:0.6" />
    </linearGradient>
  </defs>
  <circle cx="60" cy="60" r="60" fill="url(#bg)" />
  <circle cx="60" cy="45" r="20" fill="{accent}" opacity="0.9" />
  <circle cx="50" cy="40" r="3" fill="#000" />
  <circle cx="70" cy="40" r="3" fill="#000" />
  <path d="M 50 50 Q 60 55 70 50" stroke="#000" stroke-width="2" fill="none" />
  <text x="60" y="85" text-anchor="middle" font-family="Arial, sans-serif" font-size="10" font-weight="bold" fill="#000" opacity="0.8">{label}</text>
</svg>"##,
        primary = colors.primary,
        secondary = colors.secondary,
        accent = colors.accent,
        label = label,
    )
}

/// The avatar as a self-contained `data:` URL.
pub fn avatar_data_url(subject: &str, style: &str) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        STANDARD.encode(render_avatar_svg(subject, style))
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        placeholder
    } else {
        value
    }
}

/// Score in 5..=9 derived from how much the user told us. Deterministic.
fn stat(items: usize, offset: usize) -> usize {
    5 + (items + offset) % 5
}

/// A starter portfolio built only from the profile, laid out with the same
/// headings the model is asked to produce so the section parser handles it.
pub fn fallback_portfolio(profile: &UserProfile) -> String {
    let name = or_placeholder(&profile.name, "Our Hero");
    let school = or_placeholder(&profile.school, "a mysterious academy");
    let style = or_placeholder(&profile.anime_style, DEFAULT_STYLE);
    let role = profile
        .character_type()
        .map(|c| format!(" as a {c}"))
        .unwrap_or_default();

    let mut out = String::new();

    out.push_str("🌟 **ANIME CHARACTER PROFILE**\n");
    out.push_str(&format!(
        "{name} steps into a {style} world{role}, with eyes that shine whenever a new challenge appears.\n"
    ));
    // Kept on one prefixed line so a shouted bio never reads as a heading.
    let bio = profile.bio.split_whitespace().collect::<Vec<_>>().join(" ");
    if !bio.is_empty() {
        out.push_str(&format!("In their own words: {bio}\n"));
    }

    out.push_str("\n⚡ **SPECIAL ABILITIES & POWERS**\n");
    if profile.skills.is_empty() && profile.interests.is_empty() {
        out.push_str("- Hidden Potential: a power still waiting to awaken.\n");
    }
    for skill in &profile.skills {
        out.push_str(&format!("- {skill} Mastery: a technique honed through countless hours of training.\n"));
    }
    for interest in &profile.interests {
        out.push_str(&format!("- Spirit of {interest}: grows stronger every time {name} follows this passion.\n"));
    }

    out.push_str("\n📖 **CHARACTER BACKSTORY**\n");
    out.push_str(&format!(
        "Every legend starts somewhere. For {name}, it started at {school}, where an ordinary day turned into the first episode of an extraordinary story.\n"
    ));

    out.push_str("\n📊 **CHARACTER STATS**\n");
    let skills = profile.skills.len();
    let interests = profile.interests.len();
    out.push_str(&format!("- Strength: {}/10\n", stat(skills, 0)));
    out.push_str(&format!("- Intelligence: {}/10\n", stat(interests, 1)));
    out.push_str(&format!("- Creativity: {}/10\n", stat(skills + interests, 2)));
    out.push_str(&format!("- Charisma: {}/10\n", stat(profile.bio.len(), 3)));
    out.push_str(&format!("- Magic Power: {}/10\n", stat(interests, 4)));
    out.push_str("- Determination: 10/10\n");

    out.push_str("\n💬 **ICONIC QUOTES**\n");
    out.push_str(&format!("- \"I'm {name}, and this is only the beginning!\"\n"));
    out.push_str("- \"Believe it... the next episode is mine!\"\n");

    out.push_str("\n🏫 **SCHOOL LIFE ANIME STYLE**\n");
    out.push_str(&format!(
        "At {school}, {name} is the student everyone secretly expects to save the school festival.\n"
    ));

    out.push_str("\n🎯 **ULTIMATE GOAL & DREAM**\n");
    out.push_str("To become the main character of their own story, one adventure at a time.\n");

    out
}
