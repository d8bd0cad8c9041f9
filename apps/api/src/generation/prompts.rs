// All LLM prompt templates for the Generation module.

use crate::models::profile::UserProfile;

/// Avatar description prompt. Replace `{prompt}` before sending.
pub const AVATAR_PROMPT_TEMPLATE: &str = "Create a detailed visual description for an anime avatar based on: {prompt}. \
Include specific details about hair color, eye color, clothing style, facial features, and pose. \
Make it vivid and detailed for image generation. Keep it under 200 characters for URL compatibility.";

/// Portfolio prompt template.
/// Replace: {name}, {age}, {school}, {bio}, {interests}, {skills}, {style},
///          {character_info}, {character_as}
pub const PORTFOLIO_PROMPT_TEMPLATE: &str = r#"You are an expert anime character creator and portfolio writer. Create a funny, engaging, and creative anime-style portfolio for a high school student that transforms them into an amazing anime character.

Student Information:
- Name: {name}
- Age: {age}
- School: {school}
- Bio: {bio}
- Interests: {interests}
- Skills: {skills}
- Chosen Anime Style: {style}{character_info}

Create a portfolio that completely transforms this student into an anime character with these sections:

🌟 **ANIME CHARACTER PROFILE**
Transform their appearance into a detailed anime character description matching the {style} style{character_as}. Include:
- Hair color, style, and special features
- Eye color and unique characteristics
- Outfit/uniform design
- Any special markings, accessories, or distinctive features
- Overall aesthetic that matches their personality

⚡ **SPECIAL ABILITIES & POWERS**
Based on their interests and skills, create 4-6 unique anime-style abilities:
- Give each power a cool Japanese-inspired name
- Explain how each power relates to their real skills/interests
- Include power levels and special techniques
- Add funny limitations or quirks to each ability

📖 **CHARACTER BACKSTORY**
Write an engaging origin story that:
- Incorporates their real school and interests into an anime world
- Explains how they discovered their powers
- Includes a memorable mentor or rival character
- Sets up their main goal or quest

📊 **CHARACTER STATS** (Rate 1-10)
- Strength: [based on physical activities/sports]
- Intelligence: [based on academic interests]
- Creativity: [based on artistic/creative skills]
- Charisma: [based on social activities]
- Magic Power: [based on unique interests]
- Determination: [based on their personality]

🎭 **SIGNATURE MOVES & TECHNIQUES**
Create 3-4 special attacks or techniques with:
- Epic names in Japanese style
- Detailed descriptions of what they do
- Funny sound effects (like "WHOOOOSH!" or "SPARKLE BEAM!")

💬 **ICONIC QUOTES**
Generate 4-5 memorable quotes this character would say:
- Include their catchphrase
- Battle cry
- Motivational quote
- Funny everyday quote
- Dramatic moment quote

🏫 **SCHOOL LIFE ANIME STYLE**
Describe their anime school experience:
- What special club or organization they'd join
- Their unique school uniform modifications
- Relationship with classmates and teachers
- School festival or competition they'd participate in

🎯 **ULTIMATE GOAL & DREAM**
What is their main quest or dream in the anime world? Make it epic and tied to their real interests!

Make this incredibly fun, creative, and full of anime tropes while staying true to their personality. Use lots of emojis, exciting language, and make them feel like the main character of their own anime series!

Format it as an exciting character profile that reads like it's from an official anime guidebook."#;

pub fn build_avatar_prompt(prompt: &str) -> String {
    fill_template(AVATAR_PROMPT_TEMPLATE, &[("prompt", prompt.trim())])
}

pub fn build_portfolio_prompt(profile: &UserProfile) -> String {
    let (character_info, character_as) = match profile.character_type() {
        Some(c) => (
            format!("\n- Chosen Character Type: {c}"),
            format!(" as a {c}"),
        ),
        None => (String::new(), String::new()),
    };
    let interests = profile.interests.join(", ");
    let skills = profile.skills.join(", ");

    fill_template(
        PORTFOLIO_PROMPT_TEMPLATE,
        &[
            ("name", profile.name.as_str()),
            ("age", profile.age.as_str()),
            ("school", profile.school.as_str()),
            ("bio", profile.bio.as_str()),
            ("interests", interests.as_str()),
            ("skills", skills.as_str()),
            ("style", profile.anime_style.as_str()),
            ("character_info", character_info.as_str()),
            ("character_as", character_as.as_str()),
        ],
    )
}

/// Substitutes `{key}` placeholders in a single left-to-right pass, so braces
/// inside substituted values are copied as-is. Unknown keys stay literal.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
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
                .map(|(_, v)| (close, *v))
        });
        match value {
            Some((close, v)) => {
                out.push_str(v);
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
