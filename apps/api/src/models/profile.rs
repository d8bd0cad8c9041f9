use serde::{Deserialize, Serialize};

/// The profile collected by the wizard. Field names follow the browser
/// client's camelCase JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub age: String,
    pub school: String,
    pub bio: String,
    pub interests: Vec<String>,
    pub skills: Vec<String>,
    pub anime_style: String,
    pub anime_character: Option<String>,
}

impl UserProfile {
    /// The chosen character type, if one was picked and is not blank.
    pub fn character_type(&self) -> Option<&str> {
        self.anime_character
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
