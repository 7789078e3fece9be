use std::fmt;

use serde::{Deserialize, Serialize};

pub const CUSTOM_STYLE_MAX_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetStyle {
    Modern,
    Scandinavian,
    Industrial,
}

impl PresetStyle {
    pub const ALL: [PresetStyle; 3] = [
        PresetStyle::Modern,
        PresetStyle::Scandinavian,
        PresetStyle::Industrial,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PresetStyle::Modern => "Modern",
            PresetStyle::Scandinavian => "Scandinavian",
            PresetStyle::Industrial => "Industrial",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            PresetStyle::Modern => &["modern", "moderno"],
            PresetStyle::Scandinavian => &["scandinavian", "escandinavo", "nordic"],
            PresetStyle::Industrial => &["industrial"],
        }
    }

    pub fn from_label(text: &str) -> Option<Self> {
        let normalized = text.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.aliases().iter().any(|alias| *alias == normalized))
    }

    pub fn guideline(self) -> &'static str {
        match self {
            PresetStyle::Modern => MODERN_GUIDELINE,
            PresetStyle::Scandinavian => SCANDINAVIAN_GUIDELINE,
            PresetStyle::Industrial => INDUSTRIAL_GUIDELINE,
        }
    }
}

const MODERN_GUIDELINE: &str = "\
**STYLE GUIDELINES (Modern):**
- **Clean lines and simple forms:** favour straight lines and abstract geometric shapes; avoid ornament that serves no purpose.
- **Function first:** every piece must have a clear role in the room.
- **Contemporary materials:** steel, polished concrete and glass, with generous glazing and open floor areas.
- **Open space:** keep circulation free and the layout flexible and connected.
- **Indoor/outdoor continuity:** keep sight lines toward windows and light unobstructed.";

const SCANDINAVIAN_GUIDELINE: &str = "\
**STYLE GUIDELINES (Scandinavian):**
- **Natural light:** make the most of daylight; prefer sheer or no curtains and light reflective surfaces.
- **Function and simplicity:** straight, uncluttered lines; every item earns its place and storage stays hidden.
- **Connection with nature:** natural materials and plants that echo the outdoors.
- **Comfort and warmth (hygge):** layered textiles in wool, cotton and linen keep the minimalism cosy.
- **Materials:**
    - **Wood:** light species such as birch, beech or ash on floors, furniture and accents.
    - **Neutral colours:** mostly white, grey and beige with subtle pastel touches to amplify the light.
    - **Other natural materials:** stone, leather, wool and linen for texture.";

const INDUSTRIAL_GUIDELINE: &str = "\
**STYLE GUIDELINES (Industrial):**
- **Exposed structure:** visible brick, metal beams, concrete columns and ductwork.
- **Raw materials:** steel, iron, concrete and untreated wood dominate.
- **Wide open spaces:** high ceilings, few partitions and large factory-style windows.
- **Neutral colours:** a palette of white, black, grey and brown.
- **Furniture with history:** vintage pieces with craftsman finishes in solid wood or leather.
- **Aged finishes:** worn textures, oxidised metal and patinated leather.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StyleError {
    #[error("style name is empty")]
    Empty,
    #[error("style name is longer than {max} characters")]
    TooLong { max: usize },
    #[error("style name contains a forbidden character ({0:?})")]
    ForbiddenCharacter(char),
}

/// A user-supplied style name that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomStyle(String);

impl CustomStyle {
    pub fn new(raw: &str) -> Result<Self, StyleError> {
        let collapsed = raw.split_whitespace().collect::<Vec<&str>>().join(" ");
        if collapsed.is_empty() {
            return Err(StyleError::Empty);
        }
        if collapsed.chars().count() > CUSTOM_STYLE_MAX_CHARS {
            return Err(StyleError::TooLong {
                max: CUSTOM_STYLE_MAX_CHARS,
            });
        }
        if let Some(bad) = collapsed
            .chars()
            .find(|ch| ch.is_control() || *ch == '"')
        {
            return Err(StyleError::ForbiddenCharacter(bad));
        }
        Ok(Self(collapsed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomStyle {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CustomStyle> for String {
    fn from(value: CustomStyle) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Style {
    Preset(PresetStyle),
    Custom(CustomStyle),
}

impl Style {
    pub fn parse(text: &str) -> Result<Self, StyleError> {
        if let Some(preset) = PresetStyle::from_label(text) {
            return Ok(Style::Preset(preset));
        }
        CustomStyle::new(text).map(Style::Custom)
    }

    pub fn label(&self) -> &str {
        match self {
            Style::Preset(preset) => preset.label(),
            Style::Custom(custom) => custom.as_str(),
        }
    }

    /// Guideline block injected into the redesign prompt.
    pub fn guideline(&self) -> String {
        match self {
            Style::Preset(preset) => preset.guideline().to_string(),
            Style::Custom(custom) => format!(
                "**STYLE GUIDELINES ({name}):**\n\
                 Create a decoration that captures the essence of a '{name}' style. \
                 Be creative while staying faithful to the requested style.",
                name = custom.as_str()
            ),
        }
    }

    pub fn file_slug(&self) -> String {
        file_slug(self.label())
    }
}

/// Filesystem-safe form of a style label: runs of anything but letters and
/// digits become one `_`.
pub fn file_slug(label: &str) -> String {
    let mut slug = String::new();
    for ch in label.chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let trimmed = slug.trim_matches('_');
    if trimmed.is_empty() {
        "style".to_string()
    } else {
        trimmed.to_string()
    }
}

impl From<PresetStyle> for Style {
    fn from(value: PresetStyle) -> Self {
        Style::Preset(value)
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomStyle, PresetStyle, Style, StyleError, CUSTOM_STYLE_MAX_CHARS};

    #[test]
    fn presets_parse_case_insensitively_and_by_alias() {
        assert_eq!(
            Style::parse("  scandinavian ").unwrap(),
            Style::Preset(PresetStyle::Scandinavian)
        );
        assert_eq!(
            Style::parse("Moderno").unwrap(),
            Style::Preset(PresetStyle::Modern)
        );
        assert_eq!(
            Style::parse("INDUSTRIAL").unwrap(),
            Style::Preset(PresetStyle::Industrial)
        );
    }

    #[test]
    fn unknown_names_become_custom_styles_with_generic_guideline() {
        let style = Style::parse("Art   Deco").unwrap();
        assert_eq!(style.label(), "Art Deco");
        let guideline = style.guideline();
        assert!(guideline.contains("STYLE GUIDELINES (Art Deco)"));
        assert!(guideline.contains("'Art Deco'"));
    }

    #[test]
    fn preset_guidelines_are_distinct() {
        let texts: Vec<&str> = PresetStyle::ALL.iter().map(|p| p.guideline()).collect();
        assert!(texts[0].contains("(Modern)"));
        assert!(texts[1].contains("(Scandinavian)"));
        assert!(texts[2].contains("(Industrial)"));
    }

    #[test]
    fn custom_style_validation_policy() {
        assert_eq!(CustomStyle::new("   "), Err(StyleError::Empty));
        let long = "x".repeat(CUSTOM_STYLE_MAX_CHARS + 1);
        assert_eq!(
            CustomStyle::new(&long),
            Err(StyleError::TooLong {
                max: CUSTOM_STYLE_MAX_CHARS
            })
        );
        assert_eq!(
            CustomStyle::new("Boho \"chic\""),
            Err(StyleError::ForbiddenCharacter('"'))
        );
        assert_eq!(
            CustomStyle::new("Boho\u{7}"),
            Err(StyleError::ForbiddenCharacter('\u{7}'))
        );
        assert!(CustomStyle::new(&"x".repeat(CUSTOM_STYLE_MAX_CHARS)).is_ok());
    }

    #[test]
    fn file_slug_is_filesystem_safe() {
        assert_eq!(Style::parse("Mid-Century / Modern!").unwrap().file_slug(), "Mid_Century_Modern");
        assert_eq!(Style::from(PresetStyle::Industrial).file_slug(), "Industrial");
        assert_eq!(Style::parse("???").unwrap().file_slug(), "style");
    }
}
