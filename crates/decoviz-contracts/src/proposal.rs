use serde::{Deserialize, Serialize};

/// One generated design variant. Built in a single orchestration call and only
/// ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub style: String,
    /// Base64 image bytes of the redesigned room photo.
    pub redesigned_image: String,
    /// Base64 image bytes of the standalone style board.
    pub mood_board: String,
    pub description: String,
    pub objects_used: String,
    pub furniture_recommendation: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
}

/// The three text fields returned by the descriptive content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptiveContent {
    pub description: String,
    pub objects_used: String,
    pub furniture_recommendation: String,
}

impl Proposal {
    pub fn assemble(
        style: impl Into<String>,
        redesigned_image: String,
        mood_board: String,
        content: DescriptiveContent,
        color_palette: Vec<String>,
    ) -> Self {
        Self {
            style: style.into(),
            redesigned_image,
            mood_board,
            description: content.description,
            objects_used: content.objects_used,
            furniture_recommendation: content.furniture_recommendation,
            color_palette,
        }
    }

    /// Returns a copy with a new image and recomputed text/palette; the style
    /// label and mood board are carried over.
    pub fn with_refinement(
        &self,
        redesigned_image: String,
        content: DescriptiveContent,
        color_palette: Vec<String>,
    ) -> Self {
        Self::assemble(
            self.style.clone(),
            redesigned_image,
            self.mood_board.clone(),
            content,
            color_palette,
        )
    }

    pub fn is_complete(&self) -> bool {
        [
            &self.style,
            &self.redesigned_image,
            &self.mood_board,
            &self.description,
            &self.objects_used,
            &self.furniture_recommendation,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    pub fn objects_list(&self) -> Vec<String> {
        split_list(&self.objects_used)
    }

    pub fn recommendation_list(&self) -> Vec<String> {
        split_list(&self.furniture_recommendation)
    }
}

pub fn split_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DescriptiveContent, Proposal};

    fn content(tag: &str) -> DescriptiveContent {
        DescriptiveContent {
            description: format!("{tag} description"),
            objects_used: "Grey sofa\n\n  Oak table \n".to_string(),
            furniture_recommendation: "Arc lamp\nJute rug".to_string(),
        }
    }

    #[test]
    fn proposal_serializes_with_camel_case_keys() {
        let proposal = Proposal::assemble(
            "Modern",
            "aW1n".to_string(),
            "bW9vZA==".to_string(),
            content("a"),
            vec!["#FFFFFF".to_string()],
        );
        let value = serde_json::to_value(&proposal).unwrap();
        assert_eq!(value["redesignedImage"], json!("aW1n"));
        assert_eq!(value["moodBoard"], json!("bW9vZA=="));
        assert_eq!(value["objectsUsed"], json!("Grey sofa\n\n  Oak table \n"));
        assert_eq!(value["colorPalette"], json!(["#FFFFFF"]));
        assert!(proposal.is_complete());
    }

    #[test]
    fn list_fields_drop_blank_lines() {
        let proposal = Proposal::assemble("Modern", "i".into(), "m".into(), content("a"), vec![]);
        assert_eq!(proposal.objects_list(), vec!["Grey sofa", "Oak table"]);
        assert_eq!(proposal.recommendation_list(), vec!["Arc lamp", "Jute rug"]);
    }

    #[test]
    fn refinement_keeps_style_and_mood_board() {
        let base = Proposal::assemble("Industrial", "old".into(), "board".into(), content("a"), vec![]);
        let refined = base.with_refinement("new".into(), content("b"), vec!["#000".to_string()]);
        assert_eq!(refined.style, "Industrial");
        assert_eq!(refined.mood_board, "board");
        assert_eq!(refined.redesigned_image, "new");
        assert_eq!(refined.description, "b description");
        assert_eq!(refined.color_palette, vec!["#000"]);
    }

    #[test]
    fn empty_palette_does_not_make_proposal_incomplete() {
        let mut proposal = Proposal::assemble("Modern", "i".into(), "m".into(), content("a"), vec![]);
        assert!(proposal.is_complete());
        proposal.mood_board.clear();
        assert!(!proposal.is_complete());
    }
}
