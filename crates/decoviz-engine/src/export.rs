use std::fs;
use std::path::{Path, PathBuf};

use decoviz_contracts::events::timestamp_utc;
use decoviz_contracts::proposal::Proposal;
use decoviz_contracts::styles::file_slug;
use serde_json::json;
use tracing::info;

use crate::codec;
use crate::error::Result;

pub const SUMMARY_FILE_NAME: &str = "summary.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedProposal {
    pub style: String,
    pub redesign: PathBuf,
    pub mood_board: PathBuf,
    pub details: PathBuf,
}

impl ExportedProposal {
    pub fn paths(&self) -> [&Path; 3] {
        [
            self.redesign.as_path(),
            self.mood_board.as_path(),
            self.details.as_path(),
        ]
    }
}

/// Writes both images as JPEG plus a JSON file with the text fields and
/// palette. `refined` marks downloads taken from the refinement view.
pub fn export_proposal(
    dir: &Path,
    proposal: &Proposal,
    refined: bool,
) -> Result<ExportedProposal> {
    fs::create_dir_all(dir)?;
    let slug = file_slug(&proposal.style);
    let suffix = if refined { "_refined" } else { "" };

    let redesign = dir.join(format!("DecoViz_Redesign_{slug}{suffix}.jpg"));
    fs::write(&redesign, codec::to_jpeg(&proposal.redesigned_image)?)?;

    let mood_board = dir.join(format!("DecoViz_MoodBoard_{slug}.jpg"));
    fs::write(&mood_board, codec::to_jpeg(&proposal.mood_board)?)?;

    let details = dir.join(format!("DecoViz_{slug}{suffix}.json"));
    let body = json!({
        "style": proposal.style,
        "description": proposal.description,
        "objectsUsed": proposal.objects_list(),
        "furnitureRecommendation": proposal.recommendation_list(),
        "colorPalette": proposal.color_palette,
        "refined": refined,
    });
    fs::write(&details, serde_json::to_vec_pretty(&body)?)?;

    info!(style = %proposal.style, dir = %dir.display(), refined, "proposal exported");
    Ok(ExportedProposal {
        style: proposal.style.clone(),
        redesign,
        mood_board,
        details,
    })
}

/// Exports every proposal and a `summary.json` describing the batch.
pub fn export_batch(
    dir: &Path,
    room_type: &str,
    proposals: &[Proposal],
) -> Result<Vec<ExportedProposal>> {
    let exported = proposals
        .iter()
        .map(|proposal| export_proposal(dir, proposal, false))
        .collect::<Result<Vec<ExportedProposal>>>()?;

    let files: Vec<String> = exported
        .iter()
        .flat_map(|entry| entry.paths())
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .collect();
    let summary = json!({
        "roomType": room_type,
        "styles": proposals.iter().map(|proposal| proposal.style.as_str()).collect::<Vec<&str>>(),
        "exportedAt": timestamp_utc(),
        "files": files,
    });
    fs::write(
        dir.join(SUMMARY_FILE_NAME),
        serde_json::to_vec_pretty(&summary)?,
    )?;
    Ok(exported)
}
