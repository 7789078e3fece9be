use std::panic;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use decoviz_contracts::image::ImagePayload;
use decoviz_contracts::proposal::Proposal;
use decoviz_contracts::styles::{PresetStyle, Style};
use tracing::{info, info_span, warn};

use crate::analyzer::analyze_room;
use crate::codec;
use crate::config::EngineConfig;
use crate::describe::generate_description;
use crate::error::{Operation, RedesignError, Result};
use crate::gateway::{gateway_for, ModelGateway};
use crate::moodboard::generate_mood_board;
use crate::palette::extract_palette;
use crate::redesign::{generate_redesign, refine_image};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialBatch {
    pub proposals: Vec<Proposal>,
    pub room_type: String,
}

pub struct RedesignEngine {
    gateway: Box<dyn ModelGateway>,
    config: EngineConfig,
}

fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    match handle.join() {
        Ok(value) => value,
        Err(payload) => panic::resume_unwind(payload),
    }
}

fn settle<T>(failed: &Sender<RedesignError>, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            let _ = failed.send(err);
            None
        }
    }
}

/// The failure that arrived first, or a generation failure if none did.
fn first_failure(
    failures: &Receiver<RedesignError>,
    operation: Operation,
    style: Option<&str>,
) -> RedesignError {
    failures
        .try_recv()
        .unwrap_or_else(|_| RedesignError::GenerationFailed {
            operation,
            style: style.map(str::to_string),
        })
}

/// Runs every task to completion and returns the earliest failure.
fn join_all<'env, T, F>(tasks: Vec<F>) -> Result<Vec<T>>
where
    T: Send + 'env,
    F: FnOnce() -> Result<T> + Send + 'env,
{
    let (failed, failures) = mpsc::channel();
    let settled: Vec<Option<T>> = thread::scope(|scope| {
        let handles: Vec<ScopedJoinHandle<'_, Option<T>>> = tasks
            .into_iter()
            .map(|task| {
                let failed = failed.clone();
                scope.spawn(move || settle(&failed, task()))
            })
            .collect();
        handles.into_iter().map(join).collect()
    });
    settled
        .into_iter()
        .collect::<Option<Vec<T>>>()
        .ok_or_else(|| first_failure(&failures, Operation::Redesign, None))
}

impl RedesignEngine {
    pub fn new(gateway: Box<dyn ModelGateway>, config: EngineConfig) -> Self {
        Self { gateway, config }
    }

    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let gateway = gateway_for(&config)?;
        Ok(Self::new(gateway, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gateway_name(&self) -> &str {
        self.gateway.name()
    }

    fn gateway(&self) -> &dyn ModelGateway {
        self.gateway.as_ref()
    }

    /// Analyzes the photo, then builds one proposal per preset style in
    /// parallel. Any failure aborts the whole batch.
    pub fn generate_initial_proposals(
        &self,
        original: &ImagePayload,
        instructions: &str,
    ) -> Result<InitialBatch> {
        let _span = info_span!("initial_batch", gateway = self.gateway_name()).entered();
        let started = Instant::now();
        let room_type = analyze_room(self.gateway(), &self.config, original)?;

        let styles: Vec<Style> = PresetStyle::ALL.into_iter().map(Style::from).collect();
        let room = room_type.as_str();
        let tasks: Vec<_> = styles
            .iter()
            .map(|style| move || self.build_proposal(original, style, room, instructions))
            .collect();
        let proposals = join_all(tasks).inspect_err(|err| {
            warn!(error = %err, "initial batch failed");
        })?;

        info!(
            room_type = %room_type,
            proposals = proposals.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "initial batch ready"
        );
        Ok(InitialBatch {
            proposals,
            room_type,
        })
    }

    /// Edits the current image with `instructions`, then recomputes palette and
    /// description for the new image. Style and mood board carry over.
    pub fn refine_proposal(
        &self,
        current: &Proposal,
        room_type: &str,
        instructions: &str,
    ) -> Result<Proposal> {
        let instructions = instructions.trim();
        if instructions.is_empty() {
            return Err(RedesignError::EmptyInstructions);
        }
        let _span = info_span!("refinement", style = %current.style).entered();
        let started = Instant::now();
        let base = codec::stored_payload(&current.redesigned_image);
        let refined = refine_image(self.gateway(), &self.config, &base, instructions)?;

        let style = current.style.as_str();
        let (failed, failures) = mpsc::channel();
        let (palette, content) = thread::scope(|scope| {
            let palette = scope.spawn(|| {
                settle(
                    &failed,
                    extract_palette(self.gateway(), &self.config, &refined, style),
                )
            });
            let content = scope.spawn(|| {
                settle(
                    &failed,
                    generate_description(
                        self.gateway(),
                        &self.config,
                        &refined,
                        style,
                        room_type,
                        instructions,
                    ),
                )
            });
            (join(palette), join(content))
        });
        let (Some(palette), Some(content)) = (palette, content) else {
            return Err(first_failure(&failures, Operation::Refinement, None));
        };
        let proposal = current.with_refinement(refined.data.clone(), content, palette);

        info!(
            style = %proposal.style,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proposal refined"
        );
        Ok(proposal)
    }

    /// Builds a proposal for an arbitrary style against the original photo,
    /// with no user instructions.
    pub fn generate_new_style(
        &self,
        original: &ImagePayload,
        style_name: &str,
        room_type: &str,
    ) -> Result<Proposal> {
        let style = Style::parse(style_name)?;
        let _span = info_span!("new_style", style = %style).entered();
        self.build_proposal(original, &style, room_type, "")
    }

    /// Redesign first, then mood board, description and palette concurrently.
    fn build_proposal(
        &self,
        original: &ImagePayload,
        style: &Style,
        room_type: &str,
        instructions: &str,
    ) -> Result<Proposal> {
        let started = Instant::now();
        let gateway = self.gateway();
        let config = &self.config;
        let redesigned =
            generate_redesign(gateway, config, original, style, room_type, instructions)?;

        let label = style.label();
        let (failed, failures) = mpsc::channel();
        let (mood_board, content, palette) = thread::scope(|scope| {
            let mood_board =
                scope.spawn(|| settle(&failed, generate_mood_board(gateway, config, label)));
            let content = scope.spawn(|| {
                settle(
                    &failed,
                    generate_description(
                        gateway,
                        config,
                        &redesigned,
                        label,
                        room_type,
                        instructions,
                    ),
                )
            });
            let palette = scope
                .spawn(|| settle(&failed, extract_palette(gateway, config, &redesigned, label)));
            (join(mood_board), join(content), join(palette))
        });
        let (Some(mood_board), Some(content), Some(palette)) = (mood_board, content, palette)
        else {
            return Err(first_failure(&failures, Operation::Redesign, Some(label)));
        };
        let proposal = Proposal::assemble(
            label,
            redesigned.data.clone(),
            mood_board.data,
            content,
            palette,
        );

        info!(
            style = label,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "proposal assembled"
        );
        Ok(proposal)
    }
}
