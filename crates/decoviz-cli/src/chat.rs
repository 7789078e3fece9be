use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use decoviz_contracts::chat::{parse_intent, Intent, CHAT_HELP_COMMANDS};
use decoviz_contracts::events::{EventDetails, SessionLog};
use decoviz_contracts::session::{Event, Screen, Session, TransitionError};
use decoviz_engine::export::{export_batch, export_proposal, ExportedProposal};
use decoviz_engine::{codec, RedesignEngine, RedesignError};
use serde_json::json;
use tracing::warn;

use crate::json_object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Owns the one `Session` value and applies every orchestration result to it.
pub struct ChatSession {
    engine: RedesignEngine,
    session: Session,
    log: SessionLog,
    out: PathBuf,
}

impl ChatSession {
    pub fn new(engine: RedesignEngine, log: SessionLog, out: PathBuf) -> Self {
        Self {
            engine,
            session: Session::new(),
            log,
            out,
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn run_stdin(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut line = String::new();

        println!("DecoViz session started. Type /help for commands.");
        loop {
            print!("[{}] > ", self.session.screen());
            io::stdout().flush()?;

            line.clear();
            let read = match input.read_line(&mut line) {
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            if read == 0 {
                break;
            }
            if self.handle_line(line.trim_end_matches(['\n', '\r']))? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let intent = parse_intent(line);
        match intent.action.as_str() {
            "noop" => {}
            "help" => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            "quit" => return Ok(Flow::Quit),
            "upload" => self.upload(&intent)?,
            "select" => self.select(&intent)?,
            "refine" => self.refine(intent.arg_str("instructions").unwrap_or_default())?,
            "new_style" => self.new_style(intent.arg_str("style").unwrap_or_default())?,
            "export" => self.export(intent.arg_str("path").map(PathBuf::from))?,
            "undo" => {
                if self.transition(Event::Undo, EventDetails::new())? {
                    self.print_selected();
                }
            }
            "back" => {
                if self.transition(Event::BackToResults, EventDetails::new())? {
                    self.print_results();
                }
            }
            "reset" => {
                self.transition(Event::Reset, EventDetails::new())?;
            }
            "dismiss" => {
                self.transition(Event::DismissNotice, EventDetails::new())?;
            }
            "show" => self.show(),
            _ => {
                let command = intent.arg_str("command").unwrap_or_default();
                println!("Unknown command: /{command}. Type /help for commands.");
            }
        }
        Ok(Flow::Continue)
    }

    /// Applies `event` and logs the screen change. A refused event is printed
    /// and leaves the session untouched.
    fn transition(&mut self, event: Event, details: EventDetails) -> Result<bool> {
        let name = event.name();
        let from = self.session.screen();
        match self.session.apply(event) {
            Ok(()) => {
                self.log
                    .transition(name, from, self.session.screen(), details)?;
                if let Some(notice) = self.session.notice() {
                    println!("Notice: {notice}");
                }
                Ok(true)
            }
            Err(err) => {
                println!("{err}");
                Ok(false)
            }
        }
    }

    fn require_screen(&self, event: &'static str, expected: &[Screen]) -> bool {
        let screen = self.session.screen();
        if expected.contains(&screen) {
            return true;
        }
        println!("{}", TransitionError::NotAllowed { event, screen });
        false
    }

    fn operation_failed(&mut self, err: &RedesignError, style: Option<&str>) -> Result<()> {
        warn!(error = %err, "operation failed");
        let message = err.user_message();
        let details = json_object(json!({
            "operation": err.operation().map(|op| op.as_str()),
            "style": style,
            "message": message,
            "requires_new_upload": err.requires_new_upload(),
        }));
        if self.transition(Event::OperationFailed { message }, details)? {
            suggest_new_upload(err);
        }
        Ok(())
    }

    fn upload(&mut self, intent: &Intent) -> Result<()> {
        if !self.require_screen("analysis_started", &[Screen::Upload]) {
            return Ok(());
        }
        let Some(path) = intent.arg_str("path") else {
            println!("/upload requires a path");
            return Ok(());
        };
        let instructions = intent.arg_str("instructions").unwrap_or_default();
        let upload = match codec::load_upload(Path::new(path), instructions) {
            Ok(upload) => upload,
            Err(err) => return self.operation_failed(&err, None),
        };
        let image = upload.image.clone();
        let payload = json_object(json!({
            "file_name": upload.file_name,
            "instructions": upload.instructions,
        }));
        let instructions = upload.instructions.clone();
        if !self.transition(Event::AnalysisStarted(upload), payload)? {
            return Ok(());
        }

        println!("Analyzing the room and generating three proposals...");
        match self.engine.generate_initial_proposals(&image, &instructions) {
            Ok(batch) => {
                let payload = json_object(json!({
                    "room_type": batch.room_type,
                    "styles": batch
                        .proposals
                        .iter()
                        .map(|proposal| proposal.style.as_str())
                        .collect::<Vec<&str>>(),
                }));
                let completed = Event::AnalysisCompleted {
                    proposals: batch.proposals,
                    room_type: batch.room_type,
                };
                if self.transition(completed, payload)? {
                    self.print_results();
                }
            }
            Err(err) => {
                warn!(error = %err, "initial batch failed");
                let message = err.user_message();
                let details = json_object(json!({
                    "operation": err.operation().map(|op| op.as_str()),
                    "message": message,
                    "requires_new_upload": err.requires_new_upload(),
                }));
                if self.transition(Event::AnalysisFailed { message }, details)? {
                    suggest_new_upload(&err);
                }
            }
        }
        Ok(())
    }

    fn select(&mut self, intent: &Intent) -> Result<()> {
        let Some(index) = intent
            .command_args
            .get("index")
            .and_then(|value| value.as_u64())
        else {
            println!("/select requires a proposal number starting at 1");
            return Ok(());
        };
        let index = index as usize;
        let style = self
            .session
            .proposals()
            .get(index)
            .map(|proposal| proposal.style.clone());
        let payload = json_object(json!({ "index": index + 1, "style": style }));
        if self.transition(Event::ProposalSelected { index }, payload)? {
            self.print_selected();
        }
        Ok(())
    }

    fn refine(&mut self, instructions: &str) -> Result<()> {
        if !self.require_screen("proposal_refined", &[Screen::Refinement]) {
            return Ok(());
        }
        let (Some(current), Some(room_type)) =
            (self.session.selected_proposal(), self.session.room_type())
        else {
            return Ok(());
        };
        let style = current.style.clone();
        println!("Refining the {style} proposal...");
        let result = self.engine.refine_proposal(current, room_type, instructions);
        match result {
            Ok(refined) => {
                let payload = json_object(json!({
                    "style": style,
                    "instructions": instructions.trim(),
                    "undo_depth": self.session.undo_depth() + 1,
                }));
                if self.transition(Event::ProposalRefined(refined), payload)? {
                    self.print_selected();
                }
            }
            Err(err) => self.operation_failed(&err, Some(&style))?,
        }
        Ok(())
    }

    fn new_style(&mut self, style_name: &str) -> Result<()> {
        if !self.require_screen("style_regenerated", &[Screen::Refinement]) {
            return Ok(());
        }
        let (Some(original), Some(room_type), Some(current)) = (
            self.session.original(),
            self.session.room_type(),
            self.session.selected_proposal(),
        ) else {
            return Ok(());
        };
        let replaced = current.style.clone();
        println!("Generating a {} proposal...", style_name.trim());
        let result = self
            .engine
            .generate_new_style(&original.image, style_name, room_type);
        match result {
            Ok(proposal) => {
                let payload = json_object(json!({
                    "style": proposal.style,
                    "replaced": replaced,
                    "undo_depth": self.session.undo_depth() + 1,
                }));
                if self.transition(Event::StyleRegenerated(proposal), payload)? {
                    self.print_selected();
                }
            }
            Err(err) => {
                let style = style_name.trim();
                self.operation_failed(&err, (!style.is_empty()).then_some(style))?
            }
        }
        Ok(())
    }

    fn export(&mut self, dir: Option<PathBuf>) -> Result<()> {
        if !self.require_screen("export", &[Screen::Results, Screen::Refinement]) {
            return Ok(());
        }
        let dir = dir.unwrap_or_else(|| self.out.clone());
        let result = match (self.session.screen(), self.session.selected_proposal()) {
            (Screen::Refinement, Some(proposal)) => {
                export_proposal(&dir, proposal, true).map(|entry| vec![entry])
            }
            _ => export_batch(
                &dir,
                self.session.room_type().unwrap_or_default(),
                self.session.proposals(),
            ),
        };
        match result {
            Ok(exported) => {
                let files = exported_files(&exported);
                self.log.note(
                    "exported",
                    self.session.screen(),
                    json_object(json!({
                        "dir": dir.display().to_string(),
                        "files": files,
                    })),
                )?;
                println!("Exported {} file(s) to {}", files.len(), dir.display());
            }
            Err(err) => self.operation_failed(&err, None)?,
        }
        Ok(())
    }

    fn show(&self) {
        println!("Screen: {}", self.session.screen());
        if let Some(notice) = self.session.notice() {
            println!("Notice: {notice}");
        }
        match self.session.screen() {
            Screen::Upload => println!("Upload a room photo with /upload <path> [instructions]"),
            Screen::Loading => println!("Generating proposals..."),
            Screen::Results => self.print_results(),
            Screen::Refinement => self.print_selected(),
        }
    }

    fn print_results(&self) {
        if let Some(room_type) = self.session.room_type() {
            println!("Room type: {room_type}");
        }
        for (index, proposal) in self.session.proposals().iter().enumerate() {
            println!(
                "  {}. {} [{}]",
                index + 1,
                proposal.style,
                proposal.color_palette.join(" ")
            );
        }
        println!("Pick one with /select <n>");
    }

    fn print_selected(&self) {
        let Some(proposal) = self.session.selected_proposal() else {
            return;
        };
        println!("Style: {}", proposal.style);
        println!("{}", proposal.description);
        println!("Palette: {}", proposal.color_palette.join(" "));
        println!("Objects used:");
        for item in proposal.objects_list() {
            println!("  - {item}");
        }
        println!("Recommended furniture:");
        for item in proposal.recommendation_list() {
            println!("  - {item}");
        }
        if self.session.can_undo() {
            println!("Undo available ({} step(s))", self.session.undo_depth());
        }
    }
}

fn suggest_new_upload(err: &RedesignError) {
    if err.requires_new_upload() {
        println!("Try a different photo with /upload <path> [instructions]");
    }
}

fn exported_files(exported: &[ExportedProposal]) -> Vec<String> {
    exported
        .iter()
        .flat_map(|entry| entry.paths())
        .map(|path| path.display().to_string())
        .collect()
}
