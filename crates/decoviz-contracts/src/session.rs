use std::fmt;
use std::mem;

use serde::Serialize;

use crate::image::ImagePayload;
use crate::proposal::Proposal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Upload,
    Loading,
    Results,
    Refinement,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Upload => "upload",
            Screen::Loading => "loading",
            Screen::Results => "results",
            Screen::Refinement => "refinement",
        };
        f.write_str(name)
    }
}

/// The photo the user started from, plus the free-text instruction typed with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUpload {
    pub file_name: String,
    pub image: ImagePayload,
    pub instructions: String,
}

/// Everything produced by a successful initial batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub original: OriginalUpload,
    pub room_type: String,
    pub proposals: Vec<Proposal>,
}

/// One variant per screen, each carrying only the data valid on that screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Upload,
    Loading {
        upload: OriginalUpload,
    },
    Results {
        workspace: Workspace,
    },
    Refinement {
        workspace: Workspace,
        selected: usize,
        history: Vec<Proposal>,
    },
}

impl View {
    pub fn screen(&self) -> Screen {
        match self {
            View::Upload => Screen::Upload,
            View::Loading { .. } => Screen::Loading,
            View::Results { .. } => Screen::Results,
            View::Refinement { .. } => Screen::Refinement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    AnalysisStarted(OriginalUpload),
    AnalysisCompleted {
        proposals: Vec<Proposal>,
        room_type: String,
    },
    AnalysisFailed {
        message: String,
    },
    ProposalSelected {
        index: usize,
    },
    ProposalRefined(Proposal),
    StyleRegenerated(Proposal),
    OperationFailed {
        message: String,
    },
    Undo,
    BackToResults,
    Reset,
    DismissNotice,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::AnalysisStarted(_) => "analysis_started",
            Event::AnalysisCompleted { .. } => "analysis_completed",
            Event::AnalysisFailed { .. } => "analysis_failed",
            Event::ProposalSelected { .. } => "proposal_selected",
            Event::ProposalRefined(_) => "proposal_refined",
            Event::StyleRegenerated(_) => "style_regenerated",
            Event::OperationFailed { .. } => "operation_failed",
            Event::Undo => "undo",
            Event::BackToResults => "back_to_results",
            Event::Reset => "reset",
            Event::DismissNotice => "dismiss_notice",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("'{event}' is not available on the {screen} screen")]
    NotAllowed { event: &'static str, screen: Screen },
    #[error("there is no proposal #{} (have {count})", .index + 1)]
    NoSuchProposal { index: usize, count: usize },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("analysis produced no proposals")]
    EmptyBatch,
}

/// A refused event, handing the untouched session back to the caller.
#[derive(Debug)]
pub struct Rejected {
    pub session: Session,
    pub error: TransitionError,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    view: View,
    notice: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn screen(&self) -> Screen {
        self.view.screen()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        match &self.view {
            View::Results { workspace } | View::Refinement { workspace, .. } => Some(workspace),
            View::Upload | View::Loading { .. } => None,
        }
    }

    pub fn original(&self) -> Option<&OriginalUpload> {
        match &self.view {
            View::Loading { upload } => Some(upload),
            _ => self.workspace().map(|workspace| &workspace.original),
        }
    }

    pub fn room_type(&self) -> Option<&str> {
        self.workspace().map(|workspace| workspace.room_type.as_str())
    }

    pub fn proposals(&self) -> &[Proposal] {
        self.workspace()
            .map(|workspace| workspace.proposals.as_slice())
            .unwrap_or(&[])
    }

    pub fn selected_index(&self) -> Option<usize> {
        match &self.view {
            View::Refinement { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    pub fn selected_proposal(&self) -> Option<&Proposal> {
        match &self.view {
            View::Refinement {
                workspace,
                selected,
                ..
            } => workspace.proposals.get(*selected),
            _ => None,
        }
    }

    pub fn undo_depth(&self) -> usize {
        match &self.view {
            View::Refinement { history, .. } => history.len(),
            _ => 0,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_depth() > 0
    }

    /// Pure transition: consumes the session and returns its successor, or the
    /// unchanged session together with the reason the event was refused.
    pub fn next(mut self, event: Event) -> Result<Session, Rejected> {
        match self.apply(event) {
            Ok(()) => Ok(self),
            Err(error) => Err(Rejected {
                session: self,
                error,
            }),
        }
    }

    /// In-place form of [`Session::next`]; on error the session is left as it was.
    pub fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let view = mem::take(&mut self.view);
        match transition(view, event) {
            Ok((view, notice)) => {
                self.view = view;
                match notice {
                    NoticeChange::Keep => {}
                    NoticeChange::Clear => self.notice = None,
                    NoticeChange::Set(message) => self.notice = Some(message),
                }
                Ok(())
            }
            Err((view, error)) => {
                self.view = view;
                Err(error)
            }
        }
    }
}

enum NoticeChange {
    Keep,
    Clear,
    Set(String),
}

type Transition = Result<(View, NoticeChange), (View, TransitionError)>;

fn transition(view: View, event: Event) -> Transition {
    match (view, event) {
        (_, Event::Reset) => Ok((View::Upload, NoticeChange::Clear)),
        (view, Event::DismissNotice) => Ok((view, NoticeChange::Clear)),

        (View::Upload, Event::AnalysisStarted(upload)) => {
            Ok((View::Loading { upload }, NoticeChange::Clear))
        }
        (
            View::Loading { upload },
            Event::AnalysisCompleted {
                proposals,
                room_type,
            },
        ) => {
            if proposals.is_empty() {
                return Err((View::Loading { upload }, TransitionError::EmptyBatch));
            }
            let workspace = Workspace {
                original: upload,
                room_type,
                proposals,
            };
            Ok((View::Results { workspace }, NoticeChange::Clear))
        }
        (View::Loading { .. }, Event::AnalysisFailed { message }) => {
            Ok((View::Upload, NoticeChange::Set(message)))
        }

        (View::Results { workspace }, Event::ProposalSelected { index }) => {
            let count = workspace.proposals.len();
            if index >= count {
                return Err((
                    View::Results { workspace },
                    TransitionError::NoSuchProposal { index, count },
                ));
            }
            Ok((
                View::Refinement {
                    workspace,
                    selected: index,
                    history: Vec::new(),
                },
                NoticeChange::Clear,
            ))
        }

        (
            View::Refinement {
                mut workspace,
                selected,
                mut history,
            },
            Event::ProposalRefined(proposal) | Event::StyleRegenerated(proposal),
        ) => {
            let previous = mem::replace(&mut workspace.proposals[selected], proposal);
            history.push(previous);
            Ok((
                View::Refinement {
                    workspace,
                    selected,
                    history,
                },
                NoticeChange::Clear,
            ))
        }
        (
            View::Refinement {
                mut workspace,
                selected,
                mut history,
            },
            Event::Undo,
        ) => {
            let Some(previous) = history.pop() else {
                return Err((
                    View::Refinement {
                        workspace,
                        selected,
                        history,
                    },
                    TransitionError::NothingToUndo,
                ));
            };
            workspace.proposals[selected] = previous;
            Ok((
                View::Refinement {
                    workspace,
                    selected,
                    history,
                },
                NoticeChange::Keep,
            ))
        }
        (View::Refinement { workspace, .. }, Event::BackToResults) => {
            Ok((View::Results { workspace }, NoticeChange::Clear))
        }

        (
            view @ (View::Upload | View::Results { .. } | View::Refinement { .. }),
            Event::OperationFailed { message },
        ) => Ok((view, NoticeChange::Set(message))),

        (view, event) => {
            let screen = view.screen();
            Err((
                view,
                TransitionError::NotAllowed {
                    event: event.name(),
                    screen,
                },
            ))
        }
    }
}
