//! Upload wizard as a pure state machine. [`transition`] never performs I/O;
//! it returns the next state plus the effects a driver must run, and the
//! driver feeds results back in as events.

use std::time::Duration;

use validator::Validate;

use crate::client::backend::BackendError;
use crate::client::query_cache::QueryKey;
use crate::dto::matching_dto::JobSearchRequest;
use crate::models::cv_data::CvData;
use crate::wizard::file::{validate_file, SelectedFile};

pub const REDIRECT_DELAY: Duration = Duration::from_secs(1);

const SUMMARIZE_SUCCESS: &str =
    "CV analyzed successfully by AI, please review the data before confirming.";
const SEARCH_SUCCESS: &str = "Job search completed successfully, redirecting to job reports page";
const SUMMARIZE_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
const SEARCH_UNEXPECTED: &str = "An unexpected error occurred while finding job matches.";
const UPGRADE_LABEL: &str = "Upgrade to Pro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SelectFile,
    FileSelected,
    DataReview,
    Redirecting,
}

impl Step {
    pub fn title(&self) -> &'static str {
        match self {
            Step::SelectFile => "Upload Your CV",
            Step::FileSelected => "Confirm Your File",
            Step::DataReview => "Review CV Data",
            Step::Redirecting => "Finding Matches",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub user_id: String,
    pub step: Step,
    pub file: Option<SelectedFile>,
    pub cv_data: Option<CvData>,
    /// A summarize or search request is in flight.
    pub busy: bool,
}

impl WizardState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            step: Step::SelectFile,
            file: None,
            cv_data: None,
            busy: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum WizardEvent {
    FileChosen(SelectedFile),
    UploadRequested,
    SummarizeSucceeded(CvData),
    SummarizeFailed(BackendError),
    CvDataEdited(CvData),
    ConfirmRequested,
    SearchSucceeded,
    SearchFailed(BackendError),
    ChangeFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Account,
    Reports,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Account => "/account",
            Route::Reports => "/reports",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub action: Option<NoticeAction>,
}

impl Notice {
    fn success(message: &str) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.to_string(),
            action: None,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message,
            action: None,
        }
    }

    fn with_action(mut self, label: &str, route: Route) -> Self {
        self.action = Some(NoticeAction {
            label: label.to_string(),
            route,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Blocking message for input rejected locally.
    Alert(String),
    Notify(Notice),
    Summarize { user_id: String, file: SelectedFile },
    Search(JobSearchRequest),
    InvalidateQueries(Vec<QueryKey>),
    NavigateAfter { route: Route, delay: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WizardState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(state: &WizardState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    fn to(state: WizardState, effects: Vec<Effect>) -> Self {
        Self { state, effects }
    }
}

/// Backend-supplied message, when the backend answered at all.
fn upstream_message(error: &BackendError) -> Option<String> {
    match error {
        BackendError::Upstream { status, detail } => Some(format!(
            "Error: {}",
            detail
                .clone()
                .unwrap_or_else(|| format!("request failed with status {}", status))
        )),
        BackendError::Transport(_) | BackendError::Decode(_) => None,
    }
}

/// Events that do not apply to the current step leave the state untouched
/// and produce no effects.
pub fn transition(state: &WizardState, event: WizardEvent) -> Transition {
    use WizardEvent::*;

    match (state.step, event) {
        (Step::SelectFile, FileChosen(file)) => match validate_file(&file) {
            Ok(()) => Transition::to(
                WizardState {
                    step: Step::FileSelected,
                    file: Some(file),
                    cv_data: None,
                    busy: false,
                    ..state.clone()
                },
                vec![],
            ),
            Err(rejection) => Transition {
                state: state.clone(),
                effects: vec![Effect::Alert(rejection.to_string())],
            },
        },

        (Step::FileSelected, UploadRequested) if !state.busy => {
            let Some(file) = state.file.clone() else {
                return Transition::stay(state);
            };
            Transition::to(
                WizardState {
                    busy: true,
                    ..state.clone()
                },
                vec![Effect::Summarize {
                    user_id: state.user_id.clone(),
                    file,
                }],
            )
        }

        (Step::FileSelected, SummarizeSucceeded(cv)) if state.busy => Transition::to(
            WizardState {
                step: Step::DataReview,
                cv_data: Some(cv),
                busy: false,
                ..state.clone()
            },
            vec![Effect::Notify(Notice::success(SUMMARIZE_SUCCESS))],
        ),

        (Step::FileSelected, SummarizeFailed(error)) if state.busy => {
            let notice = match upstream_message(&error) {
                Some(message) => {
                    Notice::warning(message).with_action(UPGRADE_LABEL, Route::Account)
                }
                None => Notice::warning(SUMMARIZE_UNEXPECTED.to_string()),
            };
            Transition::to(
                WizardState {
                    busy: false,
                    ..state.clone()
                },
                vec![Effect::Notify(notice)],
            )
        }

        (Step::FileSelected, ChangeFile) => {
            Transition::to(WizardState::new(state.user_id.clone()), vec![])
        }

        (Step::DataReview, CvDataEdited(cv)) if !state.busy => match cv.validate() {
            Ok(()) => Transition::to(
                WizardState {
                    cv_data: Some(cv),
                    ..state.clone()
                },
                vec![],
            ),
            Err(errors) => Transition {
                state: state.clone(),
                effects: vec![Effect::Alert(CvData::first_error(&errors))],
            },
        },

        (Step::DataReview, ConfirmRequested) if !state.busy => {
            let (Some(cv), Some(file)) = (&state.cv_data, &state.file) else {
                return Transition::stay(state);
            };
            if let Err(errors) = cv.validate() {
                return Transition {
                    state: state.clone(),
                    effects: vec![Effect::Alert(CvData::first_error(&errors))],
                };
            }
            let request = JobSearchRequest::from_cv(&state.user_id, file.search_filename(), cv);
            Transition::to(
                WizardState {
                    busy: true,
                    ..state.clone()
                },
                vec![Effect::Search(request)],
            )
        }

        (Step::DataReview, SearchSucceeded) if state.busy => Transition::to(
            WizardState {
                step: Step::Redirecting,
                busy: false,
                ..state.clone()
            },
            vec![
                Effect::InvalidateQueries(vec![
                    QueryKey::Reports(state.user_id.clone()),
                    QueryKey::Subscription(state.user_id.clone()),
                ]),
                Effect::Notify(Notice::success(SEARCH_SUCCESS)),
                Effect::NavigateAfter {
                    route: Route::Reports,
                    delay: REDIRECT_DELAY,
                },
            ],
        ),

        (Step::DataReview, SearchFailed(error)) if state.busy => {
            let message = upstream_message(&error)
                .unwrap_or_else(|| SEARCH_UNEXPECTED.to_string());
            Transition::to(
                WizardState {
                    busy: false,
                    ..state.clone()
                },
                vec![Effect::Notify(Notice::warning(message))],
            )
        }

        _ => Transition::stay(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::file::{MAX_FILE_SIZE, PDF_MIME};
    use bytes::Bytes;

    fn resume() -> SelectedFile {
        SelectedFile::new("resume.pdf", PDF_MIME, Bytes::from_static(b"%PDF-1.4"))
    }

    fn cv() -> CvData {
        CvData {
            role: "Backend Developer".into(),
            years_experience: None,
            location: "Rome".into(),
            skills: vec!["Python".into()],
            summary: "Builds APIs".into(),
        }
    }

    fn run(state: &WizardState, events: Vec<WizardEvent>) -> Transition {
        let mut current = Transition::stay(state);
        for event in events {
            current = transition(&current.state, event);
        }
        current
    }

    fn reviewing() -> WizardState {
        run(
            &WizardState::new("user_1"),
            vec![
                WizardEvent::FileChosen(resume()),
                WizardEvent::UploadRequested,
                WizardEvent::SummarizeSucceeded(cv()),
            ],
        )
        .state
    }

    #[test]
    fn rejected_file_stays_on_first_step() {
        let state = WizardState::new("user_1");
        let png = SelectedFile::new("photo.png", "image/png", Bytes::from_static(b"x"));
        let t = transition(&state, WizardEvent::FileChosen(png));
        assert_eq!(t.state, state);
        assert_eq!(
            t.effects,
            vec![Effect::Alert("File must be a PDF or DOCX".into())]
        );

        let mut big = resume();
        big.size = MAX_FILE_SIZE + 1;
        let t = transition(&state, WizardEvent::FileChosen(big));
        assert_eq!(t.state.step, Step::SelectFile);
        assert_eq!(
            t.effects,
            vec![Effect::Alert("File must be smaller than 5MB".into())]
        );
    }

    #[test]
    fn upload_requests_summary_once() {
        let selected = transition(
            &WizardState::new("user_1"),
            WizardEvent::FileChosen(resume()),
        )
        .state;
        assert_eq!(selected.step, Step::FileSelected);

        let uploading = transition(&selected, WizardEvent::UploadRequested);
        assert!(uploading.state.busy);
        assert_eq!(
            uploading.effects,
            vec![Effect::Summarize {
                user_id: "user_1".into(),
                file: resume()
            }]
        );

        let again = transition(&uploading.state, WizardEvent::UploadRequested);
        assert!(again.effects.is_empty());
    }

    #[test]
    fn summary_moves_to_review() {
        let state = reviewing();
        assert_eq!(state.step, Step::DataReview);
        assert_eq!(state.cv_data, Some(cv()));
        assert!(!state.busy);
    }

    #[test]
    fn upstream_summary_failure_offers_upgrade() {
        let t = run(
            &WizardState::new("user_1"),
            vec![
                WizardEvent::FileChosen(resume()),
                WizardEvent::UploadRequested,
                WizardEvent::SummarizeFailed(BackendError::Upstream {
                    status: 402,
                    detail: Some("Insufficient credits".into()),
                }),
            ],
        );
        assert_eq!(t.state.step, Step::FileSelected);
        assert!(!t.state.busy);
        let Effect::Notify(notice) = &t.effects[0] else {
            panic!("expected a notice, got {:?}", t.effects);
        };
        assert_eq!(notice.message, "Error: Insufficient credits");
        assert_eq!(
            notice.action,
            Some(NoticeAction {
                label: "Upgrade to Pro".into(),
                route: Route::Account
            })
        );
    }

    #[test]
    fn transport_summary_failure_is_generic() {
        let t = run(
            &WizardState::new("user_1"),
            vec![
                WizardEvent::FileChosen(resume()),
                WizardEvent::UploadRequested,
                WizardEvent::SummarizeFailed(BackendError::Transport("refused".into())),
            ],
        );
        assert_eq!(
            t.effects,
            vec![Effect::Notify(Notice::warning(SUMMARIZE_UNEXPECTED.into()))]
        );
    }

    #[test]
    fn change_file_resets() {
        let selected = transition(
            &WizardState::new("user_1"),
            WizardEvent::FileChosen(resume()),
        )
        .state;
        let t = transition(&selected, WizardEvent::ChangeFile);
        assert_eq!(t.state, WizardState::new("user_1"));
    }

    #[test]
    fn invalid_edit_keeps_previous_data() {
        let state = reviewing();
        let edited = CvData {
            location: "Ro".into(),
            ..cv()
        };
        let t = transition(&state, WizardEvent::CvDataEdited(edited));
        assert_eq!(t.state.cv_data, Some(cv()));
        assert_eq!(t.effects, vec![Effect::Alert("Location is required".into())]);
    }

    #[test]
    fn confirm_builds_search_request() {
        let state = reviewing();
        let edited = CvData {
            role: "Data Engineer".into(),
            ..cv()
        };
        let state = transition(&state, WizardEvent::CvDataEdited(edited)).state;
        let t = transition(&state, WizardEvent::ConfirmRequested);
        assert!(t.state.busy);
        assert_eq!(t.state.step, Step::DataReview);
        assert_eq!(
            t.effects,
            vec![Effect::Search(JobSearchRequest {
                user_id: "user_1".into(),
                role: "Data Engineer".into(),
                location: "Rome".into(),
                skills: vec!["Python".into()],
                years_experience: 0,
                filename: "resume.pdf".into(),
            })]
        );
    }

    #[test]
    fn search_success_invalidates_and_redirects() {
        let t = run(
            &reviewing(),
            vec![WizardEvent::ConfirmRequested, WizardEvent::SearchSucceeded],
        );
        assert_eq!(t.state.step, Step::Redirecting);
        assert_eq!(
            t.effects,
            vec![
                Effect::InvalidateQueries(vec![
                    QueryKey::Reports("user_1".into()),
                    QueryKey::Subscription("user_1".into()),
                ]),
                Effect::Notify(Notice::success(SEARCH_SUCCESS)),
                Effect::NavigateAfter {
                    route: Route::Reports,
                    delay: REDIRECT_DELAY
                },
            ]
        );
    }

    #[test]
    fn search_failure_stays_in_review() {
        let t = run(
            &reviewing(),
            vec![
                WizardEvent::ConfirmRequested,
                WizardEvent::SearchFailed(BackendError::Decode("bad json".into())),
            ],
        );
        assert_eq!(t.state.step, Step::DataReview);
        assert!(!t.state.busy);
        assert_eq!(
            t.effects,
            vec![Effect::Notify(Notice::warning(SEARCH_UNEXPECTED.into()))]
        );
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let state = WizardState::new("user_1");
        for event in [
            WizardEvent::UploadRequested,
            WizardEvent::ConfirmRequested,
            WizardEvent::SearchSucceeded,
            WizardEvent::SummarizeSucceeded(cv()),
        ] {
            assert_eq!(transition(&state, event), Transition::stay(&state));
        }
    }
}
