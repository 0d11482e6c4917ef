use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::client::backend::MatchingBackend;
use crate::client::query_cache::QueryCache;
use crate::models::cv_data::CvData;
use crate::wizard::file::SelectedFile;
use crate::wizard::machine::{
    transition, Effect, Notice, NoticeLevel, Route, WizardEvent, WizardState,
};

/// Drives [`transition`] against a real backend and query cache.
///
/// Effects run one at a time and their results are fed back before the next
/// event is taken, so a late response can never land on a newer state.
pub struct UploadWizard {
    state: WizardState,
    backend: Arc<dyn MatchingBackend>,
    cache: QueryCache,
    notices: Vec<Notice>,
    alerts: Vec<String>,
    navigation: Option<(Route, Duration)>,
}

impl UploadWizard {
    pub fn new(
        user_id: impl Into<String>,
        backend: Arc<dyn MatchingBackend>,
        cache: QueryCache,
    ) -> Self {
        Self {
            state: WizardState::new(user_id),
            backend,
            cache,
            notices: Vec::new(),
            alerts: Vec::new(),
            navigation: None,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub async fn choose_file(&mut self, file: SelectedFile) {
        self.dispatch(WizardEvent::FileChosen(file)).await
    }

    pub async fn upload(&mut self) {
        self.dispatch(WizardEvent::UploadRequested).await
    }

    pub async fn edit(&mut self, cv: CvData) {
        self.dispatch(WizardEvent::CvDataEdited(cv)).await
    }

    pub async fn confirm(&mut self) {
        self.dispatch(WizardEvent::ConfirmRequested).await
    }

    pub async fn change_file(&mut self) {
        self.dispatch(WizardEvent::ChangeFile).await
    }

    pub async fn dispatch(&mut self, event: WizardEvent) {
        let mut pending = VecDeque::from([event]);
        while let Some(event) = pending.pop_front() {
            let next = transition(&self.state, event);
            self.state = next.state;
            for effect in next.effects {
                if let Some(result) = self.run(effect).await {
                    pending.push_back(result);
                }
            }
        }
    }

    async fn run(&mut self, effect: Effect) -> Option<WizardEvent> {
        match effect {
            Effect::Alert(message) => {
                warn!(user_id = %self.state.user_id, %message, "wizard input rejected");
                self.alerts.push(message);
                None
            }
            Effect::Notify(notice) => {
                match notice.level {
                    NoticeLevel::Success => info!(message = %notice.message, "wizard notice"),
                    NoticeLevel::Warning => warn!(message = %notice.message, "wizard notice"),
                }
                self.notices.push(notice);
                None
            }
            Effect::Summarize { user_id, file } => {
                Some(match self.backend.summarize(&user_id, &file).await {
                    Ok(cv) => WizardEvent::SummarizeSucceeded(cv),
                    Err(e) => WizardEvent::SummarizeFailed(e),
                })
            }
            Effect::Search(request) => Some(match self.backend.search(&request).await {
                Ok(()) => WizardEvent::SearchSucceeded,
                Err(e) => WizardEvent::SearchFailed(e),
            }),
            Effect::InvalidateQueries(keys) => {
                for key in &keys {
                    self.cache.invalidate(key).await;
                }
                None
            }
            Effect::NavigateAfter { route, delay } => {
                self.navigation = Some((route, delay));
                None
            }
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Route scheduled by the last transition, without waiting.
    pub fn pending_navigation(&self) -> Option<Route> {
        self.navigation.map(|(route, _)| route)
    }

    /// Waits out the redirect delay and returns the destination.
    pub async fn wait_for_navigation(&mut self) -> Option<Route> {
        let (route, delay) = self.navigation.take()?;
        tokio::time::sleep(delay).await;
        Some(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::backend::BackendError;
    use crate::client::query_cache::QueryKey;
    use crate::dto::matching_dto::JobSearchRequest;
    use crate::wizard::file::PDF_MIME;
    use crate::wizard::machine::Step;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        summarize_error: Option<BackendError>,
        searches: Mutex<Vec<JobSearchRequest>>,
    }

    #[async_trait]
    impl MatchingBackend for FakeBackend {
        async fn summarize(
            &self,
            _user_id: &str,
            _file: &SelectedFile,
        ) -> Result<CvData, BackendError> {
            match &self.summarize_error {
                Some(e) => Err(e.clone()),
                None => Ok(CvData {
                    role: "Backend Developer".into(),
                    years_experience: Some(4),
                    location: "Rome".into(),
                    skills: vec!["Rust".into()],
                    summary: "Builds services".into(),
                }),
            }
        }

        async fn search(&self, request: &JobSearchRequest) -> Result<(), BackendError> {
            self.searches.lock().unwrap().push(request.clone());
            Ok(())
        }
    }

    fn resume() -> SelectedFile {
        SelectedFile::new("resume.pdf", PDF_MIME, Bytes::from_static(b"%PDF-1.4"))
    }

    #[tokio::test]
    async fn full_flow_searches_and_redirects() {
        let backend = Arc::new(FakeBackend::default());
        let cache = QueryCache::default();
        let reports = QueryKey::Reports("user_1".into());
        let subscription = QueryKey::Subscription("user_1".into());
        let _: Result<i64, BackendError> = cache
            .get_or_fetch(subscription.clone(), || async { Ok(3) })
            .await;

        let mut wizard = UploadWizard::new("user_1", backend.clone(), cache.clone());
        wizard.choose_file(resume()).await;
        wizard.upload().await;
        assert_eq!(wizard.state().step, Step::DataReview);

        wizard.confirm().await;
        assert_eq!(wizard.state().step, Step::Redirecting);
        assert_eq!(wizard.pending_navigation(), Some(Route::Reports));

        let searches = backend.searches.lock().unwrap().clone();
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].years_experience, 4);
        assert_eq!(searches[0].filename, "resume.pdf");

        assert_eq!(cache.peek::<i64>(&subscription).await, None);
        assert_eq!(cache.peek::<i64>(&reports).await, None);
        assert_eq!(wizard.take_notices().len(), 2);
        assert_eq!(wizard.wait_for_navigation().await, Some(Route::Reports));
        assert_eq!(wizard.wait_for_navigation().await, None);
    }

    #[tokio::test]
    async fn failed_summary_stays_on_file_step() {
        let backend = Arc::new(FakeBackend {
            summarize_error: Some(BackendError::Upstream {
                status: 402,
                detail: Some("Insufficient credits".into()),
            }),
            ..Default::default()
        });
        let mut wizard = UploadWizard::new("user_1", backend, QueryCache::default());
        wizard.choose_file(resume()).await;
        wizard.upload().await;

        assert_eq!(wizard.state().step, Step::FileSelected);
        assert!(!wizard.state().busy);
        let notices = wizard.take_notices();
        assert_eq!(notices[0].message, "Error: Insufficient credits");
        assert_eq!(
            notices[0].action.as_ref().map(|a| a.route),
            Some(Route::Account)
        );
    }

    #[tokio::test]
    async fn rejected_file_raises_alert() {
        let mut wizard = UploadWizard::new(
            "user_1",
            Arc::new(FakeBackend::default()),
            QueryCache::default(),
        );
        wizard
            .choose_file(SelectedFile::new("cv.txt", "text/plain", Bytes::from_static(b"hi")))
            .await;
        assert_eq!(
            wizard.take_alerts(),
            vec!["File must be a PDF or DOCX".to_string()]
        );
        assert_eq!(wizard.state().step, Step::SelectFile);
    }
}
