//! Saving a built work package
//!
//! `Built -> Saved | ValidationFailed`. A failed save is not retried; the
//! form is rendered again with the unsaved record and its errors.

use op_contracts::base::{Contract, UserContext};
use op_contracts::work_packages::CreateWorkPackageContract;
use op_core::error::{OpError, ValidationErrors};
use op_core::result::OpResult;
use op_db::RepositoryError;
use op_models::{Project, WorkPackage};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::outcome::{Flash, NewView, Outcome, View};
use super::request::WorkPackageRequest;

pub const NOTICE_SUCCESSFUL_CREATE: &str = "Successful creation.";

impl<'a, U: UserContext> WorkPackageRequest<'a, U> {
    /// Save the built work package and describe what to show next.
    ///
    /// Callers authorize `add_work_packages` first.
    #[instrument(skip(self), fields(user_id = self.user.id()))]
    pub(super) async fn save_new_work_package(&mut self) -> OpResult<Outcome> {
        let mut wp = self.new_work_package().await?;
        let project = self.project().await?;

        self.handler.hooks().new_before_save(&mut wp, &self.params);
        let send_notification = self.params.send_notification();

        let mut errors = std::mem::take(&mut self.build_errors);
        if let Err(contract_errors) = CreateWorkPackageContract::new(self.user, &project).validate(&wp) {
            errors.merge(contract_errors);
        }
        if !errors.is_empty() {
            return self.render_new(wp, project, errors).await;
        }

        let saved = match self.store().save_work_package(wp.clone(), self.user.id()).await {
            Ok(saved) => saved,
            Err(RepositoryError::Conflict(message)) => {
                errors.add_base(message);
                return self.render_new(wp, project, errors).await;
            }
            Err(err) => return Err(err.into()),
        };
        let id = saved
            .id
            .ok_or_else(|| OpError::Internal("saved work package has no id".to_string()))?;
        self.new_work_package = Some(saved.clone());

        let mut flash = Flash {
            notice: Some(NOTICE_SUCCESSFUL_CREATE.to_string()),
            warning: None,
        };

        let files = std::mem::take(&mut self.params.attachments);
        if !files.is_empty() {
            let attached = self.handler.attachments().attach_files(id, files, self.user.id()).await;
            if let Some(warning) = attached.warning() {
                warn!(id, unsaved = attached.unsaved.len(), "some attachments were not saved");
                flash.warning = Some(warning);
            }
        }

        self.handler.hooks().new_after_save(&saved, &self.params);

        if send_notification {
            self.notification = Some(self.handler.notifications().work_package_created(saved.clone()));
        }

        info!(id, kind = %saved.kind, project_id = saved.project_id, "work package created");
        Ok(Outcome::redirect_to_work_package(id, flash))
    }

    async fn render_new(&mut self, work_package: WorkPackage, project: Project, errors: ValidationErrors) -> OpResult<Outcome> {
        info!(errors = ?errors.full_messages(), "work package rejected");
        let priorities = self.priorities().await?;
        let allowed_statuses = self.allowed_statuses(&work_package).await?;

        Ok(Outcome::Render {
            template: "work_packages/new",
            view: View::New(Box::new(NewView {
                work_package,
                project,
                priorities,
                allowed_statuses,
            })),
            errors,
            flash: Flash::default(),
        })
    }

    /// Notification task spawned by a successful create, if any
    pub fn take_notification_task(&mut self) -> Option<JoinHandle<()>> {
        self.notification.take()
    }
}
