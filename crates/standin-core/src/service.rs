//! The job lifecycle: create, apply, decline, cancel, sweep, run and
//! preview.
//!
//! [`JobService`] is generic over the storage backend and both side-effect
//! transports so the same code runs against SQLite in production and against
//! recording doubles in tests.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  attribute::AttributeRegistry,
  authoring,
  constraint::{Constraint, ConstraintDraft},
  engine::{
    MatchInput,
    candidates::CandidateMode,
    rank_job,
    ranking::{ScoredCandidate, winner},
    report::DryRunReport,
    resolver::{ResolvedConstraints, constraints_for},
  },
  job::{Application, AssignmentResult, Job, JobSource, NewJob},
  notify::{CalendarGateway, CalendarInvite, Notice, NoticeKind, Notifier, NotifyError},
  setting::{SettingsCache, SystemSetting},
  store::{ApplyOutcome, InsertJobOutcome, JobStore},
  user::{AssignmentRecord, User},
};

/// Tunables for [`JobService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
  /// Upper bound on each notification or calendar call.
  pub side_effect_timeout: Duration,
}

impl Default for ServiceConfig {
  fn default() -> Self { Self { side_effect_timeout: Duration::from_secs(10) } }
}

/// Counters for one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
  pub examined:             usize,
  pub assigned:             usize,
  pub expired:              usize,
  pub no_applicant_notices: usize,
  /// Still open after the pass: no applicants yet, or none eligible.
  pub awaiting:             usize,
  /// Another writer assigned or closed the job first.
  pub lost_races:           usize,
  pub failed:               usize,
}

/// What processing one job did.
#[derive(Debug, Clone, PartialEq)]
enum JobOutcome {
  Assigned(AssignmentResult),
  Expired,
  NoApplicantsNotified,
  Awaiting,
  LostRace,
}

/// Everything loaded from the store to rank one job.
struct Loaded {
  resolved:            ResolvedConstraints,
  registry:            AttributeRegistry,
  users:               Vec<User>,
  default_window_days: Option<u32>,
}

impl Loaded {
  fn rank(&self, job: &Job, mode: CandidateMode, now: DateTime<Utc>) -> Vec<ScoredCandidate> {
    rank_job(
      &MatchInput {
        job,
        meeting: &self.resolved.meeting,
        constraints: &self.resolved.constraints,
        registry: &self.registry,
        users: &self.users,
        default_window_days: self.default_window_days,
        now,
      },
      mode,
    )
  }
}

pub struct JobService<S, N, C> {
  store:    Arc<S>,
  notifier: Arc<N>,
  calendar: Arc<C>,
  settings: SettingsCache,
  config:   ServiceConfig,
}

impl<S, N, C> Clone for JobService<S, N, C> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
      calendar: Arc::clone(&self.calendar),
      settings: self.settings.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S, N, C> JobService<S, N, C>
where
  S: JobStore,
  N: Notifier,
  C: CalendarGateway,
{
  pub fn new(
    store:    Arc<S>,
    notifier: Arc<N>,
    calendar: Arc<C>,
    settings: SettingsCache,
    config:   ServiceConfig,
  ) -> Self {
    Self { store, notifier, calendar, settings, config }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn settings(&self) -> &SettingsCache { &self.settings }

  // ─── Lookups ─────────────────────────────────────────────────────────────

  pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
    self
      .store
      .find_job_by_id(job_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::JobNotFound(job_id))
  }

  async fn get_user(&self, user_id: Uuid) -> Result<User> {
    self
      .store
      .find_user_by_id(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UserNotFound(user_id))
  }

  /// The merged system + custom attribute table, rebuilt from the current
  /// definitions on every call.
  pub async fn registry(&self) -> Result<AttributeRegistry> {
    let custom = self.store.list_attribute_definitions().await.map_err(Error::store)?;
    Ok(AttributeRegistry::build(custom))
  }

  fn authorize(job: &Job, actor: &User, action: &'static str) -> Result<()> {
    if job.created_by == actor.user_id || actor.is_admin() {
      Ok(())
    } else {
      Err(Error::Unauthorized { actor: actor.user_id, job_id: job.job_id, action })
    }
  }

  // ─── Transitions ─────────────────────────────────────────────────────────

  /// Open a job and announce it. At most one active job may exist per
  /// meeting instance and creator.
  pub async fn create_job(&self, new: NewJob) -> Result<Job> {
    let creator = self.get_user(new.created_by).await?;

    let snapshot = match new.source {
      JobSource::Meeting { meeting_id } => self
        .store
        .find_meeting_by_id(meeting_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::MeetingNotFound(meeting_id))?
        .snapshot(),
      JobSource::Event { snapshot } => snapshot,
    };

    let job = Job::open(snapshot, creator.user_id, Utc::now());
    match self.store.insert_job(job.clone()).await.map_err(Error::store)? {
      InsertJobOutcome::Inserted => {}
      InsertJobOutcome::Conflict(existing) => return Err(Error::JobConflict(existing)),
    }
    info!(job_id = %job.job_id, user_id = %creator.user_id, title = %job.meeting.title, "job created");

    let notice = notice(NoticeKind::JobPosted, &job, Some(&creator.name), None);
    self.side_effect(job.job_id, "job-posted notification", self.notifier.notify(notice)).await;
    Ok(job)
  }

  pub async fn apply(&self, job_id: Uuid, user_id: Uuid) -> Result<Job> {
    self.get_user(user_id).await?;

    let application = Application { user_id, applied_at: Utc::now() };
    match self.store.append_application(job_id, application).await.map_err(Error::store)? {
      ApplyOutcome::Applied => {
        debug!(%job_id, %user_id, "application recorded");
        self.get_job(job_id).await
      }
      ApplyOutcome::Duplicate => Err(Error::DuplicateApplication { job_id, user_id }),
      ApplyOutcome::JobNotFound => Err(Error::JobNotFound(job_id)),
      ApplyOutcome::JobClosed => Err(Error::JobClosed(job_id)),
    }
  }

  /// Withdraw one application. Withdrawing an application that does not
  /// exist is not an error.
  pub async fn decline(&self, job_id: Uuid, user_id: Uuid) -> Result<Job> {
    let job = self.get_job(job_id).await?;
    if !job.is_open() {
      return Err(Error::JobClosed(job_id));
    }
    let removed = self.store.remove_application(job_id, user_id).await.map_err(Error::store)?;
    let job = self.get_job(job_id).await?;
    if removed {
      debug!(%job_id, %user_id, "application withdrawn");
    } else if !job.is_open() {
      // Assigned or expired between the check and the delete.
      return Err(Error::JobClosed(job_id));
    }
    Ok(job)
  }

  /// Delete an open job. Only its creator or an admin may do this.
  pub async fn cancel(&self, job_id: Uuid, actor_id: Uuid) -> Result<()> {
    let job = self.get_job(job_id).await?;
    let actor = self.get_user(actor_id).await?;
    Self::authorize(&job, &actor, "cancel")?;
    if !job.is_open() {
      return Err(Error::JobClosed(job_id));
    }

    if !self.store.delete_job(job_id).await.map_err(Error::store)? {
      return Err(Error::JobNotFound(job_id));
    }
    info!(%job_id, user_id = %actor_id, "job cancelled");

    let notice = notice(NoticeKind::JobCancelled, &job, Some(&actor.name), None);
    self.side_effect(job_id, "job-cancelled notification", self.notifier.notify(notice)).await;
    Ok(())
  }

  // ─── Sweep ───────────────────────────────────────────────────────────────

  pub async fn sweep(&self) -> Result<SweepSummary> { self.sweep_at(Utc::now()).await }

  /// Process every active, unassigned job as of `now`.
  ///
  /// Only failing to list the jobs fails the sweep; a failure on one job is
  /// logged and counted and the pass moves on.
  pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepSummary> {
    let jobs = self.store.find_jobs_active_unassigned().await.map_err(Error::store)?;
    let mut summary = SweepSummary { examined: jobs.len(), ..Default::default() };

    for job in &jobs {
      match self.process(job, now).await {
        Ok(JobOutcome::Assigned(_)) => summary.assigned += 1,
        Ok(JobOutcome::Expired) => summary.expired += 1,
        Ok(JobOutcome::NoApplicantsNotified) => {
          summary.no_applicant_notices += 1;
          summary.awaiting += 1;
        }
        Ok(JobOutcome::Awaiting) => summary.awaiting += 1,
        Ok(JobOutcome::LostRace) => summary.lost_races += 1,
        Err(e) => {
          warn!(job_id = %job.job_id, error = %e, code = e.code(), "sweep failed for job");
          summary.failed += 1;
        }
      }
    }

    info!(
      examined = summary.examined,
      assigned = summary.assigned,
      expired = summary.expired,
      no_applicant_notices = summary.no_applicant_notices,
      awaiting = summary.awaiting,
      lost_races = summary.lost_races,
      failed = summary.failed,
      "sweep complete"
    );
    Ok(summary)
  }

  /// Process a single job on demand. Restricted to its creator or an admin.
  pub async fn run_job(&self, job_id: Uuid, actor_id: Uuid) -> Result<AssignmentResult> {
    let job = self.get_job(job_id).await?;
    let actor = self.get_user(actor_id).await?;
    Self::authorize(&job, &actor, "run")?;
    if !job.is_open() {
      return Err(Error::JobClosed(job_id));
    }

    match self.process(&job, Utc::now()).await? {
      JobOutcome::Assigned(result) => Ok(result),
      _ => Ok(AssignmentResult::unassigned(job_id)),
    }
  }

  async fn process(&self, job: &Job, now: DateTime<Utc>) -> Result<JobOutcome> {
    if job.meeting.has_started(now) {
      return if self.store.close_job(job.job_id).await.map_err(Error::store)? {
        info!(job_id = %job.job_id, "meeting started without a substitute; job closed");
        Ok(JobOutcome::Expired)
      } else {
        Ok(JobOutcome::LostRace)
      };
    }

    if job.applications.is_empty() {
      if job.no_applicants_notice_sent {
        return Ok(JobOutcome::Awaiting);
      }
      if !self.store.mark_no_applicants_notified(job.job_id).await.map_err(Error::store)? {
        return Ok(JobOutcome::Awaiting);
      }
      let notice = notice(NoticeKind::NoApplicants, job, None, None);
      self.side_effect(job.job_id, "no-applicants notification", self.notifier.notify(notice)).await;
      return Ok(JobOutcome::NoApplicantsNotified);
    }

    let loaded = self.load(job).await?;
    let ranked = loaded.rank(job, CandidateMode::ApplicantsOnly, now);
    let Some(top) = winner(&ranked) else {
      debug!(job_id = %job.job_id, candidates = ranked.len(), "no eligible applicant");
      return Ok(JobOutcome::Awaiting);
    };

    self.assign(job, top, now).await
  }

  /// The one write that must happen at most once per job.
  async fn assign(&self, job: &Job, top: &ScoredCandidate, now: DateTime<Utc>) -> Result<JobOutcome> {
    let user = &top.candidate.user;
    let record = AssignmentRecord {
      job_id:        job.job_id,
      meeting_title: job.meeting.title.clone(),
      assigned_at:   now,
    };

    if !self
      .store
      .update_job_assignment(job.job_id, user.user_id, record)
      .await
      .map_err(Error::store)?
    {
      info!(job_id = %job.job_id, user_id = %user.user_id, "job already assigned; skipping");
      return Ok(JobOutcome::LostRace);
    }
    info!(
      job_id = %job.job_id,
      user_id = %user.user_id,
      score = top.card.composite_score,
      "job assigned"
    );

    let invite = CalendarInvite {
      job_id:         job.job_id,
      event_id:       job.meeting.event_id.clone(),
      title:          job.meeting.title.clone(),
      starts_at:      job.meeting.starts_at,
      ends_at:        job.meeting.ends_at,
      attendee_name:  user.name.clone(),
      attendee_email: user.email.clone(),
    };
    self.side_effect(job.job_id, "calendar invite", self.calendar.send_invite(invite)).await;

    let notice = notice(NoticeKind::JobAssigned, job, None, Some(&user.name));
    self.side_effect(job.job_id, "job-assigned notification", self.notifier.notify(notice)).await;

    Ok(JobOutcome::Assigned(AssignmentResult::assigned(job.job_id, user.user_id, now)))
  }

  async fn load(&self, job: &Job) -> Result<Loaded> {
    let resolved = constraints_for(&*self.store, job).await?;
    let registry = self.registry().await?;
    let users = self.store.find_all_users().await.map_err(Error::store)?;
    let default_window_days =
      self.settings.default_window_days(&*self.store).await.map_err(Error::store)?;
    Ok(Loaded { resolved, registry, users, default_window_days })
  }

  /// Run a best-effort side effect under the configured timeout. Failures are
  /// logged and otherwise ignored.
  async fn side_effect<F>(&self, job_id: Uuid, what: &'static str, effect: F)
  where
    F: Future<Output = Result<(), NotifyError>>,
  {
    match tokio::time::timeout(self.config.side_effect_timeout, effect).await {
      Ok(Ok(())) => debug!(%job_id, "{what} sent"),
      Ok(Err(e)) => warn!(%job_id, error = %e, "{what} failed"),
      Err(_) => warn!(%job_id, timeout = ?self.config.side_effect_timeout, "{what} timed out"),
    }
  }

  // ─── Dry run ─────────────────────────────────────────────────────────────

  pub async fn preview(&self, job_id: Uuid, mode: CandidateMode) -> Result<DryRunReport> {
    self.preview_at(job_id, mode, Utc::now()).await
  }

  /// Rank a job exactly as a sweep would, without writing anything or
  /// sending anything.
  pub async fn preview_at(
    &self,
    job_id: Uuid,
    mode: CandidateMode,
    now: DateTime<Utc>,
  ) -> Result<DryRunReport> {
    let job = self.get_job(job_id).await?;
    self.report(&job, mode, now).await
  }

  /// Preview the newest active job of a meeting.
  pub async fn preview_meeting(&self, meeting_id: Uuid, mode: CandidateMode) -> Result<DryRunReport> {
    let meeting = self
      .store
      .find_meeting_by_id(meeting_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::MeetingNotFound(meeting_id))?;

    let jobs = self
      .store
      .find_active_jobs_by_event_ids(meeting.snapshot().event_ids())
      .await
      .map_err(Error::store)?;
    let job = jobs.into_iter().next().ok_or(Error::NoOpenJob(meeting_id))?;

    self.report(&job, mode, Utc::now()).await
  }

  async fn report(&self, job: &Job, mode: CandidateMode, now: DateTime<Utc>) -> Result<DryRunReport> {
    let loaded = self.load(job).await?;
    let ranked = loaded.rank(job, mode, now);
    Ok(DryRunReport::build(
      job,
      &loaded.resolved.meeting,
      &loaded.resolved.constraints,
      &ranked,
      mode,
    ))
  }

  // ─── Administration ──────────────────────────────────────────────────────

  pub async fn setting(&self, key: &str) -> Result<Option<SystemSetting>> {
    self.settings.get(&*self.store, key).await.map_err(Error::store)
  }

  pub async fn put_setting(&self, setting: SystemSetting) -> Result<()> {
    info!(key = %setting.key, "system setting updated");
    self.settings.put(&*self.store, setting).await.map_err(Error::store)
  }

  /// Validate and store a new constraint.
  pub async fn author_constraint(&self, draft: ConstraintDraft) -> Result<Constraint> {
    let registry = self.registry().await?;
    let constraint = authoring::author_constraint(draft, &registry)?;
    self.store.put_constraint(constraint.clone()).await.map_err(Error::store)?;
    Ok(constraint)
  }
}

fn notice(kind: NoticeKind, job: &Job, actor: Option<&str>, assignee: Option<&str>) -> Notice {
  Notice {
    kind,
    job_id: job.job_id,
    meeting_title: job.meeting.title.clone(),
    starts_at: job.meeting.starts_at,
    ends_at: job.meeting.ends_at,
    actor_name: actor.map(str::to_owned),
    assignee_name: assignee.map(str::to_owned),
  }
}
