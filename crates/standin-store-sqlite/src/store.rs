//! [`SqliteStore`], the SQLite implementation of [`JobStore`].

use std::path::Path;

use rusqlite::{OptionalExtension as _, params};
use tracing::debug;
use uuid::Uuid;

use standin_core::{
  attribute::AttributeDefinition,
  constraint::{Constraint, ConstraintGroup},
  job::{Application, Job},
  meeting::Meeting,
  setting::SystemSetting,
  store::{ApplyOutcome, InsertJobOutcome, JobStore},
  user::{AssignmentRecord, User},
};

use crate::{
  Result,
  encode::{
    RawApplication, RawAssignment, RawConstraint, RawDefinition, RawGroup, RawJob,
    RawMeeting, RawSetting, RawUser, decode_uuid, encode_attribute_source, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Row readers ─────────────────────────────────────────────────────────────
//
// These run inside `Connection::call` closures and only ever see raw text.

const JOB_COLUMNS: &str = "job_id, active, title, event_id, recurring_event_id, \
   legacy_event_id, starts_at, ends_at, created_by, created_at, assigned_to, \
   assigned_at, posted_notice_sent, no_applicants_notice_sent";

const USER_COLUMNS: &str = "user_id, name, email, role, created_at, attributes";

const MEETING_COLUMNS: &str = "meeting_id, title, event_id, recurring_event_id, \
   legacy_event_id, starts_at, ends_at, workload_balance_window_days, fields";

const CONSTRAINT_COLUMNS: &str = "constraint_id, name, description, field_source, \
   field_key, operator, value_json, required, active";

fn query_jobs<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  clause: &str,
  params: P,
) -> rusqlite::Result<Vec<RawJob>> {
  let mut stmt = conn.prepare(&format!("SELECT {JOB_COLUMNS} FROM jobs {clause}"))?;
  let mut jobs = stmt
    .query_map(params, |row| {
      Ok(RawJob {
        job_id:                    row.get(0)?,
        active:                    row.get(1)?,
        title:                     row.get(2)?,
        event_id:                  row.get(3)?,
        recurring_event_id:        row.get(4)?,
        legacy_event_id:           row.get(5)?,
        starts_at:                 row.get(6)?,
        ends_at:                   row.get(7)?,
        created_by:                row.get(8)?,
        created_at:                row.get(9)?,
        assigned_to:               row.get(10)?,
        assigned_at:               row.get(11)?,
        posted_notice_sent:        row.get(12)?,
        no_applicants_notice_sent: row.get(13)?,
        applications:              Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut apps = conn.prepare(
    "SELECT user_id, applied_at FROM applications WHERE job_id = ?1
     ORDER BY applied_at, rowid",
  )?;
  for job in &mut jobs {
    job.applications = apps
      .query_map(params![job.job_id], |row| {
        Ok(RawApplication { user_id: row.get(0)?, applied_at: row.get(1)? })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;
  }
  Ok(jobs)
}

fn load_assignments(
  conn: &rusqlite::Connection,
  user_id: &str,
) -> rusqlite::Result<Vec<RawAssignment>> {
  let mut stmt = conn.prepare(
    "SELECT job_id, meeting_title, assigned_at FROM assignments WHERE user_id = ?1
     ORDER BY assigned_at, rowid",
  )?;
  let rows = stmt
    .query_map(params![user_id], |row| {
      Ok(RawAssignment {
        job_id:        row.get(0)?,
        meeting_title: row.get(1)?,
        assigned_at:   row.get(2)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

fn query_users<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  clause: &str,
  params: P,
) -> rusqlite::Result<Vec<RawUser>> {
  let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users {clause}"))?;
  let mut users = stmt
    .query_map(params, |row| {
      Ok(RawUser {
        user_id:     row.get(0)?,
        name:        row.get(1)?,
        email:       row.get(2)?,
        role:        row.get(3)?,
        created_at:  row.get(4)?,
        attributes:  row.get(5)?,
        assignments: Vec::new(),
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for user in &mut users {
    user.assignments = load_assignments(conn, &user.user_id)?;
  }
  Ok(users)
}

fn query_meeting<P: rusqlite::Params>(
  conn: &rusqlite::Connection,
  clause: &str,
  params: P,
) -> rusqlite::Result<Option<RawMeeting>> {
  let meeting = conn
    .query_row(&format!("SELECT {MEETING_COLUMNS} FROM meetings {clause} LIMIT 1"), params, |row| {
      Ok(RawMeeting {
        meeting_id:                   row.get(0)?,
        title:                        row.get(1)?,
        event_id:                     row.get(2)?,
        recurring_event_id:           row.get(3)?,
        legacy_event_id:              row.get(4)?,
        starts_at:                    row.get(5)?,
        ends_at:                      row.get(6)?,
        workload_balance_window_days: row.get(7)?,
        fields:                       row.get(8)?,
        group_ids:                    Vec::new(),
      })
    })
    .optional()?;

  let Some(mut meeting) = meeting else {
    return Ok(None);
  };
  let mut stmt = conn.prepare(
    "SELECT group_id FROM meeting_constraint_groups WHERE meeting_id = ?1 ORDER BY position",
  )?;
  meeting.group_ids = stmt
    .query_map(params![meeting.meeting_id], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(Some(meeting))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Standin job store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single guarded statement; `true` when it touched a row.
  async fn execute_guarded(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute(sql, params![id])?))
      .await?;
    Ok(changed > 0)
  }
}

// ─── JobStore impl ───────────────────────────────────────────────────────────

impl JobStore for SqliteStore {
  type Error = crate::Error;

  // ── Jobs ──────────────────────────────────────────────────────────────────

  async fn insert_job(&self, job: Job) -> Result<InsertJobOutcome> {
    let job_id        = encode_uuid(job.job_id);
    let snapshot      = job.meeting;
    let starts_at     = encode_dt(snapshot.starts_at);
    let ends_at       = encode_dt(snapshot.ends_at);
    let created_by    = encode_uuid(job.created_by);
    let created_at    = encode_dt(job.created_at);
    let assigned_to   = job.assigned_to.map(encode_uuid);
    let assigned_at   = job.assigned_at.map(encode_dt);
    let applications: Vec<(String, String)> = job
      .applications
      .iter()
      .map(|a| (encode_uuid(a.user_id), encode_dt(a.applied_at)))
      .collect();
    let active        = job.active;
    let posted        = job.posted_notice_sent;
    let no_applicants = job.no_applicants_notice_sent;

    let existing: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if active {
          let existing: Option<String> = tx
            .query_row(
              "SELECT job_id FROM jobs
               WHERE active = 1 AND event_id = ?1 AND starts_at = ?2 AND created_by = ?3",
              params![snapshot.event_id, starts_at, created_by],
              |r| r.get(0),
            )
            .optional()?;
          if existing.is_some() {
            return Ok(existing);
          }
        }

        tx.execute(
          "INSERT INTO jobs (
             job_id, active, title, event_id, recurring_event_id, legacy_event_id,
             starts_at, ends_at, created_by, created_at, assigned_to, assigned_at,
             posted_notice_sent, no_applicants_notice_sent
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          params![
            job_id,
            active,
            snapshot.title,
            snapshot.event_id,
            snapshot.recurring_event_id,
            snapshot.legacy_event_id,
            starts_at,
            ends_at,
            created_by,
            created_at,
            assigned_to,
            assigned_at,
            posted,
            no_applicants,
          ],
        )?;
        for (user_id, applied_at) in &applications {
          tx.execute(
            "INSERT OR IGNORE INTO applications (job_id, user_id, applied_at) VALUES (?1, ?2, ?3)",
            params![job_id, user_id, applied_at],
          )?;
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match existing {
      Some(id) => Ok(InsertJobOutcome::Conflict(decode_uuid(&id)?)),
      None => Ok(InsertJobOutcome::Inserted),
    }
  }

  async fn find_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>> {
    let id = encode_uuid(job_id);
    let raws = self
      .conn
      .call(move |conn| Ok(query_jobs(conn, "WHERE job_id = ?1", params![id])?))
      .await?;
    raws.into_iter().next().map(RawJob::into_job).transpose()
  }

  async fn find_jobs_active_unassigned(&self) -> Result<Vec<Job>> {
    let raws = self
      .conn
      .call(|conn| {
        Ok(query_jobs(
          conn,
          "WHERE active = 1 AND assigned_to IS NULL ORDER BY created_at, rowid",
          [],
        )?)
      })
      .await?;
    raws.into_iter().map(RawJob::into_job).collect()
  }

  async fn find_active_jobs_by_event_ids(&self, event_ids: Vec<String>) -> Result<Vec<Job>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut found: Vec<RawJob> = Vec::new();
        for id in &event_ids {
          let jobs = query_jobs(
            conn,
            "WHERE active = 1
               AND (event_id = ?1 OR recurring_event_id = ?1 OR legacy_event_id = ?1)",
            params![id],
          )?;
          for job in jobs {
            if !found.iter().any(|f| f.job_id == job.job_id) {
              found.push(job);
            }
          }
        }
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
      })
      .await?;
    raws.into_iter().map(RawJob::into_job).collect()
  }

  async fn append_application(&self, job_id: Uuid, application: Application) -> Result<ApplyOutcome> {
    let job_id     = encode_uuid(job_id);
    let user_id    = encode_uuid(application.user_id);
    let applied_at = encode_dt(application.applied_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let active: Option<bool> = tx
          .query_row("SELECT active FROM jobs WHERE job_id = ?1", params![job_id], |r| r.get(0))
          .optional()?;

        let outcome = match active {
          None => ApplyOutcome::JobNotFound,
          Some(false) => ApplyOutcome::JobClosed,
          Some(true) => {
            let inserted = tx.execute(
              "INSERT OR IGNORE INTO applications (job_id, user_id, applied_at) VALUES (?1, ?2, ?3)",
              params![job_id, user_id, applied_at],
            )?;
            if inserted == 0 { ApplyOutcome::Duplicate } else { ApplyOutcome::Applied }
          }
        };
        tx.commit()?;
        Ok(outcome)
      })
      .await?;
    Ok(outcome)
  }

  async fn remove_application(&self, job_id: Uuid, user_id: Uuid) -> Result<bool> {
    let job_id  = encode_uuid(job_id);
    let user_id = encode_uuid(user_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM applications
           WHERE job_id = ?1 AND user_id = ?2
             AND EXISTS (SELECT 1 FROM jobs WHERE job_id = ?1 AND active = 1)",
          params![job_id, user_id],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn update_job_assignment(
    &self,
    job_id:  Uuid,
    user_id: Uuid,
    record:  AssignmentRecord,
  ) -> Result<bool> {
    let job_str       = encode_uuid(job_id);
    let user_str      = encode_uuid(user_id);
    let assigned_at   = encode_dt(record.assigned_at);
    let meeting_title = record.meeting_title;

    let won = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE jobs SET active = 0, assigned_to = ?2, assigned_at = ?3
           WHERE job_id = ?1 AND active = 1 AND assigned_to IS NULL",
          params![job_str, user_str, assigned_at],
        )?;
        if changed == 1 {
          tx.execute(
            "INSERT OR IGNORE INTO assignments (user_id, job_id, meeting_title, assigned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_str, job_str, meeting_title, assigned_at],
          )?;
        }
        tx.commit()?;
        Ok(changed == 1)
      })
      .await?;

    if !won {
      debug!(%job_id, %user_id, "guarded assignment matched no row");
    }
    Ok(won)
  }

  async fn close_job(&self, job_id: Uuid) -> Result<bool> {
    self
      .execute_guarded(
        "UPDATE jobs SET active = 0 WHERE job_id = ?1 AND active = 1 AND assigned_to IS NULL",
        job_id,
      )
      .await
  }

  async fn mark_no_applicants_notified(&self, job_id: Uuid) -> Result<bool> {
    self
      .execute_guarded(
        "UPDATE jobs SET no_applicants_notice_sent = 1
         WHERE job_id = ?1 AND active = 1 AND no_applicants_notice_sent = 0",
        job_id,
      )
      .await
  }

  async fn delete_job(&self, job_id: Uuid) -> Result<bool> {
    let id = encode_uuid(job_id);
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM applications WHERE job_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM jobs WHERE job_id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Meetings & constraints ────────────────────────────────────────────────

  async fn put_meeting(&self, meeting: Meeting) -> Result<()> {
    let meeting_id = encode_uuid(meeting.meeting_id);
    let starts_at  = encode_dt(meeting.starts_at);
    let ends_at    = encode_dt(meeting.ends_at);
    let fields     = serde_json::to_string(&meeting.fields)?;
    let group_ids: Vec<String> =
      meeting.constraint_group_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO meetings (
             meeting_id, title, event_id, recurring_event_id, legacy_event_id,
             starts_at, ends_at, workload_balance_window_days, fields
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT(meeting_id) DO UPDATE SET
             title = excluded.title,
             event_id = excluded.event_id,
             recurring_event_id = excluded.recurring_event_id,
             legacy_event_id = excluded.legacy_event_id,
             starts_at = excluded.starts_at,
             ends_at = excluded.ends_at,
             workload_balance_window_days = excluded.workload_balance_window_days,
             fields = excluded.fields",
          params![
            meeting_id,
            meeting.title,
            meeting.event_id,
            meeting.recurring_event_id,
            meeting.legacy_event_id,
            starts_at,
            ends_at,
            meeting.workload_balance_window_days,
            fields,
          ],
        )?;
        tx.execute(
          "DELETE FROM meeting_constraint_groups WHERE meeting_id = ?1",
          params![meeting_id],
        )?;
        for (position, group_id) in group_ids.iter().enumerate() {
          tx.execute(
            "INSERT OR IGNORE INTO meeting_constraint_groups (meeting_id, group_id, position)
             VALUES (?1, ?2, ?3)",
            params![meeting_id, group_id, position as i64],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_meeting_by_id(&self, meeting_id: Uuid) -> Result<Option<Meeting>> {
    let id = encode_uuid(meeting_id);
    let raw = self
      .conn
      .call(move |conn| Ok(query_meeting(conn, "WHERE meeting_id = ?1", params![id])?))
      .await?;
    raw.map(RawMeeting::into_meeting).transpose()
  }

  async fn find_meeting_by_any_event_id(&self, event_ids: Vec<String>) -> Result<Option<Meeting>> {
    let raw = self
      .conn
      .call(move |conn| {
        for id in &event_ids {
          let found = query_meeting(
            conn,
            "WHERE event_id = ?1 OR recurring_event_id = ?1 OR legacy_event_id = ?1
             ORDER BY (event_id = ?1) DESC, rowid",
            params![id],
          )?;
          if found.is_some() {
            return Ok(found);
          }
        }
        Ok(None)
      })
      .await?;
    raw.map(RawMeeting::into_meeting).transpose()
  }

  async fn put_constraint(&self, constraint: Constraint) -> Result<()> {
    let constraint_id = encode_uuid(constraint.constraint_id);
    let field_source  = constraint.field_source.as_str();
    let operator      = constraint.operator.as_str();
    let value_json    = serde_json::to_string(&constraint.value)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO constraints (
             constraint_id, name, description, field_source, field_key,
             operator, value_json, required, active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
           ON CONFLICT(constraint_id) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             field_source = excluded.field_source,
             field_key = excluded.field_key,
             operator = excluded.operator,
             value_json = excluded.value_json,
             required = excluded.required,
             active = excluded.active",
          params![
            constraint_id,
            constraint.name,
            constraint.description,
            field_source,
            constraint.field_key,
            operator,
            value_json,
            constraint.required,
            constraint.active,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_constraint(&self, constraint_id: Uuid) -> Result<bool> {
    self
      .execute_guarded("DELETE FROM constraints WHERE constraint_id = ?1", constraint_id)
      .await
  }

  async fn put_constraint_group(&self, group: ConstraintGroup) -> Result<()> {
    let group_id = encode_uuid(group.group_id);
    let members: Vec<String> = group.constraint_ids.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO constraint_groups (group_id, name) VALUES (?1, ?2)
           ON CONFLICT(group_id) DO UPDATE SET name = excluded.name",
          params![group_id, group.name],
        )?;
        tx.execute(
          "DELETE FROM constraint_group_members WHERE group_id = ?1",
          params![group_id],
        )?;
        for (position, constraint_id) in members.iter().enumerate() {
          tx.execute(
            "INSERT OR IGNORE INTO constraint_group_members (group_id, constraint_id, position)
             VALUES (?1, ?2, ?3)",
            params![group_id, constraint_id, position as i64],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_constraint_groups_by_ids(&self, group_ids: Vec<Uuid>) -> Result<Vec<ConstraintGroup>> {
    let ids: Vec<String> = group_ids.into_iter().map(encode_uuid).collect();

    let raws = self
      .conn
      .call(move |conn| {
        let mut group = conn.prepare("SELECT group_id, name FROM constraint_groups WHERE group_id = ?1")?;
        let mut members = conn.prepare(
          "SELECT constraint_id FROM constraint_group_members WHERE group_id = ?1 ORDER BY position",
        )?;

        let mut raws = Vec::new();
        for id in &ids {
          let found = group
            .query_row(params![id], |row| {
              Ok(RawGroup { group_id: row.get(0)?, name: row.get(1)?, constraint_ids: Vec::new() })
            })
            .optional()?;
          if let Some(mut raw) = found {
            raw.constraint_ids = members
              .query_map(params![id], |row| row.get(0))?
              .collect::<rusqlite::Result<Vec<String>>>()?;
            raws.push(raw);
          }
        }
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawGroup::into_group).collect()
  }

  async fn find_constraints_by_ids(
    &self,
    constraint_ids: Vec<Uuid>,
    active_only:    bool,
  ) -> Result<Vec<Constraint>> {
    let ids: Vec<String> = constraint_ids.into_iter().map(encode_uuid).collect();

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONSTRAINT_COLUMNS} FROM constraints
           WHERE constraint_id = ?1 AND (?2 = 0 OR active = 1)"
        ))?;
        let mut raws = Vec::new();
        for id in &ids {
          let found = stmt
            .query_row(params![id, active_only], |row| {
              Ok(RawConstraint {
                constraint_id: row.get(0)?,
                name:          row.get(1)?,
                description:   row.get(2)?,
                field_source:  row.get(3)?,
                field_key:     row.get(4)?,
                operator:      row.get(5)?,
                value_json:    row.get(6)?,
                required:      row.get(7)?,
                active:        row.get(8)?,
              })
            })
            .optional()?;
          raws.extend(found);
        }
        Ok(raws)
      })
      .await?;
    raws.into_iter().map(RawConstraint::into_constraint).collect()
  }

  async fn put_attribute_definition(&self, definition: AttributeDefinition) -> Result<()> {
    let attr_type = definition.attr_type.as_str();
    let options   = serde_json::to_string(&definition.options)?;
    let source    = encode_attribute_source(definition.source);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attribute_definitions (
             key, label, attr_type, options, user_editable, source, active
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(key) DO UPDATE SET
             label = excluded.label,
             attr_type = excluded.attr_type,
             options = excluded.options,
             user_editable = excluded.user_editable,
             source = excluded.source,
             active = excluded.active",
          params![
            definition.key,
            definition.label,
            attr_type,
            options,
            definition.user_editable,
            source,
            definition.active,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_attribute_definitions(&self) -> Result<Vec<AttributeDefinition>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT key, label, attr_type, options, user_editable, source, active
           FROM attribute_definitions ORDER BY key",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDefinition {
              key:           row.get(0)?,
              label:         row.get(1)?,
              attr_type:     row.get(2)?,
              options:       row.get(3)?,
              user_editable: row.get(4)?,
              source:        row.get(5)?,
              active:        row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawDefinition::into_definition).collect()
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn put_user(&self, user: User) -> Result<()> {
    let user_id    = encode_uuid(user.user_id);
    let role       = user.role.as_str();
    let created_at = encode_dt(user.created_at);
    let attributes = serde_json::to_string(&user.attributes)?;
    let history: Vec<(String, String, String)> = user
      .assignments
      .iter()
      .map(|a| (encode_uuid(a.job_id), a.meeting_title.clone(), encode_dt(a.assigned_at)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, name, email, role, created_at, attributes)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(user_id) DO UPDATE SET
             name = excluded.name,
             email = excluded.email,
             role = excluded.role,
             created_at = excluded.created_at,
             attributes = excluded.attributes",
          params![user_id, user.name, user.email, role, created_at, attributes],
        )?;
        for (job_id, title, assigned_at) in &history {
          tx.execute(
            "INSERT OR IGNORE INTO assignments (user_id, job_id, meeting_title, assigned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, job_id, title, assigned_at],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
    let id = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| Ok(query_users(conn, "WHERE user_id = ?1", params![id])?))
      .await?;
    raws.into_iter().next().map(RawUser::into_user).transpose()
  }

  async fn find_all_users(&self) -> Result<Vec<User>> {
    let raws = self
      .conn
      .call(|conn| Ok(query_users(conn, "ORDER BY created_at, user_id", [])?))
      .await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn get_user_assignment_history(&self, user_id: Uuid) -> Result<Vec<AssignmentRecord>> {
    let id = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| Ok(load_assignments(conn, &id)?))
      .await?;
    raws.into_iter().map(RawAssignment::into_record).collect()
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_system_setting(&self, key: String) -> Result<Option<SystemSetting>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT key, value_json, kind, description, updated_at
               FROM system_settings WHERE key = ?1",
              params![key],
              |row| {
                Ok(RawSetting {
                  key:         row.get(0)?,
                  value_json:  row.get(1)?,
                  kind:        row.get(2)?,
                  description: row.get(3)?,
                  updated_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSetting::into_setting).transpose()
  }

  async fn put_system_setting(&self, setting: SystemSetting) -> Result<()> {
    let value_json = serde_json::to_string(&setting.value)?;
    let kind       = setting.kind.as_str();
    let updated_at = encode_dt(setting.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO system_settings (key, value_json, kind, description, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(key) DO UPDATE SET
             value_json = excluded.value_json,
             kind = excluded.kind,
             description = excluded.description,
             updated_at = excluded.updated_at",
          params![setting.key, value_json, kind, setting.description, updated_at],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
