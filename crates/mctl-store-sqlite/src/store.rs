//! [`SqliteStore`], the SQLite implementation of [`SessionStore`] and
//! [`LaunchCatalogue`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use uuid::Uuid;

use mctl_core::{
  feed::{IssLiveFeed, LaunchFeedSchedule},
  log::{
    MilestoneStatus, MissionMilestone, MissionObjective, MissionUpdate, MissionWeather,
  },
  overlay::{VideoOverlay, VideoOverride},
  session::{MissionSession, SessionPatch},
  store::{LaunchCatalogue, SessionSeed, SessionStore, Superseded},
};

use crate::{
  Result,
  encode::{
    RawFeed, RawMilestone, RawOverlay, RawOverride, RawSchedule, RawSession, RawUpdate,
    RawWeather, SCHEDULE_COLUMNS, SESSION_COLUMNS, decode_uuid, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Mission Control store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread, so each method is atomic with
/// respect to every other.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
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

  async fn session_by_id(&self, session_id: Uuid) -> Result<Option<MissionSession>> {
    let id_str = encode_uuid(session_id);
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
              rusqlite::params![id_str],
              RawSession::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }
}

// ─── Row writers (run on the connection thread) ──────────────────────────────

fn insert_session(conn: &rusqlite::Connection, s: &MissionSession) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO sessions ({SESSION_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
    ),
    rusqlite::params![
      encode_uuid(s.session_id),
      s.mission_id,
      s.mission_name,
      s.agency,
      encode_dt(s.launch_date),
      s.status.to_string(),
      s.vehicle,
      s.payload,
      s.destination,
      s.launch_site,
      s.live_stream_url,
      s.mission_patch_url,
      s.is_live,
      s.iss_feed_enabled,
      encode_dt(s.created_at),
      encode_dt(s.updated_at),
      encode_dt(s.expires_at),
    ],
  )?;
  Ok(())
}

fn insert_milestone_row(
  conn: &rusqlite::Connection,
  m: &MissionMilestone,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO milestones (id, session_id, name, time_offset, status, description, sort_order)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      encode_uuid(m.id),
      encode_uuid(m.session_id),
      m.name,
      m.time_offset,
      m.status.to_string(),
      m.description,
      m.sort_order,
    ],
  )?;
  Ok(())
}

fn insert_objective_row(
  conn: &rusqlite::Connection,
  o: &MissionObjective,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO objectives (session_id, objective, sort_order) VALUES (?1, ?2, ?3)",
    rusqlite::params![encode_uuid(o.session_id), o.objective, o.sort_order],
  )?;
  Ok(())
}

/// `(column, value)` pairs for the fields present in `patch`.
fn patch_assignments(patch: &SessionPatch) -> Vec<(&'static str, Value)> {
  fn text(v: &Option<String>) -> Value {
    v.clone().map(Value::Text).unwrap_or(Value::Null)
  }

  let mut sets = Vec::new();
  if let Some(v) = &patch.mission_name {
    sets.push(("mission_name", Value::Text(v.clone())));
  }
  if let Some(v) = patch.launch_date {
    sets.push(("launch_date", Value::Text(encode_dt(v))));
  }
  if let Some(v) = patch.status {
    sets.push(("status", Value::Text(v.to_string())));
  }
  if let Some(v) = &patch.live_stream_url {
    sets.push(("live_stream_url", text(v)));
  }
  if let Some(v) = &patch.mission_patch_url {
    sets.push(("mission_patch_url", text(v)));
  }
  if let Some(v) = patch.is_live {
    sets.push(("is_live", Value::Integer(v.into())));
  }
  if let Some(v) = patch.iss_feed_enabled {
    sets.push(("iss_feed_enabled", Value::Integer(v.into())));
  }
  sets
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  type Error = crate::Error;

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn supersede_session(
    &self,
    session: MissionSession,
    seed: SessionSeed,
  ) -> Result<Superseded> {
    let session_id = session.session_id;
    let milestones: Vec<MissionMilestone> = seed
      .milestones
      .into_iter()
      .map(|m| m.into_milestone(session_id))
      .collect();
    let objectives: Vec<MissionObjective> = seed
      .objectives
      .into_iter()
      .zip(1..)
      .map(|(objective, sort_order)| MissionObjective {
        session_id,
        objective,
        sort_order,
      })
      .collect();

    let (row, ms, os) = (session.clone(), milestones.clone(), objectives.clone());
    let retired: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let retired: Option<String> = tx
          .query_row(
            "SELECT session_id FROM active_session WHERE slot = 1",
            [],
            |r| r.get(0),
          )
          .optional()?;
        if let Some(old) = &retired {
          tx.execute("DELETE FROM sessions WHERE session_id = ?1", rusqlite::params![old])?;
        }

        insert_session(&tx, &row)?;
        tx.execute(
          "INSERT INTO active_session (slot, session_id) VALUES (1, ?1)
           ON CONFLICT(slot) DO UPDATE SET session_id = excluded.session_id",
          rusqlite::params![encode_uuid(row.session_id)],
        )?;
        for m in &ms {
          insert_milestone_row(&tx, m)?;
        }
        for o in &os {
          insert_objective_row(&tx, o)?;
        }

        tx.commit()?;
        Ok(retired)
      })
      .await?;

    Ok(Superseded {
      session,
      retired: retired.as_deref().map(decode_uuid).transpose()?,
      milestones,
      objectives,
    })
  }

  async fn get_session(&self, session_id: Uuid) -> Result<Option<MissionSession>> {
    self.session_by_id(session_id).await
  }

  async fn active_session(&self, now: DateTime<Utc>) -> Result<Option<MissionSession>> {
    let now_str = encode_dt(now);
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions
                 WHERE session_id = (SELECT session_id FROM active_session WHERE slot = 1)
                   AND expires_at > ?1"
              ),
              rusqlite::params![now_str],
              RawSession::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn update_session(
    &self,
    session_id: Uuid,
    patch: SessionPatch,
    now: DateTime<Utc>,
  ) -> Result<Option<MissionSession>> {
    let mut sets = patch_assignments(&patch);
    sets.push(("updated_at", Value::Text(encode_dt(now))));

    let assignments = sets
      .iter()
      .enumerate()
      .map(|(i, (col, _))| format!("{col} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let id_idx = sets.len() + 1;
    let sql = format!(
      "UPDATE sessions SET {assignments}
       WHERE session_id = ?{id_idx} AND expires_at > ?{}",
      id_idx + 1
    );

    let mut values: Vec<Value> = sets.into_iter().map(|(_, v)| v).collect();
    let id_str = encode_uuid(session_id);
    values.push(Value::Text(id_str.clone()));
    values.push(Value::Text(encode_dt(now)));

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(
          conn
            .query_row(
              &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
              rusqlite::params![id_str],
              RawSession::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, session_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(session_id);
    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let n = tx.execute("DELETE FROM sessions WHERE session_id = ?1", rusqlite::params![id_str])?;
        tx.execute(
          "DELETE FROM active_session WHERE session_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;
    Ok(removed)
  }

  // ── Update log ────────────────────────────────────────────────────────────

  async fn insert_update(&self, update: MissionUpdate) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mission_updates (
             id, session_id, update_type, title, content, author, priority,
             is_public, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            encode_uuid(update.id),
            encode_uuid(update.session_id),
            update.update_type.to_string(),
            update.title,
            update.content,
            update.author,
            update.priority.to_string(),
            update.is_public,
            encode_dt(update.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_updates(&self, session_id: Uuid) -> Result<Vec<MissionUpdate>> {
    let id_str = encode_uuid(session_id);
    let raws: Vec<RawUpdate> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, session_id, update_type, title, content, author, priority,
                  is_public, created_at
           FROM mission_updates
           WHERE session_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawUpdate::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawUpdate::into_update).collect()
  }

  // ── Milestones ────────────────────────────────────────────────────────────

  async fn insert_milestone(&self, milestone: MissionMilestone) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        insert_milestone_row(conn, &milestone)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_milestones(&self, session_id: Uuid) -> Result<Vec<MissionMilestone>> {
    let id_str = encode_uuid(session_id);
    let raws: Vec<RawMilestone> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, session_id, name, time_offset, status, description, sort_order
           FROM milestones
           WHERE session_id = ?1
           ORDER BY sort_order ASC, rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMilestone::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMilestone::into_milestone).collect()
  }

  async fn set_milestone_status(
    &self,
    milestone_id: Uuid,
    status: MilestoneStatus,
  ) -> Result<Option<(MissionMilestone, bool)>> {
    let id_str     = encode_uuid(milestone_id);
    let status_str = status.to_string();

    let raw: Option<(RawMilestone, bool)> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE milestones SET status = ?2 WHERE id = ?1 AND status != ?2",
          rusqlite::params![id_str, status_str],
        )?;
        let row = conn
          .query_row(
            "SELECT id, session_id, name, time_offset, status, description, sort_order
             FROM milestones WHERE id = ?1",
            rusqlite::params![id_str],
            RawMilestone::from_row,
          )
          .optional()?;
        Ok(row.map(|r| (r, changed > 0)))
      })
      .await?;

    raw
      .map(|(r, changed)| r.into_milestone().map(|m| (m, changed)))
      .transpose()
  }

  // ── Weather ───────────────────────────────────────────────────────────────

  async fn insert_weather(&self, sample: MissionWeather) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO weather (
             id, session_id, temperature, wind_speed, wind_direction, visibility,
             humidity, conditions, go_no_go, source, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            encode_uuid(sample.id),
            encode_uuid(sample.session_id),
            sample.temperature,
            sample.wind_speed,
            sample.wind_direction,
            sample.visibility,
            sample.humidity,
            sample.conditions,
            sample.go_no_go.to_string(),
            sample.source,
            encode_dt(sample.recorded_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn latest_weather(&self, session_id: Uuid) -> Result<Option<MissionWeather>> {
    let id_str = encode_uuid(session_id);
    let raw: Option<RawWeather> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, session_id, temperature, wind_speed, wind_direction, visibility,
                      humidity, conditions, go_no_go, source, recorded_at
               FROM weather
               WHERE session_id = ?1
               ORDER BY recorded_at DESC, rowid DESC
               LIMIT 1",
              rusqlite::params![id_str],
              RawWeather::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawWeather::into_weather).transpose()
  }

  // ── Objectives ────────────────────────────────────────────────────────────

  async fn append_objective(
    &self,
    session_id: Uuid,
    objective: String,
  ) -> Result<MissionObjective> {
    let id_str = encode_uuid(session_id);
    let text   = objective.clone();

    let sort_order: i64 = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let next: i64 = tx.query_row(
          "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM objectives WHERE session_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO objectives (session_id, objective, sort_order) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, text, next],
        )?;
        tx.commit()?;
        Ok(next)
      })
      .await?;

    Ok(MissionObjective { session_id, objective, sort_order })
  }

  async fn list_objectives(&self, session_id: Uuid) -> Result<Vec<MissionObjective>> {
    let id_str = encode_uuid(session_id);
    let rows: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT objective, sort_order FROM objectives
           WHERE session_id = ?1 ORDER BY sort_order ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(
      rows
        .into_iter()
        .map(|(objective, sort_order)| MissionObjective { session_id, objective, sort_order })
        .collect(),
    )
  }

  // ── Single-slot video state ───────────────────────────────────────────────

  async fn put_overlay(&self, overlay: VideoOverlay) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO video_overlays (session_id, overlay_type, custom_text, is_active, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(session_id) DO UPDATE SET
             overlay_type = excluded.overlay_type,
             custom_text  = excluded.custom_text,
             is_active    = excluded.is_active,
             updated_at   = excluded.updated_at",
          rusqlite::params![
            encode_uuid(overlay.session_id),
            overlay.overlay.kind().to_string(),
            overlay.overlay.custom_text(),
            overlay.is_active,
            encode_dt(overlay.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_overlay(&self, session_id: Uuid) -> Result<Option<VideoOverlay>> {
    let id_str = encode_uuid(session_id);
    let raw: Option<RawOverlay> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT session_id, overlay_type, custom_text, is_active, updated_at
               FROM video_overlays WHERE session_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawOverlay {
                  session_id:   row.get(0)?,
                  overlay_type: row.get(1)?,
                  custom_text:  row.get(2)?,
                  is_active:    row.get(3)?,
                  updated_at:   row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawOverlay::into_overlay).transpose()
  }

  async fn put_video_override(&self, video_override: VideoOverride) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO video_overrides (session_id, url, is_active, updated_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(session_id) DO UPDATE SET
             url        = excluded.url,
             is_active  = excluded.is_active,
             updated_at = excluded.updated_at",
          rusqlite::params![
            encode_uuid(video_override.session_id),
            video_override.url,
            video_override.is_active,
            encode_dt(video_override.updated_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_video_override(&self, session_id: Uuid) -> Result<Option<VideoOverride>> {
    let id_str = encode_uuid(session_id);
    let raw: Option<RawOverride> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT session_id, url, is_active, updated_at
               FROM video_overrides WHERE session_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawOverride {
                  session_id: row.get(0)?,
                  url:        row.get(1)?,
                  is_active:  row.get(2)?,
                  updated_at: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawOverride::into_override).transpose()
  }
}

// ─── LaunchCatalogue impl ────────────────────────────────────────────────────

impl LaunchCatalogue for SqliteStore {
  type Error = crate::Error;

  async fn insert_feed(&self, feed: IssLiveFeed) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO iss_feeds (feed_id, title, youtube_url, embed_url, is_active, is_default, priority)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(feed.feed_id),
            feed.title,
            feed.youtube_url,
            feed.embed_url,
            feed.is_active,
            feed.is_default,
            feed.priority,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_feeds(&self) -> Result<Vec<IssLiveFeed>> {
    let raws: Vec<RawFeed> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT feed_id, title, youtube_url, embed_url, is_active, is_default, priority
           FROM iss_feeds ORDER BY priority DESC, title ASC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawFeed {
              feed_id:     row.get(0)?,
              title:       row.get(1)?,
              youtube_url: row.get(2)?,
              embed_url:   row.get(3)?,
              is_active:   row.get(4)?,
              is_default:  row.get(5)?,
              priority:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawFeed::into_feed).collect()
  }

  async fn upsert_schedule(&self, schedule: LaunchFeedSchedule) -> Result<LaunchFeedSchedule> {
    let raw: RawSchedule = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO launch_feed_schedules (
             launch_id, launch_name, launch_date, feed_url, feed_id,
             switch_time_minutes, is_switched
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT(launch_id) DO UPDATE SET
             launch_name         = excluded.launch_name,
             launch_date         = excluded.launch_date,
             feed_url            = excluded.feed_url,
             feed_id             = excluded.feed_id,
             switch_time_minutes = excluded.switch_time_minutes",
          rusqlite::params![
            schedule.launch_id,
            schedule.launch_name,
            encode_dt(schedule.launch_date),
            schedule.feed_url,
            schedule.feed_id.map(encode_uuid),
            schedule.switch_time_minutes,
            schedule.is_switched,
          ],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {SCHEDULE_COLUMNS} FROM launch_feed_schedules WHERE launch_id = ?1"),
          rusqlite::params![schedule.launch_id],
          RawSchedule::from_row,
        )?)
      })
      .await?;
    raw.into_schedule()
  }

  async fn list_schedules(&self) -> Result<Vec<LaunchFeedSchedule>> {
    let raws: Vec<RawSchedule> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SCHEDULE_COLUMNS} FROM launch_feed_schedules ORDER BY launch_date ASC"
        ))?;
        let rows = stmt
          .query_map([], RawSchedule::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSchedule::into_schedule).collect()
  }

  async fn mark_switched(&self, launch_id: String) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE launch_feed_schedules SET is_switched = 1 WHERE launch_id = ?1",
          rusqlite::params![launch_id],
        )?;
        Ok(n > 0)
      })
      .await?;
    Ok(found)
  }
}
