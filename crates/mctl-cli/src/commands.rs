//! One-shot operator commands. Each maps onto a single API mutation (or a
//! short sequence of them) against the active session.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use mctl_core::{
  feed::{NewFeed, NewSchedule},
  log::{GoNoGo, MilestoneStatus, NewMilestone, NewUpdate, NewWeather, Priority, UpdateType},
  overlay::OverlayKind,
  session::{MissionStatus, NewSession, SessionPatch},
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{catalogue::CatalogueClient, client::ApiClient};

// ─── Arguments ────────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Live dashboard (the default).
  Watch,

  /// Manage the active session.
  #[command(subcommand)]
  Session(SessionCommand),

  /// Post an update to the mission log.
  Update(UpdateArgs),

  /// Add milestones or change their status.
  #[command(subcommand)]
  Milestone(MilestoneCommand),

  /// Record a weather sample.
  Weather(WeatherArgs),

  /// Append a mission objective.
  Objective {
    text: String,
  },

  /// Show an overlay over the video (`none` hides it).
  Overlay {
    kind: OverlayKind,
    /// Banner text, required for `custom`.
    #[arg(long)]
    text: Option<String>,
  },

  /// Force the video source, or hand it back to automatic selection.
  #[command(subcommand)]
  Override(OverrideCommand),

  /// ISS live feed catalogue.
  #[command(subcommand)]
  Feed(FeedCommand),

  /// Launch feed-switch schedule.
  #[command(subcommand)]
  Schedule(ScheduleCommand),

  /// List upcoming launches from the launch catalogue.
  Launches {
    #[arg(long, default_value_t = 10)]
    limit: u32,
  },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
  /// Print the active session.
  Show,

  /// Start a new session, replacing the active one.
  Create(CreateArgs),

  /// Start the always-on ISS broadcast session.
  Iss,

  /// Start a session for a launch from the catalogue.
  Select {
    launch_id: String,
    /// Also schedule the launch stream this many minutes before liftoff.
    #[arg(long, default_value_t = 30)]
    switch_minutes: i64,
    /// Do not register a feed-switch schedule entry.
    #[arg(long)]
    no_schedule: bool,
  },

  /// Change fields of the active session.
  Update(PatchArgs),

  /// End the active session.
  Delete,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
  mission_id:   String,
  name:         String,
  /// Launch time (RFC 3339).
  #[arg(long)]
  launch:       DateTime<Utc>,
  #[arg(long, default_value = "scheduled")]
  status:       MissionStatus,
  #[arg(long, default_value = "")]
  agency:       String,
  #[arg(long, default_value = "")]
  vehicle:      String,
  #[arg(long, default_value = "")]
  payload:      String,
  #[arg(long, default_value = "")]
  destination:  String,
  #[arg(long, default_value = "")]
  site:         String,
  #[arg(long)]
  stream:       Option<String>,
  #[arg(long)]
  patch:        Option<String>,
  /// Never fall back to the ISS feed for this mission.
  #[arg(long)]
  no_iss_feed:  bool,
  /// Repeat for each objective.
  #[arg(long = "objective")]
  objectives:   Vec<String>,
}

#[derive(Args, Debug)]
pub struct PatchArgs {
  #[arg(long)]
  name:         Option<String>,
  #[arg(long)]
  launch:       Option<DateTime<Utc>>,
  #[arg(long)]
  status:       Option<MissionStatus>,
  #[arg(long, conflicts_with = "clear_stream")]
  stream:       Option<String>,
  #[arg(long)]
  clear_stream: bool,
  #[arg(long)]
  live:         Option<bool>,
  #[arg(long)]
  iss_feed:     Option<bool>,
}

impl PatchArgs {
  fn into_patch(self) -> SessionPatch {
    SessionPatch {
      mission_name: self.name,
      launch_date: self.launch,
      status: self.status,
      live_stream_url: if self.clear_stream { Some(None) } else { self.stream.map(Some) },
      mission_patch_url: None,
      is_live: self.live,
      iss_feed_enabled: self.iss_feed,
    }
  }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
  title:    String,
  content:  String,
  #[arg(long, default_value = "Mission Control")]
  author:   String,
  #[arg(long = "type", default_value = "general")]
  kind:     UpdateType,
  #[arg(long, default_value = "normal")]
  priority: Priority,
  /// Hide from public viewers.
  #[arg(long)]
  private:  bool,
}

#[derive(Subcommand, Debug)]
pub enum MilestoneCommand {
  Add {
    name:        String,
    /// Offset from liftoff, e.g. `T+00:02:30`.
    time_offset: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Defaults to after the last milestone.
    #[arg(long)]
    order:       Option<i64>,
  },
  Set {
    milestone_id: Uuid,
    status:       MilestoneStatus,
  },
}

#[derive(Args, Debug)]
pub struct WeatherArgs {
  go_no_go:       GoNoGo,
  #[arg(long)]
  temperature:    f64,
  #[arg(long)]
  wind_speed:     f64,
  #[arg(long, default_value = "")]
  wind_direction: String,
  #[arg(long)]
  visibility:     f64,
  #[arg(long)]
  humidity:       f64,
  #[arg(long, default_value = "")]
  conditions:     String,
  #[arg(long, default_value = "operator")]
  source:         String,
}

#[derive(Subcommand, Debug)]
pub enum OverrideCommand {
  Set { url: String },
  Clear,
}

#[derive(Subcommand, Debug)]
pub enum FeedCommand {
  List,
  Add {
    title:     String,
    embed_url: String,
    #[arg(long)]
    youtube:   Option<String>,
    #[arg(long)]
    default:   bool,
    #[arg(long, default_value_t = 0)]
    priority:  i64,
  },
  /// Show the feed the server resolves right now.
  Current,
}

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
  List,
  Add {
    launch_id:   String,
    launch_name: String,
    #[arg(long)]
    launch:      DateTime<Utc>,
    #[arg(long)]
    url:         Option<String>,
    #[arg(long)]
    feed:        Option<Uuid>,
    #[arg(long, default_value_t = 30)]
    switch_minutes: i64,
  },
}

// ─── Execution ────────────────────────────────────────────────────────────────

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

async fn active_session_id(client: &ApiClient) -> Result<Uuid> {
  match client.active_session().await? {
    Some(session) => Ok(session.session_id),
    None => bail!("no active session"),
  }
}

pub async fn run(command: Command, client: &ApiClient, catalogue: &CatalogueClient) -> Result<()> {
  match command {
    Command::Watch => bail!("watch is handled by the dashboard"),
    Command::Session(cmd) => run_session(cmd, client, catalogue).await,

    Command::Update(args) => {
      let id = active_session_id(client).await?;
      let update = NewUpdate {
        update_type: args.kind,
        title:       args.title,
        content:     args.content,
        author:      args.author,
        priority:    args.priority,
        is_public:   !args.private,
      };
      print_json(&client.add_update(id, &update).await?)
    }

    Command::Milestone(MilestoneCommand::Add { name, time_offset, description, order }) => {
      let id = active_session_id(client).await?;
      let sort_order = match order {
        Some(order) => order,
        None => {
          let existing = client.milestones(id).await?;
          existing.iter().map(|m| m.sort_order).max().unwrap_or(0) + 1
        }
      };
      let milestone = NewMilestone {
        name,
        time_offset,
        status: MilestoneStatus::Upcoming,
        description,
        sort_order,
      };
      print_json(&client.add_milestone(id, &milestone).await?)
    }
    Command::Milestone(MilestoneCommand::Set { milestone_id, status }) => {
      print_json(&client.set_milestone_status(milestone_id, status).await?)
    }

    Command::Weather(args) => {
      let id = active_session_id(client).await?;
      let sample = NewWeather {
        temperature:    args.temperature,
        wind_speed:     args.wind_speed,
        wind_direction: args.wind_direction,
        visibility:     args.visibility,
        humidity:       args.humidity,
        conditions:     args.conditions,
        go_no_go:       args.go_no_go,
        source:         args.source,
        recorded_at:    None,
      };
      print_json(&client.add_weather(id, &sample).await?)
    }

    Command::Objective { text } => {
      let id = active_session_id(client).await?;
      print_json(&client.add_objective(id, &text).await?)
    }

    Command::Overlay { kind, text } => {
      let id = active_session_id(client).await?;
      print_json(&client.set_overlay(id, kind, text.as_deref()).await?)
    }

    Command::Override(OverrideCommand::Set { url }) => {
      let id = active_session_id(client).await?;
      print_json(&client.set_video_override(id, Some(&url), true).await?)
    }
    Command::Override(OverrideCommand::Clear) => {
      let id = active_session_id(client).await?;
      print_json(&client.set_video_override(id, None, false).await?)
    }

    Command::Feed(FeedCommand::List) => print_json(&client.feeds().await?),
    Command::Feed(FeedCommand::Current) => print_json(&client.current_feed().await?),
    Command::Feed(FeedCommand::Add { title, embed_url, youtube, default, priority }) => {
      let feed = NewFeed {
        title,
        youtube_url: youtube,
        embed_url,
        is_active: true,
        is_default: default,
        priority,
      };
      print_json(&client.add_feed(&feed).await?)
    }

    Command::Schedule(ScheduleCommand::List) => print_json(&client.schedules().await?),
    Command::Schedule(ScheduleCommand::Add {
      launch_id,
      launch_name,
      launch,
      url,
      feed,
      switch_minutes,
    }) => {
      let schedule = NewSchedule {
        launch_id,
        launch_name,
        launch_date: launch,
        feed_url: url,
        feed_id: feed,
        switch_time_minutes: switch_minutes,
      };
      print_json(&client.add_schedule(&schedule).await?)
    }

    Command::Launches { limit } => {
      for launch in catalogue.upcoming(limit).await? {
        println!(
          "{}  {}  {:<5} {}  ({})",
          launch.id,
          launch.net.format("%Y-%m-%d %H:%M UTC"),
          launch.status_abbrev(),
          launch.name,
          launch.provider(),
        );
      }
      Ok(())
    }
  }
}

async fn run_session(
  cmd: SessionCommand,
  client: &ApiClient,
  catalogue: &CatalogueClient,
) -> Result<()> {
  match cmd {
    SessionCommand::Show => match client.active_session().await? {
      Some(session) => print_json(&session),
      None => {
        println!("no active session");
        Ok(())
      }
    },

    SessionCommand::Create(args) => {
      let spec = NewSession {
        mission_id:        args.mission_id,
        mission_name:      args.name,
        agency:            args.agency,
        launch_date:       args.launch,
        status:            args.status,
        vehicle:           args.vehicle,
        payload:           args.payload,
        destination:       args.destination,
        launch_site:       args.site,
        live_stream_url:   args.stream,
        mission_patch_url: args.patch,
        iss_feed_enabled:  !args.no_iss_feed,
        milestones:        None,
        objectives:        args.objectives,
      };
      print_json(&client.create_session(&spec).await?)
    }

    SessionCommand::Iss => {
      print_json(&client.create_session(&NewSession::iss_broadcast(Utc::now())).await?)
    }

    SessionCommand::Select { launch_id, switch_minutes, no_schedule } => {
      let launch = catalogue.launch(&launch_id).await?;
      let schedule = (!no_schedule)
        .then(|| launch.schedule(switch_minutes))
        .flatten();
      let session = client.create_session(&launch.into_new_session()).await?;
      info!(session_id = %session.session_id, %launch_id, "session created from catalogue");
      if let Some(schedule) = schedule {
        client.add_schedule(&schedule).await?;
      }
      print_json(&session)
    }

    SessionCommand::Update(args) => {
      let patch = args.into_patch();
      if patch.is_empty() {
        bail!("nothing to update");
      }
      let id = active_session_id(client).await?;
      print_json(&client.update_session(id, &patch).await?)
    }

    SessionCommand::Delete => {
      let id = active_session_id(client).await?;
      client.delete_session(id).await?;
      println!("session {id} ended");
      Ok(())
    }
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  #[derive(Parser)]
  struct Cli {
    #[command(subcommand)]
    command: Command,
  }

  fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("mctl").chain(args.iter().copied()))
      .unwrap()
      .command
  }

  #[test]
  fn parses_wire_spellings() {
    match parse(&["weather", "NO-GO", "--temperature", "12", "--wind-speed", "30",
      "--visibility", "2", "--humidity", "90"])
    {
      Command::Weather(args) => assert_eq!(args.go_no_go, GoNoGo::NoGo),
      other => panic!("unexpected {other:?}"),
    }
    match parse(&["overlay", "technical-difficulties"]) {
      Command::Overlay { kind, text } => {
        assert_eq!(kind, OverlayKind::TechnicalDifficulties);
        assert!(text.is_none());
      }
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn clear_stream_patches_to_null() {
    let Command::Session(SessionCommand::Update(args)) =
      parse(&["session", "update", "--clear-stream", "--status", "live"])
    else {
      panic!("expected session update");
    };
    let patch = args.into_patch();
    assert_eq!(patch.live_stream_url, Some(None));
    assert_eq!(patch.status, Some(MissionStatus::Live));
    assert!(patch.mission_name.is_none());
  }

  #[test]
  fn stream_and_clear_conflict() {
    let parsed = Cli::try_parse_from([
      "mctl", "session", "update", "--stream", "https://x", "--clear-stream",
    ]);
    assert!(parsed.is_err());
  }

  #[test]
  fn create_collects_objectives() {
    let Command::Session(SessionCommand::Create(args)) = parse(&[
      "session", "create", "artemis-2", "Artemis II",
      "--launch", "2026-11-20T12:00:00Z",
      "--objective", "Crewed lunar flyby",
      "--objective", "Test Orion life support",
    ]) else {
      panic!("expected session create");
    };
    assert_eq!(args.objectives.len(), 2);
    assert_eq!(args.status, MissionStatus::Scheduled);
  }
}
