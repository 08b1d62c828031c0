use anyhow::{Context, Result, bail};
use carelog_core::{MonthProjection, for_today, recent_outcomes, time, upcoming};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod api;
mod calendar;
mod config;
mod dashboard;
#[cfg(test)]
mod fake_backend;
mod state;
mod take;

use api::{ApiClient, Source};

#[derive(Parser, Debug)]
#[command(
    name = "carelog",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARELOG_BUILD_SHA"), ")"),
    about = "Medication reminders for caregivers: calendar, today, mark as taken"
)]
struct Cli {
    /// Read instances from a JSON snapshot instead of the backend
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    /// Appointments JSON to show alongside a snapshot (with --file)
    #[arg(long, global = true)]
    appointments: Option<PathBuf>,

    /// Debug logging (overridden by CARELOG_LOG)
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Month grid with per-day counts, or one day hour by hour
    Calendar {
        #[arg(long)]
        year: i32,

        /// 1-12
        #[arg(long)]
        month: u32,

        /// Show this day's hourly view
        #[arg(long)]
        day: Option<u32>,
    },

    /// Today's doses, progress and the next one due
    Today,

    /// Next doses by scheduled time
    Upcoming {
        /// Default from config display.upcoming_limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Most recent doses with an outcome
    History {
        /// Default from config display.history_limit
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mark one dose as taken
    Take {
        #[arg(long)]
        id: i64,
    },

    /// Mark every open dose of today as taken
    TakeAll,

    /// Manage ~/.carelog/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("CARELOG_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Everything a data command needs: config-derived context plus the source.
struct Ctx {
    cfg: config::Config,
    tz: chrono_tz::Tz,
    normalizer: carelog_core::Normalizer,
    now: chrono::NaiveDateTime,
    source: Source,
}

impl Ctx {
    fn load(file: Option<PathBuf>, appointments: Option<PathBuf>) -> Result<Self> {
        let cfg = config::load_config()?;
        let tz = cfg.timezone()?;
        let normalizer = cfg.normalizer()?;
        let now = time::local_now(Utc::now(), tz);

        let source = match file {
            Some(instances) => {
                if !instances.exists() {
                    bail!("snapshot not found: {}", instances.display());
                }
                Source::File {
                    instances,
                    appointments,
                }
            }
            None => Source::Api(ApiClient::new(&cfg.api)),
        };
        tracing::debug!(?source, %now, "starting");

        Ok(Self {
            cfg,
            tz,
            normalizer,
            now,
            source,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        file,
        appointments,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    match command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Calendar { year, month, day } => {
            if !(1..=12).contains(&month) {
                bail!("--month must be 1..=12, got {month}");
            }
            let ctx = Ctx::load(file, appointments)?;
            let raws = ctx
                .source
                .month(year, month)
                .await
                .with_context(|| format!("loading {year}-{month:02}"))?;
            let instances = ctx.normalizer.normalize_all(&raws).instances;
            let mut projection = MonthProjection::project(&instances, year, month)?;

            match ctx.source.appointments().await {
                Ok(appts) => {
                    projection.add_appointments(&appts, ctx.tz);
                }
                Err(err) => tracing::warn!("appointments unavailable: {err:#}"),
            }

            match day {
                Some(d) => {
                    projection.checked_day_summary(d)?;
                    print!("{}", calendar::render_day(&projection, d));
                }
                None => print!("{}", calendar::render_month(&projection)),
            }
        }

        Command::Today => {
            let ctx = Ctx::load(file, appointments)?;
            let raws = ctx.source.today().await.context("loading today's doses")?;
            let today = for_today(&ctx.normalizer.normalize_all(&raws).instances, ctx.now);
            print!("{}", dashboard::render_today(&today, ctx.now));
        }

        Command::Upcoming { limit } => {
            let ctx = Ctx::load(file, appointments)?;
            let limit = limit.unwrap_or(ctx.cfg.display.upcoming_limit);
            let raws = ctx.source.all().await.context("loading doses")?;
            let future: Vec<_> = ctx
                .normalizer
                .normalize_all(&raws)
                .instances
                .into_iter()
                .filter(|i| i.scheduled_datetime >= ctx.now)
                .collect();
            print!(
                "{}",
                dashboard::render_list("Próximas dosis", &upcoming(&future, limit))
            );
        }

        Command::History { limit } => {
            let ctx = Ctx::load(file, appointments)?;
            let limit = limit.unwrap_or(ctx.cfg.display.history_limit);
            let raws = ctx.source.all().await.context("loading doses")?;
            let mut instances = ctx.normalizer.normalize_all(&raws).instances;
            instances.sort_by_key(|i| i.scheduled_datetime);
            print!(
                "{}",
                dashboard::render_list("Historial", &recent_outcomes(&instances, limit))
            );
        }

        Command::Take { id } => {
            let ctx = Ctx::load(file, appointments)?;
            take::run(&ctx.source, &ctx.normalizer, take::Target::One(id), ctx.now).await?;
        }

        Command::TakeAll => {
            let ctx = Ctx::load(file, appointments)?;
            take::run(&ctx.source, &ctx.normalizer, take::Target::AllToday, ctx.now).await?;
        }
    }

    Ok(())
}
