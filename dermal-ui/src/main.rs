//! dermal-ui - Guided analysis flow client
//!
//! Walks the intake quiz, optional face photo, live analysis stream, report
//! preview, and payment against a running dermal-ai service. Stage data is
//! kept in a session file so each subcommand can pick up where the last
//! one left off.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dermal_common::config::TomlConfig;
use dermal_common::payment::{to_subcurrency, FULL_REPORT_AMOUNT, FULL_REPORT_PLAN};
use dermal_common::quiz::{QuizMetric, QUIZ_METRICS};
use dermal_common::{FallbackPolicy, QuizAnswers};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dermal_ui::config::{ClientConfig, DEFAULT_LOG_FILTER, PAYMENT_TIMEOUT};
use dermal_ui::{capture, render};
use dermal_ui::{AnalysisConsumer, HttpTransport, JsonFileStore, PaymentClient, Session};

/// Command-line arguments for dermal-ui
#[derive(Parser, Debug)]
#[command(name = "dermal-ui")]
#[command(about = "Guided dermal analysis client")]
#[command(version)]
struct Args {
    /// Analysis service base URL
    #[arg(long, env = "DERMAL_SERVER_URL")]
    server: Option<String>,

    /// Session file shared between subcommands
    #[arg(long, env = "DERMAL_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Path to config.toml (defaults to the platform config location)
    #[arg(short, long, env = "DERMAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the intake questions and their options
    Questions,

    /// Answer the quiz, optionally attach a photo, and run the analysis
    Analyze {
        /// Answer to step 1 (option text or 1-based number)
        #[arg(long)]
        genetic: Option<String>,

        /// Answer to step 2 (option text or 1-based number)
        #[arg(long)]
        exposure: Option<String>,

        /// Answer to step 3 (option text or 1-based number)
        #[arg(long)]
        waking: Option<String>,

        /// Face photo to analyze
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Show the stored report
    Report {
        /// Show the full, printable report
        #[arg(long)]
        full: bool,
    },

    /// Create a payment intent for the full report and show it
    Checkout {
        /// Amount in dollars
        #[arg(long, default_value_t = FULL_REPORT_AMOUNT)]
        amount: f64,

        /// Plan name
        #[arg(long, default_value = FULL_REPORT_PLAN)]
        plan: String,
    },

    /// Discard the stored session
    Reset,
}

/// Accept an option by exact text (case-insensitive) or 1-based index
fn pick_option(metric: &QuizMetric, answer: Option<String>) -> Result<Option<String>> {
    let Some(answer) = answer else {
        return Ok(None);
    };
    if let Ok(index) = answer.trim().parse::<usize>() {
        return metric
            .options
            .get(index.wrapping_sub(1))
            .map(|option| Some(option.to_string()))
            .ok_or_else(|| anyhow!("Step {} has no option {}", metric.step, index));
    }
    metric
        .options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(answer.trim()))
        .map(|option| Some(option.to_string()))
        .ok_or_else(|| anyhow!("\"{}\" is not an option for step {}", answer, metric.step))
}

async fn run_analysis(config: &ClientConfig, session: Session) -> Result<()> {
    let transport = HttpTransport::new(config.server_url.clone())
        .context("Failed to initialize HTTP transport")?;
    let consumer = Arc::new(AnalysisConsumer::new(
        Arc::new(transport),
        session.clone(),
        FallbackPolicy::standard(),
    ));

    // Print log lines as they arrive
    let mut views = consumer.subscribe();
    let printer = tokio::spawn(async move {
        let mut printed = 0;
        let mut last_progress = 0;
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            for line in &view.log_lines[printed..] {
                println!("{}", render::render_log_line(line));
            }
            printed = view.log_lines.len();
            if view.progress != last_progress && view.progress % 20 == 0 {
                println!("{}", render::render_progress(&view));
            }
            last_progress = view.progress;
        }
    });

    let outcome = consumer
        .start()
        .await
        .ok_or_else(|| anyhow!("Analysis already started"))?;
    drop(consumer);
    if let Err(e) = printer.await {
        warn!("Log printer stopped: {}", e);
    }

    println!("{}", render::render_progress(&outcome.view));
    println!();
    print!("{}", render::render_preview(&outcome.report));
    Ok(())
}

async fn checkout(config: &ClientConfig, session: &Session, amount: f64, plan: &str) -> Result<()> {
    let report = session
        .report()
        .ok_or_else(|| anyhow!("No report yet; run `dermal-ui analyze` first"))?;
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Invalid payment details: amount must be positive");
    }

    let payments = PaymentClient::new(config.server_url.clone(), PAYMENT_TIMEOUT)
        .context("Failed to initialize payment client")?;
    let client_secret = payments
        .create_payment_intent(to_subcurrency(amount))
        .await
        .context("Failed to load checkout")?;
    info!(plan, amount, "Checkout ready");

    println!("Client secret: {}", client_secret);
    println!();
    print!("{}", render::render_full(&report, Some(plan), Some(amount)));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    let default_filter = toml_config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::resolve(args.server, args.session_file, &toml_config);
    let store = JsonFileStore::open(&config.session_file)
        .with_context(|| format!("Failed to open session {}", config.session_file.display()))?;
    let session = Session::new(Arc::new(store));

    match args.command {
        Command::Questions => {
            for metric in &QUIZ_METRICS {
                println!("{}", render::render_question(metric));
            }
        }
        Command::Analyze {
            genetic,
            exposure,
            waking,
            image,
        } => {
            let quiz = QuizAnswers {
                genetic_aging_pattern: pick_option(&QUIZ_METRICS[0], genetic)?,
                environmental_exposure: pick_option(&QUIZ_METRICS[1], exposure)?,
                skin_state_on_waking: pick_option(&QUIZ_METRICS[2], waking)?,
            };
            session.clear().context("Failed to reset session")?;
            session.save_quiz(&quiz).context("Failed to store quiz")?;
            if let Some(path) = image {
                let data_url = capture::load_image(&path)?;
                session.save_image(&data_url).context("Failed to store image")?;
            }
            run_analysis(&config, session).await?;
        }
        Command::Report { full } => {
            let report = session
                .report()
                .ok_or_else(|| anyhow!("No report yet; run `dermal-ui analyze` first"))?;
            if full {
                print!("{}", render::render_full(&report, None, None));
            } else {
                print!("{}", render::render_preview(&report));
            }
        }
        Command::Checkout { amount, plan } => {
            checkout(&config, &session, amount, &plan).await?;
        }
        Command::Reset => {
            session.clear().context("Failed to reset session")?;
            println!("Session cleared");
        }
    }

    Ok(())
}
