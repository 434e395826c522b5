//! duet - dialogue reconstruction command-line tool
//!
//! `duet transcribe` diarizes a recording into a caption handoff document.
//! `duet generate` rebuilds the dialogue from captions, replaying original
//! audio for some speakers and synthesizing speech for others.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use duet_common::config::{resolve_output_folder, OUTPUT_FOLDER_ENV};
use duet_common::{FadeCurve, SpeakerRoster};
use duet_mixer::config::TomlConfig;
use duet_mixer::pipeline::{load_captions, GenerateRequest, Generator};
use duet_mixer::providers::{AzureSynthesizer, DeepgramTranscriber, SpeechSynthesizer};
use duet_mixer::transcribe::{self, TranscribeOptions};

/// Command-line arguments for duet
#[derive(Parser, Debug)]
#[command(name = "duet")]
#[command(about = "Rebuild two-speaker dialogue from original and synthesized speech")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.config/duet/config.toml)
    #[arg(short, long, global = true, env = "DUET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diarize a recording into captions.xml
    Transcribe(TranscribeArgs),
    /// Assemble speaker tracks, stereo mix and subtitles from captions
    Generate(GenerateArgs),
}

#[derive(ClapArgs, Debug)]
struct TranscribeArgs {
    /// Recording to transcribe
    #[arg(short, long)]
    input: PathBuf,

    /// Output folder (default: $DUET_OUTPUT_FOLDER, then config file)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Also write per-speaker stems of the original recording
    #[arg(long)]
    export_stems: bool,

    /// Deepgram API key
    #[arg(long, env = "DEEPGRAM_API_KEY", hide_env_values = true)]
    deepgram_key: Option<String>,

    /// Overall deadline in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[derive(ClapArgs, Debug)]
struct GenerateArgs {
    /// Caption handoff document
    #[arg(long)]
    captions: PathBuf,

    /// Original recording (required unless both speakers are re-voiced)
    #[arg(long)]
    recording: Option<PathBuf>,

    /// Output folder (default: $DUET_OUTPUT_FOLDER, then config file)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Subtitle name of speaker0
    #[arg(long)]
    speaker0_name: Option<String>,

    /// Subtitle name of speaker1
    #[arg(long)]
    speaker1_name: Option<String>,

    /// Synthesis voice for speaker0 (omit to keep original audio)
    #[arg(long)]
    speaker0_voice: Option<String>,

    /// Synthesis voice for speaker1 (omit to keep original audio)
    #[arg(long)]
    speaker1_voice: Option<String>,

    /// Gain curve of edge fades and crossfades (linear, s_curve, equal_power)
    #[arg(long)]
    fade_curve: Option<FadeCurve>,

    /// Azure speech key
    #[arg(long, env = "AZURE_SPEECH_KEY", hide_env_values = true)]
    azure_key: Option<String>,

    /// Azure speech region
    #[arg(long, env = "AZURE_SPEECH_REGION")]
    azure_region: Option<String>,

    /// Overall deadline in seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TomlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "duet_mixer={level},duet_common={level},duet={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting duet v{}", env!("CARGO_PKG_VERSION"));

    let cancel_token = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel_token.clone()));

    let outcome = match cli.command {
        Command::Transcribe(args) => run_transcribe(args, config, &cancel_token).await,
        Command::Generate(args) => run_generate(args, config, &cancel_token).await,
    };

    match outcome {
        Ok(()) => Ok(()),
        Err(Failure::Operation(e)) => {
            error!("{}: {}", e.tag(), e);
            println!("{}", e.to_json());
            std::process::exit(1);
        }
        Err(Failure::Setup(e)) => Err(e),
    }
}

/// Operation failures are reported as tagged JSON; setup failures through anyhow
enum Failure {
    Operation(duet_mixer::Error),
    Setup(anyhow::Error),
}

impl From<duet_mixer::Error> for Failure {
    fn from(err: duet_mixer::Error) -> Self {
        Failure::Operation(err)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Setup(err)
    }
}

async fn run_transcribe(
    args: TranscribeArgs,
    mut config: TomlConfig,
    cancel_token: &CancellationToken,
) -> std::result::Result<(), Failure> {
    if args.deepgram_key.is_some() {
        config.deepgram.api_key = args.deepgram_key;
    }
    let transcriber = DeepgramTranscriber::new(&config.deepgram)?;

    let out_dir = resolve_output_folder(
        args.out.as_deref(),
        OUTPUT_FOLDER_ENV,
        config.output_folder.as_deref(),
    );

    let options = TranscribeOptions {
        export_stems: args.export_stems,
        sample_format: config.mix.sample_format,
        normalize_ceiling: config.mix.normalize_ceiling,
        deadline: args
            .deadline_secs
            .map(std::time::Duration::from_secs)
            .or_else(|| config.mix.deadline()),
    };

    let report = transcribe::transcribe(
        &args.input,
        &out_dir,
        Arc::new(transcriber),
        &options,
        cancel_token,
    )
    .await?;

    info!(
        "Transcribed {} captions from {} speakers",
        report.captions.len(),
        report.captions.speakers().len()
    );
    for file in &report.files {
        println!("{}", file.display());
    }
    Ok(())
}

async fn run_generate(
    args: GenerateArgs,
    mut config: TomlConfig,
    cancel_token: &CancellationToken,
) -> std::result::Result<(), Failure> {
    let captions = load_captions(&args.captions)?;

    let roster = SpeakerRoster::new()
        .with_name("speaker0", args.speaker0_name.as_deref())
        .with_name("speaker1", args.speaker1_name.as_deref())
        .with_voice("speaker0", args.speaker0_voice.as_deref())
        .with_voice("speaker1", args.speaker1_voice.as_deref());

    if args.azure_key.is_some() {
        config.azure.key = args.azure_key;
    }
    if args.azure_region.is_some() {
        config.azure.region = args.azure_region;
    }
    if args.deadline_secs.is_some() {
        config.mix.deadline_secs = args.deadline_secs;
    }
    if let Some(curve) = args.fade_curve {
        config.mix.fade_curve = curve;
    }

    let needs_synthesis = roster
        .speakers()
        .iter()
        .any(|speaker| roster.voice_for(speaker).is_some());
    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = if needs_synthesis {
        Some(Arc::new(AzureSynthesizer::new(&config.azure)?))
    } else {
        None
    };

    let out_dir = resolve_output_folder(
        args.out.as_deref(),
        OUTPUT_FOLDER_ENV,
        config.output_folder.as_deref(),
    );

    let generator = Generator::new(config.mix, synthesizer);
    let report = generator
        .generate(
            GenerateRequest {
                captions,
                recording: args.recording,
                roster,
                out_dir,
            },
            cancel_token,
        )
        .await?;

    info!(
        "Generated {} samples at {}Hz ({} original, {} synthesized segments)",
        report.timeline_samples, report.sample_rate, report.extracted, report.synthesized
    );
    for file in &report.files {
        println!("{}", file.display());
    }
    Ok(())
}

/// Cancel the running operation on Ctrl+C
async fn cancel_on_ctrl_c(cancel_token: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Ctrl+C received, cancelling");
            cancel_token.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
