use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use vidfeatures::{
    AnalysisOptions, CutEvent, DEFAULT_CUT_THRESHOLD, DEFAULT_DETECTOR_BATCH_SIZE,
    DEFAULT_OCR_MIN_CONFIDENCE, DEFAULT_PRIMARY_CLASS_ID, DEFAULT_SAMPLE_RATE, FeatureExtractor,
    FfmpegLogLevel, ProcessDetector, ProcessRecognizer, ProgressCallback, ProgressInfo, Stage,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidfeatures probe input.mp4 --json\n  vidfeatures cuts input.mp4 --sample-rate 5 --threshold 30 --events\n  vidfeatures analyze input.mp4 --detector-cmd python --detector-arg detect.py --ocr-cmd tesseract-json --progress\n  vidfeatures completions zsh > _vidfeatures";

#[derive(Debug, Parser)]
#[command(
    name = "vidfeatures",
    version,
    about = "Extract shot cuts, text presence and object dominance from videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging from the analysis pipeline.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar for each pipeline stage.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing report file.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print video properties.
    #[command(about = "Print video properties", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,

        /// Output properties as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Sample frames and count hard cuts.
    #[command(
        about = "Count hard cuts",
        after_help = "Examples:\n  vidfeatures cuts input.mp4\n  vidfeatures cuts input.mp4 --sample-rate 1 --threshold 40 --json --events"
    )]
    Cuts {
        /// Input video path.
        input: PathBuf,
        /// Keep every Nth frame.
        #[arg(long, short = 's', default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u64,
        /// Dissimilarity score above which a cut is counted.
        #[arg(long, default_value_t = DEFAULT_CUT_THRESHOLD)]
        threshold: f64,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// List every detected cut.
        #[arg(long)]
        events: bool,
    },

    /// Run the full feature extraction and write a JSON report.
    #[command(
        about = "Extract the full feature report",
        after_help = "The detector command receives PNG paths and prints [[class_id, ..], ..].\nThe OCR command receives one PNG path and prints [{\"text\": .., \"confidence\": ..}] or {\"skipped\": reason}.\nPass one --detector-arg / --ocr-arg per argument; each is handed over verbatim, spaces included."
    )]
    Analyze {
        /// Input video path.
        input: PathBuf,
        /// Object detector program.
        #[arg(long)]
        detector_cmd: OsString,
        /// Argument passed to the detector ahead of the frame paths (repeatable).
        #[arg(long = "detector-arg", allow_hyphen_values = true)]
        detector_args: Vec<OsString>,
        /// OCR program.
        #[arg(long)]
        ocr_cmd: OsString,
        /// Argument passed to the OCR program ahead of the frame path (repeatable).
        #[arg(long = "ocr-arg", allow_hyphen_values = true)]
        ocr_args: Vec<OsString>,
        /// Keep every Nth frame.
        #[arg(long, short = 's', default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u64,
        /// Dissimilarity score above which a cut is counted.
        #[arg(long, default_value_t = DEFAULT_CUT_THRESHOLD)]
        threshold: f64,
        /// Minimum OCR confidence for a frame to count as text-bearing.
        #[arg(long, default_value_t = DEFAULT_OCR_MIN_CONFIDENCE)]
        min_confidence: f64,
        /// Frames per detector invocation.
        #[arg(long, default_value_t = DEFAULT_DETECTOR_BATCH_SIZE)]
        batch_size: usize,
        /// Class id counted as "person".
        #[arg(long, default_value_t = DEFAULT_PRIMARY_CLASS_ID)]
        person_class: u32,
        /// Send frames to OCR without contrast stretching.
        #[arg(long)]
        no_ocr_preprocess: bool,
        /// Report output path (default: results_<timestamp>.json).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Print the report without writing it to disk.
        #[arg(long, conflicts_with = "output")]
        no_save: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "vidfeatures=debug"
    } else {
        "vidfeatures=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:16} {bar:40.cyan/blue} {pos}/{len}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.reset();
        self.bar.set_length(0);
        self.bar.set_message(stage.to_string());
    }

    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
    }
}

impl Drop for TerminalProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn base_options(global: &GlobalOptions) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let mut options = AnalysisOptions::new();
    if global.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }
    Ok(options)
}

/// JSON summary printed by `cuts --json`.
fn cuts_json(
    input: &Path,
    options: &AnalysisOptions,
    threshold: f64,
    sampled_frames: usize,
    total_frames: u64,
    cuts: &[CutEvent],
    events: bool,
) -> Result<Value, serde_json::Error> {
    let mut payload = json!({
        "file_path": input.display().to_string(),
        "sample_rate": options.sample_rate(),
        "threshold": threshold,
        "sampled_frames": sampled_frames,
        "total_frames": total_frames,
        "shot_cuts": cuts.len(),
    });
    if events {
        payload["cuts"] = serde_json::to_value(cuts)?;
    }
    Ok(payload)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);
    if let Some(level) = cli.global.log_level {
        vidfeatures::set_ffmpeg_log_level(level);
    }

    match cli.command {
        Commands::Probe { input, json } => {
            let properties = vidfeatures::open_properties(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&properties)?);
            } else {
                println!("File: {}", input.display());
                println!(
                    "Video: {}x{} @ {:.2} fps",
                    properties.width, properties.height, properties.fps
                );
                println!("Frames: {}", properties.frame_count);
                println!("Duration: {:.2}s", properties.duration);
            }
        }
        Commands::Cuts {
            input,
            sample_rate,
            threshold,
            json,
            events,
        } => {
            if sample_rate == 0 {
                return Err("--sample-rate must be greater than 0".into());
            }

            let options = base_options(&cli.global)?.with_sample_rate(sample_rate);
            let properties = vidfeatures::open_properties(&input)?;
            let frames = vidfeatures::sample_frames_with_options(&input, &options)?;
            let cuts = vidfeatures::detect_cut_events(&frames, threshold);

            if json {
                let payload = cuts_json(
                    &input,
                    &options,
                    threshold,
                    frames.len(),
                    properties.frame_count,
                    &cuts,
                    events,
                )?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "shot cuts:".green().bold(),
                    format!(
                        "{} across {} sampled frames (of {})",
                        cuts.len(),
                        frames.len(),
                        properties.frame_count
                    )
                    .green()
                );
                if events {
                    for cut in &cuts {
                        let seconds = if properties.fps > 0.0 {
                            cut.source_index as f64 / properties.fps
                        } else {
                            0.0
                        };
                        println!(
                            "  frame {:>8} ({seconds:>8.2}s)  score {:6.2}",
                            cut.source_index, cut.score
                        );
                    }
                }
            }
        }
        Commands::Analyze {
            input,
            detector_cmd,
            detector_args,
            ocr_cmd,
            ocr_args,
            sample_rate,
            threshold,
            min_confidence,
            batch_size,
            person_class,
            no_ocr_preprocess,
            output,
            no_save,
        } => {
            if sample_rate == 0 {
                return Err("--sample-rate must be greater than 0".into());
            }

            let output_path = output.unwrap_or_else(vidfeatures::default_report_path);
            if !no_save && output_path.exists() {
                if !cli.global.overwrite {
                    return Err(format!(
                        "output already exists: {} (use --overwrite to replace)",
                        output_path.display()
                    )
                    .into());
                }
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("overwriting {}", output_path.display()).yellow()
                );
            }

            if detector_cmd.is_empty() || ocr_cmd.is_empty() {
                return Err("--detector-cmd and --ocr-cmd cannot be empty".into());
            }

            let options = base_options(&cli.global)?
                .with_sample_rate(sample_rate)
                .with_cut_threshold(threshold)
                .with_ocr_min_confidence(min_confidence)
                .with_detector_batch_size(batch_size)
                .with_primary_class_id(person_class)
                .with_ocr_preprocess(!no_ocr_preprocess);

            let mut extractor = FeatureExtractor::new(
                ProcessDetector::new(detector_cmd, detector_args),
                ProcessRecognizer::new(ocr_cmd, ocr_args),
            )
            .with_options(options);

            let report = extractor.analyze(&input)?;
            println!("{}", report.to_json_pretty()?);

            if !no_save {
                report.save(&output_path)?;
                eprintln!("{} {}", "saved".green().bold(), output_path.display());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidfeatures", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{Cli, Commands, cuts_json};
    use clap::Parser;
    use vidfeatures::{AnalysisOptions, CutEvent};

    #[test]
    fn collaborator_arguments_keep_spaces() {
        let cli = Cli::try_parse_from([
            "vidfeatures",
            "analyze",
            "input.mp4",
            "--detector-cmd",
            "python",
            "--detector-arg",
            "/data/my models/detect.py",
            "--detector-arg",
            "--model",
            "--detector-arg",
            "n",
            "--ocr-cmd",
            "/opt/ocr tools/ocr",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                detector_cmd,
                detector_args,
                ocr_cmd,
                ocr_args,
                ..
            } => {
                assert_eq!(detector_cmd, "python");
                assert_eq!(detector_args, vec!["/data/my models/detect.py", "--model", "n"]);
                assert_eq!(ocr_cmd, "/opt/ocr tools/ocr");
                assert!(ocr_args.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cuts_defaults_match_library() {
        let cli = Cli::try_parse_from(["vidfeatures", "cuts", "input.mp4"]).unwrap();
        match cli.command {
            Commands::Cuts {
                sample_rate,
                threshold,
                ..
            } => {
                assert_eq!(sample_rate, 10);
                assert_eq!(threshold, 25.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn log_level_parses_through_from_str() {
        let cli = Cli::try_parse_from([
            "vidfeatures",
            "--log-level",
            "warn",
            "probe",
            "input.mp4",
        ])
        .unwrap();
        assert_eq!(cli.global.log_level, Some(vidfeatures::FfmpegLogLevel::Warning));
        assert!(Cli::try_parse_from(["vidfeatures", "--log-level", "loud", "probe", "x"]).is_err());
    }

    #[test]
    fn cuts_json_lists_events_on_request() {
        let cuts = [CutEvent {
            position: 2,
            source_index: 20,
            similarity: -0.5,
            score: 150.0,
        }];
        let options = AnalysisOptions::new().with_sample_rate(10);
        let payload = cuts_json(Path::new("clip.mp4"), &options, 25.0, 5, 50, &cuts, true).unwrap();
        assert_eq!(payload["file_path"], "clip.mp4");
        assert_eq!(payload["sample_rate"], 10);
        assert_eq!(payload["shot_cuts"], 1);
        assert_eq!(payload["cuts"][0]["source_index"], 20);

        let quiet = cuts_json(Path::new("clip.mp4"), &options, 25.0, 5, 50, &cuts, false).unwrap();
        assert!(quiet.get("cuts").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn cuts_json_accepts_non_utf8_paths() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let input = Path::new(OsStr::from_bytes(b"clip_\xff.mp4"));
        let payload =
            cuts_json(input, &AnalysisOptions::new(), 25.0, 1, 10, &[], false).unwrap();
        assert_eq!(payload["file_path"], "clip_\u{fffd}.mp4");
    }
}
