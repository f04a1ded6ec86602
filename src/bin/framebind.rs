use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framebind::{
    ConvertOptions, ConvertSession, DEFAULT_SAMPLING_INTERVAL, FfmpegLogLevel, FrameSource,
    ItemStatus, NO_FRAMES_CAPTURED_MESSAGE, ProgressListener, RunContext, RunOutcome, RunSnapshot,
    VideoClip, VideoOpener, compare_display_names, default_output_name, sampling_schedule,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framebind convert 1-intro.mp4 2-body.mp4 -o lecture.pdf\n  framebind convert clips/*.mp4 --interval 5 --progress\n  framebind plan clips/*.mp4 --json\n  framebind completions zsh > _framebind";

#[derive(Debug, Parser)]
#[command(
    name = "framebind",
    version,
    about = "Bind frames sampled from MP4 videos into a single PDF",
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
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert MP4 files into a single PDF.
    #[command(
        about = "Convert MP4 files into a single PDF",
        visible_alias = "c",
        after_help = "Examples:\n  framebind convert 1-intro.mp4 2-body.mp4\n  framebind convert clips/*.mp4 --interval 5 --quality 75 -o lecture.pdf --progress"
    )]
    Convert {
        /// Input MP4 files, in any order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output PDF path (defaults to a dated name in the current directory).
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Seconds between sampled frames.
        #[arg(long, value_name = "SECONDS")]
        interval: Option<f64>,

        /// JPEG quality for captured frames (1-100).
        #[arg(long)]
        quality: Option<u8>,

        /// Maximum number of files to queue.
        #[arg(long)]
        max_files: Option<usize>,

        /// Output the result as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Preview the processing order and frame counts without decoding.
    #[command(
        about = "Preview processing order and frame counts",
        visible_alias = "p",
        after_help = "Examples:\n  framebind plan clips/*.mp4\n  framebind plan clips/*.mp4 --interval 5 --json"
    )]
    Plan {
        /// Input MP4 files, in any order.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Seconds between sampled frames.
        #[arg(long, value_name = "SECONDS")]
        interval: Option<f64>,

        /// Output the plan as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn interval_from_seconds(seconds: f64) -> Option<Duration> {
    (seconds.is_finite() && seconds > 0.0).then(|| Duration::from_secs_f64(seconds))
}

fn parse_log_level(value: &str) -> Option<FfmpegLogLevel> {
    match value.to_ascii_lowercase().as_str() {
        "quiet" => Some(FfmpegLogLevel::Quiet),
        "panic" => Some(FfmpegLogLevel::Panic),
        "fatal" => Some(FfmpegLogLevel::Fatal),
        "error" => Some(FfmpegLogLevel::Error),
        "warning" | "warn" => Some(FfmpegLogLevel::Warning),
        "info" => Some(FfmpegLogLevel::Info),
        "verbose" => Some(FfmpegLogLevel::Verbose),
        "debug" => Some(FfmpegLogLevel::Debug),
        "trace" => Some(FfmpegLogLevel::Trace),
        _ => None,
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed = parse_log_level(level).ok_or(format!("unsupported --log-level: {level}"))?;
        framebind::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn warn_failed_items(session: &ConvertSession) {
    for item in session.items() {
        if item.status == ItemStatus::Error {
            let detail = item.error.unwrap_or_else(|| "unknown error".to_string());
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("{}: {detail}", item.display_name).yellow()
            );
        }
    }
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressListener for BarProgress {
    fn on_update(&self, snapshot: &RunSnapshot) {
        self.bar.set_position(u64::from(snapshot.percent));
        self.bar.set_message(snapshot.message.clone());
    }
}

#[derive(Default)]
struct MessageProgress {
    last: Mutex<String>,
}

impl ProgressListener for MessageProgress {
    fn on_update(&self, snapshot: &RunSnapshot) {
        if let Ok(mut last) = self.last.lock() {
            if *last != snapshot.message {
                eprintln!("{} {}", "progress:".cyan().bold(), snapshot.message);
                *last = snapshot.message.clone();
            }
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Convert {
            files,
            output,
            interval,
            quality,
            max_files,
            json,
        } => {
            let mut options = ConvertOptions::new();
            if let Some(seconds) = interval {
                let parsed = interval_from_seconds(seconds)
                    .ok_or("--interval must be a positive number of seconds")?;
                options = options.with_sampling_interval(parsed);
            }
            if let Some(quality) = quality {
                options = options.with_jpeg_quality(quality);
            }
            if let Some(limit) = max_files {
                options = options.with_max_files(limit);
            }

            let mut session = ConvertSession::new(options);
            let report = session.add_files(files)?;
            if report.skipped_unsupported > 0 {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("skipped {} unsupported file(s)", report.skipped_unsupported).yellow()
                );
            }
            if report.skipped_over_limit > 0 {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("skipped {} file(s) over the queue limit", report.skipped_over_limit)
                        .yellow()
                );
            }

            let output_path = output.unwrap_or_else(|| PathBuf::from(default_output_name()));
            ensure_writable_path(&output_path, cli.global.overwrite)?;

            let progress_bar = if cli.global.progress {
                let bar = ProgressBar::new(100);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {percent}% {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                Some(bar)
            } else {
                None
            };

            let mut context = RunContext::new();
            if let Some(bar) = &progress_bar {
                context = context.with_listener(Arc::new(BarProgress { bar: bar.clone() }));
            } else if cli.global.verbose {
                context = context.with_listener(Arc::new(MessageProgress::default()));
            }

            match session.run(&mut VideoOpener, &context)? {
                RunOutcome::Completed(document) => {
                    if let Some(bar) = progress_bar {
                        bar.finish_with_message("done");
                    }
                    warn_failed_items(&session);
                    document.save(&output_path)?;

                    if json {
                        let payload = json!({
                            "output": output_path.display().to_string(),
                            "pages": document.page_count(),
                            "files": session.items().iter().map(|item| json!({
                                "name": item.display_name,
                                "status": item.status.to_string(),
                                "frames": item.frames_captured,
                            })).collect::<Vec<_>>(),
                        });
                        println!("{}", serde_json::to_string_pretty(&payload)?);
                    } else {
                        println!(
                            "{} {}",
                            "success:".green().bold(),
                            format!(
                                "wrote {} page(s) to {}",
                                document.page_count(),
                                output_path.display()
                            )
                            .green()
                        );
                    }
                }
                RunOutcome::NoFrames => {
                    if let Some(bar) = progress_bar {
                        bar.finish_and_clear();
                    }
                    warn_failed_items(&session);
                    return Err(NO_FRAMES_CAPTURED_MESSAGE.into());
                }
                RunOutcome::Cancelled => {
                    if let Some(bar) = progress_bar {
                        bar.finish_and_clear();
                    }
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        "conversion cancelled before completion".yellow()
                    );
                }
            }
        }
        Commands::Plan {
            files,
            interval,
            json,
        } => {
            let sampling_interval = match interval {
                Some(seconds) => interval_from_seconds(seconds)
                    .ok_or("--interval must be a positive number of seconds")?,
                None => DEFAULT_SAMPLING_INTERVAL,
            };

            let mut ordered: Vec<(String, PathBuf)> = files
                .into_iter()
                .map(|path| {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    (name, path)
                })
                .collect();
            ordered.sort_by(|a, b| compare_display_names(&a.0, &b.0));

            let mut entries = Vec::new();
            let mut total_frames = 0_usize;
            for (name, path) in &ordered {
                match VideoClip::open(path) {
                    Ok(clip) => match clip.duration() {
                        Some(duration) => {
                            let frames = sampling_schedule(duration, sampling_interval).len();
                            total_frames += frames;
                            entries.push((name.clone(), Ok((duration, frames))));
                        }
                        None => entries.push((
                            name.clone(),
                            Err("duration is unknown or not positive".to_string()),
                        )),
                    },
                    Err(error) => entries.push((name.clone(), Err(error.to_string()))),
                }
            }

            if json {
                let payload = json!({
                    "interval_seconds": sampling_interval.as_secs_f64(),
                    "files": entries.iter().map(|(name, entry)| match entry {
                        Ok((duration, frames)) => json!({
                            "name": name,
                            "duration_seconds": duration.as_secs_f64(),
                            "frames": frames,
                        }),
                        Err(error) => json!({
                            "name": name,
                            "error": error,
                        }),
                    }).collect::<Vec<_>>(),
                    "total_frames": total_frames,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (position, (name, entry)) in entries.iter().enumerate() {
                    match entry {
                        Ok((duration, frames)) => println!(
                            "{:>3}. {name}: {frames} frame(s) over {:.1}s",
                            position + 1,
                            duration.as_secs_f64()
                        ),
                        Err(error) => eprintln!(
                            "{} {}",
                            "warning:".yellow().bold(),
                            format!("{name}: {error}").yellow()
                        ),
                    }
                }
                println!(
                    "{} {}",
                    "total:".green().bold(),
                    format!("{total_frames} frame(s), one page each").green()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framebind", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
