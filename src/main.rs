use animpal::encoder::FfmpegEncoder;
use animpal::export::{run_export, ExportObserver, ExportSession};
use animpal::sequence::{scan_directory, ImageSequence};
use animpal::{Direction, ExportSettings, FrameHold, FrameRate, Resolution};
use clap::{Arg, Command};
use colored::*;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Prints a single updating progress line.
struct ConsoleProgress {
    hold: FrameHold,
}

impl ExportObserver for ConsoleProgress {
    fn on_progress(&mut self, done: usize, total: usize) {
        print!(
            "\r{} frame {}/{} (x{})",
            "Rendering".yellow(),
            done,
            total,
            self.hold
        );
        std::io::stdout().flush().ok();
    }

    fn on_encoding(&mut self) {
        println!("\n{}", "Encoding video with ffmpeg...".bold().cyan());
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let matches = Command::new("animpal")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render a folder of stop-motion stills to an MP4 flipbook")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("DIR")
                .help("Directory containing the frames (.jpg, .png, .bmp, .tif)")
                .required(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Output video file (.mp4 is appended if missing)")
                .required(true),
        )
        .arg(
            Arg::new("resolution")
                .long("resolution")
                .value_name("PRESET")
                .help("Output resolution: 720p, 1080p, 4K or 8K")
                .default_value("1080p"),
        )
        .arg(
            Arg::new("fps")
                .short('r')
                .long("fps")
                .value_name("RATE")
                .help("Frame rate: 18, 24 or 30")
                .default_value("24"),
        )
        .arg(
            Arg::new("direction")
                .short('d')
                .long("direction")
                .value_name("DIRECTION")
                .help("Frame order: forward or reverse")
                .default_value("forward"),
        )
        .arg(
            Arg::new("frame-hold")
                .long("frame-hold")
                .value_name("N")
                .help("Shoot on N: hold every image for N video frames (1-9)")
                .default_value("1"),
        )
        .arg(
            Arg::new("quality")
                .short('q')
                .long("quality")
                .value_name("CRF")
                .help("Video quality (CRF: 0-51, lower = better quality)")
                .default_value("20"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("NUM")
                .help("Number of threads used to decode images (default: auto-detect)")
                .default_value("0"),
        )
        .get_matches();

    let input_dir = matches
        .get_one::<String>("input")
        .ok_or("Missing input directory")?;
    let output = matches
        .get_one::<String>("output")
        .ok_or("Missing output file")?;

    let settings = ExportSettings {
        resolution: arg_value::<Resolution>(&matches, "resolution")?,
        fps: arg_value::<FrameRate>(&matches, "fps")?,
        direction: arg_value::<Direction>(&matches, "direction")?,
        frame_hold: FrameHold::new(
            arg_value::<u8>(&matches, "frame-hold").map_err(|_| "Invalid frame-hold value")?,
        )?,
    };
    let quality = arg_value::<u32>(&matches, "quality").map_err(|_| "Invalid quality value")?;
    let threads = arg_value::<usize>(&matches, "threads").map_err(|_| "Invalid threads value")?;

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
    }

    let encoder = FfmpegEncoder::new().with_crf(quality)?;
    if let Err(e) = encoder.ensure_available() {
        return Err(format!("{}: {} (is ffmpeg in PATH?)", "Error".red(), e).into());
    }

    println!("{}", "Rendering flipbook with settings:".bold().cyan());
    let (width, height) = settings.resolution.dimensions();
    println!(
        "  {}: {} ({}x{})",
        "Resolution".green(),
        settings.resolution,
        width,
        height
    );
    println!("  {}: {} fps", "Frame rate".green(), settings.fps);
    println!("  {}: {}", "Direction".green(), settings.direction);
    println!("  {}: {}", "Frame hold".green(), settings.frame_hold);
    println!("  {}: CRF {}", "Quality".green(), quality);

    let start_time = Instant::now();

    let files = scan_directory(Path::new(input_dir))?;
    if files.is_empty() {
        return Err("No image files found in input directory".into());
    }
    println!("{} {} image files", "Found".bold().blue(), files.len());

    let mut sequence = ImageSequence::new(settings.resolution);
    let loaded = sequence.load_parallel(&files);
    if loaded < files.len() {
        println!(
            "{}: skipped {} unreadable files",
            "Warning".yellow(),
            files.len() - loaded
        );
    }

    let session = ExportSession::new(&sequence, settings, Path::new(output))?;
    let mut progress = ConsoleProgress {
        hold: settings.frame_hold,
    };
    let video_path = run_export(session, &encoder, &mut progress)?;

    let output_frames = sequence.len() * settings.frame_hold.as_usize();
    println!(
        "{}: {}",
        "Video created successfully".bold().green(),
        video_path.display()
    );
    println!(
        "{}: {:.2} seconds at {} fps",
        "Video duration".blue(),
        output_frames as f32 / settings.fps.as_u32() as f32,
        settings.fps
    );
    println!("{}: {:.2?}", "Processing time".blue(), start_time.elapsed());

    Ok(())
}

fn arg_value<T>(matches: &clap::ArgMatches, name: &str) -> Result<T, Box<dyn Error>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = matches
        .get_one::<String>(name)
        .ok_or_else(|| format!("Missing value for --{}", name))?;
    raw.parse::<T>()
        .map_err(|e| format!("Invalid value for --{}: {}", name, e).into())
}
