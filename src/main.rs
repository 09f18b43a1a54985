use std::io::{stdin, stdout};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::EnvFilter;
use video_compressor::config::Settings;
use video_compressor::ffmpeg::FfmpegEncoder;
use video_compressor::session::Session;
use video_compressor::tui::{Console, TerminalProgress};
use video_compressor::Result;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        error!("fatal: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run() -> Result<()> {
    let settings = Settings::from_env()?;
    let encoder = FfmpegEncoder::new(&settings);
    let view = Arc::new(TerminalProgress::new(&settings));

    #[cfg(feature = "libav")]
    let inspector = video_compressor::ffmpeg::LibavInspector;
    #[cfg(not(feature = "libav"))]
    let inspector = video_compressor::ffmpeg::FfprobeInspector::new(&settings);

    let mut session = Session::new(settings, inspector, encoder, view, Path::new(".")).await?;

    let stdin = stdin();
    let mut console = Console::new(stdin.lock(), stdout());
    session.run(&mut console).await
}
