use anyhow::Context;
use clap::Parser;
use imgui_glow_renderer::AutoRenderer;
use regioncount::config::{CommonArgs, Settings};
use regioncount::dashboard::{parse_stream, Dashboard};
use regioncount::*;

/// Count vehicles inside hand-drawn regions across several video streams.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Stream to open at startup as NAME=URL; a camera index or file works too
    #[arg(long = "stream", value_name = "NAME=URL")]
    streams: Vec<String>,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let settings = Settings::load(&cli.common).context("loading settings")?;

    let mut dashboard = Dashboard::new(settings);
    for arg in &cli.streams {
        let (name, input) = parse_stream(arg);
        dashboard
            .add(&name, &input)
            .with_context(|| format!("starting stream {name}"))?;
    }

    window::create(move |ui: &mut imgui::Ui, renderer: &mut AutoRenderer| {
        dashboard.frame(ui, renderer)
    })
}
