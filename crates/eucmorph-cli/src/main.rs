//! eucmorph: Euclidean rhythm morphing from the command line

mod args;
mod config;
mod settings;

use anyhow::Context;
use clap::Parser;
use eucmorph_core::{MorphAlgorithm, MorphSession, ProbStepAlgorithm, ProbStepTable};
use eucmorph_services::MidiWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use args::{Args, Report};
use settings::Settings;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "eucmorph=debug" } else { "eucmorph=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    if args.list_algorithms {
        for alg in MorphAlgorithm::ALL {
            println!("{}", alg.name());
        }
        return Ok(());
    }

    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let config = config::load_config(&config_path);
    let settings = Settings::resolve(&args, &config)?;

    run(&settings)
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    let request = &settings.request;
    tracing::info!(
        "Morphing {} toward E({}, {}, {}) with {} at amount {}",
        request.base.rhythm_notation(),
        request.params.onsets,
        request.params.length,
        request.params.rotation,
        request.algorithm,
        request.morph_amount
    );

    let mut rng = match settings.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut session = MorphSession::new();
    let mut writer = MidiWriter::new().with_channel(settings.channel);
    let mut last_steps = Vec::new();

    for _ in 0..settings.repeat {
        let out = session.generate(request, &mut rng)?;
        writer.add(&out.sequence)?;

        if settings.report == Report::All {
            println!("{}\n", ProbStepTable(&out.prob_steps));
            println!("GENERATED FROM: {}", out.start_pos);
            println!("GENERATED TO: {}\n", out.end_pos);
        }
        if settings.report != Report::Quiet {
            println!("---RESULTING RHYTHM---");
            println!("{}", out.sequence.rhythm_notation());
            println!("{}\n", out.sequence.seq_string());
        }
        last_steps = out.prob_steps;
    }

    if settings.json {
        println!("{}", serde_json::to_string_pretty(&last_steps)?);
    }

    let Some(path) = &settings.output else { return Ok(()) };
    if settings.report == Report::All {
        for line in writer.describe() {
            println!("{}", line);
        }
    }
    writer
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
