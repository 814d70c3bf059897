use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

use orbit_capture::config::ConfigFormat;
use orbit_capture::foundation::logging;
use orbit_capture::prelude::*;

fn main() -> Result<()> {
    let matches = Command::new("orbit_capture")
        .about("Renders multi-material orbit datasets with camera calibration")
        .subcommand_required(true)
        .subcommand(
            Command::new("capture")
                .about("Capture every material variant into its own scene directory")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Configuration file (.toml or .ron); defaults are used when omitted")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .help("Output root, overriding the configuration")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("views")
                        .short('n')
                        .long("views")
                        .value_name("COUNT")
                        .help("Number of views per scene")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("material")
                        .short('m')
                        .long("material")
                        .value_name("NAME")
                        .help("Only capture this material variant (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    Arg::new("skip-failed")
                        .long("skip-failed")
                        .help("Skip views the renderer fails on instead of aborting")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("supersampling")
                        .long("supersampling")
                        .value_name("N")
                        .help("Preview renderer samples per pixel along each axis")
                        .default_value("2")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Check captured scene directories for image/record alignment")
                .arg(
                    Arg::new("scenes")
                        .value_name("SCENE_DIR")
                        .required(true)
                        .num_args(1..)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print or write the default configuration")
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("Output format when printing")
                        .value_parser(["toml", "ron"])
                        .default_value("toml"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Write to FILE instead of stdout; the format follows its extension")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("capture", args)) => capture(args),
        Some(("verify", args)) => verify(args),
        Some(("config", args)) => dump_config(args),
        _ => unreachable!("subcommand_required is set"),
    }
}

fn load_config(args: &ArgMatches) -> Result<CaptureConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => CaptureConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CaptureConfig::default(),
    };

    if let Some(output) = args.get_one::<PathBuf>("output") {
        config.output_root.clone_from(output);
    }
    if let Some(&views) = args.get_one::<usize>("views") {
        config.orbit.view_count = views;
    }
    if args.get_flag("skip-failed") {
        config.failure_policy = FailurePolicy::SkipAndLog;
    }
    if let Some(names) = args.get_many::<String>("material") {
        let names: Vec<String> = names.cloned().collect();
        config.retain_materials(&names).context("Invalid --material selection")?;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn capture(args: &ArgMatches) -> Result<()> {
    let config = load_config(args)?;
    logging::init(&config.log_level);

    let settings = PreviewSettings {
        supersampling: args.get_one::<u32>("supersampling").copied().unwrap_or(2),
        ..PreviewSettings::default()
    };
    let mut renderer = PreviewRenderer::new(config.intrinsics, settings)
        .context("Failed to create preview renderer")?;

    log::info!(
        "Capturing {} material(s) x {} views into {}",
        config.materials.len(),
        config.orbit.view_count,
        config.output_root.display()
    );
    let runner = DatasetRunner::new(config).context("Failed to prepare dataset run")?;
    let report = runner.run(&mut renderer).context("Dataset capture failed")?;

    for scene in &report.scenes {
        println!(
            "{:<12} {:>4} rendered {:>4} skipped  {}",
            scene.material,
            scene.capture.rendered.len(),
            scene.capture.skipped.len(),
            scene.capture.scene_dir.display()
        );
    }
    println!(
        "Done: {} views in {:.1?}",
        report.total_rendered(),
        report.elapsed
    );
    Ok(())
}

fn verify(args: &ArgMatches) -> Result<()> {
    logging::init("info");

    let mut failures = 0usize;
    for scene_dir in args.get_many::<PathBuf>("scenes").into_iter().flatten() {
        match verify_scene(scene_dir) {
            Ok(summary) => println!("OK    {} ({} views)", scene_dir.display(), summary.view_count),
            Err(e) => {
                failures += 1;
                println!("FAIL  {}: {}", scene_dir.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} scene(s) failed verification");
    }
    Ok(())
}

fn dump_config(args: &ArgMatches) -> Result<()> {
    let config = CaptureConfig::default();

    if let Some(path) = args.get_one::<PathBuf>("output") {
        config
            .save_to_file(path)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let format = match args.get_one::<String>("format").map(String::as_str) {
        Some("ron") => ConfigFormat::Ron,
        _ => ConfigFormat::Toml,
    };
    let text = config.to_format_string(format).context("Failed to serialize configuration")?;
    println!("{text}");
    Ok(())
}
