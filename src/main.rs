use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, ensure, Context, Result};

use graphics_labs::app::{run_windowed, WindowInitError};
use graphics_labs::{create_lab, is_known_input_name, InputState, Lab, LabConfig, LabKind};

const USAGE: &str = "Usage: graphics-labs <lab> [--config FILE] [--summary-only] [--frames N] \
[--press KEY]... [--hold KEY]...\n       graphics-labs --list";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = match CliOptions::parse(env::args().skip(1))? {
        Command::List => {
            for kind in LabKind::ALL {
                println!("{:<12}{}", kind.name(), kind.description());
            }
            return Ok(());
        }
        Command::Run(options) => options,
    };

    let config = match &options.config {
        Some(path) => {
            log::info!("loading config from {}", path.display());
            LabConfig::load(options.lab, path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
        None => LabConfig::defaults(options.lab),
    };
    println!(
        "Loaded {} lab: \"{}\" {}x{} at {} fps",
        options.lab,
        config.window.title,
        config.window.width,
        config.window.height,
        config.target_fps
    );

    let lab = create_lab(options.lab, &config);
    if options.summary_only {
        return run_headless(lab, &options);
    }

    match run_windowed(lab, &config) {
        Ok(lab) => {
            print_final_state(lab.as_ref());
            Ok(())
        }
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            run_headless(create_lab(options.lab, &config), &options)
        }
        Err(err) => Err(err),
    }
}

/// Steps the lab without a window. `--press` keys go down on the first
/// frame only, `--hold` keys stay down for every frame.
fn run_headless(mut lab: Box<dyn Lab>, options: &CliOptions) -> Result<()> {
    let mut input = InputState::new();
    for name in options.hold.iter().chain(&options.press) {
        input.press_by_name(name);
    }

    for frame in 0..options.frames {
        lab.update(&input);
        let list = lab.render();
        ensure!(
            list.phases_in_order(),
            "frame {frame} recorded draws out of pass order"
        );
        log::debug!("frame {frame}: {} draws", list.commands.len());
        input.end_frame();
        if frame == 0 {
            for name in options.press_only() {
                input.release_by_name(name);
            }
        }
    }

    print_final_state(lab.as_ref());
    Ok(())
}

fn print_final_state(lab: &dyn Lab) {
    println!("Final {} lab state:", lab.kind());
    for line in lab.summary() {
        println!("  {line}");
    }
}

enum Command {
    List,
    Run(CliOptions),
}

struct CliOptions {
    lab: LabKind,
    config: Option<PathBuf>,
    summary_only: bool,
    frames: u32,
    press: Vec<String>,
    hold: Vec<String>,
}

impl CliOptions {
    /// `--press` names that are not also held.
    fn press_only(&self) -> impl Iterator<Item = &String> {
        self.press.iter().filter(|name| !self.hold.contains(name))
    }

    fn parse(args: impl IntoIterator<Item = String>) -> Result<Command> {
        let mut args = args.into_iter();
        let mut lab = None;
        let mut config = None;
        let mut summary_only = false;
        let mut frames = 1;
        let mut press = Vec::new();
        let mut hold = Vec::new();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--list" => return Ok(Command::List),
                "--summary-only" => summary_only = true,
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                "--frames" => {
                    let raw = value("--frames")?;
                    frames = raw
                        .parse()
                        .with_context(|| format!("invalid frame count {raw:?}"))?;
                }
                "--press" => press.push(input_name(value("--press")?)?),
                "--hold" => hold.push(input_name(value("--hold")?)?),
                other if other.starts_with("--") => {
                    bail!("Unknown argument: {other}\n{USAGE}");
                }
                other => {
                    if lab.is_some() {
                        bail!("Unexpected argument: {other}\n{USAGE}");
                    }
                    lab = Some(LabKind::from_name(other)?);
                }
            }
        }

        let Some(lab) = lab else {
            bail!("{USAGE}");
        };
        Ok(Command::Run(Self {
            lab,
            config,
            summary_only,
            frames,
            press,
            hold,
        }))
    }
}

fn input_name(name: String) -> Result<String> {
    ensure!(is_known_input_name(&name), "unknown key or button {name:?}");
    Ok(name)
}
