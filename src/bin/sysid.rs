// Synthetic point-mass identification: generate an excitation log and fit
// mass and drag per axis.

use std::fs::File;

use argh::FromArgs;
use log::info;

use drone_gnc::common::params::load_or_default;
use drone_gnc::simulation::{generate, identify, write_rows, SysIdConfig};

/// Identifies mass and drag of the point-mass model
#[derive(Debug, FromArgs)]
struct Args {
    /// sysid configuration file (TOML), defaults are used when it does not exist
    #[argh(option, short = 'p', default = "String::from(\"params/sysid.toml\")")]
    params: String,

    /// excitation seed override
    #[argh(option)]
    seed: Option<u64>,

    /// optional CSV dump of the excitation log
    #[argh(option, short = 'o')]
    output: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let mut config: SysIdConfig = load_or_default(&args.params)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let samples = generate(&config)?;
    info!("Generated {} samples (seed {})", samples.len(), config.seed);
    if let Some(path) = &args.output {
        write_rows(samples.iter(), File::create(path)?)?;
        info!("Excitation log written to {}", path);
    }

    let fit = identify(&samples)?;
    println!("          true     fit      rel err");
    println!(
        "mass   {:8.4} {:8.4} {:8.2}%",
        config.mass,
        fit.mass,
        100.0 * (fit.mass - config.mass) / config.mass
    );
    println!(
        "drag_x {:8.4} {:8.4} {:8.2}%",
        config.drag_x,
        fit.x.drag,
        100.0 * (fit.x.drag - config.drag_x) / config.drag_x
    );
    println!(
        "drag_y {:8.4} {:8.4} {:8.2}%",
        config.drag_y,
        fit.y.drag,
        100.0 * (fit.y.drag - config.drag_y) / config.drag_y
    );
    println!("residual mse: x {:.3e}, y {:.3e}", fit.x.mse, fit.y.mse);
    Ok(())
}
