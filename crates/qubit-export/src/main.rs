//! qubit-decks: CLI tool for writing FastHenry / FasterCap decks from layout polygons

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use qubit_export::cpw::{frequency_to_wavelength, CoplanarWaveguide};
use qubit_export::{
    write_fastercap_2d, write_fastercap_3d, write_fasthenry, CapacitanceConfig, InductanceConfig,
    LengthUnit, PolygonScene,
};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qubit-decks")]
#[command(about = "Write FastHenry and FasterCap input decks from qubit layout polygons")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// FastHenry inductance deck ({base}{n}.txt)
    Inductance {
        #[command(flatten)]
        io: SceneArgs,

        /// Length unit declared in the deck (km, m, cm, mm, um, in, mils)
        #[arg(long, default_value = "um")]
        units: String,

        /// Default line width
        #[arg(long, default_value = "2")]
        line_width: f64,

        /// Default line height
        #[arg(long, default_value = "0.1")]
        line_height: f64,

        /// Filaments across the width (nwinc)
        #[arg(long, default_value = "7")]
        nwinc: u32,

        /// Filaments across the height (nhinc)
        #[arg(long, default_value = "7")]
        nhinc: u32,
    },

    /// FasterCap 3-D triangle-patch deck ({base}_FasterCap_{n}.txt)
    Cap3d {
        #[command(flatten)]
        io: SceneArgs,

        /// z coordinate of every patch
        #[arg(long, default_value = "10")]
        elevation: f64,
    },

    /// FasterCap 2-D segment deck ({base}_FasterCap_{n}.txt)
    Cap2d {
        #[command(flatten)]
        io: SceneArgs,

        /// Permittivity for polygons that do not set their own
        #[arg(long, default_value = "1.0")]
        permittivity: f64,
    },

    /// Impedance and effective permittivity of a coplanar waveguide
    Cpw {
        /// Center strip width
        #[arg(long)]
        width: f64,

        /// Gap to the ground planes
        #[arg(long)]
        gap: f64,

        /// Substrate thickness
        #[arg(long, default_value = "500")]
        height: f64,

        /// Substrate relative permittivity
        #[arg(long, default_value = "11.45")]
        eps_r: f64,

        /// Also print the guided wavelength at this frequency (GHz)
        #[arg(long)]
        frequency: Option<f64>,
    },
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Input JSON file (flat polygon scene)
    #[arg(short, long)]
    input: PathBuf,

    /// Output base name; the deck goes to the first free numbered file
    #[arg(short, long)]
    base: String,
}

fn read_scene(args: &SceneArgs) -> Result<PolygonScene> {
    let json = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file: {:?}", args.input))?;
    PolygonScene::from_json(&json)
        .with_context(|| format!("Failed to parse polygon scene: {:?}", args.input))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let written = match cli.command {
        Command::Inductance {
            io,
            units,
            line_width,
            line_height,
            nwinc,
            nhinc,
        } => {
            let units: LengthUnit = units.parse()?;
            let scene = read_scene(&io)?.rescaled(units);
            let config = InductanceConfig {
                units,
                line_width,
                line_height,
                width_discretization: nwinc,
                height_discretization: nhinc,
            };
            write_fasthenry(&io.base, &scene.polygons(), scene.names().as_deref(), &config)
                .context("FastHenry export failed")?
        }
        Command::Cap3d { io, elevation } => {
            let scene = read_scene(&io)?;
            let config = CapacitanceConfig { elevation };
            write_fastercap_3d(&io.base, &scene.polygons(), scene.names().as_deref(), &config)
                .context("FasterCap 3-D export failed")?
        }
        Command::Cap2d { io, permittivity } => {
            let scene = read_scene(&io)?;
            let permittivities = scene
                .permittivities(permittivity)
                .unwrap_or_else(|| vec![permittivity; scene.polygons.len()]);
            write_fastercap_2d(
                &io.base,
                &scene.polygons(),
                scene.names().as_deref(),
                Some(permittivities.as_slice()),
            )
            .context("FasterCap 2-D export failed")?
        }
        Command::Cpw {
            width,
            gap,
            height,
            eps_r,
            frequency,
        } => {
            let line = CoplanarWaveguide {
                substrate_permittivity: eps_r,
                substrate_height: height,
                width,
                gap,
            };
            let props = line.properties()?;
            println!("Z0 = {:.3} ohm", props.impedance);
            println!("epsilon_e = {:.4}", props.effective_permittivity);
            if let Some(ghz) = frequency {
                let wavelength = frequency_to_wavelength(ghz * 1e9, props.effective_permittivity);
                println!("wavelength = {:.6e} m", wavelength);
            }
            return Ok(());
        }
    };

    println!("{}", written.path.display());
    Ok(())
}
