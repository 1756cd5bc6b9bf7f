use anyhow::Context;
use clap::Parser;
use dmg_core::{Cartridge, Emulator};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
struct Cli {
    /// Path to a Game Boy ROM image
    #[arg(short = 'r', long = "rom")]
    rom: PathBuf,

    /// Number of frames to emulate
    #[arg(short = 'f', long = "frames", default_value_t = 60)]
    frames: u32,

    /// Write the final frame to this file as a binary PPM image
    #[arg(short = 'd', long = "dump-ppm")]
    dump_ppm: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Cli::parse();

    let cartridge = Cartridge::from_file(&args.rom)
        .with_context(|| format!("failed to load ROM from {}", args.rom.display()))?;

    let mut emulator = Emulator::new(cartridge);

    log::info!("emulating {} frame(s)", args.frames);
    for _ in 0..args.frames {
        emulator.run_frame();
    }

    if let Some(ppm_path) = &args.dump_ppm {
        write_ppm(&emulator, ppm_path)
            .with_context(|| format!("failed to write PPM image to {}", ppm_path.display()))?;
        log::info!("wrote final frame to {}", ppm_path.display());
    }

    Ok(())
}

fn write_ppm(emulator: &Emulator, path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "P6")?;
    writeln!(writer, "{} {}", dmg_core::SCREEN_WIDTH, dmg_core::SCREEN_HEIGHT)?;
    writeln!(writer, "255")?;

    for row in emulator.frame_buffer() {
        for &pixel in row {
            let [_, r, g, b] = pixel.to_be_bytes();
            writer.write_all(&[r, g, b])?;
        }
    }

    writer.flush()?;

    Ok(())
}
