//! Headless runner: executes a ROM for a fixed number of frames and can
//! report CPU state, serial output, or an ASCII dump of the final frame.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use dotmatrix::cartridge::Cartridge;
use dotmatrix::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use dotmatrix::{EmuError, GameBoy};

#[derive(Parser)]
#[command(version, about = "Headless DMG Game Boy emulator")]
struct Args {
    /// Cartridge ROM image
    rom: PathBuf,

    /// Frames to run before exiting
    #[arg(long, default_value_t = 60)]
    frames: u64,

    /// Print CPU state after every frame
    #[arg(long)]
    trace_cpu: bool,

    /// Print bytes written to the serial port (many test ROMs report here)
    #[arg(long)]
    serial: bool,

    /// Print the final frame as ASCII shades
    #[arg(long)]
    dump_frame: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), EmuError> {
    let cart = Cartridge::from_file(&args.rom)?;
    let mut gb = GameBoy::new();
    gb.load_cartridge(cart);

    for _ in 0..args.frames {
        gb.step_frame()?;
        if args.trace_cpu {
            println!("{}", gb.cpu.debug_state());
        }
        if args.serial {
            let bytes = gb.bus.serial.take_output();
            if !bytes.is_empty() {
                print!("{}", String::from_utf8_lossy(&bytes));
            }
        }
    }
    info!("ran {} frames", gb.bus.ppu.frames());

    if args.dump_frame {
        dump_frame(gb.framebuffer());
    }
    Ok(())
}

fn dump_frame(frame: &[u8]) {
    const SHADES: [char; 4] = [' ', '.', 'o', '#'];
    for row in 0..SCREEN_HEIGHT {
        let line: String = frame[row * SCREEN_WIDTH..(row + 1) * SCREEN_WIDTH]
            .iter()
            .map(|&px| SHADES[(px & 0x03) as usize])
            .collect();
        println!("{line}");
    }
}
