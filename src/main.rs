use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use mnemo::{is_minimal, KeyMod, KeySource, Renderer, Session, Settings};

/// Mnemo is an interactive trainer for an 8-bit accumulator machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Produce minimal output, suited for blackbox tests
    #[arg(short, long)]
    minimal: bool,
    /// Keep the carry flag across ADC/SBC instead of auto-adjusting it
    #[arg(long)]
    manual_carry: bool,
    /// Treat alt (ESC-prefixed) rather than ctrl as the keyMod modifier
    #[arg(long)]
    alt_mod: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    is_minimal::set(args.minimal);

    let settings = Settings {
        auto_carry: !args.manual_carry,
        key_mod: if args.alt_mod { KeyMod::Alt } else { KeyMod::Ctrl },
    };

    let mut session = Session::new(settings);
    let mut keys = KeySource::open(settings.key_mod);
    let mut renderer = Renderer::new();
    renderer.draw(&session);

    // Blocking read-process-render loop: one key at a time, rendering only
    // fully settled state.
    while session.is_running() {
        let Some(key) = keys.read().into_diagnostic()? else {
            break;
        };
        session.handle_key(key);
        renderer.draw(&session);
    }

    if !args.minimal {
        println!("\n{:>12}", "Halted".cyan());
    }
    Ok(())
}
