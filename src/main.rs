use blemetronome::{
    audio::{LogPulseSink, MidiPulseSink, PulseSink},
    ble::{replay::run_replay, ClockSimulator, TransportHandlers},
    cli::Args,
    config::Settings,
    create_scheduler, create_shared_state, logging,
    midi::{list_output_ports, MidiOutputManager},
    ui::run_status_display,
    validate_output, Metronome, Scheduler,
};
use clap::Parser;
use dialoguer::Select;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::{thread, time::Duration};

/// Long enough for the last queued tone to finish
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

fn main() {
    let args = Args::parse();
    let mut settings = load_settings(&args);
    apply_overrides(&args, &mut settings);
    initialize_logging(&settings);

    if args.list_outputs {
        list_outputs();
        return;
    }

    let sink = create_pulse_sink(&args, &settings).unwrap_or_else(|e| exit_with_error(e));

    let scheduler = create_scheduler();
    let shared_state = create_shared_state();
    let metronome = Metronome::new(shared_state.clone(), sink);
    metronome.start(&scheduler);

    if settings.status {
        let display_state = shared_state.clone();
        scheduler.spawn_named("status-display", move || run_status_display(display_state));
    }

    let handlers = metronome.transport_handlers();
    if let Err(e) = run_transport(&args, &handlers) {
        exit_with_error(e);
    }

    log::info!("Transport closed, shutting down");
    thread::sleep(SHUTDOWN_GRACE);
}

fn exit_with_error<E: std::fmt::Display>(e: E) -> ! {
    log::error!("{}", e);
    eprintln!("{}", e);
    std::process::exit(1);
}

fn load_settings(args: &Args) -> Settings {
    // Runs before the logger exists; `initialize_logging` reports the result.
    Settings::load(args.config.as_deref())
        .unwrap_or_else(|e| exit_with_error(format!("Error loading settings: {}", e)))
}

fn apply_overrides(args: &Args, settings: &mut Settings) {
    if let Some(device) = &args.midi_output {
        settings.midi_output = Some(device.clone());
    }
    if let Some(level) = &args.log_level {
        settings.log_level = level.clone();
    }
    if args.status {
        settings.status = true;
    }
}

fn initialize_logging(settings: &Settings) {
    if let Err(e) = logging::init_logger(&settings.log_level) {
        exit_with_error(format!("Logger initialization failed: {}", e));
    }
    log::info!("Application starting");
    log::info!("Settings: {}", settings);
}

fn list_outputs() {
    match list_output_ports() {
        Ok(ports) => {
            println!("Available MIDI outputs:");
            for port in ports {
                println!("  - {}", port);
            }
        }
        Err(e) => exit_with_error(e),
    }
}

fn choose_output() -> Result<String, Box<dyn Error>> {
    let ports = list_output_ports()?;
    if ports.is_empty() {
        return Err("No MIDI output ports available".into());
    }
    let index = Select::new()
        .with_prompt("MIDI output for the metronome")
        .items(&ports)
        .default(0)
        .interact()?;
    Ok(ports[index].clone())
}

fn create_pulse_sink(args: &Args, settings: &Settings) -> Result<Arc<dyn PulseSink>, Box<dyn Error>> {
    if args.headless {
        log::info!("Headless mode, pulses are logged only");
        return Ok(Arc::new(LogPulseSink::new()));
    }

    let requested = if args.choose_output {
        Some(choose_output()?)
    } else {
        settings.midi_output.clone()
    };

    let mut output = MidiOutputManager::new();
    let port_name = match requested {
        Some(device_name) => {
            validate_output(&device_name, &list_output_ports()?)?;
            output.connect_to_device(&device_name)?
        }
        None => output.connect_to_first_available().map_err(|e| {
            format!("{} (use --headless to run without MIDI output)", e)
        })?,
    };
    println!("Metronome pulses go to MIDI output: {}", port_name);

    let sink = MidiPulseSink::spawn(output, settings.midi_channel, settings.velocity)?;
    Ok(Arc::new(sink))
}

fn run_transport(args: &Args, handlers: &TransportHandlers) -> Result<(), Box<dyn Error>> {
    if let Some(bpm) = args.simulate_bpm {
        let mut simulator = ClockSimulator::new(bpm);
        if let Some(beats) = args.beats {
            simulator = simulator.with_beats(beats);
        }
        let events = simulator.spawn()?;
        handlers.pump(events.iter());
        return Ok(());
    }

    match args.replay.as_deref() {
        Some(path) if path != Path::new("-") => {
            log::info!("Replaying capture {}", path.display());
            let file = File::open(path)?;
            run_replay(BufReader::new(file), handlers)?;
        }
        _ => {
            log::info!("Reading BLE-MIDI traffic from stdin");
            run_replay(io::stdin().lock(), handlers)?;
        }
    }
    Ok(())
}
