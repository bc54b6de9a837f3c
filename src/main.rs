use std::{error::Error, io, path::PathBuf, thread};

use clap::{Parser, Subcommand};
use reveille::{
    communication::{Message, MessageType},
    config::Config,
    player::{BellPlayer, RodioPlayer, SoundPlayer},
    shell::{Shell, HELP},
    PlaybackOutcome, Scheduler,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the default one
    #[clap(long, short)]
    config: Option<PathBuf>,
    /// ring the terminal bell instead of playing audio
    #[clap(long)]
    no_audio: bool,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("reveille").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    if let Some(Command::Init { force }) = args.command {
        if force || !config_path.exists() {
            Config::new().save(config_path.clone())?;
            println!("wrote default config to {}", config_path.display());
        } else {
            println!(
                "config already exists at {}, use --force to overwrite it",
                config_path.display()
            );
        }
        return Ok(());
    }

    let config = Config::load_or_default(config_path)?;
    let player: Box<dyn SoundPlayer> = if args.no_audio {
        Box::new(BellPlayer)
    } else {
        Box::new(RodioPlayer::new(config.poll_interval(), config.volume))
    };
    let scheduler = Scheduler::new(&config, player);

    // show alarms as they go off while the prompt is waiting for input
    let messages = scheduler.subscribe();
    thread::spawn(move || {
        for Message { kind, alarm_id } in messages {
            match kind {
                MessageType::AlarmTriggered { description, .. } => {
                    println!("\nALARM ({alarm_id}): {description}");
                    println!("type 'stop_sound' to silence it");
                }
                MessageType::AlarmStopped(PlaybackOutcome::Failed(reason)) => {
                    println!("\ncouldn't play sound for {alarm_id}: {reason}");
                }
                MessageType::AlarmStopped(_) => {}
            }
        }
    });

    println!("{}", "=".repeat(50));
    println!("Welcome to the Alarm Clock Application!");
    println!("{}", "=".repeat(50));
    println!("{HELP}\n");

    scheduler.start();
    println!("Alarm clock started.");
    let shell = Shell::new(&scheduler, config.time_format.clone());
    let result = shell.run(io::stdin().lock(), &mut io::stdout());
    println!("Stopping alarm clock...");
    scheduler.stop();
    println!("Goodbye!");
    Ok(result?)
}
