mod logger;
mod parse_args;

use botlink_protocol::{BotSession, Event};
use logger::Logger;
use parse_args::parse_args;

use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

fn main() {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            std::process::exit(1);
        }
    };

    let logger = match &args.log_file {
        Some(path) => match Logger::file(path, args.verbosity) {
            Ok(l) => {
                eprintln!("Logging to: {}", path);
                l
            }
            Err(e) => {
                eprintln!("Failed to open log file '{}': {}", path, e);
                std::process::exit(1);
            }
        },
        None => Logger::stderr(args.verbosity),
    };

    let mut session = match BotSession::bind(args.port) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to listen on port {}: {}", args.port, e);
            std::process::exit(1);
        }
    };
    logger.info(&format!("Listening for a bot on port {}", args.port));

    run_loop(&mut session, &args, &logger);
}

/// Poll the session at the configured tick rate: accept, drain inbound
/// lines to stdout, emit heartbeat events.
fn run_loop(session: &mut BotSession, args: &parse_args::AppArgs, logger: &Logger) {
    let tick = Duration::from_millis((1000 / args.tick_hz.max(1)) as u64);
    let start = Instant::now();
    let mut last_heartbeat = Instant::now();
    let stdout = io::stdout();

    loop {
        if session.try_accept() {
            match session.peer_addr() {
                Some(addr) => logger.verbose(&format!("Bot connected from {}", addr)),
                None => logger.verbose("Bot connected"),
            }
        }

        let was_connected = session.is_connected();
        while let Some(line) = session.try_read_line() {
            logger.trace(&format!("<- {}", line));
            let mut out = stdout.lock();
            let _ = writeln!(out, "{}", line);
        }
        if was_connected && !session.is_connected() {
            logger.verbose("Bot disconnected");
            continue;
        }

        if session.is_connected()
            && args.heartbeat_ms > 0
            && last_heartbeat.elapsed() >= Duration::from_millis(args.heartbeat_ms)
        {
            let event = Event::new(start.elapsed().as_secs_f32(), "heartbeat", (0.0, 0.0), "");
            if session.send(&event) {
                logger.trace(&format!("-> {}", event.encode().trim_end()));
            } else {
                logger.verbose("Bot disconnected");
            }
            last_heartbeat = Instant::now();
        }

        thread::sleep(tick);
    }
}
