const HELP: &str = "\
Botlink Console - host-side harness for the bot link

Listens for one bot connection and exchanges line events, standing in for
the host application so bots can be developed against a live socket.

USAGE:
  botlink-console [OPTIONS]

OPTIONS:
  -h, --help         Prints help information
  -p, --port <port>  TCP port to listen on (default: 2101)
  --hz <n>           Polling rate in ticks per second (default: 60)
  --heartbeat <ms>   Interval between heartbeat events (default: 1000, 0 disables)
  -v, --verbose      Show connection events
  -vv, --trace       Show every line sent and received
  --log <file>       Write output to file instead of stderr
";

/// Verbosity level for debug output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No debug output
    #[default]
    Quiet = 0,
    /// Connection events, errors
    Verbose = 1,
    /// Every line sent and received
    Trace = 2,
}

#[derive(Debug)]
pub struct AppArgs {
    pub port: u16,
    pub tick_hz: u32,
    pub heartbeat_ms: u64,
    pub verbosity: Verbosity,
    pub log_file: Option<String>,
}

pub fn parse_args() -> Result<AppArgs, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let verbosity = if pargs.contains("--trace") || pargs.contains("-vv") {
        Verbosity::Trace
    } else if pargs.contains(["-v", "--verbose"]) {
        Verbosity::Verbose
    } else {
        Verbosity::Quiet
    };

    let args = AppArgs {
        port: pargs
            .opt_value_from_str(["-p", "--port"])?
            .unwrap_or(botlink_protocol::DEFAULT_PORT),
        tick_hz: pargs.opt_value_from_str("--hz")?.unwrap_or(60),
        heartbeat_ms: pargs.opt_value_from_str("--heartbeat")?.unwrap_or(1000),
        verbosity,
        log_file: pargs.opt_value_from_str("--log")?,
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        eprintln!("Warning: unused arguments left: {:?}.", remaining);
    }

    Ok(args)
}
