use std::io;
use std::time::Duration;

use clap::Parser;
use log::{error, info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

use lumen::core::config::{self, CliOverrides, LumenConfig, ResolvedConfig};
use lumen::core::responder::{EchoResponder, Responder};
use lumen::logging::{self, LogStore};
use lumen::tui::{Session, UiHandle, UiOutput};

/// How long a blocked stdin read may hold up process exit.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

const HELP_TEXT: &str = "\
Type a line and press alt+enter to send it. Enter inserts a newline.

Slash commands
  /add a b   add two integers as a tool call
  /help      this text
  /logs      open the log viewer

Keys
  up/down    recall history from the first or last row
  tab        pick an autocomplete suggestion
  ctrl+x     command manager: c collapse, e expand, l logs
  ctrl+c     quit
  ctrl+d     quit on an empty line";

#[derive(Parser)]
#[command(name = "lumen", about = "Echo session on the lumen terminal UI")]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Log file path
    #[arg(long)]
    log_file: Option<String>,

    /// Maximum input history entries
    #[arg(long)]
    history_max: Option<usize>,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    let (file_config, load_error) = match config::load_config() {
        Ok(c) => (c, None),
        Err(e) => (LumenConfig::default(), Some(e)),
    };
    let cli = CliOverrides {
        log_level: args.log_level,
        log_file: args.log_file,
        history_max: args.history_max,
    };
    let resolved = config::resolve(&file_config, &cli);

    let logs = LogStore::new(resolved.log_capacity);
    logging::init(resolved.log_level, &resolved.log_file, logs.clone());
    if let Some(e) = load_error {
        warn!("Using default config: {e}");
    }
    info!("lumen starting up");

    // Built by hand so shutdown does not wait on the stdin reader.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(&resolved, logs));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    if let Err(e) = &result {
        error!("Session failed: {e}");
    }
    result
}

async fn run(config: &ResolvedConfig, logs: LogStore) -> io::Result<()> {
    let (output_tx, outputs) = unbounded_channel();
    let (session, handle) = Session::start(config, logs, output_tx)?;
    let responder = EchoResponder::new();

    let (result, ()) = tokio::join!(session.run(), echo(&responder, handle, outputs));
    result
}

/// Answer the UI until it closes its output channel.
async fn echo(responder: &dyn Responder, ui: UiHandle, mut outputs: UnboundedReceiver<UiOutput>) {
    while let Some(output) = outputs.recv().await {
        match output {
            UiOutput::Submit(line) => match line.as_str() {
                "" => {}
                "/help" => {
                    ui.show_text("help", HELP_TEXT);
                }
                "/logs" => {
                    ui.show_logs();
                }
                _ => {
                    ui.set_running(true);
                    match responder.respond(&line).await {
                        Ok(steps) => {
                            ui.set_status("");
                            for step in steps {
                                ui.step(step);
                            }
                        }
                        Err(e) => {
                            warn!("{} failed: {e}", responder.name());
                            ui.set_status(format!("error: {e}"));
                        }
                    }
                    ui.set_running(false);
                }
            },
            UiOutput::AutocompleteRequest { text, .. } => {
                ui.autocomplete(responder.complete(&text));
            }
            UiOutput::Stop | UiOutput::Eof => {
                info!("Quit requested");
                ui.shutdown();
            }
        }
    }
}
