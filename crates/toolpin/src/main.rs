//! toolpin binary entry point.

use std::time::{Duration, Instant};
use toolpin::cli::{self, Cli};
use toolpin::tracing::{TracingConfig, init_tracing_with_events};
use toolpin::{CliError, EXIT_FAILURE, commands, exit_code_for, render_error};
use toolpin_events::renderers::{CliRenderer, CliRendererConfig, JsonRenderer};
use toolpin_events::{EventReceiver, emit_command_completed, emit_command_started};

/// Exit code for SIGINT (128 + signal number 2)
const EXIT_SIGINT: i32 = 130;

/// How long to wait for the renderer to drain after the command finishes.
const RENDER_DRAIN: Duration = Duration::from_secs(1);

fn main() {
    // Tracing may be unusable during a panic, so write directly.
    #[allow(clippy::print_stderr)]
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("toolpin panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            // The event system is not running yet.
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Fatal error: Failed to create tokio runtime: {e}");
            }
            std::process::exit(EXIT_FAILURE);
        }
    };

    let code = runtime.block_on(run(cli));
    drop(runtime);
    std::process::exit(code);
}

async fn run(cli: Cli) -> i32 {
    let config = TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
        filter: None,
    };
    let receiver = match init_tracing_with_events(config) {
        Ok(receiver) => receiver,
        Err(e) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{e:?}");
            }
            return EXIT_FAILURE;
        }
    };
    let renderer = spawn_renderer(&cli, receiver);

    let command = cli.command.name();
    emit_command_started!(command, cli.command.args());
    let started = Instant::now();

    let code = tokio::select! {
        biased;

        _ = tokio::signal::ctrl_c() => EXIT_SIGINT,
        result = commands::execute(&cli) => match result {
            Ok(code) => code,
            Err(err) => fail(err, cli.json),
        },
    };

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    emit_command_completed!(command, code == 0, duration_ms);

    if tokio::time::timeout(RENDER_DRAIN, renderer).await.is_err() {
        tracing::debug!("Renderer did not finish in time");
    }
    code
}

fn fail(err: CliError, json_mode: bool) -> i32 {
    let code = exit_code_for(&err);
    render_error(err, json_mode);
    code
}

fn spawn_renderer(cli: &Cli, receiver: EventReceiver) -> tokio::task::JoinHandle<()> {
    if cli.json {
        tokio::spawn(JsonRenderer::new().run(receiver))
    } else {
        let config = CliRendererConfig::detect(cli.no_color, cli.verbose);
        tokio::spawn(CliRenderer::with_config(config).run(receiver))
    }
}
