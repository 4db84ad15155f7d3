#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use yansi::Paint;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::log_dir;
use crate::domain::models::AppError;

fn handle_error(err: Error) -> ! {
    if let Some(app_err) = err.downcast_ref::<AppError>() {
        tracing::debug!(error = %app_err, "Exiting with a user facing error");
        ui::print_error(app_err);
        process::exit(1);
    }

    eprintln!(
        "{}",
        Paint::red(format!(
            "Oh no! Parley has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        ui::destruct_terminal_for_panic();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let file_appender = tracing_appender::rolling::never(log_dir(), "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("parley")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    let config = match cli::parse().await {
        Ok(Some(config)) => config,
        Ok(None) => process::exit(0),
        Err(err) => handle_error(err),
    };

    if let Err(err) = ui::start(config).await {
        ui::destruct_terminal_for_panic();
        handle_error(err);
    }

    process::exit(0);
}
