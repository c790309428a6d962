// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the tenant management service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::error::Error;
use std::process;
use tenancy_server::assemble;
use tenancy_server::config::Config;
use tenancy_server::version::BuildStamp;

/// Tenant management service.
#[derive(Parser)]
#[command(name = "tenancy", version, about)]
struct Cli {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,
}

/// Subcommands of the binary.
#[derive(Subcommand)]
enum Command {
    /// Starts the RPC server with the configuration from the environment.
    Start,

    /// Prints details about the build of this binary.
    Version,
}

/// Runs the server until it fails or until the process is interrupted.
async fn start() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let server = assemble(config).await?;

    let stop = server.stop_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted; stopping server");
                stop.stop();
            }
            Err(e) => warn!("Cannot watch for interrupts: {}", e),
        }
    });

    server.start().await?;
    Ok(())
}

/// Formats `e` along with all of its causes.
fn describe(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    message
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Start => start().await,
        Command::Version => {
            println!("{}", BuildStamp::current());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", describe(e.as_ref()));
        process::exit(1);
    }
}
