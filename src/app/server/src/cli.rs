// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Parser)]
#[command(name = crate::BINARY_NAME, version, about = "Lectern platform core server")]
pub struct Cli {
    /// Sets the level of verbosity (repeat for more)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path to the YAML configuration file
    #[arg(long, global = true, value_name = "FILE", env = "LECTERN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Runs the HTTP server until interrupted
    Run(RunArgs),

    /// Removes expired sign-in nonces and exits
    SweepNonces,
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Interface to listen on, overrides `http.address`
    #[arg(long)]
    pub address: Option<IpAddr>,

    /// Port to listen on, overrides `http.port` (use 0 for a random port)
    #[arg(long)]
    pub port: Option<u16>,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
