// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = lectern_server::cli::Cli::parse();

    if let Err(err) = lectern_server::run(cli).await {
        eprintln!("Error: {}", err.reason());
        std::process::exit(1);
    }
}
