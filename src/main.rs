// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use pennyledger::{cli, commands, db, utils};

fn init_tracing(verbose: bool) {
    // RUST_LOG > --verbose > warn
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();
}

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();
    init_tracing(matches.get_flag("verbose"));

    let db_override = matches.get_one::<String>("db").map(PathBuf::from);
    let mut conn = db::open_or_init(db_override.as_deref())?;
    let today = chrono::Local::now().date_naive();
    let owner = |conn: &rusqlite::Connection| utils::resolve_owner(conn, matches.get_one::<String>("user"));

    match matches.subcommand() {
        Some(("init", _)) => match db_override {
            Some(p) => println!("Database initialized at {}", p.display()),
            None => println!("Database initialized at {}", db::db_path()?.display()),
        },
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some(("account", sub)) => commands::accounts::handle(&conn, owner(&conn)?, sub)?,
        Some(("category", sub)) => {
            let owner_id = owner(&conn)?;
            commands::categories::handle(&mut conn, owner_id, sub)?
        }
        Some(("tx", sub)) => {
            let owner_id = owner(&conn)?;
            commands::transactions::handle(&mut conn, owner_id, today, sub)?
        }
        Some(("budget", sub)) => commands::budgets::handle(&conn, owner(&conn)?, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&conn, owner(&conn)?, sub)?,
        Some(("dashboard", sub)) => {
            commands::dashboard::handle(&conn, owner(&conn)?, today, sub)?
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
