use std::cell::RefCell;
use std::env;
use std::rc::Rc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

mod models;

mod clock;
use clock::SystemClock;

mod db;
use db::TicketStore;

mod ui;

mod io_utils;
use io_utils::*;

mod navigator;
use navigator::*;

const DEFAULT_TICKET_FILE: &str = "chamados.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let file_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_TICKET_FILE.to_owned());

    // A corrupt ticket file aborts startup rather than being overwritten
    // with an empty store.
    let store = TicketStore::new(file_path.clone(), Box::new(SystemClock))
        .with_context(|| format!("could not load tickets from `{}`", file_path))?;
    let store = Rc::new(RefCell::new(store));

    let mut nav = Navigator::new(store);

    loop {
        clearscreen::clear().unwrap();

        let page = match nav.get_current_page() {
            Some(page) => page,
            None => break,
        };

        if let Err(error) = page.draw_page() {
            println!("Error rendering page: {}", error);
            println!("Press any key to continue...");
            wait_for_key_press();
            nav.handle_action(models::Action::NavigateToPreviousPage)?;
            continue;
        }

        let input = get_user_input();

        let action = match page.handle_input(input.trim()) {
            Ok(Some(action)) => action,
            Ok(None) | Err(_) => continue,
        };

        if let Err(error) = nav.handle_action(action) {
            println!("Error: {:#}", error);
            println!("Press any key to continue...");
            wait_for_key_press();
        }
    }

    Ok(())
}
