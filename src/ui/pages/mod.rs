use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use itertools::sorted;

use crate::db::TicketStore;
use crate::models::{format_elapsed, Action};

mod page_helpers;
use page_helpers::*;

pub trait Page {
    fn draw_page(&self) -> Result<()>;
    fn handle_input(&self, input: &str) -> Result<Option<Action>>;
    fn as_any(&self) -> &dyn Any;
}

pub struct HomePage {
    pub store: Rc<RefCell<TicketStore>>,
}

impl Page for HomePage {
    fn draw_page(&self) -> Result<()> {
        let store = self.store.borrow();

        println!("---------------------------- TICKETS ----------------------------");
        println!("     id     |          description           |    status    |    elapsed   ");

        // Sort tickets by id and print
        let tickets = store.tickets();
        let sorted_keys = sorted(tickets.keys());

        for key in sorted_keys {
            let ticket = &tickets[key];
            let line = format!(
                "{}|{}|{}|{}",
                get_column_string(key, 12),
                get_column_string(&ticket.description, 32),
                get_column_string(&ticket.status.to_string(), 14),
                get_column_string(&format_elapsed(ticket.elapsed_secs), 14)
            );
            println!("{}", line);
        }

        println!();
        println!();

        println!("[q] quit | [a] add ticket | [:id:] navigate to ticket");

        Ok(())
    }

    fn handle_input(&self, input: &str) -> Result<Option<Action>> {
        match input {
            "q" => Ok(Some(Action::Exit)),
            "a" => Ok(Some(Action::CreateTicket)),
            _ => {
                if self.store.borrow().contains(input) {
                    return Ok(Some(Action::NavigateToTicketDetail {
                        ticket_id: input.to_owned(),
                    }));
                }

                Ok(None)
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct TicketDetail {
    pub ticket_id: String,
    pub store: Rc<RefCell<TicketStore>>,
}

impl Page for TicketDetail {
    fn draw_page(&self) -> Result<()> {
        let store = self.store.borrow();
        let ticket = store.get(&self.ticket_id)?;

        println!("----------------------------- TICKET -----------------------------");
        println!("     id     |          description           |    status    |    elapsed   ");

        let line = format!(
            "{}|{}|{}|{}",
            get_column_string(&self.ticket_id, 12),
            get_column_string(&ticket.description, 32),
            get_column_string(&ticket.status.to_string(), 14),
            get_column_string(&format_elapsed(ticket.elapsed_secs), 14)
        );
        println!("{}", line);

        println!();
        println!();

        println!("[p] previous | [s] start | [t] stop | [f] finish");

        Ok(())
    }

    fn handle_input(&self, input: &str) -> Result<Option<Action>> {
        let ticket_id = self.ticket_id.clone();

        match input {
            "p" => Ok(Some(Action::NavigateToPreviousPage)),
            "s" => Ok(Some(Action::StartTicket { ticket_id })),
            "t" => Ok(Some(Action::StopTicket { ticket_id })),
            "f" => Ok(Some(Action::FinishTicket { ticket_id })),
            _ => Ok(None),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
