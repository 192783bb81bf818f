use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::db::TicketStore;
use crate::models::Action;
use crate::ui::{HomePage, Page, TicketDetail};

/// User prompts behind boxed closures so navigator tests can script input
/// instead of reading stdin.
pub struct Prompts {
    pub create_ticket: Box<dyn Fn() -> (String, String)>,
}

impl Prompts {
    pub fn new() -> Self {
        Self { create_ticket: Box::new(crate::io_utils::prompt_new_ticket) }
    }
}

pub struct Navigator {
    pages: Vec<Box<dyn Page>>,
    prompts: Prompts,
    store: Rc<RefCell<TicketStore>>,
}

impl Navigator {
    pub fn new(store: Rc<RefCell<TicketStore>>) -> Self {
        Self {
            pages: vec![Box::new(HomePage { store: Rc::clone(&store) })],
            prompts: Prompts::new(),
            store,
        }
    }

    pub fn get_current_page(&self) -> Option<&Box<dyn Page>> {
        self.pages.last()
    }

    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::NavigateToTicketDetail { ticket_id } => {
                self.pages.push(Box::new(TicketDetail {
                    ticket_id,
                    store: Rc::clone(&self.store),
                }));
            }
            Action::NavigateToPreviousPage => {
                if !self.pages.is_empty() {
                    self.pages.pop();
                }
            }
            Action::CreateTicket => {
                let (id, description) = (self.prompts.create_ticket)();
                self.store
                    .borrow_mut()
                    .add(id, description)
                    .context("failed to create ticket")?;
            }
            Action::StartTicket { ticket_id } => {
                self.store
                    .borrow_mut()
                    .start(&ticket_id)
                    .context("failed to start ticket")?;
            }
            Action::StopTicket { ticket_id } => {
                self.store
                    .borrow_mut()
                    .stop(&ticket_id)
                    .context("failed to stop ticket")?;
            }
            Action::FinishTicket { ticket_id } => {
                self.store
                    .borrow_mut()
                    .finish(&ticket_id)
                    .context("failed to finish ticket")?;
            }
            Action::Exit => {
                self.pages.clear();
            }
        }

        Ok(())
    }

    #[cfg(test)]
    fn set_prompts(&mut self, prompts: Prompts) {
        self.prompts = prompts;
    }
}
