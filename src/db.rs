use std::{collections::HashMap, fs, io};

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::models::{Ticket, TicketError};

/// In-memory ticket map plus its durable backing file. Loaded once at
/// startup and written back whole after every successful mutation.
pub struct TicketStore {
    tickets: HashMap<String, Ticket>,
    database: Box<dyn Database>,
    clock: Box<dyn Clock>,
}

impl TicketStore {
    pub fn new(file_path: String, clock: Box<dyn Clock>) -> Result<Self, TicketError> {
        Self::with_database(Box::new(JSONFileDatabase { file_path }), clock)
    }

    pub fn with_database(
        database: Box<dyn Database>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, TicketError> {
        let tickets = database.read_tickets()?;
        debug!(count = tickets.len(), "loaded ticket store");

        Ok(Self { tickets, database, clock })
    }

    pub fn tickets(&self) -> &HashMap<String, Ticket> {
        &self.tickets
    }

    pub fn get(&self, id: &str) -> Result<&Ticket, TicketError> {
        self.tickets.get(id).ok_or_else(|| TicketError::NotFound(id.to_owned()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tickets.contains_key(id)
    }

    /// Insert a new ticket in `Waiting` with zero elapsed time. Validation
    /// happens before the map is touched, so a rejected add changes nothing.
    pub fn add(&mut self, id: String, description: String) -> Result<(), TicketError> {
        if id.is_empty() {
            return Err(TicketError::InvalidId);
        }
        if self.tickets.contains_key(&id) {
            return Err(TicketError::DuplicateId(id));
        }

        self.tickets.insert(id.clone(), Ticket::new(id, description));
        self.save()?;

        Ok(())
    }

    pub fn start(&mut self, id: &str) -> Result<(), TicketError> {
        let now = self.clock.now();
        self.get_mut(id)?.start(now)?;
        self.save()?;

        Ok(())
    }

    pub fn stop(&mut self, id: &str) -> Result<(), TicketError> {
        let now = self.clock.now();
        self.get_mut(id)?.stop(now)?;
        self.save()?;

        Ok(())
    }

    pub fn finish(&mut self, id: &str) -> Result<(), TicketError> {
        let now = self.clock.now();
        self.get_mut(id)?.finish(now);
        self.save()?;

        Ok(())
    }

    /// Write the whole map to the backing file. A failed save keeps the
    /// in-memory state so nothing the user did is lost.
    pub fn save(&self) -> Result<(), TicketError> {
        if let Err(error) = self.database.write_tickets(&self.tickets) {
            warn!(%error, "failed to persist ticket store");
            return Err(error);
        }

        Ok(())
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Ticket, TicketError> {
        self.tickets.get_mut(id).ok_or_else(|| TicketError::NotFound(id.to_owned()))
    }
}

pub trait Database {
    fn read_tickets(&self) -> Result<HashMap<String, Ticket>, TicketError>;
    fn write_tickets(&self, tickets: &HashMap<String, Ticket>) -> Result<(), TicketError>;
}

struct JSONFileDatabase {
    pub file_path: String,
}

impl Database for JSONFileDatabase {
    fn read_tickets(&self) -> Result<HashMap<String, Ticket>, TicketError> {
        let json_data = match fs::read_to_string(&self.file_path) {
            Ok(json_data) => json_data,
            // First run: no file yet is not an error.
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(file = %self.file_path, "ticket file not found, starting empty");
                return Ok(HashMap::new());
            }
            Err(error) => {
                return Err(TicketError::Persistence {
                    context: "could not read ticket file",
                    message: error.to_string(),
                });
            }
        };

        serde_json::from_str(&json_data).map_err(|error| TicketError::Persistence {
            context: "ticket file is not valid JSON",
            message: error.to_string(),
        })
    }

    fn write_tickets(&self, tickets: &HashMap<String, Ticket>) -> Result<(), TicketError> {
        let json_data =
            serde_json::to_string_pretty(tickets).map_err(|error| TicketError::Persistence {
                context: "could not serialize tickets",
                message: error.to_string(),
            })?;

        fs::write(&self.file_path, json_data).map_err(|error| TicketError::Persistence {
            context: "could not write ticket file",
            message: error.to_string(),
        })
    }
}

pub mod test_utils {
    use std::{cell::RefCell, collections::HashMap};

    use super::*;

    pub struct MockDB {
        last_written_state: RefCell<HashMap<String, Ticket>>,
    }

    impl MockDB {
        pub fn new() -> Self {
            Self { last_written_state: RefCell::new(HashMap::new()) }
        }

        pub fn with_tickets(tickets: HashMap<String, Ticket>) -> Self {
            Self { last_written_state: RefCell::new(tickets) }
        }
    }

    impl Database for MockDB {
        fn read_tickets(&self) -> Result<HashMap<String, Ticket>, TicketError> {
            let state = self.last_written_state.borrow().clone();
            Ok(state)
        }

        fn write_tickets(&self, tickets: &HashMap<String, Ticket>) -> Result<(), TicketError> {
            let latest_state = &self.last_written_state;
            *latest_state.borrow_mut() = tickets.clone();
            Ok(())
        }
    }

    pub struct BrokenDB;

    impl Database for BrokenDB {
        fn read_tickets(&self) -> Result<HashMap<String, Ticket>, TicketError> {
            Ok(HashMap::new())
        }

        fn write_tickets(&self, _tickets: &HashMap<String, Ticket>) -> Result<(), TicketError> {
            Err(TicketError::Persistence {
                context: "could not write ticket file",
                message: "disk full".to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{BrokenDB, MockDB};
    use super::*;
    use crate::clock::test_utils::FixedClock;
    use crate::models::Status;
    use std::rc::Rc;

    fn empty_store(clock: Rc<FixedClock>) -> TicketStore {
        TicketStore::with_database(Box::new(MockDB::new()), Box::new(SharedClock(clock))).unwrap()
    }

    // Lets a test keep a handle to the clock the store owns.
    struct SharedClock(Rc<FixedClock>);

    impl Clock for SharedClock {
        fn now(&self) -> f64 {
            self.0.now()
        }
    }

    #[test]
    fn store_should_load_existing_tickets() {
        let mut existing = HashMap::new();
        let mut ticket = Ticket::new("T1".to_owned(), "printer jam".to_owned());
        ticket.start(10.0).unwrap();
        existing.insert("T1".to_owned(), ticket.clone());

        let store = TicketStore::with_database(
            Box::new(MockDB::with_tickets(existing)),
            Box::new(FixedClock::new(0.0)),
        )
        .unwrap();

        assert_eq!(store.get("T1").unwrap(), &ticket);
    }

    #[test]
    fn add_should_work() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(clock);

        let result = store.add("T1".to_owned(), "printer jam".to_owned());

        assert_eq!(result.is_ok(), true);

        let ticket = store.get("T1").unwrap();
        assert_eq!(ticket.status, Status::Waiting);
        assert_eq!(ticket.elapsed_secs, 0.0);
        assert_eq!(ticket.description, "printer jam");
    }

    #[test]
    fn add_should_error_on_duplicate_id_and_leave_store_unchanged() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(clock);

        store.add("T1".to_owned(), "printer jam".to_owned()).unwrap();
        let before = store.tickets().clone();

        let result = store.add("T1".to_owned(), "different description".to_owned());

        assert_eq!(result.is_err(), true);
        assert_eq!(store.tickets(), &before);
    }

    #[test]
    fn add_should_error_on_empty_id() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(clock);

        let result = store.add("".to_owned(), "printer jam".to_owned());

        assert_eq!(result.is_err(), true);
        assert_eq!(store.tickets().len(), 0);
    }

    #[test]
    fn get_should_error_on_unknown_id() {
        let clock = Rc::new(FixedClock::new(0.0));
        let store = empty_store(clock);

        let result = store.get("T999");

        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn start_should_stamp_the_clock_and_persist() {
        let clock = Rc::new(FixedClock::new(1000.0));
        let database = MockDB::new();
        let mut store = TicketStore::with_database(
            Box::new(database),
            Box::new(SharedClock(Rc::clone(&clock))),
        )
        .unwrap();

        store.add("T1".to_owned(), "printer jam".to_owned()).unwrap();
        store.start("T1").unwrap();

        let ticket = store.get("T1").unwrap();
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.started_at, Some(1000.0));
    }

    #[test]
    fn start_should_error_on_unknown_id() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(clock);

        let result = store.start("T999");

        assert_eq!(result.is_err(), true);
    }

    #[test]
    fn start_twice_should_error_and_keep_first_session() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(Rc::clone(&clock));

        store.add("T1".to_owned(), "".to_owned()).unwrap();
        store.start("T1").unwrap();

        clock.set(60.0);
        let result = store.start("T1");

        assert_eq!(result.is_err(), true);
        assert_eq!(store.get("T1").unwrap().started_at, Some(0.0));
    }

    #[test]
    fn start_stop_finish_scenario_should_accumulate_elapsed() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(Rc::clone(&clock));

        store.add("T1".to_owned(), "printer jam".to_owned()).unwrap();

        store.start("T1").unwrap();
        clock.set(120.0);
        store.stop("T1").unwrap();

        assert_eq!(store.get("T1").unwrap().elapsed_secs, 120.0);
        assert_eq!(store.get("T1").unwrap().status, Status::Waiting);

        clock.set(200.0);
        store.start("T1").unwrap();
        clock.set(230.0);
        store.finish("T1").unwrap();

        let ticket = store.get("T1").unwrap();
        assert_eq!(ticket.elapsed_secs, 150.0);
        assert_eq!(ticket.status, Status::Done);
        assert_eq!(ticket.started_at, None);
    }

    #[test]
    fn finish_should_be_idempotent_through_the_store() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store = empty_store(Rc::clone(&clock));

        store.add("T1".to_owned(), "".to_owned()).unwrap();
        store.finish("T1").unwrap();
        let before = store.get("T1").unwrap().clone();

        clock.set(500.0);
        store.finish("T1").unwrap();

        assert_eq!(store.get("T1").unwrap(), &before);
    }

    #[test]
    fn mutations_should_reach_the_database() {
        let clock = Rc::new(FixedClock::new(0.0));
        let database = MockDB::new();
        let mut store = TicketStore::with_database(
            Box::new(database),
            Box::new(SharedClock(Rc::clone(&clock))),
        )
        .unwrap();

        store.add("T1".to_owned(), "printer jam".to_owned()).unwrap();
        clock.set(30.0);
        store.start("T1").unwrap();

        // Reload through a fresh store sharing nothing but the database state.
        let written = store.database.read_tickets().unwrap();
        assert_eq!(written.get("T1"), store.tickets().get("T1"));
    }

    #[test]
    fn failed_save_should_keep_in_memory_state() {
        let clock = Rc::new(FixedClock::new(0.0));
        let mut store =
            TicketStore::with_database(Box::new(BrokenDB), Box::new(SharedClock(clock))).unwrap();

        let result = store.add("T1".to_owned(), "printer jam".to_owned());

        assert_eq!(result.is_err(), true);
        // The ticket stays so the user can retry the save later.
        assert_eq!(store.contains("T1"), true);
    }

    mod json_file_database {
        use super::*;
        use std::io::Write;

        #[test]
        fn read_should_return_empty_map_for_missing_file() {
            let database = JSONFileDatabase {
                file_path: "does-not-exist/chamados.json".to_owned(),
            };

            let tickets = database.read_tickets().unwrap();
            assert_eq!(tickets.len(), 0);
        }

        #[test]
        fn read_should_error_for_invalid_json() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(file, "{{ not json").unwrap();

            let database = JSONFileDatabase {
                file_path: file.path().to_str().unwrap().to_owned(),
            };

            let result = database.read_tickets();
            assert_eq!(result.is_err(), true);
        }

        #[test]
        fn read_should_parse_a_file_written_by_the_original_tool() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(
                file,
                r#"{{
                    "T1": {{
                        "id": "T1",
                        "descricao": "printer jam",
                        "status": "Em andamento",
                        "tempo_gasto": 120.5,
                        "inicio": 1700000000.25
                    }}
                }}"#
            )
            .unwrap();

            let database = JSONFileDatabase {
                file_path: file.path().to_str().unwrap().to_owned(),
            };

            let tickets = database.read_tickets().unwrap();
            let ticket = tickets.get("T1").unwrap();

            assert_eq!(ticket.description, "printer jam");
            assert_eq!(ticket.status, Status::InProgress);
            assert_eq!(ticket.elapsed_secs, 120.5);
            assert_eq!(ticket.started_at, Some(1700000000.25));
        }

        #[test]
        fn write_then_read_should_round_trip_every_field() {
            let file = tempfile::NamedTempFile::new().unwrap();
            let database = JSONFileDatabase {
                file_path: file.path().to_str().unwrap().to_owned(),
            };

            let mut tickets = HashMap::new();
            let mut in_progress = Ticket::new("T1".to_owned(), "printer jam".to_owned());
            in_progress.start(1000.5).unwrap();
            tickets.insert("T1".to_owned(), in_progress);

            let mut done = Ticket::new("T2".to_owned(), "password reset".to_owned());
            done.start(0.0).unwrap();
            done.finish(42.0);
            tickets.insert("T2".to_owned(), done);

            tickets.insert("T3".to_owned(), Ticket::new("T3".to_owned(), "".to_owned()));

            database.write_tickets(&tickets).unwrap();
            let read_back = database.read_tickets().unwrap();

            assert_eq!(read_back, tickets);
        }

        #[test]
        fn save_of_empty_store_should_write_an_empty_object() {
            let file = tempfile::NamedTempFile::new().unwrap();
            let database = JSONFileDatabase {
                file_path: file.path().to_str().unwrap().to_owned(),
            };

            database.write_tickets(&HashMap::new()).unwrap();

            let contents = fs::read_to_string(file.path()).unwrap();
            assert_eq!(contents, "{}");
        }
    }
}
