pub mod server;

/// Action to execute after CLI parsing.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}
