use anyhow::Result;
use vesti::cli::{
    actions::{server, Action},
    start,
};

#[tokio::main]
async fn main() -> Result<()> {
    let action = start::start()?;

    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
