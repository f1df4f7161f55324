use tasktrack::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let state = AppState::builder().config(config.clone()).build()?;

    Server::new(config).serve(router(state)).await?;

    Ok(())
}
