use std::io::{Error, ErrorKind};

use dotenv::dotenv;
use log::*;

use tripvote::config::Config;
use tripvote::store::VoteStore;
use tripvote::{build_app, AppState};

fn startup_error<E: std::fmt::Display>(err: E) -> Error {
    error!("Could not start tripvote! {}", err);
    Error::new(ErrorKind::Other, err.to_string())
}

#[async_std::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv().ok();
    pretty_env_logger::init();

    let config = Config::load().map_err(startup_error)?;
    let trips = config.catalog().map_err(startup_error)?;
    info!("Loaded {} trip options", trips.options().len());

    match VoteStore::connect(&config.database).await {
        Ok(store) => {
            let state = AppState::new(store, trips);
            let app = build_app(state, &config).map_err(startup_error)?;
            info!("Listening on {}", config.listen_addr());
            app.listen(config.listen_addr()).await?;
            Ok(())
        }
        Err(err) => {
            error!("Could not initialize the vote store! {:?}", err);
            Err(Error::new(ErrorKind::Other, err))
        }
    }
}
