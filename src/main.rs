use std::process::ExitCode;

use fipradio_lib::Action;

#[tokio::main]
async fn main() -> ExitCode {
  fipradio_lib::init_logging();

  let action = match std::env::args().nth(1) {
    Some(arg) => match arg.parse() {
      Ok(action) => action,
      Err(e) => {
        log::error!("{}", e);
        return ExitCode::from(2);
      }
    },
    None => Action::Play,
  };

  let result = match fipradio_lib::load_config() {
    Ok(config) => fipradio_lib::run(action, config).await,
    Err(e) => Err(e),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{}", e);
      ExitCode::FAILURE
    }
  }
}
