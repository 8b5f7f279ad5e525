use taskgate::config::Settings;
use taskgate::server::{Gateway, GatewayServer};

fn run() -> Result<(), String> {
    let settings = Settings::load().map_err(|err| err.to_string())?;
    let bind_address = settings.bind_address.clone();
    let gateway = Gateway::new(settings).map_err(|err| err.to_string())?;
    let server = GatewayServer::bind(gateway).map_err(|err| err.to_string())?;
    println!("taskgate listening on {bind_address}");
    server.run();
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
