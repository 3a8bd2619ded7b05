use zonexfer::settings::Settings;
use zonexfer::{Error, LineSink, ProcessSink, RecordSink, Session};

use env_logger::Env;

use std::env;
use std::io;
use std::net::TcpStream;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = Settings::load(env::args().skip(1))?;
    log::debug!("Settings loaded:\n{:?}", settings);

    let stream = TcpStream::connect((settings.server.as_str(), settings.port))?;
    stream.set_read_timeout(settings.read_timeout())?;
    log::info!("Connected to {}.", stream.peer_addr()?);

    let mut sink: Box<dyn RecordSink> = match &settings.database_builder {
        Some(program) => Box::new(ProcessSink::spawn(program).map_err(Error::Sink)?),
        None => Box::new(LineSink::new(io::stdout().lock())),
    };

    let session = Session::new(stream, settings.zone.clone());
    if let Err(err) = session.run(&mut rand::thread_rng(), sink.as_mut()) {
        if let Err(abort) = sink.abort() {
            log::error!("Could not abort the record sink: {}", abort);
        }
        return Err(err);
    }

    sink.finish().map_err(Error::Sink)
}
