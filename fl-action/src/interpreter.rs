use std::{
    fs::File,
    io::{self, Write},
    path::Path,
    time::Duration,
};

use crate::{
    Channels,
    bench::{Direction, Sample, timed},
    buffer::Accumulator,
    command::Command,
    dump::dump,
    error::{ActionError, ErrorKind},
    scanner::Scanner,
};

/// Timeout applied to every channel transfer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct Config {
    /// Print timing, throughput and checksum for every transfer.
    pub benchmark: bool,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            benchmark: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builder to create an [Interpreter] and modify configuration options
///
/// # Example
///
/// ```ignore
/// use fl_action::interpreter::Builder;
///
/// let mut interpreter = Builder::new().benchmark(true).build(device);
/// interpreter.run("w0 1a2b;r0 2", &mut std::io::stdout(), &mut std::io::stderr())?;
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Enable or disable benchmark output.
    pub fn benchmark(mut self, enable: bool) -> Self {
        self.config.benchmark = enable;
        self
    }

    /// Set the timeout of each channel transfer
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build<D: Channels>(self, device: D) -> Interpreter<D> {
        Interpreter::new(device, self.config)
    }
}

/// Executes action strings against a device.
///
/// Each call is an independent left-to-right scan: commands run as soon as
/// they are parsed and the first error ends the action string.
#[derive(Debug)]
pub struct Interpreter<D: Channels> {
    device: D,
    config: Config,
}

impl<D: Channels> Interpreter<D> {
    pub fn new(device: D, config: Config) -> Interpreter<D> {
        Interpreter { device, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    /// Runs one action string, dumping the collected read data to `out` on
    /// success and the diagnostic to `err` on failure.
    pub fn run(
        &mut self,
        line: &str,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> Result<(), ActionError> {
        match self.execute(line, out) {
            Ok(data) => {
                if let Err(e) = dump(0x0000_0000, &data, out) {
                    log::error!("Failed to write hex dump: {}", e);
                }
                Ok(())
            }
            Err(error) => {
                if let Err(e) = error.report(line, err) {
                    log::error!("Failed to write diagnostic: {}", e);
                }
                Err(error)
            }
        }
    }

    /// Runs one action string and returns the bytes of all reads that were
    /// not redirected to a file. Benchmark lines are written to `out`.
    pub fn execute(&mut self, line: &str, out: &mut impl Write) -> Result<Vec<u8>, ActionError> {
        log::debug!("Executing action string {:?}", line);
        let mut scanner = Scanner::new(line);
        let mut accumulator = Accumulator::new().map_err(|_| scanner.error(ErrorKind::NoMemory))?;

        let mut executed = 0usize;
        loop {
            while scanner.eat(b';') {}
            // At least one command is required; parsing at the end fails with IllegalChar
            if scanner.at_end() && executed > 0 {
                break;
            }
            let command = Command::parse(&mut scanner)?;
            executed += 1;
            self.dispatch(command, scanner.column(), &mut accumulator, out)?;
            if scanner.peek() != b';' {
                break;
            }
        }
        if !scanner.at_end() {
            return Err(scanner.error(ErrorKind::IllegalChar));
        }

        log::debug!("Action string collected {} bytes", accumulator.len());
        Ok(accumulator.into_inner())
    }

    /// Executes a parsed command. `column` is where the cursor stands, used
    /// for errors that only show up while talking to the device.
    fn dispatch(
        &mut self,
        command: Command,
        column: usize,
        accumulator: &mut Accumulator,
        out: &mut impl Write,
    ) -> Result<(), ActionError> {
        match command {
            Command::Read {
                channel,
                length,
                destination: None,
            } => self.read_into(channel, length, accumulator, column, out),
            Command::Read {
                channel,
                length,
                destination: Some(path),
            } => self.read_to_file(channel, length, &path, column, out),
            Command::Write { channel, data } => self.write(channel, &data, column, out),
            Command::SetConduit { conduit } => {
                log::debug!("Selecting conduit {}", conduit);
                self.device
                    .set_conduit(conduit)
                    .map_err(|e| ActionError::device(e, column))
            }
        }
    }

    fn read_into(
        &mut self,
        channel: u8,
        length: u32,
        accumulator: &mut Accumulator,
        column: usize,
        out: &mut impl Write,
    ) -> Result<(), ActionError> {
        log::debug!("Reading {} bytes from channel {}", length, channel);
        let no_memory = || ActionError::new(ErrorKind::NoMemory, column);
        let length = usize::try_from(length).map_err(|_| no_memory())?;
        let offset = accumulator.append_zeroed(length).map_err(|_| no_memory())?;

        let timeout = self.config.timeout;
        let (result, elapsed) = timed(|| {
            self.device
                .read_channel(timeout, channel, accumulator.tail_mut(offset))
        });
        let data = &accumulator.as_slice()[offset..];
        self.report(Sample::new(Direction::Read, channel, data, elapsed), out);
        result.map_err(|e| ActionError::device(e, column))?;

        log::trace!("Read from channel {}: {:02x?}", channel, data);
        Ok(())
    }

    fn read_to_file(
        &mut self,
        channel: u8,
        length: u32,
        path: &Path,
        column: usize,
        out: &mut impl Write,
    ) -> Result<(), ActionError> {
        log::debug!(
            "Reading {} bytes from channel {} into {}",
            length,
            channel,
            path.display()
        );
        let no_memory = || ActionError::new(ErrorKind::NoMemory, column);
        let length = usize::try_from(length).map_err(|_| no_memory())?;
        let mut data = Vec::new();
        data.try_reserve_exact(length).map_err(|_| no_memory())?;
        data.resize(length, 0x00);

        let timeout = self.config.timeout;
        let (result, elapsed) = timed(|| self.device.read_channel(timeout, channel, &mut data));
        self.report(Sample::new(Direction::Read, channel, &data, elapsed), out);
        result.map_err(|e| ActionError::device(e, column))?;

        let cannot_save = |e: io::Error| ActionError::io(ErrorKind::CannotSave, e, column);
        let mut file = File::create(path).map_err(cannot_save)?;
        file.write_all(&data).map_err(cannot_save)?;
        file.flush().map_err(cannot_save)
    }

    fn write(
        &mut self,
        channel: u8,
        data: &[u8],
        column: usize,
        out: &mut impl Write,
    ) -> Result<(), ActionError> {
        log::debug!("Writing {} bytes to channel {}", data.len(), channel);
        log::trace!("Write to channel {}: {:02x?}", channel, data);

        let timeout = self.config.timeout;
        let (result, elapsed) = timed(|| self.device.write_channel(timeout, channel, data));
        self.report(Sample::new(Direction::Write, channel, data, elapsed), out);
        result.map_err(|e| ActionError::device(e, column))
    }

    fn report(&self, sample: Sample, out: &mut impl Write) {
        if !self.config.benchmark {
            return;
        }
        if let Err(e) = writeln!(out, "{}", sample) {
            log::error!("Failed to write benchmark result: {}", e);
        }
    }
}
