use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use cityscape_citygen::{City, CityConfiguration, generate};
use cityscape_common::ConfigurationError;

/// A city finished off the frame timeline.
#[derive(Debug)]
pub(crate) struct Finished {
    pub ticket: u64,
    pub texture_count: u32,
    pub city: Result<City, ConfigurationError>,
}

/// Runs city generation on short-lived threads and hands results back over a
/// channel. Nothing is installed here; the renderer drains finished work at
/// frame boundaries.
#[derive(Debug)]
pub(crate) struct GenerationWorker {
    tx: Sender<Finished>,
    rx: Receiver<Finished>,
    in_flight: usize,
    ready: Vec<Finished>,
}

impl GenerationWorker {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            rx,
            in_flight: 0,
            ready: Vec::new(),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start generating `config` on a new thread.
    pub fn spawn(
        &mut self,
        ticket: u64,
        config: CityConfiguration,
        texture_count: u32,
    ) -> std::io::Result<()> {
        let tx = self.tx.clone();
        thread::Builder::new()
            .name(format!("citygen-{ticket}"))
            .spawn(move || {
                let city = generate(&config, texture_count);
                // The renderer may be gone; the result is simply dropped then.
                let _ = tx.send(Finished {
                    ticket,
                    texture_count,
                    city,
                });
            })?;
        self.in_flight += 1;
        Ok(())
    }

    /// Collect whatever has finished without blocking.
    pub fn poll(&mut self) {
        while let Ok(done) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.ready.push(done);
        }
    }

    /// Block until every started generation has finished.
    pub fn wait(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(done) => {
                    self.in_flight -= 1;
                    self.ready.push(done);
                }
                Err(_) => break,
            }
        }
    }

    /// Finished results in ticket order.
    pub fn take_ready(&mut self) -> Vec<Finished> {
        self.poll();
        let mut ready = std::mem::take(&mut self.ready);
        ready.sort_by_key(|f| f.ticket);
        ready
    }
}
