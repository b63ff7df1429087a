use std::fs;
use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use encoding_rs::{Decoder, Encoding};
use log::{debug, error, info};

use crate::core::command::TranslatorCommand;
use crate::core::error::FlowError;
use crate::core::event::{RunnerEvent, StreamKind};

const CHUNK_SIZE: usize = 4096;

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, FlowError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| FlowError::invalid(format!("unknown output encoding '{label}'")))
}

pub fn run_with_events(
    command: TranslatorCommand,
    working_dir: PathBuf,
    encoding: &'static Encoding,
) -> Receiver<RunnerEvent> {
    let (event_tx, event_rx) = mpsc::channel::<RunnerEvent>();

    thread::spawn(move || {
        if let Err(err) = fs::create_dir_all(&working_dir) {
            let _ = event_tx.send(RunnerEvent::SpawnFailed(FlowError::SpawnFailed {
                program: command.program.clone(),
                message: format!(
                    "cannot create save directory {}: {err}",
                    working_dir.display()
                ),
            }));
            return;
        }

        debug!("exec: {}", command.display());

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                let failure = if err.kind() == ErrorKind::NotFound {
                    FlowError::BinaryNotFound {
                        program: command.program.clone(),
                    }
                } else {
                    FlowError::SpawnFailed {
                        program: command.program.clone(),
                        message: err.to_string(),
                    }
                };
                error!("{failure}");
                let _ = event_tx.send(RunnerEvent::SpawnFailed(failure));
                return;
            }
        };

        info!("started {} (pid {})", command.program, child.id());
        let _ = event_tx.send(RunnerEvent::Spawned { pid: child.id() });

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_chunk_reader(
                StreamKind::Stdout,
                stdout,
                encoding,
                event_tx.clone(),
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_chunk_reader(
                StreamKind::Stderr,
                stderr,
                encoding,
                event_tx.clone(),
            ));
        }

        for reader in readers {
            let _ = reader.join();
        }

        let exit_code = match child.wait() {
            Ok(status) => {
                info!("{} exited with {status}", command.program);
                status.code()
            }
            Err(err) => {
                error!("failed to wait for {}: {err}", command.program);
                None
            }
        };

        let _ = event_tx.send(RunnerEvent::Exited { exit_code });
    });

    event_rx
}

fn spawn_chunk_reader<R: Read + Send + 'static>(
    stream: StreamKind,
    mut reader: R,
    encoding: &'static Encoding,
    sender: Sender<RunnerEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut decoder = encoding.new_decoder();
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            };

            let text = decode_chunk(&mut decoder, &buf[..read], false);
            if text.is_empty() {
                continue;
            }
            if sender.send(RunnerEvent::Output { stream, text }).is_err() {
                return;
            }
        }

        let text = decode_chunk(&mut decoder, &[], true);
        if !text.is_empty() {
            let _ = sender.send(RunnerEvent::Output { stream, text });
        }
    })
}

pub fn decode_chunk(decoder: &mut Decoder, bytes: &[u8], last: bool) -> String {
    let capacity = decoder
        .max_utf8_buffer_length(bytes.len())
        .unwrap_or(bytes.len() * 3 + 16);
    let mut text = String::with_capacity(capacity);
    let _ = decoder.decode_to_string(bytes, &mut text, last);
    text.retain(|ch| ch != char::REPLACEMENT_CHARACTER);
    text
}
