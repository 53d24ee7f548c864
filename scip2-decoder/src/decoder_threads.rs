use crate::constants::JOIN_TIMEOUT_MS;
use crate::dispatcher::{DispatchOutcome, ResponseDispatcher};
use crate::error::DecodeError;
use crate::line_source::LineSource;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{error, warn};
use scip2_data::ScanData;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime};

/// One response handed over by the decoder thread.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanEvent {
    pub receive_time: SystemTime,
    pub echo_back: String,
    pub status: String,
    pub scan: ScanData,
}

/// Struct that contains the decoder thread.
pub struct DecoderThread {
    pub(crate) terminator_tx: Sender<bool>,
    // disconnected once the thread returns
    pub(crate) finished_rx: Receiver<()>,
    pub(crate) thread: Option<JoinHandle<()>>,
}

pub(crate) fn decode_responses<S: LineSource>(
    mut source: S,
    mut dispatcher: ResponseDispatcher,
    terminator_rx: Receiver<bool>,
) {
    while !do_terminate(&terminator_rx) {
        match dispatcher.process(SystemTime::now(), &mut source) {
            Ok(DispatchOutcome::EndOfInput) => return,
            Ok(_) => (),
            // the device is idle between responses
            Err(DecodeError::TimeoutError) => (),
            Err(e) => {
                error!("{e}");
                return;
            }
        }
    }
}

pub(crate) fn do_terminate(terminator_rx: &Receiver<bool>) -> bool {
    terminator_rx.try_recv().unwrap_or(false)
}

/// Function to join the decoder thread.
/// This function is automatically called when `decoder_thread` is dropped.
///
/// The terminator is only seen between responses. A thread still blocked
/// in its line source after `JOIN_TIMEOUT_MS` is detached instead of joined.
pub fn join(decoder_thread: &mut DecoderThread) {
    // fails only when the thread already returned
    let _ = decoder_thread.terminator_tx.send(true);

    let thread = match decoder_thread.thread.take() {
        Some(thread) => thread,
        None => return,
    };
    let timeout = Duration::from_millis(JOIN_TIMEOUT_MS);
    match decoder_thread.finished_rx.recv_timeout(timeout) {
        Err(RecvTimeoutError::Timeout) => {
            warn!("Decoder thread is blocked reading its source. Detaching it.");
        }
        _ => {
            if thread.join().is_err() {
                error!("Decoder thread panicked");
            }
        }
    }
}

impl Drop for DecoderThread {
    fn drop(&mut self) {
        join(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_do_terminate() {
        let (tx, rx) = bounded(10);
        assert!(!do_terminate(&rx));
        tx.send(true).unwrap();
        assert!(do_terminate(&rx));
        drop(tx);
        assert!(!do_terminate(&rx));
    }

    #[test]
    fn test_decode_responses_stops_when_terminated() {
        let (tx, rx) = bounded(10);
        tx.send(true).unwrap();
        // never read: the loop checks the terminator first
        let source: &[u8] = b"MD0000108001101\n99b\n";
        decode_responses(source, ResponseDispatcher::new(), rx);
    }

    #[test]
    fn test_decode_responses_returns_at_end_of_input() {
        let (_tx, rx) = bounded(10);
        let source: &[u8] = b"VV\n00P\nVEND:Hokuyo;[\n\n";
        decode_responses(source, ResponseDispatcher::new(), rx);
    }
}
