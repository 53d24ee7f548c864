use crate::config::DecoderConfig;
use crate::constants::MIN_BODY_LINE_LEN;
use crate::decode::Remainder;
use crate::error::DecodeError;
use crate::line_source::{strip_checksum, LineSource};
use crate::status::{read_timestamp, Status};
use crate::variant::{ResponseVariant, VariantDecoder};
use log::{debug, error, warn};
use scip2_data::ScanData;
use std::time::SystemTime;

/// Receives `(receive_time, echo_back, status, scan)` for every delivered response.
pub type ScanCallback = Box<dyn FnMut(SystemTime, &str, &str, ScanData) + Send>;

/// Steps of decoding one response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameState {
    Start,
    Status,
    Timestamp,
    Body,
    Deliver,
    End,
    Aborted,
}

impl FrameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FrameState::End | FrameState::Aborted)
    }
}

/// How a response ended.
#[derive(Debug)]
pub enum FrameOutcome {
    /// Status `00`. Nothing was delivered.
    Quiet,
    /// The scan was handed to the callback.
    Delivered,
    /// The device reported this status. The callback got an empty scan.
    DeviceError(String),
    /// The response was malformed or cut short. Nothing was delivered.
    Aborted(DecodeError),
}

/// Per-response state, dropped once the response is finished.
struct Frame<'a> {
    receive_time: SystemTime,
    echo_back: &'a str,
    status: &'a str,
    scan: ScanData,
    remainder: Remainder,
    outcome: Option<FrameOutcome>,
}

impl Frame<'_> {
    fn finish(&mut self, outcome: FrameOutcome) -> FrameState {
        let next = match outcome {
            FrameOutcome::Quiet | FrameOutcome::Delivered => FrameState::End,
            FrameOutcome::DeviceError(_) | FrameOutcome::Aborted(_) => FrameState::Aborted,
        };
        self.outcome = Some(outcome);
        next
    }

    fn abort(&mut self, err: DecodeError) -> FrameState {
        error!("{} aborted: {}", self.echo_back, err);
        self.finish(FrameOutcome::Aborted(err))
    }
}

/// Decodes the scan responses of one command (`MD`, `ME`, ...).
pub struct ResponseStream {
    decoder: VariantDecoder,
    config: DecoderConfig,
    callback: ScanCallback,
}

impl ResponseStream {
    pub fn new<F>(variant: ResponseVariant, config: DecoderConfig, callback: F) -> ResponseStream
    where
        F: FnMut(SystemTime, &str, &str, ScanData) + Send + 'static,
    {
        ResponseStream {
            decoder: VariantDecoder::new(variant, config.base_offset),
            config,
            callback: Box::new(callback),
        }
    }

    pub fn variant(&self) -> ResponseVariant {
        self.decoder.variant()
    }

    /// Replaces the callback. The last registered one wins.
    pub fn register_callback<F>(&mut self, callback: F)
    where
        F: FnMut(SystemTime, &str, &str, ScanData) + Send + 'static,
    {
        self.callback = Box::new(callback);
    }

    /// Decodes one response whose echo-back and status were already read.
    /// The timestamp line and the body are pulled from `source`.
    ///
    /// The callback runs once for a successful or device-error response and
    /// never for a quiet or malformed one.
    pub fn handle_frame<S: LineSource + ?Sized>(
        &mut self,
        receive_time: SystemTime,
        echo_back: &str,
        status: &str,
        source: &mut S,
    ) -> FrameOutcome {
        let mut frame = Frame {
            receive_time,
            echo_back,
            status,
            scan: ScanData::with_capacity(
                self.config.expected_samples,
                self.decoder.variant().has_intensities(),
            ),
            remainder: Remainder::new(),
            outcome: None,
        };

        let mut state = FrameState::Start;
        while !state.is_terminal() {
            state = self.step(state, &mut frame, source);
        }
        frame
            .outcome
            .unwrap_or(FrameOutcome::Aborted(DecodeError::UnexpectedEndOfInput))
    }

    fn step<S: LineSource + ?Sized>(
        &mut self,
        state: FrameState,
        frame: &mut Frame,
        source: &mut S,
    ) -> FrameState {
        match state {
            FrameState::Start => FrameState::Status,
            FrameState::Status => match Status::parse(frame.status) {
                Status::Quiet => {
                    debug!("{} is not ready yet", frame.echo_back);
                    frame.finish(FrameOutcome::Quiet)
                }
                Status::Success => FrameState::Timestamp,
                Status::Error(code) => {
                    warn!("{} errored with {}", frame.echo_back, code);
                    (self.callback)(
                        frame.receive_time,
                        frame.echo_back,
                        frame.status,
                        ScanData::new(),
                    );
                    frame.finish(FrameOutcome::DeviceError(code))
                }
            },
            FrameState::Timestamp => match source.next_line() {
                Ok(Some(line)) => match read_timestamp(&line, self.config.base_offset) {
                    Ok(timestamp) => {
                        frame.scan.timestamp = timestamp;
                        FrameState::Body
                    }
                    Err(e) => frame.abort(e),
                },
                Ok(None) => frame.abort(DecodeError::MissingTimestamp),
                Err(e) => frame.abort(e),
            },
            FrameState::Body => match source.next_line() {
                Ok(Some(line)) if line.is_empty() => FrameState::Deliver,
                Ok(Some(line)) => match self.decode_body_line(&line, frame) {
                    Ok(()) => FrameState::Body,
                    Err(e) => frame.abort(e),
                },
                Ok(None) => frame.abort(DecodeError::UnexpectedEndOfInput),
                Err(e) => frame.abort(e),
            },
            FrameState::Deliver => {
                let scan = std::mem::take(&mut frame.scan);
                debug!(
                    "{} delivered {} steps at {}",
                    frame.echo_back,
                    scan.len(),
                    scan.timestamp
                );
                (self.callback)(frame.receive_time, frame.echo_back, frame.status, scan);
                frame.finish(FrameOutcome::Delivered)
            }
            FrameState::End | FrameState::Aborted => state,
        }
    }

    fn decode_body_line(&self, line: &str, frame: &mut Frame) -> Result<(), DecodeError> {
        let data = strip_checksum(line);
        if data.len() < MIN_BODY_LINE_LEN {
            return Err(DecodeError::LineTooShort(data.len()));
        }
        frame.remainder = self
            .decoder
            .decode_line(frame.remainder, data, &mut frame.scan)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::encode;
    use std::sync::{Arc, Mutex};

    type Delivery = (String, String, ScanData);

    fn recording_stream(variant: ResponseVariant) -> (ResponseStream, Arc<Mutex<Vec<Delivery>>>) {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&deliveries);
        let stream = ResponseStream::new(
            variant,
            DecoderConfig::default(),
            move |_, echo_back: &str, status: &str, scan| {
                sink.lock()
                    .unwrap()
                    .push((echo_back.to_string(), status.to_string(), scan));
            },
        );
        (stream, deliveries)
    }

    fn handle(stream: &mut ResponseStream, status: &str, input: &str) -> FrameOutcome {
        let mut source = input.as_bytes();
        stream.handle_frame(SystemTime::now(), "MD0000108001101", status, &mut source)
    }

    #[test]
    fn test_quiet_frame_is_not_delivered() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let input = "abcdX\nAAAx\n\n";
        let mut source = input.as_bytes();
        let outcome = stream.handle_frame(SystemTime::now(), "MD", "00", &mut source);
        assert!(matches!(outcome, FrameOutcome::Quiet));
        assert!(deliveries.lock().unwrap().is_empty());
        // nothing was consumed
        assert_eq!(source, input.as_bytes());
    }

    #[test]
    fn test_device_error_is_delivered_once() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "0E", "abcdX\nAAAx\n\n");
        assert!(matches!(outcome, FrameOutcome::DeviceError(ref code) if code == "0E"));

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        let (echo_back, status, scan) = &deliveries[0];
        assert_eq!(echo_back, "MD0000108001101");
        assert_eq!(status, "0E");
        assert_eq!(scan, &ScanData::new());
    }

    #[test]
    fn test_range_only_frame() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcdX\nAAAx\nBBBy\n\n");
        assert!(matches!(outcome, FrameOutcome::Delivered));

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 1);
        let (_, status, scan) = &deliveries[0];
        assert_eq!(status, "99");
        assert_eq!(scan.timestamp, 13_053_172);
        assert_eq!(scan.ranges, vec![70737, 74898]);
        assert!(scan.intensities.is_empty());
    }

    #[test]
    fn test_range_and_intensity_frame_across_lines() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeAndIntensity);
        let values: Vec<u64> = (0..20).map(|i| ((1000 + i) << 18) | (50 + i)).collect();
        let encoded = encode(&values, 6);
        // 64 data characters per line, like the device sends them
        let mut input = String::from("0000_\n");
        for chunk in encoded.as_bytes().chunks(64) {
            input.push_str(std::str::from_utf8(chunk).unwrap());
            input.push_str("Z\n");
        }
        input.push('\n');

        let outcome = handle(&mut stream, "99", &input);
        assert!(matches!(outcome, FrameOutcome::Delivered));

        let deliveries = deliveries.lock().unwrap();
        let (_, _, scan) = &deliveries[0];
        assert_eq!(scan.timestamp, 0);
        assert_eq!(scan.ranges, (1000..1020).collect::<Vec<u32>>());
        assert_eq!(scan.intensities, (50..70).collect::<Vec<u32>>());
    }

    #[test]
    fn test_short_timestamp_aborts() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcX\nAAAx\n\n");
        assert!(matches!(
            outcome,
            FrameOutcome::Aborted(DecodeError::TimestampTooShort(3))
        ));
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_timestamp_aborts() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "");
        assert!(matches!(
            outcome,
            FrameOutcome::Aborted(DecodeError::MissingTimestamp)
        ));
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_short_body_line_aborts() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcdX\nAAAx\nABx\n\n");
        assert!(matches!(
            outcome,
            FrameOutcome::Aborted(DecodeError::LineTooShort(2))
        ));
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_character_aborts() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcdX\nAA~x\n\n");
        assert!(matches!(
            outcome,
            FrameOutcome::Aborted(DecodeError::InvalidCharacter {
                character: '~',
                position: 2
            })
        ));
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_non_utf8_byte_aborts_as_invalid_character() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let mut source: &[u8] = b"abcdX\nAA\xffx\n\n";
        let outcome = stream.handle_frame(SystemTime::now(), "MD0000108001101", "99", &mut source);
        match outcome {
            FrameOutcome::Aborted(e) => {
                assert!(matches!(e, DecodeError::InvalidCharacter { position: 2, .. }));
                assert!(!e.is_source_error());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_end_of_input_in_body_aborts() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcdX\nAAAx\nBBBy\n");
        assert!(matches!(
            outcome,
            FrameOutcome::Aborted(DecodeError::UnexpectedEndOfInput)
        ));
        assert!(deliveries.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_body_is_delivered() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        let outcome = handle(&mut stream, "99", "abcdX\n\n");
        assert!(matches!(outcome, FrameOutcome::Delivered));
        let deliveries = deliveries.lock().unwrap();
        assert!(deliveries[0].2.is_empty());
    }

    #[test]
    fn test_frames_do_not_share_state() {
        let (mut stream, deliveries) = recording_stream(ResponseVariant::RangeOnly);
        // the first frame ends with two characters that never complete a group
        handle(&mut stream, "99", "abcdX\nAAABBx\n\n");
        handle(&mut stream, "99", "abcdX\nCCCx\n\n");

        let deliveries = deliveries.lock().unwrap();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].2.ranges, vec![70737]);
        assert_eq!(deliveries[1].2.ranges, vec![(19 << 12) | (19 << 6) | 19]);
    }

    #[test]
    fn test_register_callback_replaces_previous() {
        let (mut stream, first) = recording_stream(ResponseVariant::RangeOnly);
        let (_, second) = recording_stream(ResponseVariant::RangeOnly);
        let sink = Arc::clone(&second);
        stream.register_callback(move |_, echo_back: &str, status: &str, scan| {
            sink.lock()
                .unwrap()
                .push((echo_back.to_string(), status.to_string(), scan));
        });

        handle(&mut stream, "99", "abcdX\nAAAx\n\n");
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_frame_state_is_terminal() {
        assert!(FrameState::End.is_terminal());
        assert!(FrameState::Aborted.is_terminal());
        assert!(!FrameState::Body.is_terminal());
        assert!(!FrameState::Deliver.is_terminal());
    }
}
