//! Frames exchanged between the coordinator and its workers, and the bundles they carry.

use byteorder::{BigEndian, ByteOrder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::archive::TreeArchive;
use crate::error::Error;
use crate::layout::*;
use crate::rule::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Task,
    Result,
    Failure,
    Release,
}

impl MessageKind {

    pub fn code(&self) -> u8 {
        match self {
            MessageKind::Task => KIND_TASK,
            MessageKind::Result => KIND_RESULT,
            MessageKind::Failure => KIND_FAILURE,
            MessageKind::Release => KIND_RELEASE,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, Error> {
        match code {
            KIND_TASK => Ok(MessageKind::Task),
            KIND_RESULT => Ok(MessageKind::Result),
            KIND_FAILURE => Ok(MessageKind::Failure),
            KIND_RELEASE => Ok(MessageKind::Release),
            x => Err(Error::Frame(format!("unknown message kind {}", x))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub kind: MessageKind,
    pub worker: usize,
    pub payload: Vec<u8>,
}

impl Frame {

    pub fn new(kind: MessageKind, worker: usize, payload: Vec<u8>) -> Self {
        Self { kind, worker, payload }
    }

    pub fn encode<T: Serialize>(kind: MessageKind, worker: usize, payload: &T) -> Result<Self, Error> {
        Ok(Self::new(kind, worker, serde_json::to_vec(payload)?))
    }

    pub fn failure(worker: usize, message: &str) -> Self {
        Self::new(MessageKind::Failure, worker, message.as_bytes().to_vec())
    }

    pub fn release(worker: usize) -> Self {
        Self::new(MessageKind::Release, worker, Vec::new())
    }

    pub fn to_bytes(&self) -> Vec<u8> {

        let mut bytes = vec![0u8; HEADER_SIZE + self.payload.len()];

        bytes[KIND_OFFSET] = self.kind.code();
        BigEndian::write_u64(
            &mut bytes[WORKER_OFFSET..WORKER_OFFSET + WORKER_SIZE],
            self.worker as u64,
        );
        BigEndian::write_u64(
            &mut bytes[PAYLOAD_LENGTH_OFFSET..PAYLOAD_LENGTH_OFFSET + PAYLOAD_LENGTH_SIZE],
            self.payload.len() as u64,
        );
        bytes[PAYLOAD_START..].copy_from_slice(&self.payload);

        bytes
    }

    /// Parses exactly one frame; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {

        if bytes.len() < HEADER_SIZE {
            return Err(Error::Frame(format!(
                "{} bytes is shorter than the {} byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let kind = MessageKind::from_code(bytes[KIND_OFFSET])?;
        let worker = BigEndian::read_u64(&bytes[WORKER_OFFSET..WORKER_OFFSET + WORKER_SIZE]);
        let payload_length = BigEndian::read_u64(&bytes[PAYLOAD_LENGTH_OFFSET..PAYLOAD_LENGTH_OFFSET + PAYLOAD_LENGTH_SIZE]);

        if payload_length > MAX_PAYLOAD_SIZE {
            return Err(Error::Frame(format!("payload of {} bytes is too large", payload_length)));
        }

        let available = (bytes.len() - HEADER_SIZE) as u64;
        if available != payload_length {
            return Err(Error::Frame(format!(
                "header announces {} payload bytes, frame holds {}",
                payload_length, available
            )));
        }

        let worker = usize::try_from(worker)
            .map_err(|_| Error::Frame(format!("worker index {} does not fit this platform", worker)))?;

        Ok(Self {
            kind,
            worker,
            payload: bytes[PAYLOAD_START..].to_vec(),
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_slice(&self.payload)?)
    }

    /// Payload of a result frame; a failure frame becomes [`Error::Worker`].
    pub fn into_results<T: DeserializeOwned>(self) -> Result<T, Error> {
        match self.kind {
            MessageKind::Result => self.decode(),
            MessageKind::Failure => Err(Error::Worker {
                worker: self.worker,
                message: String::from_utf8_lossy(&self.payload).into_owned(),
            }),
            other => Err(Error::Frame(format!("expected a result from worker {}, got {:?}", self.worker, other))),
        }
    }
}

/// Everything a worker needs to run its share of a traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBundle<R, B, S> {
    /// Path identifier of the dispatched pair.
    pub path: usize,
    pub rule: R,
    pub query: TreeArchive<B, S>,
    pub reference: TreeArchive<B, S>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBundle<T> {
    pub results: T,
}

impl<T> ResultBundle<T> {

    pub fn new(results: T) -> Self {
        Self { results }
    }

    pub fn merge_into<B, S, R: Rule<B, S, Results = T>>(self, rule: &mut R) {
        rule.merge(self.results);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {

        let frame = Frame::new(MessageKind::Result, 3, vec![7, 8, 9]);
        let bytes = frame.to_bytes();

        assert_eq!(bytes.len(), 17 + 3);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..9], &[0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(&bytes[9..17], &[0, 0, 0, 0, 0, 0, 0, 3]);
        assert_eq!(&bytes[17..], &[7, 8, 9]);

        assert_eq!(Frame::from_bytes(&bytes).unwrap(), frame);
    }

    #[test]
    fn truncated_and_padded_frames_are_rejected() {

        let bytes = Frame::encode(MessageKind::Result, 1, &vec![1u64, 2, 3]).unwrap().to_bytes();

        assert!(Frame::from_bytes(&bytes[..10]).is_err());
        assert!(Frame::from_bytes(&bytes[..bytes.len() - 1]).is_err());

        let mut padded = bytes.clone();
        padded.push(0);
        assert!(Frame::from_bytes(&padded).is_err());

        let mut unknown = bytes.clone();
        unknown[0] = 9;
        assert!(Frame::from_bytes(&unknown).is_err());

        let mut huge = bytes;
        BigEndian::write_u64(&mut huge[9..17], MAX_PAYLOAD_SIZE + 1);
        assert!(Frame::from_bytes(&huge).is_err());
    }

    #[test]
    fn failure_frames_become_worker_errors() {

        let frame = Frame::from_bytes(&Frame::failure(4, "out of memory").to_bytes()).unwrap();

        match frame.into_results::<u64>() {
            Err(Error::Worker { worker, message }) => {
                assert_eq!(worker, 4);
                assert_eq!(message, "out of memory");
            }
            x => panic!("unexpected {:?}", x),
        }

        assert!(Frame::release(2).into_results::<u64>().is_err());
    }

    #[test]
    fn result_bundle_payload() {

        let bundle = ResultBundle::new(vec![(0.5, 3usize), (1.5, 4)]);
        let frame = Frame::encode(MessageKind::Result, 2, &bundle).unwrap();
        let decoded: ResultBundle<Vec<(f64, usize)>> = Frame::from_bytes(&frame.to_bytes())
            .unwrap()
            .into_results()
            .unwrap();

        assert_eq!(decoded, bundle);
    }
}
