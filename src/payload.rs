// payload.rs

use std::{error, fmt, io::Cursor};

use anyhow::bail;
use serde::Serialize;

pub const PAYLOAD_BUF_SIZE: usize = 200;

pub type Payload = heapless::Vec<u8, PAYLOAD_BUF_SIZE>;

#[derive(Debug)]
pub struct PayloadTooLarge;

impl fmt::Display for PayloadTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "payload does not fit in {PAYLOAD_BUF_SIZE} bytes")
    }
}

impl error::Error for PayloadTooLarge {}

/// Serializes `value` as compact JSON into a fixed buffer.
pub fn encode_payload<T: Serialize>(value: &T) -> anyhow::Result<Payload> {
    let mut buf = [0u8; PAYLOAD_BUF_SIZE];
    let mut cursor = Cursor::new(&mut buf[..]);
    if let Err(e) = serde_json::to_writer(&mut cursor, value) {
        if e.is_io() {
            bail!(PayloadTooLarge);
        }
        bail!("Cannot encode payload: {e}");
    }
    let len = cursor.position() as usize;

    match Payload::from_slice(&buf[..len]) {
        Ok(p) => Ok(p),
        Err(_) => bail!(PayloadTooLarge),
    }
}


// EOF
