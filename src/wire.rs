//! Wire framing and payload codecs for the TCP consumer.
//!
//! Framing is pinned bit-exact: every message is a fixed-width ASCII command
//! field, optionally followed by a fixed-width ASCII decimal length field and
//! that many payload bytes. The payload bytes themselves are an
//! implementation detail of whichever `SerializationMode` a port was built
//! with.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Width, in bytes, of every ASCII field in the frame header.
pub const CMD_LEN: usize = 16;

/// The command tokens recognized at the wire boundary. Anything else closes
/// the connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Ready,
    Compute,
    Result,
    Empty,
}

impl Command {
    fn as_str(self) -> &'static str {
        match self {
            Command::Ready => "ready",
            Command::Compute => "compute",
            Command::Result => "result",
            Command::Empty => "empty",
        }
    }

    fn parse(token: &str) -> Result<Self> {
        match token.trim() {
            "ready" => Ok(Command::Ready),
            "compute" => Ok(Command::Compute),
            "result" => Ok(Command::Result),
            "empty" => Ok(Command::Empty),
            other => Err(Error::WireProtocolError(format!("unknown command {other:?}"))),
        }
    }
}

fn pad(field: &str) -> Result<[u8; CMD_LEN]> {
    if field.len() > CMD_LEN {
        return Err(Error::WireProtocolError(format!(
            "field {field:?} exceeds CMD_LEN={CMD_LEN}"
        )));
    }
    let mut buf = [b' '; CMD_LEN];
    buf[..field.len()].copy_from_slice(field.as_bytes());
    Ok(buf)
}

fn read_field(stream: &mut impl Read) -> Result<String> {
    let mut buf = [0u8; CMD_LEN];
    stream.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).trim().to_string())
}

/// Writes a command with no payload, e.g. `ready` or `empty`.
pub fn write_bare_command(stream: &mut impl Write, command: Command) -> Result<()> {
    stream.write_all(&pad(command.as_str())?)?;
    Ok(())
}

/// Writes a command followed by its length-prefixed payload, e.g.
/// `compute | len | bytes` or `result | len | bytes`.
pub fn write_framed_command(stream: &mut impl Write, command: Command, payload: &[u8]) -> Result<()> {
    stream.write_all(&pad(command.as_str())?)?;
    stream.write_all(&pad(&payload.len().to_string())?)?;
    stream.write_all(payload)?;
    Ok(())
}

/// The result of reading one message off the wire: either a bare command or
/// one with a payload attached.
pub enum Frame {
    Bare(Command),
    Framed(Command, Vec<u8>),
}

/// Reads one command, and its payload if the command carries one.
pub fn read_frame(stream: &mut impl Read) -> Result<Frame> {
    let command = Command::parse(&read_field(stream)?)?;
    match command {
        Command::Compute | Command::Result => {
            let len_field = read_field(stream)?;
            let len: usize = len_field
                .parse()
                .map_err(|_| Error::WireProtocolError(format!("bad length field {len_field:?}")))?;
            let mut payload = vec![0u8; len];
            stream.read_exact(&mut payload)?;
            Ok(Frame::Framed(command, payload))
        },
        Command::Ready | Command::Empty => Ok(Frame::Bare(command)),
    }
}

/// Which byte format a port's payloads are encoded in. Agreed once, at port
/// construction; never negotiated per item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationMode {
    Text,
    Binary,
    Xml,
}

impl SerializationMode {
    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            SerializationMode::Text => {
                serde_json::to_vec(value).map_err(|e| Error::WireProtocolError(e.to_string()))
            },
            SerializationMode::Binary => {
                bincode::serialize(value).map_err(|e| Error::WireProtocolError(e.to_string()))
            },
            SerializationMode::Xml => {
                let mut buf = Vec::new();
                quick_xml::se::to_writer(&mut buf, value)
                    .map_err(|e| Error::WireProtocolError(e.to_string()))?;
                Ok(buf)
            },
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            SerializationMode::Text => {
                serde_json::from_slice(bytes).map_err(|e| Error::WireProtocolError(e.to_string()))
            },
            SerializationMode::Binary => {
                bincode::deserialize(bytes).map_err(|e| Error::WireProtocolError(e.to_string()))
            },
            SerializationMode::Xml => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| Error::WireProtocolError(e.to_string()))?;
                quick_xml::de::from_str(text).map_err(|e| Error::WireProtocolError(e.to_string()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn bare_command_round_trips() {
        let mut buf = Vec::new();
        write_bare_command(&mut buf, Command::Ready).unwrap();
        let mut cursor = Cursor::new(buf);
        match read_frame(&mut cursor).unwrap() {
            Frame::Bare(Command::Ready) => {},
            _ => panic!("expected bare ready"),
        }
    }

    #[test]
    fn framed_command_round_trips() {
        let mut buf = Vec::new();
        write_framed_command(&mut buf, Command::Compute, b"hello").unwrap();
        let mut cursor = Cursor::new(buf);
        match read_frame(&mut cursor).unwrap() {
            Frame::Framed(Command::Compute, payload) => assert_eq!(payload, b"hello"),
            _ => panic!("expected framed compute"),
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&pad("bogus").unwrap());
        let mut cursor = Cursor::new(buf);
        assert!(matches!(read_frame(&mut cursor), Err(Error::WireProtocolError(_))));
    }

    #[test]
    fn text_mode_round_trips_a_vector() {
        let original = vec![1.0_f64, 2.5, -3.0];
        let encoded = SerializationMode::Text.encode(&original).unwrap();
        let decoded: Vec<f64> = SerializationMode::Text.decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn binary_mode_round_trips_a_vector() {
        let original = vec![1.0_f64, 2.5, -3.0];
        let encoded = SerializationMode::Binary.encode(&original).unwrap();
        let decoded: Vec<f64> = SerializationMode::Binary.decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }
}
