use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SerializeError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SerializeError::Io(ref err) => err.fmt(f),
            SerializeError::Json(ref err) => err.fmt(f),
        }
    }
}

impl Error for SerializeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            SerializeError::Io(ref err) => Some(err),
            SerializeError::Json(ref err) => Some(err),
        }
    }
}

impl From<io::Error> for SerializeError {
    fn from(err: io::Error) -> SerializeError {
        SerializeError::Io(err)
    }
}

impl From<serde_json::Error> for SerializeError {
    fn from(err: serde_json::Error) -> SerializeError {
        SerializeError::Json(err)
    }
}

pub fn to_writer<W: io::Write, T: Serialize>(
    obj: &T,
    mut writer: W,
) -> Result<(), SerializeError> {
    serde_json::to_writer_pretty(&mut writer, &obj)?;
    writer.flush()?;
    Ok(())
}

pub fn to_string<T: Serialize>(obj: &T) -> Result<String, SerializeError> {
    Ok(serde_json::to_string(&obj)?)
}

pub fn from_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, SerializeError> {
    Ok(serde_json::from_str(s)?)
}
