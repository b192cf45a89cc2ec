//! JSON I/O handling for CLI
//!
//! - Input: single JSON object via stdin
//! - Output: single JSON object via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request<T: DeserializeOwned>() -> CliResult<T> {
    read_request_from(io::stdin().lock())
}

/// Read a JSON request from any reader
pub fn read_request_from<T: DeserializeOwned, R: Read>(mut reader: R) -> CliResult<T> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::request("Empty input"));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_response_to(&mut io::stdout(), data)
}

pub fn write_response_to<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(writer, &response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_error_to(&mut io::stdout(), code, message)
}

pub fn write_error_to<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(writer, &response)
}

/// Write plain text to stdout
pub fn write_text(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()?;
    Ok(())
}

fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value).map_err(io::Error::from)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
