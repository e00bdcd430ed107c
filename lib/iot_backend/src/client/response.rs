use serde::de::DeserializeOwned;
use transport::ErrorBody;

use super::Error;

pub fn parse_json<T: DeserializeOwned>(status: u32, body: &[u8]) -> Result<T, Error> {
    check_status(status, body)?;

    if body.is_empty() {
        return Ok(serde_json::from_value(serde_json::Value::Null)?);
    }

    Ok(serde_json::from_slice(body)?)
}

pub fn parse_void(status: u32, body: &[u8]) -> Result<(), Error> {
    check_status(status, body)
}

fn check_status(status: u32, body: &[u8]) -> Result<(), Error> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error);

    Err(Error::Rejected { status, message })
}
