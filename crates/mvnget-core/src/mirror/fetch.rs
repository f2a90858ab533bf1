//! Single HTTP GET attempts via libcurl Easy handles.
//!
//! Each call is one attempt against one fully-joined URL; failover between
//! mirrors lives in [`super::MirrorRouter`].

use std::path::Path;

use super::error::AttemptError;
use super::Timeouts;
use crate::storage::PartFile;

const USER_AGENT: &str = concat!("mvnget/", env!("CARGO_PKG_VERSION"));

fn easy_for(url: &str, timeouts: &Timeouts, total: std::time::Duration) -> Result<curl::easy::Easy, AttemptError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.useragent(USER_AGENT)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(timeouts.connect)?;
    easy.low_speed_limit(1024)?;
    easy.low_speed_time(timeouts.low_speed)?;
    easy.timeout(total)?;
    Ok(easy)
}

fn check_status(easy: &mut curl::easy::Easy) -> Result<(), AttemptError> {
    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(AttemptError::Http(code));
    }
    Ok(())
}

/// GET `url` and return the body as text (directory listings, manifests).
pub(crate) fn get_text(url: &str, timeouts: &Timeouts) -> Result<String, AttemptError> {
    let mut body: Vec<u8> = Vec::new();
    let mut easy = easy_for(url, timeouts, timeouts.browse)?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }
    check_status(&mut easy)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// GET `url` streaming the body into `<dest>.part`, then rename onto `dest`.
/// The body is never held in memory. Returns the number of bytes written.
pub(crate) fn get_to_file(url: &str, dest: &Path, timeouts: &Timeouts) -> Result<u64, AttemptError> {
    let mut part = PartFile::create(dest)?;
    let mut write_err: Option<std::io::Error> = None;

    let performed = (|| -> Result<(), AttemptError> {
        let mut easy = easy_for(url, timeouts, timeouts.download)?;
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match part.write_chunk(data) {
                Ok(()) => Ok(data.len()),
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()?;
        }
        check_status(&mut easy)
    })();

    if let Some(e) = write_err {
        part.discard();
        return Err(AttemptError::Storage(e));
    }
    if let Err(e) = performed {
        part.discard();
        return Err(e);
    }
    Ok(part.finalize()?)
}
