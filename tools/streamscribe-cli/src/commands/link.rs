//! Share link utilities.

use streamscribe_capture_engine::{LinkCodec, SessionId};

/// Print the share link for `id`.
pub fn encode(id: String, base_url: String) -> anyhow::Result<()> {
    let id = SessionId::new(id)?;
    let codec = LinkCodec::new(&base_url)?;
    println!("{}", codec.encode(Some(&id)));
    Ok(())
}

/// Print the session identifier carried by `url`.
pub fn decode(url: String) -> anyhow::Result<()> {
    match LinkCodec::decode_str(&url)? {
        Some(id) => {
            println!("{id}");
            Ok(())
        }
        None => anyhow::bail!("No session identifier in {url}"),
    }
}
