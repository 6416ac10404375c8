#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The body stream broke before it was fully received.
#[derive(Debug, PartialEq, Eq)]
pub struct Error(pub String);

/// A source of raw body chunks, either a live HTTP response or, in tests,
/// a canned list of byte buffers.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    VecDeque(VecDeque<Bytes>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_vec_deque(vec: VecDeque<Bytes>) -> Self {
        Chunks::VecDeque(vec)
    }

    /// Pulls the next chunk, `None` once the body is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        let chunk = match self {
            Chunks::Response(response) => response
                .chunk()
                .await
                .map_err(|err| Error(err.to_string()))?,
            #[cfg(test)]
            Chunks::VecDeque(vec) => vec.pop_front(),
        };
        if let Some(chunk) = &chunk {
            trace!("received {} body bytes", chunk.len());
        }
        Ok(chunk)
    }
}
