#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The body stream broke before it was complete.
#[derive(Debug, PartialEq, Eq)]
pub struct Error;

/// A source of body chunks.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    Fixed(VecDeque<Bytes>),
}

impl Chunks {
    #[inline]
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_fixed<I: IntoIterator<Item = Bytes>>(chunks: I) -> Self {
        Chunks::Fixed(chunks.into_iter().collect())
    }

    /// Returns the next chunk, or `None` when the body has ended.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => response.chunk().await.map_err(|err| {
                debug!("failed to read body chunk: {err}");
                Error
            }),
            #[cfg(test)]
            Chunks::Fixed(chunks) => Ok(chunks.pop_front()),
        }
    }
}
