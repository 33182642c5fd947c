//! Flate streams for the image data we write ourselves

use crate::error::Result;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};
use std::io::Write;

/// Zlib-encode `data` into a `FlateDecode` stream with `dict` as its dictionary.
///
/// The stream is marked as already compressed so lopdf leaves it alone on save.
pub(crate) fn flate_stream(mut dict: Dictionary, data: &[u8]) -> Result<Object> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;

    dict.set("Filter", "FlateDecode");
    let mut stream = Stream::new(dict, encoder.finish()?);
    stream.allows_compression = false;
    Ok(Object::Stream(stream))
}

#[cfg(test)]
pub(crate) fn inflate(data: &[u8]) -> Vec<u8> {
    use std::io::Read;

    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}
