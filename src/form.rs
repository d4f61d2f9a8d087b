use std::convert::Infallible;

use bytes::Bytes;
use futures_util::stream;
use http::{header, HeaderMap};

enum Encoding {
    UrlEncoded,
    Multipart { boundary: String },
}

impl Encoding {
    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let mime: mime::Mime = headers
            .get(header::CONTENT_TYPE)?
            .to_str()
            .ok()?
            .parse()
            .ok()?;

        if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            return Some(Self::UrlEncoded);
        }

        if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
            let boundary = mime.get_param(mime::BOUNDARY)?.as_str().trim_matches('"');
            if boundary.is_empty() {
                return None;
            }

            return Some(Self::Multipart {
                boundary: boundary.to_owned(),
            });
        }

        None
    }
}

/// Looks up `field_name` in a form body.
///
/// `body` is a cheap clone of the buffered request body; the caller keeps its
/// own copy for the inner service. Every parse failure is reported as `None`.
pub(crate) async fn extract(headers: &HeaderMap, body: Bytes, field_name: &str) -> Option<String> {
    let value = match Encoding::from_headers(headers)? {
        Encoding::UrlEncoded => url_encoded(&body, field_name),
        Encoding::Multipart { boundary } => multipart(body, boundary, field_name).await,
    }?;

    (!value.is_empty()).then_some(value)
}

fn url_encoded(body: &[u8], field_name: &str) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .ok()?
        .into_iter()
        .find_map(|(key, value)| (key == field_name).then_some(value))
}

async fn multipart(body: Bytes, boundary: String, field_name: &str) -> Option<String> {
    let stream = stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await.ok()? {
        if field.name() == Some(field_name) {
            return field.text().await.ok();
        }
    }

    None
}
