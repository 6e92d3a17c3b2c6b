use std::sync::LazyLock;

use regex::Regex;

static WHATSAPP_FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(IMG-\d{8}-WA\d{4}\.jpg|VID-\d{8}-WA\d{4}\.mp4)$").unwrap());

/// Whether a filename has the shape WhatsApp gives exported media,
/// e.g. `IMG-20230101-WA0001.jpg` or `VID-20230102-WA0002.mp4`.
pub fn is_whatsapp_media_filename(filename: &str) -> bool {
    WHATSAPP_FILENAME_REGEX.is_match(filename)
}
