/// Extensions recognised as images, lowercase
const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "avif"];

/// Returns whether `key` names an image, judged by its extension only
#[must_use]
pub fn is_image(key: &str) -> bool {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name.rsplit_once('.').is_some_and(|(_, ext)| {
        IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
}
