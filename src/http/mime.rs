//! MIME type detection based on file extensions.

const FALLBACK: &str = "application/text";

/// Returns a reasonable MIME type for `path` based on its extension.
pub fn mime_type(path: &str) -> &'static str {
    let Some(pos) = path.rfind('.') else {
        return FALLBACK;
    };

    match path[pos..].to_ascii_lowercase().as_str() {
        ".htm" | ".html" | ".php" => "text/html",
        ".css" => "text/css",
        ".txt" => "text/plain",
        ".js" => "application/javascript",
        ".json" => "application/json",
        ".xml" => "application/xml",
        ".swf" => "application/x-shockwave-flash",
        ".flv" => "video/x-flv",
        ".png" => "image/png",
        ".jpe" | ".jpeg" | ".jpg" => "image/jpeg",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        ".ico" => "image/vnd.microsoft.icon",
        ".tiff" | ".tif" => "image/tiff",
        ".svg" | ".svgz" => "image/svg+xml",
        _ => FALLBACK,
    }
}
