//! File type labels
//!
//! Maps a file name's extension to the coarse type label stored in a record.

/// Label used when the extension is missing or not recognised
pub const UNKNOWN: &str = "unknown";

/// Type label for a file name, matched on its lowercased extension
pub fn label_for(file_name: &str) -> &'static str {
    let ext = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => return UNKNOWN,
    };

    match ext.as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "ico" | "tiff" | "tif" | "webp"
        | "psd" | "raw" => "image",
        "mp4" | "m4v" | "f4v" | "f4p" | "f4a" | "f4b" | "mov" => "video",
        "ts" => "video_timestamp",
        "txt" | "doc" | "docx" | "odt" | "rtf" | "tex" | "wks" | "wps" => "text",
        _ => UNKNOWN,
    }
}
