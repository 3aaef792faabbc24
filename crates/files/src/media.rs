//! Best-effort media type detection.
//!
//! Content sniffing (via `infer`) wins when bytes are available; otherwise the extension
//! decides. The result is a hint for listings and downloads and is never authoritative.

use crate::names::split_extension;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// Number of leading bytes read from a file for sniffing.
const SNIFF_LEN: u64 = 8192;

fn from_extension(extension: &str) -> Option<&'static str> {
    let media_type = match extension.to_ascii_lowercase().as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "zip" => "application/zip",
        "rar" => "application/vnd.rar",
        "7z" => "application/x-7z-compressed",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(media_type)
}

/// Guesses a media type from a file name and, optionally, its leading bytes.
pub fn guess(name: &str, head: Option<&[u8]>) -> String {
    if let Some(kind) = head.and_then(infer::get) {
        return kind.mime_type().to_owned();
    }

    let (_, extension) = split_extension(name);
    from_extension(extension.trim_start_matches('.'))
        .unwrap_or(DEFAULT_MEDIA_TYPE)
        .to_owned()
}

/// Guesses the media type of a file on disk, sniffing its first bytes when readable.
pub fn guess_for_path(path: &Path) -> String {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let mut head = Vec::new();
    let sniffed = fs::File::open(path)
        .and_then(|file| file.take(SNIFF_LEN).read_to_end(&mut head))
        .is_ok();

    guess(name, sniffed.then_some(head.as_slice()))
}
