use std::fs::File;
use std::io::Read;
use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding as RsEncoding, BIG5, GBK, SHIFT_JIS, WINDOWS_1252};

/// 偵測時取樣的檔案前綴長度上限。 / Maximum prefix length sampled for detection.
pub const PROBE_LEN: usize = 4096;

/// 表示狀態列顯示用的行尾樣式。 / Line ending style reported on the status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
    Cr,
}

impl LineEnding {
    /// 回傳行尾字串本身。 / Returns the literal line ending string.
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }

    /// 回傳狀態列顯示名稱。 / Returns the status-surface label.
    pub fn label(self) -> &'static str {
        match self {
            LineEnding::Lf => "LF",
            LineEnding::CrLf => "CRLF",
            LineEnding::Cr => "CR",
        }
    }
}

/// 偵測到的文字編碼，僅供顯示。 / Detected text encoding, display-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Windows1252,
    ShiftJis,
    Gbk,
    Big5,
}

impl DetectedEncoding {
    pub fn name(self) -> &'static str {
        match self {
            DetectedEncoding::Utf8 => "utf-8",
            DetectedEncoding::Utf16Le => "utf-16le",
            DetectedEncoding::Utf16Be => "utf-16be",
            DetectedEncoding::Windows1252 => "windows-1252",
            DetectedEncoding::ShiftJis => "shift-jis",
            DetectedEncoding::Gbk => "gbk",
            DetectedEncoding::Big5 => "big5",
        }
    }
}

/// 狀態列顯示的檔案狀態：編碼與行尾。 / File status shown on the status surface: encoding plus line ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    pub encoding: DetectedEncoding,
    pub line_ending: LineEnding,
}

impl FileStatus {
    /// 未綁定或無法讀取時的預設狀態。 / Default status for unbound or unreadable files.
    pub fn fallback() -> Self {
        Self {
            encoding: DetectedEncoding::Utf8,
            line_ending: LineEnding::CrLf,
        }
    }

    /// 組成狀態列文字，例如 `utf-8 | CRLF`。 / Renders the status-surface text, e.g. `utf-8 | CRLF`.
    pub fn label(&self) -> String {
        format!("{} | {}", self.encoding.name(), self.line_ending.label())
    }
}

impl Default for FileStatus {
    fn default() -> Self {
        Self::fallback()
    }
}

/// 取樣檔案前綴並偵測編碼與行尾；讀取失敗回傳預設值。 / Samples the file prefix and detects encoding and line ending; read failures yield the fallback.
pub fn probe_path(path: impl AsRef<Path>) -> FileStatus {
    let Ok(mut file) = File::open(path.as_ref()) else {
        return FileStatus::fallback();
    };
    let mut sample = vec![0u8; PROBE_LEN];
    let mut filled = 0;
    // 讀滿取樣緩衝或直到檔案結尾。 / Fill the sample buffer or stop at end of file.
    loop {
        match file.read(&mut sample[filled..]) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                if filled == sample.len() {
                    break;
                }
            }
            Err(_) => return FileStatus::fallback(),
        }
    }
    sample.truncate(filled);
    probe_bytes(&sample)
}

/// 依取樣位元組判定檔案狀態。 / Determines the file status from a sampled prefix.
pub fn probe_bytes(sample: &[u8]) -> FileStatus {
    FileStatus {
        encoding: detect_encoding(sample),
        line_ending: detect_line_ending(sample),
    }
}

fn detect_encoding(sample: &[u8]) -> DetectedEncoding {
    if sample.is_empty() {
        return DetectedEncoding::Utf8;
    }
    if sample.starts_with(b"\xEF\xBB\xBF") {
        return DetectedEncoding::Utf8;
    }
    if sample.starts_with(b"\xFF\xFE") {
        return DetectedEncoding::Utf16Le;
    }
    if sample.starts_with(b"\xFE\xFF") {
        return DetectedEncoding::Utf16Be;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => DetectedEncoding::Utf8,
        // 取樣可能在多位元組字元中間截斷；結尾的不完整序列仍視為 UTF-8。 / The sample may cut a multi-byte character; an incomplete tail sequence still counts as UTF-8.
        Err(err) if err.error_len().is_none() => DetectedEncoding::Utf8,
        Err(_) => {
            let mut detector = EncodingDetector::new();
            detector.feed(sample, true);
            map_rs_encoding(detector.guess(None, true)).unwrap_or(DetectedEncoding::Utf8)
        }
    }
}

fn map_rs_encoding(encoding: &'static RsEncoding) -> Option<DetectedEncoding> {
    if encoding == WINDOWS_1252 {
        Some(DetectedEncoding::Windows1252)
    } else if encoding == SHIFT_JIS {
        Some(DetectedEncoding::ShiftJis)
    } else if encoding == GBK {
        Some(DetectedEncoding::Gbk)
    } else if encoding == BIG5 {
        Some(DetectedEncoding::Big5)
    } else {
        None
    }
}

/// 以 CRLF > LF > CR 的優先序掃描取樣內容。 / Scans the sample with CRLF > LF > CR priority.
fn detect_line_ending(sample: &[u8]) -> LineEnding {
    let mut saw_lf = false;
    let mut saw_cr = false;
    let mut idx = 0;
    while idx < sample.len() {
        match sample[idx] {
            b'\r' => {
                if idx + 1 < sample.len() && sample[idx + 1] == b'\n' {
                    return LineEnding::CrLf;
                }
                saw_cr = true;
            }
            b'\n' => saw_lf = true,
            _ => {}
        }
        idx += 1;
    }
    if saw_lf {
        LineEnding::Lf
    } else if saw_cr {
        LineEnding::Cr
    } else {
        LineEnding::CrLf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::GBK;
    use std::fs;

    #[test]
    fn lf_only_reports_lf() {
        let status = probe_bytes(b"line1\nline2\n");
        assert_eq!(status.line_ending, LineEnding::Lf);
        assert_eq!(status.encoding, DetectedEncoding::Utf8);
    }

    #[test]
    fn crlf_reports_crlf() {
        let status = probe_bytes(b"line1\r\nline2\r\n");
        assert_eq!(status.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn cr_only_reports_cr() {
        let status = probe_bytes(b"line1\rline2");
        assert_eq!(status.line_ending, LineEnding::Cr);
    }

    #[test]
    fn crlf_takes_priority_over_lf() {
        // 同時含有 LF 與 CRLF 時以 CRLF 為準。 / CRLF wins when both LF and CRLF appear.
        let status = probe_bytes(b"a\nb\r\nc");
        assert_eq!(status.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn empty_sample_reports_defaults() {
        let status = probe_bytes(b"");
        assert_eq!(status.encoding, DetectedEncoding::Utf8);
        assert_eq!(status.line_ending, LineEnding::CrLf);
    }

    #[test]
    fn missing_file_reports_defaults() {
        let status = probe_path("/nonexistent/path/to/file.txt");
        assert_eq!(status, FileStatus::fallback());
    }

    #[test]
    fn utf16_le_bom_is_reported() {
        let status = probe_bytes(b"\xFF\xFEh\x00i\x00");
        assert_eq!(status.encoding, DetectedEncoding::Utf16Le);
    }

    #[test]
    fn gbk_payload_is_detected_as_legacy() {
        let (encoded, _, _) = GBK.encode("中文測試內容，編碼偵測用例。");
        let status = probe_bytes(encoded.as_ref());
        assert!(matches!(
            status.encoding,
            DetectedEncoding::Gbk | DetectedEncoding::Big5
        ));
    }

    #[test]
    fn probe_only_consults_bounded_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("large.txt");
        // 前 4096 位元組僅含 LF；CRLF 出現在取樣範圍之外。 / The first 4096 bytes carry only LF; CRLF appears beyond the sample.
        let mut payload = vec![b'a'; PROBE_LEN - 1];
        payload.push(b'\n');
        payload.extend_from_slice(b"tail\r\n");
        fs::write(&file_path, &payload).unwrap();

        let status = probe_path(&file_path);
        assert_eq!(status.line_ending, LineEnding::Lf);
    }

    #[test]
    fn truncated_multibyte_tail_still_reports_utf8() {
        // 完整取樣長度，結尾截斷一個多位元組字元。 / Full sample length with a multi-byte character cut at the tail.
        let mut payload = vec![b'x'; PROBE_LEN - 1];
        payload.push(0xE4); // "中" 的首位元組。 / Lead byte of "中".
        let status = probe_bytes(&payload);
        assert_eq!(status.encoding, DetectedEncoding::Utf8);
    }

    #[test]
    fn status_label_formats_for_display() {
        assert_eq!(FileStatus::fallback().label(), "utf-8 | CRLF");
    }
}
