//! EPG (Electronic Program Guide) Parser
//! Streaming parser for XMLTV documents. Individual bad `<programme>` records
//! are dropped; only a document that is not well-formed XML fails the parse.
//! Accepts plain or gzip-compressed (.xml.gz) bytes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{BufRead, Read};
use std::sync::LazyLock;
use std::thread::JoinHandle;

use chrono::{DateTime, FixedOffset};
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use regex::Regex;
use tracing::{debug, trace, warn};

use crate::error::EpgError;
use crate::models::Program;

/// `YYYYMMDDHHMMSS ±HHMM`
static XMLTV_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{14} [+-]\d{4}$").expect("valid timestamp regex"));

/// Channel information from EPG
#[derive(Debug, Clone, PartialEq)]
pub struct EpgChannel {
    /// Channel ID (matches `tvg-id` in playlists)
    pub id: String,
    /// First display name
    pub name: String,
    /// Channel icon/logo URL (optional)
    pub icon: Option<String>,
}

/// Everything recovered from one XMLTV document
#[derive(Debug, Clone, Default)]
pub struct EpgDocument {
    /// Channel information indexed by channel ID
    pub channels: HashMap<String, EpgChannel>,
    /// Programs in document order
    pub programs: Vec<Program>,
    /// Number of `<programme>` records dropped as invalid
    pub skipped: usize,
}

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    Root,
    Channel,
    Programme,
    Title,
    Desc,
    Category,
    DisplayName,
}

/// A `<programme>` element still being read
#[derive(Debug, Default)]
struct PendingProgramme {
    channel: Option<String>,
    start: Option<String>,
    stop: Option<String>,
    title: String,
    title_seen: bool,
    description: Option<String>,
    category: Option<String>,
}

impl PendingProgramme {
    fn open(e: &BytesStart) -> Self {
        Self {
            channel: get_attribute(e, b"channel"),
            start: get_attribute(e, b"start"),
            stop: get_attribute(e, b"stop"),
            ..Self::default()
        }
    }

    fn finish(self) -> Result<Program, &'static str> {
        let epg_id = self
            .channel
            .filter(|c| !c.is_empty())
            .ok_or("missing channel attribute")?;
        let start = self
            .start
            .as_deref()
            .and_then(parse_xmltv_time)
            .ok_or("invalid start timestamp")?;
        let end = self
            .stop
            .as_deref()
            .and_then(parse_xmltv_time)
            .ok_or("invalid stop timestamp")?;
        if end < start {
            return Err("stop before start");
        }

        Ok(Program {
            epg_id,
            title: self.title.trim().to_string(),
            start,
            end,
            description: self.description,
            category: self.category,
        })
    }
}

/// Parse an XMLTV document and return its programs
pub fn parse_epg(text: &str) -> Result<Vec<Program>, EpgError> {
    parse_epg_document(text).map(|doc| doc.programs)
}

/// Parse an XMLTV document, keeping channel metadata and skip counts
pub fn parse_epg_document(text: &str) -> Result<EpgDocument, EpgError> {
    let sanitized = sanitize(text);
    parse_reader(sanitized.as_bytes())
}

/// Parse EPG from raw bytes - auto-detects gzip compression
pub fn parse_epg_bytes(bytes: &[u8]) -> Result<EpgDocument, EpgError> {
    // Gzip magic number (1f 8b)
    if bytes.starts_with(&[0x1f, 0x8b]) {
        let mut text = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut text)
            .map_err(|e| EpgError::malformed(0, format!("gzip stream: {}", e)))?;
        parse_epg_document(&text)
    } else {
        let text = std::str::from_utf8(bytes).map_err(|e| {
            EpgError::malformed(e.valid_up_to() as u64, "invalid UTF-8 byte sequence")
        })?;
        parse_epg_document(text)
    }
}

/// Parse on a worker thread and hand the programs to `callback` exactly once.
/// A document-level failure is logged and delivered as an empty list.
pub fn spawn_epg_parse<F>(text: String, callback: F) -> JoinHandle<()>
where
    F: FnOnce(Vec<Program>) + Send + 'static,
{
    std::thread::spawn(move || {
        let outcome = std::panic::catch_unwind(|| parse_epg(&text));
        let programs = match outcome {
            Ok(Ok(programs)) => programs,
            Ok(Err(e)) => {
                warn!(error = %e, "EPG parse failed, continuing without guide data");
                Vec::new()
            }
            Err(_) => {
                warn!("EPG parse thread panicked, continuing without guide data");
                Vec::new()
            }
        };
        callback(programs);
    })
}

fn parse_reader<R: BufRead>(reader: R) -> Result<EpgDocument, EpgError> {
    let mut xml_reader = Reader::from_reader(reader);

    let mut doc = EpgDocument::default();
    let mut buf = Vec::with_capacity(8192);

    let mut state = ParserState::Root;
    let mut depth: usize = 0;
    let mut saw_root = false;
    let mut current_channel: Option<EpgChannel> = None;
    let mut current_program: Option<PendingProgramme> = None;
    let mut text_buf = String::new();

    loop {
        let position = xml_reader.buffer_position() as u64;
        let event = xml_reader
            .read_event_into(&mut buf)
            .map_err(|e| EpgError::malformed(position, e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                depth += 1;
                saw_root = true;
                match e.name().as_ref() {
                    b"channel" if state == ParserState::Root => {
                        state = ParserState::Channel;
                        current_channel = Some(EpgChannel {
                            id: get_attribute(e, b"id").unwrap_or_default(),
                            name: String::new(),
                            icon: None,
                        });
                    }
                    b"programme" if state == ParserState::Root => {
                        state = ParserState::Programme;
                        current_program = Some(PendingProgramme::open(e));
                    }
                    b"title" if state == ParserState::Programme => {
                        state = ParserState::Title;
                        text_buf.clear();
                    }
                    b"desc" if state == ParserState::Programme => {
                        state = ParserState::Desc;
                        text_buf.clear();
                    }
                    b"category" if state == ParserState::Programme => {
                        state = ParserState::Category;
                        text_buf.clear();
                    }
                    b"display-name" if state == ParserState::Channel => {
                        state = ParserState::DisplayName;
                        text_buf.clear();
                    }
                    _ => {}
                }
            }
            Event::Empty(ref e) => {
                if depth == 0 {
                    saw_root = true;
                }
                match e.name().as_ref() {
                    b"programme" if state == ParserState::Root => {
                        finish_programme(&mut doc, PendingProgramme::open(e));
                    }
                    b"channel" if state == ParserState::Root => {
                        if let Some(id) = get_attribute(e, b"id").filter(|id| !id.is_empty()) {
                            doc.channels.insert(
                                id.clone(),
                                EpgChannel { id, name: String::new(), icon: None },
                            );
                        }
                    }
                    b"title" if state == ParserState::Programme => {
                        if let Some(ref mut prog) = current_program {
                            prog.title_seen = true;
                        }
                    }
                    b"icon" if state == ParserState::Channel => {
                        if let (Some(src), Some(chan)) =
                            (get_attribute(e, b"src"), current_channel.as_mut())
                        {
                            chan.icon = Some(src);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) => {
                if collects_text(state) {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    text_buf.push_str(&decode_xml_entities(&raw));
                }
            }
            Event::CData(ref e) => {
                if collects_text(state) {
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(ref e) => {
                if collects_text(state) {
                    let name = String::from_utf8_lossy(e.as_ref());
                    text_buf.push_str(&decode_xml_entities(&format!("&{};", name)));
                }
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                match e.name().as_ref() {
                    b"channel" if state == ParserState::Channel => {
                        if let Some(channel) = current_channel.take() {
                            if !channel.id.is_empty() {
                                doc.channels.insert(channel.id.clone(), channel);
                            }
                        }
                        state = ParserState::Root;
                    }
                    b"programme" if state == ParserState::Programme => {
                        if let Some(pending) = current_program.take() {
                            finish_programme(&mut doc, pending);
                        }
                        state = ParserState::Root;
                    }
                    b"title" if state == ParserState::Title => {
                        if let Some(ref mut prog) = current_program {
                            // Only the first <title> counts; later ones are translations
                            if !prog.title_seen {
                                prog.title = std::mem::take(&mut text_buf);
                                prog.title_seen = true;
                            }
                        }
                        state = ParserState::Programme;
                    }
                    b"desc" if state == ParserState::Desc => {
                        if let Some(ref mut prog) = current_program {
                            let desc = text_buf.trim();
                            if !desc.is_empty() && prog.description.is_none() {
                                prog.description = Some(desc.to_string());
                            }
                        }
                        state = ParserState::Programme;
                    }
                    b"category" if state == ParserState::Category => {
                        if let Some(ref mut prog) = current_program {
                            let cat = text_buf.trim();
                            if !cat.is_empty() && prog.category.is_none() {
                                prog.category = Some(cat.to_string());
                            }
                        }
                        state = ParserState::Programme;
                    }
                    b"display-name" if state == ParserState::DisplayName => {
                        if let Some(ref mut chan) = current_channel {
                            if chan.name.is_empty() {
                                chan.name = text_buf.trim().to_string();
                            }
                        }
                        state = ParserState::Channel;
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(EpgError::malformed(
            xml_reader.buffer_position() as u64,
            "no root element",
        ));
    }
    if depth > 0 {
        return Err(EpgError::malformed(
            xml_reader.buffer_position() as u64,
            format!("{} unclosed element(s) at end of document", depth),
        ));
    }

    debug!(
        channels = doc.channels.len(),
        programs = doc.programs.len(),
        skipped = doc.skipped,
        "Parsed EPG document"
    );
    if doc.skipped > 0 {
        warn!(skipped = doc.skipped, "Dropped invalid programme records");
    }
    Ok(doc)
}

fn collects_text(state: ParserState) -> bool {
    matches!(
        state,
        ParserState::Title | ParserState::Desc | ParserState::Category | ParserState::DisplayName
    )
}

fn finish_programme(doc: &mut EpgDocument, pending: PendingProgramme) {
    match pending.finish() {
        Ok(program) => doc.programs.push(program),
        Err(reason) => {
            trace!(reason, "Skipping programme");
            doc.skipped += 1;
        }
    }
}

/// Parse XMLTV time format: "20240115120000 +0000"
pub fn parse_xmltv_time(time_str: &str) -> Option<DateTime<FixedOffset>> {
    let time_str = time_str.trim();
    if !XMLTV_TIME.is_match(time_str) {
        return None;
    }
    DateTime::parse_from_str(time_str, "%Y%m%d%H%M%S %z").ok()
}

/// Replace control characters with spaces and escape bare ampersands, so that
/// common feed defects do not fail the whole document.
/// Legal XML 1.0: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn sanitize(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .char_indices()
        .any(|(i, c)| is_illegal_control(c) || (c == '&' && !is_valid_entity_start(&text[i..])));
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 64);
    for (i, c) in text.char_indices() {
        if is_illegal_control(c) {
            out.push(' ');
        } else if c == '&' && !is_valid_entity_start(&text[i..]) {
            out.push_str("&amp;");
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn is_illegal_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}')
}

/// Check if text starting with & looks like a valid XML entity
fn is_valid_entity_start(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    // Assume numeric entities are valid
    if bytes[1] == b'#' {
        return true;
    }
    // Named entities - look for pattern &name;
    let mut end = 1;
    while end < bytes.len() && end < 10 {
        match bytes[end] {
            b';' => return end > 1,
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' => end += 1,
            _ => return false,
        }
    }
    false
}

/// Decode XML entities back to normal characters
fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').and_then(|semi| {
            let entity = &tail[1..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => {
                    let num = entity.strip_prefix('#')?;
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => num.parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                result.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                // Malformed entity, keep the ampersand literally
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Get attribute value from XML element
fn get_attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.as_ref().to_vec()).ok()?;
            return Some(decode_xml_entities(&raw));
        }
    }
    None
}
